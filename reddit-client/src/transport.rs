use crate::metrics::{MetricsCollector, RequestMetrics};
use reddit_data_core::{BackendError, CoreError};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// JSON-over-HTTPS GET with a fixed per-call timeout. Every call is
/// recorded in the shared [`MetricsCollector`].
#[derive(Debug)]
pub struct HttpTransport {
    http_client: Client,
    metrics: Arc<MetricsCollector>,
    user_agent: String,
}

impl HttpTransport {
    pub fn new(
        user_agent: String,
        timeout: Duration,
        metrics: Arc<MetricsCollector>,
    ) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .user_agent(&user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http_client,
            metrics,
            user_agent,
        })
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Fetches `base_url + endpoint` and decodes the body as `T`.
    /// `backend` names the upstream in errors and metrics.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        backend: &str,
        base_url: &str,
        endpoint: &str,
        query_params: &[(&str, String)],
    ) -> Result<T, BackendError> {
        let url = format!("{}{}", base_url.trim_end_matches('/'), endpoint);
        let start_time = Instant::now();

        info!("Making {} request: GET {}", backend, endpoint);
        let result = self.send(backend, &url, query_params).await;

        let (status_code, error_type) = match &result {
            Ok(_) => (Some(200), None),
            Err(BackendError::HttpStatus { status_code, .. }) => {
                (Some(*status_code), Some("http_status".to_string()))
            }
            Err(BackendError::RequestTimeout { .. }) => (None, Some("timeout".to_string())),
            Err(BackendError::InvalidResponse { .. }) => {
                (Some(200), Some("invalid_response".to_string()))
            }
            Err(_) => (None, Some("network_error".to_string())),
        };

        self.metrics
            .record_request(RequestMetrics {
                endpoint: format!("{} {}", backend, endpoint),
                status_code,
                response_time: start_time.elapsed(),
                success: result.is_ok(),
                error_type,
            })
            .await;

        result
    }

    async fn send<T: DeserializeOwned>(
        &self,
        backend: &str,
        url: &str,
        query_params: &[(&str, String)],
    ) -> Result<T, BackendError> {
        let response = self
            .http_client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .query(query_params)
            .send()
            .await
            .map_err(|e| {
                warn!("Network error for {} {}: {}", backend, url, e);
                BackendError::from_reqwest(backend, &e)
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Request failed with status: {} for {}", status, url);
            return Err(BackendError::HttpStatus {
                backend: backend.to_string(),
                status_code: status.as_u16(),
            });
        }
        debug!("Request successful: {} {}", status, url);

        response.json::<T>().await.map_err(|e| {
            warn!("Failed to parse {} response: {}", backend, e);
            BackendError::InvalidResponse {
                backend: backend.to_string(),
                details: e.to_string(),
            }
        })
    }
}
