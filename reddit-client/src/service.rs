use crate::backend::{ArchivalBackend, LiveBackend};
use crate::metrics::{ApiMetrics, MetricsCollector};
use crate::orchestrator::{Orchestrator, SearchOutcome, SearchStatus};
use crate::rate_limiter::{RateLimitConfig, RateLimitStatus, RateLimiter};
use crate::session::{RefineOptions, SessionStore};
use crate::transport::HttpTransport;
use reddit_data_core::{AppConfig, CoreError, SearchQuery};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Result of a search or a session refinement.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: SearchQuery,
    pub outcome: SearchOutcome,
    pub session_id: Option<String>,
    /// True when the bundle came from the session cache.
    pub from_session: bool,
}

impl SearchResponse {
    /// A refinement never contacts a backend, so an empty cache hit is
    /// `Empty` rather than `Unavailable`.
    pub fn status(&self) -> SearchStatus {
        if self.from_session && self.outcome.bundles.is_empty() {
            SearchStatus::Empty
        } else {
            self.outcome.status()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceStats {
    pub rate_limit: RateLimitStatus,
    pub max_live_wait: Duration,
    pub api: ApiMetrics,
    pub sessions: usize,
}

/// Owns the one-per-process rate limiter and session cache and hands
/// queries to the orchestrator.
pub struct SearchService {
    orchestrator: Orchestrator,
    sessions: SessionStore,
    metrics: Arc<MetricsCollector>,
}

impl SearchService {
    pub fn new(orchestrator: Orchestrator, metrics: Arc<MetricsCollector>) -> Self {
        Self {
            orchestrator,
            sessions: SessionStore::new(),
            metrics,
        }
    }

    /// Wires the HTTP transport, both backends and the limiter from config.
    pub fn from_config(config: &AppConfig) -> Result<Self, CoreError> {
        let metrics = Arc::new(MetricsCollector::new());
        let transport = Arc::new(HttpTransport::new(
            config.user_agent.clone(),
            config.http_timeout(),
            Arc::clone(&metrics),
        )?);

        let archival = Arc::new(ArchivalBackend::new(
            Arc::clone(&transport),
            config.archival_base_url.clone(),
        ));
        let live = Arc::new(LiveBackend::new(transport, config.live_base_url.clone()));
        let limiter = Arc::new(RateLimiter::new(RateLimitConfig::from_settings(
            &config.rate_limit,
        )));

        info!(
            "Search service ready (archival: {}, live: {})",
            config.archival_base_url, config.live_base_url
        );
        Ok(Self::new(
            Orchestrator::hybrid(archival, live, limiter),
            metrics,
        ))
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Fetches fresh results. Deep queries that found something are kept
    /// in the session cache and their id is returned.
    pub async fn search(&self, query: SearchQuery) -> SearchResponse {
        let outcome = self.orchestrator.search(&query).await;

        let session_id = if query.is_deep() && outcome.status() == SearchStatus::Found {
            Some(
                self.sessions
                    .create(query.clone(), outcome.bundles.clone())
                    .await,
            )
        } else {
            None
        };

        SearchResponse {
            query,
            outcome,
            session_id,
            from_session: false,
        }
    }

    /// Serves a cached bundle narrowed by `options`. `None` if the session
    /// is unknown.
    pub async fn refine(&self, session_id: &str, options: &RefineOptions) -> Option<SearchResponse> {
        let session = self.sessions.get(session_id).await?;
        debug!("Refining session {} ({} posts)", session.id, session.bundle.len());

        Some(SearchResponse {
            query: session.query.clone(),
            outcome: SearchOutcome {
                bundles: session.refine(options),
                attempts: Vec::new(),
            },
            session_id: Some(session.id.clone()),
            from_session: true,
        })
    }

    /// Refines the named session if it exists, otherwise searches afresh
    /// with `fallback`.
    pub async fn refine_or_search(
        &self,
        session_id: Option<&str>,
        options: &RefineOptions,
        fallback: SearchQuery,
    ) -> SearchResponse {
        if let Some(session_id) = session_id {
            if let Some(response) = self.refine(session_id, options).await {
                return response;
            }
            info!("Session {} not found, fetching fresh results", session_id);
        }
        self.search(fallback).await
    }

    pub async fn stats(&self) -> ServiceStats {
        let limiter = self.orchestrator.limiter();
        ServiceStats {
            rate_limit: limiter.get_rate_limit_status().await,
            max_live_wait: limiter.max_wait(),
            api: self.metrics.get_metrics().await,
            sessions: self.sessions.len().await,
        }
    }
}
