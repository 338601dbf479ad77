//! In-memory session cache for deep query results.
//!
//! Entries are written once and never modified or evicted, so the store
//! grows for the lifetime of the process.

use chrono::{DateTime, Utc};
use reddit_data_core::{PostBundle, SearchQuery};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

pub const SESSION_ID_LEN: usize = 12;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub id: String,
    pub query: SearchQuery,
    pub bundle: Vec<PostBundle>,
    pub created_at: DateTime<Utc>,
}

/// Narrows a cached bundle without touching it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefineOptions {
    /// Case-insensitive match against title, body, or any comment body.
    pub keyword: Option<String>,
    pub min_score: Option<i64>,
    pub limit: Option<usize>,
}

impl Session {
    pub fn refine(&self, options: &RefineOptions) -> Vec<PostBundle> {
        let keyword = options
            .keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_lowercase);

        self.bundle
            .iter()
            .filter(|entry| options.min_score.map_or(true, |min| entry.post.score >= min))
            .filter(|entry| match &keyword {
                Some(keyword) => bundle_mentions(entry, keyword),
                None => true,
            })
            .take(options.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }
}

fn bundle_mentions(entry: &PostBundle, keyword: &str) -> bool {
    entry.post.title.to_lowercase().contains(keyword)
        || entry.post.body.to_lowercase().contains(keyword)
        || entry
            .comments
            .iter()
            .any(|c| c.body.to_lowercase().contains(keyword))
}

#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn generate_id() -> String {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(SESSION_ID_LEN);
        id
    }

    /// Stores `bundle` verbatim under a fresh identifier.
    pub async fn create(&self, query: SearchQuery, bundle: Vec<PostBundle>) -> String {
        let mut sessions = self.sessions.write().await;

        let mut id = Self::generate_id();
        while sessions.contains_key(&id) {
            debug!("Session id collision on {}, regenerating", id);
            id = Self::generate_id();
        }

        info!(
            "Created session {} for \"{}\" with {} posts",
            id,
            query.query,
            bundle.len()
        );
        sessions.insert(
            id.clone(),
            Arc::new(Session {
                id: id.clone(),
                query,
                bundle,
                created_at: Utc::now(),
            }),
        );
        id
    }

    /// Exact lookup. `None` means "no prior session", not an error.
    pub async fn get(&self, session_id: &str) -> Option<Arc<Session>> {
        self.sessions.read().await.get(session_id.trim()).cloned()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
