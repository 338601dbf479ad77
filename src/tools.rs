//! Tool-call surface: argument parsing and dispatch to the search service.

use crate::render::{render_response, render_stats};
use reddit_client::{RefineOptions, SearchService};
use reddit_data_core::{SearchDefaults, SearchQuery, SortKey};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchArgs {
    pub query: String,
    pub subreddit: Option<String>,
    pub sort: Option<String>,
    pub time_filter: Option<String>,
    pub limit: Option<u32>,
    pub include_comments: bool,
    pub comments_per_post: Option<u32>,
    pub max_chars: Option<usize>,
}

impl SearchArgs {
    pub fn into_query(self, defaults: &SearchDefaults) -> SearchQuery {
        let mut query = SearchQuery::new(self.query)
            .with_sort(
                self.sort
                    .as_deref()
                    .map(SortKey::parse)
                    .unwrap_or(SortKey::Popularity),
            )
            .with_time_filter(self.time_filter.unwrap_or_else(|| "all".to_string()))
            .with_limit(self.limit.unwrap_or(defaults.limit))
            .with_max_chars(self.max_chars.unwrap_or(defaults.max_chars));

        if let Some(subreddit) = self.subreddit {
            query = query.with_subreddit(subreddit);
        }
        if self.include_comments {
            query = query.with_comments(
                self.comments_per_post
                    .unwrap_or(defaults.comments_per_post),
            );
        }
        query
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RefineArgs {
    pub session_id: Option<String>,
    pub keyword: Option<String>,
    pub min_score: Option<i64>,
    pub max_posts: Option<usize>,
    /// Used to search afresh when the session is unknown.
    #[serde(flatten)]
    pub search: SearchArgs,
}

impl RefineArgs {
    fn options(&self) -> RefineOptions {
        RefineOptions {
            keyword: self.keyword.clone(),
            min_score: self.min_score,
            limit: self.max_posts,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ToolRequest {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    pub tool: String,
    #[serde(default = "empty_arguments")]
    pub arguments: serde_json::Value,
}

fn empty_arguments() -> serde_json::Value {
    serde_json::Value::Object(Default::default())
}

#[derive(Debug, Serialize)]
pub struct ToolResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    pub ok: bool,
    pub text: String,
}

pub struct ToolServer {
    service: Arc<SearchService>,
    defaults: SearchDefaults,
}

impl ToolServer {
    pub fn new(service: Arc<SearchService>, defaults: SearchDefaults) -> Self {
        Self { service, defaults }
    }

    pub async fn search(&self, args: SearchArgs) -> String {
        let query = args.into_query(&self.defaults);
        debug!("search tool: {:?}", query);
        render_response(&self.service.search(query).await)
    }

    pub async fn refine(&self, args: RefineArgs) -> String {
        let options = args.options();
        let fallback = args.search.into_query(&self.defaults);
        let response = self
            .service
            .refine_or_search(args.session_id.as_deref(), &options, fallback)
            .await;
        render_response(&response)
    }

    pub async fn stats(&self) -> String {
        render_stats(&self.service.stats().await)
    }

    pub async fn dispatch(&self, request: ToolRequest) -> ToolResponse {
        let id = request.id;
        let result = match request.tool.as_str() {
            "search" => match serde_json::from_value::<SearchArgs>(request.arguments) {
                Ok(args) => Ok(self.search(args).await),
                Err(e) => Err(format!("Invalid search arguments: {}", e)),
            },
            "refine" => match serde_json::from_value::<RefineArgs>(request.arguments) {
                Ok(args) => Ok(self.refine(args).await),
                Err(e) => Err(format!("Invalid refine arguments: {}", e)),
            },
            "stats" => Ok(self.stats().await),
            other => Err(format!("Unknown tool: {}", other)),
        };

        match result {
            Ok(text) => ToolResponse { id, ok: true, text },
            Err(text) => {
                warn!("{}", text);
                ToolResponse {
                    id,
                    ok: false,
                    text,
                }
            }
        }
    }

    /// Handles one line of the stdio protocol and returns the JSON reply.
    pub async fn handle_line(&self, line: &str) -> String {
        let response = match serde_json::from_str::<ToolRequest>(line) {
            Ok(request) => self.dispatch(request).await,
            Err(e) => ToolResponse {
                id: None,
                ok: false,
                text: format!("Invalid request: {}", e),
            },
        };

        serde_json::to_string(&response).unwrap_or_else(|e| {
            format!(
                "{{\"ok\":false,\"text\":\"failed to encode response: {}\"}}",
                e
            )
        })
    }
}
