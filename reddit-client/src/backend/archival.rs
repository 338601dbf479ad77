use super::{author_or_deleted, bare_post_id, normalize_comments, Backend};
use crate::ranking::{rank_by_synthetic, request_size};
use crate::transport::HttpTransport;
use async_trait::async_trait;
use chrono::Utc;
use reddit_data_core::{
    permalink_url, truncate_text, BackendError, Comment, Post, SearchQuery, SortKey, SourceTag,
    MAX_LIMIT,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

const BACKEND_NAME: &str = "archival";
const SUBMISSION_ENDPOINT: &str = "/search/submission/";
const COMMENT_ENDPOINT: &str = "/search/comment/";

#[derive(Debug, Deserialize)]
struct ArchivalListing<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ArchivalPost {
    id: Option<String>,
    title: Option<String>,
    subreddit: Option<String>,
    author: Option<String>,
    score: Option<i64>,
    num_comments: Option<i64>,
    permalink: Option<String>,
    selftext: Option<String>,
    upvote_ratio: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ArchivalComment {
    author: Option<String>,
    score: Option<i64>,
    body: Option<String>,
}

/// Point-in-time snapshot search. Only subreddit-scoped queries are served.
#[derive(Debug)]
pub struct ArchivalBackend {
    transport: Arc<HttpTransport>,
    base_url: String,
}

impl ArchivalBackend {
    pub fn new(transport: Arc<HttpTransport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
        }
    }

    fn native_sort(sort: SortKey) -> Option<&'static str> {
        match sort {
            SortKey::Popularity => Some("score"),
            SortKey::CommentCount => Some("num_comments"),
            SortKey::Recency => Some("created_utc"),
            SortKey::Relevance => None,
        }
    }

    fn post_params(query: &SearchQuery, subreddit: &str, now: i64) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(6);
        if !query.query.trim().is_empty() {
            params.push(("q", query.query.clone()));
        }
        params.push(("size", request_size(query.limit, query.sort).to_string()));
        params.push(("sort", "desc".to_string()));
        if let Some(sort_type) = Self::native_sort(query.sort) {
            params.push(("sort_type", sort_type.to_string()));
        }
        params.push(("subreddit", subreddit.to_string()));
        if let Some(after) = query.time_window().and_then(|w| w.lower_bound(now)) {
            params.push(("after", after.to_string()));
        }
        params
    }
}

fn normalize_post(raw: ArchivalPost, max_chars: usize) -> Post {
    Post {
        id: raw.id.unwrap_or_default(),
        title: raw.title.unwrap_or_default(),
        subreddit: raw.subreddit.unwrap_or_default(),
        author: author_or_deleted(raw.author),
        score: raw.score.unwrap_or_default(),
        num_comments: raw.num_comments.unwrap_or_default(),
        url: permalink_url(raw.permalink.as_deref()),
        body: truncate_text(raw.selftext.as_deref().unwrap_or_default(), max_chars),
        source: SourceTag::Archival,
        upvote_ratio: raw.upvote_ratio,
        synthetic_score: None,
    }
}

/// Normalizes a submission listing and applies the local popularity
/// ranking when the query asks for it.
fn posts_from_listing(listing: ArchivalListing<ArchivalPost>, query: &SearchQuery) -> Vec<Post> {
    let posts: Vec<Post> = listing
        .data
        .into_iter()
        .map(|raw| normalize_post(raw, query.max_chars))
        .collect();

    let limit = query.limit.min(MAX_LIMIT) as usize;
    if query.sort.is_popularity() {
        rank_by_synthetic(posts, limit)
    } else {
        posts.into_iter().take(limit).collect()
    }
}

fn comments_from_listing(
    listing: ArchivalListing<ArchivalComment>,
    limit: usize,
    max_chars: usize,
) -> Vec<Comment> {
    normalize_comments(
        listing
            .data
            .into_iter()
            .map(|c| (c.author, c.score.unwrap_or_default(), c.body)),
        limit,
        max_chars,
    )
}

#[async_trait]
impl Backend for ArchivalBackend {
    fn source(&self) -> SourceTag {
        SourceTag::Archival
    }

    fn supports(&self, query: &SearchQuery) -> bool {
        query.subreddit.is_some()
    }

    async fn fetch_posts(&self, query: &SearchQuery) -> Result<Vec<Post>, BackendError> {
        let subreddit = query
            .subreddit
            .as_deref()
            .ok_or_else(|| BackendError::Unsupported {
                backend: BACKEND_NAME.to_string(),
                reason: "a subreddit is required".to_string(),
            })?;

        let params = Self::post_params(query, subreddit, Utc::now().timestamp());
        let listing: ArchivalListing<ArchivalPost> = self
            .transport
            .get_json(BACKEND_NAME, &self.base_url, SUBMISSION_ENDPOINT, &params)
            .await?;

        debug!(
            "Archival search returned {} candidates for r/{}",
            listing.data.len(),
            subreddit
        );
        Ok(posts_from_listing(listing, query))
    }

    async fn fetch_comments(
        &self,
        post_id: &str,
        limit: u32,
        max_chars: usize,
    ) -> Result<Vec<Comment>, BackendError> {
        let params = vec![
            ("link_id", bare_post_id(post_id).to_string()),
            ("size", limit.min(MAX_LIMIT).to_string()),
            ("sort", "desc".to_string()),
            ("sort_type", "score".to_string()),
        ];

        let listing: ArchivalListing<ArchivalComment> = self
            .transport
            .get_json(BACKEND_NAME, &self.base_url, COMMENT_ENDPOINT, &params)
            .await?;

        Ok(comments_from_listing(listing, limit as usize, max_chars))
    }
}
