//! Upstream data sources behind a common strategy trait.
//!
//! Each adapter translates its backend's wire format into the normalized
//! [`Post`] and [`Comment`] shapes. Adapters never consult the rate limiter;
//! admission is decided by the orchestrator's routing plan.

mod archival;
mod live;

pub use archival::ArchivalBackend;
pub use live::LiveBackend;

use async_trait::async_trait;
use reddit_data_core::{
    is_removed_body, truncate_text, BackendError, Comment, Post, SearchQuery, SourceTag,
    DELETED_AUTHOR,
};

#[async_trait]
pub trait Backend: Send + Sync {
    fn source(&self) -> SourceTag;

    /// Whether this backend can answer `query` at all.
    fn supports(&self, _query: &SearchQuery) -> bool {
        true
    }

    async fn fetch_posts(&self, query: &SearchQuery) -> Result<Vec<Post>, BackendError>;

    async fn fetch_comments(
        &self,
        post_id: &str,
        limit: u32,
        max_chars: usize,
    ) -> Result<Vec<Comment>, BackendError>;
}

/// Strips a `t3_` fullname prefix so both backends see the bare id.
pub(crate) fn bare_post_id(post_id: &str) -> &str {
    post_id.strip_prefix("t3_").unwrap_or(post_id)
}

/// True for names that stay one URL path segment: ASCII letters, digits
/// and underscores, as reddit allows for subreddits and base36 ids.
pub(crate) fn is_path_segment(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub(crate) fn author_or_deleted(author: Option<String>) -> String {
    author
        .filter(|a| !a.trim().is_empty())
        .unwrap_or_else(|| DELETED_AUTHOR.to_string())
}

/// Drops removed/deleted bodies, truncates the rest and caps the count.
pub(crate) fn normalize_comments<I>(raw: I, limit: usize, max_chars: usize) -> Vec<Comment>
where
    I: IntoIterator<Item = (Option<String>, i64, Option<String>)>,
{
    raw.into_iter()
        .filter_map(|(author, score, body)| {
            let body = body.unwrap_or_default();
            if is_removed_body(&body) {
                return None;
            }
            Some(Comment {
                author: author_or_deleted(author),
                score,
                body: truncate_text(&body, max_chars),
            })
        })
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removed_comments_are_filtered() {
        let raw = ["hello", "[removed]", "[deleted]", "world"]
            .into_iter()
            .map(|body| (Some("user".to_string()), 1, Some(body.to_string())));

        let bodies: Vec<_> = normalize_comments(raw, 10, 0)
            .into_iter()
            .map(|c| c.body)
            .collect();
        assert_eq!(bodies, vec!["hello", "world"]);
    }

    #[test]
    fn test_comment_limit_applies_after_filtering() {
        let raw = ["[removed]", "one", "two", "three"]
            .into_iter()
            .map(|body| (None, 0, Some(body.to_string())));

        let comments = normalize_comments(raw, 2, 0);
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].body, "one");
        assert_eq!(comments[0].author, DELETED_AUTHOR);
    }

    #[test]
    fn test_bare_post_id() {
        assert_eq!(bare_post_id("t3_abc123"), "abc123");
        assert_eq!(bare_post_id("abc123"), "abc123");
    }
}
