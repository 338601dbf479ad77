use super::{author_or_deleted, bare_post_id, is_path_segment, normalize_comments, Backend};
use crate::transport::HttpTransport;
use async_trait::async_trait;
use reddit_data_core::{
    permalink_url, truncate_text, BackendError, Comment, Post, SearchQuery, SortKey, SourceTag,
    MAX_LIMIT,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

const BACKEND_NAME: &str = "live";

#[derive(Debug, Clone, Deserialize)]
pub struct RedditListing<T> {
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditListingData<T> {
    #[serde(default = "Vec::new")]
    pub children: Vec<RedditListingChild<T>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RedditPostData {
    pub id: Option<String>,
    pub title: Option<String>,
    pub selftext: Option<String>,
    pub author: Option<String>,
    pub subreddit: Option<String>,
    pub permalink: Option<String>,
    pub score: Option<i64>,
    pub num_comments: Option<i64>,
    pub upvote_ratio: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RedditCommentData {
    pub author: Option<String>,
    pub score: Option<i64>,
    pub body: Option<String>,
}

/// Current reddit.com state through the public JSON endpoints.
#[derive(Debug)]
pub struct LiveBackend {
    transport: Arc<HttpTransport>,
    base_url: String,
}

impl LiveBackend {
    pub fn new(transport: Arc<HttpTransport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
        }
    }

    fn native_sort(sort: SortKey) -> &'static str {
        match sort {
            SortKey::Popularity => "top",
            SortKey::CommentCount => "comments",
            SortKey::Recency => "new",
            SortKey::Relevance => "relevance",
        }
    }

    /// `None` when the subreddit name would not stay a single path segment.
    fn search_endpoint(subreddit: Option<&str>) -> Option<String> {
        match subreddit {
            Some(subreddit) if is_path_segment(subreddit) => {
                Some(format!("/r/{}/search.json", subreddit))
            }
            Some(_) => None,
            None => Some("/search.json".to_string()),
        }
    }

    fn unsupported(reason: String) -> BackendError {
        BackendError::Unsupported {
            backend: BACKEND_NAME.to_string(),
            reason,
        }
    }

    /// Unsupported window names are left out of the request entirely.
    fn post_params(query: &SearchQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("q", query.query.clone()),
            ("sort", Self::native_sort(query.sort).to_string()),
            ("limit", query.limit.min(MAX_LIMIT).to_string()),
            ("raw_json", "1".to_string()),
        ];
        if query.subreddit.is_some() {
            params.push(("restrict_sr", "1".to_string()));
        }
        if let Some(window) = query.time_window() {
            params.push(("t", window.as_str().to_string()));
        }
        params
    }
}

impl From<RedditPostData> for Post {
    fn from(post_data: RedditPostData) -> Self {
        Self {
            id: post_data.id.unwrap_or_default(),
            title: post_data.title.unwrap_or_default(),
            subreddit: post_data.subreddit.unwrap_or_default(),
            author: author_or_deleted(post_data.author),
            score: post_data.score.unwrap_or_default(),
            num_comments: post_data.num_comments.unwrap_or_default(),
            url: permalink_url(post_data.permalink.as_deref()),
            body: post_data.selftext.unwrap_or_default(),
            source: SourceTag::Live,
            upvote_ratio: post_data.upvote_ratio,
            synthetic_score: None,
        }
    }
}

fn posts_from_listing(
    listing: RedditListing<RedditPostData>,
    limit: usize,
    max_chars: usize,
) -> Vec<Post> {
    listing
        .data
        .children
        .into_iter()
        .filter(|child| child.kind == "t3")
        .map(|child| {
            let mut post = Post::from(child.data);
            post.body = truncate_text(&post.body, max_chars);
            post
        })
        .take(limit)
        .collect()
}

/// The comments endpoint answers `[post_listing, comment_listing]`; only
/// top-level `t1` children of the second listing are comments.
fn comments_from_response(
    response: Vec<RedditListing<serde_json::Value>>,
    limit: usize,
    max_chars: usize,
) -> Result<Vec<Comment>, BackendError> {
    let Some(comment_listing) = response.into_iter().nth(1) else {
        return Err(BackendError::InvalidResponse {
            backend: BACKEND_NAME.to_string(),
            details: "comment listing missing from response".to_string(),
        });
    };

    let raw = comment_listing
        .data
        .children
        .into_iter()
        .filter(|child| child.kind == "t1")
        .filter_map(|child| serde_json::from_value::<RedditCommentData>(child.data).ok())
        .map(|c| (c.author, c.score.unwrap_or_default(), c.body));

    Ok(normalize_comments(raw, limit, max_chars))
}

#[async_trait]
impl Backend for LiveBackend {
    fn source(&self) -> SourceTag {
        SourceTag::Live
    }

    fn supports(&self, query: &SearchQuery) -> bool {
        Self::search_endpoint(query.subreddit.as_deref()).is_some()
    }

    async fn fetch_posts(&self, query: &SearchQuery) -> Result<Vec<Post>, BackendError> {
        let endpoint = Self::search_endpoint(query.subreddit.as_deref()).ok_or_else(|| {
            Self::unsupported(format!(
                "invalid subreddit name {:?}",
                query.subreddit.as_deref().unwrap_or_default()
            ))
        })?;
        let params = Self::post_params(query);

        let listing: RedditListing<RedditPostData> = self
            .transport
            .get_json(BACKEND_NAME, &self.base_url, &endpoint, &params)
            .await?;

        debug!(
            "Live search returned {} children for {}",
            listing.data.children.len(),
            endpoint
        );
        Ok(posts_from_listing(
            listing,
            query.limit.min(MAX_LIMIT) as usize,
            query.max_chars,
        ))
    }

    async fn fetch_comments(
        &self,
        post_id: &str,
        limit: u32,
        max_chars: usize,
    ) -> Result<Vec<Comment>, BackendError> {
        let post_id = bare_post_id(post_id);
        if !is_path_segment(post_id) {
            return Err(Self::unsupported(format!("invalid post id {:?}", post_id)));
        }
        let endpoint = format!("/comments/{}.json", post_id);
        let params = vec![
            ("limit", limit.min(MAX_LIMIT).to_string()),
            ("sort", "top".to_string()),
            ("depth", "1".to_string()),
            ("raw_json", "1".to_string()),
        ];

        let response: Vec<RedditListing<serde_json::Value>> = self
            .transport
            .get_json(BACKEND_NAME, &self.base_url, &endpoint, &params)
            .await?;

        comments_from_response(response, limit as usize, max_chars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn param<'a>(params: &'a [(&str, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_sort_vocabulary_mapping() {
        assert_eq!(LiveBackend::native_sort(SortKey::Popularity), "top");
        assert_eq!(LiveBackend::native_sort(SortKey::CommentCount), "comments");
        assert_eq!(LiveBackend::native_sort(SortKey::Recency), "new");
        assert_eq!(LiveBackend::native_sort(SortKey::Relevance), "relevance");
    }

    #[test]
    fn test_global_and_scoped_endpoints() {
        assert_eq!(
            LiveBackend::search_endpoint(None).as_deref(),
            Some("/search.json")
        );
        assert_eq!(
            LiveBackend::search_endpoint(Some("rust")).as_deref(),
            Some("/r/rust/search.json")
        );

        let scoped = SearchQuery::new("tokio").with_subreddit("rust");
        assert_eq!(param(&LiveBackend::post_params(&scoped), "restrict_sr"), Some("1"));

        let global = SearchQuery::new("tokio");
        assert_eq!(param(&LiveBackend::post_params(&global), "restrict_sr"), None);
    }

    #[test]
    fn test_subreddit_cannot_escape_its_path_segment() {
        for name in ["rust?x=1", "a/../b", "rust#frag", "r s", ""] {
            assert_eq!(LiveBackend::search_endpoint(Some(name)), None, "{}", name);
        }
        assert_eq!(
            LiveBackend::search_endpoint(Some("Rust_Lang2")).as_deref(),
            Some("/r/Rust_Lang2/search.json")
        );
    }

    #[tokio::test]
    async fn test_invalid_names_are_rejected_without_a_request() {
        let metrics = Arc::new(crate::metrics::MetricsCollector::new());
        let transport = Arc::new(
            HttpTransport::new(
                "reddit-data-test".to_string(),
                std::time::Duration::from_secs(1),
                metrics.clone(),
            )
            .unwrap(),
        );
        let backend = LiveBackend::new(transport, "http://127.0.0.1:9");

        let query = SearchQuery::new("tokio").with_subreddit("a/../b");
        assert!(!backend.supports(&query));
        assert!(matches!(
            backend.fetch_posts(&query).await,
            Err(BackendError::Unsupported { .. })
        ));
        assert!(matches!(
            backend.fetch_comments("abc?x=1", 5, 0).await,
            Err(BackendError::Unsupported { .. })
        ));
        assert_eq!(metrics.get_metrics().await.total_requests, 0);
    }

    #[test]
    fn test_unsupported_window_is_dropped_silently() {
        let query = SearchQuery::new("tokio").with_time_filter("fortnight");
        let params = LiveBackend::post_params(&query);
        assert_eq!(param(&params, "t"), None);

        let query = SearchQuery::new("tokio").with_time_filter("week");
        let params = LiveBackend::post_params(&query);
        assert_eq!(param(&params, "t"), Some("week"));
        assert_eq!(param(&params, "limit"), Some("10"));
    }

    #[test]
    fn test_post_listing_normalization() {
        let listing: RedditListing<RedditPostData> = serde_json::from_value(json!({
            "kind": "Listing",
            "data": {
                "after": null,
                "before": null,
                "children": [
                    {
                        "kind": "t3",
                        "data": {
                            "id": "xyz",
                            "title": "Live post",
                            "subreddit": "rust",
                            "author": "ferris",
                            "score": 42,
                            "num_comments": 7,
                            "permalink": "/r/rust/comments/xyz/live_post/",
                            "selftext": "abcdefghij",
                            "upvote_ratio": 0.93
                        }
                    }
                ]
            }
        }))
        .unwrap();

        let posts = posts_from_listing(listing, 10, 4);
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].source, SourceTag::Live);
        assert_eq!(posts[0].score, 42);
        assert_eq!(posts[0].body, "abcd ... (6 more chars)");
        assert_eq!(
            posts[0].url,
            "https://reddit.com/r/rust/comments/xyz/live_post/"
        );
        assert!(posts[0].synthetic_score.is_none());
    }

    #[test]
    fn test_comment_response_parsing() {
        let response: Vec<RedditListing<serde_json::Value>> = serde_json::from_value(json!([
            { "kind": "Listing", "data": { "children": [
                { "kind": "t3", "data": { "id": "xyz" } }
            ] } },
            { "kind": "Listing", "data": { "children": [
                { "kind": "t1", "data": { "author": "a", "score": 5, "body": "hello" } },
                { "kind": "t1", "data": { "author": "b", "score": 4, "body": "[removed]" } },
                { "kind": "t1", "data": { "author": null, "score": 3, "body": "[deleted]" } },
                { "kind": "t1", "data": { "author": "d", "score": 2, "body": "world" } },
                { "kind": "more", "data": { "count": 12, "children": ["abc"] } }
            ] } }
        ]))
        .unwrap();

        let comments = comments_from_response(response, 10, 0).unwrap();
        let bodies: Vec<_> = comments.iter().map(|c| c.body.as_str()).collect();
        assert_eq!(bodies, vec!["hello", "world"]);
        assert_eq!(comments[0].score, 5);
    }

    #[test]
    fn test_comment_response_without_listing_is_invalid() {
        let result = comments_from_response(Vec::new(), 5, 0);
        assert!(matches!(
            result,
            Err(BackendError::InvalidResponse { .. })
        ));
    }
}
