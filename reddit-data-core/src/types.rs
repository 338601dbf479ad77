use serde::{Deserialize, Serialize};
use std::fmt;

pub const DELETED_AUTHOR: &str = "[deleted]";
pub const MAX_LIMIT: u32 = 100;

/// Which backend produced a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTag {
    Archival,
    Live,
}

impl SourceTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::Archival => "archival",
            SourceTag::Live => "live",
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend-independent ordering requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Popularity,
    CommentCount,
    Recency,
    Relevance,
}

impl SortKey {
    /// Accepts both the archival vocabulary (`score`, `num_comments`,
    /// `created_utc`) and the live one (`top`, `comments`, `new`).
    /// Anything unrecognised sorts by relevance.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "score" | "top" | "popularity" => SortKey::Popularity,
            "num_comments" | "comments" => SortKey::CommentCount,
            "created_utc" | "new" | "recency" => SortKey::Recency,
            _ => SortKey::Relevance,
        }
    }

    pub fn is_popularity(&self) -> bool {
        matches!(self, SortKey::Popularity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    Hour,
    Day,
    Week,
    Month,
    Year,
    All,
}

impl TimeWindow {
    /// Unknown window names yield `None` and are ignored by callers.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "hour" => Some(TimeWindow::Hour),
            "day" => Some(TimeWindow::Day),
            "week" => Some(TimeWindow::Week),
            "month" => Some(TimeWindow::Month),
            "year" => Some(TimeWindow::Year),
            "all" => Some(TimeWindow::All),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::Hour => "hour",
            TimeWindow::Day => "day",
            TimeWindow::Week => "week",
            TimeWindow::Month => "month",
            TimeWindow::Year => "year",
            TimeWindow::All => "all",
        }
    }

    /// Length of the window in seconds; `All` has no lower bound.
    pub fn span_secs(&self) -> Option<i64> {
        match self {
            TimeWindow::Hour => Some(3600),
            TimeWindow::Day => Some(86_400),
            TimeWindow::Week => Some(7 * 86_400),
            TimeWindow::Month => Some(30 * 86_400),
            TimeWindow::Year => Some(365 * 86_400),
            TimeWindow::All => None,
        }
    }

    /// Unix-epoch lower bound relative to `now`.
    pub fn lower_bound(&self, now: i64) -> Option<i64> {
        self.span_secs().map(|span| now - span)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub subreddit: String,
    pub author: String,
    pub score: i64,
    pub num_comments: i64,
    pub url: String,
    pub body: String,
    pub source: SourceTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upvote_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthetic_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub author: String,
    pub score: i64,
    pub body: String,
}

/// A post together with the comments fetched for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostBundle {
    pub post: Post,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    pub subreddit: Option<String>,
    pub sort: SortKey,
    /// Raw window name; unsupported values are dropped by each backend.
    pub time_filter: String,
    pub limit: u32,
    pub max_chars: usize,
    pub include_comments: bool,
    pub comments_per_post: u32,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            subreddit: None,
            sort: SortKey::Popularity,
            time_filter: "all".to_string(),
            limit: 10,
            max_chars: 500,
            include_comments: false,
            comments_per_post: 5,
        }
    }

    pub fn with_subreddit(mut self, subreddit: impl Into<String>) -> Self {
        let subreddit = subreddit.into();
        let trimmed = subreddit.trim().trim_start_matches("r/");
        self.subreddit = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self
    }

    pub fn with_sort(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_time_filter(mut self, time_filter: impl Into<String>) -> Self {
        self.time_filter = time_filter.into();
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit.clamp(1, MAX_LIMIT);
        self
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    pub fn with_comments(mut self, comments_per_post: u32) -> Self {
        self.include_comments = true;
        self.comments_per_post = comments_per_post.clamp(1, MAX_LIMIT);
        self
    }

    /// Deep queries fetch comments and are kept in the session cache.
    pub fn is_deep(&self) -> bool {
        self.include_comments
    }

    pub fn time_window(&self) -> Option<TimeWindow> {
        TimeWindow::parse(&self.time_filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_key_vocabularies() {
        assert_eq!(SortKey::parse("score"), SortKey::Popularity);
        assert_eq!(SortKey::parse("top"), SortKey::Popularity);
        assert_eq!(SortKey::parse("num_comments"), SortKey::CommentCount);
        assert_eq!(SortKey::parse("created_utc"), SortKey::Recency);
        assert_eq!(SortKey::parse("NEW"), SortKey::Recency);
        assert_eq!(SortKey::parse("whatever"), SortKey::Relevance);
    }

    #[test]
    fn test_time_window_bounds() {
        let now = 1_700_000_000;
        assert_eq!(TimeWindow::Day.lower_bound(now), Some(now - 86_400));
        assert_eq!(TimeWindow::Week.lower_bound(now), Some(now - 604_800));
        assert_eq!(TimeWindow::Month.lower_bound(now), Some(now - 2_592_000));
        assert_eq!(TimeWindow::Year.lower_bound(now), Some(now - 31_536_000));
        assert_eq!(TimeWindow::All.lower_bound(now), None);
        assert_eq!(TimeWindow::parse("fortnight"), None);
    }

    #[test]
    fn test_query_builder_clamps() {
        let query = SearchQuery::new("rust")
            .with_subreddit("r/programming")
            .with_limit(500)
            .with_comments(0);

        assert_eq!(query.subreddit.as_deref(), Some("programming"));
        assert_eq!(query.limit, 100);
        assert_eq!(query.comments_per_post, 1);
        assert!(query.is_deep());

        let global = SearchQuery::new("rust").with_subreddit("  ");
        assert!(global.subreddit.is_none());
        assert!(!global.is_deep());
    }
}
