//! Hybrid fetch orchestration.
//!
//! A [`RoutingPolicy`] turns a query into an ordered plan of backend steps,
//! each with its own admission rule. The [`Orchestrator`] walks that plan,
//! consulting the shared [`RateLimiter`] where a step asks for it, and
//! degrades every backend failure into "try the next step" or an empty
//! result. Nothing in here returns an error to the caller.

use crate::backend::Backend;
use crate::rate_limiter::RateLimiter;
use reddit_data_core::{
    BackendError, Comment, ErrorExt, Post, PostBundle, SearchQuery, SourceTag,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// How a plan step is admitted past the rate limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The backend is not rate limited.
    Unmetered,
    /// Take a token if one is available, otherwise skip the step.
    TryAcquire,
    /// Block until a token is available.
    WaitAcquire,
}

#[derive(Clone)]
pub struct FetchStep {
    pub backend: Arc<dyn Backend>,
    pub admission: Admission,
}

impl FetchStep {
    pub fn new(backend: Arc<dyn Backend>, admission: Admission) -> Self {
        Self { backend, admission }
    }
}

/// Chooses backend order for posts and comments.
pub trait RoutingPolicy: Send + Sync {
    fn post_plan(&self, query: &SearchQuery) -> Vec<FetchStep>;
    fn comment_plan(&self, post: &Post) -> Vec<FetchStep>;
}

/// Archival first for subreddit-scoped searches with a non-blocking live
/// fallback; live-only (blocking) for global searches. Comments prefer
/// live when a token is free and fall back to archival.
pub struct HybridRouting {
    archival: Arc<dyn Backend>,
    live: Arc<dyn Backend>,
}

impl HybridRouting {
    pub fn new(archival: Arc<dyn Backend>, live: Arc<dyn Backend>) -> Self {
        Self { archival, live }
    }
}

impl RoutingPolicy for HybridRouting {
    fn post_plan(&self, query: &SearchQuery) -> Vec<FetchStep> {
        match query.subreddit {
            Some(_) => vec![
                FetchStep::new(Arc::clone(&self.archival), Admission::Unmetered),
                FetchStep::new(Arc::clone(&self.live), Admission::TryAcquire),
            ],
            None => vec![FetchStep::new(Arc::clone(&self.live), Admission::WaitAcquire)],
        }
    }

    fn comment_plan(&self, _post: &Post) -> Vec<FetchStep> {
        vec![
            FetchStep::new(Arc::clone(&self.live), Admission::TryAcquire),
            FetchStep::new(Arc::clone(&self.archival), Admission::Unmetered),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Returned { count: usize },
    /// `error` is the user-facing message; `code` the stable error code.
    Failed {
        code: String,
        error: String,
        retryable: bool,
    },
    Denied,
    Unsupported,
}

/// One backend call (or non-call) made while answering a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendAttempt {
    pub source: SourceTag,
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    /// At least one post came back.
    Found,
    /// A backend answered and had nothing.
    Empty,
    /// No backend could be asked successfully.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub bundles: Vec<PostBundle>,
    pub attempts: Vec<BackendAttempt>,
}

impl SearchOutcome {
    pub fn status(&self) -> SearchStatus {
        if !self.bundles.is_empty() {
            SearchStatus::Found
        } else if self
            .attempts
            .iter()
            .any(|a| matches!(a.outcome, AttemptOutcome::Returned { .. }))
        {
            SearchStatus::Empty
        } else {
            SearchStatus::Unavailable
        }
    }

    /// Failure messages collected along the way, for diagnostics.
    pub fn failures(&self) -> Vec<String> {
        self.attempts
            .iter()
            .filter_map(|a| match &a.outcome {
                AttemptOutcome::Failed { error, .. } => Some(error.clone()),
                AttemptOutcome::Denied => {
                    Some(format!("The {} backend is rate limited right now.", a.source))
                }
                _ => None,
            })
            .collect()
    }

    /// True when some failure is transient, or a backend was only denied
    /// a token, so asking again later may succeed.
    pub fn retryable(&self) -> bool {
        self.attempts.iter().any(|a| match &a.outcome {
            AttemptOutcome::Failed { retryable, .. } => *retryable,
            AttemptOutcome::Denied => true,
            _ => false,
        })
    }

    pub fn posts(&self) -> impl Iterator<Item = &Post> {
        self.bundles.iter().map(|b| &b.post)
    }
}

pub struct Orchestrator {
    routing: Arc<dyn RoutingPolicy>,
    limiter: Arc<RateLimiter>,
}

impl Orchestrator {
    pub fn new(routing: Arc<dyn RoutingPolicy>, limiter: Arc<RateLimiter>) -> Self {
        Self { routing, limiter }
    }

    pub fn hybrid(
        archival: Arc<dyn Backend>,
        live: Arc<dyn Backend>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self::new(Arc::new(HybridRouting::new(archival, live)), limiter)
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    async fn admit(&self, admission: Admission) -> bool {
        match admission {
            Admission::Unmetered => true,
            Admission::TryAcquire => self.limiter.acquire(false).await,
            Admission::WaitAcquire => self.limiter.acquire(true).await,
        }
    }

    /// Runs the post plan: the first step that yields posts wins; a step
    /// that fails, returns nothing, or is denied a token hands over to the
    /// next one.
    pub async fn fetch_posts(&self, query: &SearchQuery) -> (Vec<Post>, Vec<BackendAttempt>) {
        let mut attempts = Vec::new();

        for step in self.routing.post_plan(query) {
            let source = step.backend.source();

            if !step.backend.supports(query) {
                debug!("Skipping {} backend: query shape not supported", source);
                attempts.push(BackendAttempt {
                    source,
                    outcome: AttemptOutcome::Unsupported,
                });
                continue;
            }

            if !self.admit(step.admission).await {
                debug!("No rate limit token for {} backend, skipping", source);
                attempts.push(BackendAttempt {
                    source,
                    outcome: AttemptOutcome::Denied,
                });
                continue;
            }

            match step.backend.fetch_posts(query).await {
                Ok(mut posts) => {
                    attempts.push(BackendAttempt {
                        source,
                        outcome: AttemptOutcome::Returned { count: posts.len() },
                    });
                    if posts.is_empty() {
                        debug!("{} backend returned no posts, trying next", source);
                        continue;
                    }
                    for post in &mut posts {
                        post.source = source;
                    }
                    info!("{} backend returned {} posts", source, posts.len());
                    return (posts, attempts);
                }
                Err(e) => {
                    e.log_warn();
                    attempts.push(failed(source, &e));
                }
            }
        }

        (Vec::new(), attempts)
    }

    /// Runs the comment plan for one post. Unlike posts, an empty comment
    /// list is a final answer; only denial or failure moves on.
    pub async fn fetch_comments(&self, post: &Post, limit: u32, max_chars: usize) -> Vec<Comment> {
        for step in self.routing.comment_plan(post) {
            let source = step.backend.source();

            if !self.admit(step.admission).await {
                debug!(
                    "No rate limit token for {} comments on {}, falling back",
                    source, post.id
                );
                continue;
            }

            match step.backend.fetch_comments(&post.id, limit, max_chars).await {
                Ok(comments) => return comments,
                Err(e) => {
                    e.log_warn();
                }
            }
        }

        Vec::new()
    }

    /// Posts for `query`, each paired with its comments when the query
    /// asks for them. Comments are fetched one post at a time so limiter
    /// pacing spaces out the live calls.
    pub async fn search(&self, query: &SearchQuery) -> SearchOutcome {
        let (posts, attempts) = self.fetch_posts(query).await;

        let bundles = if query.include_comments {
            let mut bundles = Vec::with_capacity(posts.len());
            for post in posts {
                let comments = self
                    .fetch_comments(&post, query.comments_per_post, query.max_chars)
                    .await;
                bundles.push(PostBundle { post, comments });
            }
            bundles
        } else {
            posts
                .into_iter()
                .map(|post| PostBundle {
                    post,
                    comments: Vec::new(),
                })
                .collect()
        };

        SearchOutcome { bundles, attempts }
    }
}

fn failed(source: SourceTag, error: &BackendError) -> BackendAttempt {
    BackendAttempt {
        source,
        outcome: AttemptOutcome::Failed {
            code: error.error_code(),
            error: error.user_friendly_message(),
            retryable: error.is_retryable(),
        },
    }
}
