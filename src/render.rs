use reddit_client::{SearchResponse, SearchStatus, ServiceStats};
use reddit_data_core::PostBundle;
use std::fmt::Write;

/// Markdown for a search or refinement result.
pub fn render_response(response: &SearchResponse) -> String {
    match response.status() {
        SearchStatus::Found => render_bundles(response),
        SearchStatus::Empty if response.from_session => {
            "No cached posts matched the refinement.".to_string()
        }
        SearchStatus::Empty => format!("No results found for \"{}\".", response.query.query),
        SearchStatus::Unavailable => {
            let failures = response.outcome.failures();
            let mut text = if failures.is_empty() {
                "**Error:** no backend could be queried.".to_string()
            } else {
                format!("**Error:** could not search right now. {}", failures.join(" "))
            };
            if response.outcome.retryable() {
                text.push_str(" Try again in a minute.");
            }
            text
        }
    }
}

fn render_bundles(response: &SearchResponse) -> String {
    let mut out = String::new();

    if let Some(session_id) = &response.session_id {
        let origin = if response.from_session {
            "cached"
        } else {
            "new"
        };
        let _ = writeln!(
            out,
            "_Session `{}` ({}): pass it to `refine` to filter these results without re-fetching._\n",
            session_id, origin
        );
    }

    for bundle in &response.outcome.bundles {
        render_bundle(&mut out, bundle, response.query.include_comments);
        out.push('\n');
    }

    out.trim_end().to_string()
}

fn render_bundle(out: &mut String, bundle: &PostBundle, include_comments: bool) {
    let post = &bundle.post;

    let _ = writeln!(out, "### {}", post.title);
    let _ = write!(
        out,
        "r/{} | Score: {} | Comments: {} | Source: {}",
        post.subreddit, post.score, post.num_comments, post.source
    );
    if let Some(rank) = post.synthetic_score {
        let _ = write!(out, " | Rank: {:.2}", rank);
    }
    out.push('\n');
    let _ = writeln!(out, "By u/{} | {}", post.author, post.url);

    if !post.body.is_empty() {
        let _ = writeln!(out, "\n{}", post.body);
    }

    if include_comments {
        if bundle.comments.is_empty() {
            out.push_str("\n_No comments_\n");
        } else {
            out.push_str("\n**Top comments:**\n");
            for comment in &bundle.comments {
                let _ = writeln!(
                    out,
                    "- **u/{}** (score: {}): {}",
                    comment.author, comment.score, comment.body
                );
            }
        }
    }
}

pub fn render_stats(stats: &ServiceStats) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Live tokens: {:.2}/{} (granted {}, denied {}, worst-case wait {:?})",
        stats.rate_limit.available_tokens,
        stats.rate_limit.max_tokens,
        stats.rate_limit.granted,
        stats.rate_limit.denied,
        stats.max_live_wait
    );
    let _ = writeln!(
        out,
        "Requests: {} ({} ok, {} failed, avg {:?})",
        stats.api.total_requests,
        stats.api.successful_requests,
        stats.api.failed_requests,
        stats.api.average_response_time
    );

    let mut endpoints: Vec<_> = stats.api.requests_by_endpoint.iter().collect();
    endpoints.sort_by(|a, b| a.0.cmp(b.0));
    for (endpoint, metrics) in endpoints {
        let _ = writeln!(
            out,
            "- {}: {} requests, {:.0}% ok, avg {:?}",
            endpoint,
            metrics.request_count,
            metrics.success_rate() * 100.0,
            metrics.average_response_time()
        );
    }

    let _ = write!(out, "Sessions cached: {}", stats.sessions);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use reddit_client::{AttemptOutcome, BackendAttempt, SearchOutcome};
    use reddit_data_core::{Comment, Post, SearchQuery, SourceTag};

    fn response(bundles: Vec<PostBundle>, attempts: Vec<BackendAttempt>) -> SearchResponse {
        SearchResponse {
            query: SearchQuery::new("tokio").with_comments(2),
            outcome: SearchOutcome { bundles, attempts },
            session_id: Some("abcdef123456".to_string()),
            from_session: false,
        }
    }

    fn bundle(comments: Vec<Comment>) -> PostBundle {
        PostBundle {
            post: Post {
                id: "p1".to_string(),
                title: "Tokio 2.0".to_string(),
                subreddit: "rust".to_string(),
                author: "ferris".to_string(),
                score: 99,
                num_comments: 12,
                url: "https://reddit.com/r/rust/comments/p1/".to_string(),
                body: "Big release".to_string(),
                source: SourceTag::Archival,
                upvote_ratio: Some(1.0),
                synthetic_score: Some(2.5649),
            },
            comments,
        }
    }

    #[test]
    fn test_render_found_with_comments() {
        let text = render_response(&response(
            vec![bundle(vec![Comment {
                author: "crab".to_string(),
                score: 4,
                body: "nice".to_string(),
            }])],
            vec![BackendAttempt {
                source: SourceTag::Archival,
                outcome: AttemptOutcome::Returned { count: 1 },
            }],
        ));

        assert!(text.contains("abcdef123456"));
        assert!(text.contains("### Tokio 2.0"));
        assert!(text.contains("r/rust | Score: 99 | Comments: 12 | Source: archival | Rank: 2.56"));
        assert!(text.contains("By u/ferris | https://reddit.com/r/rust/comments/p1/"));
        assert!(text.contains("- **u/crab** (score: 4): nice"));
    }

    #[test]
    fn test_render_no_comments_marker() {
        let text = render_response(&response(
            vec![bundle(Vec::new())],
            vec![BackendAttempt {
                source: SourceTag::Archival,
                outcome: AttemptOutcome::Returned { count: 1 },
            }],
        ));
        assert!(text.contains("_No comments_"));
    }

    #[test]
    fn test_empty_and_unavailable_are_distinguished() {
        let empty = render_response(&response(
            Vec::new(),
            vec![BackendAttempt {
                source: SourceTag::Archival,
                outcome: AttemptOutcome::Returned { count: 0 },
            }],
        ));
        assert_eq!(empty, "No results found for \"tokio\".");

        let unavailable = render_response(&response(
            Vec::new(),
            vec![BackendAttempt {
                source: SourceTag::Live,
                outcome: AttemptOutcome::Failed {
                    code: "BACKEND_TIMEOUT".to_string(),
                    error: "The live backend timed out. Please try again.".to_string(),
                    retryable: true,
                },
            }],
        ));
        assert!(unavailable.starts_with("**Error:**"));
        assert!(unavailable.contains("The live backend timed out."));
        assert!(unavailable.ends_with("Try again in a minute."));
    }

    #[test]
    fn test_permanent_failure_has_no_retry_hint() {
        let text = render_response(&response(
            Vec::new(),
            vec![BackendAttempt {
                source: SourceTag::Live,
                outcome: AttemptOutcome::Failed {
                    code: "BACKEND_HTTP_STATUS".to_string(),
                    error: "The live backend answered with HTTP 404.".to_string(),
                    retryable: false,
                },
            }],
        ));
        assert_eq!(
            text,
            "**Error:** could not search right now. The live backend answered with HTTP 404."
        );
    }

    #[test]
    fn test_refinement_without_matches() {
        let mut refined = response(Vec::new(), Vec::new());
        refined.from_session = true;
        assert_eq!(refined.status(), SearchStatus::Empty);
        assert_eq!(
            render_response(&refined),
            "No cached posts matched the refinement."
        );
    }
}
