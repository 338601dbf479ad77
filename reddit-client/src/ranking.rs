//! Client-side popularity ranking for backends whose native score is a
//! stale ingest-time snapshot.

use reddit_data_core::{Post, SortKey, MAX_LIMIT};

/// Candidate multiplier used when a popularity sort will be re-ranked locally.
pub const OVERFETCH_FACTOR: u32 = 5;

/// `ln(num_comments + 1) * upvote_ratio`, or zero for posts nobody discussed.
pub fn synthetic_score(num_comments: i64, upvote_ratio: Option<f64>) -> f64 {
    if num_comments <= 0 {
        return 0.0;
    }
    (num_comments as f64).ln_1p() * upvote_ratio.unwrap_or(1.0)
}

/// Number of candidates to request for `limit` results under `sort`.
pub fn request_size(limit: u32, sort: SortKey) -> u32 {
    if sort.is_popularity() {
        limit.saturating_mul(OVERFETCH_FACTOR).min(MAX_LIMIT)
    } else {
        limit.min(MAX_LIMIT)
    }
}

/// Scores every candidate, orders them by descending synthetic score and
/// keeps the first `limit`. Equal scores keep their input order.
pub fn rank_by_synthetic(mut posts: Vec<Post>, limit: usize) -> Vec<Post> {
    for post in &mut posts {
        post.synthetic_score = Some(synthetic_score(post.num_comments, post.upvote_ratio));
    }

    posts.sort_by(|a, b| {
        let a = a.synthetic_score.unwrap_or_default();
        let b = b.synthetic_score.unwrap_or_default();
        b.total_cmp(&a)
    });
    posts.truncate(limit);
    posts
}
