//! Text normalization shared by every backend adapter.

use url::Url;

pub const REDDIT_WEB_BASE: &str = "https://reddit.com";

/// Bodies Reddit substitutes for moderated or deleted content.
pub const REMOVAL_SENTINELS: [&str; 2] = ["[removed]", "[deleted]"];

pub fn is_removed_body(body: &str) -> bool {
    REMOVAL_SENTINELS.contains(&body)
}

/// Cuts `text` to `max_chars` characters and appends a marker naming the
/// exact number of characters dropped. `max_chars == 0` disables truncation.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return text.to_string();
    }

    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }

    let kept: String = text.chars().take(max_chars).collect();
    format!(
        "{} ... ({} more chars)",
        kept,
        group_thousands((total - max_chars) as u64)
    )
}

/// Formats `n` with comma thousands separators.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Resolves a relative permalink against reddit.com. Missing or unusable
/// permalinks give an empty string rather than a malformed URL.
pub fn permalink_url(permalink: Option<&str>) -> String {
    let Some(permalink) = permalink.map(str::trim).filter(|p| !p.is_empty()) else {
        return String::new();
    };

    Url::parse(REDDIT_WEB_BASE)
        .and_then(|base| base.join(permalink))
        .map(|url| url.to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncation_reports_exact_elided_count() {
        let text = "a".repeat(3000);
        let out = truncate_text(&text, 500);
        let marker = " ... (2,500 more chars)";

        assert!(out.ends_with(marker));
        assert_eq!(out.chars().count(), 500 + marker.len());
        assert!(out.starts_with(&"a".repeat(500)));
    }

    #[test]
    fn test_truncation_limits() {
        assert_eq!(truncate_text("short", 500), "short");
        assert_eq!(truncate_text("exact", 5), "exact");
        let long = "x".repeat(10_000);
        assert_eq!(truncate_text(&long, 0), long);
        assert_eq!(truncate_text("héllo wörld", 5), "héllo ... (6 more chars)");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[test]
    fn test_permalink_url() {
        assert_eq!(
            permalink_url(Some("/r/rust/comments/abc/title/")),
            "https://reddit.com/r/rust/comments/abc/title/"
        );
        assert_eq!(permalink_url(None), "");
        assert_eq!(permalink_url(Some("")), "");
    }

    #[test]
    fn test_removal_sentinels() {
        assert!(is_removed_body("[removed]"));
        assert!(is_removed_body("[deleted]"));
        assert!(!is_removed_body("deleted"));
    }
}
