use chrono::{NaiveDate, NaiveDateTime};

/// Format a date for the digest title, e.g. "June 7, 2025".
pub fn format_date_for_title(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Convert text to a URL-friendly slug.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for c in text.trim().to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_hyphen = true;
        }
        // Any other punctuation is dropped entirely.
    }

    slug
}

/// Render how long ago `then` was relative to `now`, e.g. "5h ago" or "2d ago".
///
/// Timestamps in the future (clock skew between the feed and this machine)
/// clamp to "0h ago".
pub fn time_ago(then: NaiveDateTime, now: NaiveDateTime) -> String {
    let hours = (now - then).num_hours().max(0);
    if hours < 24 {
        format!("{hours}h ago")
    } else {
        format!("{}d ago", hours / 24)
    }
}
