use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One news item as produced by a story source.
///
/// Immutable once fetched, except for `ai_summary` which the generation
/// pipeline fills in after the summarization step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    pub title: String,
    pub url: String,
    pub source: String,
    /// Publication time, normalized to local time at second precision.
    pub published: NaiveDateTime,
    /// Raw summary provided by the feed, if any.
    pub summary: Option<String>,
    /// AI-generated summary, if summarization ran and succeeded for this item.
    pub ai_summary: Option<String>,
}

impl Story {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        source: impl Into<String>,
        published: NaiveDateTime,
        summary: Option<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            source: source.into(),
            published,
            summary,
            ai_summary: None,
        }
    }

    /// A story without a title or URL cannot be rendered and is dropped
    /// before assembly.
    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty() && !self.url.trim().is_empty()
    }
}

/// One day's assembled digest, ready for rendering.
#[derive(Debug, Serialize, Deserialize)]
pub struct Digest {
    pub date: NaiveDate,
    /// Stories in feed order. Never re-sorted.
    pub stories: Vec<Story>,
    /// Daily synthesis across all story summaries, when available.
    pub overview: Option<String>,
    pub generated_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 7)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    #[test]
    fn story_with_title_and_url_is_valid() {
        let story = Story::new("Title", "https://example.com", "Reuters", sample_time(), None);
        assert!(story.is_valid());
    }

    #[test]
    fn story_with_blank_title_is_invalid() {
        let story = Story::new("   ", "https://example.com", "Reuters", sample_time(), None);
        assert!(!story.is_valid());
    }

    #[test]
    fn story_with_empty_url_is_invalid() {
        let story = Story::new("Title", "", "Reuters", sample_time(), None);
        assert!(!story.is_valid());
    }
}
