use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use tracing::{debug, error, info, warn};

use crate::digest;
use crate::error::DigestError;
use crate::extractor::ContentExtractor;
use crate::models::Story;
use crate::source::StorySource;
use crate::summarizer::Summarizer;
use crate::writer;

/// Drives one digest run: fetch, summarize, assemble, write.
///
/// This is the single place that decides what is fatal and what merely
/// degrades the output, and the only surface the CLI talks to.
pub struct DigestGenerator {
    source: Box<dyn StorySource>,
    summarizer: Option<Box<dyn Summarizer>>,
    extractor: Option<ContentExtractor>,
    max_stories: usize,
    output_dir: PathBuf,
}

impl DigestGenerator {
    pub fn new(source: Box<dyn StorySource>, max_stories: usize, output_dir: PathBuf) -> Self {
        Self {
            source,
            summarizer: None,
            extractor: None,
            max_stories,
            output_dir,
        }
    }

    pub fn with_summarizer(mut self, summarizer: Box<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    /// Attach a full-article extractor. Without one, summarization runs on
    /// the raw feed summaries.
    pub fn with_extractor(mut self, extractor: ContentExtractor) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Generate the digest for `date` (today when `None`).
    ///
    /// Returns `true` on success, including the no-op case where the digest
    /// already exists and `force` is not set. Repeated calls without `force`
    /// do the fetch/summarize/write work at most once. No error escapes
    /// this method; failures are logged and reported as `false`.
    pub async fn generate_digest(&self, date: Option<NaiveDate>, force: bool) -> bool {
        let date = date.unwrap_or_else(|| Local::now().date_naive());

        match self.run(date, force).await {
            Ok(path) => {
                info!(date = %date, path = %path.display(), "digest generated");
                true
            }
            Err(DigestError::AlreadyExists(path)) => {
                info!(
                    date = %date,
                    path = %path.display(),
                    "digest already exists, skipping (use force to regenerate)"
                );
                true
            }
            Err(e) => {
                error!(date = %date, error = %e, "digest generation failed");
                false
            }
        }
    }

    async fn run(&self, date: NaiveDate, force: bool) -> Result<PathBuf, DigestError> {
        if self.max_stories == 0 {
            return Err(DigestError::InvalidInput(
                "story count must be positive".to_string(),
            ));
        }

        // Fast path: nothing to do, and crucially nothing to fetch.
        let path = writer::digest_path(&self.output_dir, date);
        if path.exists() && !force {
            return Err(DigestError::AlreadyExists(path));
        }

        let fetched = self.source.fetch(self.max_stories).await?;
        let total = fetched.len();

        let mut stories: Vec<Story> = fetched.into_iter().filter(|s| s.is_valid()).collect();
        let dropped = total - stories.len();
        if dropped > 0 {
            warn!(dropped, "dropped stories missing a title or url");
        }

        if stories.is_empty() {
            // A digest with no stories is not a valid daily digest.
            warn!(date = %date, fetched = total, "no usable stories, aborting");
            return Err(DigestError::EmptySource);
        }

        info!(count = stories.len(), date = %date, "fetched stories");

        let mut overview = None;
        if let Some(summarizer) = &self.summarizer {
            let texts = self.article_texts(&stories).await;

            for (story, text) in stories.iter_mut().zip(texts) {
                let Some(text) = text else {
                    debug!(title = %story.title, "no article text or feed summary to summarize");
                    continue;
                };
                story.ai_summary = summarizer.summarize_article(&text).await;
                if story.ai_summary.is_none() {
                    warn!(title = %story.title, "article summarization failed, keeping feed summary");
                }
            }

            let summaries: Vec<String> = stories
                .iter()
                .filter_map(|s| s.ai_summary.clone())
                .collect();
            info!(
                summarized = summaries.len(),
                total = stories.len(),
                "article summarization complete"
            );

            if !summaries.is_empty() {
                overview = summarizer.summarize_day(&summaries).await;
                if overview.is_none() {
                    warn!("daily overview synthesis failed, continuing without one");
                }
            }
        }

        let digest = digest::assemble(date, stories, overview);
        let content = digest::render(&digest);

        let path = writer::write_digest(&content, &self.output_dir, date, force)?;
        Ok(path)
    }

    /// Text to summarize for each story, in story order: the full article
    /// body when an extractor is attached and succeeds, otherwise the feed
    /// summary, otherwise nothing.
    async fn article_texts(&self, stories: &[Story]) -> Vec<Option<String>> {
        match &self.extractor {
            Some(extractor) => {
                let urls: Vec<String> = stories.iter().map(|s| s.url.clone()).collect();
                let results = extractor.fetch_articles_parallel(urls).await;

                let by_url: HashMap<String, String> = results
                    .into_iter()
                    .filter_map(|(url, text)| text.map(|t| (url, t)))
                    .collect();

                stories
                    .iter()
                    .map(|s| by_url.get(&s.url).cloned().or_else(|| s.summary.clone()))
                    .collect()
            }
            None => stories.iter().map(|s| s.summary.clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceError;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 7).unwrap()
    }

    fn story(title: &str) -> Story {
        Story::new(
            title,
            format!("https://example.com/{title}"),
            "Reuters",
            date().and_hms_opt(6, 0, 0).unwrap(),
            Some(format!("About {title}")),
        )
    }

    struct StaticSource {
        stories: Vec<Story>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl StorySource for StaticSource {
        async fn fetch(&self, max_count: usize) -> Result<Vec<Story>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.stories.iter().take(max_count).cloned().collect())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl StorySource for FailingSource {
        async fn fetch(&self, _max_count: usize) -> Result<Vec<Story>, SourceError> {
            Err(SourceError::Parse("feed unreadable".to_string()))
        }
    }

    /// Summarizes any text not containing `fail_marker`; the overview
    /// records how many summaries it was given.
    struct EchoSummarizer {
        fail_marker: Option<String>,
    }

    #[async_trait]
    impl Summarizer for EchoSummarizer {
        async fn summarize_article(&self, text: &str) -> Option<String> {
            if let Some(marker) = &self.fail_marker {
                if text.contains(marker) {
                    return None;
                }
            }
            Some(format!("AI: {text}"))
        }

        async fn summarize_day(&self, summaries: &[String]) -> Option<String> {
            if summaries.is_empty() {
                return None;
            }
            Some(format!("Overview of {} stories", summaries.len()))
        }
    }

    fn generator_with(
        stories: Vec<Story>,
        output_dir: &TempDir,
    ) -> (DigestGenerator, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = StaticSource {
            stories,
            calls: calls.clone(),
        };
        let generator =
            DigestGenerator::new(Box::new(source), 10, output_dir.path().to_path_buf());
        (generator, calls)
    }

    #[tokio::test]
    async fn second_run_is_a_noop_with_identical_content() {
        let dir = TempDir::new().unwrap();
        let (generator, calls) = generator_with(vec![story("A"), story("B")], &dir);

        assert!(generator.generate_digest(Some(date()), false).await);
        let path = writer::digest_path(dir.path(), date());
        let first = fs::read_to_string(&path).unwrap();

        assert!(generator.generate_digest(Some(date()), false).await);
        let second = fs::read_to_string(&path).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn force_reruns_the_full_pipeline() {
        let dir = TempDir::new().unwrap();
        let (generator, calls) = generator_with(vec![story("A")], &dir);

        assert!(generator.generate_digest(Some(date()), false).await);
        assert!(generator.generate_digest(Some(date()), true).await);

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let path = writer::digest_path(dir.path(), date());
        assert!(path.exists());
    }

    #[tokio::test]
    async fn preserves_feed_order() {
        let dir = TempDir::new().unwrap();
        let (generator, _) = generator_with(vec![story("A"), story("B"), story("C")], &dir);

        assert!(generator.generate_digest(Some(date()), false).await);
        let content = fs::read_to_string(writer::digest_path(dir.path(), date())).unwrap();

        let a = content.find("### [A]").unwrap();
        let b = content.find("### [B]").unwrap();
        let c = content.find("### [C]").unwrap();
        assert!(a < b && b < c);
    }

    #[tokio::test]
    async fn source_failure_aborts_without_writing() {
        let dir = TempDir::new().unwrap();
        let generator =
            DigestGenerator::new(Box::new(FailingSource), 10, dir.path().to_path_buf());

        assert!(!generator.generate_digest(Some(date()), false).await);
        assert!(!writer::digest_path(dir.path(), date()).exists());
    }

    #[tokio::test]
    async fn empty_source_aborts_without_writing() {
        let dir = TempDir::new().unwrap();
        let (generator, _) = generator_with(vec![], &dir);

        assert!(!generator.generate_digest(Some(date()), false).await);
        assert!(!writer::digest_path(dir.path(), date()).exists());
    }

    #[tokio::test]
    async fn invalid_stories_are_filtered_not_fatal() {
        let dir = TempDir::new().unwrap();
        let mut bad = story("Bad");
        bad.url = String::new();
        let (generator, _) = generator_with(vec![story("Good"), bad], &dir);

        assert!(generator.generate_digest(Some(date()), false).await);
        let content = fs::read_to_string(writer::digest_path(dir.path(), date())).unwrap();
        assert!(content.contains("### [Good]"));
        assert!(!content.contains("### [Bad]"));
    }

    #[tokio::test]
    async fn all_stories_invalid_is_an_empty_source() {
        let dir = TempDir::new().unwrap();
        let mut bad = story("Bad");
        bad.title = "  ".to_string();
        let (generator, _) = generator_with(vec![bad], &dir);

        assert!(!generator.generate_digest(Some(date()), false).await);
        assert!(!writer::digest_path(dir.path(), date()).exists());
    }

    #[tokio::test]
    async fn zero_story_count_is_invalid_input() {
        let dir = TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let source = StaticSource {
            stories: vec![story("A")],
            calls: calls.clone(),
        };
        let generator = DigestGenerator::new(Box::new(source), 0, dir.path().to_path_buf());

        assert!(!generator.generate_digest(Some(date()), false).await);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn per_story_summarization_failure_degrades_gracefully() {
        let dir = TempDir::new().unwrap();
        let (generator, _) = generator_with(vec![story("A"), story("B"), story("C")], &dir);
        let generator = generator.with_summarizer(Box::new(EchoSummarizer {
            fail_marker: Some("About B".to_string()),
        }));

        assert!(generator.generate_digest(Some(date()), false).await);
        let content = fs::read_to_string(writer::digest_path(dir.path(), date())).unwrap();

        assert!(content.contains("AI: About A"));
        assert!(content.contains("AI: About C"));
        // Story B falls back to its feed summary.
        assert!(!content.contains("AI: About B"));
        assert!(content.contains("About B"));
        // The overview only counts the successful subset.
        assert!(content.contains("Overview of 2 stories"));
    }

    #[tokio::test]
    async fn full_summarization_scenario() {
        let dir = TempDir::new().unwrap();
        let (generator, _) = generator_with(vec![story("A"), story("B"), story("C")], &dir);
        let generator =
            generator.with_summarizer(Box::new(EchoSummarizer { fail_marker: None }));

        assert!(generator.generate_digest(Some(date()), false).await);
        let content = fs::read_to_string(writer::digest_path(dir.path(), date())).unwrap();

        assert!(content.contains("## Today's Overview"));
        assert!(content.contains("Overview of 3 stories"));
        assert_eq!(content.matches("### [").count(), 3);
        let overview_pos = content.find("Today's Overview").unwrap();
        let first_story_pos = content.find("### [A]").unwrap();
        assert!(overview_pos < first_story_pos);
    }

    #[tokio::test]
    async fn all_summarization_failures_skip_the_overview() {
        let dir = TempDir::new().unwrap();
        let (generator, _) = generator_with(vec![story("A")], &dir);
        let generator = generator.with_summarizer(Box::new(EchoSummarizer {
            fail_marker: Some("About".to_string()),
        }));

        assert!(generator.generate_digest(Some(date()), false).await);
        let content = fs::read_to_string(writer::digest_path(dir.path(), date())).unwrap();
        assert!(!content.contains("Today's Overview"));
        assert!(content.contains("About A"));
    }
}
