use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::Story;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("feed parse error: {0}")]
    Parse(String),
}

/// Any provider of "today's top stories".
#[async_trait]
pub trait StorySource: Send + Sync {
    /// Fetch up to `max_count` stories in feed order.
    ///
    /// An empty vec means the source answered but had nothing usable;
    /// transport and feed-level failures are errors.
    async fn fetch(&self, max_count: usize) -> Result<Vec<Story>, SourceError>;
}

const FEED_URL: &str = "https://news.google.com/rss";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Fetches top stories from the Google News RSS feed.
pub struct GoogleNewsSource {
    client: Client,
}

impl GoogleNewsSource {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl StorySource for GoogleNewsSource {
    async fn fetch(&self, max_count: usize) -> Result<Vec<Story>, SourceError> {
        debug!(url = FEED_URL, max_count, "fetching top stories");

        let response = self
            .client
            .get(FEED_URL)
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        let stories = parse_feed(&body, max_count)?;

        if stories.is_empty() {
            warn!(
                bytes = body.len(),
                "feed fetched successfully but no valid stories were extracted"
            );
        }

        Ok(stories)
    }
}

#[derive(Default)]
struct RawItem {
    title: Option<String>,
    link: Option<String>,
    pub_date: Option<String>,
    description: Option<String>,
}

impl RawItem {
    fn set(&mut self, element: &str, text: &str) {
        if text.is_empty() {
            return;
        }
        let slot = match element {
            "title" => &mut self.title,
            "link" => &mut self.link,
            "pubDate" => &mut self.pub_date,
            "description" => &mut self.description,
            _ => return,
        };
        *slot = Some(text.to_string());
    }
}

/// Parse an RSS feed into stories, capped at `max_count` items.
///
/// Items that fail to parse are logged and skipped; only XML-level
/// corruption is an error.
fn parse_feed(xml: &str, max_count: usize) -> Result<Vec<Story>, SourceError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stories = Vec::new();
    let mut buf = Vec::new();

    let mut in_item = false;
    let mut current_element: Option<String> = None;
    let mut item = RawItem::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                match name.as_str() {
                    "item" => {
                        in_item = true;
                        item = RawItem::default();
                    }
                    "title" | "link" | "pubDate" | "description" if in_item => {
                        current_element = Some(name);
                    }
                    _ => {}
                }
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                if name == "item" && in_item {
                    if let Some(story) = story_from_item(&item) {
                        stories.push(story);
                    }
                    in_item = false;
                    if stories.len() >= max_count {
                        break;
                    }
                }
                current_element = None;
            }
            Ok(Event::Text(e)) => {
                if let Some(ref element) = current_element {
                    let text = e
                        .unescape()
                        .map_err(|e| SourceError::Parse(e.to_string()))?;
                    item.set(element, text.trim());
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(ref element) = current_element {
                    let text = String::from_utf8_lossy(&e.into_inner()).to_string();
                    item.set(element, text.trim());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(SourceError::Parse(format!("XML parse error: {e}"))),
            _ => {}
        }
        buf.clear();
    }

    Ok(stories)
}

/// Convert one parsed `<item>` into a story, or skip it with a warning.
fn story_from_item(item: &RawItem) -> Option<Story> {
    let (Some(raw_title), Some(link), Some(pub_date)) = (
        item.title.as_deref(),
        item.link.as_deref(),
        item.pub_date.as_deref(),
    ) else {
        warn!(title = ?item.title, "skipping feed item with missing fields");
        return None;
    };

    let published = match DateTime::parse_from_rfc2822(pub_date) {
        Ok(dt) => dt.with_timezone(&Local).naive_local(),
        Err(e) => {
            warn!(title = raw_title, pub_date, error = %e, "skipping feed item with bad pubDate");
            return None;
        }
    };

    // Google News titles are "Headline - Publisher"; the last segment is
    // the publisher.
    let (title, source) = match raw_title.rsplit_once(" - ") {
        Some((title, source)) => (title.trim(), source.trim()),
        None => (raw_title, "Unknown Source"),
    };

    Some(Story::new(
        title,
        link,
        source,
        published,
        item.description.clone(),
    ))
}
