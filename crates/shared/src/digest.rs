use chrono::{Local, NaiveDate};

use crate::models::{Digest, Story};
use crate::utils::{format_date_for_title, time_ago};

/// Combine the day's stories and optional overview into a digest.
///
/// Input order is preserved exactly; the assembler never reorders, filters,
/// or mutates stories beyond what the caller already did.
pub fn assemble(date: NaiveDate, stories: Vec<Story>, overview: Option<String>) -> Digest {
    Digest {
        date,
        stories,
        overview,
        generated_at: Local::now().naive_local(),
    }
}

/// Render a digest as the Markdown document that gets persisted.
pub fn render(digest: &Digest) -> String {
    let mut md = String::new();

    md.push_str(&format!(
        "# Daily News Digest - {}\n\n",
        format_date_for_title(digest.date)
    ));

    if let Some(overview) = &digest.overview {
        md.push_str("## Today's Overview\n\n");
        md.push_str(overview.trim());
        md.push_str("\n\n");
    }

    md.push_str("## Top Stories\n\n");

    for story in &digest.stories {
        md.push_str(&format!("### [{}]({})\n\n", story.title, story.url));
        md.push_str(&format!(
            "*{}* · {}\n\n",
            story.source,
            time_ago(story.published, digest.generated_at)
        ));

        // Prefer the AI summary, fall back to the feed's own summary.
        let summary = story
            .ai_summary
            .as_deref()
            .or(story.summary.as_deref())
            .unwrap_or("");
        if !summary.trim().is_empty() {
            md.push_str(summary.trim());
            md.push_str("\n\n");
        }
    }

    md
}
