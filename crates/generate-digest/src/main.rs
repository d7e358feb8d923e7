use chrono::NaiveDate;
use clap::Parser;
use shared::{Config, ContentExtractor, DigestGenerator, GoogleNewsSource, OpenAiSummarizer};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "generate-digest")]
#[command(about = "Generate a daily news digest with optional AI-powered summarization")]
struct Args {
    /// Generate the digest for a specific date (YYYY-MM-DD, default: today)
    #[arg(short, long)]
    date: Option<String>,

    /// Force regeneration even if the digest exists
    #[arg(short, long)]
    force: bool,

    /// Maximum number of stories to include
    #[arg(short = 'n', long = "stories", default_value = "10")]
    stories: usize,

    /// Disable AI-powered summarization
    #[arg(long)]
    no_llm: bool,

    /// OpenAI model to use for summarization (ignored if --no-llm is set)
    #[arg(long, default_value = shared::summarizer::DEFAULT_MODEL)]
    model: String,

    /// Sampling temperature for summarization
    #[arg(long, default_value_t = shared::summarizer::DEFAULT_TEMPERATURE)]
    temperature: f32,

    /// Directory digests are written to
    #[arg(long, default_value = "content")]
    output_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_date(input: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if run(args).await {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn run(args: Args) -> bool {
    let date = match args.date.as_deref().map(parse_date) {
        Some(Ok(date)) => Some(date),
        Some(Err(_)) => {
            error!("Invalid date format. Use YYYY-MM-DD");
            return false;
        }
        None => None,
    };

    if args.stories == 0 {
        error!("--stories must be at least 1");
        return false;
    }

    debug!(
        date = ?args.date,
        stories = args.stories,
        llm_enabled = !args.no_llm,
        model = %args.model,
        output_dir = %args.output_dir.display(),
        "configuration"
    );

    let source = match GoogleNewsSource::new() {
        Ok(source) => source,
        Err(e) => {
            error!("Failed to set up story source: {e:#}");
            return false;
        }
    };

    let mut generator =
        DigestGenerator::new(Box::new(source), args.stories, args.output_dir.clone());

    if !args.no_llm {
        let config = match Config::from_env() {
            Ok(config) => config,
            Err(e) => {
                error!("{e:#}");
                return false;
            }
        };

        let summarizer = match OpenAiSummarizer::new(
            config.openai_api_key,
            args.model.clone(),
            args.temperature,
        ) {
            Ok(summarizer) => summarizer,
            Err(e) => {
                error!("Failed to set up summarizer: {e:#}");
                return false;
            }
        };

        let extractor = match ContentExtractor::new() {
            Ok(extractor) => extractor,
            Err(e) => {
                error!("Failed to set up content extractor: {e:#}");
                return false;
            }
        };

        generator = generator
            .with_summarizer(Box::new(summarizer))
            .with_extractor(extractor);
    }

    generator.generate_digest(date, args.force).await
}
