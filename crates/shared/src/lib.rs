// Public modules
pub mod config;
pub mod digest;
pub mod error;
pub mod extractor;
pub mod generator;
pub mod models;
pub mod source;
pub mod summarizer;
pub mod utils;
pub mod writer;

// Re-export commonly used types
pub use config::Config;
pub use error::DigestError;
pub use extractor::ContentExtractor;
pub use generator::DigestGenerator;
pub use models::{Digest, Story};
pub use source::{GoogleNewsSource, SourceError, StorySource};
pub use summarizer::{OpenAiSummarizer, Summarizer};
pub use writer::{digest_path, write_digest, WriteError};
