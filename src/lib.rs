/*!
 * code-extractor - Generate a Markdown snapshot of a project for LLM context
 *
 * This library walks a project tree under a layered ignore/include rule set
 * and produces a single document with the directory tree, a catalog of media
 * assets and the (possibly truncated or pruned) contents of every text file.
 */

pub mod config;
pub mod error;
pub mod media;
pub mod project;
pub mod report;
pub mod rules;
pub mod scanner;
pub mod transform;
pub mod types;
pub mod utils;
pub mod writer;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use indicatif::ProgressBar;

// Re-export main components for easier access
pub use config::{Config, Limits};
pub use error::{ExtractorError, Result};
pub use media::MediaCataloger;
pub use project::{detect, Profile, ProjectKind, ProjectType};
pub use report::{ReportFormat, Reporter, ScanReport};
pub use rules::RuleSet;
pub use scanner::{ScanOutcome, Scanner};
pub use transform::Transformer;
pub use types::{ContentResult, Decision, MediaItem, MediaKind, ScanStatistics};
pub use writer::{MarkdownWriter, Snapshot};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Scan a project without progress output and write its report
pub fn scan(config: Config) -> Result<ScanOutcome> {
    Scanner::new(config, Arc::new(ProgressBar::hidden())).scan()
}
