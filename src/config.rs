/*!
 * Configuration handling for code-extractor
 */

use std::path::PathBuf;

use clap::Parser;
use clap_complete::Shell;

use crate::ensure;
use crate::error::Result;

/// Command-line arguments for code-extractor
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "code-extractor",
    version = env!("CARGO_PKG_VERSION"),
    about = "Generate a Markdown snapshot of a project for LLM context",
    long_about = "Detects the project type, applies its ignore rules and writes a single Markdown document with the directory tree, a media catalog and the contents of every text file."
)]
pub struct Args {
    /// Project root directory to scan
    #[clap(default_value = ".")]
    pub directory_path: String,

    /// Extra exclude patterns (gitignore syntax, repeatable or comma-separated)
    #[clap(short = 'e', long = "exclude", value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Force-include patterns that win over every exclude rule
    #[clap(short = 'i', long = "include", value_delimiter = ',')]
    pub include: Vec<String>,

    /// Override the detected project type (e.g. vue, react, nodejs, android)
    #[clap(short = 't', long = "type")]
    pub project_type: Option<String>,

    /// Directory the report is written to
    #[clap(short = 'o', long, default_value = "output")]
    pub output_dir: String,

    /// Generate shell completions
    #[clap(long = "generate", value_enum)]
    pub generate: Option<Shell>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[clap(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable progress output, logging and the summary table
    #[clap(short = 'q', long)]
    pub quiet: bool,
}

/// Size and count thresholds applied during a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Directories with more filtered entries than this are pruned
    pub max_dir_items: usize,
    /// Entries kept from a pruned directory
    pub keep_dir_items: usize,
    /// Files up to this many bytes are emitted verbatim
    pub max_file_size: u64,
    /// Bytes kept from each end of a truncated file
    pub preview_size: u64,
    /// JSON arrays/objects larger than this are pruned
    pub prune_threshold: usize,
    /// Elements or keys kept from a pruned JSON container
    pub prune_keep: usize,
    /// JSON nesting beyond this depth is replaced by a placeholder
    pub max_json_depth: usize,
    /// Media items listed per directory
    pub max_media_items: usize,
    /// Leading bytes read when probing image dimensions
    pub image_probe_bytes: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_dir_items: 100,
            keep_dir_items: 3,
            max_file_size: 100 * 1024,
            preview_size: 5 * 1024,
            prune_threshold: 100,
            prune_keep: 3,
            max_json_depth: 10,
            max_media_items: 200,
            image_probe_bytes: 512 * 1024,
        }
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Project root to scan
    pub target_dir: PathBuf,

    /// Directory the report is written to
    pub output_dir: PathBuf,

    /// Caller-supplied exclude patterns
    pub extra_excludes: Vec<String>,

    /// Caller-supplied force-include patterns
    pub extra_includes: Vec<String>,

    /// Project type chosen by the caller instead of detection
    pub project_type: Option<String>,

    /// Thresholds for pruning and truncation
    pub limits: Limits,
}

impl Config {
    /// Configuration for scanning `target_dir` with default settings
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
            output_dir: PathBuf::from("output"),
            extra_excludes: Vec::new(),
            extra_includes: Vec::new(),
            project_type: None,
            limits: Limits::default(),
        }
    }

    /// Create configuration from command-line arguments
    pub fn from_args(args: Args) -> Self {
        Self {
            target_dir: PathBuf::from(args.directory_path),
            output_dir: PathBuf::from(args.output_dir),
            extra_excludes: clean_patterns(args.exclude),
            extra_includes: clean_patterns(args.include),
            project_type: args
                .project_type
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            limits: Limits::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.target_dir.is_dir(),
            RootNotFound,
            "{}",
            self.target_dir.display()
        );
        ensure!(
            self.limits.keep_dir_items <= self.limits.max_dir_items,
            Config,
            "keep_dir_items ({}) must not exceed max_dir_items ({})",
            self.limits.keep_dir_items,
            self.limits.max_dir_items
        );
        ensure!(
            self.limits.prune_keep <= self.limits.prune_threshold,
            Config,
            "prune_keep ({}) must not exceed prune_threshold ({})",
            self.limits.prune_keep,
            self.limits.prune_threshold
        );
        Ok(())
    }
}

/// Trim patterns and drop empty ones
fn clean_patterns(patterns: Vec<String>) -> Vec<String> {
    patterns
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}
