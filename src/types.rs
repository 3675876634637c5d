/*!
 * Core types and data structures for code-extractor
 */

use serde_json::Value;
use strum::Display;

/// Outcome of consulting the rule set for one path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Force-included; exclusion rules were not consulted
    Include,
    /// Matched an exclude rule
    Exclude,
    /// No rule applied, kept by default
    Pass,
}

impl Decision {
    /// Whether the entry stays in the traversal
    pub fn is_kept(self) -> bool {
        !matches!(self, Decision::Exclude)
    }
}

/// What the content transformer produced for a single file
#[derive(Debug, Clone, PartialEq)]
pub enum ContentResult {
    /// Binary file, no content emitted
    Skipped,
    /// Small text file, emitted verbatim
    Raw(String),
    /// Large non-JSON file, head and tail previews only
    Truncated {
        head: String,
        tail: String,
        original_size: u64,
        omitted: u64,
    },
    /// Large JSON document after structural pruning
    StructurallyPruned { value: Value, original_size: u64 },
    /// The file could not be read
    Error(String),
}

/// Media category, derived from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum MediaKind {
    Image,
    Audio,
    Video,
}

/// A media file found in a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    /// File name
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Media category
    pub kind: MediaKind,
    /// `WxH` for images, `N/A` when the header could not be parsed
    pub dimensions: Option<String>,
}

/// Counters collected while walking the tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStatistics {
    /// Directories whose listing was read
    pub directories: usize,
    /// Directories that could not be listed
    pub unreadable_directories: usize,
    /// Directories whose listing was cut by fan-out pruning
    pub pruned_directories: usize,
    /// Files handed to the content transformer
    pub files_processed: usize,
    /// Files emitted verbatim
    pub raw_files: usize,
    /// Large files emitted as head/tail previews
    pub truncated_files: usize,
    /// Large JSON files emitted after pruning
    pub pruned_json_files: usize,
    /// Binary files without content
    pub binary_files: usize,
    /// Files that failed to read
    pub failed_files: usize,
    /// Media items listed across all directories
    pub media_items: usize,
}

/// A directory entry that survived rule filtering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEntry {
    /// File or directory name
    pub name: String,
    /// Whether the entry is a directory (symlinks count as files)
    pub is_dir: bool,
}

/// Media found in one directory, largest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSummary {
    /// Directory path relative to the scan root, `/` for the root itself
    pub directory: String,
    /// Number of media files found before truncation
    pub total: usize,
    /// Listed items, at most the configured limit
    pub items: Vec<MediaItem>,
}

impl MediaSummary {
    /// Whether only the largest items are listed
    pub fn is_truncated(&self) -> bool {
        self.total > self.items.len()
    }
}
