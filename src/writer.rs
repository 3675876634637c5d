/*!
 * Markdown report assembly for code-extractor
 */

use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use log::info;

use crate::error::Result;
use crate::project::ProjectType;
use crate::types::{MediaSummary, ScanStatistics};
use crate::utils::human_size;

/// Shortest fence used around embedded content
const MIN_FENCE_LEN: usize = 4;

/// Fence tag for extensionless files
const GENERIC_LANGUAGE: &str = "text";

/// Report header record
#[derive(Debug, Clone)]
pub struct Header {
    /// Name of the scanned directory
    pub project_name: String,
    /// Name of the directory containing it
    pub parent_dir: String,
    /// Resolved project type
    pub project_type: ProjectType,
    /// When the scan ran
    pub generated_at: DateTime<Local>,
    /// Caller-supplied exclude patterns
    pub extra_excludes: Vec<String>,
    /// Caller-supplied force-include patterns
    pub extra_includes: Vec<String>,
}

/// Content emitted for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSection {
    /// Path relative to the scan root, `/`-separated
    pub path: String,
    /// Fence tag
    pub language: String,
    /// Transformed content
    pub content: String,
}

/// A finished scan, ready to be rendered
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub header: Header,
    /// Rendered tree lines, starting with the `/` root marker
    pub tree: String,
    /// Media summaries in traversal order
    pub media: Vec<MediaSummary>,
    /// File sections in traversal order
    pub files: Vec<FileSection>,
    pub statistics: ScanStatistics,
}

impl Snapshot {
    /// Deterministic report file name: `{project}-{type}-{parent}.md`
    pub fn file_name(&self) -> String {
        format!(
            "{}-{}-{}.md",
            sanitize(&self.header.project_name),
            sanitize(self.header.project_type.label()),
            sanitize(&self.header.parent_dir)
        )
    }

    /// Header, tree, media (when present) and contents, in that order
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_header(&mut out);
        self.render_tree(&mut out);
        if !self.media.is_empty() {
            self.render_media(&mut out);
        }
        self.render_files(&mut out);
        out
    }

    fn render_header(&self, out: &mut String) {
        let header = &self.header;
        let _ = writeln!(out, "# Project Snapshot: {}\n", header.project_name);
        let _ = writeln!(out, "- **Project:** {}", header.project_name);
        let _ = writeln!(out, "- **Type:** {}", header.project_type.label());
        let _ = writeln!(out, "- **Parent Directory:** {}", header.parent_dir);
        let _ = writeln!(
            out,
            "- **Generated:** {}",
            header.generated_at.format("%Y-%m-%d %H:%M:%S")
        );
        if !header.extra_excludes.is_empty() {
            let _ = writeln!(
                out,
                "- **Extra Excludes:** {}",
                inline_list(&header.extra_excludes)
            );
        }
        if !header.extra_includes.is_empty() {
            let _ = writeln!(
                out,
                "- **Extra Includes:** {}",
                inline_list(&header.extra_includes)
            );
        }
        out.push('\n');
    }

    fn render_tree(&self, out: &mut String) {
        out.push_str("## Directory Tree\n\n");
        push_fenced(out, GENERIC_LANGUAGE, &self.tree);
        out.push('\n');
    }

    fn render_media(&self, out: &mut String) {
        out.push_str("## Media Assets\n\n");
        for summary in &self.media {
            let _ = writeln!(out, "### {}\n", summary.directory);
            if summary.is_truncated() {
                let _ = writeln!(
                    out,
                    "{} media files, showing the largest {}\n",
                    summary.total,
                    summary.items.len()
                );
            } else {
                let _ = writeln!(out, "{} media files\n", summary.total);
            }
            for (index, item) in summary.items.iter().enumerate() {
                let _ = write!(
                    out,
                    "{}. [{}] {} - {}",
                    index + 1,
                    item.kind,
                    item.name,
                    human_size(item.size)
                );
                if let Some(dimensions) = &item.dimensions {
                    let _ = write!(out, " (dimensions: {})", dimensions);
                }
                out.push('\n');
            }
            out.push('\n');
        }
    }

    fn render_files(&self, out: &mut String) {
        out.push_str("## File Contents\n");
        for file in &self.files {
            let _ = writeln!(out, "\n### {}\n", file.path);
            push_fenced(out, &file.language, &file.content);
        }
    }
}

/// Writes snapshots into the output directory
pub struct MarkdownWriter {
    output_dir: PathBuf,
}

impl MarkdownWriter {
    /// Create a new Markdown writer
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Render the snapshot and write it, replacing any previous report of
    /// the same name
    pub fn write(&self, snapshot: &Snapshot) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(snapshot.file_name());

        let file = File::create(&path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(snapshot.render().as_bytes())?;
        writer.flush()?;

        info!("Report written to {}", path.display());
        Ok(path)
    }
}

/// Backtick fence longer than any backtick run inside `content`
pub fn fence_for(content: &str) -> String {
    let mut longest = 0;
    let mut current = 0;
    for c in content.chars() {
        if c == '`' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    "`".repeat(MIN_FENCE_LEN.max(longest + 1))
}

/// Fence tag derived from the file extension
pub fn language_tag(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .filter(|ext| !ext.is_empty())
        .unwrap_or_else(|| GENERIC_LANGUAGE.to_string())
}

fn push_fenced(out: &mut String, language: &str, content: &str) {
    let fence = fence_for(content);
    let _ = writeln!(out, "{}{}", fence, language);
    out.push_str(content);
    if !content.ends_with('\n') {
        out.push('\n');
    }
    let _ = writeln!(out, "{}", fence);
}

fn inline_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("{0}{1}{0}", fence_inline(item), item))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Inline code delimiter for a pattern that may itself contain backticks
fn fence_inline(item: &str) -> &'static str {
    if item.contains('`') {
        "``"
    } else {
        "`"
    }
}

/// Keep file name components free of path separators
fn sanitize(component: &str) -> String {
    component
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect()
}
