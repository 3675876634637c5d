/*!
 * Directory traversal and snapshot building
 *
 * The walk is depth-first and pre-order: a directory's line is written
 * before its children are visited. Pending work lives on an explicit stack
 * rather than the call stack, so very deep trees cannot overflow it.
 */

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use indicatif::ProgressBar;
use log::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::Result;
use crate::media::MediaCataloger;
use crate::project::{self, Profile};
use crate::rules::RuleSet;
use crate::transform::Transformer;
use crate::types::{ContentResult, FsEntry, MediaSummary, ScanStatistics};
use crate::utils::{absolute_path, compare_names, slash_path};
use crate::writer::{language_tag, FileSection, Header, MarkdownWriter, Snapshot};

/// Result of a scan that was written to disk
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// Where the report was written
    pub output_path: PathBuf,
    /// Project type label used for the report
    pub project_type: String,
    /// Scan statistics
    pub statistics: ScanStatistics,
}

/// Append-only accumulator for everything the walk produces
#[derive(Debug, Default)]
struct ReportSink {
    tree: String,
    media: Vec<MediaSummary>,
    files: Vec<FileSection>,
    statistics: ScanStatistics,
}

impl ReportSink {
    fn push_tree_line(&mut self, line: &str) {
        self.tree.push_str(line);
        self.tree.push('\n');
    }

    fn push_media(&mut self, summary: MediaSummary) {
        self.statistics.media_items += summary.items.len();
        self.media.push(summary);
    }

    fn push_file(&mut self, section: FileSection) {
        self.files.push(section);
    }

    fn record_content(&mut self, result: &ContentResult) {
        let stats = &mut self.statistics;
        stats.files_processed += 1;
        match result {
            ContentResult::Skipped => stats.binary_files += 1,
            ContentResult::Raw(_) => stats.raw_files += 1,
            ContentResult::Truncated { .. } => stats.truncated_files += 1,
            ContentResult::StructurallyPruned { .. } => stats.pruned_json_files += 1,
            ContentResult::Error(_) => stats.failed_files += 1,
        }
    }
}

/// Pending unit of work on the traversal stack
#[derive(Debug)]
enum Task {
    /// Write an entry's tree line, then descend into it or process it
    Visit {
        path: PathBuf,
        rel_path: PathBuf,
        entry: FsEntry,
        prefix: String,
        is_last: bool,
    },
    /// Closing marker of a pruned directory
    Elision {
        prefix: String,
        total: usize,
        omitted: usize,
    },
}

/// Scanner for project contents
pub struct Scanner {
    /// Scanner configuration
    config: Config,
    /// Progress bar
    pub progress: Arc<ProgressBar>,
    transformer: Transformer,
    cataloger: MediaCataloger,
}

impl Scanner {
    /// Create a new scanner
    pub fn new(config: Config, progress: Arc<ProgressBar>) -> Self {
        Self {
            transformer: Transformer::new(config.limits.clone()),
            cataloger: MediaCataloger::new(config.limits.clone()),
            config,
            progress,
        }
    }

    /// Scan the project and write the report into the output directory
    pub fn scan(&self) -> Result<ScanOutcome> {
        let snapshot = self.snapshot()?;
        let output_path = MarkdownWriter::new(&self.config.output_dir).write(&snapshot)?;

        Ok(ScanOutcome {
            output_path,
            project_type: snapshot.header.project_type.label().to_string(),
            statistics: snapshot.statistics,
        })
    }

    /// Scan the project and return the in-memory report
    pub fn snapshot(&self) -> Result<Snapshot> {
        self.config.validate()?;
        let root = absolute_path(&self.config.target_dir)?;

        let profile = self.resolve_profile(&root)?;
        info!(
            "Scanning {} as {}{}",
            root.display(),
            profile.label(),
            if profile.project_type.is_overridden() {
                " (overridden)"
            } else {
                ""
            }
        );

        let rules = self.build_rules(&root, &profile)?;
        if rules.has_includes() {
            debug!(
                "Force-including {}",
                self.config.extra_includes.join(", ")
            );
        }
        let sink = self.walk(&root, &rules);

        Ok(Snapshot {
            header: Header {
                project_name: file_name_of(&root),
                parent_dir: root
                    .parent()
                    .map(file_name_of)
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| "root".to_string()),
                project_type: profile.project_type,
                generated_at: Local::now(),
                extra_excludes: self.config.extra_excludes.clone(),
                extra_includes: self.config.extra_includes.clone(),
            },
            tree: sink.tree,
            media: sink.media,
            files: sink.files,
            statistics: sink.statistics,
        })
    }

    /// The caller's type override, or detection
    fn resolve_profile(&self, root: &Path) -> Result<Profile> {
        match &self.config.project_type {
            Some(label) => Ok(Profile::for_label(label)),
            None => project::detect(root),
        }
    }

    /// Exclude layers in precedence order, then the include set
    fn build_rules(&self, root: &Path, profile: &Profile) -> Result<RuleSet> {
        let mut builder = RuleSet::builder(root);
        builder
            .add_excludes(&profile.default_ignores)
            .add_excludes(&profile.type_ignores)
            .add_excludes(&self.config.extra_excludes)
            .add_ignore_file(&root.join(".gitignore"));

        // Never ingest our own reports, whatever the includes say
        if let Some(output) = self.output_dir_within(root) {
            debug!("Excluding output directory {}", slash_path(&output));
            builder.protect(output);
        }

        builder.add_includes(&self.config.extra_includes);
        builder.build()
    }

    /// Output directory relative to `root`, when it lies inside it. Both
    /// sides are resolved through symlinks before comparing.
    fn output_dir_within(&self, root: &Path) -> Option<PathBuf> {
        let root = fs::canonicalize(root).ok()?;
        let output = fs::canonicalize(&self.config.output_dir).ok()?;
        let rel = output.strip_prefix(&root).ok()?;
        (!rel.as_os_str().is_empty()).then(|| rel.to_path_buf())
    }

    fn walk(&self, root: &Path, rules: &RuleSet) -> ReportSink {
        let mut sink = ReportSink::default();
        let mut stack = Vec::new();

        sink.push_tree_line("/");
        self.expand_directory(root, Path::new(""), "", rules, &mut sink, &mut stack);
        self.drain(stack, rules, &mut sink);

        sink
    }

    /// Process queued tasks until the stack is empty
    fn drain(&self, mut stack: Vec<Task>, rules: &RuleSet, sink: &mut ReportSink) {
        while let Some(task) = stack.pop() {
            match task {
                Task::Elision {
                    prefix,
                    total,
                    omitted,
                } => {
                    sink.push_tree_line(&format!(
                        "{}└── ... ({} total, {} omitted)",
                        prefix, total, omitted
                    ));
                }
                Task::Visit {
                    path,
                    rel_path,
                    entry,
                    prefix,
                    is_last,
                } => {
                    let connector = if is_last { "└── " } else { "├── " };
                    let suffix = if entry.is_dir { "/" } else { "" };
                    sink.push_tree_line(&format!("{}{}{}{}", prefix, connector, entry.name, suffix));

                    if entry.is_dir {
                        let child_prefix =
                            format!("{}{}", prefix, if is_last { "    " } else { "│   " });
                        self.expand_directory(
                            &path,
                            &rel_path,
                            &child_prefix,
                            rules,
                            sink,
                            &mut stack,
                        );
                    } else {
                        self.process_file(&path, &rel_path, sink);
                    }
                }
            }
        }
    }

    /// List, filter, catalog, sort and prune one directory, then queue its
    /// entries so they are visited in display order
    fn expand_directory(
        &self,
        dir: &Path,
        rel_dir: &Path,
        prefix: &str,
        rules: &RuleSet,
        sink: &mut ReportSink,
        stack: &mut Vec<Task>,
    ) {
        let mut entries = match list_directory(dir) {
            Ok(entries) => entries,
            Err(reason) => {
                warn!("Failed to read directory {}: {}", dir.display(), reason);
                sink.statistics.unreadable_directories += 1;
                sink.push_tree_line(&format!("{}└── [read failed: {}]", prefix, reason));
                return;
            }
        };
        sink.statistics.directories += 1;

        entries.retain(|entry| {
            rules
                .decide(&rel_dir.join(&entry.name), entry.is_dir)
                .is_kept()
        });

        if let Some(summary) = self.cataloger.catalog(dir, &slash_path(rel_dir), &entries) {
            sink.push_media(summary);
        }

        entries.sort_by(|a, b| {
            b.is_dir
                .cmp(&a.is_dir)
                .then_with(|| compare_names(&a.name, &b.name))
        });

        let total = entries.len();
        let pruned = total > self.config.limits.max_dir_items;
        if pruned {
            let keep = self.config.limits.keep_dir_items;
            debug!(
                "Pruning {} ({} entries, showing {})",
                dir.display(),
                total,
                keep
            );
            entries.truncate(keep);
            sink.statistics.pruned_directories += 1;
            stack.push(Task::Elision {
                prefix: prefix.to_string(),
                total,
                omitted: total - keep,
            });
        }

        let shown = entries.len();
        for (index, entry) in entries.into_iter().enumerate().rev() {
            stack.push(Task::Visit {
                path: dir.join(&entry.name),
                rel_path: rel_dir.join(&entry.name),
                is_last: index + 1 == shown && !pruned,
                prefix: prefix.to_string(),
                entry,
            });
        }
    }

    fn process_file(&self, path: &Path, rel_path: &Path, sink: &mut ReportSink) {
        self.progress.inc(1);
        self.progress
            .set_message(format!("Current file: {}", display_name(rel_path)));

        let result = self.transformer.transform(path);
        sink.record_content(&result);

        if let Some(content) = self.transformer.render(&result) {
            sink.push_file(FileSection {
                path: slash_path(rel_path),
                language: language_tag(rel_path),
                content,
            });
        }
    }
}

/// Immediate children of `dir`; the error is the reason the listing failed
fn list_directory(dir: &Path) -> std::result::Result<Vec<FsEntry>, String> {
    let mut entries = Vec::new();

    for result in WalkDir::new(dir).min_depth(1).max_depth(1) {
        match result {
            Ok(entry) => entries.push(FsEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir: entry.file_type().is_dir(),
            }),
            Err(e) if e.depth() == 0 => {
                return Err(e
                    .io_error()
                    .map(|io| io.to_string())
                    .unwrap_or_else(|| e.to_string()));
            }
            Err(e) => debug!("Skipping unreadable entry in {}: {}", dir.display(), e),
        }
    }

    Ok(entries)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Shorten long paths for the progress line
fn display_name(rel_path: &Path) -> String {
    let name = slash_path(rel_path);
    let chars: Vec<char> = name.chars().collect();
    if chars.len() > 40 {
        let tail: String = chars[chars.len() - 37..].iter().collect();
        format!("...{}", tail)
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner(root: &Path) -> Scanner {
        Scanner::new(Config::new(root), Arc::new(ProgressBar::hidden()))
    }

    fn visit(dir: &Path, name: &str, is_dir: bool, is_last: bool) -> Task {
        Task::Visit {
            path: dir.join(name),
            rel_path: PathBuf::from(name),
            entry: FsEntry {
                name: name.to_string(),
                is_dir,
            },
            prefix: String::new(),
            is_last,
        }
    }

    #[test]
    fn test_unreadable_directory_becomes_leaf() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "still here\n").unwrap();

        // `gone` was listed but vanished before it was expanded
        let stack = vec![
            visit(dir.path(), "notes.txt", false, true),
            visit(dir.path(), "gone", true, false),
        ];
        let mut sink = ReportSink::default();
        scanner(dir.path()).drain(stack, &RuleSet::empty(), &mut sink);

        let lines: Vec<&str> = sink.tree.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "├── gone/");
        assert!(
            lines[1].starts_with("│   └── [read failed: "),
            "leaf was {:?}",
            lines[1]
        );
        assert_eq!(lines[2], "└── notes.txt");

        assert_eq!(sink.statistics.unreadable_directories, 1);
        assert_eq!(sink.statistics.directories, 0);
        assert_eq!(sink.files.len(), 1);
        assert_eq!(sink.files[0].path, "notes.txt");
    }

    #[test]
    fn test_list_directory_reports_reason() {
        let dir = tempfile::tempdir().unwrap();
        let reason = list_directory(&dir.path().join("missing")).unwrap_err();
        assert!(!reason.is_empty());
    }

    #[test]
    fn test_output_dir_within_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("shop");
        fs::create_dir_all(root.join("reports/out")).unwrap();

        let mut config = Config::new(&root);
        config.output_dir = root.join("reports/out");
        let scanner = Scanner::new(config, Arc::new(ProgressBar::hidden()));
        assert_eq!(
            scanner.output_dir_within(&root),
            Some(PathBuf::from("reports/out"))
        );

        let mut config = Config::new(&root);
        config.output_dir = dir.path().join("elsewhere");
        fs::create_dir_all(&config.output_dir).unwrap();
        let scanner = Scanner::new(config, Arc::new(ProgressBar::hidden()));
        assert_eq!(scanner.output_dir_within(&root), None);
    }
}
