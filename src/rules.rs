/*!
 * Exclude/include rule resolution
 *
 * Exclude patterns use gitignore syntax and are layered in a fixed order
 * (project defaults, project-type list, caller excludes, the project's own
 * `.gitignore`), so later sources can re-include with `!pattern`.
 * Force-include patterns sit on top of all of them: a path they cover is
 * kept without ever consulting the exclude rules. Protected paths (the
 * report output directory) sit above the includes and are never kept.
 */

use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use log::{debug, warn};

use crate::error::{ExtractorError, Result};
use crate::types::Decision;
use crate::utils::slash_path;

/// Characters that make an include pattern a glob rather than a literal path
const WILDCARD_CHARS: &[char] = &['*', '?', '['];

/// Compiled force-include patterns
#[derive(Debug)]
struct IncludeSet {
    matcher: Gitignore,
    /// Literal include paths, normalized to `a/b/c` form
    literals: Vec<String>,
    /// At least one include pattern contains a wildcard
    has_wildcard: bool,
}

impl IncludeSet {
    fn covers(&self, rel_path: &Path, is_dir: bool) -> bool {
        if self
            .matcher
            .matched_path_or_any_parents(rel_path, is_dir)
            .is_ignore()
        {
            return true;
        }

        if !is_dir {
            return false;
        }

        // A wildcard could match anything below this directory
        if self.has_wildcard {
            return true;
        }

        let rel = slash_path(rel_path);
        self.literals
            .iter()
            .any(|literal| is_ancestor_of(&rel, literal))
    }
}

/// Whether directory `dir` is a strict path-prefix of `path`
fn is_ancestor_of(dir: &str, path: &str) -> bool {
    path.len() > dir.len() && path.starts_with(dir) && path.as_bytes()[dir.len()] == b'/'
}

/// Aggregated exclude rules plus the optional force-include set
#[derive(Debug)]
pub struct RuleSet {
    excludes: Gitignore,
    includes: Option<IncludeSet>,
    /// Relative paths dropped regardless of any include pattern
    protected: Vec<PathBuf>,
}

impl RuleSet {
    /// Start building rules for the project rooted at `root`
    pub fn builder(root: impl Into<PathBuf>) -> RuleSetBuilder {
        RuleSetBuilder::new(root)
    }

    /// Rules that keep everything
    pub fn empty() -> Self {
        Self {
            excludes: Gitignore::empty(),
            includes: None,
            protected: Vec::new(),
        }
    }

    /// Resolve a path relative to the scan root
    pub fn decide(&self, rel_path: &Path, is_dir: bool) -> Decision {
        if self.protected.iter().any(|p| rel_path.starts_with(p)) {
            return Decision::Exclude;
        }

        if let Some(includes) = &self.includes {
            if includes.covers(rel_path, is_dir) {
                return Decision::Include;
            }
        }

        let excluded = if is_dir {
            // Test both `dir` and `dir/` so directory-only patterns apply
            self.excludes
                .matched_path_or_any_parents(rel_path, false)
                .is_ignore()
                || self
                    .excludes
                    .matched_path_or_any_parents(rel_path, true)
                    .is_ignore()
        } else {
            self.excludes
                .matched_path_or_any_parents(rel_path, false)
                .is_ignore()
        };

        if excluded {
            Decision::Exclude
        } else {
            Decision::Pass
        }
    }

    /// Whether any force-include pattern is active
    pub fn has_includes(&self) -> bool {
        self.includes.is_some()
    }
}

/// Builder collecting exclude and include patterns in precedence order
pub struct RuleSetBuilder {
    root: PathBuf,
    excludes: GitignoreBuilder,
    includes: Vec<String>,
    protected: Vec<PathBuf>,
}

impl RuleSetBuilder {
    fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            excludes: GitignoreBuilder::new(&root),
            root,
            includes: Vec::new(),
            protected: Vec::new(),
        }
    }

    /// Append exclude patterns; later patterns take precedence
    pub fn add_excludes<I, S>(&mut self, patterns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            let pattern = pattern.as_ref();
            if let Err(e) = self.excludes.add_line(None, pattern) {
                warn!("Skipping invalid exclude pattern {:?}: {}", pattern, e);
            }
        }
        self
    }

    /// Append the rules of an ignore file if it exists
    pub fn add_ignore_file(&mut self, path: &Path) -> &mut Self {
        if !path.is_file() {
            return self;
        }

        match self.excludes.add(path) {
            None => debug!("Loaded ignore rules from {}", path.display()),
            Some(e) => warn!("Some rules in {} were skipped: {}", path.display(), e),
        }
        self
    }

    /// Exclude a path relative to the root, even from force-includes
    pub fn protect(&mut self, rel_path: impl Into<PathBuf>) -> &mut Self {
        let rel_path = rel_path.into();
        if rel_path.as_os_str().is_empty() {
            warn!("Refusing to protect the scan root itself");
        } else {
            self.protected.push(rel_path);
        }
        self
    }

    /// Append force-include patterns
    pub fn add_includes<I, S>(&mut self, patterns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.includes.extend(
            patterns
                .into_iter()
                .map(|p| p.as_ref().trim().to_string())
                .filter(|p| !p.is_empty()),
        );
        self
    }

    /// Compile the collected patterns
    pub fn build(&self) -> Result<RuleSet> {
        let excludes = self
            .excludes
            .build()
            .map_err(|e| ExtractorError::Pattern(e.to_string()))?;

        let includes = if self.includes.is_empty() {
            None
        } else {
            Some(self.build_includes()?)
        };

        Ok(RuleSet {
            excludes,
            includes,
            protected: self.protected.clone(),
        })
    }

    fn build_includes(&self) -> Result<IncludeSet> {
        let mut matcher = GitignoreBuilder::new(&self.root);
        let mut literals = Vec::new();
        let mut has_wildcard = false;

        for pattern in &self.includes {
            if let Err(e) = matcher.add_line(None, pattern) {
                warn!("Skipping invalid include pattern {:?}: {}", pattern, e);
                continue;
            }
            if pattern.starts_with('!') {
                continue;
            }
            if pattern.contains(WILDCARD_CHARS) {
                has_wildcard = true;
            } else {
                let literal = pattern.trim_start_matches('/').trim_end_matches('/');
                if !literal.is_empty() {
                    literals.push(literal.to_string());
                }
            }
        }

        let matcher = matcher
            .build()
            .map_err(|e| ExtractorError::Pattern(e.to_string()))?;

        Ok(IncludeSet {
            matcher,
            literals,
            has_wildcard,
        })
    }
}
