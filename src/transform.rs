/*!
 * Per-file content transformation
 *
 * Small text files pass through untouched. Larger ones are either parsed as
 * JSON and pruned structurally, or cut down to a head and a tail preview
 * read with two positioned reads.
 */

use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use log::debug;
use serde_json::{Map, Value};

use crate::config::Limits;
use crate::types::ContentResult;
use crate::utils::{human_size, is_binary_file};

/// Replaces JSON nested deeper than the configured limit
pub const DEPTH_PLACEHOLDER: &str = "... (nesting too deep, omitted)";

/// Key added to pruned JSON objects
pub const ELIDED_KEY: &str = "...";

/// Turns files into the content emitted in the report
#[derive(Debug, Clone, Default)]
pub struct Transformer {
    limits: Limits,
}

impl Transformer {
    pub fn new(limits: Limits) -> Self {
        Self { limits }
    }

    /// Classify and read a file. I/O failures become `ContentResult::Error`.
    pub fn transform(&self, path: &Path) -> ContentResult {
        match self.try_transform(path) {
            Ok(result) => result,
            Err(e) => {
                debug!("Failed to read {}: {}", path.display(), e);
                ContentResult::Error(e.to_string())
            }
        }
    }

    fn try_transform(&self, path: &Path) -> io::Result<ContentResult> {
        if is_binary_file(path)? {
            return Ok(ContentResult::Skipped);
        }

        let size = fs::metadata(path)?.len();
        if size <= self.limits.max_file_size {
            let bytes = fs::read(path)?;
            return Ok(ContentResult::Raw(
                String::from_utf8_lossy(&bytes).into_owned(),
            ));
        }

        self.handle_large_file(path, size)
    }

    fn handle_large_file(&self, path: &Path, size: u64) -> io::Result<ContentResult> {
        let bytes = fs::read(path)?;
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => Ok(ContentResult::StructurallyPruned {
                value: self.prune_json(&value, 0),
                original_size: size,
            }),
            Err(e) => {
                debug!("{} is not JSON ({}), truncating", path.display(), e);
                drop(bytes);
                self.truncate_text(path, size)
            }
        }
    }

    /// Recursively shorten large arrays and objects
    pub fn prune_json(&self, value: &Value, depth: usize) -> Value {
        if depth > self.limits.max_json_depth {
            return Value::String(DEPTH_PLACEHOLDER.to_string());
        }

        let threshold = self.limits.prune_threshold;
        let keep = self.limits.prune_keep;

        match value {
            Value::Array(items) if items.len() > threshold => {
                let mut pruned: Vec<Value> = items
                    .iter()
                    .take(keep)
                    .map(|item| self.prune_json(item, depth + 1))
                    .collect();
                pruned.push(Value::String(format!(
                    "... ({} items total, {} omitted)",
                    items.len(),
                    items.len() - keep
                )));
                Value::Array(pruned)
            }
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.prune_json(item, depth + 1))
                    .collect(),
            ),
            Value::Object(map) if map.len() > threshold => {
                let mut pruned: Map<String, Value> = map
                    .iter()
                    .take(keep)
                    .map(|(k, v)| (k.clone(), self.prune_json(v, depth + 1)))
                    .collect();
                pruned.insert(
                    ELIDED_KEY.to_string(),
                    Value::String(format!(
                        "({} keys total, {} omitted)",
                        map.len(),
                        map.len() - keep
                    )),
                );
                Value::Object(pruned)
            }
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.prune_json(v, depth + 1)))
                    .collect(),
            ),
            scalar => scalar.clone(),
        }
    }

    /// Read only the first and last `preview_size` bytes of a file
    pub fn truncate_text(&self, path: &Path, size: u64) -> io::Result<ContentResult> {
        let preview = self.limits.preview_size;
        let mut file = File::open(path)?;

        let mut head = Vec::with_capacity(preview as usize);
        (&mut file).take(preview).read_to_end(&mut head)?;

        file.seek(SeekFrom::Start(size.saturating_sub(preview)))?;
        let mut tail = Vec::with_capacity(preview as usize);
        file.take(preview).read_to_end(&mut tail)?;

        Ok(ContentResult::Truncated {
            head: String::from_utf8_lossy(&head).into_owned(),
            tail: String::from_utf8_lossy(&tail).into_owned(),
            original_size: size,
            omitted: size.saturating_sub(2 * preview),
        })
    }

    /// Text emitted in the report, `None` when the file contributes nothing
    pub fn render(&self, result: &ContentResult) -> Option<String> {
        match result {
            ContentResult::Skipped => None,
            ContentResult::Raw(text) if text.is_empty() => None,
            ContentResult::Raw(text) => Some(text.clone()),
            ContentResult::Truncated {
                head,
                tail,
                original_size,
                omitted,
            } => Some(format!(
                "/* [large file] unstructured text (original size: {})\n * showing the first {} and the last {}\n */\n\n{}\n\n\n... ({} bytes omitted) ...\n\n\n{}",
                human_size(*original_size),
                human_size(self.limits.preview_size),
                human_size(self.limits.preview_size),
                head,
                omitted,
                tail
            )),
            ContentResult::StructurallyPruned {
                value,
                original_size,
            } => {
                let json = serde_json::to_string_pretty(value)
                    .unwrap_or_else(|e| format!("[render failed: {}]", e));
                Some(format!(
                    "/* [large file] structured JSON (original size: {})\n * arrays/objects with more than {} entries keep only the first {}\n */\n{}",
                    human_size(*original_size),
                    self.limits.prune_threshold,
                    self.limits.prune_keep,
                    json
                ))
            }
            ContentResult::Error(message) => Some(format!("[read failed: {}]", message)),
        }
    }
}
