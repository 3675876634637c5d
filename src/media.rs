/*!
 * Media asset cataloging
 */

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;

use log::debug;
use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use rayon::prelude::*;

use crate::config::Limits;
use crate::types::{FsEntry, MediaItem, MediaKind, MediaSummary};
use crate::utils::compare_names;

/// Shown instead of dimensions when an image header cannot be parsed
pub const UNKNOWN_DIMENSIONS: &str = "N/A";

static IMAGE_EXTENSIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["jpg", "jpeg", "png", "gif", "webp", "svg", "bmp", "ico", "tiff"]
        .into_iter()
        .collect()
});

static AUDIO_EXTENSIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["mp3", "wav", "aac", "ogg", "flac", "m4a"]
        .into_iter()
        .collect()
});

static VIDEO_EXTENSIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["mp4", "avi", "mov", "mkv", "webm", "flv", "wmv"]
        .into_iter()
        .collect()
});

/// Media category of a file name, by case-insensitive extension
pub fn media_kind(name: &str) -> Option<MediaKind> {
    let ext = Path::new(name).extension()?.to_string_lossy().to_lowercase();
    let ext = ext.as_str();

    if IMAGE_EXTENSIONS.contains(ext) {
        Some(MediaKind::Image)
    } else if AUDIO_EXTENSIONS.contains(ext) {
        Some(MediaKind::Audio)
    } else if VIDEO_EXTENSIONS.contains(ext) {
        Some(MediaKind::Video)
    } else {
        None
    }
}

/// Collects per-directory media summaries
#[derive(Debug, Clone, Default)]
pub struct MediaCataloger {
    limits: Limits,
}

impl MediaCataloger {
    pub fn new(limits: Limits) -> Self {
        Self { limits }
    }

    /// Summarize the media files among a directory's filtered entries
    pub fn catalog(
        &self,
        dir_path: &Path,
        rel_dir: &str,
        entries: &[FsEntry],
    ) -> Option<MediaSummary> {
        let candidates: Vec<(&FsEntry, MediaKind)> = entries
            .iter()
            .filter(|e| !e.is_dir)
            .filter_map(|e| media_kind(&e.name).map(|kind| (e, kind)))
            .collect();

        if candidates.is_empty() {
            return None;
        }

        // Probes are independent; results are sorted afterwards
        let mut items: Vec<MediaItem> = candidates
            .par_iter()
            .filter_map(|(entry, kind)| self.probe(dir_path, entry, *kind))
            .collect();

        if items.is_empty() {
            return None;
        }

        items.sort_by(|a, b| {
            b.size
                .cmp(&a.size)
                .then_with(|| compare_names(&a.name, &b.name))
        });

        let total = items.len();
        items.truncate(self.limits.max_media_items);

        Some(MediaSummary {
            directory: if rel_dir.is_empty() {
                "/".to_string()
            } else {
                rel_dir.to_string()
            },
            total,
            items,
        })
    }

    fn probe(&self, dir_path: &Path, entry: &FsEntry, kind: MediaKind) -> Option<MediaItem> {
        let path = dir_path.join(&entry.name);
        let size = match fs::metadata(&path) {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                debug!("Skipping media {}: {}", path.display(), e);
                return None;
            }
        };

        let dimensions = match kind {
            MediaKind::Image => Some(
                self.image_dimensions(&path, size)
                    .unwrap_or_else(|| UNKNOWN_DIMENSIONS.to_string()),
            ),
            MediaKind::Audio | MediaKind::Video => None,
        };

        Some(MediaItem {
            name: entry.name.clone(),
            size,
            kind,
            dimensions,
        })
    }

    /// Parse `WxH` from the leading bytes of an image
    fn image_dimensions(&self, path: &Path, size: u64) -> Option<String> {
        let header = match read_header(path, size.min(self.limits.image_probe_bytes)) {
            Ok(header) => header,
            Err(e) => {
                debug!("Failed to read image header {}: {}", path.display(), e);
                return None;
            }
        };

        if is_svg(path) {
            let dims = svg_dimensions(&header);
            if dims.is_none() {
                debug!("No usable size on the <svg> root of {}", path.display());
            }
            return dims.map(|(width, height)| format!("{}x{}", width, height));
        }

        match imagesize::blob_size(&header) {
            Ok(dim) => Some(format!("{}x{}", dim.width, dim.height)),
            Err(e) => {
                debug!("Unrecognized image header {}: {:?}", path.display(), e);
                None
            }
        }
    }
}

fn is_svg(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"))
}

/// Size of an SVG document from the root element's `width`/`height`,
/// completed from `viewBox` when either is missing
fn svg_dimensions(header: &[u8]) -> Option<(u64, u64)> {
    let mut reader = Reader::from_reader(header);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(element)) | Ok(Event::Empty(element)) => {
                if element.local_name().as_ref() != b"svg" {
                    return None;
                }
                return svg_root_size(&element);
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
        buf.clear();
    }
}

fn svg_root_size(element: &BytesStart) -> Option<(u64, u64)> {
    let mut width = None;
    let mut height = None;
    let mut view_box = None;

    for attr in element.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value);
        match attr.key.local_name().as_ref() {
            b"width" => width = svg_length(&value),
            b"height" => height = svg_length(&value),
            b"viewBox" => view_box = svg_view_box(&value),
            _ => {}
        }
    }

    let (width, height) = match (width, height, view_box) {
        (Some(w), Some(h), _) => (w, h),
        (Some(w), None, Some((vw, vh))) => (w, w * vh / vw),
        (None, Some(h), Some((vw, vh))) => (h * vw / vh, h),
        (None, None, Some(size)) => size,
        _ => return None,
    };

    Some((width.round() as u64, height.round() as u64))
}

/// Absolute SVG length in pixels; percentages have no intrinsic size
fn svg_length(value: &str) -> Option<f64> {
    let value = value.trim();
    let split = value
        .find(|c: char| c.is_ascii_alphabetic() || c == '%')
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);

    let scale = match unit {
        "" | "px" => 1.0,
        "in" => 96.0,
        "cm" => 96.0 / 2.54,
        "mm" => 96.0 / 25.4,
        "pt" => 4.0 / 3.0,
        "pc" => 16.0,
        "em" => 16.0,
        "ex" => 8.0,
        _ => return None,
    };

    let number: f64 = number.trim().parse().ok()?;
    (number > 0.0).then_some(number * scale)
}

fn svg_view_box(value: &str) -> Option<(f64, f64)> {
    let parts: Vec<f64> = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty())
        .map(str::parse)
        .collect::<std::result::Result<_, _>>()
        .ok()?;

    match parts.as_slice() {
        [_, _, width, height] if *width > 0.0 && *height > 0.0 => Some((*width, *height)),
        _ => None,
    }
}

fn read_header(path: &Path, len: u64) -> io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut buffer = Vec::with_capacity(len as usize);
    file.take(len).read_to_end(&mut buffer)?;
    Ok(buffer)
}
