/*!
 * Scenario tests for code-extractor
 */

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indicatif::ProgressBar;
use tempfile::{tempdir, TempDir};

use crate::config::Config;
use crate::error::ExtractorError;
use crate::scanner::Scanner;
use crate::writer::Snapshot;

// Write a file, creating parent directories as needed
fn write_file(root: &Path, rel: &str, content: &[u8]) -> io::Result<()> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(content)?;
    Ok(())
}

// Minimal PNG header: signature plus IHDR
fn png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
    bytes.extend_from_slice(&13u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&[8, 6, 0, 0, 0, 0, 0, 0, 0]);
    bytes
}

// Helper function to create a small project under <tmp>/work/shop
fn setup_project() -> io::Result<(TempDir, PathBuf)> {
    let temp_dir = tempdir()?;
    let root = temp_dir.path().join("work").join("shop");
    fs::create_dir_all(&root)?;

    write_file(&root, "src/main.rs", b"fn main() {}\n")?;
    write_file(&root, "src/lib/util.rs", b"pub fn util() {}\n")?;
    write_file(&root, "README.md", b"# Shop\n")?;
    write_file(&root, ".gitignore", b"secret.txt\n")?;
    write_file(&root, "secret.txt", b"hunter2\n")?;
    write_file(&root, "node_modules/pkg/index.js", b"module.exports = {}\n")?;
    write_file(&root, "node_modules/pkg/config.json", b"{\"debug\": true}\n")?;
    write_file(&root, "logo.png", &png(64, 32))?;

    Ok((temp_dir, root))
}

fn config_for(temp_dir: &TempDir, root: &Path) -> Config {
    let mut config = Config::new(root);
    config.output_dir = temp_dir.path().join("output");
    config
}

fn snapshot(config: Config) -> Result<Snapshot, ExtractorError> {
    Scanner::new(config, Arc::new(ProgressBar::hidden())).snapshot()
}

// Drop the only line that changes between runs
fn without_timestamp(rendered: &str) -> String {
    rendered
        .lines()
        .filter(|line| !line.starts_with("- **Generated:**"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn test_tree_layout() -> io::Result<()> {
    let (temp_dir, root) = setup_project()?;
    let snap = snapshot(config_for(&temp_dir, &root))?;

    let expected = "\
/
├── src/
│   ├── lib/
│   │   └── util.rs
│   └── main.rs
├── .gitignore
├── logo.png
└── README.md
";
    assert_eq!(snap.tree, expected);
    assert_eq!(snap.header.project_name, "shop");
    assert_eq!(snap.header.parent_dir, "work");
    assert_eq!(snap.header.project_type.label(), "unknown");
    assert_eq!(snap.file_name(), "shop-unknown-work.md");

    Ok(())
}

#[test]
fn test_content_sections_follow_traversal_order() -> io::Result<()> {
    let (temp_dir, root) = setup_project()?;
    let snap = snapshot(config_for(&temp_dir, &root))?;

    let paths: Vec<&str> = snap.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(
        paths,
        vec!["src/lib/util.rs", "src/main.rs", ".gitignore", "README.md"]
    );
    assert_eq!(snap.files[1].language, "rs");
    assert_eq!(snap.files[2].language, "text");

    let rendered = snap.render();
    assert!(rendered.contains("### src/main.rs\n\n````rs\nfn main() {}\n````\n"));
    // Binary image has no content section
    assert!(!rendered.contains("### logo.png"));
    assert!(!rendered.contains("hunter2"));

    Ok(())
}

#[test]
fn test_media_catalog() -> io::Result<()> {
    let (temp_dir, root) = setup_project()?;
    write_file(&root, "assets/click.wav", &[0u8; 10])?;
    write_file(&root, "assets/theme.mp3", &[0u8; 1000])?;
    write_file(&root, "assets/intro.mp4", &[0u8; 50])?;

    let snap = snapshot(config_for(&temp_dir, &root))?;

    let directories: Vec<&str> = snap.media.iter().map(|m| m.directory.as_str()).collect();
    assert_eq!(directories, vec!["/", "assets"]);

    let assets = &snap.media[1];
    let names: Vec<&str> = assets.items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["theme.mp3", "intro.mp4", "click.wav"]);

    let rendered = snap.render();
    assert!(rendered.contains("1. [Image] logo.png - "));
    assert!(rendered.contains("(dimensions: 64x32)"));
    assert!(rendered.contains("1. [Audio] theme.mp3 - 1000 B\n2. [Video] intro.mp4 - 50 B\n3. [Audio] click.wav - 10 B\n"));

    Ok(())
}

#[test]
fn test_fan_out_pruning() -> io::Result<()> {
    let (temp_dir, root) = setup_project()?;
    for i in 0..101 {
        write_file(&root, &format!("generated/f{:03}.txt", i), b"x\n")?;
    }
    write_file(&root, "generated/f000.txt", b"first\n")?;

    let snap = snapshot(config_for(&temp_dir, &root))?;

    let expected = "\
├── generated/
│   ├── f000.txt
│   ├── f001.txt
│   ├── f002.txt
│   └── ... (101 total, 98 omitted)
├── src/
";
    assert!(snap.tree.contains(expected), "tree was:\n{}", snap.tree);

    let generated = snap
        .files
        .iter()
        .filter(|f| f.path.starts_with("generated/"))
        .count();
    assert_eq!(generated, 3);
    assert_eq!(snap.statistics.pruned_directories, 1);

    Ok(())
}

#[test]
fn test_pruned_root_puts_marker_last() -> io::Result<()> {
    let temp_dir = tempdir()?;
    let root = temp_dir.path().join("flat");
    for i in 0..150 {
        write_file(&root, &format!("item{:03}.md", i), b"-\n")?;
    }

    let snap = snapshot(config_for(&temp_dir, &root))?;
    let lines: Vec<&str> = snap.tree.lines().collect();
    assert_eq!(
        lines,
        vec![
            "/",
            "├── item000.md",
            "├── item001.md",
            "├── item002.md",
            "└── ... (150 total, 147 omitted)",
        ]
    );

    Ok(())
}

#[test]
fn test_force_include_rescues_ignored_file() -> io::Result<()> {
    let (temp_dir, root) = setup_project()?;
    let mut config = config_for(&temp_dir, &root);
    config.extra_includes = vec!["node_modules/pkg/config.json".to_string()];

    let snap = snapshot(config)?;

    assert!(snap
        .tree
        .contains("├── node_modules/\n│   └── pkg/\n│       └── config.json\n"));
    assert!(!snap.tree.contains("index.js"));
    assert!(snap
        .files
        .iter()
        .any(|f| f.path == "node_modules/pkg/config.json"));
    assert!(snap
        .render()
        .contains("- **Extra Includes:** `node_modules/pkg/config.json`"));

    Ok(())
}

#[test]
fn test_extra_excludes() -> io::Result<()> {
    let (temp_dir, root) = setup_project()?;
    let mut config = config_for(&temp_dir, &root);
    config.extra_excludes = vec!["lib/".to_string(), "*.md".to_string()];

    let snap = snapshot(config)?;

    assert!(!snap.tree.contains("lib/"));
    assert!(!snap.tree.contains("README.md"));
    assert!(snap.tree.contains("main.rs"));
    assert!(snap.render().contains("- **Extra Excludes:** `lib/`, `*.md`"));

    Ok(())
}

#[test]
fn test_type_override_and_type_ignores() -> io::Result<()> {
    let (temp_dir, root) = setup_project()?;
    write_file(&root, ".next/cache.txt", b"cache\n")?;
    write_file(&root, "package.json", b"{\"dependencies\": {\"vue\": \"3\"}}")?;

    let mut config = config_for(&temp_dir, &root);
    config.project_type = Some("react".to_string());
    let snap = snapshot(config)?;

    assert!(snap.header.project_type.is_overridden());
    assert_eq!(snap.file_name(), "shop-react-work.md");
    assert!(!snap.tree.contains(".next"));

    // Without the override the manifest decides
    let snap = snapshot(config_for(&temp_dir, &root))?;
    assert_eq!(snap.header.project_type.label(), "vue");
    assert!(snap.tree.contains(".next/"));

    Ok(())
}

#[test]
fn test_fence_safety_in_document() -> io::Result<()> {
    let (temp_dir, root) = setup_project()?;
    write_file(&root, "docs/notes.md", b"Example:\n`````\ninner\n`````\nend\n")?;

    let rendered = snapshot(config_for(&temp_dir, &root))?.render();

    let open = "``````md\n";
    let start = rendered.find(open).expect("six-backtick fence") + open.len();
    let close = rendered[start..].find("\n``````\n").unwrap();
    assert_eq!(
        &rendered[start..start + close],
        "Example:\n`````\ninner\n`````\nend"
    );

    Ok(())
}

#[test]
fn test_output_directory_is_not_scanned() -> io::Result<()> {
    let (_temp_dir, root) = setup_project()?;
    write_file(&root, "output/old-report.md", b"previous run\n")?;

    let mut config = Config::new(&root);
    config.output_dir = root.join("output");
    let outcome = Scanner::new(config, Arc::new(ProgressBar::hidden())).scan()?;

    let written = fs::read_to_string(&outcome.output_path)?;
    assert!(outcome.output_path.ends_with("output/shop-unknown-work.md"));
    assert!(!written.contains("old-report.md"));
    assert!(!written.contains("previous run"));

    Ok(())
}

#[test]
fn test_wildcard_include_cannot_reach_output_directory() -> io::Result<()> {
    let (_temp_dir, root) = setup_project()?;
    write_file(&root, "output/old-report.md", b"previous run\n")?;

    let mut config = Config::new(&root);
    config.output_dir = root.join("output");
    config.extra_includes = vec!["*.md".to_string()];

    let scanner = Scanner::new(config, Arc::new(ProgressBar::hidden()));
    let first = scanner.scan()?;
    let first_text = fs::read_to_string(&first.output_path)?;
    assert!(!first_text.contains("output/"));
    assert!(!first_text.contains("previous run"));
    // The include still rescues markdown elsewhere
    assert!(first_text.contains("### README.md"));

    let second = scanner.scan()?;
    let second_text = fs::read_to_string(&second.output_path)?;
    assert!(!second_text.contains("shop-unknown-work.md"));
    assert_eq!(without_timestamp(&first_text), without_timestamp(&second_text));

    Ok(())
}

#[cfg(unix)]
#[test]
fn test_symlinked_root_keeps_given_names() -> io::Result<()> {
    let (temp_dir, root) = setup_project()?;
    let links = temp_dir.path().join("links");
    fs::create_dir_all(&links)?;
    std::os::unix::fs::symlink(&root, links.join("alias"))?;

    let snap = snapshot(config_for(&temp_dir, &links.join("alias")))?;

    assert_eq!(snap.header.project_name, "alias");
    assert_eq!(snap.header.parent_dir, "links");
    assert_eq!(snap.file_name(), "alias-unknown-links.md");
    assert!(snap.tree.contains("│   └── main.rs\n"));

    Ok(())
}

#[test]
fn test_rescan_is_identical() -> io::Result<()> {
    let (temp_dir, root) = setup_project()?;
    write_file(&root, "data/big.json", big_json().as_bytes())?;

    let first = snapshot(config_for(&temp_dir, &root))?.render();
    let second = snapshot(config_for(&temp_dir, &root))?.render();

    assert_eq!(without_timestamp(&first), without_timestamp(&second));
    assert!(first.contains("### data/big.json\n\n````json\n/* [large file] structured JSON"));

    Ok(())
}

#[test]
fn test_missing_root_fails_fast() {
    let temp_dir = tempdir().unwrap();
    let config = config_for(&temp_dir, &temp_dir.path().join("nope"));

    match snapshot(config) {
        Err(ExtractorError::RootNotFound(path)) => assert!(path.ends_with("nope")),
        other => panic!("expected RootNotFound, got {:?}", other.map(|s| s.tree)),
    }
    assert!(!temp_dir.path().join("output").exists());
}

fn big_json() -> String {
    let rows: Vec<String> = (0..4000)
        .map(|i| format!("{{\"id\": {}, \"label\": \"row number {}\"}}", i, i))
        .collect();
    format!("{{\"rows\": [{}]}}", rows.join(", "))
}
