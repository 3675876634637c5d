/*!
 * Project type detection and per-type ignore rules
 *
 * Detection is a prioritized list of predicates evaluated against the root
 * listing and `package.json`; the first match wins.
 */

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::ensure;
use crate::error::Result;

/// Ignored for every project type
pub const DEFAULT_IGNORES: &[&str] = &[
    "node_modules",
    ".git",
    ".svn",
    ".DS_Store",
    "Thumbs.db",
    "dist",
    "build",
    "coverage",
    ".idea",
    ".vscode",
    "*.log",
    "yarn.lock",
    "package-lock.json",
    "pnpm-lock.yaml",
];

/// Known project types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum ProjectKind {
    #[strum(serialize = "flutter")]
    Flutter,
    #[strum(serialize = "electron")]
    Electron,
    #[strum(serialize = "vue")]
    Vue,
    #[strum(serialize = "react")]
    React,
    #[strum(serialize = "nodejs")]
    NodeJs,
    #[strum(serialize = "generic-web")]
    GenericWeb,
    #[strum(serialize = "generic-node")]
    GenericNode,
    #[strum(serialize = "unknown")]
    Unknown,
}

impl ProjectKind {
    /// Label used in the report header and the output file name
    pub fn label(self) -> String {
        self.to_string()
    }

    /// Ignore patterns specific to this project type
    pub fn ignore_patterns(self) -> &'static [&'static str] {
        match self {
            ProjectKind::Flutter => &[
                ".dart_tool",
                ".idea",
                "ios/Flutter",
                "android/.gradle",
                "build",
            ],
            ProjectKind::Electron => &["dist", "out", "release", "release-builds", "build", "compile"],
            ProjectKind::Vue => &[".nuxt", "dist", "dist-ssr"],
            ProjectKind::React => &[".next", "build", "out"],
            ProjectKind::NodeJs | ProjectKind::GenericNode => &["test", "tests", "coverage"],
            ProjectKind::GenericWeb => &[".sass-cache", "bower_components"],
            ProjectKind::Unknown => &[],
        }
    }

    /// Labels accepted for an override, in display order
    pub fn labels() -> Vec<String> {
        ProjectKind::iter().map(ProjectKind::label).collect()
    }
}

/// Where the project type came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectType {
    /// Result of detection
    Detected(String),
    /// Chosen by the caller
    Overridden(String),
}

impl ProjectType {
    pub fn label(&self) -> &str {
        match self {
            ProjectType::Detected(label) | ProjectType::Overridden(label) => label,
        }
    }

    pub fn is_overridden(&self) -> bool {
        matches!(self, ProjectType::Overridden(_))
    }
}

/// Type label plus the ignore lists that go with it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub project_type: ProjectType,
    pub default_ignores: Vec<String>,
    pub type_ignores: Vec<String>,
}

impl Profile {
    fn new(project_type: ProjectType, kind: Option<ProjectKind>) -> Self {
        Self {
            project_type,
            default_ignores: DEFAULT_IGNORES.iter().map(|s| s.to_string()).collect(),
            type_ignores: kind
                .map(|k| k.ignore_patterns().iter().map(|s| s.to_string()).collect())
                .unwrap_or_default(),
        }
    }

    /// Profile for a detected kind
    pub fn detected(kind: ProjectKind) -> Self {
        Self::new(ProjectType::Detected(kind.label()), Some(kind))
    }

    /// Profile for a caller-chosen label. Labels outside the known table keep
    /// the label but only get the default ignores.
    pub fn for_label(label: &str) -> Self {
        let kind = ProjectKind::from_str(label).ok();
        if kind.is_none() {
            debug!("No ignore table for project type {:?}", label);
        }
        Self::new(ProjectType::Overridden(label.to_string()), kind)
    }

    pub fn label(&self) -> &str {
        self.project_type.label()
    }
}

/// The parts of `package.json` detection looks at
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PackageManifest {
    dependencies: HashMap<String, Value>,
    dev_dependencies: HashMap<String, Value>,
    peer_dependencies: HashMap<String, Value>,
    bin: Option<Value>,
}

impl PackageManifest {
    /// Whether any of `names` is a dependency of any kind
    pub fn has_dependency(&self, names: &[&str]) -> bool {
        names.iter().any(|name| {
            [
                &self.dependencies,
                &self.dev_dependencies,
                &self.peer_dependencies,
            ]
            .iter()
            .any(|deps| deps.get(*name).is_some_and(is_truthy))
        })
    }

    fn has_bin(&self) -> bool {
        self.bin.as_ref().is_some_and(is_truthy)
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// What detection predicates can see about the project root
#[derive(Debug)]
pub struct ProjectFiles<'a> {
    root: &'a Path,
    names: HashSet<String>,
    manifest: Option<PackageManifest>,
}

impl ProjectFiles<'_> {
    fn has(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    fn depends_on(&self, names: &[&str]) -> bool {
        self.manifest
            .as_ref()
            .is_some_and(|m| m.has_dependency(names))
    }
}

type Predicate = fn(&ProjectFiles) -> bool;

/// Detection rules in priority order
const DETECTORS: &[(Predicate, ProjectKind)] = &[
    (is_flutter, ProjectKind::Flutter),
    // Electron usually wraps Vue or React, so it goes first
    (is_electron, ProjectKind::Electron),
    (is_vue, ProjectKind::Vue),
    (is_react, ProjectKind::React),
    (is_node, ProjectKind::NodeJs),
    (is_web, ProjectKind::GenericWeb),
];

fn is_flutter(files: &ProjectFiles) -> bool {
    files.has("pubspec.yaml")
}

fn is_electron(files: &ProjectFiles) -> bool {
    files.depends_on(&["electron"])
}

fn is_vue(files: &ProjectFiles) -> bool {
    files.depends_on(&["vue", "nuxt"])
}

fn is_react(files: &ProjectFiles) -> bool {
    files.depends_on(&["react", "react-dom", "next"]) && !files.depends_on(&["react-native"])
}

fn is_node(files: &ProjectFiles) -> bool {
    const BACKEND_FRAMEWORKS: &[&str] = &[
        "express",
        "koa",
        "hapi",
        "fastify",
        "nestjs",
        "@nestjs/core",
        "egg",
        "thinkjs",
    ];
    files.depends_on(BACKEND_FRAMEWORKS)
        || files.manifest.as_ref().is_some_and(PackageManifest::has_bin)
}

fn is_web(files: &ProjectFiles) -> bool {
    const WEB_DEPENDENCIES: &[&str] = &[
        "jquery",
        "bootstrap",
        "bulma",
        "tailwindcss",
        "webpack",
        "parcel",
        "vite",
        "rollup",
        "gulp",
        "grunt",
    ];
    if files.depends_on(WEB_DEPENDENCIES) || files.has("index.html") {
        return true;
    }
    if files.root.join("public").join("index.html").exists()
        || files.root.join("src").join("index.html").exists()
    {
        return true;
    }
    (files.has("css") || files.has("styles")) && (files.has("js") || files.has("scripts"))
}

/// Read `package.json` at the root; unreadable or malformed manifests count as absent
fn read_manifest(root: &Path) -> Option<PackageManifest> {
    let path = root.join("package.json");
    if !path.is_file() {
        return None;
    }

    match parse_manifest(&path) {
        Ok(manifest) => Some(manifest),
        Err(e) => {
            warn!("Ignoring package.json, dependency checks skipped: {}", e);
            None
        }
    }
}

fn parse_manifest(path: &Path) -> Result<PackageManifest> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Detect the project type of `root`
pub fn detect_kind(root: &Path) -> Result<ProjectKind> {
    ensure!(root.is_dir(), RootNotFound, "{}", root.display());

    let names = fs::read_dir(root)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();

    let files = ProjectFiles {
        root,
        names,
        manifest: read_manifest(root),
    };

    if let Some((_, kind)) = DETECTORS.iter().find(|(predicate, _)| predicate(&files)) {
        return Ok(*kind);
    }

    // A bare package.json is most likely a Node library or tool
    if files.manifest.is_some() {
        Ok(ProjectKind::GenericNode)
    } else {
        Ok(ProjectKind::Unknown)
    }
}

/// Detect the project type of `root` and return its profile
pub fn detect(root: &Path) -> Result<Profile> {
    let kind = detect_kind(root)?;
    debug!("Detected project type {} for {}", kind, root.display());
    Ok(Profile::detected(kind))
}
