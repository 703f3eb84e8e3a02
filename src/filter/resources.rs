//! Resource tree scanning and copying.

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use tracing::{debug, info};
use walkdir::WalkDir;

use super::environment::{relative_slash_path, require_dir};
use super::FilterError;

/// A template file: its `/`-separated path below the resource root and its
/// text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceFile {
    pub path: String,
    pub contents: String,
}

impl ResourceFile {
    pub fn new(path: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// Include/exclude glob patterns over relative paths.
///
/// No includes means everything is included. A pattern ending in `/`
/// matches the whole subtree below it, and `**/**` is read as `**/*`.
#[derive(Debug, Clone)]
pub struct PathSelector {
    includes: Vec<Pattern>,
    excludes: Vec<Pattern>,
    options: MatchOptions,
}

impl PathSelector {
    pub fn new(
        includes: &[String],
        excludes: &[String],
        case_sensitive: bool,
    ) -> Result<Self, FilterError> {
        Ok(Self {
            includes: compile(includes)?,
            excludes: compile(excludes)?,
            options: MatchOptions {
                case_sensitive,
                require_literal_separator: true,
                require_literal_leading_dot: false,
            },
        })
    }

    pub fn is_selected(&self, relative: &str) -> bool {
        let matches = |p: &Pattern| p.matches_with(relative, self.options);
        (self.includes.is_empty() || self.includes.iter().any(matches))
            && !self.excludes.iter().any(matches)
    }

    /// Lists the selected regular files below `root`, sorted.
    pub fn select_files(&self, root: &Path) -> Result<Vec<String>, FilterError> {
        require_dir(root)?;

        let mut files = Vec::new();
        for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
            let entry = entry.map_err(|e| FilterError::Walk {
                path: root.to_path_buf(),
                source: e,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            let relative = relative_slash_path(relative);
            if self.is_selected(&relative) {
                files.push(relative);
            }
        }

        files.sort();
        Ok(files)
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Pattern>, FilterError> {
    patterns
        .iter()
        .map(|raw| {
            let mut normalized = raw.replace('\\', "/");
            if normalized.ends_with('/') {
                normalized.push_str("**/*");
            }
            while normalized.contains("**/**") {
                normalized = normalized.replace("**/**", "**/*");
            }
            Pattern::new(&normalized).map_err(|e| FilterError::InvalidPattern {
                pattern: raw.clone(),
                source: e,
            })
        })
        .collect()
}

/// Lists the resource files below `root` picked by the patterns, sorted.
pub fn scan_resources(
    root: impl AsRef<Path>,
    includes: &[String],
    excludes: &[String],
) -> Result<Vec<String>, FilterError> {
    let root = root.as_ref();
    let files = PathSelector::new(includes, excludes, true)?.select_files(root)?;
    info!(root = %root.display(), files = ?files, "resource files");
    Ok(files)
}

/// Reads each of `paths` below `root` as UTF-8 text.
pub fn load_resources(
    root: impl AsRef<Path>,
    paths: &[String],
) -> Result<Vec<ResourceFile>, FilterError> {
    let root = root.as_ref();
    paths
        .iter()
        .map(|relative| {
            let path = root.join(relative);
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| FilterError::Read { path, source: e })?;
            Ok(ResourceFile::new(relative.clone(), contents))
        })
        .collect()
}

/// Copies the whole tree under `from` into `to`, overwriting existing
/// files. Returns the number of files copied.
///
/// When `to` lies inside `from`, the walk never descends into `to`.
pub fn copy_tree(from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<usize, FilterError> {
    let (from, to) = (from.as_ref(), to.as_ref());
    require_dir(from)?;
    create_dir(to)?;
    let destination = to.canonicalize().ok();

    let walker = WalkDir::new(from)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_destination(entry, destination.as_deref()));

    let mut copied = 0;
    for entry in walker {
        let entry = entry.map_err(|e| FilterError::Walk {
            path: from.to_path_buf(),
            source: e,
        })?;
        let Ok(relative) = entry.path().strip_prefix(from) else {
            continue;
        };
        let target = to.join(relative);

        if entry.file_type().is_dir() {
            create_dir(&target)?;
        } else if entry.file_type().is_file() {
            std::fs::copy(entry.path(), &target)
                .map_err(|e| FilterError::Write { path: target, source: e })?;
            copied += 1;
        }
    }

    debug!(from = %from.display(), to = %to.display(), copied, "copied tree");
    Ok(copied)
}

fn is_destination(entry: &walkdir::DirEntry, destination: Option<&Path>) -> bool {
    let Some(destination) = destination else {
        return false;
    };
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry.path().canonicalize().is_ok_and(|path| path == destination)
}

pub(crate) fn create_dir(path: &Path) -> Result<(), FilterError> {
    std::fs::create_dir_all(path).map_err(|e| FilterError::Write {
        path: PathBuf::from(path),
        source: e,
    })
}
