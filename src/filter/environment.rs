//! Environment discovery under a filters root.

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use tracing::{info, warn};
use walkdir::WalkDir;

use super::FilterError;

/// Property files an environment picks up, matched case-insensitively
/// against paths relative to the environment directory.
pub const PROPERTY_FILE_PATTERN: &str = "**/*.properties";

/// A named deployment target and the property files that define it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    name: String,
    dir: PathBuf,
    property_files: Vec<PathBuf>,
}

impl Environment {
    pub fn new(
        name: impl Into<String>,
        dir: impl AsRef<Path>,
        property_files: Vec<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            dir: dir.as_ref().to_path_buf(),
            property_files,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Property file paths, sorted.
    pub fn property_files(&self) -> &[PathBuf] {
        &self.property_files
    }
}

/// Ensures `path` exists and is a directory.
pub(crate) fn require_dir(path: &Path) -> Result<(), FilterError> {
    if !path.exists() {
        return Err(FilterError::MissingRoot(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(FilterError::NotADirectory(path.to_path_buf()));
    }
    Ok(())
}

/// Lists the immediate subdirectories of `root`, sorted by name.
///
/// Plain files at the top level are skipped with a warning.
pub fn list_subdirectories(root: &Path) -> Result<Vec<(String, PathBuf)>, FilterError> {
    require_dir(root)?;

    let read_error = |e| FilterError::Read {
        path: root.to_path_buf(),
        source: e,
    };

    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(root).map_err(read_error)? {
        let path = entry.map_err(read_error)?.path();
        if path.is_dir() {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            dirs.push((name, path));
        } else {
            warn!(path = %path.display(), "ignoring non-environment file");
        }
    }

    dirs.sort();
    Ok(dirs)
}

/// Discovers one environment per subdirectory of `filters_root`.
pub fn resolve_environments(
    filters_root: impl AsRef<Path>,
) -> Result<Vec<Environment>, FilterError> {
    let filters_root = filters_root.as_ref();
    let pattern = Pattern::new(PROPERTY_FILE_PATTERN).map_err(|e| FilterError::InvalidPattern {
        pattern: PROPERTY_FILE_PATTERN.to_string(),
        source: e,
    })?;

    let mut environments = Vec::new();
    for (name, dir) in list_subdirectories(filters_root)? {
        let property_files = find_property_files(&dir, &pattern)?;
        info!(
            environment = %name,
            files = ?property_files,
            "found property files"
        );
        environments.push(Environment::new(name, dir, property_files));
    }

    info!(
        environments = ?environments.iter().map(Environment::name).collect::<Vec<_>>(),
        "environments found"
    );
    Ok(environments)
}

fn find_property_files(dir: &Path, pattern: &Pattern) -> Result<Vec<PathBuf>, FilterError> {
    let options = MatchOptions {
        case_sensitive: false,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| FilterError::Walk {
            path: dir.to_path_buf(),
            source: e,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(dir) else {
            continue;
        };
        if pattern.matches_with(&relative_slash_path(relative), options) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// Renders a relative path with `/` separators on every platform.
pub(crate) fn relative_slash_path(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
