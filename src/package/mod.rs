//! Archiving of each environment's output directory.
//!
//! Every subdirectory of the input directory becomes one gzip-compressed
//! tar archive named `<final_name><classifier>.tar.gz`, where the classifier
//! is `<prefix><environment><postfix>`.

use std::fs::File;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use thiserror::Error;
use tracing::info;

use crate::config::PackageOptions;
use crate::filter::{list_subdirectories, FilterError, PathSelector};

pub const ARCHIVE_EXTENSION: &str = "tar.gz";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PackageError {
    #[error("failed to select files to package: {0}")]
    Select(#[from] FilterError),

    #[error("failed to create archive '{path}': {source}")]
    Archive {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One written archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub environment: String,
    /// Full classifier, e.g. `-dev-config`.
    pub classifier: String,
    pub path: PathBuf,
}

impl Artifact {
    /// The classifier without its leading `-`, as used when attaching the
    /// artifact to a build.
    pub fn attached_classifier(&self) -> &str {
        attached_classifier(&self.classifier)
    }
}

pub fn classifier(prefix: &str, environment: &str, postfix: &str) -> String {
    format!("{prefix}{environment}{postfix}")
}

pub fn attached_classifier(classifier: &str) -> &str {
    classifier.strip_prefix('-').unwrap_or(classifier)
}

/// Writes one archive per environment directory under `options.input_dir`.
///
/// Empty include or exclude lists are replaced by the defaults.
pub fn package(options: &PackageOptions) -> Result<Vec<Artifact>, PackageError> {
    let selector = PathSelector::new(
        &options.effective_includes(),
        &options.effective_excludes(),
        true,
    )?;
    let mut artifacts = Vec::new();

    for (environment, dir) in list_subdirectories(&options.input_dir)? {
        let classifier = classifier(
            &options.classifier_prefix,
            &environment,
            &options.classifier_postfix,
        );
        let path = options
            .output_dir
            .join(format!("{}{}.{}", options.final_name, classifier, ARCHIVE_EXTENSION));

        let entries = create_archive(&dir, &path, &selector)?;
        info!(
            environment = %environment,
            path = %path.display(),
            entries,
            "created archive"
        );

        artifacts.push(Artifact {
            environment,
            classifier,
            path,
        });
    }

    Ok(artifacts)
}

/// Archives the files of `dir` picked by `selector` into `archive_path`.
/// Returns the number of files stored.
pub fn create_archive(
    dir: &Path,
    archive_path: &Path,
    selector: &PathSelector,
) -> Result<usize, PackageError> {
    let files = selector.select_files(dir)?;
    let archive_error = |e| PackageError::Archive {
        path: archive_path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = archive_path.parent() {
        std::fs::create_dir_all(parent).map_err(archive_error)?;
    }

    let file = File::create(archive_path).map_err(archive_error)?;
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    builder.mode(tar::HeaderMode::Deterministic);

    for relative in &files {
        builder
            .append_path_with_name(dir.join(relative), relative)
            .map_err(archive_error)?;
    }

    builder
        .into_inner()
        .and_then(GzEncoder::finish)
        .map_err(archive_error)?;

    Ok(files.len())
}
