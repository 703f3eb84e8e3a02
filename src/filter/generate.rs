//! The generation run: every environment times every resource file.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use super::environment::{require_dir, resolve_environments, Environment};
use super::merge::merge;
use super::resources::{copy_tree, create_dir, load_resources, scan_resources, ResourceFile};
use super::template::{filter, MissingPolicy};
use super::FilterError;
use crate::config::{FailurePolicy, GenerateOptions};
use crate::error::{EnvironmentFailure, Error};

/// Output subdirectory holding the unfiltered resource tree.
pub const TEMPLATES_DIR: &str = "templates";

/// What one environment produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentOutput {
    pub dir: PathBuf,
    pub files: usize,
    /// Allow-listed (or tolerated) placeholders left in the output.
    pub unresolved: BTreeSet<String>,
}

/// Result of a successful run, keyed by environment name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub environments: BTreeMap<String, EnvironmentOutput>,
    pub templates_dir: Option<PathBuf>,
}

impl GenerationReport {
    /// Environment name to output directory, ready for packaging.
    pub fn output_dirs(&self) -> BTreeMap<&str, &Path> {
        self.environments
            .iter()
            .map(|(name, output)| (name.as_str(), output.dir.as_path()))
            .collect()
    }
}

impl From<&GenerateOptions> for MissingPolicy {
    fn from(options: &GenerateOptions) -> Self {
        Self {
            fail_on_missing: options.fail_on_missing_properties,
            allowed_missing: options.allowed_missing_properties.clone(),
        }
    }
}

/// Scans the resource and filter roots named by `options` and runs the
/// generation, then copies the raw templates if asked to.
pub fn generate(options: &GenerateOptions) -> Result<GenerationReport, Error> {
    require_dir(&options.resources_dir)?;
    require_dir(&options.filters_dir)?;

    let paths = scan_resources(&options.resources_dir, &options.includes, &options.excludes)?;
    let resources = load_resources(&options.resources_dir, &paths)?;
    let environments = resolve_environments(&options.filters_dir)?;

    let mut report = run(&resources, &environments, &options.output_dir, options)?;

    if options.include_unfiltered_resources {
        if report.environments.contains_key(TEMPLATES_DIR) {
            warn!(
                environment = TEMPLATES_DIR,
                "environment shares its output directory with the unfiltered templates"
            );
        }
        let target = options.output_dir.join(TEMPLATES_DIR);
        copy_tree(&options.resources_dir, &target)?;
        info!(path = %target.display(), "copied unfiltered resources");
        report.templates_dir = Some(target);
    }

    Ok(report)
}

/// Filters every resource for every environment into
/// `output_root/<environment>/`.
///
/// Environments run in the given order. Under [`FailurePolicy::Abort`] the
/// first error ends the run; under [`FailurePolicy::Continue`] a failing
/// environment is skipped and all failures are returned together at the
/// end. Output already written is left in place either way.
pub fn run(
    resources: &[ResourceFile],
    environments: &[Environment],
    output_root: &Path,
    options: &GenerateOptions,
) -> Result<GenerationReport, Error> {
    let policy = MissingPolicy::from(options);
    let mut report = GenerationReport::default();
    let mut failures = Vec::new();

    for environment in environments {
        info!(environment = environment.name(), "processing environment");
        match process_environment(environment, resources, output_root, &policy) {
            Ok(output) => {
                report.environments.insert(environment.name().to_string(), output);
            }
            Err(e) if options.failure_policy == FailurePolicy::Continue => {
                error!(environment = environment.name(), error = %e, "environment failed");
                failures.push(EnvironmentFailure {
                    environment: environment.name().to_string(),
                    error: e,
                });
            }
            Err(e) => return Err(e.into()),
        }
    }

    if failures.is_empty() {
        Ok(report)
    } else {
        Err(Error::Environments(failures))
    }
}

/// Merges one environment's properties and writes its filtered tree.
///
/// Stops at the environment's first failing file.
pub fn process_environment(
    environment: &Environment,
    resources: &[ResourceFile],
    output_root: &Path,
    policy: &MissingPolicy,
) -> Result<EnvironmentOutput, FilterError> {
    let properties = merge(environment.name(), environment.property_files())?;

    let dir = output_root.join(environment.name());
    create_dir(&dir)?;
    info!(path = %dir.display(), "created output directory");

    let mut unresolved = BTreeSet::new();
    for resource in resources {
        let result = filter(resource, &properties, policy)?;
        if !result.unresolved.is_empty() {
            warn!(
                environment = environment.name(),
                resource = %resource.path,
                variables = ?result.unresolved,
                "leaving placeholders unresolved"
            );
        }

        let target = dir.join(&resource.path);
        if let Some(parent) = target.parent() {
            create_dir(parent)?;
        }
        std::fs::write(&target, result.text.as_bytes()).map_err(|e| FilterError::Write {
            path: target.clone(),
            source: e,
        })?;
        info!(path = %target.display(), "wrote filtered file");

        unresolved.extend(result.unresolved);
    }

    Ok(EnvironmentOutput {
        dir,
        files: resources.len(),
        unresolved,
    })
}
