use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::{Config, ConfigError};

/// How a failing environment affects the rest of a generation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop at the first error.
    #[default]
    Abort,
    /// Finish the other environments, then report every failure together.
    Continue,
}

/// Options for the `generate` step.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GenerateOptions {
    /// Root of the template tree.
    pub resources_dir: PathBuf,
    /// One subdirectory per environment, holding its `.properties` files.
    pub filters_dir: PathBuf,
    /// Where `<environment>/` output trees are written.
    pub output_dir: PathBuf,
    /// Glob patterns selecting templates; empty selects all.
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
    /// Also copy the raw templates to `<output_dir>/templates`.
    pub include_unfiltered_resources: bool,
    pub fail_on_missing_properties: bool,
    pub allowed_missing_properties: BTreeSet<String>,
    pub failure_policy: FailurePolicy,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            resources_dir: PathBuf::from("src/main/resources"),
            filters_dir: PathBuf::from("src/main/filters"),
            output_dir: PathBuf::from("target/config"),
            includes: Vec::new(),
            excludes: Vec::new(),
            include_unfiltered_resources: true,
            fail_on_missing_properties: true,
            allowed_missing_properties: BTreeSet::new(),
            failure_policy: FailurePolicy::Abort,
        }
    }
}

/// Options for the `package` step.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PackageOptions {
    /// The generate step's output directory.
    pub input_dir: PathBuf,
    /// Where archives are written.
    pub output_dir: PathBuf,
    pub final_name: String,
    pub classifier_prefix: String,
    pub classifier_postfix: String,
    /// Empty falls back to [`Self::DEFAULT_INCLUDES`].
    pub includes: Vec<String>,
    /// Empty falls back to [`Self::DEFAULT_EXCLUDES`].
    pub excludes: Vec<String>,
}

impl PackageOptions {
    pub const DEFAULT_INCLUDES: &'static [&'static str] = &["**/*"];
    pub const DEFAULT_EXCLUDES: &'static [&'static str] = &["**/package.html"];

    /// The include patterns to archive with.
    pub fn effective_includes(&self) -> Vec<String> {
        or_defaults(&self.includes, Self::DEFAULT_INCLUDES)
    }

    /// The exclude patterns to archive with.
    pub fn effective_excludes(&self) -> Vec<String> {
        or_defaults(&self.excludes, Self::DEFAULT_EXCLUDES)
    }
}

fn or_defaults(patterns: &[String], defaults: &[&str]) -> Vec<String> {
    if patterns.is_empty() {
        defaults.iter().map(|p| p.to_string()).collect()
    } else {
        patterns.to_vec()
    }
}

impl Default for PackageOptions {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("target/config"),
            output_dir: PathBuf::from("target"),
            final_name: "config".to_string(),
            classifier_prefix: "-".to_string(),
            classifier_postfix: "-config".to_string(),
            includes: or_defaults(&[], Self::DEFAULT_INCLUDES),
            excludes: or_defaults(&[], Self::DEFAULT_EXCLUDES),
        }
    }
}

/// Both option sets, as laid out in a config file:
///
/// ```toml
/// [generate]
/// resources_dir = "templates"
/// allowed_missing_properties = ["user.home"]
///
/// [package]
/// final_name = "billing-1.4.0"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub generate: GenerateOptions,
    pub package: PackageOptions,
}

impl Settings {
    /// Prefix for environment overrides, e.g. `CONFGEN__GENERATE__OUTPUT_DIR`.
    pub const ENV_PREFIX: &'static str = "CONFGEN";

    /// Loads settings from an optional TOML file, then applies
    /// `CONFGEN__*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.with_file(path, true);
        }
        builder.with_env(Self::ENV_PREFIX, "__").build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.generate.fail_on_missing_properties);
        assert!(settings.generate.include_unfiltered_resources);
        assert_eq!(settings.package.classifier_prefix, "-");
        assert_eq!(settings.package.classifier_postfix, "-config");
    }

    #[test]
    fn test_partial_file() {
        let settings: Settings = toml::from_str(
            r#"
            [generate]
            filters_dir = "filters"
            allowed_missing_properties = ["user.home", "java.io.tmpdir"]
            failure_policy = "continue"

            [package]
            final_name = "billing-1.4.0"
            "#,
        )
        .unwrap();

        assert_eq!(settings.generate.filters_dir, PathBuf::from("filters"));
        assert_eq!(settings.generate.resources_dir, PathBuf::from("src/main/resources"));
        assert!(settings.generate.allowed_missing_properties.contains("user.home"));
        assert_eq!(settings.generate.failure_policy, FailurePolicy::Continue);
        assert_eq!(settings.package.final_name, "billing-1.4.0");
        assert_eq!(settings.package.includes, vec!["**/*".to_string()]);
    }

    #[test]
    fn test_empty_package_patterns_fall_back_to_defaults() {
        let settings: Settings =
            toml::from_str("[package]\nincludes = []\nexcludes = []").unwrap();
        assert!(settings.package.includes.is_empty());
        assert_eq!(settings.package.effective_includes(), vec!["**/*".to_string()]);
        assert_eq!(
            settings.package.effective_excludes(),
            vec!["**/package.html".to_string()]
        );

        let custom = PackageOptions {
            excludes: vec!["**/*.bak".to_string()],
            ..PackageOptions::default()
        };
        assert_eq!(custom.effective_excludes(), vec!["**/*.bak".to_string()]);
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let result: Result<Settings, _> = toml::from_str("[generate]\nfailure_policy = \"retry\"");
        assert!(result.is_err());
    }
}
