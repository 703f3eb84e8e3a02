use crate::config::ConfigError;
use crate::filter::FilterError;
use crate::package::PackageError;
use thiserror::Error;

/// Top-level error type for the confgen library.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Package(#[from] PackageError),

    #[error("generation failed for environments [{}]", failed_names(.0))]
    Environments(Vec<EnvironmentFailure>),
}

/// One environment's error, collected under [`FailurePolicy::Continue`].
///
/// [`FailurePolicy::Continue`]: crate::FailurePolicy::Continue
#[derive(Debug)]
pub struct EnvironmentFailure {
    pub environment: String,
    pub error: FilterError,
}

fn failed_names(failures: &[EnvironmentFailure]) -> String {
    failures
        .iter()
        .map(|f| f.environment.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
