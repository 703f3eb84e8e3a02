//! Per-environment configuration generation.
//!
//! Templates containing `${name}` placeholders are filtered once for every
//! environment found under a filters directory, and each environment's
//! output can then be archived on its own.
//!
//! ```no_run
//! use confgen::{generate, package, Settings};
//!
//! let settings = Settings::load(None)?;
//! let report = generate(&settings.generate)?;
//! for (environment, dir) in report.output_dirs() {
//!     println!("{environment}: {}", dir.display());
//! }
//! let artifacts = package(&settings.package)?;
//! # Ok::<(), confgen::Error>(())
//! ```

pub mod config;
mod error;
pub mod filter;
pub mod package;

pub use config::{Config, ConfigError, FailurePolicy, GenerateOptions, PackageOptions, Settings};
pub use error::{EnvironmentFailure, Error};
pub use filter::{generate, FilterError, GenerationReport};
pub use package::{package, Artifact, PackageError};
