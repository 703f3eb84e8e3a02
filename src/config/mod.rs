//! Loading of generation and packaging options.

mod builder;
mod env;
mod error;
mod options;

pub use builder::Config;
pub use error::ConfigError;
pub use options::{FailurePolicy, GenerateOptions, PackageOptions, Settings};
