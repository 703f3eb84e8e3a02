//! Multi-environment template filtering.
//!
//! Each subdirectory of the filters root is an environment. Its property
//! files are merged into one map, which is substituted into every resource
//! template and written to `<output>/<environment>/`.

mod environment;
mod error;
mod generate;
mod merge;
mod properties;
mod resources;
mod scanner;
mod template;

pub use environment::{
    list_subdirectories, resolve_environments, Environment, PROPERTY_FILE_PATTERN,
};
pub use error::FilterError;
pub use generate::{
    generate, process_environment, run, EnvironmentOutput, GenerationReport, TEMPLATES_DIR,
};
pub use merge::{merge, MergedProperties};
pub use properties::PropertySource;
pub use resources::{copy_tree, load_resources, scan_resources, PathSelector, ResourceFile};
pub use scanner::{placeholders, scan, Placeholder, Placeholders};
pub use template::{filter, substitute, FilterResult, MissingPolicy};
