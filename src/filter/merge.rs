use std::collections::btree_map::{self, BTreeMap};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::properties::PropertySource;
use super::FilterError;

/// All property values of one environment, keyed by property name.
///
/// Built from the environment's property files; a key may come from only
/// one of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedProperties {
    environment: String,
    values: BTreeMap<String, String>,
    origins: BTreeMap<String, PathBuf>,
}

impl MergedProperties {
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            ..Self::default()
        }
    }

    /// Builds a map from in-memory pairs with no file of origin.
    pub fn from_values<K, V>(
        environment: impl Into<String>,
        values: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            environment: environment.into(),
            values: values.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            origins: BTreeMap::new(),
        }
    }

    /// Adds every entry of `source`, failing on the first key that an
    /// earlier source already defined.
    pub fn absorb(&mut self, source: PropertySource) -> Result<(), FilterError> {
        let origin = source.path().to_path_buf();
        for (key, value) in source {
            match self.values.entry(key) {
                btree_map::Entry::Occupied(existing) => {
                    let first = self.origins.get(existing.key()).cloned().unwrap_or_default();
                    return Err(FilterError::Conflict {
                        key: existing.key().clone(),
                        environment: self.environment.clone(),
                        first,
                        second: origin,
                    });
                }
                btree_map::Entry::Vacant(slot) => {
                    self.origins.insert(slot.key().clone(), origin.clone());
                    slot.insert(value);
                }
            }
        }
        Ok(())
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// The file a key was read from, if it came from a file.
    pub fn origin(&self, key: &str) -> Option<&Path> {
        self.origins.get(key).map(PathBuf::as_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Loads and merges the property files of one environment.
///
/// Files are read in sorted path order.
pub fn merge(
    environment: &str,
    property_files: &[PathBuf],
) -> Result<MergedProperties, FilterError> {
    let mut files = property_files.to_vec();
    files.sort();

    let mut merged = MergedProperties::new(environment);
    for file in &files {
        debug!(environment, path = %file.display(), "reading values");
        merged.absorb(PropertySource::load(file)?)?;
    }

    debug!(environment, keys = merged.len(), "merged properties");
    Ok(merged)
}
