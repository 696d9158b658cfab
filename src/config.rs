//! Dataset configuration loaded from environment variables.

use std::collections::BTreeSet;

/// Dataset configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetConfig {
    /// Attribute keys kept by `Dataset::filter_attributes`; an empty set keeps nothing.
    pub attributes_to_preserve: BTreeSet<String>,
    /// Regenerate objects on the rayon thread pool.
    pub parallel_regeneration: bool,
}

impl DatasetConfig {
    /// Load configuration from environment variables.
    ///
    /// - `CITYMESH_PRESERVE_ATTRIBUTES` - comma-separated attribute keys
    /// - `CITYMESH_SEQUENTIAL` - when set, regeneration runs on the calling thread
    pub fn from_env() -> Self {
        Self {
            attributes_to_preserve: std::env::var("CITYMESH_PRESERVE_ATTRIBUTES")
                .map(|keys| parse_key_list(&keys))
                .unwrap_or_default(),
            parallel_regeneration: std::env::var_os("CITYMESH_SEQUENTIAL").is_none(),
        }
    }

    /// Replace the preservation set with the given keys.
    pub fn with_preserved<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes_to_preserve = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn sequential(mut self) -> Self {
        self.parallel_regeneration = false;
        self
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            attributes_to_preserve: BTreeSet::new(),
            parallel_regeneration: true,
        }
    }
}

/// Split a comma-separated key list, dropping blanks
pub fn parse_key_list(keys: &str) -> BTreeSet<String> {
    keys.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_list() {
        let keys = parse_key_list(" name, height ,,function");
        assert_eq!(keys.len(), 3);
        assert!(keys.contains("height"));
        assert!(parse_key_list("").is_empty());
    }

    #[test]
    fn test_builder() {
        let config = DatasetConfig::default().with_preserved(["a", "b"]).sequential();
        assert_eq!(config.attributes_to_preserve.len(), 2);
        assert!(!config.parallel_regeneration);
    }
}
