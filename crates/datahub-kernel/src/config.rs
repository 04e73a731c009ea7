//! Hub configuration.
//!
//! Loaded from RON:
//!
//! ```ron
//! (
//!     missions: ["Sentinel-1", "Sentinel-2"],
//!     db_path: "/var/cache/datahub/trees.db",
//!     tree_cache_capacity: 64,
//!     range_cache_capacity: 256,
//! )
//! ```
//!
//! Omitted fields take their defaults.

use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Settings for a [`DataHub`](crate::DataHub).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Missions exposed under the root, in order.
    pub missions: Vec<String>,
    /// SQLite file used by [`DataHub::open`](crate::DataHub::open).
    pub db_path: PathBuf,
    /// Product trees kept in memory.
    pub tree_cache_capacity: usize,
    /// Fetched byte ranges kept in memory.
    pub range_cache_capacity: usize,
    /// Products requested per listing call.
    pub listing_page_size: usize,
    /// Name of the assembled root directory.
    pub root_name: String,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            missions: Vec::new(),
            db_path: PathBuf::from("datahub.db"),
            tree_cache_capacity: 64,
            range_cache_capacity: 256,
            listing_page_size: 100,
            root_name: "/".to_string(),
        }
    }
}

impl HubConfig {
    /// Default settings for the given missions.
    pub fn with_missions<I, S>(missions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            missions: missions.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Parse and validate a RON document.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let config: HubConfig = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a RON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron_str(&text)
    }

    /// Reject settings the hub cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tree_cache_capacity == 0 {
            return Err(ConfigError::Invalid("tree_cache_capacity must be > 0".into()));
        }
        if self.range_cache_capacity == 0 {
            return Err(ConfigError::Invalid("range_cache_capacity must be > 0".into()));
        }
        if self.listing_page_size == 0 {
            return Err(ConfigError::Invalid("listing_page_size must be > 0".into()));
        }
        if let Some(bad) = self
            .missions
            .iter()
            .find(|m| m.is_empty() || m.contains(datahub_types::SEPARATOR))
        {
            return Err(ConfigError::Invalid(format!("bad mission name {bad:?}")));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.missions.iter().find(|m| !seen.insert(m.as_str())) {
            return Err(ConfigError::Invalid(format!("duplicate mission {dup:?}")));
        }
        if self.root_name.is_empty() {
            return Err(ConfigError::Invalid("root_name must not be empty".into()));
        }
        Ok(())
    }

    pub(crate) fn tree_capacity(&self) -> Result<NonZeroUsize, ConfigError> {
        NonZeroUsize::new(self.tree_cache_capacity)
            .ok_or_else(|| ConfigError::Invalid("tree_cache_capacity must be > 0".into()))
    }

    pub(crate) fn range_capacity(&self) -> Result<NonZeroUsize, ConfigError> {
        NonZeroUsize::new(self.range_cache_capacity)
            .ok_or_else(|| ConfigError::Invalid("range_cache_capacity must be > 0".into()))
    }
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_omitted_fields() {
        let config = HubConfig::from_ron_str(r#"(missions: ["Sentinel-1"])"#).unwrap();
        assert_eq!(config.missions, ["Sentinel-1"]);
        assert_eq!(config.tree_cache_capacity, 64);
        assert_eq!(config.range_cache_capacity, 256);
        assert_eq!(config.listing_page_size, 100);
        assert_eq!(config.root_name, "/");
    }

    #[test]
    fn test_full_document() {
        let text = r#"(
            missions: ["Sentinel-1", "Sentinel-2"],
            db_path: "/tmp/trees.db",
            tree_cache_capacity: 8,
            range_cache_capacity: 16,
            listing_page_size: 50,
            root_name: "hub",
        )"#;
        let config = HubConfig::from_ron_str(text).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/trees.db"));
        assert_eq!(config.tree_cache_capacity, 8);
        assert_eq!(config.root_name, "hub");
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = HubConfig::from_ron_str("(tree_cache_capacity: 0)").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        let err = HubConfig::from_ron_str("(range_cache_capacity: 0)").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_bad_mission_name_rejected() {
        let err = HubConfig::from_ron_str(r#"(missions: ["a/b"])"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(HubConfig::with_missions([""]).validate().is_err());
    }

    #[test]
    fn test_duplicate_mission_rejected() {
        let err =
            HubConfig::from_ron_str(r#"(missions: ["Sentinel-1", "Sentinel-2", "Sentinel-1"])"#)
                .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref msg) if msg.contains("Sentinel-1")));
    }

    #[test]
    fn test_bad_ron() {
        let err = HubConfig::from_ron_str("(missions: [").unwrap_err();
        assert!(matches!(err, ConfigError::Ron(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hub.ron");
        std::fs::write(&path, r#"(missions: ["Sentinel-3"], listing_page_size: 10)"#).unwrap();

        let config = HubConfig::load(&path).unwrap();
        let expected = HubConfig {
            listing_page_size: 10,
            ..HubConfig::with_missions(["Sentinel-3"])
        };
        assert_eq!(config, expected);

        let err = HubConfig::load(dir.path().join("missing.ron")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
