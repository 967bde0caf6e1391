use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tandem_semantics::IGNORED_CLASSES;

pub const DEFAULT_CONFIG_NAME: &str = "tandem.mirror.json";

/// Mirror tuning knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MirrorConfig {
    /// Maximum characters kept in a layer's text snippet
    #[serde(default = "default_text_snippet_limit")]
    pub text_snippet_limit: usize,

    /// Distance in pixels within which a drag snaps back to its origin
    #[serde(default = "default_snap_threshold")]
    pub snap_threshold: f64,

    /// Quiet period before batched mutations are rescanned
    #[serde(default = "default_mutation_debounce_ms")]
    pub mutation_debounce_ms: u64,

    /// Interval of the periodic full rescan
    #[serde(default = "default_keep_alive_ms")]
    pub keep_alive_ms: u64,

    /// Helper classes the mirror never reports
    #[serde(default = "default_ignored_classes")]
    pub ignored_classes: Vec<String>,

    /// Helper element ids the mirror never reports
    #[serde(default)]
    pub ignored_ids: Vec<String>,
}

fn default_text_snippet_limit() -> usize {
    500
}

fn default_snap_threshold() -> f64 {
    20.0
}

fn default_mutation_debounce_ms() -> u64 {
    100
}

fn default_keep_alive_ms() -> u64 {
    5000
}

fn default_ignored_classes() -> Vec<String> {
    IGNORED_CLASSES.iter().map(|c| c.to_string()).collect()
}

impl MirrorConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load the config from a directory, falling back to defaults when the
    /// file does not exist
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = dir.as_ref().join(DEFAULT_CONFIG_NAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        Self::from_json_str(&content)
    }

    pub fn mutation_debounce(&self) -> Duration {
        Duration::from_millis(self.mutation_debounce_ms)
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_millis(self.keep_alive_ms)
    }

    pub fn is_ignored_class(&self, class: &str) -> bool {
        self.ignored_classes.iter().any(|c| c == class)
    }

    pub fn is_ignored_id(&self, id: &str) -> bool {
        self.ignored_ids.iter().any(|i| i == id)
    }
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            text_snippet_limit: default_text_snippet_limit(),
            snap_threshold: default_snap_threshold(),
            mutation_debounce_ms: default_mutation_debounce_ms(),
            keep_alive_ms: default_keep_alive_ms(),
            ignored_classes: default_ignored_classes(),
            ignored_ids: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_config() {
        let config = MirrorConfig::from_json_str(
            r#"{ "snapThreshold": 8.5, "ignoredIds": ["devtools-overlay"] }"#,
        )
        .unwrap();
        assert_eq!(config.snap_threshold, 8.5);
        assert_eq!(config.text_snippet_limit, 500);
        assert!(config.is_ignored_id("devtools-overlay"));
        assert!(config.is_ignored_class("tandem-drag-stub"));
    }

    #[test]
    fn test_default_config() {
        let config = MirrorConfig::default();
        assert_eq!(config.mutation_debounce(), Duration::from_millis(100));
        assert_eq!(config.keep_alive(), Duration::from_secs(5));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(MirrorConfig::load(dir.path()).unwrap(), MirrorConfig::default());

        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_NAME),
            r#"{ "textSnippetLimit": 40 }"#,
        )
        .unwrap();
        assert_eq!(MirrorConfig::load(dir.path()).unwrap().text_snippet_limit, 40);

        std::fs::write(dir.path().join(DEFAULT_CONFIG_NAME), "{ nope").unwrap();
        assert!(matches!(
            MirrorConfig::load(dir.path()),
            Err(ConfigError::Json(_))
        ));
    }
}
