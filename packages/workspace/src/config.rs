use crate::errors::StateResult;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tandem_editor::TransformOptions;

pub const DEFAULT_CONFIG_NAME: &str = "tandem.config.json";

/// Project-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceConfig {
    /// Project-relative folder image assets are written to
    #[serde(default = "default_image_folder")]
    pub image_folder: String,

    /// Files whose processing result is kept in the template node cache
    #[serde(default = "default_max_cached_files")]
    pub max_cached_files: usize,

    /// Files larger than this are always reprocessed
    #[serde(default = "default_max_cached_file_bytes")]
    pub max_cached_file_bytes: usize,
}

fn default_image_folder() -> String {
    "public/images".to_string()
}

fn default_max_cached_files() -> usize {
    200
}

fn default_max_cached_file_bytes() -> usize {
    1024 * 1024
}

impl WorkspaceConfig {
    pub fn from_json_str(json: &str) -> StateResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load config from a project directory
    pub fn load(dir: impl AsRef<Path>) -> StateResult<Self> {
        let path = dir.as_ref().join(DEFAULT_CONFIG_NAME);

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            Self::from_json_str(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn transform_options(&self) -> TransformOptions {
        TransformOptions {
            image_folder: self.image_folder.clone(),
        }
    }
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            image_folder: default_image_folder(),
            max_cached_files: default_max_cached_files(),
            max_cached_file_bytes: default_max_cached_file_bytes(),
        }
    }
}
