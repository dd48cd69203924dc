//! Configuration
//!
//! TOML configuration for the pipelines and the render view. Every section
//! is optional; missing values fall back to their defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PageCraftError, Result};

/// Producer identifier written into scrubbed documents by default
pub const DEFAULT_PRODUCER: &str = "pagecraft";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageCraftConfig {
    /// Producer value stamped by the scrub pipeline
    pub producer: String,
    pub render: RenderConfig,
    pub output: OutputConfig,
}

impl Default for PageCraftConfig {
    fn default() -> Self {
        Self {
            producer: DEFAULT_PRODUCER.to_string(),
            render: RenderConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Scale used for the page preview
    pub preview_scale: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { preview_scale: 1.5 }
    }
}

/// Default download names, used when the user leaves the name empty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub organize_filename: String,
    pub merge_filename: String,
    pub scrub_filename: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            organize_filename: "organized.pdf".to_string(),
            merge_filename: "merged.pdf".to_string(),
            scrub_filename: "scrubbed.pdf".to_string(),
        }
    }
}

impl PageCraftConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns `Config` if the file cannot be read, is malformed, or holds
    /// an invalid value.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            PageCraftError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    ///
    /// ```
    /// use pagecraft_core::config::PageCraftConfig;
    ///
    /// let config = PageCraftConfig::from_toml(r#"
    ///     producer = "acme-tools"
    ///
    ///     [render]
    ///     preview_scale = 2.0
    /// "#).unwrap();
    /// assert_eq!(config.producer, "acme-tools");
    /// assert_eq!(config.output.merge_filename, "merged.pdf");
    /// ```
    pub fn from_toml(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).map_err(|e| PageCraftError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.render.preview_scale.is_finite() && self.render.preview_scale > 0.0) {
            return Err(PageCraftError::Config(format!(
                "render.preview_scale must be positive, got {}",
                self.render.preview_scale
            )));
        }
        Ok(())
    }
}
