//! Loader configuration discovered next to the page templates.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::cache_bust::CacheBuster;
use crate::primitives::{INSERT_CSS, INSERT_SCRIPT};

const DEFAULT_CONFIG_FILE: &str = "bundle_loader.config.json";

/// Settings read by the loader when it is created.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoaderConfig {
  /// Skip cache-busting query components on expanded bundle items.
  pub disable_random_param: bool,
  /// Primitive used by [`crate::Loader::script`].
  pub script_primitive: String,
  /// Primitive used by [`crate::Loader::style`].
  pub style_primitive: String,
}

impl Default for LoaderConfig {
  fn default() -> Self {
    Self {
      disable_random_param: false,
      script_primitive: INSERT_SCRIPT.into(),
      style_primitive: INSERT_CSS.into(),
    }
  }
}

impl LoaderConfig {
  /// Attempt to load configuration from the provided directory.
  ///
  /// When the configuration file does not exist or fails to parse we fall back to default
  /// values so pages keep rendering with the usual primitives.
  pub fn discover(dir: &Path) -> Self {
    let candidate = dir.join(DEFAULT_CONFIG_FILE);
    match Self::from_path(&candidate) {
      Some(config) => {
        debug!(path = %candidate.display(), "loaded bundle loader configuration");
        config
      }
      None => {
        debug!(path = %candidate.display(), "using default bundle loader configuration");
        Self::default()
      }
    }
  }

  /// Read configuration from a specific JSON file.
  pub fn from_path(path: &Path) -> Option<Self> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
  }

  /// Cache buster honouring `disable_random_param`.
  pub fn cache_buster(&self) -> CacheBuster {
    CacheBuster::new(self.disable_random_param)
  }

  /// Seeded cache buster honouring `disable_random_param`.
  pub fn cache_buster_seeded(&self, seed: u64) -> CacheBuster {
    CacheBuster::with_seed(self.disable_random_param, seed)
  }
}
