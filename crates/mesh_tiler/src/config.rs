//! Run configuration, loaded once at startup from TOML.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Configuration problems detected before a run starts.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config file {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse config TOML: {0}")]
  Parse(#[from] toml::de::Error),

  #[error("invalid config: {0}")]
  Invalid(String),
}

/// Root configuration for a tiling run.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TilerConfig {
  /// Number of detail layers in the pyramid.
  pub num_layers: usize,
  /// Worker thread count, fixed for the whole run.
  pub num_threads: usize,
  /// Triangles with shape quality below this are penalized during
  /// decimation, proportionally to their shape. Range [0, 1]; 0 disables.
  pub mesh_quality_threshold: f64,
  /// Boundary preservation weight.
  pub edge_weight: f64,
  /// Texture coordinate preservation weight.
  pub texture_weight: f64,
  /// Fraction of geometry kept on the coarsest layer.
  pub retention_min: f64,
  /// Fraction of geometry kept on the finest layer.
  pub retention_max: f64,
  /// World-unit padding around each tile cell for seam coverage.
  pub tile_buffer: f64,
  /// Skip producing artifacts that already exist on disk.
  pub use_cached_files: bool,
  /// Retention of the whole-mesh base simplification.
  pub base_retention: f64,
  /// Build layers from the base simplification instead of the input mesh.
  pub simplify_from_base: bool,
  /// Largest hole (in boundary edges) closed while cleaning.
  pub max_hole_size: u32,
  /// External tool locations.
  pub tools: ToolsConfig,
}

/// Executables of the external collaborators.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
  /// MeshLab's headless script runner.
  pub meshlab_server: PathBuf,
  /// OBJ to glTF converter.
  pub obj2gltf: PathBuf,
}

impl Default for TilerConfig {
  fn default() -> Self {
    Self {
      num_layers: 5,
      num_threads: 6,
      mesh_quality_threshold: 0.07,
      edge_weight: 100.0,
      texture_weight: 100.0,
      retention_min: 0.1,
      retention_max: 0.8,
      tile_buffer: 0.0,
      use_cached_files: true,
      base_retention: 0.5,
      simplify_from_base: true,
      max_hole_size: 30,
      tools: ToolsConfig::default(),
    }
  }
}

impl Default for ToolsConfig {
  fn default() -> Self {
    Self {
      meshlab_server: PathBuf::from("meshlabserver"),
      obj2gltf: PathBuf::from("obj2gltf"),
    }
  }
}

impl TilerConfig {
  /// Load and validate configuration from a TOML file.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_toml_str(&content)
  }

  /// Parse and validate configuration from TOML text.
  ///
  /// Missing keys fall back to [`TilerConfig::default`].
  pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
    let config: TilerConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
  }

  /// Reject settings that would produce a broken pyramid.
  pub fn validate(&self) -> Result<(), ConfigError> {
    let invalid = |msg: String| -> Result<(), ConfigError> { Err(ConfigError::Invalid(msg)) };

    if self.num_layers == 0 {
      return invalid("num_layers must be at least 1".into());
    }
    if self.num_threads == 0 {
      return invalid("num_threads must be at least 1".into());
    }
    if !(self.retention_min > 0.0 && self.retention_min <= self.retention_max && self.retention_max <= 1.0) {
      return invalid(format!(
        "retention bounds must satisfy 0 < retention_min <= retention_max <= 1, got {} and {}",
        self.retention_min, self.retention_max
      ));
    }
    if !(0.0..=1.0).contains(&self.mesh_quality_threshold) {
      return invalid(format!(
        "mesh_quality_threshold must be in [0, 1], got {}",
        self.mesh_quality_threshold
      ));
    }
    if !(self.base_retention > 0.0 && self.base_retention <= 1.0) {
      return invalid(format!("base_retention must be in (0, 1], got {}", self.base_retention));
    }
    if !(self.edge_weight >= 0.0 && self.texture_weight >= 0.0) {
      return invalid("edge_weight and texture_weight must be non-negative".into());
    }
    if !(self.tile_buffer >= 0.0 && self.tile_buffer.is_finite()) {
      return invalid(format!("tile_buffer must be a finite non-negative value, got {}", self.tile_buffer));
    }

    Ok(())
  }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
