use super::*;

#[test]
fn test_defaults_are_valid() {
  let config = TilerConfig::default();
  assert!(config.validate().is_ok());
  assert_eq!(config.num_layers, 5);
  assert_eq!(config.num_threads, 6);
  assert_eq!(config.retention_min, 0.1);
  assert_eq!(config.retention_max, 0.8);
}

#[test]
fn test_empty_toml_uses_defaults() {
  let config = TilerConfig::from_toml_str("").unwrap();
  assert_eq!(config, TilerConfig::default());
}

#[test]
fn test_partial_toml_overrides() {
  let config = TilerConfig::from_toml_str(
    r#"
num_layers = 2
tile_buffer = 0.25
use_cached_files = false

[tools]
obj2gltf = "/opt/bin/obj2gltf"
"#,
  )
  .unwrap();

  assert_eq!(config.num_layers, 2);
  assert_eq!(config.tile_buffer, 0.25);
  assert!(!config.use_cached_files);
  assert_eq!(config.tools.obj2gltf, PathBuf::from("/opt/bin/obj2gltf"));
  assert_eq!(config.tools.meshlab_server, PathBuf::from("meshlabserver"));
}

/// Inverted schedule bounds fail fast instead of producing a non-monotone
/// schedule.
#[test]
fn test_inverted_retention_bounds_rejected() {
  let err = TilerConfig::from_toml_str("retention_min = 0.9\nretention_max = 0.2\n").unwrap_err();
  assert!(matches!(err, ConfigError::Invalid(_)), "got {err}");
}

#[test]
fn test_zero_retention_rejected() {
  let config = TilerConfig {
    retention_min: 0.0,
    ..TilerConfig::default()
  };
  assert!(config.validate().is_err());
}

#[test]
fn test_zero_threads_rejected() {
  let config = TilerConfig {
    num_threads: 0,
    ..TilerConfig::default()
  };
  assert!(config.validate().is_err());
}

#[test]
fn test_quality_threshold_range() {
  let config = TilerConfig {
    mesh_quality_threshold: 1.5,
    ..TilerConfig::default()
  };
  assert!(config.validate().is_err());
}

#[test]
fn test_negative_buffer_rejected() {
  let config = TilerConfig {
    tile_buffer: -1.0,
    ..TilerConfig::default()
  };
  assert!(config.validate().is_err());
}

#[test]
fn test_unknown_key_rejected() {
  let err = TilerConfig::from_toml_str("num_layer = 3\n").unwrap_err();
  assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_load_missing_file() {
  let err = TilerConfig::load(Path::new("/definitely/not/here.toml")).unwrap_err();
  assert!(matches!(err, ConfigError::Read { .. }));
}
