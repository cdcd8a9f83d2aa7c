//! Existence-based skip decision for produced artifacts.
//!
//! The gate only looks at whether the target file is present. A stale file
//! with the right name counts as a hit.

use std::path::Path;

/// Decides whether a producing stage may skip its work.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheGate {
  enabled: bool,
}

impl CacheGate {
  pub fn new(enabled: bool) -> Self {
    Self { enabled }
  }

  /// Gate that never skips.
  pub fn disabled() -> Self {
    Self::new(false)
  }

  pub fn is_enabled(&self) -> bool {
    self.enabled
  }

  /// True iff caching is enabled and `path` already exists.
  ///
  /// A hit replaces the write with a read: callers must still load whatever
  /// in-memory state later stages expect from the artifact.
  pub fn should_skip(&self, path: &Path) -> bool {
    let hit = self.enabled && path.exists();
    if hit {
      tracing::debug!(path = %path.display(), "cache hit");
    }
    hit
  }
}

impl Default for CacheGate {
  fn default() -> Self {
    Self::new(true)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_hit_when_enabled_and_present() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("layer_0.obj");
    std::fs::write(&path, "").unwrap();

    assert!(CacheGate::new(true).should_skip(&path));
  }

  #[test]
  fn test_miss_when_absent() {
    let dir = tempfile::TempDir::new().unwrap();
    assert!(!CacheGate::new(true).should_skip(&dir.path().join("missing.obj")));
  }

  #[test]
  fn test_disabled_never_skips() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("layer_0.obj");
    std::fs::write(&path, "").unwrap();

    assert!(!CacheGate::disabled().should_skip(&path));
    assert!(!CacheGate::disabled().is_enabled());
  }
}
