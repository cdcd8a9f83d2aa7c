//! Error types shared by every pipeline component.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Failure raised by a pipeline component or a job.
///
/// Inside a worker these end up in a [`JobFailure`](crate::JobFailure) and
/// never reach the orchestrator as an `Err`.
#[derive(Debug, Error)]
pub enum TilerError {
  /// Filesystem operation failed.
  #[error("I/O error on {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// Malformed OBJ or MTL content.
  #[error("failed to parse {path}: {message}")]
  MeshParse { path: PathBuf, message: String },

  /// Mesh file contained no usable geometry.
  #[error("mesh {0} has no geometry")]
  EmptyMesh(PathBuf),

  /// An upstream artifact a stage depends on is absent.
  #[error("required artifact {0} does not exist")]
  MissingArtifact(PathBuf),

  /// External tool could not be started.
  #[error("failed to launch {tool}: {source}")]
  ToolSpawn {
    tool: String,
    #[source]
    source: std::io::Error,
  },

  /// External tool exited unsuccessfully.
  #[error("{tool} exited with {status}: {stderr}")]
  ToolFailed {
    tool: String,
    status: String,
    stderr: String,
  },

  /// A job panicked on a worker thread.
  #[error("job panicked: {0}")]
  JobPanicked(String),

  /// A worker thread could not be spawned.
  #[error("failed to spawn worker thread: {0}")]
  WorkerSpawn(#[source] std::io::Error),

  #[error(transparent)]
  Config(#[from] ConfigError),
}

impl TilerError {
  /// Wrap an I/O error with the path it happened on.
  pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    Self::Io {
      path: path.into(),
      source,
    }
  }
}

/// Shorthand used across the crate.
pub type Result<T, E = TilerError> = std::result::Result<T, E>;
