//! External collaborators: mesh transforms and format conversion.
//!
//! Both run as separate processes in production. The pipeline only depends
//! on the [`MeshTransform`] and [`FormatConverter`] traits, so tests plug in
//! in-process fakes.

pub mod convert;
pub mod transform;

use std::process::Command;

pub use convert::{FormatConverter, Obj2Gltf};
pub use transform::{CleanParams, MeshLabServer, MeshOp, MeshScript, MeshTransform, SimplifyParams};

use crate::config::TilerConfig;
use crate::error::{Result, TilerError};

/// Lines of stderr kept in a [`TilerError::ToolFailed`].
const STDERR_TAIL_LINES: usize = 20;

/// The collaborators shared by every job of a run.
pub struct Collaborators {
  pub transform: Box<dyn MeshTransform>,
  pub converter: Box<dyn FormatConverter>,
}

impl Collaborators {
  pub fn new(transform: Box<dyn MeshTransform>, converter: Box<dyn FormatConverter>) -> Self {
    Self {
      transform,
      converter,
    }
  }

  /// MeshLab + obj2gltf at the configured tool paths.
  pub fn from_tools(config: &TilerConfig) -> Self {
    Self::new(
      Box::new(MeshLabServer::new(&config.tools.meshlab_server)),
      Box::new(Obj2Gltf::new(&config.tools.obj2gltf)),
    )
  }
}

/// Run a command to completion, turning spawn failures and non-zero exits
/// into errors.
pub(crate) fn run_tool(mut command: Command) -> Result<()> {
  let tool = command.get_program().to_string_lossy().into_owned();
  tracing::debug!(?command, "running external tool");

  let output = command.output().map_err(|source| TilerError::ToolSpawn {
    tool: tool.clone(),
    source,
  })?;

  if output.status.success() {
    return Ok(());
  }

  let stderr = String::from_utf8_lossy(&output.stderr);
  let lines: Vec<&str> = stderr.lines().collect();
  let tail = lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join("\n");
  Err(TilerError::ToolFailed {
    tool,
    status: output.status.to_string(),
    stderr: tail,
  })
}
