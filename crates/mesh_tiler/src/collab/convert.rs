//! Format converter collaborator: OBJ + MTL to glTF.

use std::path::{Path, PathBuf};
use std::process::Command;

use super::run_tool;
use crate::error::{Result, TilerError};

/// Converts a mesh with materials to the interchange format.
pub trait FormatConverter: Send + Sync {
  /// Convert `source` into `target`.
  ///
  /// Fails with [`TilerError::MissingArtifact`] if `source` does not exist.
  fn convert(&self, source: &Path, target: &Path) -> Result<()>;
}

/// [`FormatConverter`] running the `obj2gltf` command-line tool.
///
/// Textures are resolved by the tool relative to the source's material file.
#[derive(Clone, Debug)]
pub struct Obj2Gltf {
  executable: PathBuf,
}

impl Obj2Gltf {
  pub fn new(executable: impl Into<PathBuf>) -> Self {
    Self {
      executable: executable.into(),
    }
  }
}

impl FormatConverter for Obj2Gltf {
  fn convert(&self, source: &Path, target: &Path) -> Result<()> {
    if !source.exists() {
      return Err(TilerError::MissingArtifact(source.to_path_buf()));
    }

    let mut command = Command::new(&self.executable);
    command.arg("-i").arg(source).arg("-o").arg(target);
    run_tool(command)
  }
}
