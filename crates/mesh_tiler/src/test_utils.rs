//! In-process fakes and fixtures for tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use glam::DVec3;

use crate::collab::{Collaborators, FormatConverter, MeshScript, MeshTransform};
use crate::error::{Result, TilerError};
use crate::layout::material_sidecar;
use crate::mesh::ObjMesh;
use crate::voxel::{VoxelGrid, VoxelIndex};

/// Closed unit cube spanning `[0, 1]^3`, 8 vertices and 12 triangles.
pub const UNIT_CUBE_OBJ: &str = "\
mtllib cube.mtl
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
v 0 0 1
v 1 0 1
v 1 1 1
v 0 1 1
usemtl cube
f 1 3 2
f 1 4 3
f 5 6 7
f 5 7 8
f 1 2 6
f 1 6 5
f 4 7 3
f 4 8 7
f 1 5 8
f 1 8 4
f 2 3 7
f 2 7 6
";

pub const UNIT_CUBE_MTL: &str = "\
newmtl cube
Kd 1 1 1
map_Kd textures/cube.png
";

pub fn unit_cube_mesh() -> ObjMesh {
  ObjMesh::parse(UNIT_CUBE_OBJ, Path::new("cube.obj")).unwrap()
}

/// Write the unit cube OBJ to `path`.
pub fn write_unit_cube(path: &Path) {
  fs::write(path, UNIT_CUBE_OBJ).unwrap();
}

/// Write the unit cube with its material file and texture beside it.
pub fn write_textured_cube(dir: &Path) -> PathBuf {
  let obj = dir.join("cube.obj");
  write_unit_cube(&obj);
  fs::write(dir.join("cube.mtl"), UNIT_CUBE_MTL).unwrap();
  fs::create_dir_all(dir.join("textures")).unwrap();
  fs::write(dir.join("textures/cube.png"), b"\x89PNG fake").unwrap();
  obj
}

/// A collaborator call, in the order calls started.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
  Transform(MeshScript),
  Convert { source: PathBuf, target: PathBuf },
}

#[derive(Default)]
struct FakeToolsState {
  calls: Mutex<Vec<Call>>,
  /// File names whose production fails.
  fail_on: Mutex<Vec<String>>,
}

/// Fake mesh transform and converter sharing one call journal.
///
/// The transform copies the input mesh (and its material side-car) to the
/// output. The converter writes a minimal glTF document.
#[derive(Clone, Default)]
pub struct FakeTools {
  state: Arc<FakeToolsState>,
}

impl FakeTools {
  pub fn new() -> Self {
    Self::default()
  }

  /// Collaborators backed by clones of this fake.
  pub fn collaborators(&self) -> Collaborators {
    Collaborators::new(Box::new(self.clone()), Box::new(self.clone()))
  }

  /// Make any call producing a file named `file_name` fail.
  pub fn fail_on(&self, file_name: &str) {
    self.state.fail_on.lock().unwrap().push(file_name.to_owned());
  }

  pub fn calls(&self) -> Vec<Call> {
    self.state.calls.lock().unwrap().clone()
  }

  pub fn call_count(&self) -> usize {
    self.state.calls.lock().unwrap().len()
  }

  pub fn scripts(&self) -> Vec<MeshScript> {
    self
      .calls()
      .into_iter()
      .filter_map(|call| match call {
        Call::Transform(script) => Some(script),
        Call::Convert { .. } => None,
      })
      .collect()
  }

  pub fn conversions(&self) -> Vec<PathBuf> {
    self
      .calls()
      .into_iter()
      .filter_map(|call| match call {
        Call::Convert { target, .. } => Some(target),
        Call::Transform(_) => None,
      })
      .collect()
  }

  fn record(&self, call: Call) {
    self.state.calls.lock().unwrap().push(call);
  }

  fn check_failure(&self, target: &Path) -> Result<()> {
    let name = target.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    if self.state.fail_on.lock().unwrap().contains(&name) {
      return Err(TilerError::ToolFailed {
        tool: "fake".into(),
        status: "exit status: 1".into(),
        stderr: format!("refusing to write {name}"),
      });
    }
    Ok(())
  }
}

impl MeshTransform for FakeTools {
  fn apply(&self, script: &MeshScript) -> Result<()> {
    self.record(Call::Transform(script.clone()));
    if !script.input.exists() {
      return Err(TilerError::MissingArtifact(script.input.clone()));
    }
    self.check_failure(&script.output)?;

    fs::copy(&script.input, &script.output).map_err(|e| TilerError::io(&script.output, e))?;
    let mtl = material_sidecar(&script.input);
    if mtl.exists() {
      let out_mtl = material_sidecar(&script.output);
      fs::copy(&mtl, &out_mtl).map_err(|e| TilerError::io(&out_mtl, e))?;
    }
    Ok(())
  }
}

impl FormatConverter for FakeTools {
  fn convert(&self, source: &Path, target: &Path) -> Result<()> {
    self.record(Call::Convert {
      source: source.to_path_buf(),
      target: target.to_path_buf(),
    });
    if !source.exists() {
      return Err(TilerError::MissingArtifact(source.to_path_buf()));
    }
    self.check_failure(target)?;

    let doc = format!(
      "{{\"asset\":{{\"version\":\"2.0\"}},\"extras\":{{\"source\":\"{}\"}}}}",
      source.file_name().map(|n| n.to_string_lossy()).unwrap_or_default()
    );
    fs::write(target, doc).map_err(|e| TilerError::io(target, e))
  }
}

/// [`VoxelIndex`] returning the same cells for every query.
pub struct FixedVoxelIndex {
  pub origin: DVec3,
  pub dims: [i32; 3],
  pub cells: Vec<crate::voxel::VoxelCoord>,
}

impl VoxelIndex for FixedVoxelIndex {
  fn occupied_cells(&self, mesh: &Path, cell_size: f64) -> Result<VoxelGrid> {
    if !mesh.exists() {
      return Err(TilerError::MissingArtifact(mesh.to_path_buf()));
    }
    Ok(VoxelGrid::new(self.origin, cell_size, self.dims, self.cells.clone()))
  }
}
