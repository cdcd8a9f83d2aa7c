//! Artifact naming under a per-model output root.
//!
//! ```text
//! <out>/<texture files>
//! <out>/simple_full_mesh.{obj,mtl}
//! <out>/layer_<i>.{obj,mtl,gltf}
//! <out>/tile_<layer>_<x>_<y>_<z>.gltf
//! ```
//!
//! Every path is unique to the job that writes it, which is what lets jobs
//! of one stage run without locking.

use std::path::{Path, PathBuf};

use crate::voxel::VoxelCoord;

/// File name of the whole-mesh base simplification.
pub const BASE_MESH_NAME: &str = "simple_full_mesh";

/// Resolves artifact paths for one model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputLayout {
  root: PathBuf,
}

impl OutputLayout {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Destination of a copied texture, keeping its relative path.
  pub fn texture(&self, relative: &Path) -> PathBuf {
    self.root.join(relative)
  }

  pub fn base_mesh(&self) -> PathBuf {
    self.root.join(format!("{BASE_MESH_NAME}.obj"))
  }

  pub fn layer_mesh(&self, layer: usize) -> PathBuf {
    self.root.join(format!("layer_{layer}.obj"))
  }

  pub fn layer_gltf(&self, layer: usize) -> PathBuf {
    self.root.join(format!("layer_{layer}.gltf"))
  }

  /// Intermediate cropped mesh of a tile, deleted after conversion.
  pub fn tile_mesh(&self, layer: usize, coord: VoxelCoord) -> PathBuf {
    self.root.join(format!("{}.obj", tile_stem(layer, coord)))
  }

  pub fn tile_gltf(&self, layer: usize, coord: VoxelCoord) -> PathBuf {
    self.root.join(format!("{}.gltf", tile_stem(layer, coord)))
  }
}

fn tile_stem(layer: usize, coord: VoxelCoord) -> String {
  format!("tile_{layer}_{}_{}_{}", coord.x, coord.y, coord.z)
}

/// Material side-car written next to an OBJ.
pub fn material_sidecar(mesh: &Path) -> PathBuf {
  mesh.with_extension("mtl")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_artifact_names() {
    let layout = OutputLayout::new("/out/model");
    assert_eq!(layout.base_mesh(), PathBuf::from("/out/model/simple_full_mesh.obj"));
    assert_eq!(layout.layer_mesh(3), PathBuf::from("/out/model/layer_3.obj"));
    assert_eq!(layout.layer_gltf(3), PathBuf::from("/out/model/layer_3.gltf"));
  }

  #[test]
  fn test_tile_names_include_negative_coords() {
    let layout = OutputLayout::new("/out/model");
    let coord = VoxelCoord::new(1, -2, 3);
    assert_eq!(layout.tile_gltf(2, coord), PathBuf::from("/out/model/tile_2_1_-2_3.gltf"));
    assert_eq!(layout.tile_mesh(2, coord), PathBuf::from("/out/model/tile_2_1_-2_3.obj"));
  }

  #[test]
  fn test_material_sidecar() {
    assert_eq!(material_sidecar(Path::new("/o/layer_0.obj")), PathBuf::from("/o/layer_0.mtl"));
  }
}
