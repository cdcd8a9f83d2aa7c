//! WorldState - immutable world bounds shared by every layer - and the
//! per-layer plans derived from it.
//!
//! # Pitch Convention
//!
//! Layer 0 = coarsest. Each layer halves the cell size of the previous one:
//!
//! ```text
//! cell_size(i) = world_size / 2^(i + 1)
//! ```

use std::path::{Path, PathBuf};

use crate::bounds::Aabb3;
use crate::error::{Result, TilerError};
use crate::layout::OutputLayout;
use crate::mesh::ObjMesh;
use crate::schedule::QualitySchedule;

/// Voxel cell size of `layer` for a world of `world_size`.
#[inline]
pub fn voxel_pitch(world_size: f64, layer: usize) -> f64 {
  world_size / 2f64.powi(layer as i32 + 1)
}

/// Bounds of the mesh every layer is simplified from.
///
/// Produced once by the bootstrap stage and never mutated afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldState {
  /// Mesh given on input.
  pub source_mesh: PathBuf,
  /// Mesh layers are built from (the input or its base simplification).
  pub working_mesh: PathBuf,
  /// Axis-aligned bounds of the working mesh.
  pub bounds: Aabb3,
  /// Largest extent of `bounds`.
  pub world_size: f64,
}

impl WorldState {
  pub fn new(source_mesh: impl Into<PathBuf>, working_mesh: impl Into<PathBuf>, bounds: Aabb3) -> Self {
    Self {
      source_mesh: source_mesh.into(),
      working_mesh: working_mesh.into(),
      world_size: bounds.max_extent(),
      bounds,
    }
  }

  /// Load `working_mesh` and derive bounds from its vertices.
  pub fn from_mesh(source_mesh: &Path, working_mesh: &Path) -> Result<Self> {
    let bounds = load_bounds(working_mesh)?;
    Ok(Self::new(source_mesh, working_mesh, bounds))
  }

  /// Cell size of `layer`.
  pub fn cell_size(&self, layer: usize) -> f64 {
    voxel_pitch(self.world_size, layer)
  }
}

/// Bounds of a mesh file; errors if it has no extent.
pub fn load_bounds(mesh: &Path) -> Result<Aabb3> {
  let bounds = ObjMesh::load(mesh)?
    .bounds()
    .ok_or_else(|| TilerError::EmptyMesh(mesh.to_path_buf()))?;
  if !(bounds.max_extent() > 0.0) {
    return Err(TilerError::EmptyMesh(mesh.to_path_buf()));
  }
  Ok(bounds)
}

/// Everything a layer job needs, snapshotted at submission time.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerPlan {
  pub index: usize,
  /// Fraction of geometry kept by decimation.
  pub retention: f64,
  /// Voxel cell size used to tile this layer.
  pub cell_size: f64,
  /// Simplified layer mesh (`layer_<i>.obj`).
  pub mesh: PathBuf,
  /// Converted layer mesh (`layer_<i>.gltf`).
  pub gltf: PathBuf,
}

impl LayerPlan {
  /// Plans for every layer, coarsest first.
  pub fn plan_all(world: &WorldState, schedule: &QualitySchedule, layout: &OutputLayout) -> Vec<LayerPlan> {
    schedule
      .iter()
      .map(|(index, retention)| LayerPlan {
        index,
        retention,
        cell_size: world.cell_size(index),
        mesh: layout.layer_mesh(index),
        gltf: layout.layer_gltf(index),
      })
      .collect()
  }
}

#[cfg(test)]
#[path = "world_test.rs"]
mod world_test;
