//! Spatial tiling of a layer mesh into one fragment per occupied voxel cell.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::bounds::{Aabb3, CropBox};
use crate::cache::CacheGate;
use crate::collab::{Collaborators, MeshScript};
use crate::error::{Result, TilerError};
use crate::layout::{material_sidecar, OutputLayout};
use crate::voxel::{VoxelCoord, VoxelIndex};
use crate::world::LayerPlan;

/// A non-empty cell of one layer's grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tile {
  pub layer: usize,
  pub coord: VoxelCoord,
}

/// Everything needed to produce one tile, fixed at enumeration.
#[derive(Clone, Debug, PartialEq)]
pub struct TileJob {
  pub tile: Tile,
  /// Layer mesh the tile is cut from.
  pub layer_mesh: PathBuf,
  /// Cell bounds grown by the tile buffer, crops inclusively.
  pub padded: CropBox,
  /// Same box with the cell's tie rules, so shared faces go to one tile.
  pub owned: CropBox,
  /// Intermediate cropped mesh.
  pub mesh_out: PathBuf,
  pub gltf_out: PathBuf,
}

impl TileJob {
  /// Crop, convert, and remove the intermediate mesh.
  pub fn run(&self, collaborators: &Collaborators, cache: CacheGate) -> Result<()> {
    if cache.should_skip(&self.gltf_out) {
      return Ok(());
    }

    let script = MeshScript::new(&self.layer_mesh, &self.mesh_out)
      .crop_to_bounds(self.padded)
      .crop_to_bounds(self.owned);
    collaborators.transform.apply(&script)?;
    collaborators.converter.convert(&self.mesh_out, &self.gltf_out)?;

    remove_if_present(&self.mesh_out)?;
    remove_if_present(&material_sidecar(&self.mesh_out))?;
    tracing::debug!(tile = %self.gltf_out.display(), "tile written");
    Ok(())
  }

  /// Label used in pool reports.
  pub fn label(&self) -> String {
    let VoxelCoord { x, y, z } = self.tile.coord;
    format!("tile {} ({x}, {y}, {z})", self.tile.layer)
  }
}

fn remove_if_present(path: &Path) -> Result<()> {
  match fs::remove_file(path) {
    Ok(()) => Ok(()),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
    Err(e) => Err(TilerError::io(path, e)),
  }
}

/// Turns a layer's occupied cells into tile jobs.
#[derive(Clone, Debug)]
pub struct SpatialTiler {
  layout: OutputLayout,
  /// World units added around every cell.
  buffer: f64,
}

impl SpatialTiler {
  pub fn new(layout: OutputLayout, buffer: f64) -> Self {
    Self { layout, buffer }
  }

  /// One job per occupied cell of `layer`'s mesh at the layer's cell size.
  #[tracing::instrument(skip_all, fields(layer = layer.index, cell_size = layer.cell_size))]
  pub fn enumerate(&self, layer: &LayerPlan, index: &dyn VoxelIndex) -> Result<Vec<TileJob>> {
    let grid = index.occupied_cells(&layer.mesh, layer.cell_size)?;

    let jobs: Vec<TileJob> = grid
      .cells()
      .iter()
      .map(|&coord| {
        let cell = grid.cell_crop(coord);
        let padded: Aabb3 = cell.bounds.expanded(self.buffer);
        TileJob {
          tile: Tile {
            layer: layer.index,
            coord,
          },
          layer_mesh: layer.mesh.clone(),
          padded: CropBox::inclusive(padded),
          owned: CropBox::half_open(padded, cell.closed_max),
          mesh_out: self.layout.tile_mesh(layer.index, coord),
          gltf_out: self.layout.tile_gltf(layer.index, coord),
        }
      })
      .collect();

    tracing::info!(tiles = jobs.len(), "tiles enumerated");
    Ok(jobs)
  }
}

#[cfg(test)]
#[path = "tiler_test.rs"]
mod tiler_test;
