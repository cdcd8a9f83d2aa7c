//! Sparse surface voxelization: which cells of a uniform grid contain mesh
//! surface.
//!
//! The grid origin is the mesh's minimum corner. Cell `(x, y, z)` covers
//!
//! ```text
//! [origin + (x, y, z) * cell_size, origin + (x + 1, y + 1, z + 1) * cell_size)
//! ```
//!
//! with the last cell on each axis closed at the mesh's maximum corner.

use std::collections::HashSet;
use std::path::Path;

use glam::DVec3;
use rayon::prelude::*;

use crate::bounds::{Aabb3, CropBox};
use crate::error::{Result, TilerError};
use crate::mesh::ObjMesh;

/// Integer cell coordinate in one layer's grid - immutable value type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct VoxelCoord {
  /// Grid X position
  pub x: i32,
  /// Grid Y position
  pub y: i32,
  /// Grid Z position
  pub z: i32,
}

impl VoxelCoord {
  pub fn new(x: i32, y: i32, z: i32) -> Self {
    Self { x, y, z }
  }

  fn as_dvec3(&self) -> DVec3 {
    DVec3::new(self.x as f64, self.y as f64, self.z as f64)
  }
}

/// Occupied cells of a grid laid over one mesh.
#[derive(Clone, Debug, PartialEq)]
pub struct VoxelGrid {
  /// World-space corner of cell (0, 0, 0).
  pub origin: DVec3,
  /// Edge length of every cell.
  pub cell_size: f64,
  /// Number of cells along each axis.
  pub dims: [i32; 3],
  /// Sorted, unique occupied cells.
  cells: Vec<VoxelCoord>,
}

impl VoxelGrid {
  /// Build a grid; `cells` is sorted and de-duplicated.
  pub fn new(origin: DVec3, cell_size: f64, dims: [i32; 3], mut cells: Vec<VoxelCoord>) -> Self {
    cells.sort_unstable();
    cells.dedup();
    Self {
      origin,
      cell_size,
      dims,
      cells,
    }
  }

  pub fn cells(&self) -> &[VoxelCoord] {
    &self.cells
  }

  pub fn len(&self) -> usize {
    self.cells.len()
  }

  pub fn is_empty(&self) -> bool {
    self.cells.is_empty()
  }

  pub fn contains(&self, coord: &VoxelCoord) -> bool {
    self.cells.binary_search(coord).is_ok()
  }

  /// World-space box of a cell. Neighbours share bit-identical faces.
  pub fn cell_bounds(&self, coord: VoxelCoord) -> Aabb3 {
    let min = coord.as_dvec3();
    Aabb3::new(self.plane(min), self.plane(min + DVec3::ONE))
  }

  /// World-space position of grid plane `index` on each axis.
  fn plane(&self, index: DVec3) -> DVec3 {
    self.origin + index * self.cell_size
  }

  /// Crop box owning exactly the geometry mapped to `coord`.
  ///
  /// Max faces are open except on the grid's last row, where they close the
  /// mesh's outer boundary.
  pub fn cell_crop(&self, coord: VoxelCoord) -> CropBox {
    let last = [
      coord.x >= self.dims[0] - 1,
      coord.y >= self.dims[1] - 1,
      coord.z >= self.dims[2] - 1,
    ];
    CropBox::half_open(self.cell_bounds(coord), last)
  }

  /// Cell whose crop box keeps `point`, clamped to the grid.
  ///
  /// The floored estimate can be off by one next to a plane, so each axis is
  /// stepped until it agrees with the planes `cell_crop` tests against.
  pub fn cell_of(&self, point: DVec3) -> VoxelCoord {
    let rel = ((point - self.origin) / self.cell_size).floor();
    let p = point.to_array();
    let origin = self.origin.to_array();
    let mut index = [0i32; 3];
    for axis in 0..3 {
      let dim = self.dims[axis];
      let plane = |i: i32| origin[axis] + i as f64 * self.cell_size;
      let mut i = (rel[axis] as i32).clamp(0, dim - 1);
      while i > 0 && p[axis] < plane(i) {
        i -= 1;
      }
      while i < dim - 1 && p[axis] >= plane(i + 1) {
        i += 1;
      }
      index[axis] = i;
    }
    VoxelCoord::new(index[0], index[1], index[2])
  }
}

/// Spatial index reporting occupied surface cells of a mesh file.
pub trait VoxelIndex: Send + Sync {
  /// Occupied cells of `mesh` on a grid with cells of `cell_size`.
  fn occupied_cells(&self, mesh: &Path, cell_size: f64) -> Result<VoxelGrid>;
}

/// In-process [`VoxelIndex`] sampling each triangle on a lattice finer than
/// the cell size.
#[derive(Clone, Copy, Debug)]
pub struct SurfaceVoxelizer {
  /// Lattice samples per cell edge along a triangle edge.
  pub samples_per_cell: f64,
}

impl Default for SurfaceVoxelizer {
  fn default() -> Self {
    Self { samples_per_cell: 4.0 }
  }
}

impl SurfaceVoxelizer {
  /// Voxelize an already-loaded mesh. `None` if it has no triangles.
  pub fn voxelize(&self, mesh: &ObjMesh, cell_size: f64) -> Option<VoxelGrid> {
    if mesh.triangles.is_empty() || !(cell_size > 0.0) {
      return None;
    }
    let bounds = mesh.bounds()?;
    let size = bounds.size();
    let dims = [
      axis_cells(size.x, cell_size),
      axis_cells(size.y, cell_size),
      axis_cells(size.z, cell_size),
    ];
    let grid = VoxelGrid::new(bounds.min, cell_size, dims, Vec::new());
    let step = cell_size / self.samples_per_cell.max(1.0);

    let occupied: HashSet<VoxelCoord> = mesh
      .triangles
      .par_iter()
      .fold(HashSet::new, |mut set, tri| {
        let [a, b, c] = mesh.triangle_positions(tri);
        let longest = (b - a).length().max((c - a).length()).max((c - b).length());
        let n = ((longest / step).ceil() as usize).max(1);
        for i in 0..=n {
          for j in 0..=(n - i) {
            let u = i as f64 / n as f64;
            let v = j as f64 / n as f64;
            set.insert(grid.cell_of(a + (b - a) * u + (c - a) * v));
          }
        }
        set
      })
      .reduce(HashSet::new, |mut acc, set| {
        acc.extend(set);
        acc
      });

    Some(VoxelGrid::new(bounds.min, cell_size, dims, occupied.into_iter().collect()))
  }
}

impl VoxelIndex for SurfaceVoxelizer {
  #[tracing::instrument(skip(self, mesh), fields(mesh = %mesh.display()))]
  fn occupied_cells(&self, mesh: &Path, cell_size: f64) -> Result<VoxelGrid> {
    let loaded = ObjMesh::load(mesh)?;
    let grid = self
      .voxelize(&loaded, cell_size)
      .ok_or_else(|| TilerError::EmptyMesh(mesh.to_path_buf()))?;
    tracing::debug!(cells = grid.len(), dims = ?grid.dims, "voxelized");
    Ok(grid)
  }
}

fn axis_cells(extent: f64, cell_size: f64) -> i32 {
  ((extent / cell_size).ceil() as i32).max(1)
}

#[cfg(test)]
#[path = "voxel_test.rs"]
mod voxel_test;
