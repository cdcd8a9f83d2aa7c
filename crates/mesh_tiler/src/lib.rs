//! mesh_tiler - multi-resolution tile pyramid builder for textured meshes
//!
//! Turns one large textured surface mesh into a pyramid of small mesh
//! fragments for streamed visualization. Low layers are whole-mesh
//! simplifications, high layers are finer spatial tilings of those
//! simplifications.
//!
//! ```text
//! ┌───────────┐     ┌─────────────┐     ┌──────────────────┐     ┌─────────────────┐
//! │ Bootstrap ├────►│ Layer build ├────►│ Tile enumeration ├────►│ Tile production │
//! └───────────┘     └─────────────┘     └──────────────────┘     └─────────────────┘
//!       │                  │                     │                        │
//!   WorldState        layer_<i>.obj          TileJob[]            tile_<l>_<x>_<y>_<z>.gltf
//! ```
//!
//! Every arrow is a barrier on the [`WorkerPool`]: no job of a stage starts
//! before all jobs of the previous stage have finished, successfully or not.
//!
//! Mesh decimation and format conversion are delegated to external tools
//! behind the [`MeshTransform`] and [`FormatConverter`] traits.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use mesh_tiler::{Collaborators, OutputLayout, Pipeline, SurfaceVoxelizer, TilerConfig};
//!
//! let config = TilerConfig::default();
//! let collaborators = Collaborators::from_tools(&config);
//! let pipeline = Pipeline::new(
//!     config,
//!     OutputLayout::new("out/model"),
//!     Arc::new(collaborators),
//!     Arc::new(SurfaceVoxelizer::default()),
//! );
//! let report = pipeline.run("data/in/model.obj".as_ref())?;
//! println!("{} failed jobs", report.failure_count());
//! ```

pub mod bounds;
pub mod cache;
pub mod collab;
pub mod config;
pub mod error;
pub mod layout;
pub mod mesh;
pub mod pipeline;
pub mod schedule;
pub mod textures;
pub mod threading;
pub mod tiler;
pub mod voxel;
pub mod world;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export commonly used items
pub use bounds::{Aabb3, CropBox};
pub use cache::CacheGate;
pub use collab::{
  CleanParams, Collaborators, FormatConverter, MeshLabServer, MeshOp, MeshScript, MeshTransform,
  Obj2Gltf, SimplifyParams,
};
pub use config::{ConfigError, TilerConfig, ToolsConfig};
pub use error::TilerError;
pub use layout::OutputLayout;
pub use pipeline::{Pipeline, RunReport, Stage};
pub use schedule::{retention, QualitySchedule};
pub use threading::{JobFailure, StageReport, WorkerPool};
pub use tiler::{SpatialTiler, Tile, TileJob};
pub use voxel::{SurfaceVoxelizer, VoxelCoord, VoxelGrid, VoxelIndex};
pub use world::{LayerPlan, WorldState};
