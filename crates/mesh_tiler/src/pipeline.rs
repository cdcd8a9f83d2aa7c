//! Pipeline Orchestrator
//!
//! Runs bootstrap → layer build → tile enumeration → tile production on a
//! [`WorkerPool`], with a barrier between stages.
//!
//! # Usage
//!
//! ```ignore
//! let pipeline = Pipeline::new(config, layout, collaborators, index);
//! let report = pipeline.run(Path::new("in/model.obj"))?;
//!
//! // The run always completes; failed jobs only show up in the report.
//! for (stage, stage_report) in &report.stages {
//!     println!("{stage:?}: {} ok, {} failed", stage_report.succeeded, stage_report.failures.len());
//! }
//! ```
//!
//! Errors are returned only for problems found before any job is submitted:
//! invalid configuration, unwritable output root, unreadable input mesh, or
//! a pool that cannot start.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::bounds::{Aabb3, CropBox};
use crate::cache::CacheGate;
use crate::collab::{CleanParams, Collaborators, MeshScript, SimplifyParams};
use crate::config::TilerConfig;
use crate::error::{Result, TilerError};
use crate::layout::OutputLayout;
use crate::schedule::QualitySchedule;
use crate::textures::copy_textures;
use crate::threading::{JobFailure, StageReport, WorkerPool};
use crate::tiler::SpatialTiler;
use crate::voxel::VoxelIndex;
use crate::world::{load_bounds, LayerPlan, WorldState};

/// Barrier-separated phase of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
  /// Texture copy and base simplification.
  Bootstrap,
  /// One simplified mesh per layer.
  LayerBuild,
  /// Synchronous voxelization of every layer mesh.
  TileEnumeration,
  /// One cropped, converted fragment per occupied cell.
  TileProduction,
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Stage::Bootstrap => "bootstrap",
      Stage::LayerBuild => "layer build",
      Stage::TileEnumeration => "tile enumeration",
      Stage::TileProduction => "tile production",
    };
    f.write_str(name)
  }
}

/// Summary of a completed run.
#[derive(Clone, Debug)]
pub struct RunReport {
  pub world: WorldState,
  /// Stage outcomes in execution order.
  pub stages: Vec<(Stage, StageReport)>,
  pub tiles_enumerated: usize,
  /// Layers that produced no tile jobs, either because their mesh is missing
  /// or because enumeration failed.
  pub layers_skipped: Vec<usize>,
  pub elapsed: Duration,
}

impl RunReport {
  pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
    self.stages.iter().find(|(s, _)| *s == stage).map(|(_, r)| r)
  }

  /// Failed jobs and failed layer enumerations.
  pub fn failure_count(&self) -> usize {
    self.stages.iter().map(|(_, r)| r.failures.len()).sum()
  }

  pub fn is_clean(&self) -> bool {
    self.failure_count() == 0 && self.layers_skipped.is_empty()
  }
}

/// Drives one model through every stage.
pub struct Pipeline {
  config: TilerConfig,
  layout: OutputLayout,
  collaborators: Arc<Collaborators>,
  index: Arc<dyn VoxelIndex>,
}

impl Pipeline {
  pub fn new(
    config: TilerConfig,
    layout: OutputLayout,
    collaborators: Arc<Collaborators>,
    index: Arc<dyn VoxelIndex>,
  ) -> Self {
    Self {
      config,
      layout,
      collaborators,
      index,
    }
  }

  pub fn config(&self) -> &TilerConfig {
    &self.config
  }

  pub fn layout(&self) -> &OutputLayout {
    &self.layout
  }

  /// Build the full pyramid for `input`.
  #[tracing::instrument(skip(self, input), fields(input = %input.display(), out = %self.layout.root().display()))]
  pub fn run(&self, input: &Path) -> Result<RunReport> {
    let start = Instant::now();

    self.config.validate()?;
    let schedule = QualitySchedule::from_config(&self.config)?;
    let root = self.layout.root();
    fs::create_dir_all(root).map_err(|e| TilerError::io(root, e))?;
    let input_bounds = load_bounds(input)?;
    let pool = WorkerPool::new(self.config.num_threads)?;
    let cache = CacheGate::new(self.config.use_cached_files);

    tracing::info!(
      layers = self.config.num_layers,
      threads = self.config.num_threads,
      cached = cache.is_enabled(),
      "starting run"
    );

    let mut stages = Vec::with_capacity(4);

    let (world, report) = self.bootstrap(&pool, input, input_bounds, cache);
    stages.push((Stage::Bootstrap, report));

    let plans = LayerPlan::plan_all(&world, &schedule, &self.layout);
    let layer_report = self.build_layers(&pool, &world, &plans, cache);
    let enumeration = self.enumerate_tiles(&pool, &plans, &layer_report, cache);
    stages.push((Stage::LayerBuild, layer_report));
    stages.push((Stage::TileEnumeration, enumeration.report));

    let report = pool.barrier();
    tracing::info!(succeeded = report.succeeded, failed = report.failures.len(), "tile production finished");
    stages.push((Stage::TileProduction, report));

    let report = RunReport {
      world,
      stages,
      tiles_enumerated: enumeration.tiles,
      layers_skipped: enumeration.skipped,
      elapsed: start.elapsed(),
    };
    tracing::info!(
      tiles = report.tiles_enumerated,
      failures = report.failure_count(),
      elapsed = ?report.elapsed,
      "run complete"
    );
    Ok(report)
  }

  /// Copy textures and produce the base mesh in parallel, then fix the
  /// world bounds.
  #[tracing::instrument(skip_all)]
  fn bootstrap(
    &self,
    pool: &WorkerPool,
    input: &Path,
    input_bounds: Aabb3,
    cache: CacheGate,
  ) -> (WorldState, StageReport) {
    {
      let input = input.to_path_buf();
      let layout = self.layout.clone();
      pool.submit("copy textures", move || copy_textures(&input, &layout, cache).map(|_| ()));
    }

    let base = self.layout.base_mesh();
    {
      let script = MeshScript::new(input, &base)
        .clean(CleanParams::from_config(&self.config))
        .simplify(SimplifyParams::from_config(&self.config, self.config.base_retention))
        .crop_to_bounds(CropBox::inclusive(input_bounds));
      let collaborators = Arc::clone(&self.collaborators);
      pool.submit("base mesh", move || {
        if cache.should_skip(&script.output) {
          return Ok(());
        }
        collaborators.transform.apply(&script)
      });
    }

    let report = pool.barrier();
    log_stage(Stage::Bootstrap, &report);

    let world = self.resolve_world(input, &base, input_bounds);
    tracing::info!(
      working_mesh = %world.working_mesh.display(),
      world_size = world.world_size,
      "world bounds fixed"
    );
    (world, report)
  }

  /// Layers come from the base mesh when `simplify_from_base` is set and the
  /// base was produced, otherwise from the input.
  fn resolve_world(&self, input: &Path, base: &Path, input_bounds: Aabb3) -> WorldState {
    if self.config.simplify_from_base && base.exists() {
      match WorldState::from_mesh(input, base) {
        Ok(world) => return world,
        Err(err) => tracing::warn!("base mesh unusable, falling back to input: {err}"),
      }
    }
    WorldState::new(input, input, input_bounds)
  }

  #[tracing::instrument(skip_all, fields(layers = plans.len()))]
  fn build_layers(
    &self,
    pool: &WorkerPool,
    world: &WorldState,
    plans: &[LayerPlan],
    cache: CacheGate,
  ) -> StageReport {
    let clean = CleanParams::from_config(&self.config);
    for plan in plans {
      let job = LayerJob {
        plan: plan.clone(),
        source: world.working_mesh.clone(),
        world_bounds: world.bounds,
        clean,
        simplify: SimplifyParams::from_config(&self.config, plan.retention),
      };
      tracing::debug!(layer = plan.index, retention = plan.retention, cell_size = plan.cell_size, "layer planned");
      let collaborators = Arc::clone(&self.collaborators);
      pool.submit(format!("layer {}", plan.index), move || job.run(&collaborators, cache));
    }

    let report = pool.barrier();
    log_stage(Stage::LayerBuild, &report);
    report
  }

  /// Enumerate every layer and submit its tiles. No barrier between layers.
  ///
  /// A layer whose build failed in this run is skipped even if an older mesh
  /// is still on disk.
  #[tracing::instrument(skip_all)]
  fn enumerate_tiles(
    &self,
    pool: &WorkerPool,
    plans: &[LayerPlan],
    layer_report: &StageReport,
    cache: CacheGate,
  ) -> Enumeration {
    let tiler = SpatialTiler::new(self.layout.clone(), self.config.tile_buffer);
    let mut outcome = Enumeration::default();

    for plan in plans {
      let label = format!("layer {}", plan.index);
      if layer_report.failures.iter().any(|f| f.label == label) {
        tracing::warn!(layer = plan.index, "layer build failed, no tiles");
        outcome.skipped.push(plan.index);
        continue;
      }
      if !plan.mesh.exists() {
        tracing::warn!(layer = plan.index, "layer mesh missing, no tiles");
        outcome.skipped.push(plan.index);
        continue;
      }

      match tiler.enumerate(plan, self.index.as_ref()) {
        Ok(jobs) => {
          outcome.report.succeeded += 1;
          outcome.tiles += jobs.len();
          for job in jobs {
            let collaborators = Arc::clone(&self.collaborators);
            pool.submit(job.label(), move || job.run(&collaborators, cache));
          }
        }
        Err(err) => {
          tracing::error!(layer = plan.index, "tile enumeration failed: {err}");
          outcome.skipped.push(plan.index);
          outcome.report.failures.push(JobFailure {
            label,
            message: err.to_string(),
          });
        }
      }
    }

    outcome
  }
}

#[derive(Default)]
struct Enumeration {
  report: StageReport,
  tiles: usize,
  skipped: Vec<usize>,
}

/// Snapshot of everything one layer job needs.
struct LayerJob {
  plan: LayerPlan,
  source: PathBuf,
  world_bounds: Aabb3,
  clean: CleanParams,
  simplify: SimplifyParams,
}

impl LayerJob {
  fn run(&self, collaborators: &Collaborators, cache: CacheGate) -> Result<()> {
    if !cache.should_skip(&self.plan.mesh) {
      let script = MeshScript::new(&self.source, &self.plan.mesh)
        .clean(self.clean)
        .simplify(self.simplify)
        .crop_to_bounds(CropBox::inclusive(self.world_bounds))
        .clean(self.clean);
      collaborators.transform.apply(&script)?;
    }

    if !cache.should_skip(&self.plan.gltf) {
      collaborators.converter.convert(&self.plan.mesh, &self.plan.gltf)?;
    }
    Ok(())
  }
}

fn log_stage(stage: Stage, report: &StageReport) {
  if report.is_clean() {
    tracing::info!(jobs = report.succeeded, "{stage} finished");
  } else {
    tracing::warn!(
      succeeded = report.succeeded,
      failed = report.failures.len(),
      "{stage} finished with failures"
    );
  }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod pipeline_test;
