//! Mesh tile pyramid builder.
//!
//! Turns one textured OBJ into simplified whole-mesh layers plus per-layer
//! spatial tiles, all converted to glTF:
//! - layer_<i>.gltf: whole mesh at increasing detail
//! - tile_<layer>_<x>_<y>_<z>.gltf: one fragment per occupied voxel cell
//!
//! Failed jobs are logged and summarized; once the run has started the exit
//! status is always success.

mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mesh_tiler::{Collaborators, OutputLayout, Pipeline, RunReport, SurfaceVoxelizer, TilerConfig};

/// Multi-resolution tile pyramid builder for textured meshes.
#[derive(Parser, Debug)]
#[command(name = "tile_mesh")]
#[command(about = "Builds a pyramid of simplified layers and spatial tiles from an OBJ mesh")]
struct Args {
	/// Input OBJ mesh (materials and textures are resolved next to it).
	input: PathBuf,

	/// Path to configuration TOML file (default: built-in settings).
	#[arg(short, long)]
	config: Option<PathBuf>,

	/// Output directory (default: out/<model name>).
	#[arg(short, long)]
	output: Option<PathBuf>,

	/// Override the number of layers.
	#[arg(long)]
	layers: Option<usize>,

	/// Override the worker thread count.
	#[arg(long)]
	threads: Option<usize>,

	/// Regenerate every artifact even if it already exists.
	#[arg(long)]
	no_cache: bool,
}

impl Args {
	fn load_config(&self) -> Result<TilerConfig> {
		let mut config = match &self.config {
			Some(path) => TilerConfig::load(path)
				.with_context(|| format!("Failed to load config: {}", path.display()))?,
			None => TilerConfig::default(),
		};

		if let Some(layers) = self.layers {
			config.num_layers = layers;
		}
		if let Some(threads) = self.threads {
			config.num_threads = threads;
		}
		if self.no_cache {
			config.use_cached_files = false;
		}

		config.validate().context("Invalid configuration")?;
		Ok(config)
	}

	fn output_dir(&self) -> PathBuf {
		self.output
			.clone()
			.unwrap_or_else(|| default_output_dir(&self.input))
	}
}

/// `out/<model name>` relative to the working directory.
fn default_output_dir(input: &Path) -> PathBuf {
	let model = input
		.file_stem()
		.map(|s| s.to_os_string())
		.unwrap_or_else(|| "model".into());
	Path::new("out").join(model)
}

fn main() -> Result<()> {
	let args = Args::parse();
	logging::init_logging();

	let config = args.load_config()?;
	let output_dir = args.output_dir();

	println!("Input mesh: {}", args.input.display());
	println!("Output directory: {}", output_dir.display());
	println!(
		"Building {} layers on {} threads (cache {})",
		config.num_layers,
		config.num_threads,
		if config.use_cached_files { "on" } else { "off" }
	);

	let collaborators = Collaborators::from_tools(&config);
	let pipeline = Pipeline::new(
		config,
		OutputLayout::new(&output_dir),
		Arc::new(collaborators),
		Arc::new(SurfaceVoxelizer::default()),
	);

	let report = pipeline
		.run(&args.input)
		.with_context(|| format!("Failed to start run for {}", args.input.display()))?;
	print_summary(&report);

	Ok(())
}

fn print_summary(report: &RunReport) {
	println!("\nWorld size: {:.3}", report.world.world_size);
	for (stage, stage_report) in &report.stages {
		println!(
			"  {stage}: {} ok, {} failed",
			stage_report.succeeded,
			stage_report.failures.len()
		);
		for failure in &stage_report.failures {
			println!("    ✗ {}: {}", failure.label, failure.message);
		}
	}
	if !report.layers_skipped.is_empty() {
		println!("  layers without tiles: {:?}", report.layers_skipped);
	}

	println!(
		"\nDone in {:.1}s: {} tiles, {} failures",
		report.elapsed.as_secs_f64(),
		report.tiles_enumerated,
		report.failure_count()
	);
}
