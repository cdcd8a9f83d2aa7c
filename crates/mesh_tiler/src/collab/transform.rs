//! Mesh transform collaborator: clean, simplify and crop, batched into one
//! script per artifact.
//!
//! Batching means one read and one write of the mesh per job instead of one
//! per operation.

use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use std::process::Command;

use super::run_tool;
use crate::bounds::CropBox;
use crate::config::TilerConfig;
use crate::error::{Result, TilerError};

/// Repair pass parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CleanParams {
  /// Largest hole, in boundary edges, that gets closed.
  pub max_hole_size: u32,
}

/// Quadric edge collapse decimation parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimplifyParams {
  /// Fraction of faces to keep, in (0, 1].
  pub target_retention: f64,
  /// Triangles with shape quality below this are penalized proportionally.
  pub quality_threshold: f64,
  /// Boundary preservation weight.
  pub edge_weight: f64,
  /// Texture coordinate preservation weight.
  pub texture_weight: f64,
}

impl CleanParams {
  pub fn from_config(config: &TilerConfig) -> Self {
    Self {
      max_hole_size: config.max_hole_size,
    }
  }
}

impl SimplifyParams {
  pub fn from_config(config: &TilerConfig, target_retention: f64) -> Self {
    Self {
      target_retention,
      quality_threshold: config.mesh_quality_threshold,
      edge_weight: config.edge_weight,
      texture_weight: config.texture_weight,
    }
  }
}

/// One operation of a [`MeshScript`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MeshOp {
  /// Manifold repair, duplicate/unreferenced removal, hole closing,
  /// coherent normal orientation.
  Clean(CleanParams),
  /// Topology and boundary preserving decimation.
  Simplify(SimplifyParams),
  /// Delete vertices outside the box, then their orphaned faces.
  Crop(CropBox),
}

/// Operations applied to `input`, result written to `output`.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshScript {
  pub input: PathBuf,
  pub output: PathBuf,
  pub ops: Vec<MeshOp>,
}

impl MeshScript {
  pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
    Self {
      input: input.into(),
      output: output.into(),
      ops: Vec::new(),
    }
  }

  pub fn clean(mut self, params: CleanParams) -> Self {
    self.ops.push(MeshOp::Clean(params));
    self
  }

  pub fn simplify(mut self, params: SimplifyParams) -> Self {
    self.ops.push(MeshOp::Simplify(params));
    self
  }

  pub fn crop_to_bounds(mut self, crop: CropBox) -> Self {
    self.ops.push(MeshOp::Crop(crop));
    self
  }

  /// Render as a MeshLab `.mlx` filter script.
  pub fn to_mlx(&self) -> String {
    let mut out = String::from("<!DOCTYPE FilterScript>\n<FilterScript>\n");
    for op in &self.ops {
      match op {
        MeshOp::Clean(params) => write_clean(&mut out, params),
        MeshOp::Simplify(params) => write_simplify(&mut out, params),
        MeshOp::Crop(crop) => write_crop(&mut out, crop),
      }
    }
    out.push_str("</FilterScript>\n");
    out
  }
}

/// Applies a [`MeshScript`] in a single collaborator call.
pub trait MeshTransform: Send + Sync {
  fn apply(&self, script: &MeshScript) -> Result<()>;
}

/// [`MeshTransform`] backed by MeshLab's headless `meshlabserver`.
#[derive(Clone, Debug)]
pub struct MeshLabServer {
  executable: PathBuf,
}

impl MeshLabServer {
  pub fn new(executable: impl Into<PathBuf>) -> Self {
    Self {
      executable: executable.into(),
    }
  }
}

impl MeshTransform for MeshLabServer {
  fn apply(&self, script: &MeshScript) -> Result<()> {
    if !script.input.exists() {
      return Err(TilerError::MissingArtifact(script.input.clone()));
    }

    let script_path = script.output.with_extension("mlx");
    fs::write(&script_path, script.to_mlx()).map_err(|e| TilerError::io(&script_path, e))?;

    let mut command = Command::new(&self.executable);
    command
      .arg("-i")
      .arg(&script.input)
      .arg("-o")
      .arg(&script.output)
      .args(["-m", "wt"])
      .arg("-s")
      .arg(&script_path);
    let result = run_tool(command);

    let _ = fs::remove_file(&script_path);
    result
  }
}

fn write_filter(out: &mut String, name: &str, params: &[(&str, &str, String)]) {
  if params.is_empty() {
    let _ = writeln!(out, " <filter name=\"{}\"/>", escape_xml(name));
    return;
  }
  let _ = writeln!(out, " <filter name=\"{}\">", escape_xml(name));
  for (kind, param, value) in params {
    let _ = writeln!(
      out,
      "  <Param type=\"{kind}\" value=\"{}\" name=\"{param}\"/>",
      escape_xml(value)
    );
  }
  out.push_str(" </filter>\n");
}

fn rich_bool(value: bool) -> String {
  value.to_string()
}

fn write_clean(out: &mut String, params: &CleanParams) {
  write_filter(out, "Remove Duplicate Vertices", &[]);
  write_filter(out, "Remove Duplicate Faces", &[]);
  write_filter(out, "Remove Unreferenced Vertices", &[]);
  write_filter(
    out,
    "Repair non Manifold Edges",
    &[("RichEnum", "method", "0".into())],
  );
  write_filter(
    out,
    "Repair non Manifold Vertices by splitting",
    &[("RichFloat", "VertDispRatio", "0".into())],
  );
  write_filter(
    out,
    "Close Holes",
    &[
      ("RichInt", "MaxHoleSize", params.max_hole_size.to_string()),
      ("RichBool", "Selected", rich_bool(false)),
      ("RichBool", "NewFaceSelected", rich_bool(false)),
      ("RichBool", "SelfIntersection", rich_bool(true)),
    ],
  );
  write_filter(out, "Re-Orient all faces coherentely", &[]);
}

fn write_simplify(out: &mut String, params: &SimplifyParams) {
  write_filter(
    out,
    "Simplification: Quadric Edge Collapse Decimation (with texture)",
    &[
      ("RichInt", "TargetFaceNum", "0".into()),
      ("RichFloat", "TargetPerc", params.target_retention.to_string()),
      ("RichFloat", "QualityThr", params.quality_threshold.to_string()),
      ("RichFloat", "Extratcoordw", params.texture_weight.to_string()),
      ("RichBool", "PreserveBoundary", rich_bool(true)),
      ("RichFloat", "BoundaryWeight", params.edge_weight.to_string()),
      ("RichBool", "OptimalPlacement", rich_bool(true)),
      ("RichBool", "PreserveNormal", rich_bool(false)),
      ("RichBool", "PlanarQuadric", rich_bool(true)),
      ("RichBool", "PreserveTopology", rich_bool(true)),
      ("RichBool", "Selected", rich_bool(false)),
    ],
  );
}

fn write_crop(out: &mut String, crop: &CropBox) {
  write_filter(
    out,
    "Conditional Vertex Selection",
    &[("RichString", "condSelect", crop.outside_expression())],
  );
  // Also removes every face touching a deleted vertex.
  write_filter(out, "Delete Selected Vertices", &[]);
}

fn escape_xml(value: &str) -> String {
  value
    .replace('&', "&amp;")
    .replace('<', "&lt;")
    .replace('>', "&gt;")
    .replace('"', "&quot;")
}

#[cfg(test)]
#[path = "transform_test.rs"]
mod transform_test;
