//! Wavefront OBJ / MTL reading on top of `tobj`.
//!
//! Only what the orchestrator needs: vertex positions for bounds, triangles
//! for voxelization, and material/texture references for copying textures.

use std::cell::RefCell;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use glam::DVec3;

use crate::bounds::Aabb3;
use crate::error::{Result, TilerError};

/// Geometry only: polygons fan-triangulated, points and lines dropped.
fn load_options() -> tobj::LoadOptions {
  tobj::LoadOptions {
    triangulate: true,
    ignore_points: true,
    ignore_lines: true,
    ..Default::default()
  }
}

/// Geometry read from an OBJ file, all models merged.
#[derive(Clone, Debug, Default)]
pub struct ObjMesh {
  /// Vertex positions referenced by faces.
  pub positions: Vec<DVec3>,
  /// Triangles as indices into `positions`.
  pub triangles: Vec<[u32; 3]>,
}

impl ObjMesh {
  /// Read and parse an OBJ file. Material libraries are not loaded.
  pub fn load(path: &Path) -> Result<Self> {
    let file = File::open(path).map_err(|e| TilerError::io(path, e))?;
    Self::from_reader(&mut BufReader::new(file), path)
  }

  /// Parse OBJ text. `path` is only used for error messages.
  pub fn parse(content: &str, path: &Path) -> Result<Self> {
    let mut reader = content.as_bytes();
    Self::from_reader(&mut reader, path)
  }

  fn from_reader<R: BufRead>(reader: &mut R, path: &Path) -> Result<Self> {
    let (models, _) = tobj::load_obj_buf(reader, &load_options(), |_| Ok(Default::default()))
      .map_err(|e| parse_error(path, e))?;

    let mut mesh = ObjMesh::default();
    for model in models {
      let offset = mesh.positions.len() as u32;
      mesh.positions.extend(
        model
          .mesh
          .positions
          .chunks_exact(3)
          .map(|p| DVec3::new(f64::from(p[0]), f64::from(p[1]), f64::from(p[2]))),
      );
      mesh.triangles.extend(
        model
          .mesh
          .indices
          .chunks_exact(3)
          .map(|t| [t[0] + offset, t[1] + offset, t[2] + offset]),
      );
    }
    Ok(mesh)
  }

  /// Bounding box of all vertex positions.
  pub fn bounds(&self) -> Option<Aabb3> {
    Aabb3::from_points(self.positions.iter().copied())
  }

  /// Triangle corner positions.
  pub fn triangle_positions(&self, tri: &[u32; 3]) -> [DVec3; 3] {
    tri.map(|i| self.positions[i as usize])
  }
}

fn parse_error(path: &Path, err: tobj::LoadError) -> TilerError {
  TilerError::MeshParse {
    path: path.to_path_buf(),
    message: err.to_string(),
  }
}

/// Material libraries named by the OBJ's `mtllib` statements, relative to
/// the OBJ's directory.
///
/// A statement naming several files is split on whitespace unless the whole
/// name exists as one file.
pub fn material_files(obj: &Path) -> Result<Vec<PathBuf>> {
  let dir = obj.parent().unwrap_or(Path::new(""));
  let requested = RefCell::new(Vec::<PathBuf>::new());

  let file = File::open(obj).map_err(|e| TilerError::io(obj, e))?;
  tobj::load_obj_buf(&mut BufReader::new(file), &load_options(), |lib| {
    requested.borrow_mut().push(lib.to_path_buf());
    Ok(Default::default())
  })
  .map_err(|e| parse_error(obj, e))?;

  let mut libs: Vec<PathBuf> = Vec::new();
  for lib in requested.into_inner() {
    let names: Vec<PathBuf> = if dir.join(&lib).exists() {
      vec![lib]
    } else {
      lib.to_string_lossy().split_whitespace().map(PathBuf::from).collect()
    };
    for name in names {
      if !libs.contains(&name) {
        libs.push(name);
      }
    }
  }
  Ok(libs)
}

/// Texture maps referenced by an MTL file, in first-seen order without
/// duplicates. Paths are as written in the file (relative to the MTL).
pub fn texture_references(mtl_path: &Path) -> Result<Vec<PathBuf>> {
  if !mtl_path.exists() {
    return Err(TilerError::MissingArtifact(mtl_path.to_path_buf()));
  }
  let (materials, _) = tobj::load_mtl(mtl_path).map_err(|e| parse_error(mtl_path, e))?;

  let mut textures: Vec<PathBuf> = Vec::new();
  for material in &materials {
    let known = [
      &material.ambient_texture,
      &material.diffuse_texture,
      &material.specular_texture,
      &material.normal_texture,
      &material.shininess_texture,
      &material.dissolve_texture,
    ];
    let mut extra: Vec<(&String, &String)> = material
      .unknown_param
      .iter()
      .filter(|(key, _)| is_texture_key(key))
      .collect();
    extra.sort();

    let values = known
      .into_iter()
      .flatten()
      .chain(extra.into_iter().map(|(_, value)| value));
    for value in values {
      // Options such as `-bm 0.5` precede the file name, which is always last.
      let Some(name) = value.split_whitespace().last() else {
        continue;
      };
      let path = PathBuf::from(name);
      if !textures.contains(&path) {
        textures.push(path);
      }
    }
  }
  Ok(textures)
}

/// Texture statements `tobj` leaves in `unknown_param`.
fn is_texture_key(key: &str) -> bool {
  key.starts_with("map_") || matches!(key, "bump" | "disp" | "decal" | "refl")
}

#[cfg(test)]
#[path = "mesh_test.rs"]
mod mesh_test;
