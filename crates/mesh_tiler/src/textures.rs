//! Copying the input's texture images into the output directory.
//!
//! Textures keep their path relative to the material file, so the material
//! side-cars written next to every produced mesh resolve them unchanged.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::cache::CacheGate;
use crate::error::{Result, TilerError};
use crate::layout::OutputLayout;
use crate::mesh::{material_files, texture_references};

/// Copy every texture referenced by the input's materials.
///
/// Returns the number of files copied. Cached textures are skipped. A missing
/// texture does not stop the others from being copied; the first error is
/// returned afterwards.
#[tracing::instrument(skip(layout, cache), fields(input = %input_obj.display()))]
pub fn copy_textures(input_obj: &Path, layout: &OutputLayout, cache: CacheGate) -> Result<usize> {
  let input_dir = input_obj.parent().unwrap_or(Path::new(""));
  let mut copied = 0;
  let mut first_error = None;

  for lib in material_files(input_obj)? {
    let mtl = input_dir.join(&lib);
    let mtl_dir = mtl.parent().unwrap_or(input_dir).to_path_buf();

    let textures = match texture_references(&mtl) {
      Ok(textures) => textures,
      Err(err) => {
        tracing::warn!(material = %mtl.display(), "material library unreadable: {err}");
        first_error.get_or_insert(err);
        continue;
      }
    };
    for texture in textures {
      let src = mtl_dir.join(&texture);
      let dst = layout.texture(&output_relative(&texture));
      if cache.should_skip(&dst) {
        continue;
      }
      match copy_file(&src, &dst) {
        Ok(()) => copied += 1,
        Err(err) => {
          tracing::warn!(texture = %src.display(), "texture copy failed: {err}");
          first_error.get_or_insert(err);
        }
      }
    }
  }

  tracing::info!(copied, "textures copied");
  match first_error {
    Some(err) => Err(err),
    None => Ok(copied),
  }
}

/// Keep a relative reference as-is; anything escaping the output root is
/// flattened to its file name.
fn output_relative(texture: &Path) -> PathBuf {
  let escapes = texture
    .components()
    .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
  if escapes {
    texture.file_name().map(PathBuf::from).unwrap_or_else(|| texture.to_path_buf())
  } else {
    texture.to_path_buf()
  }
}

fn copy_file(src: &Path, dst: &Path) -> Result<()> {
  if !src.exists() {
    return Err(TilerError::MissingArtifact(src.to_path_buf()));
  }
  if let Some(parent) = dst.parent() {
    fs::create_dir_all(parent).map_err(|e| TilerError::io(parent, e))?;
  }
  fs::copy(src, dst).map_err(|e| TilerError::io(dst, e))?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::write_textured_cube;

  #[test]
  fn test_copies_relative_textures() {
    let input = tempfile::TempDir::new().unwrap();
    let output = tempfile::TempDir::new().unwrap();
    let obj = write_textured_cube(input.path());
    let layout = OutputLayout::new(output.path());

    let copied = copy_textures(&obj, &layout, CacheGate::default()).unwrap();
    assert_eq!(copied, 1);
    assert_eq!(
      fs::read(output.path().join("textures/cube.png")).unwrap(),
      fs::read(input.path().join("textures/cube.png")).unwrap()
    );
  }

  #[test]
  fn test_cached_texture_not_copied_again() {
    let input = tempfile::TempDir::new().unwrap();
    let output = tempfile::TempDir::new().unwrap();
    let obj = write_textured_cube(input.path());
    let layout = OutputLayout::new(output.path());

    assert_eq!(copy_textures(&obj, &layout, CacheGate::default()).unwrap(), 1);
    assert_eq!(copy_textures(&obj, &layout, CacheGate::default()).unwrap(), 0);
    assert_eq!(copy_textures(&obj, &layout, CacheGate::disabled()).unwrap(), 1);
  }

  #[test]
  fn test_missing_texture_reported_after_others() {
    let input = tempfile::TempDir::new().unwrap();
    let output = tempfile::TempDir::new().unwrap();
    let obj = input.path().join("m.obj");
    fs::write(&obj, "mtllib m.mtl\n").unwrap();
    fs::write(input.path().join("m.mtl"), "newmtl a\nmap_Kd gone.png\nmap_Ks here.png\n").unwrap();
    fs::write(input.path().join("here.png"), b"png").unwrap();

    let err = copy_textures(&obj, &OutputLayout::new(output.path()), CacheGate::default()).unwrap_err();
    assert!(matches!(err, TilerError::MissingArtifact(_)));
    assert!(output.path().join("here.png").exists());
  }

  #[test]
  fn test_escaping_reference_flattened() {
    assert_eq!(output_relative(Path::new("../shared/wall.jpg")), PathBuf::from("wall.jpg"));
    assert_eq!(output_relative(Path::new("/abs/wall.jpg")), PathBuf::from("wall.jpg"));
    assert_eq!(output_relative(Path::new("tex/wall.jpg")), PathBuf::from("tex/wall.jpg"));
  }

  /// Every library of a multi-file `mtllib` statement is read.
  #[test]
  fn test_several_libraries_in_one_statement() {
    let input = tempfile::TempDir::new().unwrap();
    let output = tempfile::TempDir::new().unwrap();
    let obj = input.path().join("m.obj");
    fs::write(&obj, "mtllib a.mtl b.mtl\n").unwrap();
    fs::write(input.path().join("a.mtl"), "newmtl a\nmap_Kd a.png\n").unwrap();
    fs::write(input.path().join("b.mtl"), "newmtl b\nmap_Kd b.png\n").unwrap();
    fs::write(input.path().join("a.png"), b"a").unwrap();
    fs::write(input.path().join("b.png"), b"b").unwrap();

    let copied = copy_textures(&obj, &OutputLayout::new(output.path()), CacheGate::default()).unwrap();
    assert_eq!(copied, 2);
    assert!(output.path().join("a.png").exists());
    assert!(output.path().join("b.png").exists());
  }

  /// A missing library is reported but the others are still copied.
  #[test]
  fn test_missing_library_does_not_stop_others() {
    let input = tempfile::TempDir::new().unwrap();
    let output = tempfile::TempDir::new().unwrap();
    let obj = input.path().join("m.obj");
    fs::write(&obj, "mtllib gone.mtl\nmtllib here.mtl\n").unwrap();
    fs::write(input.path().join("here.mtl"), "newmtl a\nmap_Kd a.png\n").unwrap();
    fs::write(input.path().join("a.png"), b"a").unwrap();

    let err = copy_textures(&obj, &OutputLayout::new(output.path()), CacheGate::default()).unwrap_err();
    assert!(matches!(err, TilerError::MissingArtifact(_)));
    assert!(output.path().join("a.png").exists());
  }

  #[test]
  fn test_no_materials() {
    let input = tempfile::TempDir::new().unwrap();
    let output = tempfile::TempDir::new().unwrap();
    let obj = input.path().join("plain.obj");
    fs::write(&obj, "v 0 0 0\n").unwrap();

    assert_eq!(copy_textures(&obj, &OutputLayout::new(output.path()), CacheGate::default()).unwrap(), 0);
  }
}
