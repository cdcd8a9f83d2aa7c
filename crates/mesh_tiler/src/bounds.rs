//! Axis-aligned bounding boxes in double precision, plus crop boxes with
//! explicit tie rules for tile boundaries.

use glam::DVec3;

/// Double-precision axis-aligned bounding box.
///
/// Used for world bounds, voxel cell bounds, and tile crop regions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb3 {
	/// Minimum corner (inclusive).
	pub min: DVec3,
	/// Maximum corner (inclusive).
	pub max: DVec3,
}

impl Aabb3 {
	/// Create a new AABB from min and max corners.
	///
	/// # Panics
	/// Debug-asserts that min <= max on all axes.
	pub fn new(min: DVec3, max: DVec3) -> Self {
		debug_assert!(
			min.x <= max.x && min.y <= max.y && min.z <= max.z,
			"AABB min must be <= max on all axes"
		);
		Self { min, max }
	}

	/// Smallest box containing every point, or `None` for an empty iterator.
	pub fn from_points<I: IntoIterator<Item = DVec3>>(points: I) -> Option<Self> {
		let mut iter = points.into_iter();
		let first = iter.next()?;
		let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
		Some(Self { min, max })
	}

	/// Cube of edge `size` starting at `min`.
	pub fn from_min_size(min: DVec3, size: f64) -> Self {
		Self {
			min,
			max: min + DVec3::splat(size),
		}
	}

	/// Grow the box by `amount` on every side.
	#[inline]
	pub fn expanded(&self, amount: f64) -> Self {
		Self {
			min: self.min - DVec3::splat(amount),
			max: self.max + DVec3::splat(amount),
		}
	}

	/// Check if this AABB contains a point (boundary included).
	#[inline]
	pub fn contains_point(&self, point: DVec3) -> bool {
		point.x >= self.min.x
			&& point.x <= self.max.x
			&& point.y >= self.min.y
			&& point.y <= self.max.y
			&& point.z >= self.min.z
			&& point.z <= self.max.z
	}

	/// Check if `other` lies entirely inside this box.
	#[inline]
	pub fn contains_aabb(&self, other: &Aabb3) -> bool {
		self.contains_point(other.min) && self.contains_point(other.max)
	}

	/// Smallest box containing both.
	pub fn union(&self, other: &Aabb3) -> Self {
		Self {
			min: self.min.min(other.min),
			max: self.max.max(other.max),
		}
	}

	/// Get the size of the AABB (max - min).
	#[inline]
	pub fn size(&self) -> DVec3 {
		self.max - self.min
	}

	/// Largest edge length.
	#[inline]
	pub fn max_extent(&self) -> f64 {
		self.size().max_element()
	}
}

/// Region used to delete vertices from a mesh.
///
/// The min faces are always closed. A max face is closed only where
/// `closed_max` is set; on an open face a vertex lying exactly on the plane
/// is treated as outside, so geometry on a face shared by two neighbouring
/// cells is kept by the upper cell only.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CropBox {
	pub bounds: Aabb3,
	pub closed_max: [bool; 3],
}

impl CropBox {
	/// Crop box keeping everything on or inside the boundary.
	pub fn inclusive(bounds: Aabb3) -> Self {
		Self {
			bounds,
			closed_max: [true; 3],
		}
	}

	/// Crop box with open max faces except where `closed_max` is set.
	pub fn half_open(bounds: Aabb3, closed_max: [bool; 3]) -> Self {
		Self { bounds, closed_max }
	}

	/// Whether a vertex at `point` survives the crop.
	pub fn keeps(&self, point: DVec3) -> bool {
		let p = point.to_array();
		let min = self.bounds.min.to_array();
		let max = self.bounds.max.to_array();
		(0..3).all(|axis| {
			let below_max = if self.closed_max[axis] {
				p[axis] <= max[axis]
			} else {
				p[axis] < max[axis]
			};
			p[axis] >= min[axis] && below_max
		})
	}

	/// Selection expression (muparser syntax) matching vertices to delete.
	///
	/// `x`, `y` and `z` are the vertex coordinates.
	pub fn outside_expression(&self) -> String {
		let axes = ["x", "y", "z"];
		let min = self.bounds.min.to_array();
		let max = self.bounds.max.to_array();
		let terms: Vec<String> = (0..3)
			.flat_map(|axis| {
				let name = axes[axis];
				let max_op = if self.closed_max[axis] { ">" } else { ">=" };
				[
					format!("({name} < {})", min[axis]),
					format!("({name} {max_op} {})", max[axis]),
				]
			})
			.collect();
		terms.join(" || ")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_new() {
		let aabb = Aabb3::new(DVec3::new(-1.0, -2.0, -3.0), DVec3::new(1.0, 2.0, 3.0));
		assert_eq!(aabb.min, DVec3::new(-1.0, -2.0, -3.0));
		assert_eq!(aabb.max, DVec3::new(1.0, 2.0, 3.0));
	}

	#[test]
	fn test_from_points() {
		let aabb = Aabb3::from_points([
			DVec3::new(1.0, 5.0, -2.0),
			DVec3::new(-3.0, 0.0, 4.0),
			DVec3::new(0.0, 2.0, 0.0),
		])
		.unwrap();
		assert_eq!(aabb.min, DVec3::new(-3.0, 0.0, -2.0));
		assert_eq!(aabb.max, DVec3::new(1.0, 5.0, 4.0));
		assert!(Aabb3::from_points(std::iter::empty()).is_none());
	}

	#[test]
	fn test_max_extent() {
		let aabb = Aabb3::new(DVec3::ZERO, DVec3::new(100.0, 20.0, 40.0));
		assert_eq!(aabb.max_extent(), 100.0);
	}

	#[test]
	fn test_expanded() {
		let aabb = Aabb3::from_min_size(DVec3::ZERO, 2.0).expanded(0.5);
		assert_eq!(aabb.min, DVec3::splat(-0.5));
		assert_eq!(aabb.max, DVec3::splat(2.5));
	}

	#[test]
	fn test_contains_aabb_and_union() {
		let a = Aabb3::from_min_size(DVec3::ZERO, 1.0);
		let b = Aabb3::from_min_size(DVec3::splat(1.0), 1.0);
		let both = a.union(&b);
		assert!(both.contains_aabb(&a));
		assert!(both.contains_aabb(&b));
		assert!(!a.contains_aabb(&both));
	}

	#[test]
	fn test_half_open_ties_belong_to_upper_cell() {
		let lower = CropBox::half_open(Aabb3::from_min_size(DVec3::ZERO, 1.0), [false; 3]);
		let upper = CropBox::half_open(Aabb3::from_min_size(DVec3::new(1.0, 0.0, 0.0), 1.0), [false; 3]);
		let on_face = DVec3::new(1.0, 0.5, 0.5);

		assert!(!lower.keeps(on_face));
		assert!(upper.keeps(on_face));
	}

	#[test]
	fn test_closed_max_keeps_outer_boundary() {
		let crop = CropBox::half_open(Aabb3::from_min_size(DVec3::ZERO, 1.0), [true, false, false]);
		assert!(crop.keeps(DVec3::new(1.0, 0.5, 0.5)));
		assert!(!crop.keeps(DVec3::new(0.5, 1.0, 0.5)));
	}

	#[test]
	fn test_outside_expression() {
		let crop = CropBox::half_open(Aabb3::new(DVec3::ZERO, DVec3::new(1.0, 2.0, 3.0)), [false, true, false]);
		assert_eq!(
			crop.outside_expression(),
			"(x < 0) || (x >= 1) || (y < 0) || (y > 2) || (z < 0) || (z >= 3)"
		);
		let inclusive = CropBox::inclusive(Aabb3::from_min_size(DVec3::ZERO, 0.5));
		assert!(inclusive.outside_expression().contains("(x > 0.5)"));
	}
}
