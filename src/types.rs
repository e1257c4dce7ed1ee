//! Common types and traits for 3D geometry.
//!
//! All lengths are inches. The axis convention follows the renderer that
//! consumes the layouts: X runs along the container length, Y is vertical and
//! Z runs along the container width (front to back).

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Global numerical tolerance for floating-point comparisons.
pub const EPSILON_GENERAL: f64 = 1e-6;

/// A 3D vector or point in space.
///
/// # Examples
/// ```
/// use storage_fit::types::Vec3;
///
/// let position = Vec3::new(1.0, 2.0, 3.0);
/// let extent = Vec3::new(10.0, 20.0, 30.0);
/// let center = position + extent * 0.5;
/// assert_eq!(center, Vec3::new(6.0, 12.0, 18.0));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct Vec3 {
    /// Along the container length
    pub x: f64,
    /// Vertical
    pub y: f64,
    /// Along the container width
    pub z: f64,
}

impl Vec3 {
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The origin.
    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Checks if the vector fits within another vector (component-wise <=).
    ///
    /// # Parameters
    /// * `outer` - The outer vector (e.g., container extent)
    /// * `tolerance` - Numerical tolerance for the comparison
    #[inline]
    pub fn fits_within(&self, outer: &Self, tolerance: f64) -> bool {
        self.x <= outer.x + tolerance && self.y <= outer.y + tolerance && self.z <= outer.z + tolerance
    }
}

impl Add for Vec3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

/// Size of a box as entered by the customer.
///
/// `width` runs along X, `depth` along Z and `height` along Y. Items are never
/// rotated, so these stay bound to their axes for the whole computation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Dimensions {
    pub width: f64,
    pub depth: f64,
    pub height: f64,
}

impl Dimensions {
    #[inline]
    pub const fn new(width: f64, depth: f64, height: f64) -> Self {
        Self {
            width,
            depth,
            height,
        }
    }

    /// Volume in cubic inches.
    #[inline]
    pub fn volume(&self) -> f64 {
        self.width * self.depth * self.height
    }

    /// The dimensions as an extent vector in the X/Y/Z convention.
    #[inline]
    pub fn as_extent(&self) -> Vec3 {
        Vec3::new(self.width, self.height, self.depth)
    }
}

/// Trait for objects with 3D dimensions.
pub trait Dimensional {
    /// Returns the dimensions of the object.
    fn dimensions(&self) -> Dimensions;

    /// Volume in cubic inches.
    fn volume(&self) -> f64 {
        self.dimensions().volume()
    }
}

/// Trait for objects with a position in 3D space.
pub trait Positioned {
    /// Returns the minimum corner.
    fn position(&self) -> Vec3;
}

/// An Axis-Aligned Bounding Box (AABB).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner (position)
    pub min: Vec3,
    /// Maximum corner (position + extent)
    pub max: Vec3,
}

impl BoundingBox {
    #[inline]
    pub fn from_position_and_extent(position: Vec3, extent: Vec3) -> Self {
        Self {
            min: position,
            max: position + extent,
        }
    }

    /// Builds the box of anything that has a position and dimensions.
    pub fn of<T: Positioned + Dimensional>(item: &T) -> Self {
        Self::from_position_and_extent(item.position(), item.dimensions().as_extent())
    }

    /// Grows the box by `margin` on every side.
    ///
    /// Two boxes with at least `2 * margin` clearance between them still do
    /// not intersect once both are inflated.
    #[inline]
    pub fn inflated(&self, margin: f64) -> Self {
        let grow = Vec3::new(margin, margin, margin);
        Self {
            min: self.min - grow,
            max: self.max + grow,
        }
    }

    /// Checks if two bounding boxes intersect.
    ///
    /// Implements the Separating Axis Theorem (SAT) for AABBs. Touching faces
    /// do not count as an intersection.
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        !(self.max.x <= other.min.x
            || other.max.x <= self.min.x
            || self.max.y <= other.min.y
            || other.max.y <= self.min.y
            || self.max.z <= other.min.z
            || other.max.z <= self.min.z)
    }

    /// Checks that the box lies inside `[0, extent]` on every axis.
    #[inline]
    pub fn is_within(&self, extent: &Vec3, tolerance: f64) -> bool {
        self.min.x >= -tolerance
            && self.min.y >= -tolerance
            && self.min.z >= -tolerance
            && self.max.fits_within(extent, tolerance)
    }

    /// Returns the center point.
    #[inline]
    pub fn center(&self) -> Vec3 {
        Vec3::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
            (self.min.z + self.max.z) / 2.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_operations() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);

        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(b - a, Vec3::new(3.0, 3.0, 3.0));
        assert_eq!(a * 2.0, Vec3::new(2.0, 4.0, 6.0));
    }

    #[test]
    fn test_dimensions_volume_and_extent() {
        let dims = Dimensions::new(10.0, 20.0, 30.0);
        assert!((dims.volume() - 6000.0).abs() < EPSILON_GENERAL);
        // height is vertical (Y), depth runs along Z
        assert_eq!(dims.as_extent(), Vec3::new(10.0, 30.0, 20.0));
    }

    #[test]
    fn test_vec3_fits_within() {
        let small = Vec3::new(5.0, 5.0, 5.0);
        let large = Vec3::new(10.0, 10.0, 10.0);

        assert!(small.fits_within(&large, EPSILON_GENERAL));
        assert!(!large.fits_within(&small, EPSILON_GENERAL));
    }

    #[test]
    fn test_bounding_box_intersects() {
        let a = BoundingBox::from_position_and_extent(Vec3::zero(), Vec3::new(10.0, 10.0, 10.0));
        let b = BoundingBox::from_position_and_extent(
            Vec3::new(5.0, 5.0, 5.0),
            Vec3::new(10.0, 10.0, 10.0),
        );
        let c = BoundingBox::from_position_and_extent(
            Vec3::new(20.0, 20.0, 20.0),
            Vec3::new(10.0, 10.0, 10.0),
        );

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_touching_boxes_do_not_intersect_until_inflated() {
        let a = BoundingBox::from_position_and_extent(Vec3::zero(), Vec3::new(10.0, 10.0, 10.0));
        let touching = BoundingBox::from_position_and_extent(
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(10.0, 10.0, 10.0),
        );
        let spaced = BoundingBox::from_position_and_extent(
            Vec3::new(11.0, 0.0, 0.0),
            Vec3::new(10.0, 10.0, 10.0),
        );

        assert!(!a.intersects(&touching));
        assert!(a.inflated(0.5).intersects(&touching.inflated(0.5)));
        assert!(!a.inflated(0.4).intersects(&spaced.inflated(0.4)));
    }

    #[test]
    fn test_bounding_box_within_extent() {
        let extent = Vec3::new(95.0, 83.5, 56.0);
        let inside = BoundingBox::from_position_and_extent(Vec3::zero(), extent);
        let outside =
            BoundingBox::from_position_and_extent(Vec3::new(1.0, 0.0, 0.0), extent);

        assert!(inside.is_within(&extent, EPSILON_GENERAL));
        assert!(!outside.is_within(&extent, EPSILON_GENERAL));
        assert_eq!(inside.center(), Vec3::new(47.5, 41.75, 28.0));
    }
}
