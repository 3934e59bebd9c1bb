//! Bounding volumes for camera framing.

use glam::Vec3;

/// Axis-Aligned Bounding Box
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Create an empty (inverted) box
    pub const EMPTY: Self = Self {
        min: Vec3::new(f32::MAX, f32::MAX, f32::MAX),
        max: Vec3::new(f32::MIN, f32::MIN, f32::MIN),
    };

    /// Create from min and max points
    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create from a set of points
    pub fn from_points(points: &[Vec3]) -> Self {
        let mut aabb = Self::EMPTY;
        for &point in points {
            aabb = aabb.expand_to_include(point);
        }
        aabb
    }

    /// Get the center point
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the size (full extents)
    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Length of the main diagonal
    #[inline]
    pub fn diagonal(&self) -> f32 {
        self.size().length()
    }

    /// Check if the box is valid (min <= max)
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Expand to include a point
    pub fn expand_to_include(self, point: Vec3) -> Self {
        Self {
            min: self.min.min(point),
            max: self.max.max(point),
        }
    }

    /// Union of two boxes
    pub fn union(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_and_size() {
        let aabb = Aabb::new(Vec3::new(-1.0, -2.0, -3.0), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(aabb.center(), Vec3::ZERO);
        assert_eq!(aabb.size(), Vec3::new(2.0, 4.0, 6.0));
        assert!(aabb.is_valid());
    }

    #[test]
    fn from_points_wraps_all() {
        let aabb = Aabb::from_points(&[
            Vec3::new(1.0, 0.0, -2.0),
            Vec3::new(-3.0, 5.0, 0.5),
            Vec3::new(0.0, -1.0, 4.0),
        ]);
        assert_eq!(aabb.min, Vec3::new(-3.0, -1.0, -2.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 5.0, 4.0));
    }

    #[test]
    fn empty_is_invalid() {
        assert!(!Aabb::EMPTY.is_valid());
        let grown = Aabb::EMPTY.expand_to_include(Vec3::ONE);
        assert!(grown.is_valid());
        assert_eq!(grown.min, Vec3::ONE);
        assert_eq!(grown.max, Vec3::ONE);
    }

    #[test]
    fn diagonal_length() {
        let aabb = Aabb::new(Vec3::ZERO, Vec3::new(3.0, 4.0, 0.0));
        assert!((aabb.diagonal() - 5.0).abs() < 1e-6);
    }
}
