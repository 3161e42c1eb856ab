//! Pixel-space geometry.

use serde::{Deserialize, Serialize};

/// A point in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    /// Create a new point.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        dx.hypot(dy)
    }
}

/// Axis-aligned bounding box in pixel coordinates.
///
/// Serialized as `[x1, y1, x2, y2]`, the layout detectors emit. Fractional coordinates
/// are truncated toward zero on the way in. Deserialization does not validate the
/// corners; call [`BoundingBox::is_valid`] before using a box from the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[i32; 4]")]
pub struct BoundingBox {
    /// Left edge
    pub x1: i32,
    /// Top edge
    pub y1: i32,
    /// Right edge
    pub x2: i32,
    /// Bottom edge
    pub y2: i32,
}

impl BoundingBox {
    /// Create a new bounding box from its corners.
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// A box is valid when it has positive width and height.
    pub fn is_valid(&self) -> bool {
        self.x1 < self.x2 && self.y1 < self.y2
    }

    /// Integer center, rounded toward negative infinity.
    pub fn center(&self) -> Point {
        Point::new(midpoint(self.x1, self.x2), midpoint(self.y1, self.y2))
    }

    /// Strict intersection test: boxes that only share an edge do not intersect.
    #[inline]
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.x1 < other.x2 && self.x2 > other.x1 && self.y1 < other.y2 && self.y2 > other.y1
    }

    /// Top-left corner shifted vertically, used to place captions above a box.
    pub fn above(&self, offset: i32) -> Point {
        Point::new(self.x1, self.y1.saturating_sub(offset))
    }

    /// Bottom-left corner shifted vertically, used to place captions below a box.
    pub fn below(&self, offset: i32) -> Point {
        Point::new(self.x1, self.y2.saturating_add(offset))
    }
}

/// Floor of the mean; the result always lies between `a` and `b`.
fn midpoint(a: i32, b: i32) -> i32 {
    (i64::from(a) + i64::from(b)).div_euclid(2) as i32
}

impl From<[f64; 4]> for BoundingBox {
    /// Truncates toward zero, saturating at the `i32` range.
    fn from([x1, y1, x2, y2]: [f64; 4]) -> Self {
        Self::new(x1 as i32, y1 as i32, x2 as i32, y2 as i32)
    }
}

impl From<BoundingBox> for [i32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_touching_boxes_do_not_intersect() {
        let a = BoundingBox::new(0, 0, 10, 10);
        assert!(!a.intersects(&BoundingBox::new(10, 0, 20, 10)));
        assert!(!a.intersects(&BoundingBox::new(0, 10, 10, 20)));
        assert!(a.intersects(&BoundingBox::new(9, 0, 20, 10)));
    }

    #[test]
    fn test_intersection_is_symmetric() {
        let a = BoundingBox::new(0, 0, 10, 10);
        let b = BoundingBox::new(5, 5, 15, 15);
        assert_eq!(a.intersects(&b), b.intersects(&a));
        assert!(a.intersects(&b));
    }

    #[test]
    fn test_contained_box_intersects() {
        let outer = BoundingBox::new(0, 0, 100, 100);
        let inner = BoundingBox::new(40, 40, 60, 60);
        assert!(outer.intersects(&inner));
        assert!(inner.intersects(&outer));
    }

    #[test]
    fn test_center_and_validity() {
        let b = BoundingBox::new(90, 95, 111, 106);
        assert_eq!(b.center(), Point::new(100, 100));
        assert!(b.is_valid());
        assert!(!BoundingBox::new(10, 0, 10, 5).is_valid());
        assert!(!BoundingBox::new(0, 8, 5, 3).is_valid());
    }

    #[test]
    fn test_point_distance() {
        let a = Point::new(100, 100);
        let b = Point::new(106, 101);
        assert!((a.distance(&b) - 37f64.sqrt()).abs() < 1e-9);
        assert_eq!(Point::new(0, 0).distance(&Point::new(30, 40)), 50.0);
    }

    #[test]
    fn test_bbox_serializes_as_array() {
        let b = BoundingBox::new(1, 2, 3, 4);
        assert_eq!(serde_json::to_string(&b).unwrap(), "[1,2,3,4]");
        let parsed: BoundingBox = serde_json::from_str("[5,6,7,8]").unwrap();
        assert_eq!(parsed, BoundingBox::new(5, 6, 7, 8));
    }

    #[test]
    fn test_fractional_coordinates_truncate() {
        let parsed: BoundingBox = serde_json::from_str("[0.5,0.2,10.7,10.1]").unwrap();
        assert_eq!(parsed, BoundingBox::new(0, 0, 10, 10));
        let negative: BoundingBox = serde_json::from_str("[-3.9,-0.5,4,5]").unwrap();
        assert_eq!(negative, BoundingBox::new(-3, 0, 4, 5));
    }

    #[test]
    fn test_geometry_at_coordinate_limits() {
        let right = BoundingBox::new(2_147_483_000, 0, 2_147_483_600, 10);
        assert_eq!(right.center(), Point::new(2_147_483_300, 5));

        let full = BoundingBox::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX);
        assert_eq!(full.center(), Point::new(-1, -1));
        assert_eq!(full.above(30), Point::new(i32::MIN, i32::MIN));
        assert_eq!(full.below(20), Point::new(i32::MIN, i32::MAX));
    }
}
