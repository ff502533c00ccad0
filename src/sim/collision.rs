//! Collision geometry for the ship polygon
//!
//! Broad phase is plain axis-aligned boxes. The narrow phase tests the ship's
//! hitbox vertices against the exact shapes the renderer draws: the wavy
//! plasma stroke, the jagged meteorite outline and the round coin.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in world space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Aabb {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Box centred on `center` with the given half extents
    pub fn around(center: Vec2, half_w: f32, half_h: f32) -> Self {
        Self::new(center.x - half_w, center.y - half_h, half_w * 2.0, half_h * 2.0)
    }

    /// Trailing (right) edge
    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// Strict overlap test (touching edges do not count)
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }
}

/// Distance from `p` to the segment `a`-`b`
pub fn point_segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < 1e-8 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Even-odd point in polygon test (polygon is implicitly closed)
pub fn point_in_polygon(p: Vec2, polygon: &[Vec2]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (a, b) = (polygon[i], polygon[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let cross_x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < cross_x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Whether `p` lies on a round-capped stroke of `line_width` along `path`
pub fn point_in_stroke(p: Vec2, path: &[Vec2], line_width: f32) -> bool {
    let half = line_width / 2.0;
    match path {
        [] => false,
        [only] => p.distance(*only) <= half,
        _ => path
            .windows(2)
            .any(|seg| point_segment_distance(p, seg[0], seg[1]) <= half),
    }
}

/// Whether a circle touches or overlaps a closed polygon
pub fn circle_touches_polygon(center: Vec2, radius: f32, polygon: &[Vec2]) -> bool {
    if point_in_polygon(center, polygon) {
        return true;
    }
    let n = polygon.len();
    (0..n).any(|i| point_segment_distance(center, polygon[i], polygon[(i + 1) % n]) <= radius)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Vec2> {
        vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ]
    }

    #[test]
    fn test_aabb_overlap() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.overlaps(&Aabb::new(5.0, 5.0, 10.0, 10.0)));
        // Touching edges is not an overlap
        assert!(!a.overlaps(&Aabb::new(10.0, 0.0, 10.0, 10.0)));
        assert!(!a.overlaps(&Aabb::new(0.0, 20.0, 10.0, 10.0)));
    }

    #[test]
    fn test_point_in_polygon() {
        let sq = square();
        assert!(point_in_polygon(Vec2::new(5.0, 5.0), &sq));
        assert!(!point_in_polygon(Vec2::new(15.0, 5.0), &sq));
        assert!(!point_in_polygon(Vec2::new(5.0, -1.0), &sq));
    }

    #[test]
    fn test_point_in_stroke() {
        let path = [Vec2::new(0.0, 0.0), Vec2::new(0.0, 100.0)];
        assert!(point_in_stroke(Vec2::new(5.0, 50.0), &path, 12.0));
        assert!(!point_in_stroke(Vec2::new(7.0, 50.0), &path, 12.0));
        // Round caps extend past the ends
        assert!(point_in_stroke(Vec2::new(0.0, 104.0), &path, 12.0));
    }

    #[test]
    fn test_circle_touches_polygon() {
        let sq = square();
        assert!(circle_touches_polygon(Vec2::new(5.0, 5.0), 1.0, &sq));
        assert!(circle_touches_polygon(Vec2::new(13.0, 5.0), 4.0, &sq));
        assert!(!circle_touches_polygon(Vec2::new(20.0, 5.0), 4.0, &sq));
    }
}
