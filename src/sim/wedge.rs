//! Wedge geometry for bricks and the polygonal base
//!
//! In polar space (degrees), a wedge is defined by:
//! - outer_radius / inner_radius: radial extent
//! - start_angle, span: angular extent, spanning clockwise on screen

use std::fmt::Write;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{normalize_angle, polar_to_cartesian};

/// A sector of an annulus with straight edges
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wedge {
    pub outer_radius: f32,
    pub inner_radius: f32,
    /// Start angle (degrees, normalized to [0, 360))
    pub start_angle: f32,
    /// Angular extent in degrees
    pub span: f32,
}

impl Wedge {
    pub fn new(outer_radius: f32, inner_radius: f32, start_angle: f32, span: f32) -> Self {
        Self {
            outer_radius,
            inner_radius,
            start_angle: normalize_angle(start_angle),
            span,
        }
    }

    /// Wedge for a brick whose outer edge sits at `radius`
    pub fn for_brick(radius: f32, height: f32, start_angle: f32, span: f32) -> Self {
        Self::new(radius, radius - height, start_angle, span)
    }

    #[inline]
    pub fn thickness(&self) -> f32 {
        self.outer_radius - self.inner_radius
    }

    #[inline]
    pub fn end_angle(&self) -> f32 {
        normalize_angle(self.start_angle + self.span)
    }

    /// Corner points: outer-start, outer-end, inner-end, inner-start
    pub fn vertices(&self, center: Vec2) -> [Vec2; 4] {
        let end = self.start_angle + self.span;
        [
            polar_to_cartesian(center, self.outer_radius, self.start_angle),
            polar_to_cartesian(center, self.outer_radius, end),
            polar_to_cartesian(center, self.inner_radius, end),
            polar_to_cartesian(center, self.inner_radius, self.start_angle),
        ]
    }
}

/// Four point wedge outline, see [`Wedge::vertices`]
pub fn build_wedge_path(
    center: Vec2,
    outer_radius: f32,
    inner_radius: f32,
    start_angle: f32,
    sector_span: f32,
) -> Vec<Vec2> {
    Wedge::new(outer_radius, inner_radius, start_angle, sector_span)
        .vertices(center)
        .to_vec()
}

/// Vertices of a regular N-gon. With `closed` the first vertex is repeated at the end.
pub fn polygon_vertices(
    center: Vec2,
    radius: f32,
    edge_count: u32,
    start_angle: f32,
    closed: bool,
) -> Vec<Vec2> {
    let step = 360.0 / edge_count as f32;
    let mut points: Vec<Vec2> = (0..edge_count)
        .map(|i| polar_to_cartesian(center, radius, start_angle + step * i as f32))
        .collect();
    if closed {
        if let Some(&first) = points.first() {
            points.push(first);
        }
    }
    points
}

/// SVG path data (`M x,y L x,y ... Z`) for a vertex list
pub fn path_data(points: &[Vec2], closed: bool) -> String {
    let mut d = String::with_capacity(points.len() * 24);
    for (i, p) in points.iter().enumerate() {
        let cmd = if i == 0 { 'M' } else { 'L' };
        let _ = write!(d, "{cmd} {},{} ", p.x, p.y);
    }
    if closed && !points.is_empty() {
        d.push('Z');
    }
    d.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn test_wedge_vertex_order() {
        let center = Vec2::new(100.0, 100.0);
        let v = Wedge::for_brick(50.0, 20.0, 0.0, 90.0).vertices(center);
        assert!(close(v[0], Vec2::new(150.0, 100.0))); // outer-start
        assert!(close(v[1], Vec2::new(100.0, 150.0))); // outer-end
        assert!(close(v[2], Vec2::new(100.0, 130.0))); // inner-end
        assert!(close(v[3], Vec2::new(130.0, 100.0))); // inner-start
    }

    #[test]
    fn test_wedge_wraps_start_angle() {
        let wedge = Wedge::new(100.0, 80.0, -60.0, 60.0);
        assert_eq!(wedge.start_angle, 300.0);
        assert_eq!(wedge.end_angle(), 0.0);
        assert_eq!(wedge.thickness(), 20.0);
    }

    #[test]
    fn test_build_wedge_path_matches_wedge() {
        let path = build_wedge_path(Vec2::ZERO, 123.0, 103.0, 60.0, 60.0);
        assert_eq!(path.len(), 4);
        assert!(close(path[0], polar_to_cartesian(Vec2::ZERO, 123.0, 60.0)));
        assert!(close(path[2], polar_to_cartesian(Vec2::ZERO, 103.0, 120.0)));
    }

    #[test]
    fn test_hexagon_vertices() {
        let open = polygon_vertices(Vec2::ZERO, 100.0, 6, 0.0, false);
        assert_eq!(open.len(), 6);
        for p in &open {
            assert!((p.length() - 100.0).abs() < 1e-3);
        }
        assert!(close(open[1], polar_to_cartesian(Vec2::ZERO, 100.0, 60.0)));

        let closed = polygon_vertices(Vec2::ZERO, 100.0, 6, 0.0, true);
        assert_eq!(closed.len(), 7);
        assert_eq!(closed[0], closed[6]);
    }

    #[test]
    fn test_path_data() {
        let d = path_data(&[Vec2::new(0.0, 0.0), Vec2::new(1.5, 2.0)], true);
        assert_eq!(d, "M 0,0 L 1.5,2 Z");
        assert_eq!(path_data(&[], true), "");
        assert_eq!(path_data(&[Vec2::ONE], false), "M 1,1");
    }
}
