//! Shape expansion by a fixed radius.
//!
//! The buffer is built as a Minkowski-style offset: the band of points within
//! `|radius|` of the boundary is the union of one rectangle per edge and one
//! disc per vertex. Growing adds that band to the polygon, shrinking removes it.

use crate::error::{RoiError, RoiResult};
use crate::geometry::{components, polygon_from_points, shape_points, to_polygon, union_all};
use crate::shapes::RoiShape;
use geo::{BooleanOps, MultiPolygon, Polygon};
use kurbo::{Point, Vec2};
use std::f64::consts::TAU;

/// Segments used per quarter circle when rounding corners.
pub const QUADRANT_SEGMENTS: usize = 8;

/// Buffers shapes by a radius expressed in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expander {
    quadrant_segments: usize,
}

impl Default for Expander {
    fn default() -> Self {
        Self::new(QUADRANT_SEGMENTS)
    }
}

impl Expander {
    /// Create an expander. At least one segment per quadrant is always used.
    pub fn new(quadrant_segments: usize) -> Self {
        Self {
            quadrant_segments: quadrant_segments.max(1),
        }
    }

    pub fn quadrant_segments(&self) -> usize {
        self.quadrant_segments
    }

    /// Buffer every shape by `radius`.
    ///
    /// Negative radii shrink. When a shape splits into several disjoint
    /// polygons, one shape is emitted per polygon, largest first; a shape that
    /// shrinks away completely produces nothing. Outputs are detections that
    /// keep the source's class, name, color and plane.
    pub fn expand(&self, shapes: &[RoiShape], radius: f64) -> RoiResult<Vec<RoiShape>> {
        if !radius.is_finite() {
            return Err(RoiError::NonFiniteRadius(radius));
        }

        let mut expanded = Vec::with_capacity(shapes.len());
        for shape in shapes {
            let polygon = to_polygon(shape)?;
            let parts = components(self.buffer(&polygon, radius));

            match parts.len() {
                0 => log::warn!("Shape {} vanished when buffered by {}", shape.id(), radius),
                1 => {}
                n => log::debug!("Shape {} split into {} parts", shape.id(), n),
            }
            expanded.extend(parts.iter().map(|part| shape.derive(shape_points(part))));
        }

        log::debug!(
            "Buffered {} shapes by {} px into {} shapes",
            shapes.len(),
            radius,
            expanded.len()
        );
        Ok(expanded)
    }

    /// Buffer a single polygon.
    pub fn buffer(&self, polygon: &Polygon<f64>, radius: f64) -> MultiPolygon<f64> {
        let body = MultiPolygon::new(vec![polygon.clone()]);
        if radius == 0.0 {
            return body;
        }

        let band = self.boundary_band(polygon, radius.abs());
        if radius > 0.0 {
            body.union(&band)
        } else {
            body.difference(&band)
        }
    }

    /// All points within `distance` of the polygon's exterior ring.
    fn boundary_band(&self, polygon: &Polygon<f64>, distance: f64) -> MultiPolygon<f64> {
        let ring = shape_points(polygon);
        let n = ring.len();

        let mut pieces = Vec::with_capacity(2 * n);
        for i in 0..n {
            let (a, b) = (ring[i], ring[(i + 1) % n]);
            pieces.push(disc(a, distance, self.quadrant_segments));
            if let Some(strip) = edge_strip(a, b, distance) {
                pieces.push(strip);
            }
        }
        union_all(pieces)
    }
}

/// Buffer shapes with the default curve quality.
pub fn expand(shapes: &[RoiShape], radius: f64) -> RoiResult<Vec<RoiShape>> {
    Expander::default().expand(shapes, radius)
}

fn disc(center: Point, radius: f64, quadrant_segments: usize) -> Polygon<f64> {
    let steps = 4 * quadrant_segments;
    let points: Vec<Point> = (0..steps)
        .map(|i| {
            let angle = TAU * i as f64 / steps as f64;
            Point::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
        })
        .collect();
    polygon_from_points(&points)
}

fn edge_strip(a: Point, b: Point, distance: f64) -> Option<Polygon<f64>> {
    let dir = b - a;
    let len = dir.hypot();
    if len < f64::EPSILON {
        return None;
    }
    let normal = Vec2::new(-dir.y, dir.x) * (distance / len);
    Some(polygon_from_points(&[a + normal, b + normal, b - normal, a - normal]))
}
