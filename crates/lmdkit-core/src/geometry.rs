//! Conversion between shape rings and `geo` polygons.
//!
//! Every geometric operation in the crate goes through [`to_polygon`], so
//! shape validation happens in exactly one place.

use crate::error::{GeometryIssue, RoiError, RoiResult};
use crate::shapes::{RoiShape, segments_intersect};
use geo::orient::{Direction, Orient};
use geo::{Area, BooleanOps, BoundingRect, Coord, Intersects, LineString, MultiPolygon, Polygon};
use kurbo::{Point, Rect};

/// Areas at or below this many square pixels are treated as empty.
pub const AREA_EPSILON: f64 = 1e-6;

/// Convert a shape into a validated polygon with a counter-clockwise exterior.
pub fn to_polygon(shape: &RoiShape) -> RoiResult<Polygon<f64>> {
    if shape
        .points
        .iter()
        .any(|p| !p.x.is_finite() || !p.y.is_finite())
    {
        return Err(RoiError::invalid(shape.id(), GeometryIssue::NonFiniteCoordinate));
    }

    let ring = ring_points(&shape.points);
    if ring.len() < 3 {
        return Err(RoiError::invalid(shape.id(), GeometryIssue::TooFewPoints(ring.len())));
    }
    // Checked before the area: a symmetric bow-tie has zero signed area.
    if is_self_intersecting(&ring) {
        return Err(RoiError::invalid(shape.id(), GeometryIssue::SelfIntersecting));
    }

    let polygon = polygon_from_points(&ring);
    if polygon.unsigned_area() <= AREA_EPSILON {
        return Err(RoiError::invalid(shape.id(), GeometryIssue::ZeroArea));
    }
    Ok(polygon)
}

/// Exterior ring of a polygon as an open point sequence. Holes are dropped.
pub fn shape_points(polygon: &Polygon<f64>) -> Vec<Point> {
    let points: Vec<Point> = polygon
        .exterior()
        .coords()
        .map(|c| Point::new(c.x, c.y))
        .collect();
    ring_points(&points)
}

/// Area enclosed by a shape's boundary.
pub fn area(shape: &RoiShape) -> RoiResult<f64> {
    to_polygon(shape).map(|polygon| polygon.unsigned_area())
}

/// Shared boundary shorter than this many pixels counts as a single point.
pub const LENGTH_EPSILON: f64 = 1e-6;

/// How two polygons meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    /// The polygons are disjoint.
    Disjoint,
    /// The boundaries meet only at isolated points.
    Point,
    /// The boundaries share a segment of positive length, interiors are disjoint.
    Edge,
    /// The interiors share a region of positive area.
    Area,
}

/// Whether two closed polygons intersect, touching boundaries included.
pub fn overlaps(a: &Polygon<f64>, b: &Polygon<f64>) -> bool {
    contact(a, b) != Contact::Disjoint
}

/// Classify how two polygons meet.
pub fn contact(a: &Polygon<f64>, b: &Polygon<f64>) -> Contact {
    match (a.bounding_rect(), b.bounding_rect()) {
        (Some(ra), Some(rb)) if ra.intersects(&rb) => {}
        _ => return Contact::Disjoint,
    }
    if !a.intersects(b) {
        return Contact::Disjoint;
    }
    if a.intersection(b).unsigned_area() > AREA_EPSILON {
        Contact::Area
    } else if shared_boundary_length(a, b) > LENGTH_EPSILON {
        Contact::Edge
    } else {
        Contact::Point
    }
}

/// Whether two bounding boxes meet, touching sides included.
pub(crate) fn bounds_touch(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

/// Total length of exterior segments lying on both rings.
fn shared_boundary_length(a: &Polygon<f64>, b: &Polygon<f64>) -> f64 {
    let mut shared = 0.0;
    for edge in a.exterior().lines() {
        let d = edge.delta();
        let len = d.x.hypot(d.y);
        if len < LENGTH_EPSILON {
            continue;
        }
        for other in b.exterior().lines() {
            let off_line = |c: Coord<f64>| {
                ((c.x - edge.start.x) * d.y - (c.y - edge.start.y) * d.x).abs() / len
            };
            if off_line(other.start) > LENGTH_EPSILON || off_line(other.end) > LENGTH_EPSILON {
                continue;
            }
            let along = |c: Coord<f64>| {
                ((c.x - edge.start.x) * d.x + (c.y - edge.start.y) * d.y) / len
            };
            let (t0, t1) = (along(other.start), along(other.end));
            let overlap = t0.max(t1).min(len) - t0.min(t1).max(0.0);
            if overlap > 0.0 {
                shared += overlap;
            }
        }
    }
    shared
}

/// Boolean union of any number of polygons.
pub fn union_all(polygons: impl IntoIterator<Item = Polygon<f64>>) -> MultiPolygon<f64> {
    let mut polygons = polygons.into_iter();
    let Some(first) = polygons.next() else {
        return MultiPolygon::new(Vec::new());
    };
    polygons.fold(MultiPolygon::new(vec![first]), |acc, polygon| {
        acc.union(&MultiPolygon::new(vec![polygon]))
    })
}

/// Non-empty parts of a multipolygon, largest first.
pub fn components(multi: MultiPolygon<f64>) -> Vec<Polygon<f64>> {
    let mut parts: Vec<(f64, Polygon<f64>)> = multi
        .into_iter()
        .map(|polygon| (polygon.unsigned_area(), polygon))
        .filter(|(area, _)| *area > AREA_EPSILON)
        .collect();
    parts.sort_by(|a, b| b.0.total_cmp(&a.0));
    parts.into_iter().map(|(_, polygon)| polygon).collect()
}

pub(crate) fn polygon_from_points(points: &[Point]) -> Polygon<f64> {
    let coords: Vec<Coord<f64>> = points.iter().map(|p| Coord { x: p.x, y: p.y }).collect();
    Polygon::new(LineString::from(coords), vec![]).orient(Direction::Default)
}

/// Drop consecutive duplicates and any explicit closing point.
fn ring_points(points: &[Point]) -> Vec<Point> {
    let mut ring: Vec<Point> = Vec::with_capacity(points.len());
    for &point in points {
        if ring.last() != Some(&point) {
            ring.push(point);
        }
    }
    while ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    ring
}

/// Check every pair of non-adjacent ring edges for contact.
fn is_self_intersecting(ring: &[Point]) -> bool {
    let n = ring.len();
    let edge = |i: usize| (ring[i], ring[(i + 1) % n]);

    for i in 0..n {
        let (a, b) = edge(i);
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            let (c, d) = edge(j);
            if a.x.max(b.x) < c.x.min(d.x)
                || c.x.max(d.x) < a.x.min(b.x)
                || a.y.max(b.y) < c.y.min(d.y)
                || c.y.max(d.y) < a.y.min(b.y)
            {
                continue;
            }
            if segments_intersect(a, b, c, d) {
                return true;
            }
        }
    }
    false
}
