//! ROI shape definitions.

use kurbo::{Point, Rect};
use peniko::Color;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from RGB components.
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Unique identifier for shapes.
pub type ShapeId = Uuid;

/// Classification of an object. `None` in an `Option<ClassLabel>` means unclassified.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassLabel(String);

impl ClassLabel {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClassLabel {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ClassLabel {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Display helper for an optional class.
pub fn class_name(class: &Option<ClassLabel>) -> &str {
    class.as_ref().map_or("Unclassified", ClassLabel::as_str)
}

/// Channel / z-slice / timepoint a shape lives on.
///
/// Shapes can only be combined when their planes are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImagePlane {
    pub c: i32,
    pub z: i32,
    pub t: i32,
}

impl ImagePlane {
    pub fn new(c: i32, z: i32, t: i32) -> Self {
        Self { c, z, t }
    }

    /// Plane at the given z-slice and timepoint, spanning all channels.
    pub fn at(z: i32, t: i32) -> Self {
        Self::new(-1, z, t)
    }
}

impl Default for ImagePlane {
    fn default() -> Self {
        Self::at(0, 0)
    }
}

impl fmt::Display for ImagePlane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c={}, z={}, t={}", self.c, self.z, self.t)
    }
}

/// Kind of object a shape belongs to. Only detections are expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ObjectKind {
    Annotation,
    #[default]
    Detection,
}

/// A closed polygonal region of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiShape {
    pub(crate) id: ShapeId,
    /// Boundary vertices. The ring is closed implicitly.
    pub points: Vec<Point>,
    #[serde(default)]
    pub plane: ImagePlane,
    #[serde(default)]
    pub class: Option<ClassLabel>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<SerializableColor>,
    #[serde(default)]
    pub kind: ObjectKind,
}

impl RoiShape {
    /// Create an unclassified detection on the default plane.
    pub fn from_points(points: Vec<Point>) -> Self {
        Self {
            id: Uuid::new_v4(),
            points,
            plane: ImagePlane::default(),
            class: None,
            name: None,
            color: None,
            kind: ObjectKind::Detection,
        }
    }

    /// Axis-aligned rectangle, mostly useful for tests and seeding.
    pub fn rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::from_points(vec![
            Point::new(x, y),
            Point::new(x + width, y),
            Point::new(x + width, y + height),
            Point::new(x, y + height),
        ])
    }

    pub fn with_class(mut self, class: impl Into<ClassLabel>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_color(mut self, color: SerializableColor) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_plane(mut self, plane: ImagePlane) -> Self {
        self.plane = plane;
        self
    }

    pub fn with_kind(mut self, kind: ObjectKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn id(&self) -> ShapeId {
        self.id
    }

    pub fn is_detection(&self) -> bool {
        self.kind == ObjectKind::Detection
    }

    /// New detection with `points` that carries over this shape's class, name, color and plane.
    pub fn derive(&self, points: Vec<Point>) -> Self {
        Self {
            id: Uuid::new_v4(),
            points,
            plane: self.plane,
            class: self.class.clone(),
            name: self.name.clone(),
            color: self.color,
            kind: ObjectKind::Detection,
        }
    }

    /// Get the bounding box.
    pub fn bounds(&self) -> Rect {
        if self.points.is_empty() {
            return Rect::ZERO;
        }

        let mut min_x = f64::MAX;
        let mut min_y = f64::MAX;
        let mut max_x = f64::MIN;
        let mut max_y = f64::MIN;

        for point in &self.points {
            min_x = min_x.min(point.x);
            min_y = min_y.min(point.y);
            max_x = max_x.max(point.x);
            max_y = max_y.max(point.y);
        }

        Rect::new(min_x, min_y, max_x, max_y)
    }
}

/// Test if two line segments (a-b) and (c-d) intersect.
pub(crate) fn segments_intersect(a: Point, b: Point, c: Point, d: Point) -> bool {
    let cross = |o: Point, p: Point, q: Point| -> f64 {
        (p.x - o.x) * (q.y - o.y) - (p.y - o.y) * (q.x - o.x)
    };
    let d1 = cross(c, d, a);
    let d2 = cross(c, d, b);
    let d3 = cross(a, b, c);
    let d4 = cross(a, b, d);
    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    // Collinear cases: check if endpoint lies on the other segment
    let on_segment = |p: Point, q: Point, r: Point| -> bool {
        r.x >= p.x.min(q.x) && r.x <= p.x.max(q.x) && r.y >= p.y.min(q.y) && r.y <= p.y.max(q.y)
    };
    (d1.abs() < 1e-10 && on_segment(c, d, a))
        || (d2.abs() < 1e-10 && on_segment(c, d, b))
        || (d3.abs() < 1e-10 && on_segment(a, b, c))
        || (d4.abs() < 1e-10 && on_segment(a, b, d))
}
