//! Combining same-class shapes into one.

use crate::error::{RoiError, RoiResult};
use crate::geometry::{components, shape_points, to_polygon, union_all};
use crate::shapes::{ObjectKind, RoiShape};
use geo::Polygon;
use uuid::Uuid;

/// Merge shapes into a single detection covering their union.
///
/// All shapes must share the first shape's plane and class, and their union
/// must be one connected region. Name and color come from the first shape
/// that has one, in slice order.
pub fn merge_shapes(shapes: &[RoiShape]) -> RoiResult<RoiShape> {
    let parts = shapes
        .iter()
        .map(|shape| to_polygon(shape).map(|polygon| (shape, polygon)))
        .collect::<RoiResult<Vec<_>>>()?;
    let (merged, _) = merge_parts(&parts)?;
    Ok(merged)
}

/// Merge already-validated shapes, returning the merged shape and its polygon.
pub(crate) fn merge_parts(parts: &[(&RoiShape, Polygon<f64>)]) -> RoiResult<(RoiShape, Polygon<f64>)> {
    let Some((first, _)) = parts.first() else {
        return Err(RoiError::EmptyMerge);
    };

    for (shape, _) in &parts[1..] {
        if shape.plane != first.plane {
            return Err(RoiError::PlaneMismatch {
                first: first.id(),
                second: shape.id(),
                first_plane: first.plane,
                second_plane: shape.plane,
            });
        }
        if shape.class != first.class {
            return Err(RoiError::ClassMismatch {
                first: first.id(),
                second: shape.id(),
            });
        }
    }

    let mut pieces = components(union_all(parts.iter().map(|(_, polygon)| polygon.clone())));
    if pieces.len() != 1 {
        return Err(RoiError::DisjointMerge {
            shapes: parts.iter().map(|(shape, _)| shape.id()).collect(),
        });
    }
    let polygon = pieces.remove(0);

    let merged = RoiShape {
        id: Uuid::new_v4(),
        points: shape_points(&polygon),
        plane: first.plane,
        class: first.class.clone(),
        name: parts.iter().find_map(|(shape, _)| shape.name.clone()),
        color: parts.iter().find_map(|(shape, _)| shape.color),
        kind: ObjectKind::Detection,
    };
    Ok((merged, polygon))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::area;
    use crate::shapes::{ImagePlane, SerializableColor};

    #[test]
    fn test_merge_two_squares() {
        let a = RoiShape::rect(0.0, 0.0, 10.0, 10.0).with_class("Positive");
        let b = RoiShape::rect(5.0, 5.0, 10.0, 10.0).with_class("Positive");

        let merged = merge_shapes(&[a.clone(), b.clone()]).unwrap();
        assert!((area(&merged).unwrap() - 175.0).abs() < 1e-3);
        assert_eq!(merged.class, a.class);
        assert_ne!(merged.id(), a.id());
        assert_ne!(merged.id(), b.id());
    }

    #[test]
    fn test_merge_inherits_first_name_and_color() {
        let red = SerializableColor::rgb(255, 0, 0);
        let blue = SerializableColor::rgb(0, 0, 255);
        let a = RoiShape::rect(0.0, 0.0, 4.0, 4.0).with_color(red);
        let b = RoiShape::rect(2.0, 0.0, 4.0, 4.0).with_name("second").with_color(blue);
        let c = RoiShape::rect(4.0, 0.0, 4.0, 4.0).with_name("third");

        let merged = merge_shapes(&[a, b, c]).unwrap();
        // First shape has no name, so the name falls through to the next one.
        assert_eq!(merged.name.as_deref(), Some("second"));
        assert_eq!(merged.color, Some(red));
    }

    #[test]
    fn test_merge_across_planes_fails() {
        let a = RoiShape::rect(0.0, 0.0, 10.0, 10.0).with_plane(ImagePlane::at(0, 0));
        let b = RoiShape::rect(5.0, 5.0, 10.0, 10.0).with_plane(ImagePlane::at(1, 0));
        let (a_before, b_before) = (a.clone(), b.clone());

        let err = merge_shapes(&[a.clone(), b.clone()]).unwrap_err();
        assert_eq!(
            err,
            RoiError::PlaneMismatch {
                first: a.id(),
                second: b.id(),
                first_plane: ImagePlane::at(0, 0),
                second_plane: ImagePlane::at(1, 0),
            }
        );
        assert_eq!(a, a_before);
        assert_eq!(b, b_before);
    }

    #[test]
    fn test_merge_different_classes_fails() {
        let a = RoiShape::rect(0.0, 0.0, 10.0, 10.0).with_class("Positive");
        let b = RoiShape::rect(5.0, 5.0, 10.0, 10.0).with_class("Negative");
        assert!(matches!(
            merge_shapes(&[a, b]),
            Err(RoiError::ClassMismatch { .. })
        ));
    }

    #[test]
    fn test_merge_disjoint_fails() {
        let a = RoiShape::rect(0.0, 0.0, 1.0, 1.0);
        let b = RoiShape::rect(5.0, 5.0, 1.0, 1.0);
        let err = merge_shapes(&[a.clone(), b.clone()]).unwrap_err();
        assert_eq!(err.shape_ids(), vec![a.id(), b.id()]);
    }

    #[test]
    fn test_merge_nothing() {
        assert_eq!(merge_shapes(&[]).unwrap_err(), RoiError::EmptyMerge);
    }

    #[test]
    fn test_merge_single_shape_is_a_copy() {
        let a = RoiShape::rect(0.0, 0.0, 3.0, 3.0).with_name("solo");
        let merged = merge_shapes(std::slice::from_ref(&a)).unwrap();
        assert!((area(&merged).unwrap() - 9.0).abs() < 1e-6);
        assert_eq!(merged.name, a.name);
    }
}
