//! Error types for shape processing.

use crate::shapes::{ClassLabel, ImagePlane, ShapeId, class_name};
use thiserror::Error;

/// What is wrong with a shape's geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeometryIssue {
    #[error("needs at least 3 distinct points, found {0}")]
    TooFewPoints(usize),
    #[error("contains a non-finite coordinate")]
    NonFiniteCoordinate,
    #[error("encloses no area")]
    ZeroArea,
    #[error("boundary intersects itself")]
    SelfIntersecting,
}

/// Errors raised while expanding, merging or resolving shapes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoiError {
    #[error("Shapes {first} and {second} are on different image planes ({first_plane} vs {second_plane})")]
    PlaneMismatch {
        first: ShapeId,
        second: ShapeId,
        first_plane: ImagePlane,
        second_plane: ImagePlane,
    },
    #[error("Invalid geometry for shape {shape}: {issue}")]
    InvalidGeometry { shape: ShapeId, issue: GeometryIssue },
    #[error(
        "No priority rule for classes {} and {} (shapes {first}, {second})",
        class_name(.first_class),
        class_name(.second_class)
    )]
    UnsupportedClassCount {
        first: ShapeId,
        second: ShapeId,
        first_class: Option<ClassLabel>,
        second_class: Option<ClassLabel>,
    },
    #[error("Cannot merge shapes {first} and {second} of different classes")]
    ClassMismatch { first: ShapeId, second: ShapeId },
    #[error("Union of shapes {shapes:?} does not form a single region")]
    DisjointMerge { shapes: Vec<ShapeId> },
    #[error("No shapes to merge")]
    EmptyMerge,
    #[error("Expansion radius must be finite, got {0}")]
    NonFiniteRadius(f64),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RoiError {
    pub(crate) fn invalid(shape: ShapeId, issue: GeometryIssue) -> Self {
        Self::InvalidGeometry { shape, issue }
    }

    /// Shapes the error refers to, for callers that want to highlight them.
    pub fn shape_ids(&self) -> Vec<ShapeId> {
        match self {
            Self::PlaneMismatch { first, second, .. }
            | Self::UnsupportedClassCount { first, second, .. }
            | Self::ClassMismatch { first, second } => vec![*first, *second],
            Self::InvalidGeometry { shape, .. } => vec![*shape],
            Self::DisjointMerge { shapes } => shapes.clone(),
            Self::EmptyMerge
            | Self::NonFiniteRadius(_)
            | Self::InvalidConfig(_)
            | Self::Serialization(_) => Vec::new(),
        }
    }
}

/// Result type for shape operations.
pub type RoiResult<T> = Result<T, RoiError>;
