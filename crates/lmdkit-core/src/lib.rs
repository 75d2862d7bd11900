//! lmdkit Core Library
//!
//! Region-of-interest expansion and overlap resolution for classified
//! detections on an image plane.

pub mod command;
pub mod config;
pub mod error;
pub mod expand;
pub mod geometry;
pub mod merge;
pub mod policy;
pub mod resolve;
pub mod shapes;
pub mod store;

pub use command::{ExpansionReport, run_expansion};
pub use config::ExpansionConfig;
pub use error::{GeometryIssue, RoiError, RoiResult};
pub use expand::{Expander, QUADRANT_SEGMENTS, expand};
pub use geometry::{AREA_EPSILON, Contact};
pub use merge::merge_shapes;
pub use policy::{PairwisePolicy, PriorityChoice, PriorityPolicy, Verdict};
pub use resolve::{Resolution, ResolveStats, resolve};
pub use shapes::{ClassLabel, ImagePlane, ObjectKind, RoiShape, SerializableColor, ShapeId};
pub use store::{RoiDocument, ShapeStore};
