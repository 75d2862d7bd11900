//! Overlap resolution between expanded shapes.
//!
//! Shapes wait in a worklist. Each pass pops the front shape and looks for
//! the first remaining shape that intersects it, touching boundaries
//! included:
//!
//! - no contact: the shape is final and goes to `keep`;
//! - same class: both are replaced by their union, which rejoins the back
//!   of the worklist since it may now overlap something else. Same-class
//!   shapes that meet only at a point have no single-ring union and are
//!   left apart;
//! - different classes: the [`PriorityPolicy`] either drops both or drops
//!   the loser and sends the winner to the back of the worklist.
//!
//! Every pass removes at least one shape from the worklist, so the number of
//! passes never exceeds the number of inputs.

use crate::error::{RoiError, RoiResult};
use crate::geometry::{Contact, bounds_touch, contact, to_polygon};
use crate::merge::merge_parts;
use crate::policy::{PriorityPolicy, Verdict};
use crate::shapes::{ClassLabel, RoiShape};
use geo::Polygon;
use kurbo::Rect;
use std::collections::VecDeque;

/// Final shapes plus the inputs they supersede.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Conflict-free shapes: untouched inputs and merged shapes.
    pub keep: Vec<RoiShape>,
    /// Inputs that were merged away or excluded, in input order.
    pub discard: Vec<RoiShape>,
    pub stats: ResolveStats,
}

/// Counters describing one resolution run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    pub passes: usize,
    pub merges: usize,
    pub exclusions: usize,
}

/// A shape waiting in the worklist with its cached geometry.
struct Candidate {
    shape: RoiShape,
    polygon: Polygon<f64>,
    bounds: Rect,
    /// Indices of the inputs this candidate stands for.
    sources: Vec<usize>,
}

impl Candidate {
    fn class(&self) -> Option<&ClassLabel> {
        self.shape.class.as_ref()
    }

    /// Earliest input this candidate stands for.
    fn first_source(&self) -> usize {
        self.sources.iter().copied().min().unwrap_or(usize::MAX)
    }

    /// Merge with a same-class candidate, keeping input order for metadata.
    fn merge(&self, other: &Candidate) -> RoiResult<Candidate> {
        let (first, second) = if self.first_source() <= other.first_source() {
            (self, other)
        } else {
            (other, self)
        };
        let (shape, polygon) = merge_parts(&[
            (&first.shape, first.polygon.clone()),
            (&second.shape, second.polygon.clone()),
        ])?;
        let mut sources = first.sources.clone();
        sources.extend_from_slice(&second.sources);
        Ok(Candidate {
            bounds: shape.bounds(),
            shape,
            polygon,
            sources,
        })
    }
}

/// What the current candidate runs into.
enum Conflict {
    /// Same class: `merged` replaces both.
    Merge { index: usize, merged: Candidate },
    /// Different classes: the policy decides.
    Contest { index: usize },
}

/// First remaining candidate that `current` must be reconciled with.
fn find_conflict(current: &Candidate, pending: &VecDeque<Candidate>) -> RoiResult<Option<Conflict>> {
    for (index, other) in pending.iter().enumerate() {
        if !bounds_touch(current.bounds, other.bounds) {
            continue;
        }
        let touch = contact(&current.polygon, &other.polygon);
        if touch == Contact::Disjoint {
            continue;
        }
        if current.class() != other.class() {
            return Ok(Some(Conflict::Contest { index }));
        }
        if touch == Contact::Point {
            log::debug!(
                "Shapes {} and {} meet at a point only, keeping them apart",
                current.shape.id(),
                other.shape.id()
            );
            continue;
        }
        let merged = current.merge(other)?;
        return Ok(Some(Conflict::Merge { index, merged }));
    }
    Ok(None)
}

/// Resolve overlaps between `shapes` until no two remaining shapes intersect.
///
/// Contact is tested on the outlines alone, whatever the image plane. Two
/// intersecting shapes of different classes on different planes are
/// settled by `policy` like any other pair, while a same-class pair on
/// different planes cannot be merged and fails the call.
///
/// Fails without a partial result when an input is malformed, when a
/// same-class merge crosses image planes, or when `policy` has no rule for an
/// intersecting class pair.
pub fn resolve<P>(shapes: &[RoiShape], policy: &P) -> RoiResult<Resolution>
where
    P: PriorityPolicy + ?Sized,
{
    let mut pending = shapes
        .iter()
        .enumerate()
        .map(|(index, shape)| {
            Ok(Candidate {
                polygon: to_polygon(shape)?,
                bounds: shape.bounds(),
                shape: shape.clone(),
                sources: vec![index],
            })
        })
        .collect::<RoiResult<VecDeque<_>>>()?;

    let mut keep = Vec::new();
    let mut superseded = vec![false; shapes.len()];
    let mut stats = ResolveStats::default();
    let mut discard_all = |candidate: &Candidate| {
        for &index in &candidate.sources {
            superseded[index] = true;
        }
    };

    while let Some(current) = pending.pop_front() {
        stats.passes += 1;

        let index = match find_conflict(&current, &pending)? {
            None => {
                log::debug!("Shape {} has no conflicts", current.shape.id());
                keep.push(current.shape);
                continue;
            }
            Some(Conflict::Merge { index, merged }) => {
                if let Some(other) = pending.remove(index) {
                    log::debug!(
                        "Merged {} and {} into {}",
                        current.shape.id(),
                        other.shape.id(),
                        merged.shape.id()
                    );
                    discard_all(&other);
                }
                discard_all(&current);
                stats.merges += 1;
                pending.push_back(merged);
                continue;
            }
            Some(Conflict::Contest { index }) => index,
        };
        let Some(other) = pending.remove(index) else {
            keep.push(current.shape);
            continue;
        };

        let Some(verdict) = policy.verdict(current.class(), other.class()) else {
            return Err(RoiError::UnsupportedClassCount {
                first: current.shape.id(),
                second: other.shape.id(),
                first_class: current.shape.class.clone(),
                second_class: other.shape.class.clone(),
            });
        };
        log::debug!(
            "{:?} for {} and {}",
            verdict,
            current.shape.id(),
            other.shape.id()
        );

        match verdict {
            Verdict::ExcludeBoth => {
                discard_all(&current);
                discard_all(&other);
                stats.exclusions += 2;
            }
            Verdict::KeepFirst => {
                discard_all(&other);
                stats.exclusions += 1;
                pending.push_back(current);
            }
            Verdict::KeepSecond => {
                discard_all(&current);
                stats.exclusions += 1;
                pending.push_back(other);
            }
        }
    }

    let discard: Vec<RoiShape> = shapes
        .iter()
        .zip(&superseded)
        .filter(|(_, superseded)| **superseded)
        .map(|(shape, _)| shape.clone())
        .collect();

    log::info!(
        "Resolved {} shapes: {} kept, {} discarded, {} merges, {} exclusions in {} passes",
        shapes.len(),
        keep.len(),
        discard.len(),
        stats.merges,
        stats.exclusions,
        stats.passes
    );

    Ok(Resolution {
        keep,
        discard,
        stats,
    })
}
