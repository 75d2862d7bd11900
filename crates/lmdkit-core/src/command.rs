//! The expand-and-resolve command run against a shape store.

use crate::config::ExpansionConfig;
use crate::error::RoiResult;
use crate::expand::Expander;
use crate::resolve::{ResolveStats, resolve};
use crate::shapes::{RoiShape, ShapeId};
use crate::store::ShapeStore;

/// Summary of one `run_expansion` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionReport {
    /// Detections taken from the selection.
    pub selected: usize,
    /// Shapes produced by the expander.
    pub expanded: usize,
    /// Ids of shapes added to the store.
    pub kept: Vec<ShapeId>,
    /// Number of expanded shapes merged away or excluded.
    pub discarded: usize,
    /// Whether the selection exceeded the notify threshold.
    pub large_selection: bool,
    pub stats: ResolveStats,
}

/// Expand the selected detections, resolve their overlaps and replace them
/// in the store.
///
/// Annotations in the selection are left alone. The store is only written
/// once the whole computation has succeeded.
pub fn run_expansion<S>(store: &mut S, config: &ExpansionConfig) -> RoiResult<ExpansionReport>
where
    S: ShapeStore + ?Sized,
{
    config.validate()?;

    let detections: Vec<RoiShape> = store
        .selected()
        .into_iter()
        .filter(RoiShape::is_detection)
        .collect();
    if detections.is_empty() {
        log::debug!("No detections selected, nothing to expand");
        return Ok(ExpansionReport::default());
    }

    let large_selection = config.is_large_selection(detections.len());
    if large_selection {
        log::info!(
            "Expanding {} detections, this may take a while",
            detections.len()
        );
    }

    let expanded = Expander::new(config.quadrant_segments).expand(&detections, config.radius)?;
    let resolution = resolve(&expanded, &config.priority)?;

    let report = ExpansionReport {
        selected: detections.len(),
        expanded: expanded.len(),
        kept: resolution.keep.iter().map(RoiShape::id).collect(),
        discarded: resolution.discard.len(),
        large_selection,
        stats: resolution.stats,
    };

    let mut removed: Vec<ShapeId> = detections.iter().map(RoiShape::id).collect();
    removed.extend(resolution.discard.iter().map(RoiShape::id));
    store.remove_shapes(&removed);
    store.add_shapes(resolution.keep);
    store.clear_selection();

    log::info!(
        "Expanded {} detections by {} px: {} kept, {} discarded",
        report.selected,
        config.radius,
        report.kept.len(),
        report.discarded
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RoiError;
    use crate::geometry::area;
    use crate::policy::PriorityChoice;
    use crate::shapes::{ImagePlane, ObjectKind};
    use crate::store::RoiDocument;

    fn document_with(shapes: &[RoiShape]) -> RoiDocument {
        let mut doc = RoiDocument::new();
        for shape in shapes {
            doc.add_shape(shape.clone());
            doc.add_to_selection(shape.id());
        }
        doc
    }

    #[test]
    fn test_replaces_selection() {
        let a = RoiShape::rect(0.0, 0.0, 10.0, 10.0).with_class("Positive");
        let b = RoiShape::rect(14.0, 0.0, 10.0, 10.0).with_class("Positive");
        let far = RoiShape::rect(100.0, 100.0, 10.0, 10.0).with_class("Negative");
        let mut doc = document_with(&[a.clone(), b.clone()]);
        doc.add_shape(far.clone());

        let config = ExpansionConfig::default().with_radius(3.0);
        let report = run_expansion(&mut doc, &config).unwrap();

        // The two squares are 4 px apart, so growing each by 3 px makes them overlap.
        assert_eq!(report.selected, 2);
        assert_eq!(report.expanded, 2);
        assert_eq!(report.kept.len(), 1);
        assert_eq!(report.discarded, 2);
        assert_eq!(report.stats.merges, 1);
        assert!(!report.large_selection);

        assert_eq!(doc.len(), 2);
        assert!(doc.get_shape(a.id()).is_none());
        assert!(doc.get_shape(b.id()).is_none());
        assert!(doc.get_shape(far.id()).is_some());
        let merged = doc.get_shape(report.kept[0]).unwrap();
        assert_eq!(merged.class, a.class);
        assert!(area(merged).unwrap() > 2.0 * 100.0);
        assert!(doc.selected_ids().is_empty());
    }

    #[test]
    fn test_empty_selection_is_a_no_op() {
        let mut doc = RoiDocument::new();
        doc.add_shape(RoiShape::rect(0.0, 0.0, 5.0, 5.0));

        let report = run_expansion(&mut doc, &ExpansionConfig::default()).unwrap();
        assert_eq!(report, ExpansionReport::default());
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_annotations_are_left_alone() {
        let annotation = RoiShape::rect(0.0, 0.0, 10.0, 10.0).with_kind(ObjectKind::Annotation);
        let detection = RoiShape::rect(50.0, 50.0, 10.0, 10.0);
        let mut doc = document_with(&[annotation.clone(), detection.clone()]);

        let report = run_expansion(&mut doc, &ExpansionConfig::default()).unwrap();
        assert_eq!(report.selected, 1);
        assert_eq!(doc.get_shape(annotation.id()), Some(&annotation));
        assert!(doc.get_shape(detection.id()).is_none());
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn test_error_leaves_store_untouched() {
        let a = RoiShape::rect(0.0, 0.0, 10.0, 10.0).with_plane(ImagePlane::at(0, 0));
        let b = RoiShape::rect(5.0, 0.0, 10.0, 10.0).with_plane(ImagePlane::at(1, 0));
        let mut doc = document_with(&[a.clone(), b.clone()]);

        let err = run_expansion(&mut doc, &ExpansionConfig::default()).unwrap_err();
        assert!(matches!(err, RoiError::PlaneMismatch { .. }));
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.get_shape(a.id()), Some(&a));
        assert_eq!(doc.get_shape(b.id()), Some(&b));
        assert_eq!(doc.selected_ids(), &[a.id(), b.id()]);
    }

    #[test]
    fn test_invalid_config_is_rejected_first() {
        let a = RoiShape::rect(0.0, 0.0, 10.0, 10.0);
        let mut doc = document_with(std::slice::from_ref(&a));

        let config = ExpansionConfig::default().with_radius(f64::NAN);
        assert!(matches!(
            run_expansion(&mut doc, &config),
            Err(RoiError::NonFiniteRadius(_))
        ));
        assert_eq!(doc.get_shape(a.id()), Some(&a));
    }

    #[test]
    fn test_priority_from_config() {
        let pos = RoiShape::rect(0.0, 0.0, 10.0, 10.0).with_class("Positive");
        let neg = RoiShape::rect(5.0, 0.0, 10.0, 10.0).with_class("Negative");
        let mut doc = document_with(&[pos, neg]);

        let config = ExpansionConfig::default().with_priority(PriorityChoice::ExcludeBoth);
        let report = run_expansion(&mut doc, &config).unwrap();
        assert!(report.kept.is_empty());
        assert_eq!(report.stats.exclusions, 2);
        assert!(doc.is_empty());
    }

    #[test]
    fn test_large_selection_is_flagged() {
        let shapes: Vec<_> = (0..3)
            .map(|i| RoiShape::rect(f64::from(i) * 50.0, 0.0, 5.0, 5.0))
            .collect();
        let mut doc = document_with(&shapes);

        let config = ExpansionConfig {
            notify_threshold: 2,
            ..ExpansionConfig::default()
        };
        let report = run_expansion(&mut doc, &config).unwrap();
        assert!(report.large_selection);
        assert_eq!(report.kept.len(), 3);
        assert_eq!(doc.len(), 3);
    }
}
