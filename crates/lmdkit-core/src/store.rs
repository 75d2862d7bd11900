//! Shape store seam and the in-memory document.

use crate::error::{RoiError, RoiResult};
use crate::shapes::{RoiShape, ShapeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where the expansion command reads its selection and writes its result.
pub trait ShapeStore {
    /// Currently selected shapes, in selection order.
    fn selected(&self) -> Vec<RoiShape>;

    /// Remove shapes by id. Unknown ids are ignored.
    fn remove_shapes(&mut self, ids: &[ShapeId]);

    /// Insert new shapes.
    fn add_shapes(&mut self, shapes: Vec<RoiShape>);

    fn clear_selection(&mut self);
}

/// A document holding ROI shapes and the current selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoiDocument {
    /// All shapes in the document, keyed by ID.
    shapes: HashMap<ShapeId, RoiShape>,
    /// Insertion order of shapes.
    order: Vec<ShapeId>,
    /// Selected shape ids.
    #[serde(skip)]
    selection: Vec<ShapeId>,
}

impl RoiDocument {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a shape to the document.
    pub fn add_shape(&mut self, shape: RoiShape) {
        let id = shape.id();
        if self.shapes.insert(id, shape).is_none() {
            self.order.push(id);
        }
    }

    /// Remove a shape from the document.
    pub fn remove_shape(&mut self, id: ShapeId) -> Option<RoiShape> {
        self.order.retain(|&shape_id| shape_id != id);
        self.selection.retain(|&shape_id| shape_id != id);
        self.shapes.remove(&id)
    }

    /// Get a shape by ID.
    pub fn get_shape(&self, id: ShapeId) -> Option<&RoiShape> {
        self.shapes.get(&id)
    }

    /// Get shapes in insertion order.
    pub fn shapes_ordered(&self) -> impl Iterator<Item = &RoiShape> {
        self.order.iter().filter_map(|id| self.shapes.get(id))
    }

    /// Select a shape (clears previous selection).
    pub fn select(&mut self, id: ShapeId) {
        self.selection.clear();
        self.add_to_selection(id);
    }

    /// Add to selection. Ids not in the document are ignored.
    pub fn add_to_selection(&mut self, id: ShapeId) {
        if self.shapes.contains_key(&id) && !self.selection.contains(&id) {
            self.selection.push(id);
        }
    }

    pub fn selected_ids(&self) -> &[ShapeId] {
        &self.selection
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Serialize the document to JSON. The selection is not saved.
    pub fn to_json(&self) -> RoiResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| RoiError::Serialization(e.to_string()))
    }

    /// Deserialize a document from JSON.
    pub fn from_json(json: &str) -> RoiResult<Self> {
        serde_json::from_str(json).map_err(|e| RoiError::Serialization(e.to_string()))
    }
}

impl ShapeStore for RoiDocument {
    fn selected(&self) -> Vec<RoiShape> {
        self.selection
            .iter()
            .filter_map(|id| self.shapes.get(id))
            .cloned()
            .collect()
    }

    fn remove_shapes(&mut self, ids: &[ShapeId]) {
        for &id in ids {
            self.remove_shape(id);
        }
    }

    fn add_shapes(&mut self, shapes: Vec<RoiShape>) {
        for shape in shapes {
            self.add_shape(shape);
        }
    }

    fn clear_selection(&mut self) {
        self.selection.clear();
    }
}
