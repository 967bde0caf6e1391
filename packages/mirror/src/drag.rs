//! # Drag Controller
//!
//! Reorders an element among its siblings in the live document and reports
//! the result as a `Move` intent.
//!
//! While a drag is active the dragged element stays in place but hidden, and
//! a placeholder stub sized to its box travels between the siblings. The
//! stub carries a helper class, so its child-list churn never reaches the
//! layer tree. Only one drag exists at a time.

use crate::dom::{Display, LiveDocument, NodeId, Style};
use crate::geometry::{insertion_index, resolve_axis, resolve_grid_index, within_snap, Rect};
use tandem_semantics::{
    EditIntent, DOM_CLASS_ATTRIBUTE, DRAG_INDEX_ATTRIBUTE, DRAG_MARKER_ATTRIBUTE, DRAG_STUB_CLASS,
};

#[derive(Debug)]
struct DragSession {
    element: NodeId,
    oid: String,
    parent: NodeId,
    original_index: usize,
    original_rect: Rect,
    original_style: Style,
    stub: NodeId,
}

#[derive(Debug)]
pub struct DragController {
    session: Option<DragSession>,
    snap_threshold: f64,
}

impl Default for DragController {
    fn default() -> Self {
        Self::new(20.0)
    }
}

impl DragController {
    pub fn new(snap_threshold: f64) -> Self {
        Self {
            session: None,
            snap_threshold,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    /// Begin dragging the element with `oid`. Returns its element index.
    pub fn start(&mut self, doc: &mut LiveDocument, oid: &str) -> Option<usize> {
        if self.session.is_some() || !doc.elements_with_attribute(DRAG_MARKER_ATTRIBUTE).is_empty()
        {
            tracing::debug!("tearing down leftover drag");
            self.cancel(doc);
        }

        let Some(element) = doc.find_by_oid(oid) else {
            tracing::warn!(oid, "drag target not found");
            return None;
        };
        let (Some(parent), Some(original_index)) = (doc.parent(element), doc.element_index(element))
        else {
            tracing::warn!(oid, "drag target has no parent element");
            return None;
        };

        let original_rect = doc.rect(element);
        let original_style = doc.style(element);

        let stub = doc.create_element("div");
        doc.set_attribute(stub, DOM_CLASS_ATTRIBUTE, DRAG_STUB_CLASS);
        doc.set_rect(stub, original_rect);
        if let Err(error) = doc.insert_before(parent, stub, Some(element)) {
            tracing::warn!(oid, %error, "could not place drag stub");
            return None;
        }

        doc.set_attribute(element, DRAG_MARKER_ATTRIBUTE, "true");
        doc.set_attribute(element, DRAG_INDEX_ATTRIBUTE, &original_index.to_string());
        doc.set_style(element, Style::hidden());

        self.session = Some(DragSession {
            element,
            oid: oid.to_string(),
            parent,
            original_index,
            original_rect,
            original_style,
            stub,
        });
        Some(original_index)
    }

    /// Move the stub to follow the pointer. Returns the index the element
    /// would take among its siblings.
    pub fn drag(&mut self, doc: &mut LiveDocument, x: f64, y: f64) -> Option<usize> {
        let session = self.session.as_ref()?;
        let others: Vec<NodeId> = siblings(doc, session)
            .into_iter()
            .filter(|s| *s != session.stub)
            .collect();

        let index = if within_snap(session.original_rect, x, y, self.snap_threshold) {
            session.original_index
        } else {
            match doc.style(session.parent).display {
                Display::Grid { columns, rows } => {
                    resolve_grid_index(doc.rect(session.parent), columns, rows, x, y)
                }
                _ => {
                    let rects: Vec<Rect> = others.iter().map(|s| doc.rect(*s)).collect();
                    insertion_index(&rects, resolve_axis(&rects), x, y)
                }
            }
        };
        let index = index.min(others.len());

        let reference = others.get(index).copied();
        if let Err(error) = doc.insert_before(session.parent, session.stub, reference) {
            tracing::warn!(%error, "could not move drag stub");
            return None;
        }
        Some(index)
    }

    /// Drop the element where the stub is. Yields a `Move` when the index changed.
    pub fn end(&mut self, doc: &mut LiveDocument) -> Option<EditIntent> {
        let session = self.session.take()?;
        let new_index = siblings(doc, &session)
            .iter()
            .position(|s| *s == session.stub)
            .unwrap_or(session.original_index);

        let dropped = new_index == session.original_index
            || doc
                .insert_before(session.parent, session.element, Some(session.stub))
                .map_err(|error| {
                    tracing::warn!(oid = %session.oid, %error, "could not drop dragged element");
                })
                .is_ok();
        restore(doc, &session);

        // the live tree must agree with any move reported to the host
        if !dropped {
            return None;
        }
        if new_index == session.original_index {
            tracing::debug!(oid = %session.oid, "drag ended at its origin");
            return None;
        }
        Some(EditIntent::Move {
            oid: session.oid,
            new_index: new_index as i64,
        })
    }

    /// Abort the drag and tear down anything a previous drag left behind
    pub fn cancel(&mut self, doc: &mut LiveDocument) {
        if let Some(session) = self.session.take() {
            restore(doc, &session);
        }

        for leftover in doc.elements_with_attribute(DRAG_MARKER_ATTRIBUTE) {
            doc.remove_attribute(leftover, DRAG_MARKER_ATTRIBUTE);
            doc.remove_attribute(leftover, DRAG_INDEX_ATTRIBUTE);
            doc.set_style(leftover, Style::default());
        }
        for stub in doc.descendants(doc.root()) {
            if doc.has_class(stub, DRAG_STUB_CLASS) {
                doc.remove(stub);
            }
        }
    }
}

/// Element siblings of the dragged element, stub included, dragged element excluded
fn siblings(doc: &LiveDocument, session: &DragSession) -> Vec<NodeId> {
    doc.element_children(session.parent)
        .into_iter()
        .filter(|c| *c != session.element)
        .collect()
}

fn restore(doc: &mut LiveDocument, session: &DragSession) {
    doc.remove(session.stub);
    doc.remove_attribute(session.element, DRAG_MARKER_ATTRIBUTE);
    doc.remove_attribute(session.element, DRAG_INDEX_ATTRIBUTE);
    doc.set_style(session.element, session.original_style);
}
