//! In-place text editing session.
//!
//! Only the element's first direct text node is edited, the same node the
//! source side rewrites for `UpdateText`. Element children stay in place.
//! Without such a node, the first edit prepends one.

use crate::dom::{LiveDocument, NodeId};
use tandem_semantics::{EditIntent, EDITING_TEXT_ATTRIBUTE};

#[derive(Debug)]
struct TextSession {
    element: NodeId,
    oid: String,
    text_node: Option<NodeId>,
    /// Text node created by this session
    created: bool,
    /// Raw value of the text node when the session started
    original: String,
}

impl TextSession {
    /// Whitespace around the original text, kept across edits
    fn padding(&self) -> (&str, &str) {
        let trimmed_start = self.original.trim_start();
        let lead = &self.original[..self.original.len() - trimmed_start.len()];
        let trail = &trimmed_start[trimmed_start.trim_end().len()..];
        (lead, trail)
    }
}

#[derive(Debug, Default)]
pub struct TextEditor {
    session: Option<TextSession>,
}

impl TextEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_editing(&self) -> bool {
        self.session.is_some()
    }

    /// Begin editing. Returns the text being edited, empty when the element
    /// has no direct text yet. A session already in progress is cancelled
    /// first.
    pub fn start(&mut self, doc: &mut LiveDocument, oid: &str) -> Option<String> {
        if self.session.is_some() {
            tracing::debug!(oid, "cancelling previous text edit");
            self.cancel(doc);
        }

        let Some(element) = doc.find_by_oid(oid) else {
            tracing::warn!(oid, "text edit target not found");
            return None;
        };

        let text_node = doc.first_text_child(element);
        let original = text_node
            .and_then(|node| doc.text(node))
            .unwrap_or_default()
            .to_string();
        doc.set_attribute(element, EDITING_TEXT_ATTRIBUTE, "true");

        let text = original.trim().to_string();
        self.session = Some(TextSession {
            element,
            oid: oid.to_string(),
            text_node,
            created: false,
            original,
        });
        Some(text)
    }

    /// Replace the text being edited
    pub fn edit(&mut self, doc: &mut LiveDocument, text: &str) -> bool {
        let Some(session) = &mut self.session else {
            tracing::warn!("edit without an active text session");
            return false;
        };

        let node = match session.text_node {
            Some(node) => node,
            None => {
                let node = doc.create_text("");
                let first = doc.children(session.element).first().copied();
                if let Err(error) = doc.insert_before(session.element, node, first) {
                    tracing::warn!(oid = %session.oid, %error, "could not add text");
                    return false;
                }
                session.text_node = Some(node);
                session.created = true;
                node
            }
        };

        let (lead, trail) = session.padding();
        let value = format!("{lead}{text}{trail}");
        match doc.set_text(node, &value) {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(oid = %session.oid, %error, "could not update text");
                false
            }
        }
    }

    /// Finish editing. Yields `UpdateText` when the text changed.
    pub fn stop(&mut self, doc: &mut LiveDocument) -> Option<EditIntent> {
        let session = self.session.take()?;
        doc.remove_attribute(session.element, EDITING_TEXT_ATTRIBUTE);

        let text = session
            .text_node
            .and_then(|node| doc.text(node))
            .unwrap_or_default()
            .trim()
            .to_string();
        if text == session.original.trim() {
            if session.created {
                if let Some(node) = session.text_node {
                    doc.remove(node);
                }
            }
            return None;
        }
        Some(EditIntent::UpdateText {
            oid: session.oid,
            text,
        })
    }

    /// Abandon the edit and put the original text back
    pub fn cancel(&mut self, doc: &mut LiveDocument) {
        let Some(session) = self.session.take() else {
            return;
        };
        doc.remove_attribute(session.element, EDITING_TEXT_ATTRIBUTE);

        let Some(node) = session.text_node else {
            return;
        };
        if session.created {
            doc.remove(node);
        } else if let Err(error) = doc.set_text(node, &session.original) {
            tracing::warn!(oid = %session.oid, %error, "could not restore text");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_semantics::OID_ATTRIBUTE;

    fn heading(text: &str) -> LiveDocument {
        let mut doc = LiveDocument::new();
        let body = doc.body();
        let h1 = doc.create_element("h1");
        doc.set_attribute(h1, OID_ATTRIBUTE, "t");
        let text = doc.create_text(text);
        doc.append_child(h1, text).unwrap();
        doc.append_child(body, h1).unwrap();
        doc
    }

    #[test]
    fn test_changed_text_yields_update() {
        let mut doc = heading("Hello");
        let mut editor = TextEditor::new();
        assert_eq!(editor.start(&mut doc, "t").as_deref(), Some("Hello"));
        let h1 = doc.find_by_oid("t").unwrap();
        assert!(doc.has_attribute(h1, EDITING_TEXT_ATTRIBUTE));

        assert!(editor.edit(&mut doc, "Hello there"));
        assert_eq!(
            editor.stop(&mut doc),
            Some(EditIntent::UpdateText {
                oid: "t".to_string(),
                text: "Hello there".to_string()
            })
        );
        assert!(!doc.has_attribute(h1, EDITING_TEXT_ATTRIBUTE));
        assert!(!editor.is_editing());
    }

    #[test]
    fn test_unchanged_text_yields_nothing() {
        let mut doc = heading("Hello");
        let mut editor = TextEditor::new();
        editor.start(&mut doc, "t");
        editor.edit(&mut doc, "Hello");
        assert_eq!(editor.stop(&mut doc), None);
    }

    #[test]
    fn test_restart_restores_previous_text() {
        let mut doc = heading("Hello");
        let mut editor = TextEditor::new();
        editor.start(&mut doc, "t");
        editor.edit(&mut doc, "Draft");
        editor.start(&mut doc, "t");

        let h1 = doc.find_by_oid("t").unwrap();
        assert_eq!(doc.text_content(h1), "Hello");
        assert!(editor.is_editing());
        assert_eq!(editor.stop(&mut doc), None);
    }

    #[test]
    fn test_mixed_content_keeps_element_children() {
        let mut doc = LiveDocument::new();
        let body = doc.body();
        let p = doc.create_element("p");
        doc.set_attribute(p, OID_ATTRIBUTE, "p");
        let hello = doc.create_text("Hello ");
        let b = doc.create_element("b");
        let world = doc.create_text("world");
        doc.append_child(b, world).unwrap();
        doc.append_child(p, hello).unwrap();
        doc.append_child(p, b).unwrap();
        doc.append_child(body, p).unwrap();

        let mut editor = TextEditor::new();
        assert_eq!(editor.start(&mut doc, "p").as_deref(), Some("Hello"));
        assert!(editor.edit(&mut doc, "Hi"));

        assert_eq!(doc.children(p), &[hello, b]);
        assert_eq!(doc.text_content(p), "Hi world");
        assert_eq!(
            editor.stop(&mut doc),
            Some(EditIntent::UpdateText {
                oid: "p".to_string(),
                text: "Hi".to_string()
            })
        );
    }

    #[test]
    fn test_text_is_prepended_when_element_has_none() {
        let mut doc = LiveDocument::new();
        let body = doc.body();
        let div = doc.create_element("div");
        doc.set_attribute(div, OID_ATTRIBUTE, "x1");
        let span = doc.create_element("span");
        doc.append_child(div, span).unwrap();
        doc.append_child(body, div).unwrap();

        let mut editor = TextEditor::new();
        assert_eq!(editor.start(&mut doc, "x1").as_deref(), Some(""));
        assert!(editor.edit(&mut doc, "bye"));
        assert_eq!(doc.children(div).len(), 2);
        assert_eq!(doc.children(div)[1], span);

        editor.cancel(&mut doc);
        assert_eq!(doc.children(div), &[span]);
    }

    #[test]
    fn test_edit_without_session_is_a_no_op() {
        let mut doc = heading("Hello");
        let mut editor = TextEditor::new();
        assert!(!editor.edit(&mut doc, "x"));
        assert_eq!(editor.stop(&mut doc), None);
        assert_eq!(editor.start(&mut doc, "ghost"), None);
    }
}
