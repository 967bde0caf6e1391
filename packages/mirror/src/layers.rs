//! # Layer Tree
//!
//! Builds the layer tree the host shows in its layers panel.
//!
//! The walk is pre-order over element nodes. A rejected node takes its whole
//! subtree with it. Each accepted node is attached to the nearest accepted
//! ancestor by popping a stack until its top contains the node.

use crate::config::MirrorConfig;
use crate::dom::{ensure_uuid, LiveDocument, NodeId};
use serde::{Deserialize, Serialize};

/// Tags that never paint
pub const NON_RENDERED_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "meta", "link", "head",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerNode {
    pub source_id: Option<String>,
    pub runtime_id: String,
    pub tag_name: String,
    pub text_snippet: Option<String>,
    pub children: Vec<LayerNode>,
}

impl LayerNode {
    /// Pre-order iterator over this node and its descendants
    pub fn iter(&self) -> impl Iterator<Item = &LayerNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(next.children.iter().rev());
            Some(next)
        })
    }
}

/// Whether `node` is an editor helper the mirror must not report
pub fn is_ignored(doc: &LiveDocument, node: NodeId, config: &MirrorConfig) -> bool {
    doc.classes(node).any(|c| config.is_ignored_class(c))
        || doc
            .attribute(node, "id")
            .is_some_and(|id| config.is_ignored_id(id))
}

fn is_valid(doc: &LiveDocument, node: NodeId, config: &MirrorConfig) -> bool {
    let Some(tag) = doc.tag_name(node) else {
        return false;
    };
    !NON_RENDERED_TAGS.contains(&tag)
        && !doc.style(node).is_hidden()
        && !is_ignored(doc, node, config)
}

pub fn scan(doc: &mut LiveDocument, root: NodeId) -> Option<LayerNode> {
    scan_with(doc, root, &MirrorConfig::default())
}

pub fn scan_with(doc: &mut LiveDocument, root: NodeId, config: &MirrorConfig) -> Option<LayerNode> {
    if !is_valid(doc, root, config) {
        return None;
    }

    let visited = walk(doc, root, config);
    let mut stack: Vec<(NodeId, LayerNode)> = Vec::with_capacity(visited.len());

    for node in visited {
        let layer = layer_for(doc, node, config)?;
        while stack.len() > 1 && !doc.contains(stack[stack.len() - 1].0, node) {
            fold(&mut stack);
        }
        stack.push((node, layer));
    }

    while stack.len() > 1 {
        fold(&mut stack);
    }
    stack.pop().map(|(_, layer)| layer)
}

fn fold(stack: &mut Vec<(NodeId, LayerNode)>) {
    if let Some((_, child)) = stack.pop() {
        if let Some((_, parent)) = stack.last_mut() {
            parent.children.push(child);
        }
    }
}

/// Accepted nodes under `root` in pre-order, `root` first
fn walk(doc: &LiveDocument, root: NodeId, config: &MirrorConfig) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut pending = vec![root];
    while let Some(node) = pending.pop() {
        out.push(node);
        for child in doc.children(node).iter().rev() {
            if is_valid(doc, *child, config) {
                pending.push(*child);
            }
        }
    }
    out
}

fn layer_for(doc: &mut LiveDocument, node: NodeId, config: &MirrorConfig) -> Option<LayerNode> {
    let runtime_id = ensure_uuid(doc, node)?;
    let text = doc.direct_text(node);
    let text = text.trim();
    let text_snippet = if text.is_empty() {
        None
    } else {
        Some(text.chars().take(config.text_snippet_limit).collect())
    };

    Some(LayerNode {
        source_id: doc.oid(node).map(str::to_string),
        runtime_id,
        tag_name: doc.tag_name(node).unwrap_or_default().to_string(),
        text_snippet,
        children: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Style;
    use tandem_semantics::{DRAG_STUB_CLASS, OID_ATTRIBUTE, UUID_ATTRIBUTE};

    fn child(doc: &mut LiveDocument, parent: NodeId, tag: &str, oid: Option<&str>) -> NodeId {
        let id = doc.create_element(tag);
        if let Some(oid) = oid {
            doc.set_attribute(id, OID_ATTRIBUTE, oid);
        }
        doc.append_child(parent, id).unwrap();
        id
    }

    #[test]
    fn test_scan_builds_nested_layers() {
        let mut doc = LiveDocument::new();
        let body = doc.body();
        let main = child(&mut doc, body, "main", Some("m"));
        let header = child(&mut doc, main, "header", Some("h"));
        child(&mut doc, header, "h1", Some("t"));
        child(&mut doc, main, "section", Some("s"));

        let layer = scan(&mut doc, body).unwrap();
        assert_eq!(layer.tag_name, "body");
        assert_eq!(layer.source_id, None);
        let main_layer = &layer.children[0];
        assert_eq!(main_layer.source_id.as_deref(), Some("m"));
        let oids: Vec<_> = main_layer
            .children
            .iter()
            .map(|l| l.source_id.as_deref().unwrap())
            .collect();
        assert_eq!(oids, vec!["h", "s"]);
        assert_eq!(main_layer.children[0].children[0].source_id.as_deref(), Some("t"));
        assert!(doc.has_attribute(main, UUID_ATTRIBUTE));
    }

    #[test]
    fn test_text_snippet_is_direct_trimmed_and_capped() {
        let mut doc = LiveDocument::new();
        let body = doc.body();
        let p = child(&mut doc, body, "p", Some("p"));
        let text = doc.create_text(&format!("  {}  ", "x".repeat(600)));
        doc.append_child(p, text).unwrap();
        let b = child(&mut doc, p, "b", None);
        let nested = doc.create_text("nested");
        doc.append_child(b, nested).unwrap();

        let layer = scan(&mut doc, p).unwrap();
        assert_eq!(layer.text_snippet.as_deref().map(str::len), Some(500));
        assert_eq!(layer.children[0].text_snippet.as_deref(), Some("nested"));
    }

    #[test]
    fn test_rejected_subtrees_are_skipped() {
        let mut doc = LiveDocument::new();
        let body = doc.body();
        child(&mut doc, body, "script", None);
        let hidden = child(&mut doc, body, "div", Some("hidden"));
        child(&mut doc, hidden, "span", Some("under-hidden"));
        doc.set_style(hidden, Style::hidden());
        let stub = child(&mut doc, body, "div", None);
        doc.set_attribute(stub, "class", DRAG_STUB_CLASS);
        child(&mut doc, body, "div", Some("kept"));

        let layer = scan(&mut doc, body).unwrap();
        let oids: Vec<_> = layer.iter().filter_map(|l| l.source_id.as_deref()).collect();
        assert_eq!(oids, vec!["kept"]);

        assert!(scan(&mut doc, hidden).is_none());
        assert!(scan(&mut doc, stub).is_none());
    }

    #[test]
    fn test_serializes_camel_case() {
        let mut doc = LiveDocument::new();
        let body = doc.body();
        child(&mut doc, body, "div", Some("d"));
        let layer = scan(&mut doc, body).unwrap();
        let json = serde_json::to_value(&layer).unwrap();
        assert_eq!(json["tagName"], "body");
        assert_eq!(json["children"][0]["sourceId"], "d");
        assert!(json["children"][0]["runtimeId"].is_string());
        assert!(json["textSnippet"].is_null());
    }
}
