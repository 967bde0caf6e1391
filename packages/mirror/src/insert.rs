//! Where a newly drawn element lands.

use crate::dom::{LiveDocument, NodeId};
use serde::{Deserialize, Serialize};
use tandem_semantics::Position;

/// Tags that only ever hold phrasing content
pub const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "br", "cite", "code", "data", "dfn", "em", "i", "kbd",
    "label", "mark", "q", "s", "samp", "small", "span", "strong", "sub", "sup", "time", "u",
    "var",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertTarget {
    pub target_oid: String,
    pub position: Position,
}

pub fn is_inline_tag(tag: &str) -> bool {
    INLINE_TAGS.contains(&tag)
}

/// The block-level element under the point, as an append target
pub fn resolve_insert_target(doc: &LiveDocument, x: f64, y: f64) -> Option<InsertTarget> {
    let Some(hit) = doc.deep_element_from_point(x, y) else {
        tracing::warn!(x, y, "no element under the insert point");
        return None;
    };

    let container = block_ancestor(doc, hit)?;
    let Some(oid) = doc.oid(container) else {
        tracing::warn!(?container, "insert container has no source id");
        return None;
    };

    Some(InsertTarget {
        target_oid: oid.to_string(),
        position: Position::Append,
    })
}

fn block_ancestor(doc: &LiveDocument, start: NodeId) -> Option<NodeId> {
    let mut current = start;
    while doc.tag_name(current).is_some_and(is_inline_tag) {
        match doc.composed_parent(current) {
            Some(parent) if doc.is_element(parent) => current = parent,
            _ => {
                tracing::warn!(?start, "no block-level ancestor for insert");
                return None;
            }
        }
    }
    Some(current)
}
