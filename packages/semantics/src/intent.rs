//! # Edit Intents
//!
//! Structured descriptions of one requested source mutation, keyed by `oid`.
//!
//! Intents are produced by the live mirror (drag end, text edit, group
//! resolution) or by the host, travel over the transport as JSON, and are
//! applied per file by the transform engine. They never carry runtime ids.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where an inserted element lands.
///
/// `Append`, `Prepend` and `Index` are relative to the target as parent;
/// `Before` and `After` are relative to the target inside its own parent.
/// `Index` counts element children only (text, comments and expression
/// containers are skipped), identically on the live and the source side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Position {
    Append,
    Prepend,
    Before,
    After,
    Index { index: i64 },
}

impl Position {
    pub fn index(index: i64) -> Self {
        Position::Index { index }
    }
}

/// Structured description of a new element
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSpec {
    pub tag_name: String,
    /// Pre-assigned source id, so the live and source copies agree
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oid: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    #[serde(default)]
    pub children: Vec<ElementSpec>,
}

impl ElementSpec {
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            ..Default::default()
        }
    }

    pub fn with_oid(mut self, oid: impl Into<String>) -> Self {
        self.oid = Some(oid.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: ElementSpec) -> Self {
        self.children.push(child);
        self
    }
}

/// Content of an `Insert` intent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InsertPayload {
    /// Pre-serialized markup, reparsed and re-tagged on insert
    Markup { markup: String },
    /// Structured tag/attributes/children description
    Element { element: ElementSpec },
}

/// The container created by a `Group` intent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSpec {
    pub tag_name: String,
    pub oid: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl ContainerSpec {
    pub fn new(tag_name: impl Into<String>, oid: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            oid: oid.into(),
            attributes: BTreeMap::new(),
        }
    }
}

/// One requested mutation, keyed by source id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum EditIntent {
    Insert {
        target_oid: String,
        position: Position,
        payload: InsertPayload,
    },
    Remove {
        oid: String,
    },
    Move {
        oid: String,
        new_index: i64,
    },
    Group {
        parent_oid: String,
        index: i64,
        container: ContainerSpec,
        member_oids: Vec<String>,
    },
    Ungroup {
        container_oid: String,
    },
    UpdateText {
        oid: String,
        text: String,
    },
    UpdateAttributes {
        oid: String,
        attributes: BTreeMap<String, String>,
        #[serde(default)]
        override_class_name: bool,
    },
    InsertImage {
        oid: String,
        file_name: String,
        bytes: Vec<u8>,
    },
    RemoveImage {
        oid: String,
    },
}

impl EditIntent {
    /// Every source id this intent must find in the tree
    pub fn target_oids(&self) -> Vec<&str> {
        match self {
            EditIntent::Insert { target_oid, .. } => vec![target_oid],
            EditIntent::Remove { oid }
            | EditIntent::Move { oid, .. }
            | EditIntent::UpdateText { oid, .. }
            | EditIntent::UpdateAttributes { oid, .. }
            | EditIntent::InsertImage { oid, .. }
            | EditIntent::RemoveImage { oid } => vec![oid],
            EditIntent::Group {
                parent_oid,
                member_oids,
                ..
            } => std::iter::once(parent_oid.as_str())
                .chain(member_oids.iter().map(String::as_str))
                .collect(),
            EditIntent::Ungroup { container_oid } => vec![container_oid],
        }
    }

    /// Whether this intent changes a parent's child list
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            EditIntent::Insert { .. }
                | EditIntent::Remove { .. }
                | EditIntent::Move { .. }
                | EditIntent::Group { .. }
                | EditIntent::Ungroup { .. }
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            EditIntent::Insert { .. } => "insert",
            EditIntent::Remove { .. } => "remove",
            EditIntent::Move { .. } => "move",
            EditIntent::Group { .. } => "group",
            EditIntent::Ungroup { .. } => "ungroup",
            EditIntent::UpdateText { .. } => "update-text",
            EditIntent::UpdateAttributes { .. } => "update-attributes",
            EditIntent::InsertImage { .. } => "insert-image",
            EditIntent::RemoveImage { .. } => "remove-image",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_wire_format() {
        let intent = EditIntent::Move {
            oid: "b1".to_string(),
            new_index: 2,
        };

        let json = serde_json::to_value(&intent).unwrap();
        assert_eq!(json["type"], "move");
        assert_eq!(json["newIndex"], 2);

        let back: EditIntent = serde_json::from_value(json).unwrap();
        assert_eq!(back, intent);
    }

    #[test]
    fn test_update_attributes_defaults_to_merge() {
        let json = r#"{"type":"update-attributes","oid":"a","attributes":{"className":"p-4"}}"#;
        let intent: EditIntent = serde_json::from_str(json).unwrap();
        match intent {
            EditIntent::UpdateAttributes {
                override_class_name,
                ..
            } => assert!(!override_class_name),
            other => panic!("unexpected intent {:?}", other),
        }
    }

    #[test]
    fn test_group_targets_include_parent_and_members() {
        let intent = EditIntent::Group {
            parent_oid: "p".to_string(),
            index: 1,
            container: ContainerSpec::new("div", "g"),
            member_oids: vec!["c".to_string(), "b".to_string()],
        };
        assert_eq!(intent.target_oids(), vec!["p", "c", "b"]);
        assert!(intent.is_structural());
    }

    #[test]
    fn test_position_index_wire_format() {
        let json = serde_json::to_string(&Position::index(3)).unwrap();
        assert_eq!(json, r#"{"type":"index","index":3}"#);
        let append: Position = serde_json::from_str(r#"{"type":"append"}"#).unwrap();
        assert_eq!(append, Position::Append);
    }
}
