//! Group and ungroup resolution against the live document.
//!
//! The resolvers turn a selection into intents; the `*_elements` functions
//! apply the same edit to the live document so it reflects the change before
//! the source round trip completes.

use crate::dom::{LiveDocument, NodeId};
use serde::{Deserialize, Serialize};
use tandem_semantics::{ContainerSpec, EditIntent, CLASS_NAME_ATTRIBUTE, DOM_CLASS_ATTRIBUTE, OID_ATTRIBUTE};

/// A resolved ungroup: the container's children and the absolute indices
/// they take in the container's parent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UngroupPlan {
    pub container_oid: String,
    pub parent_oid: Option<String>,
    pub children: Vec<(String, usize)>,
}

impl UngroupPlan {
    pub fn intent(&self) -> EditIntent {
        EditIntent::Ungroup {
            container_oid: self.container_oid.clone(),
        }
    }
}

/// Build a `Group` intent for members sharing one parent.
///
/// Members are ordered by their live position and the container takes the
/// index of the first of them.
pub fn resolve_group(
    doc: &LiveDocument,
    member_oids: &[String],
    container: ContainerSpec,
) -> Option<EditIntent> {
    if member_oids.is_empty() {
        tracing::warn!("group requested without members");
        return None;
    }

    let mut members: Vec<(usize, &str)> = Vec::with_capacity(member_oids.len());
    let mut shared_parent: Option<NodeId> = None;

    for oid in member_oids {
        let Some(node) = doc.find_by_oid(oid) else {
            tracing::warn!(%oid, "group member not found");
            return None;
        };
        let (Some(parent), Some(index)) = (doc.parent(node), doc.element_index(node)) else {
            tracing::warn!(%oid, "group member is detached");
            return None;
        };
        match shared_parent {
            Some(existing) if existing != parent => {
                tracing::warn!(%oid, "group members do not share a parent");
                return None;
            }
            _ => shared_parent = Some(parent),
        }
        members.push((index, oid.as_str()));
    }

    let parent = shared_parent?;
    let Some(parent_oid) = doc.oid(parent) else {
        tracing::warn!("group parent has no source id");
        return None;
    };

    members.sort_by_key(|(index, _)| *index);
    members.dedup_by_key(|(index, _)| *index);
    let index = members[0].0;

    Some(EditIntent::Group {
        parent_oid: parent_oid.to_string(),
        index: index as i64,
        container,
        member_oids: members.into_iter().map(|(_, oid)| oid.to_string()).collect(),
    })
}

pub fn resolve_ungroup(doc: &LiveDocument, container_oid: &str) -> Option<UngroupPlan> {
    let Some(container) = doc.find_by_oid(container_oid) else {
        tracing::warn!(container_oid, "ungroup container not found");
        return None;
    };
    let Some(start) = doc.element_index(container) else {
        tracing::warn!(container_oid, "ungroup container is detached");
        return None;
    };

    let children = doc
        .element_children(container)
        .into_iter()
        .enumerate()
        .filter_map(|(offset, child)| Some((doc.oid(child)?.to_string(), start + offset)))
        .collect();

    Some(UngroupPlan {
        container_oid: container_oid.to_string(),
        parent_oid: doc
            .parent(container)
            .and_then(|p| doc.oid(p))
            .map(str::to_string),
        children,
    })
}

/// Apply a `Group` intent to the live document. Returns the new container.
pub fn group_elements(doc: &mut LiveDocument, intent: &EditIntent) -> Option<NodeId> {
    let EditIntent::Group {
        parent_oid,
        index,
        container,
        member_oids,
    } = intent
    else {
        tracing::warn!(kind = intent.kind(), "not a group intent");
        return None;
    };

    let parent = doc.find_by_oid(parent_oid)?;
    let members: Vec<NodeId> = member_oids
        .iter()
        .filter_map(|oid| doc.find_by_oid(oid))
        .filter(|node| doc.parent(*node) == Some(parent))
        .collect();
    if members.len() != member_oids.len() {
        tracing::warn!(%parent_oid, "group members changed before apply");
        return None;
    }

    let element = doc.create_element(&container.tag_name);
    doc.set_attribute(element, OID_ATTRIBUTE, &container.oid);
    for (name, value) in &container.attributes {
        let name = if name == CLASS_NAME_ATTRIBUTE {
            DOM_CLASS_ATTRIBUTE
        } else {
            name.as_str()
        };
        doc.set_attribute(element, name, value);
    }

    for member in &members {
        doc.remove(*member);
    }
    let reference = usize::try_from(*index)
        .ok()
        .and_then(|i| doc.element_children(parent).get(i).copied());
    doc.insert_before(parent, element, reference).ok()?;
    for member in members {
        doc.append_child(element, member).ok()?;
    }

    Some(element)
}

/// Move a container's children into its parent in its place and drop it
pub fn ungroup_elements(doc: &mut LiveDocument, container_oid: &str) -> Option<Vec<NodeId>> {
    let container = doc.find_by_oid(container_oid)?;
    let Some(parent) = doc.parent(container) else {
        tracing::warn!(container_oid, "ungroup container is detached");
        return None;
    };

    let children = doc.children(container).to_vec();
    for child in &children {
        doc.insert_before(parent, *child, Some(container)).ok()?;
    }
    doc.remove(container);
    Some(children)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> LiveDocument {
        let mut doc = LiveDocument::new();
        let body = doc.body();
        let parent = doc.create_element("div");
        doc.set_attribute(parent, OID_ATTRIBUTE, "p");
        doc.append_child(body, parent).unwrap();
        for oid in ["A", "B", "C", "D"] {
            let child = doc.create_element("span");
            doc.set_attribute(child, OID_ATTRIBUTE, oid);
            doc.append_child(parent, child).unwrap();
        }
        doc
    }

    fn child_oids(doc: &LiveDocument, oid: &str) -> Vec<String> {
        let parent = doc.find_by_oid(oid).unwrap();
        doc.element_children(parent)
            .into_iter()
            .map(|c| doc.oid(c).unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_resolve_group_orders_by_live_position() {
        let doc = grid();
        let intent = resolve_group(
            &doc,
            &["C".to_string(), "B".to_string()],
            ContainerSpec::new("section", "G"),
        )
        .unwrap();

        assert_eq!(
            intent,
            EditIntent::Group {
                parent_oid: "p".to_string(),
                index: 1,
                container: ContainerSpec::new("section", "G"),
                member_oids: vec!["B".to_string(), "C".to_string()],
            }
        );
    }

    #[test]
    fn test_group_then_ungroup_in_the_live_document() {
        let mut doc = grid();
        let mut container = ContainerSpec::new("section", "G");
        container
            .attributes
            .insert("className".to_string(), "flex gap-2".to_string());
        let intent = resolve_group(&doc, &["C".to_string(), "B".to_string()], container).unwrap();

        let section = group_elements(&mut doc, &intent).unwrap();
        assert_eq!(child_oids(&doc, "p"), vec!["A", "G", "D"]);
        assert_eq!(child_oids(&doc, "G"), vec!["B", "C"]);
        assert!(doc.has_class(section, "gap-2"));

        let plan = resolve_ungroup(&doc, "G").unwrap();
        assert_eq!(
            plan.children,
            vec![("B".to_string(), 1), ("C".to_string(), 2)]
        );
        assert_eq!(plan.parent_oid.as_deref(), Some("p"));
        assert_eq!(
            plan.intent(),
            EditIntent::Ungroup {
                container_oid: "G".to_string()
            }
        );

        ungroup_elements(&mut doc, "G").unwrap();
        assert_eq!(child_oids(&doc, "p"), vec!["A", "B", "C", "D"]);
        assert!(doc.find_by_oid("G").is_none());
    }

    #[test]
    fn test_group_across_parents_is_rejected() {
        let mut doc = grid();
        let b = doc.find_by_oid("B").unwrap();
        let nested = doc.create_element("i");
        doc.set_attribute(nested, OID_ATTRIBUTE, "nested");
        doc.append_child(b, nested).unwrap();

        assert!(resolve_group(
            &doc,
            &["A".to_string(), "nested".to_string()],
            ContainerSpec::new("div", "G"),
        )
        .is_none());
        assert!(resolve_group(&doc, &[], ContainerSpec::new("div", "G")).is_none());
        assert!(resolve_ungroup(&doc, "ghost").is_none());
    }
}
