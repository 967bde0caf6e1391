//! # Source Mutations
//!
//! Applies edit intents to a parsed component file.
//!
//! ## Semantics
//!
//! A batch of intents for one file is applied to a working copy of the
//! AST. The caller's document is replaced only when every intent
//! succeeded, so a failed batch leaves the source untouched.
//!
//! ### Positions
//! - Child indices count element children only
//! - Out-of-range indices append; negative indices append with a warning
//! - New siblings copy the indentation of the existing children
//!
//! ### Structural intents
//! - Insert, Remove, Move, Group and Ungroup run the post-effect engine on
//!   every parent whose child list changed
//!
//! ### Attributes
//! - `className` merges through the utility class rules unless the intent
//!   asks to override; every other attribute is replaced

use crate::class_merge::{is_background_image, merge_classes, remove_classes};
use crate::post_effects::PostEffectEngine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tandem_common::visitor::{walk_element_mut, VisitorMut};
use tandem_parser::ast::{Child, Document, Element};
use tandem_parser::{collect_oids, parse_fragment, tag_element_tree};
use tandem_semantics::{
    ContainerSpec, EditIntent, ElementSpec, IdSource, InsertPayload, Position, UnusedIds,
    CLASS_NAME_ATTRIBUTE, OID_ATTRIBUTE,
};
use thiserror::Error;

/// Tags that never have children
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

const INDENT_STEP: &str = "  ";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("Target not found: {0}")]
    TargetNotFound(String),

    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

/// Settings the transform engine needs from the project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransformOptions {
    /// Project-relative folder image assets are written to
    pub image_folder: String,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            image_folder: "public/images".to_string(),
        }
    }
}

impl TransformOptions {
    /// URL path the page serves the image folder under
    fn image_url_prefix(&self) -> String {
        let folder = self.image_folder.trim_matches('/');
        let folder = folder.strip_prefix("public/").unwrap_or(folder);
        if folder == "public" {
            String::new()
        } else {
            format!("/{}", folder)
        }
    }
}

/// A binary file the caller must write alongside the source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetWrite {
    pub path: String,
    pub bytes: Vec<u8>,
}

/// Result of a successful batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    /// Number of intents applied
    pub applied: usize,
    pub assets: Vec<AssetWrite>,
}

/// Apply every intent of one file, all or nothing.
pub fn apply_intents(
    doc: &mut Document,
    intents: &[EditIntent],
    ids: &mut dyn IdSource,
    options: &TransformOptions,
) -> Result<BatchOutcome, TransformError> {
    let mut working = doc.clone();
    // inserted elements must not take an oid the file already uses
    let mut ids = UnusedIds::new(ids, collect_oids(&working));
    let mut transform = Transform {
        ids: &mut ids,
        options,
        effects: PostEffectEngine::new(),
        assets: Vec::new(),
    };

    for intent in intents {
        tracing::debug!(kind = intent.kind(), "applying intent");
        transform.apply(&mut working, intent)?;
    }

    *doc = working;
    Ok(BatchOutcome {
        applied: intents.len(),
        assets: transform.assets,
    })
}

struct Transform<'a> {
    ids: &'a mut dyn IdSource,
    options: &'a TransformOptions,
    effects: PostEffectEngine,
    assets: Vec<AssetWrite>,
}

impl Transform<'_> {
    fn apply(&mut self, doc: &mut Document, intent: &EditIntent) -> Result<(), TransformError> {
        match intent {
            EditIntent::Insert {
                target_oid,
                position,
                payload,
            } => self.apply_insert(doc, intent, target_oid, *position, payload),
            EditIntent::Remove { oid } => self.apply_remove(doc, intent, oid),
            EditIntent::Move { oid, new_index } => self.apply_move(doc, intent, oid, *new_index),
            EditIntent::Group {
                parent_oid,
                index,
                container,
                member_oids,
            } => self.apply_group(doc, intent, parent_oid, *index, container, member_oids),
            EditIntent::Ungroup { container_oid } => {
                self.apply_ungroup(doc, intent, container_oid)
            }
            EditIntent::UpdateText { oid, text } => {
                update_text(find(doc, oid)?, text);
                Ok(())
            }
            EditIntent::UpdateAttributes {
                oid,
                attributes,
                override_class_name,
            } => {
                update_attributes(find(doc, oid)?, attributes, *override_class_name);
                Ok(())
            }
            EditIntent::InsertImage {
                oid,
                file_name,
                bytes,
            } => self.apply_insert_image(doc, oid, file_name, bytes),
            EditIntent::RemoveImage { oid } => {
                let element = find(doc, oid)?;
                let existing = element.get_attribute(CLASS_NAME_ATTRIBUTE).unwrap_or("");
                let classes = remove_classes(existing, is_background_image);
                if classes.is_empty() {
                    element.remove_attribute(CLASS_NAME_ATTRIBUTE);
                } else {
                    element.set_attribute(CLASS_NAME_ATTRIBUTE, classes);
                }
                Ok(())
            }
        }
    }

    fn apply_insert(
        &mut self,
        doc: &mut Document,
        intent: &EditIntent,
        target_oid: &str,
        position: Position,
        payload: &InsertPayload,
    ) -> Result<(), TransformError> {
        let element = self.build_payload(payload)?;

        let (parent, index) = match position {
            Position::Before | Position::After => {
                let parent = find_parent(doc, target_oid)?;
                let index = parent
                    .element_index_of(target_oid)
                    .ok_or_else(|| TransformError::TargetNotFound(target_oid.to_string()))?;
                let index = if position == Position::After { index + 1 } else { index };
                (parent, index)
            }
            Position::Append => {
                let parent = find(doc, target_oid)?;
                let count = parent.element_count();
                (parent, count)
            }
            Position::Prepend => (find(doc, target_oid)?, 0),
            Position::Index { index } => {
                let parent = find(doc, target_oid)?;
                let index = resolve_index(index, parent.element_count());
                (parent, index)
            }
        };

        let indent = sibling_indent(parent);
        splice_child(parent, index, Child::Element(element), indent.as_deref());
        self.effects.run(intent, parent, self.ids);
        Ok(())
    }

    fn apply_remove(
        &mut self,
        doc: &mut Document,
        intent: &EditIntent,
        oid: &str,
    ) -> Result<(), TransformError> {
        let parent = find_parent(doc, oid)?;
        take_child(parent, oid)?;
        self.effects.run(intent, parent, self.ids);
        Ok(())
    }

    fn apply_move(
        &mut self,
        doc: &mut Document,
        intent: &EditIntent,
        oid: &str,
        new_index: i64,
    ) -> Result<(), TransformError> {
        let parent = find_parent(doc, oid)?;
        let indent = sibling_indent(parent);
        let element = take_child(parent, oid)?;
        let index = resolve_index(new_index, parent.element_count());
        splice_child(parent, index, Child::Element(element), indent.as_deref());
        self.effects.run(intent, parent, self.ids);
        Ok(())
    }

    fn apply_group(
        &mut self,
        doc: &mut Document,
        intent: &EditIntent,
        parent_oid: &str,
        index: i64,
        container: &ContainerSpec,
        member_oids: &[String],
    ) -> Result<(), TransformError> {
        if member_oids.is_empty() {
            return Err(TransformError::InvalidStructure(
                "group needs at least one member".to_string(),
            ));
        }
        for oid in member_oids {
            if doc.find_element(oid).is_none() {
                return Err(TransformError::TargetNotFound(oid.clone()));
            }
        }

        let parent = find(doc, parent_oid)?;
        let mut members: Vec<(usize, &str)> = Vec::with_capacity(member_oids.len());
        for oid in member_oids {
            let position = parent.element_index_of(oid).ok_or_else(|| {
                TransformError::InvalidStructure(format!(
                    "{} is not a child of {}",
                    oid, parent_oid
                ))
            })?;
            members.push((position, oid));
        }
        members.sort_by_key(|(position, _)| *position);
        members.dedup_by_key(|(position, _)| *position);

        let outer = sibling_indent(parent);
        let mut removed = Vec::with_capacity(members.len());
        for (_, oid) in &members {
            removed.push(take_child(parent, oid)?);
        }

        let mut group = build_container(container);
        let inner = outer.as_ref().map(|indent| format!("{}{}", indent, INDENT_STEP));
        for member in removed {
            if let Some(inner) = &inner {
                group.children.push(Child::Text(inner.clone()));
            }
            group.children.push(Child::Element(member));
        }
        if let Some(outer) = &outer {
            group.children.push(Child::Text(outer.clone()));
        }
        self.effects.run(intent, &mut group, self.ids);

        let index = resolve_index(index, parent.element_count());
        splice_child(parent, index, Child::Element(group), outer.as_deref());
        self.effects.run(intent, parent, self.ids);
        Ok(())
    }

    fn apply_ungroup(
        &mut self,
        doc: &mut Document,
        intent: &EditIntent,
        container_oid: &str,
    ) -> Result<(), TransformError> {
        let parent = find_parent(doc, container_oid)?;
        let mut index = parent
            .element_index_of(container_oid)
            .ok_or_else(|| TransformError::TargetNotFound(container_oid.to_string()))?;
        let indent = sibling_indent(parent);
        let container = take_child(parent, container_oid)?;

        for child in container.children {
            let is_element = match &child {
                Child::Text(text) if text.trim().is_empty() => continue,
                Child::Element(_) => true,
                _ => false,
            };
            splice_child(parent, index, child, indent.as_deref());
            if is_element {
                index += 1;
            }
        }

        self.effects.run(intent, parent, self.ids);
        Ok(())
    }

    fn apply_insert_image(
        &mut self,
        doc: &mut Document,
        oid: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<(), TransformError> {
        if file_name.is_empty() || file_name.contains('/') || file_name.contains("..") {
            return Err(TransformError::InvalidPayload(format!(
                "invalid image file name: {}",
                file_name
            )));
        }

        let element = find(doc, oid)?;
        let class = format!(
            "bg-[url({}/{})]",
            self.options.image_url_prefix(),
            file_name
        );
        let existing = element.get_attribute(CLASS_NAME_ATTRIBUTE).unwrap_or("");
        element.set_attribute(CLASS_NAME_ATTRIBUTE, merge_classes(existing, &class));

        let folder = self.options.image_folder.trim_end_matches('/');
        self.assets.push(AssetWrite {
            path: format!("{}/{}", folder, file_name),
            bytes: bytes.to_vec(),
        });
        Ok(())
    }

    fn build_payload(&mut self, payload: &InsertPayload) -> Result<Element, TransformError> {
        match payload {
            InsertPayload::Markup { markup } => {
                let mut element = parse_fragment(markup)
                    .map_err(|e| TransformError::InvalidPayload(e.to_string()))?;
                if !element.is_fragment() {
                    element.set_attribute(OID_ATTRIBUTE, self.ids.next_oid());
                }
                tag_element_tree(&mut element, self.ids);
                LocationStripper.visit_element_mut(&mut element);
                Ok(element)
            }
            InsertPayload::Element { element } => Ok(build_element(element, self.ids)),
        }
    }
}

/// Clears source locations from elements that no longer sit at them
struct LocationStripper;

impl VisitorMut for LocationStripper {
    fn visit_element_mut(&mut self, element: &mut Element) {
        element.location = None;
        walk_element_mut(self, element);
    }
}

fn find<'d>(doc: &'d mut Document, oid: &str) -> Result<&'d mut Element, TransformError> {
    doc.find_element_mut(oid)
        .ok_or_else(|| TransformError::TargetNotFound(oid.to_string()))
}

fn find_parent<'d>(doc: &'d mut Document, oid: &str) -> Result<&'d mut Element, TransformError> {
    if doc.find_element(oid).is_none() {
        return Err(TransformError::TargetNotFound(oid.to_string()));
    }
    doc.find_parent_mut(oid).ok_or_else(|| {
        TransformError::InvalidStructure(format!("{} has no parent element", oid))
    })
}

fn resolve_index(index: i64, count: usize) -> usize {
    if index < 0 {
        tracing::warn!(index, "negative child index, appending");
        return count;
    }
    usize::try_from(index).map_or(count, |index| index.min(count))
}

/// Whitespace preceding the first element child, from its last newline on
fn sibling_indent(parent: &Element) -> Option<String> {
    let first = parent.child_position_of_element(0)?;
    let before = first.checked_sub(1)?;
    match &parent.children[before] {
        Child::Text(text) => {
            let run = &text[text.trim_end().len()..];
            run.rfind('\n').map(|nl| run[nl..].to_string())
        }
        _ => None,
    }
}

/// Insert `child` before the `index`th element child, or after the last
/// non-blank child when `index` is past the end.
fn splice_child(parent: &mut Element, index: usize, child: Child, indent: Option<&str>) {
    if parent.self_closing {
        parent.self_closing = false;
        parent.trailing = parent.trailing.trim_end().to_string();
    }

    if let Some(position) = parent.child_position_of_element(index) {
        parent.children.insert(position, child);
        if let Some(indent) = indent {
            parent
                .children
                .insert(position + 1, Child::Text(indent.to_string()));
        }
        return;
    }

    let mut position = parent
        .children
        .iter()
        .rposition(|c| !matches!(c, Child::Text(text) if text.trim().is_empty()))
        .map_or(0, |last| last + 1);
    if let (Some(indent), true) = (indent, position > 0) {
        parent
            .children
            .insert(position, Child::Text(indent.to_string()));
        position += 1;
    }
    parent.children.insert(position, child);
}

/// Remove the direct child carrying `oid` with the line break run before it
fn take_child(parent: &mut Element, oid: &str) -> Result<Element, TransformError> {
    let position = parent
        .child_position_of(oid)
        .ok_or_else(|| TransformError::TargetNotFound(oid.to_string()))?;

    let removed = match parent.children.remove(position) {
        Child::Element(el) => el,
        _ => return Err(TransformError::TargetNotFound(oid.to_string())),
    };

    if let Some(Child::Text(text)) = position
        .checked_sub(1)
        .and_then(|prev| parent.children.get_mut(prev))
    {
        let kept = text.trim_end().len();
        if text[kept..].contains('\n') {
            text.truncate(kept);
            if text.is_empty() {
                parent.children.remove(position - 1);
            }
        }
    }

    Ok(removed)
}

fn build_container(spec: &ContainerSpec) -> Element {
    let mut element = Element::new(spec.tag_name.clone());
    element.set_attribute(OID_ATTRIBUTE, spec.oid.clone());
    for (name, value) in &spec.attributes {
        if name != OID_ATTRIBUTE {
            element.set_attribute(name, value.clone());
        }
    }
    element
}

fn build_element(spec: &ElementSpec, ids: &mut dyn IdSource) -> Element {
    let mut element = Element::new(spec.tag_name.clone());
    let oid = spec.oid.clone().unwrap_or_else(|| ids.next_oid());
    element.set_attribute(OID_ATTRIBUTE, oid);
    for (name, value) in &spec.attributes {
        if name != OID_ATTRIBUTE {
            element.set_attribute(name, value.clone());
        }
    }

    if let Some(text) = spec.text_content.as_deref().filter(|t| !t.is_empty()) {
        element.children.push(Child::Text(escape_text(text)));
    }
    for child in &spec.children {
        element
            .children
            .push(Child::Element(build_element(child, ids)));
    }

    let void = VOID_TAGS.contains(&spec.tag_name.to_ascii_lowercase().as_str());
    element.self_closing = element.children.is_empty() && void;
    element
}

/// Escape text for use as a JSX text child
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '{' => out.push_str("&#123;"),
            '}' => out.push_str("&#125;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn update_text(element: &mut Element, text: &str) {
    let escaped = escape_text(text);

    let existing = element.children.iter_mut().find_map(|child| match child {
        Child::Text(current) if !current.trim().is_empty() => Some(current),
        _ => None,
    });

    match existing {
        Some(current) => {
            let start = current.len() - current.trim_start().len();
            let end = current.trim_end().len();
            current.replace_range(start..end, &escaped);
        }
        None => {
            if element.self_closing {
                element.self_closing = false;
                element.trailing = element.trailing.trim_end().to_string();
            }
            element.children.insert(0, Child::Text(escaped));
        }
    }
}

fn update_attributes(
    element: &mut Element,
    attributes: &BTreeMap<String, String>,
    override_class_name: bool,
) {
    for (name, value) in attributes {
        if name == OID_ATTRIBUTE {
            continue;
        }
        if name == CLASS_NAME_ATTRIBUTE && !override_class_name {
            let merged = match element.get_attribute(CLASS_NAME_ATTRIBUTE) {
                Some(existing) => merge_classes(existing, value),
                None => value.clone(),
            };
            element.set_attribute(name, merged);
        } else {
            element.set_attribute(name, value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tandem_parser::{parse, serialize};
    use tandem_semantics::SequentialIds;

    fn run(source: &str, intents: Vec<EditIntent>) -> Result<String, TransformError> {
        let mut doc = parse(source).unwrap();
        let mut ids = SequentialIds::from_seed("n");
        apply_intents(&mut doc, &intents, &mut ids, &TransformOptions::default())?;
        Ok(serialize(&doc))
    }

    #[test]
    fn test_inserted_oid_skips_oids_in_file() {
        let mut doc = parse(r#"const a = <div data-oid="n-1"><p data-oid="p" /></div>;"#).unwrap();
        let mut ids = SequentialIds::from_seed("n");
        apply_intents(
            &mut doc,
            &[EditIntent::Insert {
                target_oid: "n-1".to_string(),
                position: Position::Append,
                payload: InsertPayload::Element {
                    element: ElementSpec::new("span"),
                },
            }],
            &mut ids,
            &TransformOptions::default(),
        )
        .unwrap();

        assert_eq!(collect_oids(&doc), vec!["n-1", "p", "n-2"]);
    }

    #[test]
    fn test_update_text_prepends_before_elements() {
        let out = run(
            r#"const a = <div data-oid="x1"><span>hi</span></div>;"#,
            vec![EditIntent::UpdateText {
                oid: "x1".to_string(),
                text: "bye".to_string(),
            }],
        )
        .unwrap();
        assert_eq!(out, r#"const a = <div data-oid="x1">bye<span>hi</span></div>;"#);
    }

    #[test]
    fn test_update_text_replaces_first_text_and_escapes() {
        let out = run(
            "const a = <p data-oid=\"p\">\n  old\n  <b>x</b>tail</p>;",
            vec![EditIntent::UpdateText {
                oid: "p".to_string(),
                text: "a {b} <c>".to_string(),
            }],
        )
        .unwrap();
        assert_eq!(
            out,
            "const a = <p data-oid=\"p\">\n  a &#123;b&#125; &lt;c&gt;\n  <b>x</b>tail</p>;"
        );
    }

    #[test]
    fn test_update_attributes_merges_class_name() {
        let source = r#"const a = <div data-oid="d" className="p-2 flex" title="a" />;"#;
        let mut attributes = BTreeMap::new();
        attributes.insert("className".to_string(), "px-4".to_string());
        attributes.insert("title".to_string(), "b".to_string());
        attributes.insert("data-oid".to_string(), "ignored".to_string());

        let merged = run(
            source,
            vec![EditIntent::UpdateAttributes {
                oid: "d".to_string(),
                attributes: attributes.clone(),
                override_class_name: false,
            }],
        )
        .unwrap();
        assert_eq!(
            merged,
            r#"const a = <div data-oid="d" className="p-2 flex px-4" title="b" />;"#
        );

        let replaced = run(
            source,
            vec![EditIntent::UpdateAttributes {
                oid: "d".to_string(),
                attributes,
                override_class_name: true,
            }],
        )
        .unwrap();
        assert_eq!(
            replaced,
            r#"const a = <div data-oid="d" className="px-4" title="b" />;"#
        );
    }

    #[test]
    fn test_insert_image_replaces_previous_image() {
        let mut doc =
            parse(r#"const a = <div data-oid="d" className="p-2 bg-[url(/images/old.png)]" />;"#)
                .unwrap();
        let mut ids = SequentialIds::from_seed("n");
        let outcome = apply_intents(
            &mut doc,
            &[EditIntent::InsertImage {
                oid: "d".to_string(),
                file_name: "new.png".to_string(),
                bytes: vec![1, 2, 3],
            }],
            &mut ids,
            &TransformOptions::default(),
        )
        .unwrap();

        assert_eq!(
            serialize(&doc),
            r#"const a = <div data-oid="d" className="p-2 bg-[url(/images/new.png)]" />;"#
        );
        assert_eq!(
            outcome.assets,
            vec![AssetWrite {
                path: "public/images/new.png".to_string(),
                bytes: vec![1, 2, 3],
            }]
        );
    }

    #[test]
    fn test_remove_image() {
        let out = run(
            r#"const a = <div data-oid="d" className="bg-[url(/images/a.png)]" />;"#,
            vec![EditIntent::RemoveImage {
                oid: "d".to_string(),
            }],
        )
        .unwrap();
        assert_eq!(out, r#"const a = <div data-oid="d" />;"#);
    }

    #[test]
    fn test_image_file_name_is_checked() {
        let err = run(
            r#"const a = <div data-oid="d" />;"#,
            vec![EditIntent::InsertImage {
                oid: "d".to_string(),
                file_name: "../secret.png".to_string(),
                bytes: vec![],
            }],
        )
        .unwrap_err();
        assert!(matches!(err, TransformError::InvalidPayload(_)));
    }

    #[test]
    fn test_insert_into_self_closing_parent() {
        let out = run(
            r#"const a = <div data-oid="d" />;"#,
            vec![EditIntent::Insert {
                target_oid: "d".to_string(),
                position: Position::Append,
                payload: InsertPayload::Element {
                    element: ElementSpec::new("img").with_oid("i"),
                },
            }],
        )
        .unwrap();
        assert_eq!(
            out,
            r#"const a = <div data-oid="d"><img data-oid="i" key="tk-n-1"/></div>;"#
        );
    }

    #[test]
    fn test_invalid_markup_payload() {
        let err = run(
            r#"const a = <div data-oid="d" />;"#,
            vec![EditIntent::Insert {
                target_oid: "d".to_string(),
                position: Position::Append,
                payload: InsertPayload::Markup {
                    markup: "<p>".to_string(),
                },
            }],
        )
        .unwrap_err();
        assert!(matches!(err, TransformError::InvalidPayload(_)));
    }

    #[test]
    fn test_resolve_index() {
        assert_eq!(resolve_index(1, 2), 1);
        assert_eq!(resolve_index(5, 2), 2);
        assert_eq!(resolve_index(-1, 2), 2);
    }

    #[test]
    fn test_image_url_prefix() {
        assert_eq!(TransformOptions::default().image_url_prefix(), "/images");
        let options = TransformOptions {
            image_folder: "assets/img/".to_string(),
        };
        assert_eq!(options.image_url_prefix(), "/assets/img");
    }
}
