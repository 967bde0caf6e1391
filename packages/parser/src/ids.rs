//! Source identity: tagging elements with `data-oid` and repairing duplicates.

use crate::ast::{Document, Element};
use std::collections::HashSet;
use tandem_semantics::{IdSource, UnusedIds, OID_ATTRIBUTE};

/// The element's oid, assigning a fresh one if it has none
pub fn ensure_oid(element: &mut Element, ids: &mut dyn IdSource) -> String {
    if let Some(oid) = element.oid() {
        return oid.to_string();
    }
    let oid = ids.next_oid();
    element.set_attribute(OID_ATTRIBUTE, oid.clone());
    oid
}

/// Tag every non-fragment element that has no oid. Returns whether anything changed.
///
/// Fresh oids never reuse one already present in the document.
pub fn tag_oids(document: &mut Document, ids: &mut dyn IdSource) -> bool {
    let mut ids = UnusedIds::new(ids, collect_oids(document));
    let mut modified = false;
    document.walk_elements_mut(&mut |element| {
        if !element.is_fragment() && element.oid().is_none() {
            ensure_oid(element, &mut ids);
            modified = true;
        }
    });
    modified
}

/// Tag `element` and its whole subtree
pub fn tag_element_tree(element: &mut Element, ids: &mut dyn IdSource) {
    let mut stack = vec![element];
    while let Some(el) = stack.pop() {
        if !el.is_fragment() {
            ensure_oid(el, ids);
        }
        for child in el.children.iter_mut() {
            if let crate::ast::Child::Element(child) = child {
                stack.push(child);
            }
        }
    }
}

/// Replace every repeated oid with a fresh one.
///
/// `taken` pre-seeds the seen set with oids owned by other files, so a
/// pasted element keeps no id that already exists elsewhere in the
/// project. Returns whether any oid was replaced.
pub fn deduplicate_oids(
    document: &mut Document,
    ids: &mut dyn IdSource,
    taken: &HashSet<String>,
) -> bool {
    // later elements keep their oid, so replacements must avoid those too
    let mut fresh_ids = UnusedIds::new(
        ids,
        collect_oids(document).into_iter().chain(taken.iter().cloned()),
    );
    let mut seen: HashSet<String> = HashSet::new();
    let mut modified = false;

    document.walk_elements_mut(&mut |element| {
        let Some(oid) = element.oid().map(str::to_string) else {
            return;
        };
        if !taken.contains(&oid) && seen.insert(oid) {
            return;
        }

        let fresh = fresh_ids.next_oid();
        element.set_attribute(OID_ATTRIBUTE, fresh.clone());
        seen.insert(fresh);
        modified = true;
    });

    modified
}

/// Every oid in the document, in document order
pub fn collect_oids(document: &Document) -> Vec<String> {
    document
        .elements()
        .into_iter()
        .filter_map(|el| el.oid().map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse, serialize};
    use tandem_semantics::SequentialIds;

    #[test]
    fn test_ensure_oid_is_idempotent() {
        let mut doc = parse("const a = <div><span /></div>;").unwrap();
        let mut ids = SequentialIds::from_seed("t");

        let mut first = Vec::new();
        let mut second = Vec::new();
        doc.walk_elements_mut(&mut |el| first.push(ensure_oid(el, &mut ids)));
        doc.walk_elements_mut(&mut |el| second.push(ensure_oid(el, &mut ids)));

        assert_eq!(first, vec!["t-1", "t-2"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_tag_oids_skips_fragments() {
        let mut doc = parse("const a = <><div /><React.Fragment><p /></React.Fragment></>;").unwrap();
        let mut ids = SequentialIds::from_seed("t");

        assert!(tag_oids(&mut doc, &mut ids));
        assert_eq!(
            serialize(&doc),
            r#"const a = <><div data-oid="t-1" /><React.Fragment><p data-oid="t-2" /></React.Fragment></>;"#
        );
        assert!(!tag_oids(&mut doc, &mut ids));
    }

    #[test]
    fn test_deduplicate_oids() {
        let source = r#"const a = <div data-oid="x"><p data-oid="x" /><p data-oid="y" /><p data-oid="x" /></div>;"#;
        let mut doc = parse(source).unwrap();
        let mut ids = SequentialIds::from_seed("d");

        assert!(deduplicate_oids(&mut doc, &mut ids, &HashSet::new()));

        let oids = collect_oids(&doc);
        assert_eq!(oids, vec!["x", "d-1", "y", "d-2"]);
        let unique: HashSet<_> = oids.iter().collect();
        assert_eq!(unique.len(), oids.len());

        assert!(!deduplicate_oids(&mut doc, &mut ids, &HashSet::new()));
    }

    #[test]
    fn test_deduplicate_keeps_later_unique_oids() {
        let source = r#"const a = <div data-oid="x"><p data-oid="x" /><p data-oid="d-1" /></div>;"#;
        let mut doc = parse(source).unwrap();
        let mut ids = SequentialIds::from_seed("d");

        assert!(deduplicate_oids(&mut doc, &mut ids, &HashSet::new()));
        assert_eq!(collect_oids(&doc), vec!["x", "d-2", "d-1"]);
    }

    #[test]
    fn test_tag_oids_avoids_existing_oids() {
        let mut doc = parse(r#"const a = <div><p data-oid="t-1" /></div>;"#).unwrap();
        let mut ids = SequentialIds::from_seed("t");

        assert!(tag_oids(&mut doc, &mut ids));
        assert_eq!(collect_oids(&doc), vec!["t-2", "t-1"]);
    }

    #[test]
    fn test_deduplicate_against_other_files() {
        let mut doc = parse(r#"const a = <div data-oid="shared" />;"#).unwrap();
        let mut ids = SequentialIds::from_seed("f");
        let taken: HashSet<String> = ["shared".to_string(), "f-1".to_string()].into();

        assert!(deduplicate_oids(&mut doc, &mut ids, &taken));
        assert_eq!(collect_oids(&doc), vec!["f-2"]);
    }
}
