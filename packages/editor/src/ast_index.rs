//! # Template Node Index
//!
//! Maps every `data-oid` in a component file to where the element lives in
//! the source and what encloses it: the declaration it belongs to, whether
//! it sits inside a list render or a conditional, and whether it is the
//! root a component returns.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tandem_common::visitor::{walk_element, Visitor};
use tandem_parser::ast::{DynamicKind, Element, Markup, ScopeKind, TagSpan};
use tandem_parser::{parse, Document, ParseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StructuralRole {
    /// Returned directly by a component
    ComponentRoot,
    /// The document `<body>`
    BodyTag,
}

/// Where an element with a source id is defined
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateNode {
    pub path: String,
    pub start_tag: TagSpan,
    pub end_tag: Option<TagSpan>,
    pub component: Option<String>,
    pub dynamic_kind: Option<DynamicKind>,
    pub structural_role: Option<StructuralRole>,
}

pub type TemplateIndex = HashMap<String, TemplateNode>;

struct IndexBuilder<'a> {
    path: &'a str,
    components: Vec<String>,
    dynamics: Vec<DynamicKind>,
    returned: bool,
    nodes: TemplateIndex,
}

impl Visitor for IndexBuilder<'_> {
    fn enter_scope(&mut self, kind: &ScopeKind) {
        match kind {
            ScopeKind::Component(name) => self.components.push(name.clone()),
            ScopeKind::Dynamic(kind) => self.dynamics.push(*kind),
        }
    }

    fn exit_scope(&mut self, kind: &ScopeKind) {
        match kind {
            ScopeKind::Component(_) => {
                self.components.pop();
            }
            ScopeKind::Dynamic(_) => {
                self.dynamics.pop();
            }
        }
    }

    fn visit_markup(&mut self, markup: &Markup) {
        self.returned = markup.is_return_value;
        self.visit_element(&markup.element);
    }

    fn visit_element(&mut self, element: &Element) {
        let returned = std::mem::take(&mut self.returned);
        if element.is_fragment() {
            walk_element(self, element);
            return;
        }

        if let (Some(oid), Some(location)) = (element.oid(), element.location.as_ref()) {
            let structural_role = if returned {
                Some(StructuralRole::ComponentRoot)
            } else if element.name.eq_ignore_ascii_case("body") {
                Some(StructuralRole::BodyTag)
            } else {
                None
            };

            self.nodes.insert(
                oid.to_string(),
                TemplateNode {
                    path: self.path.to_string(),
                    start_tag: location.start_tag,
                    end_tag: location.end_tag,
                    component: self.components.last().cloned(),
                    dynamic_kind: self.dynamics.last().copied(),
                    structural_role,
                },
            );
        }

        walk_element(self, element);
    }
}

/// Index every element carrying an oid
pub fn build_index(document: &Document, path: &str) -> TemplateIndex {
    let mut builder = IndexBuilder {
        path,
        components: Vec::new(),
        dynamics: Vec::new(),
        returned: false,
        nodes: HashMap::new(),
    };
    builder.visit_document(document);
    builder.nodes
}

/// Parse and index a file; a parse failure indexes nothing
pub fn index_source(source: &str, path: &str) -> Result<TemplateIndex, ParseError> {
    let document = parse(source)?;
    Ok(build_index(&document, path))
}

/// Exact source text of the element, open tag through close tag
pub fn content_from_template_node(node: &TemplateNode, source: &str) -> Option<String> {
    let start = node.start_tag.start;
    let end = node.end_tag.unwrap_or(node.start_tag).end;
    if start.line == 0 || start.column == 0 || end.line < start.line {
        return None;
    }

    let lines: Vec<&str> = source
        .split('\n')
        .skip(start.line - 1)
        .take(end.line - start.line + 1)
        .collect();
    if lines.len() != end.line - start.line + 1 {
        return None;
    }

    let last = lines.len() - 1;
    let selected: Vec<String> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let from = if i == 0 { start.column - 1 } else { 0 };
            let to = if i == last { end.column } else { usize::MAX };
            line.chars()
                .skip(from)
                .take(to.saturating_sub(from))
                .collect()
        })
        .collect();

    Some(selected.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"export default function Page() {
  return (
    <main data-oid="m">
      {items.map((item) => <li data-oid="l">{item}</li>)}
      {open ? <p data-oid="p" /> : null}
      <>
        <span data-oid="s">hi</span>
      </>
      <b>untagged</b>
    </main>
  );
}
"#;

    #[test]
    fn test_index_records_scopes_and_roles() {
        let index = index_source(SOURCE, "app/page.tsx").unwrap();
        assert_eq!(index.len(), 4);

        let main = &index["m"];
        assert_eq!(main.component.as_deref(), Some("Page"));
        assert_eq!(main.structural_role, Some(StructuralRole::ComponentRoot));
        assert_eq!(main.dynamic_kind, None);
        assert_eq!(main.path, "app/page.tsx");

        assert_eq!(index["l"].dynamic_kind, Some(DynamicKind::Array));
        assert_eq!(index["l"].structural_role, Some(StructuralRole::ComponentRoot));
        assert_eq!(index["p"].dynamic_kind, Some(DynamicKind::Conditional));
        assert_eq!(index["p"].structural_role, None);
        assert_eq!(index["s"].component.as_deref(), Some("Page"));
    }

    #[test]
    fn test_body_tag_role() {
        let index = index_source(
            r#"const Layout = ({ children }) => <html data-oid="h"><BODY data-oid="b">{children}</BODY></html>;"#,
            "layout.tsx",
        )
        .unwrap();
        assert_eq!(index["h"].structural_role, Some(StructuralRole::ComponentRoot));
        assert_eq!(index["b"].structural_role, Some(StructuralRole::BodyTag));
        assert_eq!(index["b"].component.as_deref(), Some("Layout"));
    }

    #[test]
    fn test_parse_failure_is_reported() {
        assert!(index_source("const a = <div>", "broken.tsx").is_err());
    }

    #[test]
    fn test_content_from_template_node() {
        let index = index_source(SOURCE, "app/page.tsx").unwrap();
        assert_eq!(
            content_from_template_node(&index["p"], SOURCE).unwrap(),
            r#"<p data-oid="p" />"#
        );
        assert_eq!(
            content_from_template_node(&index["s"], SOURCE).unwrap(),
            r#"<span data-oid="s">hi</span>"#
        );

        let main = content_from_template_node(&index["m"], SOURCE).unwrap();
        assert!(main.starts_with("<main data-oid=\"m\">\n"));
        assert!(main.ends_with("\n    </main>"));
    }

    #[test]
    fn test_template_node_serializes_camel_case() {
        let index = index_source(SOURCE, "app/page.tsx").unwrap();
        let json = serde_json::to_value(&index["l"]).unwrap();
        assert_eq!(json["dynamicKind"], "array");
        assert_eq!(json["structuralRole"], "componentRoot");
        assert_eq!(json["startTag"]["start"]["line"], 4);
    }
}
