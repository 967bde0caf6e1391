use serde::{Deserialize, Serialize};
use tandem_semantics::OID_ATTRIBUTE;

/// A parsed component source file.
///
/// The tree is lossless: serializing an unmodified document reproduces the
/// source byte for byte. Script text between markup is kept verbatim; markup
/// is broken down into elements, attributes and children.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    pub body: Script,
}

/// A run of script text with embedded markup
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Script {
    pub parts: Vec<ScriptPart>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScriptPart {
    /// Verbatim script text
    Code(String),
    /// A markup expression
    Markup(Markup),
    /// A declaration or dynamic region enclosing more script
    Scope(Scope),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Markup {
    pub element: Element,
    /// Directly returned by `return` or an arrow function body
    pub is_return_value: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scope {
    pub kind: ScopeKind,
    pub body: Script,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScopeKind {
    /// Named function, class or variable declaration
    Component(String),
    Dynamic(DynamicKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DynamicKind {
    /// Inside the arguments of a `.map(...)` call
    Array,
    /// After a ternary `?` or a `&&` / `||` operator
    Conditional,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Tag name; empty for a `<>` fragment
    pub name: String,
    pub attributes: Vec<Attribute>,
    /// Whitespace between the last attribute and `>` or `/>`
    pub trailing: String,
    pub self_closing: bool,
    pub children: Vec<Child>,
    /// Raw closing tag, `None` when self closing or created by an edit
    pub closing: Option<String>,
    /// Where the element was parsed from, `None` when created by an edit
    pub location: Option<SourceLocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Attribute {
    Named {
        /// Whitespace before the attribute name
        leading: String,
        name: String,
        /// Raw `=` with its surrounding whitespace
        equals: String,
        value: Option<AttributeValue>,
    },
    /// `{...props}`; the expression includes the spread operator
    Spread { leading: String, expression: Script },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    String { quote: char, value: String },
    Expression(Script),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Child {
    Text(String),
    /// `{...}` container; comments in markup are containers holding only code
    Expression(Script),
    Element(Element),
}

/// 1-based line and column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineColumn {
    pub line: usize,
    pub column: usize,
}

/// A tag's extent: `start` is its `<`, `end` is its final `>` (inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSpan {
    pub start: LineColumn,
    pub end: LineColumn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub start_tag: TagSpan,
    pub end_tag: Option<TagSpan>,
    /// Byte range of the whole element
    pub range: std::ops::Range<usize>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every element in document order
    pub fn elements(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        self.body.collect_elements(&mut out);
        out
    }

    /// Visit every element mutably in document order
    pub fn walk_elements_mut(&mut self, f: &mut impl FnMut(&mut Element)) {
        self.body.walk_elements_mut(f);
    }

    pub fn find_element(&self, oid: &str) -> Option<&Element> {
        self.body.find_element(oid)
    }

    pub fn find_element_mut(&mut self, oid: &str) -> Option<&mut Element> {
        self.body.find_element_mut(oid)
    }

    /// The element whose direct element children include `oid`
    pub fn find_parent_mut(&mut self, oid: &str) -> Option<&mut Element> {
        self.body.find_parent_mut(oid)
    }

    pub fn find_parent(&self, oid: &str) -> Option<&Element> {
        self.body.find_parent(oid)
    }
}

impl Script {
    pub fn code(text: impl Into<String>) -> Self {
        Self {
            parts: vec![ScriptPart::Code(text.into())],
        }
    }

    fn collect_elements<'a>(&'a self, out: &mut Vec<&'a Element>) {
        for part in &self.parts {
            match part {
                ScriptPart::Code(_) => {}
                ScriptPart::Markup(markup) => markup.element.collect_elements(out),
                ScriptPart::Scope(scope) => scope.body.collect_elements(out),
            }
        }
    }

    fn walk_elements_mut(&mut self, f: &mut impl FnMut(&mut Element)) {
        for part in &mut self.parts {
            match part {
                ScriptPart::Code(_) => {}
                ScriptPart::Markup(markup) => markup.element.walk_elements_mut(f),
                ScriptPart::Scope(scope) => scope.body.walk_elements_mut(f),
            }
        }
    }

    fn find_element(&self, oid: &str) -> Option<&Element> {
        self.parts.iter().find_map(|part| match part {
            ScriptPart::Code(_) => None,
            ScriptPart::Markup(markup) => markup.element.find_element(oid),
            ScriptPart::Scope(scope) => scope.body.find_element(oid),
        })
    }

    fn find_element_mut(&mut self, oid: &str) -> Option<&mut Element> {
        self.parts.iter_mut().find_map(|part| match part {
            ScriptPart::Code(_) => None,
            ScriptPart::Markup(markup) => markup.element.find_element_mut(oid),
            ScriptPart::Scope(scope) => scope.body.find_element_mut(oid),
        })
    }

    fn find_parent(&self, oid: &str) -> Option<&Element> {
        self.parts.iter().find_map(|part| match part {
            ScriptPart::Code(_) => None,
            ScriptPart::Markup(markup) => markup.element.find_parent(oid),
            ScriptPart::Scope(scope) => scope.body.find_parent(oid),
        })
    }

    fn find_parent_mut(&mut self, oid: &str) -> Option<&mut Element> {
        self.parts.iter_mut().find_map(|part| match part {
            ScriptPart::Code(_) => None,
            ScriptPart::Markup(markup) => markup.element.find_parent_mut(oid),
            ScriptPart::Scope(scope) => scope.body.find_parent_mut(oid),
        })
    }
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            trailing: String::new(),
            self_closing: false,
            children: Vec::new(),
            closing: None,
            location: None,
        }
    }

    /// `<>`, `<Fragment>` and `<React.Fragment>`
    pub fn is_fragment(&self) -> bool {
        matches!(self.name.as_str(), "" | "Fragment" | "React.Fragment")
    }

    pub fn oid(&self) -> Option<&str> {
        self.get_attribute(OID_ATTRIBUTE).filter(|v| !v.is_empty())
    }

    /// String value of a named attribute. Expression values are not strings.
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes.iter().find_map(|attr| match attr {
            Attribute::Named {
                name: n,
                value: Some(AttributeValue::String { value, .. }),
                ..
            } if n == name => Some(value.as_str()),
            _ => None,
        })
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes
            .iter()
            .any(|attr| matches!(attr, Attribute::Named { name: n, .. } if n == name))
    }

    /// Set a string attribute, replacing the value in place or appending
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        let quote = if value.contains('"') { '\'' } else { '"' };
        let new_value = AttributeValue::String { quote, value };

        for attr in &mut self.attributes {
            if let Attribute::Named {
                name: n,
                equals,
                value,
                ..
            } = attr
            {
                if n == name {
                    if value.is_none() || equals.is_empty() {
                        *equals = "=".to_string();
                    }
                    *value = Some(new_value);
                    return;
                }
            }
        }

        self.attributes.push(Attribute::Named {
            leading: " ".to_string(),
            name: name.to_string(),
            equals: "=".to_string(),
            value: Some(new_value),
        });
    }

    /// Returns whether the attribute existed
    pub fn remove_attribute(&mut self, name: &str) -> bool {
        let before = self.attributes.len();
        self.attributes
            .retain(|attr| !matches!(attr, Attribute::Named { name: n, .. } if n == name));
        self.attributes.len() != before
    }

    /// Direct element children in order
    pub fn element_children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            Child::Element(el) => Some(el),
            _ => None,
        })
    }

    pub fn element_count(&self) -> usize {
        self.element_children().count()
    }

    /// Position in `children` of the `index`th element child
    pub fn child_position_of_element(&self, index: usize) -> Option<usize> {
        self.children
            .iter()
            .enumerate()
            .filter(|(_, child)| matches!(child, Child::Element(_)))
            .nth(index)
            .map(|(pos, _)| pos)
    }

    /// Element-only index of the direct child carrying `oid`
    pub fn element_index_of(&self, oid: &str) -> Option<usize> {
        self.element_children().position(|el| el.oid() == Some(oid))
    }

    /// Position in `children` of the direct child carrying `oid`
    pub fn child_position_of(&self, oid: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|child| matches!(child, Child::Element(el) if el.oid() == Some(oid)))
    }

    fn collect_elements<'a>(&'a self, out: &mut Vec<&'a Element>) {
        out.push(self);
        for attr in &self.attributes {
            match attr {
                Attribute::Named {
                    value: Some(AttributeValue::Expression(script)),
                    ..
                } => script.collect_elements(out),
                Attribute::Spread { expression, .. } => expression.collect_elements(out),
                _ => {}
            }
        }
        for child in &self.children {
            match child {
                Child::Text(_) => {}
                Child::Expression(script) => script.collect_elements(out),
                Child::Element(el) => el.collect_elements(out),
            }
        }
    }

    fn walk_elements_mut(&mut self, f: &mut impl FnMut(&mut Element)) {
        f(self);
        for attr in &mut self.attributes {
            match attr {
                Attribute::Named {
                    value: Some(AttributeValue::Expression(script)),
                    ..
                } => script.walk_elements_mut(f),
                Attribute::Spread { expression, .. } => expression.walk_elements_mut(f),
                _ => {}
            }
        }
        for child in &mut self.children {
            match child {
                Child::Text(_) => {}
                Child::Expression(script) => script.walk_elements_mut(f),
                Child::Element(el) => el.walk_elements_mut(f),
            }
        }
    }

    fn find_element(&self, oid: &str) -> Option<&Element> {
        if self.oid() == Some(oid) {
            return Some(self);
        }
        self.nested_scripts()
            .find_map(|script| script.find_element(oid))
            .or_else(|| {
                self.element_children()
                    .find_map(|el| el.find_element(oid))
            })
    }

    fn find_element_mut(&mut self, oid: &str) -> Option<&mut Element> {
        if self.oid() == Some(oid) {
            return Some(self);
        }
        let Element {
            attributes,
            children,
            ..
        } = self;
        for attr in attributes.iter_mut() {
            let script = match attr {
                Attribute::Named {
                    value: Some(AttributeValue::Expression(script)),
                    ..
                } => script,
                Attribute::Spread { expression, .. } => expression,
                _ => continue,
            };
            if let Some(found) = script.find_element_mut(oid) {
                return Some(found);
            }
        }
        children.iter_mut().find_map(|child| match child {
            Child::Text(_) => None,
            Child::Expression(script) => script.find_element_mut(oid),
            Child::Element(el) => el.find_element_mut(oid),
        })
    }

    fn find_parent(&self, oid: &str) -> Option<&Element> {
        if self.element_children().any(|el| el.oid() == Some(oid)) {
            return Some(self);
        }
        self.nested_scripts()
            .find_map(|script| script.find_parent(oid))
            .or_else(|| self.element_children().find_map(|el| el.find_parent(oid)))
    }

    fn find_parent_mut(&mut self, oid: &str) -> Option<&mut Element> {
        if self.element_children().any(|el| el.oid() == Some(oid)) {
            return Some(self);
        }
        let Element {
            attributes,
            children,
            ..
        } = self;
        for attr in attributes.iter_mut() {
            let script = match attr {
                Attribute::Named {
                    value: Some(AttributeValue::Expression(script)),
                    ..
                } => script,
                Attribute::Spread { expression, .. } => expression,
                _ => continue,
            };
            if let Some(found) = script.find_parent_mut(oid) {
                return Some(found);
            }
        }
        children.iter_mut().find_map(|child| match child {
            Child::Text(_) => None,
            Child::Expression(script) => script.find_parent_mut(oid),
            Child::Element(el) => el.find_parent_mut(oid),
        })
    }

    /// Scripts nested in attribute values and expression children
    fn nested_scripts(&self) -> impl Iterator<Item = &Script> {
        let in_attributes = self.attributes.iter().filter_map(|attr| match attr {
            Attribute::Named {
                value: Some(AttributeValue::Expression(script)),
                ..
            } => Some(script),
            Attribute::Spread { expression, .. } => Some(expression),
            _ => None,
        });
        let in_children = self.children.iter().filter_map(|child| match child {
            Child::Expression(script) => Some(script),
            _ => None,
        });
        in_attributes.chain(in_children)
    }
}

impl Attribute {
    pub fn name(&self) -> Option<&str> {
        match self {
            Attribute::Named { name, .. } => Some(name.as_str()),
            Attribute::Spread { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element_with_oid(name: &str, oid: &str) -> Element {
        let mut el = Element::new(name);
        el.set_attribute(OID_ATTRIBUTE, oid);
        el
    }

    #[test]
    fn test_set_attribute_replaces_in_place() {
        let mut el = Element::new("div");
        el.set_attribute("className", "a");
        el.set_attribute("id", "x");
        el.set_attribute("className", "b");

        assert_eq!(el.attributes.len(), 2);
        assert_eq!(el.attributes[0].name(), Some("className"));
        assert_eq!(el.get_attribute("className"), Some("b"));
    }

    #[test]
    fn test_element_only_indexing() {
        let mut parent = element_with_oid("div", "p");
        parent.children = vec![
            Child::Text("\n  ".to_string()),
            Child::Element(element_with_oid("span", "a")),
            Child::Expression(Script::code("/* note */")),
            Child::Element(element_with_oid("span", "b")),
        ];

        assert_eq!(parent.element_count(), 2);
        assert_eq!(parent.element_index_of("b"), Some(1));
        assert_eq!(parent.child_position_of_element(1), Some(3));
        assert_eq!(parent.child_position_of("a"), Some(1));
    }

    #[test]
    fn test_find_parent_through_expression_children() {
        let mut inner = element_with_oid("ul", "list");
        inner.children.push(Child::Element(element_with_oid("li", "item")));

        let mut root = element_with_oid("div", "root");
        root.children.push(Child::Expression(Script {
            parts: vec![
                ScriptPart::Code("items.map(() => ".to_string()),
                ScriptPart::Markup(Markup {
                    element: inner,
                    is_return_value: true,
                }),
                ScriptPart::Code(")".to_string()),
            ],
        }));

        let doc = Document {
            body: Script {
                parts: vec![ScriptPart::Markup(Markup {
                    element: root,
                    is_return_value: true,
                })],
            },
        };

        assert_eq!(doc.find_parent("item").and_then(|p| p.oid()), Some("list"));
        assert!(doc.find_parent("list").is_none());
        assert_eq!(doc.elements().len(), 3);
    }

    #[test]
    fn test_fragments() {
        assert!(Element::new("").is_fragment());
        assert!(Element::new("React.Fragment").is_fragment());
        assert!(!Element::new("div").is_fragment());
    }
}
