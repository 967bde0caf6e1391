use crate::ast::*;

/// Serializer converts the AST back to source text
///
/// Unmodified nodes carry their original whitespace and raw closing tags,
/// so serializing a freshly parsed document reproduces its source exactly.
/// Nodes created by edits fall back to canonical forms: `</name>` closing
/// tags, `=` between attribute name and value, double quotes.
#[derive(Default)]
pub struct Serializer {
    output: String,
}

impl Serializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize a Document to source code
    pub fn serialize(mut self, doc: &Document) -> String {
        self.write_script(&doc.body);
        self.output
    }

    pub fn serialize_element(mut self, element: &Element) -> String {
        self.write_element(element);
        self.output
    }

    fn write_script(&mut self, script: &Script) {
        for part in &script.parts {
            match part {
                ScriptPart::Code(code) => self.output.push_str(code),
                ScriptPart::Markup(markup) => self.write_element(&markup.element),
                ScriptPart::Scope(scope) => self.write_script(&scope.body),
            }
        }
    }

    fn write_element(&mut self, element: &Element) {
        self.output.push('<');
        self.output.push_str(&element.name);

        for attr in &element.attributes {
            self.write_attribute(attr);
        }
        self.output.push_str(&element.trailing);

        if element.self_closing && element.children.is_empty() {
            self.output.push_str("/>");
            return;
        }
        self.output.push('>');

        for child in &element.children {
            match child {
                Child::Text(text) => self.output.push_str(text),
                Child::Expression(script) => {
                    self.output.push('{');
                    self.write_script(script);
                    self.output.push('}');
                }
                Child::Element(el) => self.write_element(el),
            }
        }

        match &element.closing {
            Some(raw) if !element.self_closing => self.output.push_str(raw),
            _ => {
                self.output.push_str("</");
                self.output.push_str(&element.name);
                self.output.push('>');
            }
        }
    }

    fn write_attribute(&mut self, attr: &Attribute) {
        match attr {
            Attribute::Named {
                leading,
                name,
                equals,
                value,
            } => {
                self.output.push_str(leading);
                self.output.push_str(name);
                if let Some(value) = value {
                    self.output
                        .push_str(if equals.is_empty() { "=" } else { equals });
                    match value {
                        AttributeValue::String { quote, value } => {
                            self.output.push(*quote);
                            self.output.push_str(value);
                            self.output.push(*quote);
                        }
                        AttributeValue::Expression(script) => {
                            self.output.push('{');
                            self.write_script(script);
                            self.output.push('}');
                        }
                    }
                }
            }
            Attribute::Spread {
                leading,
                expression,
            } => {
                self.output.push_str(leading);
                self.output.push('{');
                self.write_script(expression);
                self.output.push('}');
            }
        }
    }
}

/// Serialize a document to source text
pub fn serialize(doc: &Document) -> String {
    Serializer::new().serialize(doc)
}

/// Serialize one element subtree
pub fn serialize_element(element: &Element) -> String {
    Serializer::new().serialize_element(element)
}
