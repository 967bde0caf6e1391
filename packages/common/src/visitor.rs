use tandem_parser::ast::*;

/// Visitor pattern for traversing AST nodes immutably
///
/// This trait provides default implementations that walk the entire tree.
/// Override specific visit_* methods to perform custom actions on nodes;
/// `enter_scope`/`exit_scope` bracket every declaration or dynamic region.
pub trait Visitor: Sized {
    fn visit_document(&mut self, doc: &Document) {
        walk_document(self, doc);
    }

    fn visit_script(&mut self, script: &Script) {
        walk_script(self, script);
    }

    fn visit_scope(&mut self, scope: &Scope) {
        self.enter_scope(&scope.kind);
        walk_script(self, &scope.body);
        self.exit_scope(&scope.kind);
    }

    fn enter_scope(&mut self, _kind: &ScopeKind) {}

    fn exit_scope(&mut self, _kind: &ScopeKind) {}

    fn visit_markup(&mut self, markup: &Markup) {
        self.visit_element(&markup.element);
    }

    fn visit_element(&mut self, element: &Element) {
        walk_element(self, element);
    }

    fn visit_text(&mut self, _text: &str) {
        // Leaf node, no children to walk
    }
}

/// Mutable visitor pattern for transforming AST nodes
///
/// Similar to Visitor, but provides mutable access to nodes.
/// Use this when you need to modify the AST during traversal.
pub trait VisitorMut: Sized {
    fn visit_document_mut(&mut self, doc: &mut Document) {
        walk_document_mut(self, doc);
    }

    fn visit_script_mut(&mut self, script: &mut Script) {
        walk_script_mut(self, script);
    }

    fn visit_element_mut(&mut self, element: &mut Element) {
        walk_element_mut(self, element);
    }
}

// Default walk implementations for immutable visitor

pub fn walk_document<V: Visitor>(visitor: &mut V, doc: &Document) {
    visitor.visit_script(&doc.body);
}

pub fn walk_script<V: Visitor>(visitor: &mut V, script: &Script) {
    for part in &script.parts {
        match part {
            ScriptPart::Code(_) => {}
            ScriptPart::Markup(markup) => visitor.visit_markup(markup),
            ScriptPart::Scope(scope) => visitor.visit_scope(scope),
        }
    }
}

pub fn walk_element<V: Visitor>(visitor: &mut V, element: &Element) {
    for attr in &element.attributes {
        match attr {
            Attribute::Named {
                value: Some(AttributeValue::Expression(script)),
                ..
            } => visitor.visit_script(script),
            Attribute::Spread { expression, .. } => visitor.visit_script(expression),
            Attribute::Named { .. } => {}
        }
    }

    for child in &element.children {
        match child {
            Child::Text(text) => visitor.visit_text(text),
            Child::Expression(script) => visitor.visit_script(script),
            Child::Element(el) => visitor.visit_element(el),
        }
    }
}

// Default walk implementations for mutable visitor

pub fn walk_document_mut<V: VisitorMut>(visitor: &mut V, doc: &mut Document) {
    visitor.visit_script_mut(&mut doc.body);
}

pub fn walk_script_mut<V: VisitorMut>(visitor: &mut V, script: &mut Script) {
    for part in &mut script.parts {
        match part {
            ScriptPart::Code(_) => {}
            ScriptPart::Markup(markup) => visitor.visit_element_mut(&mut markup.element),
            ScriptPart::Scope(scope) => visitor.visit_script_mut(&mut scope.body),
        }
    }
}

pub fn walk_element_mut<V: VisitorMut>(visitor: &mut V, element: &mut Element) {
    for attr in &mut element.attributes {
        match attr {
            Attribute::Named {
                value: Some(AttributeValue::Expression(script)),
                ..
            } => visitor.visit_script_mut(script),
            Attribute::Spread { expression, .. } => visitor.visit_script_mut(expression),
            Attribute::Named { .. } => {}
        }
    }

    for child in &mut element.children {
        match child {
            Child::Text(_) => {}
            Child::Expression(script) => visitor.visit_script_mut(script),
            Child::Element(el) => visitor.visit_element_mut(el),
        }
    }
}
