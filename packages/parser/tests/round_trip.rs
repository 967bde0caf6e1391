use pretty_assertions::assert_eq;
use tandem_parser::{parse, serialize, Child, DynamicKind, Element, ScopeKind, Script, ScriptPart};

const DASHBOARD: &str = include_str!("fixtures/dashboard.tsx");

#[test]
fn test_round_trip_is_byte_identical() {
    let doc = parse(DASHBOARD).unwrap();
    assert_eq!(serialize(&doc), DASHBOARD);
}

#[test]
fn test_generation_is_deterministic() {
    let first = serialize(&parse(DASHBOARD).unwrap());
    let second = serialize(&parse(&first).unwrap());
    assert_eq!(first, second);
}

#[test]
fn test_round_trip_small_sources() {
    let sources = [
        "",
        "const x = 1;\n",
        "export const A = () => <div />\n",
        "const a = <div\n  className=\"x\"\n  hidden\n>\n  text {value}  more\n</div>;",
        "const b = <a href = 'x' {...rest}>{/* c */}</a>;",
        "function F() { return cond ? <b>1</b> : null }",
        "const s = `<${tag}>`; const r = a<b; const t = <T,>(x: T) => x;",
    ];
    for source in sources {
        let doc = parse(source).unwrap();
        assert_eq!(serialize(&doc), source);
    }
}

#[test]
fn test_dashboard_elements() {
    let doc = parse(DASHBOARD).unwrap();
    let names: Vec<&str> = doc.elements().iter().map(|el| el.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "main", "header", "h1", "input", "p", "ul", "li", "Card", "EmptyState", "span",
            "div", "", "footer"
        ]
    );

    let main = doc.find_element("m1").unwrap();
    assert_eq!(main.element_count(), 1);
    assert_eq!(doc.find_parent("t1").and_then(Element::oid), Some("h1"));
    // rendered by a callback, not a direct child of the list
    assert!(doc.find_parent("li1").is_none());
}

fn find_scope<'a>(script: &'a Script, kind: &ScopeKind) -> Option<&'a Script> {
    script.parts.iter().find_map(|part| match part {
        ScriptPart::Scope(scope) if &scope.kind == kind => Some(&scope.body),
        ScriptPart::Scope(scope) => find_scope(&scope.body, kind),
        ScriptPart::Markup(markup) => find_scope_in_element(&markup.element, kind),
        ScriptPart::Code(_) => None,
    })
}

fn find_scope_in_element<'a>(element: &'a Element, kind: &ScopeKind) -> Option<&'a Script> {
    element.children.iter().find_map(|child| match child {
        Child::Expression(script) => find_scope(script, kind),
        Child::Element(el) => find_scope_in_element(el, kind),
        Child::Text(_) => None,
    })
}

#[test]
fn test_dashboard_scopes() {
    let doc = parse(DASHBOARD).unwrap();

    for name in ["Dashboard", "EmptyState", "Footer", "visible"] {
        assert!(
            find_scope(&doc.body, &ScopeKind::Component(name.to_string())).is_some(),
            "missing scope {}",
            name
        );
    }
    assert!(find_scope(&doc.body, &ScopeKind::Dynamic(DynamicKind::Array)).is_some());
    assert!(find_scope(&doc.body, &ScopeKind::Dynamic(DynamicKind::Conditional)).is_some());
}
