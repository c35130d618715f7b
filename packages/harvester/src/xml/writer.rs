//! XML serialization for [`Element`] trees.
//!
//! Namespace declarations are derived while writing: a declaration is emitted
//! on the first element (or attribute) whose prefix is not already bound to
//! the right namespace in the enclosing scope.

use crate::xml::element::{Element, QName, XmlNode};

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Bindings visible at some point of the tree: `(prefix, uri)`, later wins.
type Scope = Vec<(Option<String>, String)>;

/// Serialize an element without XML declaration.
pub fn to_xml_string(element: &Element) -> String {
    let mut out = String::new();
    write_element(&mut out, element, &Vec::new());
    out
}

/// Serialize an element as a standalone UTF-8 document.
pub fn to_document_string(element: &Element) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    write_element(&mut out, element, &Vec::new());
    out
}

fn resolve<'a>(scope: &'a Scope, prefix: Option<&str>) -> Option<&'a str> {
    scope
        .iter()
        .rev()
        .find(|(p, _)| p.as_deref() == prefix)
        .map(|(_, uri)| uri.as_str())
}

fn write_element(out: &mut String, element: &Element, parent_scope: &Scope) {
    let mut scope = parent_scope.clone();
    let mut declarations: Vec<(Option<String>, String)> = Vec::new();

    let name = element.name();
    match name.namespace.as_deref() {
        Some(uri) => {
            let prefix = name.prefix.as_deref().filter(|p| !p.is_empty());
            if resolve(&scope, prefix) != Some(uri) {
                declare(&mut scope, &mut declarations, prefix, uri);
            }
        }
        None => {
            if resolve(&scope, None).is_some_and(|uri| !uri.is_empty()) {
                declare(&mut scope, &mut declarations, None, "");
            }
        }
    }

    let mut attributes = Vec::with_capacity(element.attributes().len());
    let mut generated = 0usize;
    for attr in element.attributes() {
        let written = attribute_name(&attr.name, &mut scope, &mut declarations, &mut generated);
        attributes.push((written, attr.value.as_str()));
    }

    let qualified = name.qualified_name();
    out.push('<');
    out.push_str(&qualified);
    for (prefix, uri) in &declarations {
        match prefix {
            Some(p) => out.push_str(&format!(" xmlns:{p}=\"")),
            None => out.push_str(" xmlns=\""),
        }
        escape_into(out, uri, true);
        out.push('"');
    }
    for (attr_name, value) in attributes {
        out.push(' ');
        out.push_str(&attr_name);
        out.push_str("=\"");
        escape_into(out, value, true);
        out.push('"');
    }

    if element.children().is_empty() {
        out.push_str("/>");
        return;
    }

    out.push('>');
    for child in element.children() {
        match child {
            XmlNode::Element(e) => write_element(out, e, &scope),
            XmlNode::Text(t) => escape_into(out, t, false),
        }
    }
    out.push_str("</");
    out.push_str(&qualified);
    out.push('>');
}

fn declare(
    scope: &mut Scope,
    declarations: &mut Vec<(Option<String>, String)>,
    prefix: Option<&str>,
    uri: &str,
) {
    let binding = (prefix.map(str::to_string), uri.to_string());
    scope.push(binding.clone());
    declarations.push(binding);
}

/// Name to write for an attribute, declaring its namespace if needed.
///
/// Namespaced attributes always need a prefix (the default namespace does not
/// apply to attributes), so one is generated when the tree carries none.
fn attribute_name(
    name: &QName,
    scope: &mut Scope,
    declarations: &mut Vec<(Option<String>, String)>,
    generated: &mut usize,
) -> String {
    let Some(uri) = name.namespace.as_deref() else {
        return name.local.clone();
    };
    if uri == XML_NAMESPACE {
        return format!("xml:{}", name.local);
    }

    if let Some(prefix) = name.prefix.as_deref().filter(|p| !p.is_empty()) {
        if resolve(scope, Some(prefix)) != Some(uri) {
            declare(scope, declarations, Some(prefix), uri);
        }
        return format!("{prefix}:{}", name.local);
    }

    let bound = scope
        .iter()
        .rev()
        .find(|(p, u)| p.is_some() && u == uri)
        .and_then(|(p, _)| p.clone());
    let prefix = match bound {
        Some(p) => p,
        None => {
            let mut candidate = format!("ns{generated}");
            while resolve(scope, Some(&candidate)).is_some() {
                *generated += 1;
                candidate = format!("ns{generated}");
            }
            *generated += 1;
            declare(scope, declarations, Some(&candidate), uri);
            candidate
        }
    };
    format!("{prefix}:{}", name.local)
}

fn escape_into(out: &mut String, text: &str, attribute: bool) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\n' if attribute => out.push_str("&#10;"),
            '\t' if attribute => out.push_str("&#9;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_writes_prefixed_namespace_once() {
        let element = Element::qualified("csw", "urn:csw", "GetRecords")
            .with_attribute("service", "CSW")
            .with_child(Element::qualified("csw", "urn:csw", "Query"));

        assert_eq!(
            to_xml_string(&element),
            r#"<csw:GetRecords xmlns:csw="urn:csw" service="CSW"><csw:Query/></csw:GetRecords>"#
        );
    }

    #[test]
    fn test_unqualified_child_resets_default_namespace() {
        let xml = r#"<root xmlns="urn:a"><plain xmlns=""/></root>"#;
        let element = Element::parse(xml).unwrap();
        let written = to_xml_string(&element);
        assert_eq!(written, xml);
    }

    #[test]
    fn test_escapes_text_and_attributes() {
        let element = Element::new("q")
            .with_attribute("expr", "a<\"b\"")
            .with_text("x & y < z");
        assert_eq!(
            to_xml_string(&element),
            r#"<q expr="a&lt;&quot;b&quot;">x &amp; y &lt; z</q>"#
        );
    }

    #[test]
    fn test_document_string_has_declaration() {
        let written = to_document_string(&Element::new("a"));
        assert!(written.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(written.ends_with("<a/>"));
    }

    #[test]
    fn test_namespaced_attribute_round_trips() {
        let xml = r#"<root xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:type="csw:RecordType" xml:lang="nl"/>"#;
        let element = Element::parse(xml).unwrap();
        let written = to_xml_string(&element);

        assert!(written.contains("xsi:type=\"csw:RecordType\""));
        assert!(written.contains("xml:lang=\"nl\""));
        assert!(!written.contains("xmlns:xml"));
        assert_eq!(Element::parse(&written).unwrap(), element);
    }

    #[test]
    fn test_round_trip_preserves_structure() {
        let xml = r#"<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope"><env:Body><csw:GetRecordsResponse xmlns:csw="http://www.opengis.net/cat/csw/2.0.2" version="2.0.2"><csw:SearchStatus timestamp="2024-01-01T00:00:00Z"/>
  text &amp; more</csw:GetRecordsResponse></env:Body></env:Envelope>"#;
        let element = Element::parse(xml).unwrap();
        let reparsed = Element::parse(&to_xml_string(&element)).unwrap();
        assert_eq!(reparsed, element);
    }
}
