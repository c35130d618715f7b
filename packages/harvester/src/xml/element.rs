//! Owned XML element tree.
//!
//! `roxmltree` documents borrow their input and are read-only. Requests need to
//! be built, wrapped in SOAP envelopes and serialized, and responses outlive the
//! buffer they were parsed from, so both sides use this owned tree instead.

use roxmltree::{Document, Node, ParsingOptions};

/// A namespace-qualified name.
///
/// Equality compares namespace, prefix and local name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QName {
    pub namespace: Option<String>,
    pub prefix: Option<String>,
    pub local: String,
}

impl QName {
    /// A name without namespace.
    pub fn local(local: impl Into<String>) -> Self {
        Self {
            namespace: None,
            prefix: None,
            local: local.into(),
        }
    }

    /// A name bound to `namespace` under `prefix`.
    pub fn qualified(
        prefix: impl Into<String>,
        namespace: impl Into<String>,
        local: impl Into<String>,
    ) -> Self {
        Self {
            namespace: Some(namespace.into()),
            prefix: Some(prefix.into()),
            local: local.into(),
        }
    }

    /// The name as written in markup (`prefix:local` or `local`).
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) if !prefix.is_empty() => format!("{prefix}:{}", self.local),
            _ => self.local.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
}

/// Content of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(Element),
    Text(String),
}

/// An XML element with its attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: QName,
    attributes: Vec<Attribute>,
    children: Vec<XmlNode>,
}

impl Element {
    /// Create an element without namespace.
    pub fn new(local: impl Into<String>) -> Self {
        Self::with_name(QName::local(local))
    }

    /// Create an element in `namespace`, written with `prefix`.
    pub fn qualified(
        prefix: impl Into<String>,
        namespace: impl Into<String>,
        local: impl Into<String>,
    ) -> Self {
        Self::with_name(QName::qualified(prefix, namespace, local))
    }

    pub fn with_name(name: QName) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Parse XML text and return its root element.
    ///
    /// Documents with a DOCTYPE are accepted; comments and processing
    /// instructions are dropped.
    pub fn parse(text: &str) -> Result<Self, roxmltree::Error> {
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        let doc = Document::parse_with_options(text, options)?;
        Ok(Self::from_node(doc.root_element()))
    }

    /// Copy a `roxmltree` element (and its subtree) into an owned element.
    pub fn from_node(node: Node<'_, '_>) -> Self {
        let tag = node.tag_name();
        let name = qname_for(node, tag.namespace(), tag.name());

        let attributes = node
            .attributes()
            .map(|attr| Attribute {
                name: qname_for(node, attr.namespace(), attr.name()),
                value: attr.value().to_string(),
            })
            .collect();

        let children = node
            .children()
            .filter_map(|child| {
                if child.is_element() {
                    Some(XmlNode::Element(Self::from_node(child)))
                } else if child.is_text() {
                    child.text().map(|t| XmlNode::Text(t.to_string()))
                } else {
                    None
                }
            })
            .collect();

        Self {
            name,
            attributes,
            children,
        }
    }

    /// Add an attribute without namespace (builder style).
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Append a child element (builder style).
    #[must_use]
    pub fn with_child(mut self, child: Element) -> Self {
        self.push_child(child);
        self
    }

    /// Append a text node (builder style).
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    /// Set an attribute without namespace, replacing any previous value.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .attributes
            .iter_mut()
            .find(|a| a.name.namespace.is_none() && a.name.local == name)
        {
            Some(existing) => existing.value = value,
            None => self.attributes.push(Attribute {
                name: QName::local(name),
                value,
            }),
        }
    }

    pub fn push_child(&mut self, child: Element) {
        self.children.push(XmlNode::Element(child));
    }

    pub fn name(&self) -> &QName {
        &self.name
    }

    pub fn local_name(&self) -> &str {
        &self.name.local
    }

    pub fn namespace(&self) -> Option<&str> {
        self.name.namespace.as_deref()
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Value of the first attribute with the given local name.
    pub fn attribute(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.local == local)
            .map(|a| a.value.as_str())
    }

    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    /// Element children, skipping text.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// Consume the element and return its element children.
    pub fn into_child_elements(self) -> impl Iterator<Item = Element> {
        self.children.into_iter().filter_map(|child| match child {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// Concatenated text of this element and all descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }
}

fn collect_text(element: &Element, out: &mut String) {
    for child in &element.children {
        match child {
            XmlNode::Text(t) => out.push_str(t),
            XmlNode::Element(e) => collect_text(e, out),
        }
    }
}

fn qname_for(node: Node<'_, '_>, namespace: Option<&str>, local: &str) -> QName {
    let prefix = namespace
        .and_then(|uri| node.lookup_prefix(uri))
        .map(str::to_string);
    QName {
        namespace: namespace.map(str::to_string),
        prefix,
        local: local.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_namespaces_and_prefixes() {
        let xml = r#"<csw:GetRecords xmlns:csw="http://www.opengis.net/cat/csw/2.0.2" service="CSW"/>"#;
        let element = Element::parse(xml).unwrap();

        assert_eq!(element.local_name(), "GetRecords");
        assert_eq!(
            element.namespace(),
            Some("http://www.opengis.net/cat/csw/2.0.2")
        );
        assert_eq!(element.name().prefix.as_deref(), Some("csw"));
        assert_eq!(element.attribute("service"), Some("CSW"));
    }

    #[test]
    fn test_parse_default_namespace_has_no_prefix() {
        let element = Element::parse(r#"<root xmlns="urn:test"><child/></root>"#).unwrap();
        assert_eq!(element.namespace(), Some("urn:test"));
        assert_eq!(element.name().prefix, None);

        let child = element.child_elements().next().unwrap();
        assert_eq!(child.namespace(), Some("urn:test"));
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        assert!(Element::parse("<open>").is_err());
        assert!(Element::parse("not xml at all").is_err());
    }

    #[test]
    fn test_parse_accepts_doctype() {
        let xml = "<?xml version=\"1.0\"?><!DOCTYPE root><root>x</root>";
        assert_eq!(Element::parse(xml).unwrap().text(), "x");
    }

    #[test]
    fn test_builder_and_text() {
        let element = Element::new("a")
            .with_attribute("k", "v")
            .with_text("hello ")
            .with_child(Element::new("b").with_text("world"));

        assert_eq!(element.text(), "hello world");
        assert_eq!(element.child_elements().count(), 1);
        assert_eq!(element.attribute("k"), Some("v"));
    }

    #[test]
    fn test_set_attribute_replaces_value() {
        let mut element = Element::new("a").with_attribute("k", "1");
        element.set_attribute("k", "2");
        assert_eq!(element.attributes().len(), 1);
        assert_eq!(element.attribute("k"), Some("2"));
    }
}
