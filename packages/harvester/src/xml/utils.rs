//! XML utility functions for navigating and extracting data from element trees.

use crate::xml::element::Element;

/// Get the tag name without namespace prefix.
///
/// # Examples
/// ```
/// use catalog_harvester::xml::{get_tag_name, Element};
///
/// let root = Element::parse(r#"<csw:Record xmlns:csw="urn:csw"/>"#).unwrap();
/// assert_eq!(get_tag_name(&root), "Record");
/// ```
pub fn get_tag_name(element: &Element) -> &str {
    element.local_name()
}

/// Find the first child element with the given local name.
///
/// # Examples
/// ```
/// use catalog_harvester::xml::{find_child, Element};
///
/// let root = Element::parse("<root><child1/><child2/></root>").unwrap();
/// assert!(find_child(&root, "child1").is_some());
/// assert!(find_child(&root, "missing").is_none());
/// ```
pub fn find_child<'a>(element: &'a Element, tag: &str) -> Option<&'a Element> {
    element
        .child_elements()
        .find(|child| get_tag_name(child) == tag)
}

/// Find the first child element with the given namespace and local name.
pub fn find_child_ns<'a>(element: &'a Element, namespace: &str, tag: &str) -> Option<&'a Element> {
    element
        .child_elements()
        .find(|child| child.namespace() == Some(namespace) && get_tag_name(child) == tag)
}

/// Find all child elements with the given local name.
///
/// # Examples
/// ```
/// use catalog_harvester::xml::{find_children, Element};
///
/// let root = Element::parse("<root><item>1</item><item>2</item><other/></root>").unwrap();
/// assert_eq!(find_children(&root, "item").count(), 2);
/// ```
pub fn find_children<'a>(
    element: &'a Element,
    tag: &'a str,
) -> impl Iterator<Item = &'a Element> + 'a {
    element
        .child_elements()
        .filter(move |child| get_tag_name(child) == tag)
}

/// Find a descendant element matching a path of local names.
///
/// # Examples
/// ```
/// use catalog_harvester::xml::{find_by_path, get_text, Element};
///
/// let root = Element::parse("<a><b><c>found</c></b></a>").unwrap();
/// let c = find_by_path(&root, "b/c").unwrap();
/// assert_eq!(get_text(c), "found");
/// ```
pub fn find_by_path<'a>(element: &'a Element, path: &str) -> Option<&'a Element> {
    let mut current = element;
    for part in path.split('/') {
        current = find_child(current, part)?;
    }
    Some(current)
}

/// Find the first descendant (depth-first, excluding `element`) with the given
/// local name.
pub fn find_descendant<'a>(element: &'a Element, tag: &str) -> Option<&'a Element> {
    for child in element.child_elements() {
        if get_tag_name(child) == tag {
            return Some(child);
        }
        if let Some(found) = find_descendant(child, tag) {
            return Some(found);
        }
    }
    None
}

/// Get the text content of an element, trimmed.
pub fn get_text(element: &Element) -> String {
    element.text().trim().to_string()
}

/// Trimmed text of the first child with the given local name, if non-empty.
pub fn child_text(element: &Element, tag: &str) -> Option<String> {
    find_child(element, tag)
        .map(get_text)
        .filter(|text| !text.is_empty())
}

/// Get an attribute value from an element.
pub fn get_attribute<'a>(element: &'a Element, name: &str) -> Option<&'a str> {
    element.attribute(name)
}

/// Check if an element has a specific local name.
pub fn has_tag(element: &Element, tag: &str) -> bool {
    get_tag_name(element) == tag
}
