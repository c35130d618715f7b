//! XML element tree, serialization and navigation helpers.

mod element;
mod utils;
mod writer;

pub use element::{Attribute, Element, QName, XmlNode};
pub use utils::{
    child_text, find_by_path, find_child, find_child_ns, find_children, find_descendant,
    get_attribute, get_tag_name, get_text, has_tag,
};
pub use writer::{to_document_string, to_xml_string};
