//! Request payloads: GET parameters or a POST XML body.

use std::fmt;

use crate::xml::Element;

/// HTTP method used for a catalog request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a request carries. A request is GET-shaped or POST-shaped, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPayload {
    /// Query parameters, serialized in insertion order.
    Params(Vec<(String, String)>),
    /// A single XML element sent as the request body.
    Document(Element),
}

impl Default for RequestPayload {
    fn default() -> Self {
        Self::Params(Vec::new())
    }
}

impl RequestPayload {
    pub fn method(&self) -> Method {
        match self {
            Self::Params(_) => Method::Get,
            Self::Document(_) => Method::Post,
        }
    }

    /// Append a query parameter, discarding any XML body.
    pub fn add_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        match self {
            Self::Params(params) => params.push((name.into(), value.into())),
            Self::Document(_) => *self = Self::Params(vec![(name.into(), value.into())]),
        }
    }

    /// Replace the payload with an XML body, discarding any parameters.
    pub fn set_document(&mut self, element: Element) {
        *self = Self::Document(element);
    }

    pub fn params(&self) -> &[(String, String)] {
        match self {
            Self::Params(params) => params,
            Self::Document(_) => &[],
        }
    }

    pub fn document(&self) -> Option<&Element> {
        match self {
            Self::Params(_) => None,
            Self::Document(element) => Some(element),
        }
    }
}
