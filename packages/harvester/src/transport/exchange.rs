//! Human-readable rendering of one request/response exchange.

use reqwest::header::{HeaderMap, AUTHORIZATION, PROXY_AUTHORIZATION};
use reqwest::{StatusCode, Version};
use serde::{Deserialize, Serialize};
use url::Url;

/// What was sent and received during one execution attempt.
///
/// Each call produces a new value; nothing is appended across calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportExchange {
    pub sent: String,
    pub received: String,
}

impl TransportExchange {
    pub(crate) fn sent_only(sent: String) -> Self {
        Self {
            sent,
            received: String::new(),
        }
    }
}

/// Render the request line, headers and body of an outgoing request.
pub(crate) fn render_sent(method: &str, url: &Url, headers: &HeaderMap, body: Option<&str>) -> String {
    let mut out = format!("{method} {}", url.path());
    if let Some(query) = url.query() {
        out.push('?');
        out.push_str(query);
    }
    out.push_str(" HTTP/1.1\r\n");

    if let Some(host) = url.host_str() {
        match url.port() {
            Some(port) => out.push_str(&format!("Host: {host}:{port}\r\n")),
            None => out.push_str(&format!("Host: {host}\r\n")),
        }
    }
    render_headers(&mut out, headers);
    out.push_str("\r\n");

    if let Some(body) = body {
        out.push_str(body);
    }
    out
}

/// Render the status line, headers and body of a response.
pub(crate) fn render_received(
    version: Version,
    status: StatusCode,
    headers: &HeaderMap,
    body: &str,
) -> String {
    let mut out = format!(
        "{version:?} {} {}\r\n",
        status.as_u16(),
        status.canonical_reason().unwrap_or("")
    );
    render_headers(&mut out, headers);
    out.push_str("\r\n");
    out.push_str(body);
    out
}

fn render_headers(out: &mut String, headers: &HeaderMap) {
    for (name, value) in headers {
        let value = value.to_str().unwrap_or("<binary>");
        let value = if name == AUTHORIZATION || name == PROXY_AUTHORIZATION {
            mask_credentials(value)
        } else {
            value.to_string()
        };
        out.push_str(&format!("{}: {value}\r\n", name.as_str()));
    }
}

/// Keep the scheme of an authorization header and hide the rest.
fn mask_credentials(value: &str) -> String {
    match value.split_once(' ') {
        Some((scheme, _)) => format!("{scheme} ****"),
        None => "****".to_string(),
    }
}
