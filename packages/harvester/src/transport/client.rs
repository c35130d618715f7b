//! The XML/SOAP request client.

use std::path::Path;
use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, Request};
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION, CONTENT_TYPE, LOCATION, WWW_AUTHENTICATE};
use reqwest::StatusCode;
use url::Url;

use crate::config::{HarvesterSettings, HTTP_TIMEOUT_SECS, USER_AGENT};
use crate::error::{HarvesterError, TransportError};
use crate::http::create_client;
use crate::transport::auth::{select_digest, Credentials, DigestSession};
use crate::transport::exchange::{render_received, render_sent, TransportExchange};
use crate::transport::payload::{Method, RequestPayload};
use crate::transport::soap::{soap_embed, soap_unembed};
use crate::transport::target::RequestTarget;
use crate::xml::{to_document_string, to_xml_string, Element};

const XML_CONTENT_TYPE: &str = "application/xml";
const SOAP_CONTENT_TYPE: &str = "application/soap+xml";

/// Proxy host and port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
}

/// How requests are built and sent.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub use_soap: bool,
    pub proxy: Option<ProxyConfig>,
    pub credentials: Option<Credentials>,
    pub proxy_credentials: Option<Credentials>,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            use_soap: false,
            proxy: None,
            credentials: None,
            proxy_credentials: None,
            timeout: Duration::from_secs(HTTP_TIMEOUT_SECS),
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl TransportConfig {
    pub fn from_settings(settings: &HarvesterSettings) -> Self {
        Self {
            timeout: settings.http_timeout,
            user_agent: settings.user_agent.clone(),
            ..Self::default()
        }
    }
}

/// A parsed response together with the exchange that produced it.
#[derive(Debug, Clone)]
pub struct XmlResponse {
    /// The response root, or the SOAP body's first element when SOAP is on.
    pub element: Element,
    pub status: u16,
    pub exchange: TransportExchange,
}

/// Immutable description of one call, derived from target and payload.
struct PreparedRequest {
    method: Method,
    url: Url,
    accept: &'static str,
    body: Option<PreparedBody>,
}

enum PreparedBody {
    Text {
        text: String,
        content_type: &'static str,
    },
    /// One file part followed by the string parameters as text parts.
    Multipart {
        field: String,
        file_name: String,
        contents: Vec<u8>,
        params: Vec<(String, String)>,
    },
}

impl PreparedBody {
    /// Body as shown in diagnostics. File contents are summarized.
    fn diagnostic_text(&self) -> String {
        match self {
            Self::Text { text, .. } => text.clone(),
            Self::Multipart {
                field,
                file_name,
                contents,
                params,
            } => {
                let mut lines = vec![format!(
                    "[file part {field}: {file_name}, {} bytes]",
                    contents.len()
                )];
                lines.extend(params.iter().map(|(name, value)| format!("[text part {name}: {value}]")));
                lines.join("\n")
            }
        }
    }
}

/// Sends XML requests to one remote service and parses XML responses.
///
/// The client is GET-shaped after [`add_param`](Self::add_param) and
/// POST-shaped after [`set_request`](Self::set_request). `execute` takes
/// `&mut self`: one instance serves one in-flight request at a time.
pub struct XmlRequest {
    target: RequestTarget,
    config: TransportConfig,
    payload: RequestPayload,
    client: Client,
    digest: Option<DigestSession>,
}

impl XmlRequest {
    pub fn new(target: RequestTarget, config: TransportConfig) -> Result<Self, HarvesterError> {
        let client = create_client(&config)?;
        Ok(Self {
            target,
            config,
            payload: RequestPayload::default(),
            client,
            digest: None,
        })
    }

    /// Create a client for an absolute URL.
    pub fn from_url(url: &str, config: TransportConfig) -> Result<Self, HarvesterError> {
        Self::new(RequestTarget::parse(url)?, config)
    }

    pub fn target(&self) -> &RequestTarget {
        &self.target
    }

    /// Mutable access to the endpoint, for changes between executions.
    pub fn target_mut(&mut self) -> &mut RequestTarget {
        &mut self.target
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    pub fn payload(&self) -> &RequestPayload {
        &self.payload
    }

    pub fn method(&self) -> Method {
        self.payload.method()
    }

    pub fn set_use_soap(&mut self, use_soap: bool) {
        self.config.use_soap = use_soap;
    }

    /// Set server credentials; they are sent with every following request.
    pub fn set_credentials(&mut self, username: impl Into<String>, password: impl Into<String>) {
        self.config.credentials = Some(Credentials::new(username, password));
        self.digest = None;
    }

    /// Route requests through `host:port`.
    pub fn set_proxy(&mut self, host: impl Into<String>, port: u16) -> Result<(), HarvesterError> {
        self.config.proxy = Some(ProxyConfig {
            host: host.into(),
            port,
        });
        self.rebuild_client()
    }

    /// Set proxy credentials. A blank username leaves the configuration as is.
    pub fn set_proxy_credentials(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<(), HarvesterError> {
        if username.trim().is_empty() {
            return Ok(());
        }
        self.config.proxy_credentials = Some(Credentials::new(username, password));
        self.rebuild_client()
    }

    fn rebuild_client(&mut self) -> Result<(), HarvesterError> {
        self.client = create_client(&self.config)?;
        Ok(())
    }

    /// Add a query parameter. Switches the request to GET.
    pub fn add_param(&mut self, name: impl Into<String>, value: impl ToString) {
        self.payload.add_param(name, value.to_string());
    }

    /// Drop all parameters and any XML body.
    pub fn clear_params(&mut self) {
        self.payload = RequestPayload::default();
    }

    /// Use `request` as the body. Switches the request to POST.
    pub fn set_request(&mut self, request: Element) {
        self.payload.set_document(request);
    }

    /// Send `request` as a POST body and return the parsed response.
    pub fn execute_with(&mut self, request: Element) -> Result<XmlResponse, TransportError> {
        self.set_request(request);
        self.execute()
    }

    /// Send the current payload and return the parsed response.
    pub fn execute(&mut self) -> Result<XmlResponse, TransportError> {
        let prepared = self.prepare()?;
        self.send(&prepared)
    }

    /// Upload the file at `path` as a multipart POST and return the parsed
    /// response.
    ///
    /// The file goes in part `name`; every parameter added with
    /// [`add_param`](Self::add_param) follows as a text part. Any literal
    /// query on the target is ignored.
    pub fn send_file(
        &mut self,
        name: &str,
        path: impl AsRef<Path>,
    ) -> Result<XmlResponse, TransportError> {
        let path = path.as_ref();
        let url = self.base_url()?;
        let contents = std::fs::read(path).map_err(|source| TransportError::UnreadableFile {
            path: path.display().to_string(),
            source,
            exchange: TransportExchange::default(),
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.to_string());

        tracing::debug!(field = name, file = %path.display(), bytes = contents.len(), "uploading file");

        let prepared = PreparedRequest {
            method: Method::Post,
            url,
            accept: self.accept(),
            body: Some(PreparedBody::Multipart {
                field: name.to_string(),
                file_name,
                contents,
                params: self.payload.params().to_vec(),
            }),
        };
        self.send(&prepared)
    }

    fn base_url(&self) -> Result<Url, TransportError> {
        self.target
            .base_url()
            .map_err(|e| TransportError::InvalidTarget {
                target: self.target.to_string(),
                reason: e.to_string(),
                exchange: TransportExchange::default(),
            })
    }

    fn accept(&self) -> &'static str {
        if self.config.use_soap {
            SOAP_CONTENT_TYPE
        } else {
            XML_CONTENT_TYPE
        }
    }

    fn prepare(&self) -> Result<PreparedRequest, TransportError> {
        let mut url = self.base_url()?;
        let soap = self.config.use_soap;
        let accept = self.accept();

        match &self.payload {
            RequestPayload::Params(params) => {
                if let Some(query) = self.target.query() {
                    url.set_query(Some(query));
                } else if !params.is_empty() {
                    url.query_pairs_mut()
                        .extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
                }
                Ok(PreparedRequest {
                    method: Method::Get,
                    url,
                    accept,
                    body: None,
                })
            }
            RequestPayload::Document(element) => {
                let body = if soap {
                    PreparedBody::Text {
                        text: to_document_string(&soap_embed(element.clone())),
                        content_type: SOAP_CONTENT_TYPE,
                    }
                } else {
                    PreparedBody::Text {
                        text: to_document_string(element),
                        content_type: XML_CONTENT_TYPE,
                    }
                };
                Ok(PreparedRequest {
                    method: Method::Post,
                    url,
                    accept,
                    body: Some(body),
                })
            }
        }
    }

    fn build_request(&mut self, prepared: &PreparedRequest, url: &Url) -> reqwest::Result<Request> {
        let method = match prepared.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };

        let mut builder = self
            .client
            .request(method, url.clone())
            .header(ACCEPT, prepared.accept);

        match &prepared.body {
            Some(PreparedBody::Text { text, content_type }) => {
                builder = builder.header(CONTENT_TYPE, *content_type).body(text.clone());
            }
            // A fresh form per attempt: retries and redirects resend the parts.
            Some(PreparedBody::Multipart {
                field,
                file_name,
                contents,
                params,
            }) => {
                let file = Part::bytes(contents.clone())
                    .file_name(file_name.clone())
                    .mime_str("application/octet-stream")?;
                let form = params
                    .iter()
                    .fold(Form::new().part(field.clone(), file), |form, (name, value)| {
                        form.text(name.clone(), value.clone())
                    });
                builder = builder.multipart(form);
            }
            None => {}
        }

        if let Some(credentials) = &self.config.credentials {
            builder = match &mut self.digest {
                Some(session) => builder.header(
                    AUTHORIZATION,
                    session.authorization(credentials, prepared.method.as_str(), &request_uri(url)),
                ),
                None => builder.basic_auth(&credentials.username, Some(&credentials.password)),
            };
        }

        builder.build()
    }

    /// Issue the request, answering one Digest challenge and following at
    /// most one redirect.
    fn send(&mut self, prepared: &PreparedRequest) -> Result<XmlResponse, TransportError> {
        let mut url = prepared.url.clone();
        let mut redirected = false;
        let mut challenged = false;
        let body_text = prepared.body.as_ref().map(PreparedBody::diagnostic_text);
        let body_text = body_text.as_deref();

        loop {
            let request = match self.build_request(prepared, &url) {
                Ok(request) => request,
                Err(source) => {
                    let sent = render_sent(prepared.method.as_str(), &url, &HeaderMap::new(), body_text);
                    return Err(TransportError::NetworkFailure {
                        source,
                        exchange: TransportExchange::sent_only(sent),
                    });
                }
            };
            let sent = render_sent(prepared.method.as_str(), &url, request.headers(), body_text);

            tracing::debug!(method = %prepared.method, url = %url, "sending catalog request");

            // The body is read completely before returning, which releases the
            // connection on every path.
            let response = match self.client.execute(request) {
                Ok(response) => response,
                Err(source) => {
                    tracing::warn!(url = %url, error = %source, "catalog request failed");
                    return Err(TransportError::NetworkFailure {
                        source,
                        exchange: TransportExchange::sent_only(sent),
                    });
                }
            };

            let status = response.status();
            let version = response.version();
            let headers = response.headers().clone();
            let bytes = match response.bytes() {
                Ok(bytes) => bytes,
                Err(source) => {
                    return Err(TransportError::NetworkFailure {
                        source,
                        exchange: TransportExchange {
                            sent,
                            received: render_received(version, status, &headers, ""),
                        },
                    });
                }
            };
            let body = String::from_utf8_lossy(&bytes).into_owned();
            let exchange = TransportExchange {
                sent,
                received: render_received(version, status, &headers, &body),
            };

            if status == StatusCode::UNAUTHORIZED && !challenged && self.config.credentials.is_some() {
                let challenge = select_digest(
                    headers
                        .get_all(WWW_AUTHENTICATE)
                        .iter()
                        .filter_map(|v| v.to_str().ok()),
                );
                if let Some(challenge) = challenge {
                    tracing::debug!(realm = %challenge.realm, "answering digest challenge");
                    self.digest = Some(DigestSession::new(challenge));
                    challenged = true;
                    continue;
                }
            }

            if status.is_redirection() && !redirected {
                if let Some(location) = headers.get(LOCATION).and_then(|v| v.to_str().ok()) {
                    match url.join(location) {
                        Ok(next) => {
                            tracing::info!(from = %url, to = %next, "following redirect");
                            url = next;
                            redirected = true;
                            continue;
                        }
                        Err(e) => {
                            tracing::warn!(location, error = %e, "ignoring unusable redirect location");
                        }
                    }
                }
            }

            return self.parse_response(status, body, exchange);
        }
    }

    fn parse_response(
        &self,
        status: StatusCode,
        body: String,
        exchange: TransportExchange,
    ) -> Result<XmlResponse, TransportError> {
        let element = match Element::parse(&body) {
            Ok(element) => element,
            Err(source) => {
                tracing::warn!(status = %status, error = %source, "response is not well-formed XML");
                return Err(TransportError::BadXmlResponse {
                    body,
                    source,
                    exchange,
                });
            }
        };

        let element = if self.config.use_soap {
            match soap_unembed(element) {
                Ok(content) => content,
                Err(envelope) => {
                    tracing::warn!(status = %status, "SOAP response without body content");
                    return Err(TransportError::BadSoapResponse {
                        body: to_xml_string(&envelope),
                        exchange,
                    });
                }
            }
        } else {
            element
        };

        Ok(XmlResponse {
            element,
            status: status.as_u16(),
            exchange,
        })
    }
}

/// Path and query of `url`, as used in the Digest `uri` field.
fn request_uri(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    }
}
