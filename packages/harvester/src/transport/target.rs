//! Remote endpoint addressing.

use std::borrow::Cow;
use std::fmt;

use url::Url;

use crate::error::ValidationError;

/// One remote endpoint: scheme, host, port, path and an optional literal query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget {
    scheme: String,
    host: String,
    port: u16,
    path: String,
    query: Option<String>,
}

impl RequestTarget {
    /// An `http` target on `host:port` with path `/`.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme: "http".to_string(),
            host: host.into(),
            port,
            path: "/".to_string(),
            query: None,
        }
    }

    /// Build a target from an absolute URL.
    ///
    /// # Examples
    /// ```
    /// use catalog_harvester::transport::RequestTarget;
    ///
    /// let target = RequestTarget::parse("https://catalog.example.org/geonetwork/srv/eng/csw?service=CSW").unwrap();
    /// assert_eq!(target.port(), 443);
    /// assert_eq!(target.path(), "/geonetwork/srv/eng/csw");
    /// assert_eq!(target.query(), Some("service=CSW"));
    /// ```
    pub fn parse(url: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: String| ValidationError::InvalidParameterValue {
            parameter: "url".to_string(),
            value: format!("{url} ({reason})"),
        };

        let parsed = Url::parse(url).map_err(|e| invalid(e.to_string()))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| invalid("missing host".to_string()))?
            .to_string();
        let port = parsed
            .port_or_known_default()
            .ok_or_else(|| invalid("unknown port".to_string()))?;

        Ok(Self {
            scheme: parsed.scheme().to_string(),
            host,
            port,
            path: parsed.path().to_string(),
            query: parsed.query().map(str::to_string),
        })
    }

    /// Replace every component from an absolute URL.
    pub fn set_url(&mut self, url: &str) -> Result<(), ValidationError> {
        *self = Self::parse(url)?;
        Ok(())
    }

    pub fn set_scheme(&mut self, scheme: impl Into<String>) {
        self.scheme = scheme.into();
    }

    pub fn set_host(&mut self, host: impl Into<String>) {
        self.host = host.into();
    }

    pub fn set_port(&mut self, port: u16) {
        self.port = port;
    }

    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = path.into();
    }

    pub fn set_query(&mut self, query: Option<String>) {
        self.query = query;
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The literal query string, if one is set and non-empty.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref().filter(|q| !q.is_empty())
    }

    /// Decoded name/value pairs of the literal query, in order.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.query()
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default()
    }

    /// URL of the endpoint without any query string.
    pub fn base_url(&self) -> Result<Url, url::ParseError> {
        let host = url_host(&self.host);
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };
        Url::parse(&format!("{}://{}:{}{}", self.scheme, host, self.port, path))
    }
}

/// `host` as written in a URL authority: IPv6 literals get brackets.
pub(crate) fn url_host(host: &str) -> Cow<'_, str> {
    if host.contains(':') && !host.starts_with('[') {
        Cow::Owned(format!("[{host}]"))
    } else {
        Cow::Borrowed(host)
    }
}

impl fmt::Display for RequestTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}{}", self.scheme, self.host, self.port, self.path)?;
        if let Some(query) = self.query() {
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}
