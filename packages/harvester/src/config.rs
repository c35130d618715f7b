//! Configuration constants and settings for the harvester.

use std::time::Duration;

use crate::error::ValidationError;

/// SOAP 1.2 envelope namespace.
pub const SOAP_ENV_NAMESPACE: &str = "http://www.w3.org/2003/05/soap-envelope";

/// Prefix used for the SOAP envelope namespace in outgoing requests.
pub const SOAP_ENV_PREFIX: &str = "env";

/// CSW 2.0.2 namespace.
pub const CSW_NAMESPACE: &str = "http://www.opengis.net/cat/csw/2.0.2";

/// OGC Web Services common namespace (bounding boxes, exception reports).
pub const OWS_NAMESPACE: &str = "http://www.opengis.net/ows";

/// Dublin Core elements namespace.
pub const DC_NAMESPACE: &str = "http://purl.org/dc/elements/1.1/";

/// Dublin Core terms namespace.
pub const DCT_NAMESPACE: &str = "http://purl.org/dc/terms/";

/// CSW protocol version sent with every request.
pub const CSW_VERSION: &str = "2.0.2";

/// HTTP timeout in seconds.
///
/// Catalog services can be slow to assemble large result pages.
pub const HTTP_TIMEOUT_SECS: u64 = 60;

/// Default number of records requested per GetRecords page.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Largest page size accepted from configuration.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// User agent string identifying this harvester.
pub const USER_AGENT: &str = concat!("catalog-harvester/", env!("CARGO_PKG_VERSION"));

/// Legal longitude range (degrees).
pub const LONGITUDE_RANGE: (f64, f64) = (-180.0, 180.0);

/// Legal latitude range (degrees).
pub const LATITUDE_RANGE: (f64, f64) = (-90.0, 90.0);

/// Runtime settings shared by the CLI and library callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvesterSettings {
    pub http_timeout: Duration,
    pub page_size: u32,
    pub user_agent: String,
}

impl Default for HarvesterSettings {
    fn default() -> Self {
        Self {
            http_timeout: Duration::from_secs(HTTP_TIMEOUT_SECS),
            page_size: DEFAULT_PAGE_SIZE,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl HarvesterSettings {
    /// Read settings from the environment, falling back to defaults.
    ///
    /// Recognized variables: `HARVESTER_HTTP_TIMEOUT_SECS`,
    /// `HARVESTER_PAGE_SIZE`, `HARVESTER_USER_AGENT`.
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(raw) = lookup("HARVESTER_HTTP_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| ValidationError::InvalidSetting {
                name: "HARVESTER_HTTP_TIMEOUT_SECS".to_string(),
                reason: format!("'{raw}' is not a whole number of seconds"),
            })?;
            if secs == 0 {
                return Err(ValidationError::InvalidSetting {
                    name: "HARVESTER_HTTP_TIMEOUT_SECS".to_string(),
                    reason: "timeout must be positive".to_string(),
                });
            }
            settings.http_timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = lookup("HARVESTER_PAGE_SIZE") {
            let size: u32 = raw.trim().parse().map_err(|_| ValidationError::InvalidSetting {
                name: "HARVESTER_PAGE_SIZE".to_string(),
                reason: format!("'{raw}' is not a number"),
            })?;
            settings.page_size = validate_page_size(size)?;
        }

        if let Some(agent) = lookup("HARVESTER_USER_AGENT").filter(|a| !a.trim().is_empty()) {
            settings.user_agent = agent;
        }

        Ok(settings)
    }
}

/// Validate a GetRecords page size.
///
/// # Examples
/// ```
/// use catalog_harvester::config::validate_page_size;
///
/// assert_eq!(validate_page_size(10).ok(), Some(10));
/// assert!(validate_page_size(0).is_err());
/// ```
pub fn validate_page_size(size: u32) -> Result<u32, ValidationError> {
    if (1..=MAX_PAGE_SIZE).contains(&size) {
        Ok(size)
    } else {
        Err(ValidationError::InvalidSetting {
            name: "page size".to_string(),
            reason: format!("{size} is outside 1..={MAX_PAGE_SIZE}"),
        })
    }
}

/// Parse a `host:port` proxy specification.
///
/// # Examples
/// ```
/// use catalog_harvester::config::parse_proxy;
///
/// assert_eq!(parse_proxy("proxy.local:3128").ok(), Some(("proxy.local".to_string(), 3128)));
/// assert!(parse_proxy("proxy.local").is_err());
/// ```
pub fn parse_proxy(spec: &str) -> Result<(String, u16), ValidationError> {
    let invalid = || ValidationError::InvalidSetting {
        name: "proxy".to_string(),
        reason: format!("'{spec}' is not host:port"),
    };

    let (host, port) = spec.rsplit_once(':').ok_or_else(invalid)?;
    if host.is_empty() {
        return Err(invalid());
    }
    let port = port.parse::<u16>().map_err(|_| invalid())?;
    Ok((host.to_string(), port))
}
