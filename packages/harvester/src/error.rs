//! Error types for the harvester.
//!
//! Each concern has its own error type (transport, catalog responses,
//! validation, run state, persistence). `HarvesterError` wraps them all for library consumers that
//! only want a single error to propagate.

use thiserror::Error;

use crate::run::RunStatus;
use crate::transport::TransportExchange;

/// Failure while talking to a remote catalog service.
///
/// Every variant carries the [`TransportExchange`] captured for the attempt,
/// so the raw request and response stay available for post-mortem inspection.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The response body is not well-formed XML.
    #[error("response is not well-formed XML: {source}")]
    BadXmlResponse {
        /// Raw response body, decoded as UTF-8 (lossy).
        body: String,
        #[source]
        source: roxmltree::Error,
        exchange: TransportExchange,
    },

    /// The response is XML but not a usable SOAP envelope.
    #[error("SOAP envelope has no body content")]
    BadSoapResponse {
        /// The serialized envelope that was received.
        body: String,
        exchange: TransportExchange,
    },

    /// Connecting, sending or receiving failed.
    #[error("network failure: {source}")]
    NetworkFailure {
        #[source]
        source: reqwest::Error,
        exchange: TransportExchange,
    },

    /// The request target cannot be turned into a URL.
    #[error("invalid request target '{target}': {reason}")]
    InvalidTarget {
        target: String,
        reason: String,
        exchange: TransportExchange,
    },

    /// A file to upload could not be read.
    #[error("cannot read upload file '{path}': {source}")]
    UnreadableFile {
        path: String,
        #[source]
        source: std::io::Error,
        exchange: TransportExchange,
    },
}

impl TransportError {
    /// The request/response rendering captured for the failed attempt.
    pub fn exchange(&self) -> &TransportExchange {
        match self {
            Self::BadXmlResponse { exchange, .. }
            | Self::BadSoapResponse { exchange, .. }
            | Self::NetworkFailure { exchange, .. }
            | Self::InvalidTarget { exchange, .. }
            | Self::UnreadableFile { exchange, .. } => exchange,
        }
    }

    /// The offending response body, for the variants that have one.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::BadXmlResponse { body, .. } | Self::BadSoapResponse { body, .. } => Some(body),
            Self::NetworkFailure { .. }
            | Self::InvalidTarget { .. }
            | Self::UnreadableFile { .. } => None,
        }
    }
}

/// A well-formed response that does not carry usable catalog results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The service answered with an OWS `ExceptionReport`.
    #[error("service exception {code}: {text}")]
    Exception {
        code: String,
        locator: Option<String>,
        text: String,
    },

    /// The root element is neither results nor an exception report.
    #[error("unexpected response element '{0}'")]
    UnexpectedResponse(String),

    /// A result count attribute is missing or not a number.
    #[error("invalid {attribute} '{value}' in search results")]
    InvalidCount { attribute: String, value: String },
}

/// Invalid input supplied by a caller or a remote service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A protocol parameter has a value outside its vocabulary.
    #[error("invalid value '{value}' for parameter '{parameter}'")]
    InvalidParameterValue { parameter: String, value: String },

    /// A bounding box failed validation.
    #[error("invalid bounding box: {0}")]
    InvalidBounds(String),

    /// A setting (environment or CLI) could not be used.
    #[error("invalid setting {name}: {reason}")]
    InvalidSetting { name: String, reason: String },
}

/// Misuse of the harvest run lifecycle.
///
/// These are programming errors: correct orchestration never triggers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("invalid run transition from {from} to {to}")]
    InvalidTransition { from: RunStatus, to: RunStatus },
}

/// Failure of a job repository.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("repository IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("repository serialization failed: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("no harvest job with id {0}")]
    NotFound(u64),

    #[error("a harvest job named '{0}' already exists")]
    DuplicateName(String),
}

/// Main error type for the harvester library.
#[derive(Debug, Error)]
pub enum HarvesterError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Building the underlying HTTP client failed.
    #[error("HTTP client setup failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, HarvesterError>;
