//! XML and SOAP transport to remote catalog services.
//!
//! [`XmlRequest`] builds one GET or POST request per call, optionally inside a
//! SOAP 1.2 envelope, and returns the parsed response together with a
//! [`TransportExchange`] describing what went over the wire.

pub mod auth;
pub mod client;
pub mod exchange;
pub mod payload;
pub mod soap;
pub mod target;

pub use auth::{
    digest_response, parse_challenges, select_digest, AuthChallenge, Credentials, DigestChallenge,
    DigestSession,
};
pub use client::{ProxyConfig, TransportConfig, XmlRequest, XmlResponse};
pub use exchange::TransportExchange;
pub use payload::{Method, RequestPayload};
pub use soap::{soap_embed, soap_unembed};
pub use target::RequestTarget;
