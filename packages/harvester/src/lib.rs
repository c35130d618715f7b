//! Catalog Harvester - Harvest geospatial metadata from CSW catalogs.
//!
//! This crate talks to remote catalog services over plain XML or SOAP,
//! validates the records they return and produces a structured report for
//! every harvest run.
//!
//! # Example
//!
//! ```
//! use catalog_harvester::bbox::validate_bounds;
//! use catalog_harvester::csw::ElementSetName;
//!
//! assert!(validate_bounds(-75.0, 40.0, -70.0, 45.0));
//! assert_eq!(ElementSetName::parse(None).unwrap(), ElementSetName::Summary);
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Constants, environment settings and validation
//! - [`error`]: Error types and Result alias
//! - [`xml`]: Owned XML tree, navigation helpers and serialization
//! - [`http`]: HTTP client construction
//! - [`transport`]: XML/SOAP request client with auth, redirects and diagnostics
//! - [`csw`]: CSW element sets, request builders and response parsing
//! - [`bbox`]: Bounding box validation
//! - [`report`]: Per-run statistics and field errors
//! - [`run`]: Harvest run state machine and cancellation
//! - [`harvester`]: Harvest orchestration
//! - [`types`]: Harvest job configuration
//! - [`repository`]: Job storage
//! - [`cli`]: Command-line interface

pub mod bbox;
pub mod cli;
pub mod config;
pub mod csw;
pub mod error;
pub mod harvester;
pub mod http;
pub mod report;
pub mod repository;
pub mod run;
pub mod transport;
pub mod types;
pub mod xml;

// Re-export main functions
pub use harvester::{harvest_catalog, process_candidate, HarvestOptions};

// Re-export commonly used items
pub use bbox::validate_bounds;
pub use csw::ElementSetName;
pub use error::{HarvesterError, Result};
pub use report::{HarvestReport, ReportAggregator, ReportError, ReportErrorType};
pub use run::{CancellationFlag, HarvestRun, RunOutcome, RunStatus};
pub use transport::{TransportConfig, XmlRequest, XmlResponse};
pub use types::{CatalogKind, Frequency, Ingest};
