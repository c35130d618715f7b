//! CSW 2.0.2 protocol support: element sets, request builders and response
//! parsing.

pub mod element_set;
pub mod records;
pub mod request;

pub use element_set::ElementSetName;
pub use records::{
    parse_exception_report, parse_get_records_response, parse_record, RecordCandidate,
    SearchResults, KNOWN_FIELDS,
};
pub use request::{apply_get_capabilities, get_capabilities_element, GetRecordsRequest};
