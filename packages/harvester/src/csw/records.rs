//! Parsing of `GetRecords` responses into record candidates.

use serde::{Deserialize, Serialize};

use crate::bbox::TextBounds;
use crate::config::{CSW_NAMESPACE, DCT_NAMESPACE, DC_NAMESPACE, OWS_NAMESPACE};
use crate::error::CatalogError;
use crate::xml::{find_child_ns, get_attribute, get_text, Element};

/// Fields extracted from one catalog record, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordCandidate {
    pub identifier: Option<String>,
    pub title: Option<String>,
    pub abstract_text: Option<String>,
    pub subjects: Vec<String>,
    pub record_type: Option<String>,
    pub rights: Option<String>,
    pub modified: Option<String>,
    pub bounds: Option<TextBounds>,
}

/// Candidate fields that a harvest job can require.
pub const KNOWN_FIELDS: [&str; 8] = [
    "identifier",
    "title",
    "abstract",
    "subject",
    "type",
    "rights",
    "modified",
    "bbox",
];

impl RecordCandidate {
    /// Whether the named field carries a value.
    ///
    /// Unknown field names are never present.
    pub fn has_field(&self, field: &str) -> bool {
        match field {
            "identifier" => self.identifier.is_some(),
            "title" => self.title.is_some(),
            "abstract" => self.abstract_text.is_some(),
            "subject" => !self.subjects.is_empty(),
            "type" => self.record_type.is_some(),
            "rights" => self.rights.is_some(),
            "modified" => self.modified.is_some(),
            "bbox" => self.bounds.is_some(),
            _ => false,
        }
    }

    /// Access is restricted when the rights statement says so.
    pub fn is_restricted(&self) -> bool {
        self.rights.as_deref().is_some_and(|rights| {
            let rights = rights.to_lowercase();
            rights.contains("restrict") && !rights.contains("unrestrict")
        })
    }

    /// Gridded data (raster, image, coverage) as opposed to vector data.
    pub fn is_raster(&self) -> bool {
        self.record_type.as_deref().is_some_and(|kind| {
            let kind = kind.to_lowercase();
            ["raster", "grid", "image", "coverage"]
                .iter()
                .any(|k| kind.contains(k))
        })
    }
}

/// One page of `GetRecords` results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResults {
    pub matched: u64,
    pub returned: u64,
    /// Position of the next record, 0 when there is none.
    pub next_record: u64,
    pub records: Vec<RecordCandidate>,
}

/// Parse a `GetRecordsResponse` (or the `ExceptionReport` sent instead).
pub fn parse_get_records_response(root: &Element) -> Result<SearchResults, CatalogError> {
    if root.local_name() == "ExceptionReport" {
        return Err(parse_exception_report(root));
    }
    if root.local_name() != "GetRecordsResponse" {
        return Err(CatalogError::UnexpectedResponse(root.local_name().to_string()));
    }

    let results = root
        .child_elements()
        .find(|child| child.local_name() == "SearchResults")
        .ok_or_else(|| CatalogError::UnexpectedResponse("GetRecordsResponse without SearchResults".to_string()))?;

    let matched = count_attribute(results, "numberOfRecordsMatched")?;
    let returned = count_attribute(results, "numberOfRecordsReturned")?;
    let next_record = match get_attribute(results, "nextRecord") {
        Some(_) => count_attribute(results, "nextRecord")?,
        None => 0,
    };

    let records = results
        .child_elements()
        .filter(|child| {
            child.namespace() == Some(CSW_NAMESPACE)
                && matches!(child.local_name(), "Record" | "SummaryRecord" | "BriefRecord")
        })
        .map(parse_record)
        .collect();

    Ok(SearchResults {
        matched,
        returned,
        next_record,
        records,
    })
}

fn count_attribute(element: &Element, name: &str) -> Result<u64, CatalogError> {
    let raw = get_attribute(element, name).unwrap_or_default();
    raw.trim()
        .parse()
        .map_err(|_| CatalogError::InvalidCount {
            attribute: name.to_string(),
            value: raw.to_string(),
        })
}

/// Turn an OWS `ExceptionReport` into a catalog error.
pub fn parse_exception_report(root: &Element) -> CatalogError {
    let exception = root
        .child_elements()
        .find(|child| child.local_name() == "Exception");

    match exception {
        Some(exception) => CatalogError::Exception {
            code: get_attribute(exception, "exceptionCode")
                .unwrap_or("NoApplicableCode")
                .to_string(),
            locator: get_attribute(exception, "locator").map(str::to_string),
            text: exception
                .child_elements()
                .filter(|child| child.local_name() == "ExceptionText")
                .map(get_text)
                .collect::<Vec<_>>()
                .join("; "),
        },
        None => CatalogError::Exception {
            code: "NoApplicableCode".to_string(),
            locator: None,
            text: get_text(root),
        },
    }
}

fn dc_text(record: &Element, namespace: &str, tag: &str) -> Option<String> {
    find_child_ns(record, namespace, tag)
        .map(get_text)
        .filter(|text| !text.is_empty())
}

/// Extract the Dublin Core fields of one `csw:Record`-like element.
pub fn parse_record(record: &Element) -> RecordCandidate {
    let subjects = record
        .child_elements()
        .filter(|child| child.namespace() == Some(DC_NAMESPACE) && child.local_name() == "subject")
        .map(get_text)
        .filter(|text| !text.is_empty())
        .collect();

    RecordCandidate {
        identifier: dc_text(record, DC_NAMESPACE, "identifier"),
        title: dc_text(record, DC_NAMESPACE, "title"),
        abstract_text: dc_text(record, DCT_NAMESPACE, "abstract")
            .or_else(|| dc_text(record, DC_NAMESPACE, "description")),
        subjects,
        record_type: dc_text(record, DC_NAMESPACE, "type"),
        rights: dc_text(record, DC_NAMESPACE, "rights")
            .or_else(|| dc_text(record, DCT_NAMESPACE, "accessRights")),
        modified: dc_text(record, DCT_NAMESPACE, "modified")
            .or_else(|| dc_text(record, DC_NAMESPACE, "date")),
        bounds: record
            .child_elements()
            .find(|child| {
                child.namespace() == Some(OWS_NAMESPACE)
                    && matches!(child.local_name(), "BoundingBox" | "WGS84BoundingBox")
            })
            .and_then(parse_bounding_box),
    }
}

/// Read `ows:BoundingBox` corners as `(min_x, min_y, max_x, max_y)` text.
///
/// OGC URN forms of EPSG:4326 list latitude first; every other CRS (and a
/// missing one) is read as longitude first.
fn parse_bounding_box(bbox: &Element) -> Option<TextBounds> {
    let lower = find_child_ns(bbox, OWS_NAMESPACE, "LowerCorner").map(get_text)?;
    let upper = find_child_ns(bbox, OWS_NAMESPACE, "UpperCorner").map(get_text)?;

    let (lower_a, lower_b) = split_corner(&lower)?;
    let (upper_a, upper_b) = split_corner(&upper)?;

    let lat_first = bbox.local_name() == "BoundingBox"
        && get_attribute(bbox, "crs").is_some_and(is_lat_lon_crs);

    Some(if lat_first {
        TextBounds::new(lower_b, lower_a, upper_b, upper_a)
    } else {
        TextBounds::new(lower_a, lower_b, upper_a, upper_b)
    })
}

fn split_corner(corner: &str) -> Option<(&str, &str)> {
    let mut parts = corner.split_whitespace();
    let first = parts.next()?;
    let second = parts.next()?;
    Some((first, second))
}

fn is_lat_lon_crs(crs: &str) -> bool {
    let crs = crs.trim();
    crs.starts_with("urn:ogc:def:crs:EPSG:") && crs.ends_with(":4326")
}
