//! Harvest orchestration: paging through a catalog and tallying records.

use crate::config::DEFAULT_PAGE_SIZE;
use crate::csw::{
    parse_get_records_response, ElementSetName, GetRecordsRequest, RecordCandidate, KNOWN_FIELDS,
};
use crate::error::Result;
use crate::report::{RecordCategory, ReportAggregator, ReportErrorType, WarningKind};
use crate::run::{CancellationFlag, HarvestRun, RunOutcome};
use crate::transport::{Method, XmlRequest};

/// Field name recorded for failures of the remote service itself.
pub const SERVICE_FIELD: &str = "service";

/// Parameters of one catalog harvest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestOptions {
    pub element_set: ElementSetName,
    pub method: Method,
    pub page_size: u32,
    /// Stop after this many records have been processed.
    pub max_records: Option<u64>,
    /// Fields every accepted record must carry.
    pub required_fields: Vec<String>,
}

impl Default for HarvestOptions {
    fn default() -> Self {
        Self {
            element_set: ElementSetName::default(),
            method: Method::Post,
            page_size: DEFAULT_PAGE_SIZE,
            max_records: None,
            required_fields: Vec::new(),
        }
    }
}

/// Whether a candidate made it into the harvest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateOutcome {
    Accepted,
    Rejected,
}

/// Progress after each page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageProgress {
    pub processed: u64,
    pub matched: u64,
}

/// Validate one candidate and record the result.
///
/// Each missing required field is an error and rejects the record. Each
/// missing optional field is a warning. A present but invalid bounding box is
/// an error on `bbox`. Accepted records are counted once by access
/// (public/restricted) and once by data kind (raster/vector).
pub fn process_candidate(
    aggregator: &mut ReportAggregator,
    candidate: &RecordCandidate,
    required_fields: &[String],
) -> CandidateOutcome {
    let mut rejected = false;

    for field in required_fields {
        if !candidate.has_field(field) {
            aggregator.record_error(field.as_str(), ReportErrorType::RequiredFieldError);
            rejected = true;
        }
    }

    for field in KNOWN_FIELDS {
        if !candidate.has_field(field) && !required_fields.iter().any(|r| r == field) {
            aggregator.record_warning(WarningKind::UnrequiredField);
        }
    }

    if let Some(bounds) = &candidate.bounds {
        if let Err(issue) = bounds.check() {
            tracing::debug!(
                identifier = candidate.identifier.as_deref().unwrap_or("?"),
                %issue,
                "rejecting record bounding box"
            );
            aggregator.record_error("bbox", ReportErrorType::InvalidBoundsError);
            rejected = true;
        }
    }

    if rejected {
        return CandidateOutcome::Rejected;
    }

    aggregator.record_accepted(if candidate.is_restricted() {
        RecordCategory::Restricted
    } else {
        RecordCategory::Public
    });
    aggregator.record_accepted(if candidate.is_raster() {
        RecordCategory::Raster
    } else {
        RecordCategory::Vector
    });
    CandidateOutcome::Accepted
}

/// Harvest a catalog with `client` and return the finished run.
pub fn harvest_catalog(
    client: &mut XmlRequest,
    options: &HarvestOptions,
    cancel: &CancellationFlag,
) -> Result<HarvestRun> {
    harvest_catalog_with_progress(client, options, cancel, |_| {})
}

/// Like [`harvest_catalog`], calling `on_page` after every processed page.
///
/// Paging stops when the service reports no further records, when
/// `max_records` is reached, or when `cancel` is set. A failed request or an
/// exception report ends the run as `FAILED`, keeping the partial report.
pub fn harvest_catalog_with_progress<F>(
    client: &mut XmlRequest,
    options: &HarvestOptions,
    cancel: &CancellationFlag,
    mut on_page: F,
) -> Result<HarvestRun>
where
    F: FnMut(PageProgress),
{
    let mut run = HarvestRun::new();
    run.start()?;
    tracing::info!(target_url = %client.target(), element_set = %options.element_set, "harvest started");

    let mut aggregator = ReportAggregator::new();
    let mut outcome = RunOutcome::Succeeded;
    let mut position: u64 = 1;
    let mut processed: u64 = 0;
    let page_size = u64::from(options.page_size.max(1));

    // A literal query would replace the GET parameters, so its pairs are sent
    // ahead of them instead and the query is restored afterwards.
    let (literal_query, base_params) = match options.method {
        Method::Get => {
            let pairs = client.target().query_pairs();
            let query = client.target().query().map(str::to_string);
            client.target_mut().set_query(None);
            (query, pairs)
        }
        Method::Post => (None, Vec::new()),
    };

    loop {
        if cancel.is_cancelled() {
            tracing::warn!(processed, "harvest cancelled");
            outcome = RunOutcome::Failed;
            break;
        }

        let remaining = options.max_records.map(|max| max.saturating_sub(processed));
        let want = match remaining {
            Some(0) => break,
            Some(left) => left.min(page_size),
            None => page_size,
        };
        let want = u32::try_from(want).unwrap_or(options.page_size);

        GetRecordsRequest::new(options.element_set, position, want).apply_with(
            client,
            options.method,
            &base_params,
        );

        let response = match client.execute() {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(position, error = %e, "GetRecords request failed");
                aggregator.record_error(SERVICE_FIELD, ReportErrorType::WebServiceError);
                outcome = RunOutcome::Failed;
                break;
            }
        };

        let results = match parse_get_records_response(&response.element) {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!(position, error = %e, "catalog did not return search results");
                aggregator.record_error(SERVICE_FIELD, ReportErrorType::WebServiceError);
                outcome = RunOutcome::Failed;
                break;
            }
        };

        if results.returned != results.records.len() as u64 {
            tracing::warn!(
                announced = results.returned,
                received = results.records.len(),
                "record count mismatch in search results"
            );
            aggregator.record_warning(WarningKind::WebService);
        }

        let take = usize::try_from(want).unwrap_or(usize::MAX);
        if results.records.len() > take {
            tracing::warn!(
                requested = want,
                received = results.records.len(),
                "page holds more records than requested; extra records skipped"
            );
            aggregator.record_warning(WarningKind::WebService);
        }
        for candidate in results.records.iter().take(take) {
            process_candidate(&mut aggregator, candidate, &options.required_fields);
            processed += 1;
        }

        tracing::info!(position, processed, matched = results.matched, "processed page");
        on_page(PageProgress {
            processed,
            matched: results.matched,
        });

        if results.records.is_empty() || results.next_record == 0 {
            break;
        }
        if results.next_record > results.matched {
            break;
        }
        if results.next_record <= position {
            tracing::warn!(
                position,
                next_record = results.next_record,
                "nextRecord does not advance"
            );
            aggregator.record_warning(WarningKind::WebService);
            break;
        }
        position = results.next_record;
    }

    if literal_query.is_some() {
        client.target_mut().set_query(literal_query);
    }
    run.finish(outcome, aggregator.finalize())?;
    tracing::info!(status = %run.status(), processed, "harvest finished");
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::TextBounds;
    use crate::report::HarvestReport;

    fn complete_candidate() -> RecordCandidate {
        RecordCandidate {
            identifier: Some("id".to_string()),
            title: Some("Roads".to_string()),
            abstract_text: Some("Road network".to_string()),
            subjects: vec!["transport".to_string()],
            record_type: Some("dataset".to_string()),
            rights: None,
            modified: Some("2024-01-01".to_string()),
            bounds: Some(TextBounds::new("-75", "40", "-70", "45")),
        }
    }

    fn run_one(candidate: &RecordCandidate, required: &[&str]) -> (CandidateOutcome, HarvestReport) {
        let required: Vec<String> = required.iter().map(|f| f.to_string()).collect();
        let mut aggregator = ReportAggregator::new();
        let outcome = process_candidate(&mut aggregator, candidate, &required);
        (outcome, aggregator.finalize())
    }

    #[test]
    fn test_accepted_record_counts_twice() {
        let (outcome, report) = run_one(&complete_candidate(), &["title"]);
        assert_eq!(outcome, CandidateOutcome::Accepted);
        assert_eq!(report.public_records(), 1);
        assert_eq!(report.vector_records(), 1);
        // rights is missing but optional
        assert_eq!(report.unrequired_field_warnings(), 1);
        assert!(report.errors().is_empty());
    }

    #[test]
    fn test_missing_required_fields_reject() {
        let candidate = RecordCandidate {
            title: None,
            modified: None,
            ..complete_candidate()
        };
        let (outcome, report) = run_one(&candidate, &["title", "modified"]);

        assert_eq!(outcome, CandidateOutcome::Rejected);
        let fields: Vec<&str> = report.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["title", "modified"]);
        assert_eq!(report.public_records(), 0);
    }

    #[test]
    fn test_invalid_bounds_reject() {
        let candidate = RecordCandidate {
            bounds: Some(TextBounds::new("-70", "40", "-75", "45")),
            ..complete_candidate()
        };
        let (outcome, report) = run_one(&candidate, &[]);

        assert_eq!(outcome, CandidateOutcome::Rejected);
        assert_eq!(report.errors()[0].field, "bbox");
        assert_eq!(report.errors()[0].error_type, ReportErrorType::InvalidBoundsError);
    }

    #[test]
    fn test_restricted_raster_record() {
        let candidate = RecordCandidate {
            rights: Some("otherRestrictions".to_string()),
            record_type: Some("image".to_string()),
            ..complete_candidate()
        };
        let (_, report) = run_one(&candidate, &[]);
        assert_eq!(report.restricted_records(), 1);
        assert_eq!(report.raster_records(), 1);
        assert_eq!(report.unrequired_field_warnings(), 0);
    }

    #[test]
    fn test_cancelled_before_first_request() {
        let mut client =
            XmlRequest::from_url("http://127.0.0.1:9/csw", crate::transport::TransportConfig::default())
                .unwrap();
        let cancel = CancellationFlag::new();
        cancel.cancel();

        let run = harvest_catalog(&mut client, &HarvestOptions::default(), &cancel).unwrap();
        assert_eq!(run.status(), crate::run::RunStatus::Failed);
        assert_eq!(run.report(), Some(&HarvestReport::default()));
    }
}
