//! Per-run harvest statistics and field-level errors.
//!
//! A [`ReportAggregator`] is append-only while a run is in progress.
//! [`ReportAggregator::finalize`] consumes it, so nothing can be recorded
//! after the report is frozen.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of a recorded anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportErrorType {
    /// A field the job requires is missing.
    RequiredFieldError,
    InvalidBoundsError,
    /// The remote service failed or answered with an exception.
    WebServiceError,
    SystemError,
}

impl ReportErrorType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RequiredFieldError => "REQUIRED_FIELD_ERROR",
            Self::InvalidBoundsError => "INVALID_BOUNDS_ERROR",
            Self::WebServiceError => "WEB_SERVICE_ERROR",
            Self::SystemError => "SYSTEM_ERROR",
        }
    }
}

impl fmt::Display for ReportErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One anomaly, tied to the field it concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportError {
    pub field: String,
    pub error_type: ReportErrorType,
}

/// Counter bumped for an accepted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordCategory {
    Public,
    Restricted,
    Raster,
    Vector,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    WebService,
    UnrequiredField,
}

/// Finalized outcome of one harvest run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestReport {
    public_records: u64,
    restricted_records: u64,
    raster_records: u64,
    vector_records: u64,
    web_service_warnings: u64,
    unrequired_field_warnings: u64,
    errors: Vec<ReportError>,
}

impl HarvestReport {
    pub fn public_records(&self) -> u64 {
        self.public_records
    }

    pub fn restricted_records(&self) -> u64 {
        self.restricted_records
    }

    pub fn raster_records(&self) -> u64 {
        self.raster_records
    }

    pub fn vector_records(&self) -> u64 {
        self.vector_records
    }

    pub fn web_service_warnings(&self) -> u64 {
        self.web_service_warnings
    }

    pub fn unrequired_field_warnings(&self) -> u64 {
        self.unrequired_field_warnings
    }

    /// Errors in the order they were recorded, duplicates included.
    pub fn errors(&self) -> &[ReportError] {
        &self.errors
    }

    /// Errors of one kind.
    pub fn errors_of(&self, error_type: ReportErrorType) -> impl Iterator<Item = &ReportError> {
        self.errors
            .iter()
            .filter(move |error| error.error_type == error_type)
    }
}

/// Mutable accumulator for the report of a run in progress.
#[derive(Debug, Default)]
pub struct ReportAggregator {
    report: HarvestReport,
}

impl ReportAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_accepted(&mut self, category: RecordCategory) {
        let counter = match category {
            RecordCategory::Public => &mut self.report.public_records,
            RecordCategory::Restricted => &mut self.report.restricted_records,
            RecordCategory::Raster => &mut self.report.raster_records,
            RecordCategory::Vector => &mut self.report.vector_records,
        };
        *counter = counter.saturating_add(1);
    }

    pub fn record_warning(&mut self, kind: WarningKind) {
        let counter = match kind {
            WarningKind::WebService => &mut self.report.web_service_warnings,
            WarningKind::UnrequiredField => &mut self.report.unrequired_field_warnings,
        };
        *counter = counter.saturating_add(1);
    }

    pub fn record_error(&mut self, field: impl Into<String>, error_type: ReportErrorType) {
        self.report.errors.push(ReportError {
            field: field.into(),
            error_type,
        });
    }

    /// Read-only view of what has been recorded so far.
    pub fn snapshot(&self) -> &HarvestReport {
        &self.report
    }

    /// Freeze the report.
    #[must_use]
    pub fn finalize(self) -> HarvestReport {
        self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_counts_accumulate() {
        let mut aggregator = ReportAggregator::new();
        for _ in 0..3 {
            aggregator.record_accepted(RecordCategory::Public);
        }
        aggregator.record_accepted(RecordCategory::Restricted);
        aggregator.record_accepted(RecordCategory::Raster);
        aggregator.record_accepted(RecordCategory::Vector);
        aggregator.record_warning(WarningKind::WebService);
        aggregator.record_warning(WarningKind::UnrequiredField);
        aggregator.record_warning(WarningKind::UnrequiredField);

        let report = aggregator.finalize();
        assert_eq!(report.public_records(), 3);
        assert_eq!(report.restricted_records(), 1);
        assert_eq!(report.raster_records(), 1);
        assert_eq!(report.vector_records(), 1);
        assert_eq!(report.web_service_warnings(), 1);
        assert_eq!(report.unrequired_field_warnings(), 2);
    }

    #[test]
    fn test_errors_keep_order_and_duplicates() {
        let mut aggregator = ReportAggregator::new();
        aggregator.record_error("title", ReportErrorType::RequiredFieldError);
        aggregator.record_error("bbox", ReportErrorType::InvalidBoundsError);
        aggregator.record_error("title", ReportErrorType::RequiredFieldError);

        let report = aggregator.finalize();
        let fields: Vec<&str> = report.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["title", "bbox", "title"]);
        assert_eq!(report.errors_of(ReportErrorType::RequiredFieldError).count(), 2);
    }

    #[test]
    fn test_error_type_serializes_in_upper_snake_case() {
        let error = ReportError {
            field: "title".to_string(),
            error_type: ReportErrorType::RequiredFieldError,
        };
        let json = serde_json::to_string(&error).unwrap();
        assert_eq!(json, r#"{"field":"title","error_type":"REQUIRED_FIELD_ERROR"}"#);
    }

    #[test]
    fn test_snapshot_reflects_progress() {
        let mut aggregator = ReportAggregator::new();
        aggregator.record_accepted(RecordCategory::Vector);
        assert_eq!(aggregator.snapshot().vector_records(), 1);
    }
}
