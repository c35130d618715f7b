//! Lifecycle of a single harvest run.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StateError;
use crate::report::HarvestReport;

/// Run status. `Succeeded` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    #[default]
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl RunStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a running harvest ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Succeeded,
    Failed,
}

impl From<RunOutcome> for RunStatus {
    fn from(outcome: RunOutcome) -> Self {
        match outcome {
            RunOutcome::Succeeded => RunStatus::Succeeded,
            RunOutcome::Failed => RunStatus::Failed,
        }
    }
}

/// One execution of a harvest job.
///
/// Created `PENDING`; [`start`](Self::start) moves it to `RUNNING` and
/// [`finish`](Self::finish) to a terminal status, attaching the report. End
/// time and report are set exactly once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestRun {
    status: RunStatus,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    report: Option<HarvestReport>,
}

impl HarvestRun {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    pub fn report(&self) -> Option<&HarvestReport> {
        self.report.as_ref()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// `PENDING -> RUNNING`.
    pub fn start(&mut self) -> Result<(), StateError> {
        self.start_at(Utc::now())
    }

    pub fn start_at(&mut self, at: DateTime<Utc>) -> Result<(), StateError> {
        self.require(RunStatus::Pending, RunStatus::Running)?;
        self.status = RunStatus::Running;
        self.start_time = Some(at);
        Ok(())
    }

    /// `RUNNING -> SUCCEEDED | FAILED`, attaching the finalized report.
    pub fn finish(&mut self, outcome: RunOutcome, report: HarvestReport) -> Result<(), StateError> {
        self.finish_at(outcome, report, Utc::now())
    }

    /// Like [`finish`](Self::finish) with an explicit end time.
    ///
    /// An end time earlier than the start time is clamped to the start time.
    pub fn finish_at(
        &mut self,
        outcome: RunOutcome,
        report: HarvestReport,
        at: DateTime<Utc>,
    ) -> Result<(), StateError> {
        let target = RunStatus::from(outcome);
        self.require(RunStatus::Running, target)?;
        let end = match self.start_time {
            Some(start) if at < start => start,
            _ => at,
        };
        self.status = target;
        self.end_time = Some(end);
        self.report = Some(report);
        Ok(())
    }

    /// Finish as `FAILED` with whatever was accumulated.
    pub fn fail(&mut self, report: HarvestReport) -> Result<(), StateError> {
        self.finish(RunOutcome::Failed, report)
    }

    fn require(&self, expected: RunStatus, to: RunStatus) -> Result<(), StateError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(StateError::InvalidTransition {
                from: self.status,
                to,
            })
        }
    }
}

/// Cooperative cancellation shared between a run and whoever may cancel it.
///
/// Cancelling never interrupts a request already on the wire; the run stops
/// before issuing the next one.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{RecordCategory, ReportAggregator, ReportErrorType};
    use chrono::Duration;

    #[test]
    fn test_successful_run_with_report() {
        let mut run = HarvestRun::new();
        run.start().unwrap();

        let mut aggregator = ReportAggregator::new();
        for _ in 0..100 {
            aggregator.record_accepted(RecordCategory::Public);
        }
        aggregator.record_error("title", ReportErrorType::RequiredFieldError);

        run.finish(RunOutcome::Succeeded, aggregator.finalize()).unwrap();

        assert_eq!(run.status(), RunStatus::Succeeded);
        let report = run.report().unwrap();
        assert_eq!(report.public_records(), 100);
        assert_eq!(report.errors().len(), 1);
        let (start, end) = (run.start_time().unwrap(), run.end_time().unwrap());
        assert!(end >= start);
    }

    #[test]
    fn test_finish_on_pending_run_fails_without_change() {
        let mut run = HarvestRun::new();
        let before = run.clone();

        let err = run
            .finish(RunOutcome::Succeeded, HarvestReport::default())
            .unwrap_err();

        assert_eq!(
            err,
            StateError::InvalidTransition {
                from: RunStatus::Pending,
                to: RunStatus::Succeeded,
            }
        );
        assert_eq!(run, before);
    }

    #[test]
    fn test_terminal_states_are_absorbing() {
        let mut run = HarvestRun::new();
        run.start().unwrap();
        run.fail(HarvestReport::default()).unwrap();

        assert!(run.is_terminal());
        assert!(run.start().is_err());
        assert!(run.finish(RunOutcome::Succeeded, HarvestReport::default()).is_err());
        assert_eq!(run.status(), RunStatus::Failed);
    }

    #[test]
    fn test_start_twice_fails() {
        let mut run = HarvestRun::new();
        run.start().unwrap();
        assert_eq!(
            run.start(),
            Err(StateError::InvalidTransition {
                from: RunStatus::Running,
                to: RunStatus::Running,
            })
        );
    }

    #[test]
    fn test_end_time_is_clamped_to_start() {
        let start = Utc::now();
        let mut run = HarvestRun::new();
        run.start_at(start).unwrap();
        run.finish_at(RunOutcome::Succeeded, HarvestReport::default(), start - Duration::seconds(5))
            .unwrap();
        assert_eq!(run.end_time(), Some(start));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(RunStatus::Pending.to_string(), "PENDING");
        assert_eq!(RunStatus::Failed.to_string(), "FAILED");
    }

    #[test]
    fn test_cancellation_is_shared() {
        let flag = CancellationFlag::new();
        let other = flag.clone();
        assert!(!other.is_cancelled());
        flag.cancel();
        assert!(other.is_cancelled());
    }
}
