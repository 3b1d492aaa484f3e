//! The sweep loop.

use chrono::{DateTime, Utc};
use lethe_core::{
  expiry::{Evaluation, ExpiryEvaluator},
  record::PersonalDataRecord,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One tagged value as exported from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
  /// Identifies the owning row.
  pub id:     Uuid,
  /// The owning entity or table, e.g. `customer`.
  pub entity: String,
  /// The column holding the value, e.g. `email`.
  pub field:  String,
  pub record: PersonalDataRecord,
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepFailure {
  pub id:     Uuid,
  pub entity: String,
  pub field:  String,
  pub error:  String,
}

/// Tally of a sweep.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
  pub disposed:         usize,
  pub retained:         usize,
  pub not_evaluable:    usize,
  pub already_disposed: usize,
  pub failures:         Vec<SweepFailure>,
}

impl SweepReport {
  fn tally(&mut self, outcome: Evaluation) {
    match outcome {
      Evaluation::Disposed { .. } => self.disposed += 1,
      Evaluation::Retained { .. } => self.retained += 1,
      Evaluation::NotEvaluable => self.not_evaluable += 1,
      Evaluation::AlreadyDisposed => self.already_disposed += 1,
    }
  }

  pub fn total(&self) -> usize {
    self.disposed
      + self.retained
      + self.not_evaluable
      + self.already_disposed
      + self.failures.len()
  }

  pub fn is_clean(&self) -> bool { self.failures.is_empty() }
}

/// Evaluate every record at `now`.
///
/// A record whose evaluation fails is left exactly as it was; the failure is
/// logged, recorded in the report, and the sweep continues.
pub fn sweep(records: &mut [StoredRecord], now: DateTime<Utc>) -> SweepReport {
  let evaluator = ExpiryEvaluator::new();
  let mut report = SweepReport::default();

  for stored in records.iter_mut() {
    let span = tracing::info_span!(
      "record",
      id = %stored.id,
      entity = %stored.entity,
      field = %stored.field,
    );
    let _entered = span.enter();

    match evaluator.evaluate(&mut stored.record, now) {
      Ok(outcome) => report.tally(outcome),
      Err(e) => {
        tracing::error!(error = %e, "could not evaluate record; left unchanged");
        report.failures.push(SweepFailure {
          id:     stored.id,
          entity: stored.entity.clone(),
          field:  stored.field.clone(),
          error:  e.to_string(),
        });
      }
    }
  }

  tracing::info!(
    disposed = report.disposed,
    retained = report.retained,
    not_evaluable = report.not_evaluable,
    already_disposed = report.already_disposed,
    failed = report.failures.len(),
    "sweep finished"
  );

  report
}
