//! Expiry evaluation: decide whether a record's retention period has run out
//! and, if so, dispose of its value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Result, disposal::Dispose, record::PersonalDataRecord};

/// The outcome of evaluating one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Evaluation {
  /// No deadline can be computed: the record has no creation date, or the
  /// deadline lies past the last representable date. Not yet due.
  NotEvaluable,
  /// Disposed of by an earlier evaluation; nothing was done.
  AlreadyDisposed,
  Retained { keep_until: DateTime<Utc> },
  Disposed { keep_until: DateTime<Utc> },
}

/// Applies retention policy to records.
///
/// Stateless; a single evaluator can be shared across threads and used for
/// any number of records.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpiryEvaluator;

impl ExpiryEvaluator {
  pub fn new() -> Self { Self }

  /// Whether `record` would be disposed of if evaluated at `now`.
  pub fn is_due(&self, record: &PersonalDataRecord, now: DateTime<Utc>) -> bool {
    !record.is_expired()
      && record
        .created_on()
        .and_then(|created_on| record.retain_for().add_to(created_on))
        .is_some_and(|keep_until| keep_until < now)
  }

  /// Evaluate `record` at `now`, disposing of its value if the retention
  /// period has passed.
  ///
  /// A record is never disposed of twice. If disposal fails the record is
  /// left exactly as it was.
  pub fn evaluate(
    &self,
    record: &mut PersonalDataRecord,
    now: DateTime<Utc>,
  ) -> Result<Evaluation> {
    if record.is_expired() {
      return Ok(Evaluation::AlreadyDisposed);
    }

    let Some(created_on) = record.created_on() else {
      tracing::debug!("record has no creation date; skipping");
      return Ok(Evaluation::NotEvaluable);
    };

    let Some(keep_until) = record.retain_for().add_to(created_on) else {
      tracing::debug!(
        retain_for = %record.retain_for(),
        "retention deadline is beyond the calendar; skipping"
      );
      return Ok(Evaluation::NotEvaluable);
    };

    if keep_until >= now {
      record.cache_keep_until(keep_until);
      tracing::debug!(%keep_until, "record retained");
      return Ok(Evaluation::Retained { keep_until });
    }

    let strategy = record.strategy()?;
    let disposed = strategy.dispose(record.decoded_value(&strategy))?;
    let value = disposed.map(|v| record.encode_value(v));

    record.cache_keep_until(keep_until);
    record.record_disposal(value, now);
    tracing::info!(
      method = %record.dispose_by,
      %keep_until,
      "disposed of expired personal data"
    );

    Ok(Evaluation::Disposed { keep_until })
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Months, TimeZone};
  use serde_json::json;

  use super::*;
  use crate::{
    Error, dispatch::DisposalMethod, disposal::DisposeArgs, record::DataFormat,
  };

  fn created() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2019, 6, 16, 18, 45, 45).unwrap()
  }

  fn record(value: &str, method: DisposalMethod) -> PersonalDataRecord {
    let mut r =
      PersonalDataRecord::new(Some(value.into()), "P1Y", method).unwrap();
    r.mark_created(created());
    r
  }

  fn args(value: serde_json::Value) -> DisposeArgs {
    match value {
      serde_json::Value::Object(map) => map,
      _ => panic!("args must be an object"),
    }
  }

  #[test]
  fn retains_before_the_deadline() {
    let mut r = record("alice@example.com", DisposalMethod::Anonymise);
    let now = created() + Months::new(11);

    let outcome = ExpiryEvaluator::new().evaluate(&mut r, now).unwrap();

    assert_eq!(outcome, Evaluation::Retained {
      keep_until: created() + Months::new(12),
    });
    assert_eq!(r.value(), Some("alice@example.com"));
    assert!(!r.is_expired());
    assert_eq!(r.keep_until(), Some(created() + Months::new(12)));
  }

  #[test]
  fn deadline_itself_is_still_retained() {
    let mut r = record("alice@example.com", DisposalMethod::SetNull);
    let deadline = created() + Months::new(12);

    let outcome = ExpiryEvaluator::new().evaluate(&mut r, deadline).unwrap();
    assert!(matches!(outcome, Evaluation::Retained { .. }));
    assert!(!ExpiryEvaluator::new().is_due(&r, deadline));
  }

  #[test]
  fn disposes_after_the_deadline() {
    let mut r = record("alice@example.com", DisposalMethod::Anonymise);
    let now = created() + Months::new(13);
    assert!(ExpiryEvaluator::new().is_due(&r, now));

    let outcome = ExpiryEvaluator::new().evaluate(&mut r, now).unwrap();

    assert!(matches!(outcome, Evaluation::Disposed { .. }));
    assert_eq!(r.value(), Some("*****************"));
    assert!(r.is_expired());
    assert_eq!(r.updated_on(), Some(now));
  }

  #[test]
  fn second_evaluation_does_not_dispose_again() {
    let mut r = record("alice@example.com", DisposalMethod::RegexReplace);
    r.dispose_by_args = args(json!({ "pattern": "/@.*$/", "replaceWith": "@" }));
    let evaluator = ExpiryEvaluator::new();
    let now = created() + Months::new(13);

    evaluator.evaluate(&mut r, now).unwrap();
    let first = r.value().map(str::to_string);
    assert_eq!(first.as_deref(), Some("alice@@@@@@@@@@@@"));

    let later = now + Months::new(1);
    let outcome = evaluator.evaluate(&mut r, later).unwrap();

    assert_eq!(outcome, Evaluation::AlreadyDisposed);
    assert_eq!(r.value().map(str::to_string), first);
    assert_eq!(r.updated_on(), Some(now));
    assert!(!evaluator.is_due(&r, later));
  }

  #[test]
  fn missing_creation_date_is_never_due() {
    let mut r = PersonalDataRecord::new(
      Some("alice@example.com".into()),
      "PT1S",
      DisposalMethod::SetNull,
    )
    .unwrap();
    let far_future = Utc.with_ymd_and_hms(2999, 1, 1, 0, 0, 0).unwrap();

    let outcome = ExpiryEvaluator::new().evaluate(&mut r, far_future).unwrap();

    assert_eq!(outcome, Evaluation::NotEvaluable);
    assert_eq!(r.value(), Some("alice@example.com"));
    assert_eq!(r.keep_until(), None);
  }

  #[test]
  fn buckets_stored_dates() {
    let mut r = record("2019-06-16 18:45:45", DisposalMethod::AnonymiseDate);
    r.format = DataFormat::Datetime;
    r.dispose_by_args = args(json!({ "type": "QUARTER" }));

    ExpiryEvaluator::new()
      .evaluate(&mut r, created() + Months::new(13))
      .unwrap();

    assert_eq!(r.value(), Some("2019-04-01 00:00:00"));

    let mut r = record("2019-06-16", DisposalMethod::AnonymiseDate);
    r.format = DataFormat::Date;
    r.dispose_by_args = args(json!({ "type": "YEAR" }));

    ExpiryEvaluator::new()
      .evaluate(&mut r, created() + Months::new(13))
      .unwrap();

    assert_eq!(r.value(), Some("2019-01-01"));
  }

  #[test]
  fn failed_disposal_leaves_record_untouched() {
    let mut r = record("alice@example.com", DisposalMethod::RegexReplace);
    let before = r.clone();

    let err = ExpiryEvaluator::new()
      .evaluate(&mut r, created() + Months::new(13))
      .unwrap_err();

    assert!(matches!(err, Error::MissingRequiredArgument { .. }));
    assert_eq!(r, before);
  }

  #[test]
  fn text_in_a_date_field_is_an_error() {
    let mut r = record("sometime in June", DisposalMethod::AnonymiseDate);
    r.format = DataFormat::Date;

    let err = ExpiryEvaluator::new()
      .evaluate(&mut r, created() + Months::new(13))
      .unwrap_err();

    assert!(matches!(err, Error::UnsupportedValue { .. }));
    assert!(!r.is_expired());
  }

  #[test]
  fn absent_value_is_marked_expired() {
    let mut r =
      PersonalDataRecord::new(None, "P1Y", DisposalMethod::Anonymise).unwrap();
    r.mark_created(created());

    let outcome = ExpiryEvaluator::new()
      .evaluate(&mut r, created() + Months::new(13))
      .unwrap();

    assert!(matches!(outcome, Evaluation::Disposed { .. }));
    assert!(r.is_expired());
    assert_eq!(r.value(), None);
  }

  #[test]
  fn text_strategies_see_the_stored_date_string() {
    let mut r = record("2019-06-16", DisposalMethod::Anonymise);
    r.format = DataFormat::Date;

    ExpiryEvaluator::new()
      .evaluate(&mut r, created() + Months::new(13))
      .unwrap();

    assert_eq!(r.value(), Some("**********"));

    let mut r = record("2019-06-16T18:45:45Z", DisposalMethod::RegexReplace);
    r.format = DataFormat::Datetime;
    r.dispose_by_args = args(json!({ "pattern": "/T.*$/", "replaceWith": "#" }));

    ExpiryEvaluator::new()
      .evaluate(&mut r, created() + Months::new(13))
      .unwrap();

    assert_eq!(r.value(), Some("2019-06-16##########"));
  }

  #[test]
  fn deadline_past_the_calendar_is_not_evaluable() {
    let mut r = PersonalDataRecord::new(
      Some("alice".into()),
      "P300000Y",
      DisposalMethod::SetNull,
    )
    .unwrap();
    r.mark_created(created());
    let evaluator = ExpiryEvaluator::new();
    let now = created() + Months::new(13);

    let outcome = evaluator.evaluate(&mut r, now).unwrap();

    assert_eq!(outcome, Evaluation::NotEvaluable);
    assert!(!evaluator.is_due(&r, now));
    assert_eq!(r.value(), Some("alice"));
    assert!(!r.is_expired());
  }
}
