//! Property tests across strategies, dispatch and expiry.

use std::net::{Ipv4Addr, Ipv6Addr};

use chrono::{DateTime, Months, TimeZone, Utc};
use proptest::prelude::*;
use serde_json::json;

use crate::{
  dispatch::{self, DisposalMethod},
  disposal::{
    Anonymise, AnonymiseConfig, AnonymiseIp, DataValue, Dispose, DisposeArgs,
  },
  expiry::{Evaluation, ExpiryEvaluator},
  record::PersonalDataRecord,
};

fn args(value: serde_json::Value) -> DisposeArgs {
  match value {
    serde_json::Value::Object(map) => map,
    _ => panic!("args must be an object"),
  }
}

fn created() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2019, 6, 16, 18, 45, 45).unwrap()
}

fn text_of(value: Option<DataValue>) -> Option<String> {
  value.map(DataValue::into_text)
}

// ─── Strategies ──────────────────────────────────────────────────────────────

proptest! {
  #[test]
  fn single_char_mask_preserves_length(s in ".*", mask in any::<char>()) {
    let disposer = Anonymise::new(AnonymiseConfig {
      replace_with: Some(mask.to_string()),
    });

    let result = text_of(disposer.dispose(Some(s.clone().into())).unwrap())
      .unwrap();

    prop_assert_eq!(result.chars().count(), s.chars().count());
    prop_assert!(result.chars().all(|c| c == mask));
  }

  #[test]
  fn long_mask_is_a_fixed_token(s in ".+", token in "[A-Za-z]{2,12}") {
    let disposer = Anonymise::new(AnonymiseConfig {
      replace_with: Some(token.clone()),
    });

    let result = text_of(disposer.dispose(Some(s.into())).unwrap());
    prop_assert_eq!(result, Some(token));
  }

  #[test]
  fn any_ipv4_address_is_masked(ip in any::<Ipv4Addr>()) {
    let result = AnonymiseIp::default()
      .dispose(Some(ip.to_string().into()))
      .unwrap();
    let text = text_of(result);
    prop_assert_eq!(text.as_deref(), Some("255.255.255.0"));
  }

  #[test]
  fn any_ipv6_address_is_masked(ip in any::<Ipv6Addr>()) {
    let result = AnonymiseIp::default()
      .dispose(Some(ip.to_string().into()))
      .unwrap();
    let text = text_of(result);
    prop_assert_eq!(text.as_deref(), Some("ffff:ffff:ffff::"));
  }

  #[test]
  fn words_are_not_addresses(s in "[g-z ]{0,20}") {
    let result = AnonymiseIp::default().dispose(Some(s.into())).unwrap();
    prop_assert_eq!(result, None);
  }

  #[test]
  fn unknown_methods_always_null(name in "[A-Z_]{1,16}", s in ".*") {
    let method = DisposalMethod::from(name);
    prop_assume!(matches!(method, DisposalMethod::Unrecognized(_)));

    let result =
      dispatch::dispose(&method, Some(s.into()), &DisposeArgs::new()).unwrap();
    prop_assert_eq!(result, None);
  }

  #[test]
  fn evaluation_is_idempotent(s in ".{1,40}", extra_months in 0u32..120) {
    let mut record =
      PersonalDataRecord::new(Some(s), "P1Y", DisposalMethod::Anonymise)
        .unwrap();
    record.mark_created(created());
    let evaluator = ExpiryEvaluator::new();
    let now = created() + Months::new(13);

    evaluator.evaluate(&mut record, now).unwrap();
    let first = record.value().map(str::to_string);

    let again = evaluator
      .evaluate(&mut record, now + Months::new(extra_months))
      .unwrap();

    prop_assert_eq!(again, Evaluation::AlreadyDisposed);
    prop_assert_eq!(record.value().map(str::to_string), first);
  }
}

// ─── End to end ──────────────────────────────────────────────────────────────

#[test]
fn regex_partial_masking_through_dispatch() {
  let result = dispatch::dispose(
    &DisposalMethod::RegexReplace,
    Some("DoctorWho had a tardis, his tardis was blue.".into()),
    &args(json!({ "pattern": "/tardis/" })),
  )
  .unwrap();

  assert_eq!(
    text_of(result).as_deref(),
    Some("DoctorWho had a ******, his ****** was blue.")
  );
}

#[test]
fn expiry_gating_over_a_year() {
  let evaluator = ExpiryEvaluator::new();
  let mut record = PersonalDataRecord::new(
    Some("195.25.44.6".into()),
    "P1Y",
    DisposalMethod::AnonymiseIp,
  )
  .unwrap();
  record.mark_created(created());

  let outcome = evaluator
    .evaluate(&mut record, created() + Months::new(11))
    .unwrap();
  assert!(matches!(outcome, Evaluation::Retained { .. }));
  assert_eq!(record.value(), Some("195.25.44.6"));
  assert!(!record.is_expired());

  let outcome = evaluator
    .evaluate(&mut record, created() + Months::new(13))
    .unwrap();
  assert!(matches!(outcome, Evaluation::Disposed { .. }));
  assert_eq!(record.value(), Some("255.255.255.0"));
  assert!(record.is_expired());
}

#[test]
fn records_survive_a_json_round_trip_after_disposal() {
  let mut record = PersonalDataRecord::new(
    Some("alice@example.com".into()),
    "P6M",
    DisposalMethod::Anonymise,
  )
  .unwrap();
  record.dispose_by_args = args(json!({ "replaceWith": "[removed]" }));
  record.mark_created(created());

  ExpiryEvaluator::new()
    .evaluate(&mut record, created() + Months::new(7))
    .unwrap();

  let stored = serde_json::to_string(&record).unwrap();
  let mut loaded: PersonalDataRecord = serde_json::from_str(&stored).unwrap();

  assert_eq!(loaded.value(), Some("[removed]"));
  assert!(loaded.is_expired());
  assert_eq!(
    ExpiryEvaluator::new()
      .evaluate(&mut loaded, created() + Months::new(8))
      .unwrap(),
    Evaluation::AlreadyDisposed
  );
  assert_eq!(loaded.value(), Some("[removed]"));
}
