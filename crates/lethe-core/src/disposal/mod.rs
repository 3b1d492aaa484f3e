//! Disposal strategies — the irreversible transformations applied to a value
//! once its retention period has run out.
//!
//! Every strategy is configured once, from a typed config struct, and is then
//! a pure function of its input. Configs are usually read out of the
//! loosely-typed [`DisposeArgs`] map persisted next to a record; see each
//! strategy's `from_args`.

mod anonymise;
mod anonymise_date;
mod anonymise_ip;
mod regex_replace;

pub use anonymise::{Anonymise, AnonymiseConfig};
pub use anonymise_date::{AnonymiseDate, AnonymiseDateConfig, DateBucket};
pub use anonymise_ip::{AnonymiseIp, AnonymiseIpConfig};
pub use regex_replace::{RegexReplace, RegexReplaceConfig};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{Error, Result};

/// Strategy arguments as persisted alongside a record, e.g.
/// `{"replaceWith": "X"}` or `{"type": "QUARTER"}`.
pub type DisposeArgs = serde_json::Map<String, serde_json::Value>;

/// Canonical rendering of a [`DataValue::Timestamp`] as text.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ─── Values ──────────────────────────────────────────────────────────────────

/// The value a strategy operates on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DataValue {
  Text(String),
  /// A wall-clock date and time; date-only values sit at midnight.
  Timestamp(NaiveDateTime),
}

impl DataValue {
  /// Short name of the variant, used in error messages.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Text(_) => "text",
      Self::Timestamp(_) => "timestamp",
    }
  }

  /// The text form of the value; timestamps use [`TIMESTAMP_FORMAT`].
  pub fn into_text(self) -> String {
    match self {
      Self::Text(text) => text,
      Self::Timestamp(ts) => ts.format(TIMESTAMP_FORMAT).to_string(),
    }
  }
}

impl From<String> for DataValue {
  fn from(text: String) -> Self { Self::Text(text) }
}

impl From<&str> for DataValue {
  fn from(text: &str) -> Self { Self::Text(text.to_string()) }
}

impl From<NaiveDateTime> for DataValue {
  fn from(ts: NaiveDateTime) -> Self { Self::Timestamp(ts) }
}

/// Parse the timestamp layouts a stored date or datetime may be written in.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
  let raw = raw.trim();
  NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
    .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
    .ok()
    // Offsets keep their own wall-clock time.
    .or_else(|| {
      DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.naive_local())
    })
    .or_else(|| {
      NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    })
}

// ─── Contract ────────────────────────────────────────────────────────────────

/// A disposal algorithm. An absent value stays absent.
pub trait Dispose {
  fn dispose(&self, value: Option<DataValue>) -> Result<Option<DataValue>>;
}

/// Discards the value. Also the fail-safe fallback for unknown methods.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetNull;

impl Dispose for SetNull {
  fn dispose(&self, _value: Option<DataValue>) -> Result<Option<DataValue>> {
    Ok(None)
  }
}

/// Aggregation of numeric values into ranges.
///
/// Not implemented: the value is discarded, exactly like [`SetNull`], and a
/// warning is emitted so the gap is visible in the logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregate;

impl Dispose for Aggregate {
  fn dispose(&self, value: Option<DataValue>) -> Result<Option<DataValue>> {
    if value.is_some() {
      tracing::warn!("aggregate disposal is not implemented; value discarded");
    }
    Ok(None)
  }
}

// ─── Shared helpers ──────────────────────────────────────────────────────────

/// Deserialize a strategy config from the persisted argument map.
pub(crate) fn config_from_args<T: DeserializeOwned>(
  strategy: &'static str,
  args: &DisposeArgs,
) -> Result<T> {
  serde_json::from_value(serde_json::Value::Object(args.clone())).map_err(
    |e| Error::InvalidArgument {
      strategy,
      argument: "disposeByArgs",
      reason: e.to_string(),
    },
  )
}

/// `Some(c)` if `s` is exactly one character long.
pub(crate) fn single_char(s: &str) -> Option<char> {
  let mut chars = s.chars();
  match (chars.next(), chars.next()) {
    (Some(c), None) => Some(c),
    _ => None,
  }
}

pub(crate) fn default_mask() -> String { "*".to_string() }
