//! The personal-data record: a tagged value together with its classification
//! and retention policy.
//!
//! The value, the timestamps and the expiry state are only reachable through
//! methods, so that `keep_until` always matches `created_on + retain_for`
//! and an expired record never regains its original value.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{
  Error, Result,
  dispatch::{DisposalMethod, DisposalStrategy},
  disposal::{DataValue, DisposeArgs, TIMESTAMP_FORMAT, parse_timestamp},
  retention::RetentionPeriod,
};

// ─── Classification ──────────────────────────────────────────────────────────

/// How the value is written and how it should be displayed.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DataFormat {
  #[default]
  String,
  Date,
  Datetime,
  Currency,
  Float,
  Integer,
}

/// How the value can identify a person.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum IdMethod {
  /// On its own, e.g. a name or an email address.
  Direct,
  /// Only combined with other data, e.g. a street address or a job title.
  Indirect,
}

/// The lawful basis under which the value was collected.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum BasisOfCollection {
  /// Necessary to protect someone's life.
  VitalInterest,
  /// Necessary for a task in the public interest with a clear basis in law.
  PublicInterest,
  /// Necessary for a contract with the data subject.
  // Older data spells this with a stray `T`.
  #[serde(alias = "CONTRACT_NECESSTITY")]
  #[strum(to_string = "CONTRACT_NECESSITY", serialize = "CONTRACT_NECESSTITY")]
  ContractNecessity,
  /// Necessary to comply with the law.
  LegalRequirement,
  /// The data subject gave clear consent for a specific purpose.
  Consent,
  /// Necessary for the legitimate interests of the controller or a third
  /// party.
  LegitimateInterest,
}

/// How the value travels between its provider and the store.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferMethod {
  Http,
  Https,
  Ftp,
  Ftps,
  Pdf,
  EncryptedPdf,
  Email,
  Post,
  RegisteredPost,
  Phone,
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// A single personal-data value and the policy that governs it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalDataRecord {
  /// The payload. May be ciphertext; it is treated as an opaque string.
  value:      Option<String>,
  created_on: Option<DateTime<Utc>>,
  updated_on: Option<DateTime<Utc>>,
  retain_for: RetentionPeriod,
  #[serde(default)]
  is_expired: bool,
  /// Derived from `created_on + retain_for`; never read from storage.
  #[serde(default, skip_deserializing)]
  keep_until: Option<DateTime<Utc>>,

  #[serde(default)]
  pub dispose_by:      DisposalMethod,
  #[serde(default)]
  pub dispose_by_args: DisposeArgs,

  #[serde(default)]
  pub format:              DataFormat,
  /// Maximum length; the precision for numbers.
  #[serde(default)]
  pub length:              Option<u32>,
  /// Digits after the decimal point.
  #[serde(default)]
  pub scale:               Option<u32>,
  #[serde(default)]
  pub is_sensitive:        bool,
  #[serde(default)]
  pub is_encrypted:        bool,
  #[serde(default)]
  pub id_method:           Option<IdMethod>,
  #[serde(default)]
  pub basis_of_collection: Option<BasisOfCollection>,
  /// How this value might be used to identify someone.
  #[serde(default)]
  pub identifiable_by:     Option<String>,
  /// Who typically supplies the value (the user, a client, generated).
  #[serde(default)]
  pub provided_by:         Option<String>,
  /// Why the value is needed.
  #[serde(default)]
  pub purpose_for:         Option<String>,
  #[serde(default)]
  pub method_of_receipt:   Vec<TransferMethod>,
  #[serde(default)]
  pub receipt_protection:  Vec<TransferMethod>,
  #[serde(default)]
  pub method_of_return:    Vec<TransferMethod>,
  #[serde(default)]
  pub return_protection:   Vec<TransferMethod>,
}

impl PersonalDataRecord {
  /// Create a record, parsing `retain_for` as an ISO-8601 period such as
  /// `P6Y`. A malformed or zero period is rejected here rather than at
  /// evaluation time.
  pub fn new(
    value: Option<String>,
    retain_for: &str,
    dispose_by: DisposalMethod,
  ) -> Result<Self> {
    Ok(Self::with_retention(value, retain_for.parse()?, dispose_by))
  }

  /// Create a record from an already-validated retention period.
  pub fn with_retention(
    value: Option<String>,
    retain_for: RetentionPeriod,
    dispose_by: DisposalMethod,
  ) -> Self {
    Self {
      value,
      created_on: None,
      updated_on: None,
      retain_for,
      is_expired: false,
      keep_until: None,
      dispose_by,
      dispose_by_args: DisposeArgs::new(),
      format: DataFormat::default(),
      length: None,
      scale: None,
      is_sensitive: false,
      is_encrypted: false,
      id_method: None,
      basis_of_collection: None,
      identifiable_by: None,
      provided_by: None,
      purpose_for: None,
      method_of_receipt: Vec::new(),
      receipt_protection: Vec::new(),
      method_of_return: Vec::new(),
      return_protection: Vec::new(),
    }
  }

  pub fn value(&self) -> Option<&str> { self.value.as_deref() }

  pub fn created_on(&self) -> Option<DateTime<Utc>> { self.created_on }

  pub fn updated_on(&self) -> Option<DateTime<Utc>> { self.updated_on }

  pub fn retain_for(&self) -> RetentionPeriod { self.retain_for }

  /// The cached retention deadline, if `created_on` is known.
  pub fn keep_until(&self) -> Option<DateTime<Utc>> { self.keep_until }

  pub fn is_expired(&self) -> bool { self.is_expired }

  /// Stamp the creation time. Only the first call has an effect; returns
  /// whether this call set it.
  pub fn mark_created(&mut self, at: DateTime<Utc>) -> bool {
    if self.created_on.is_some() {
      return false;
    }
    self.created_on = Some(at);
    self.refresh_keep_until();
    true
  }

  /// Write a new value, as an ordinary field update would.
  pub fn set_value(
    &mut self,
    value: Option<String>,
    at: DateTime<Utc>,
  ) -> Result<()> {
    if self.is_expired {
      return Err(Error::RecordExpired);
    }
    self.value = value;
    self.updated_on = Some(at);
    Ok(())
  }

  pub fn set_retain_for(&mut self, retain_for: RetentionPeriod) {
    self.retain_for = retain_for;
    self.refresh_keep_until();
  }

  /// Resolve the strategy this record will be disposed of with. Useful to
  /// reject bad `dispose_by_args` long before the record expires.
  pub fn strategy(&self) -> Result<DisposalStrategy> {
    DisposalStrategy::resolve(&self.dispose_by, &self.dispose_by_args)
  }

  fn refresh_keep_until(&mut self) {
    self.keep_until = self
      .created_on
      .and_then(|created_on| self.retain_for.add_to(created_on));
  }

  pub(crate) fn cache_keep_until(&mut self, keep_until: DateTime<Utc>) {
    self.keep_until = Some(keep_until);
  }

  /// Replace the value with its disposed form and freeze the record.
  pub(crate) fn record_disposal(
    &mut self,
    value: Option<String>,
    at: DateTime<Utc>,
  ) {
    self.value = value;
    self.is_expired = true;
    self.updated_on = Some(at);
  }

  /// The stored value as `strategy` should see it. Only date bucketing
  /// gets a parsed timestamp; every other strategy works on the stored text.
  pub(crate) fn decoded_value(
    &self,
    strategy: &DisposalStrategy,
  ) -> Option<DataValue> {
    let raw = self.value.as_deref()?;
    let decoded = match (strategy, self.format) {
      (
        DisposalStrategy::AnonymiseDate(_),
        DataFormat::Date | DataFormat::Datetime,
      ) => parse_timestamp(raw).map(DataValue::Timestamp),
      _ => None,
    };
    Some(decoded.unwrap_or_else(|| DataValue::Text(raw.to_string())))
  }

  /// Render a disposed value back into its stored form.
  pub(crate) fn encode_value(&self, value: DataValue) -> String {
    match (value, self.format) {
      (DataValue::Timestamp(ts), DataFormat::Date) => {
        ts.format("%Y-%m-%d").to_string()
      }
      (DataValue::Timestamp(ts), _) => ts.format(TIMESTAMP_FORMAT).to_string(),
      (DataValue::Text(text), _) => text,
    }
  }
}

/// Human-readable rendering. Live values are formatted by [`DataFormat`];
/// expired values are shown as stored.
impl fmt::Display for PersonalDataRecord {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let Some(raw) = self.value.as_deref() else {
      return Ok(());
    };

    if self.is_expired {
      return f.write_str(raw);
    }

    match self.format {
      DataFormat::Date => match parse_timestamp(raw) {
        Some(ts) => write!(f, "{}", ts.format("%d %b %Y")),
        None => f.write_str(raw),
      },
      DataFormat::Datetime => match parse_timestamp(raw) {
        Some(ts) => write!(f, "{}", ts.format("%d %b %Y %H:%M")),
        None => f.write_str(raw),
      },
      DataFormat::Currency => match raw.trim().parse::<f64>() {
        Ok(amount) if amount.is_finite() => {
          f.write_str(&format_currency(amount))
        }
        _ => f.write_str(raw),
      },
      _ => f.write_str(raw),
    }
  }
}

/// `1234.5` → `€1,234.50`
fn format_currency(amount: f64) -> String {
  let fixed = format!("{:.2}", amount.abs());
  let (whole, cents) = fixed.split_once('.').unwrap_or((&fixed, "00"));

  let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
  for (i, digit) in whole.chars().enumerate() {
    if i > 0 && (whole.len() - i) % 3 == 0 {
      grouped.push(',');
    }
    grouped.push(digit);
  }

  // Sign of the rounded amount, so -0.001 is €0.00.
  let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
  format!("{sign}€{grouped}.{cents}")
}
