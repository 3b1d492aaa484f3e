//! Maps a record's disposal method onto a concrete strategy.
//!
//! Unknown methods never fail: they resolve to [`SetNull`], so a mistyped or
//! missing method discards the value instead of leaving it in place.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::EnumString;

use crate::{
  Result,
  disposal::{
    Aggregate, Anonymise, AnonymiseDate, AnonymiseIp, DataValue, Dispose,
    DisposeArgs, RegexReplace, SetNull,
  },
};

/// What happens to a value when it expires. Stored as its
/// `SCREAMING_SNAKE_CASE` name.
#[derive(
  Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize, EnumString,
)]
#[serde(from = "String", into = "String")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DisposalMethod {
  #[default]
  SetNull,
  Aggregate,
  Anonymise,
  AnonymiseIp,
  AnonymiseDate,
  RegexReplace,
  /// A name this version does not know; disposes like [`Self::SetNull`].
  #[strum(default)]
  Unrecognized(String),
}

impl DisposalMethod {
  pub fn as_str(&self) -> &str {
    match self {
      Self::SetNull => "SET_NULL",
      Self::Aggregate => "AGGREGATE",
      Self::Anonymise => "ANONYMISE",
      Self::AnonymiseIp => "ANONYMISE_IP",
      Self::AnonymiseDate => "ANONYMISE_DATE",
      Self::RegexReplace => "REGEX_REPLACE",
      Self::Unrecognized(name) => name,
    }
  }
}

impl fmt::Display for DisposalMethod {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl From<String> for DisposalMethod {
  fn from(name: String) -> Self {
    name
      .parse()
      .unwrap_or_else(|_| Self::Unrecognized(name.clone()))
  }
}

impl From<DisposalMethod> for String {
  fn from(method: DisposalMethod) -> Self { method.as_str().to_string() }
}

/// A configured disposal strategy.
#[derive(Debug, Clone)]
pub enum DisposalStrategy {
  SetNull(SetNull),
  Aggregate(Aggregate),
  Anonymise(Anonymise),
  AnonymiseIp(AnonymiseIp),
  AnonymiseDate(AnonymiseDate),
  RegexReplace(RegexReplace),
}

impl DisposalStrategy {
  /// Build the strategy named by `method`, configured from `args`.
  ///
  /// Fails only when the arguments are wrong for the chosen strategy, e.g. a
  /// regex replacement without a `pattern`.
  pub fn resolve(method: &DisposalMethod, args: &DisposeArgs) -> Result<Self> {
    let strategy = match method {
      DisposalMethod::AnonymiseDate => {
        Self::AnonymiseDate(AnonymiseDate::from_args(args)?)
      }
      DisposalMethod::AnonymiseIp => {
        Self::AnonymiseIp(AnonymiseIp::from_args(args)?)
      }
      DisposalMethod::Anonymise => Self::Anonymise(Anonymise::from_args(args)?),
      DisposalMethod::RegexReplace => {
        Self::RegexReplace(RegexReplace::from_args(args)?)
      }
      DisposalMethod::Aggregate => Self::Aggregate(Aggregate),
      DisposalMethod::SetNull => Self::SetNull(SetNull),
      DisposalMethod::Unrecognized(name) => {
        tracing::warn!(
          method = %name,
          "unrecognized disposal method; falling back to set-null"
        );
        Self::SetNull(SetNull)
      }
    };
    Ok(strategy)
  }

  pub fn name(&self) -> &'static str {
    match self {
      Self::SetNull(_) => "set-null",
      Self::Aggregate(_) => "aggregate",
      Self::Anonymise(_) => "anonymise",
      Self::AnonymiseIp(_) => "anonymise-ip",
      Self::AnonymiseDate(_) => "anonymise-date",
      Self::RegexReplace(_) => "regex-replace",
    }
  }
}

impl Dispose for DisposalStrategy {
  fn dispose(&self, value: Option<DataValue>) -> Result<Option<DataValue>> {
    match self {
      Self::SetNull(s) => s.dispose(value),
      Self::Aggregate(s) => s.dispose(value),
      Self::Anonymise(s) => s.dispose(value),
      Self::AnonymiseIp(s) => s.dispose(value),
      Self::AnonymiseDate(s) => s.dispose(value),
      Self::RegexReplace(s) => s.dispose(value),
    }
  }
}

/// Dispose of `value` with a strategy built fresh from `method` and `args`.
pub fn dispose(
  method: &DisposalMethod,
  value: Option<DataValue>,
  args: &DisposeArgs,
) -> Result<Option<DataValue>> {
  DisposalStrategy::resolve(method, args)?.dispose(value)
}
