//! Error types for `lethe-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid retention period {input:?}: {reason}")]
  InvalidRetentionPeriod { input: String, reason: &'static str },

  #[error("{strategy} disposal requires the `{argument}` argument")]
  MissingRequiredArgument {
    strategy: &'static str,
    argument: &'static str,
  },

  #[error("invalid `{argument}` argument for {strategy} disposal: {reason}")]
  InvalidArgument {
    strategy: &'static str,
    argument: &'static str,
    reason:   String,
  },

  #[error("{strategy} disposal cannot handle a {found} value")]
  UnsupportedValue {
    strategy: &'static str,
    found:    &'static str,
  },

  #[error("date arithmetic out of range")]
  DateOutOfRange,

  /// The record has already been disposed of; its value is frozen.
  #[error("record has expired and can no longer be written")]
  RecordExpired,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
