//! Batch disposal of expired personal data.
//!
//! A sweep reads every tagged value exported from storage, evaluates each one
//! against its retention policy and writes the results back. Records are
//! independent: one that cannot be evaluated is reported and left as it was,
//! and the sweep moves on.

mod store;
mod sweep;

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use serde::Deserialize;

pub use store::{load_records, save_records};
pub use sweep::{StoredRecord, SweepFailure, SweepReport, sweep};

/// Settings for a sweep, read from `lethe.toml` and `LETHE_*` environment
/// variables.
#[derive(Debug, Clone, Deserialize)]
pub struct SweepConfig {
  /// JSON file holding the exported records.
  pub input:   PathBuf,
  /// Where to write the evaluated records; defaults to `input`.
  #[serde(default)]
  pub output:  Option<PathBuf>,
  /// Evaluate and report, but write nothing.
  #[serde(default)]
  pub dry_run: bool,
}

impl SweepConfig {
  pub fn output_path(&self) -> &Path {
    self.output.as_deref().unwrap_or(&self.input)
  }
}

/// Load, sweep and (unless this is a dry run) save.
pub fn run(
  config: &SweepConfig,
  now: DateTime<Utc>,
) -> anyhow::Result<SweepReport> {
  let mut records = load_records(&config.input)?;
  tracing::info!(
    count = records.len(),
    input = %config.input.display(),
    %now,
    "loaded records"
  );

  let report = sweep(&mut records, now);

  if config.dry_run {
    tracing::info!("dry run; leaving records unwritten");
  } else {
    let output = config.output_path();
    save_records(output, &records)
      .with_context(|| format!("failed to write {}", output.display()))?;
    tracing::info!(output = %output.display(), "wrote records");
  }

  Ok(report)
}
