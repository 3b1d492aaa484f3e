//! lethe-sweep binary.
//!
//! Reads `lethe.toml` (or the path given with `--config`), evaluates every
//! exported record against its retention policy and writes the results back.
//!
//! ```text
//! lethe-sweep --input records.json
//! lethe-sweep --input records.json --output swept.json \
//!   --now 2030-01-01T00:00:00Z
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use clap::Parser;
use lethe_sweep::SweepConfig;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Dispose of expired personal data")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "lethe.toml")]
  config: PathBuf,

  /// JSON file of exported records; overrides `input` in the config.
  #[arg(short, long)]
  input: Option<PathBuf>,

  /// Where to write the swept records; defaults to the input file.
  #[arg(short, long)]
  output: Option<PathBuf>,

  /// Evaluate as of this RFC 3339 instant instead of the current time.
  #[arg(long)]
  now: Option<DateTime<Utc>>,

  /// Report what would be disposed of without writing anything.
  #[arg(long)]
  dry_run: bool,
}

fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  // File, then environment, then flags.
  let mut builder = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("LETHE"))
    .set_override_option(
      "input",
      cli.input.map(|p| p.to_string_lossy().into_owned()),
    )?
    .set_override_option(
      "output",
      cli.output.map(|p| p.to_string_lossy().into_owned()),
    )?;
  if cli.dry_run {
    builder = builder.set_override("dry_run", true)?;
  }

  let sweep_cfg: SweepConfig = builder
    .build()
    .context("failed to read config file")?
    .try_deserialize()
    .context("failed to deserialise SweepConfig")?;

  let now = cli.now.unwrap_or_else(Utc::now);
  let report = lethe_sweep::run(&sweep_cfg, now)?;

  println!("{}", serde_json::to_string_pretty(&report)?);

  if !report.is_clean() {
    anyhow::bail!(
      "{} of {} records could not be evaluated",
      report.failures.len(),
      report.total()
    );
  }

  Ok(())
}
