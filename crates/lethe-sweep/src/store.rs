//! JSON file storage for exported records.

use std::{fs, path::Path};

use anyhow::Context as _;

use crate::StoredRecord;

/// Read a JSON array of [`StoredRecord`]s.
pub fn load_records(path: &Path) -> anyhow::Result<Vec<StoredRecord>> {
  let raw = fs::read_to_string(path)
    .with_context(|| format!("reading {}", path.display()))?;
  serde_json::from_str(&raw)
    .with_context(|| format!("parsing records in {}", path.display()))
}

/// Write records as a pretty-printed JSON array.
///
/// The file is written next to its destination and renamed into place, so a
/// reader never sees a half-written file.
pub fn save_records(path: &Path, records: &[StoredRecord]) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(records)?;

  let mut staging = path.as_os_str().to_owned();
  staging.push(".tmp");
  let staging = Path::new(&staging);

  fs::write(staging, json)
    .with_context(|| format!("writing {}", staging.display()))?;
  fs::rename(staging, path).with_context(|| {
    format!("moving {} to {}", staging.display(), path.display())
  })
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};
  use lethe_core::{dispatch::DisposalMethod, record::PersonalDataRecord};
  use uuid::Uuid;

  use super::*;
  use crate::{SweepConfig, run};

  fn sample() -> Vec<StoredRecord> {
    let mut record = PersonalDataRecord::new(
      Some("10.1.2.3".into()),
      "P30D",
      DisposalMethod::AnonymiseIp,
    )
    .unwrap();
    record.mark_created(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());

    vec![StoredRecord {
      id: Uuid::new_v4(),
      entity: "login".into(),
      field: "remote_addr".into(),
      record,
    }]
  }

  #[test]
  fn save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.json");
    let records = sample();

    save_records(&path, &records).unwrap();
    let loaded = load_records(&path).unwrap();

    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].id, records[0].id);
    assert_eq!(loaded[0].record.value(), Some("10.1.2.3"));
    assert!(!dir.path().join("records.json.tmp").exists());
  }

  #[test]
  fn load_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_records(&dir.path().join("absent.json")).unwrap_err();
    assert!(err.to_string().contains("absent.json"));
  }

  #[test]
  fn run_writes_disposed_records() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.json");
    let output = dir.path().join("out.json");
    save_records(&input, &sample()).unwrap();

    let config = SweepConfig {
      input:   input.clone(),
      output:  Some(output.clone()),
      dry_run: false,
    };
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let report = run(&config, now).unwrap();

    assert_eq!(report.disposed, 1);
    let written = load_records(&output).unwrap();
    assert_eq!(written[0].record.value(), Some("255.255.255.0"));
    assert!(written[0].record.is_expired());

    // The input is untouched when an output path is given.
    let original = load_records(&input).unwrap();
    assert_eq!(original[0].record.value(), Some("10.1.2.3"));
  }

  #[test]
  fn dry_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.json");
    save_records(&input, &sample()).unwrap();
    let before = fs::read_to_string(&input).unwrap();

    let config = SweepConfig {
      input:   input.clone(),
      output:  None,
      dry_run: true,
    };
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let report = run(&config, now).unwrap();

    assert_eq!(report.disposed, 1);
    assert_eq!(fs::read_to_string(&input).unwrap(), before);
  }
}
