//! Retention periods expressed as ISO-8601 durations (`P6Y`, `P1Y6M`,
//! `PT12H`).
//!
//! A period is always strictly positive: a string that parses to all-zero
//! components is rejected, so every [`RetentionPeriod`] value can be added to
//! a creation date to obtain a meaningful deadline.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Days, Months, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

const DATE_DESIGNATORS: [char; 4] = ['Y', 'M', 'W', 'D'];
const TIME_DESIGNATORS: [char; 3] = ['H', 'M', 'S'];

/// How long a value may be kept after it was first created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RetentionPeriod {
  years:   u32,
  months:  u32,
  weeks:   u32,
  days:    u32,
  hours:   u32,
  minutes: u32,
  seconds: u32,
}

impl RetentionPeriod {
  const ZERO: Self = Self {
    years:   0,
    months:  0,
    weeks:   0,
    days:    0,
    hours:   0,
    minutes: 0,
    seconds: 0,
  };

  pub fn years(&self) -> u32 { self.years }

  pub fn months(&self) -> u32 { self.months }

  pub fn weeks(&self) -> u32 { self.weeks }

  pub fn days(&self) -> u32 { self.days }

  pub fn hours(&self) -> u32 { self.hours }

  pub fn minutes(&self) -> u32 { self.minutes }

  pub fn seconds(&self) -> u32 { self.seconds }

  fn has_time(&self) -> bool {
    self.hours > 0 || self.minutes > 0 || self.seconds > 0
  }

  /// The instant at which a value created at `start` stops being retained.
  ///
  /// Calendar components are applied first (month arithmetic clamps to the
  /// last day of a shorter month, so 31 Jan + `P1M` is 28/29 Feb), then
  /// weeks and days, then the clock components. Returns `None` if the result
  /// does not fit in a [`DateTime`].
  pub fn add_to(&self, start: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let months = self.years.checked_mul(12)?.checked_add(self.months)?;
    let days = u64::from(self.weeks) * 7 + u64::from(self.days);
    let seconds = i64::from(self.hours) * 3600
      + i64::from(self.minutes) * 60
      + i64::from(self.seconds);

    start
      .checked_add_months(Months::new(months))?
      .checked_add_days(Days::new(days))?
      .checked_add_signed(TimeDelta::try_seconds(seconds)?)
  }
}

impl FromStr for RetentionPeriod {
  type Err = Error;

  fn from_str(input: &str) -> Result<Self> {
    let invalid = |reason| Error::InvalidRetentionPeriod {
      input: input.to_string(),
      reason,
    };

    let rest = input
      .strip_prefix('P')
      .ok_or_else(|| invalid("must start with `P`"))?;
    if rest.is_empty() {
      return Err(invalid("no components after `P`"));
    }

    let (date_part, time_part) = match rest.split_once('T') {
      Some((_, "")) => {
        return Err(invalid("`T` must be followed by a time component"));
      }
      Some((date, time)) => (date, Some(time)),
      None => (rest, None),
    };

    let mut period = Self::ZERO;

    for (designator, n) in
      split_components(date_part, &DATE_DESIGNATORS).map_err(invalid)?
    {
      match designator {
        'Y' => period.years = n,
        'M' => period.months = n,
        'W' => period.weeks = n,
        _ => period.days = n,
      }
    }

    if let Some(time_part) = time_part {
      for (designator, n) in
        split_components(time_part, &TIME_DESIGNATORS).map_err(invalid)?
      {
        match designator {
          'H' => period.hours = n,
          'M' => period.minutes = n,
          _ => period.seconds = n,
        }
      }
    }

    if period == Self::ZERO {
      return Err(invalid("period must be greater than zero"));
    }

    Ok(period)
  }
}

/// Split `5Y3M` into `[('Y', 5), ('M', 3)]`, enforcing designator order.
fn split_components(
  part: &str,
  designators: &[char],
) -> std::result::Result<Vec<(char, u32)>, &'static str> {
  let mut components = Vec::new();
  let mut digits = String::new();
  let mut last_position: Option<usize> = None;

  for c in part.chars() {
    if c.is_ascii_digit() {
      digits.push(c);
      continue;
    }

    let position = designators
      .iter()
      .position(|d| *d == c)
      .ok_or("unexpected character")?;
    if digits.is_empty() {
      return Err("designator without a number");
    }
    if last_position.is_some_and(|last| position <= last) {
      return Err("designators repeated or out of order");
    }

    let n = digits.parse::<u32>().map_err(|_| "number too large")?;
    components.push((c, n));
    digits.clear();
    last_position = Some(position);
  }

  if !digits.is_empty() {
    return Err("number without a designator");
  }

  Ok(components)
}

impl fmt::Display for RetentionPeriod {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("P")?;
    for (n, designator) in [
      (self.years, 'Y'),
      (self.months, 'M'),
      (self.weeks, 'W'),
      (self.days, 'D'),
    ] {
      if n > 0 {
        write!(f, "{n}{designator}")?;
      }
    }

    if self.has_time() {
      f.write_str("T")?;
      for (n, designator) in
        [(self.hours, 'H'), (self.minutes, 'M'), (self.seconds, 'S')]
      {
        if n > 0 {
          write!(f, "{n}{designator}")?;
        }
      }
    }

    Ok(())
  }
}

impl TryFrom<String> for RetentionPeriod {
  type Error = Error;

  fn try_from(value: String) -> Result<Self> { value.parse() }
}

impl From<RetentionPeriod> for String {
  fn from(period: RetentionPeriod) -> Self { period.to_string() }
}
