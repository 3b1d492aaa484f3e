//! Date bucketing: reduce a timestamp to a coarser calendar period.

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::{DataValue, Dispose, DisposeArgs, config_from_args};
use crate::{Error, Result};

const STRATEGY: &str = "anonymise-date";

/// The granularity a date is reduced to. The string forms are the values
/// accepted for the `type` argument.
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
pub enum DateBucket {
  /// Midnight of the nearest day: mornings round down, afternoons round up.
  #[serde(rename = "DAY")]
  #[strum(serialize = "DAY")]
  ClosestDay,
  /// The nearest Sunday: Sunday to Wednesday round back, Thursday to
  /// Saturday round forward.
  #[serde(rename = "SUNDAY")]
  #[strum(serialize = "SUNDAY")]
  ClosestSunday,
  #[default]
  #[serde(rename = "CURRENT_MONTH")]
  #[strum(serialize = "CURRENT_MONTH")]
  CurrentMonth,
  #[serde(rename = "QUARTER")]
  #[strum(serialize = "QUARTER")]
  CurrentQuarter,
  #[serde(rename = "YEAR")]
  #[strum(serialize = "YEAR")]
  CurrentYear,
  #[serde(rename = "DECADE")]
  #[strum(serialize = "DECADE")]
  CurrentDecade,
  #[serde(rename = "CENTURY")]
  #[strum(serialize = "CENTURY")]
  CurrentCentury,
}

impl DateBucket {
  /// Reduce `dt` to the start of its bucket. The result always has a zero
  /// time of day.
  pub fn apply(self, dt: NaiveDateTime) -> Result<NaiveDateTime> {
    let date = dt.date();
    let year = date.year();

    let bucketed = match self {
      Self::ClosestDay if dt.hour() < 12 => Some(date),
      Self::ClosestDay => date.succ_opt(),
      Self::ClosestSunday => {
        // 0 = Sunday .. 6 = Saturday
        let weekday = u64::from(date.weekday().num_days_from_sunday());
        if weekday < 4 {
          date.checked_sub_days(Days::new(weekday))
        } else {
          date.checked_add_days(Days::new(7 - weekday))
        }
      }
      Self::CurrentMonth => date.with_day(1),
      Self::CurrentQuarter => {
        NaiveDate::from_ymd_opt(year, date.month0() / 3 * 3 + 1, 1)
      }
      Self::CurrentYear => NaiveDate::from_ymd_opt(year, 1, 1),
      Self::CurrentDecade => {
        NaiveDate::from_ymd_opt(year - year.rem_euclid(10), 1, 1)
      }
      Self::CurrentCentury => {
        NaiveDate::from_ymd_opt(year - year.rem_euclid(100), 1, 1)
      }
    };

    bucketed
      .map(|d| d.and_time(NaiveTime::MIN))
      .ok_or(Error::DateOutOfRange)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnonymiseDateConfig {
  #[serde(rename = "type", default)]
  pub bucket: DateBucket,
}

/// Replaces a timestamp with the start of its [`DateBucket`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymiseDate {
  config: AnonymiseDateConfig,
}

impl AnonymiseDate {
  pub fn new(config: AnonymiseDateConfig) -> Self { Self { config } }

  pub fn from_args(args: &DisposeArgs) -> Result<Self> {
    Ok(Self::new(config_from_args(STRATEGY, args)?))
  }
}

impl Dispose for AnonymiseDate {
  fn dispose(&self, value: Option<DataValue>) -> Result<Option<DataValue>> {
    match value {
      None => Ok(None),
      Some(DataValue::Timestamp(ts)) => {
        Ok(Some(DataValue::Timestamp(self.config.bucket.apply(ts)?)))
      }
      Some(other) => Err(Error::UnsupportedValue {
        strategy: STRATEGY,
        found:    other.kind(),
      }),
    }
  }
}
