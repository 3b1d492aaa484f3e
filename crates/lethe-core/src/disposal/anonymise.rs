//! Character masking.

use serde::{Deserialize, Serialize};

use super::{DataValue, Dispose, DisposeArgs, config_from_args, single_char};
use crate::Result;

const STRATEGY: &str = "anonymise";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnonymiseConfig {
  /// A single mask character, or a fixed replacement token. `None` or an
  /// empty string discards the value.
  #[serde(default = "default_replace_with")]
  pub replace_with: Option<String>,
}

fn default_replace_with() -> Option<String> { Some(super::default_mask()) }

impl Default for AnonymiseConfig {
  fn default() -> Self {
    Self {
      replace_with: default_replace_with(),
    }
  }
}

/// Replaces a value with a mask of the same length (`DoctorWho` →
/// `*********`), or with a fixed token when `replace_with` is longer than one
/// character.
#[derive(Debug, Clone, Default)]
pub struct Anonymise {
  config: AnonymiseConfig,
}

impl Anonymise {
  pub fn new(config: AnonymiseConfig) -> Self { Self { config } }

  pub fn from_args(args: &DisposeArgs) -> Result<Self> {
    Ok(Self::new(config_from_args(STRATEGY, args)?))
  }
}

impl Dispose for Anonymise {
  fn dispose(&self, value: Option<DataValue>) -> Result<Option<DataValue>> {
    let Some(value) = value else {
      return Ok(None);
    };

    let replacement = match self.config.replace_with.as_deref() {
      None | Some("") => return Ok(None),
      Some(replacement) => replacement,
    };

    let masked = match single_char(replacement) {
      Some(mask) => {
        let length = value.into_text().chars().count();
        std::iter::repeat_n(mask, length).collect()
      }
      None => replacement.to_string(),
    };

    Ok(Some(DataValue::Text(masked)))
  }
}
