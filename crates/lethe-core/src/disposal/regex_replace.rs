//! Pattern redaction.

use regex::{Captures, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use super::{
  DataValue, Dispose, DisposeArgs, config_from_args, default_mask, single_char,
};
use crate::{Error, Result};

const STRATEGY: &str = "regex-replace";

/// Characters accepted as PCRE-style pattern delimiters (`/tardis/i`).
const DELIMITERS: [char; 9] = ['/', '#', '~', '%', '@', '!', '|', ';', ','];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegexReplaceConfig {
  /// Either a bare pattern (`\d{2}`) or a delimited one with trailing flags
  /// (`/tardis/i`).
  pub pattern:      String,
  #[serde(default = "default_mask")]
  pub replace_with: String,
}

#[derive(Debug, Clone)]
enum Replacement {
  /// Repeat the character once per character of the match.
  Mask(char),
  Token(String),
  Erase,
}

/// Redacts every match of a pattern, leaving the rest of the text alone.
///
/// Each match is masked character by character when `replace_with` is a
/// single character, and replaced wholesale when it is longer.
#[derive(Debug, Clone)]
pub struct RegexReplace {
  regex:       Regex,
  replacement: Replacement,
}

impl RegexReplace {
  pub fn new(config: RegexReplaceConfig) -> Result<Self> {
    let regex = compile(&config.pattern)?;
    let replacement = match single_char(&config.replace_with) {
      Some(mask) => Replacement::Mask(mask),
      None if config.replace_with.is_empty() => Replacement::Erase,
      None => Replacement::Token(config.replace_with),
    };
    Ok(Self { regex, replacement })
  }

  pub fn from_args(args: &DisposeArgs) -> Result<Self> {
    if args.get("pattern").is_none_or(|p| p.is_null()) {
      return Err(Error::MissingRequiredArgument {
        strategy: STRATEGY,
        argument: "pattern",
      });
    }
    Self::new(config_from_args(STRATEGY, args)?)
  }

  fn replace(&self, caps: &Captures<'_>) -> String {
    match &self.replacement {
      Replacement::Mask(mask) => {
        std::iter::repeat_n(*mask, caps[0].chars().count()).collect()
      }
      Replacement::Token(token) => token.clone(),
      Replacement::Erase => String::new(),
    }
  }
}

impl Dispose for RegexReplace {
  fn dispose(&self, value: Option<DataValue>) -> Result<Option<DataValue>> {
    let Some(value) = value else {
      return Ok(None);
    };

    let text = value.into_text();
    let redacted = self
      .regex
      .replace_all(&text, |caps: &Captures<'_>| self.replace(caps));

    Ok(Some(DataValue::Text(redacted.into_owned())))
  }
}

fn invalid_pattern(reason: String) -> Error {
  Error::InvalidArgument {
    strategy: STRATEGY,
    argument: "pattern",
    reason,
  }
}

/// Compile a bare or delimited pattern, translating trailing flags.
fn compile(pattern: &str) -> Result<Regex> {
  let (body, flags) = split_delimited(pattern).unwrap_or((pattern, ""));

  let mut builder = RegexBuilder::new(body);
  for flag in flags.chars() {
    match flag {
      'i' => builder.case_insensitive(true),
      'm' => builder.multi_line(true),
      's' => builder.dot_matches_new_line(true),
      'x' => builder.ignore_whitespace(true),
      'U' => builder.swap_greed(true),
      'u' => builder.unicode(true),
      other => {
        return Err(invalid_pattern(format!(
          "unsupported pattern modifier `{other}`"
        )));
      }
    };
  }

  builder.build().map_err(|e| invalid_pattern(e.to_string()))
}

/// Split `/body/flags` into `("body", "flags")`.
///
/// Returns `None` for bare patterns: no recognised opening delimiter, no
/// closing delimiter, or anything other than letters after it.
fn split_delimited(pattern: &str) -> Option<(&str, &str)> {
  let delimiter = pattern.chars().next()?;
  if !DELIMITERS.contains(&delimiter) {
    return None;
  }

  let inner = &pattern[delimiter.len_utf8()..];
  let end = inner.rfind(delimiter)?;
  let flags = &inner[end + delimiter.len_utf8()..];
  if !flags.chars().all(|c| c.is_ascii_alphabetic()) {
    return None;
  }

  Some((&inner[..end], flags))
}
