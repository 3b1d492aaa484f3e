//! IP address anonymisation.

use std::net::{Ipv4Addr, Ipv6Addr};

use serde::{Deserialize, Serialize};

use super::{DataValue, Dispose, DisposeArgs, config_from_args};
use crate::Result;

const STRATEGY: &str = "anonymise-ip";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonymiseIpConfig {
  #[serde(rename = "anonIPv4", default = "default_ipv4")]
  pub anon_ipv4: String,
  #[serde(rename = "anonIPv6", default = "default_ipv6")]
  pub anon_ipv6: String,
}

fn default_ipv4() -> String { "255.255.255.0".to_string() }

fn default_ipv6() -> String { "ffff:ffff:ffff::".to_string() }

impl Default for AnonymiseIpConfig {
  fn default() -> Self {
    Self {
      anon_ipv4: default_ipv4(),
      anon_ipv6: default_ipv6(),
    }
  }
}

/// Replaces an IPv4 or IPv6 address with a fixed address of the same family.
/// Anything that is not an address is discarded.
#[derive(Debug, Clone, Default)]
pub struct AnonymiseIp {
  config: AnonymiseIpConfig,
}

impl AnonymiseIp {
  pub fn new(config: AnonymiseIpConfig) -> Self { Self { config } }

  pub fn from_args(args: &DisposeArgs) -> Result<Self> {
    Ok(Self::new(config_from_args(STRATEGY, args)?))
  }
}

impl Dispose for AnonymiseIp {
  fn dispose(&self, value: Option<DataValue>) -> Result<Option<DataValue>> {
    let Some(DataValue::Text(address)) = value else {
      return Ok(None);
    };

    let replacement = if address.parse::<Ipv4Addr>().is_ok() {
      &self.config.anon_ipv4
    } else if address.parse::<Ipv6Addr>().is_ok() {
      &self.config.anon_ipv6
    } else {
      return Ok(None);
    };

    Ok(Some(DataValue::Text(replacement.clone())))
  }
}
