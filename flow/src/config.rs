//! Bus configuration, loadable from YAML.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct BusConfig {
  /// Appended to a message name to form its handler key.
  pub handler_suffix: String,
  /// Install a `ShapeValidator` on the bus.
  pub validate: bool,
}

impl Default for BusConfig {
  fn default() -> Self {
    Self {
      handler_suffix: "Handler".to_string(),
      validate: false,
    }
  }
}

impl BusConfig {
  pub fn from_yaml_str(source: &str) -> Result<Self> {
    serde_yaml::from_str(source).map_err(|e| Error::Config(e.to_string()))
  }

  pub fn from_path(path: &Path) -> Result<Self> {
    let source = std::fs::read_to_string(path)
      .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    Self::from_yaml_str(&source)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn partial_yaml_keeps_defaults() {
    let config = BusConfig::from_yaml_str("handler_suffix: Command").unwrap();
    assert_eq!(
      config,
      BusConfig {
        handler_suffix: "Command".to_string(),
        validate: false,
      }
    );
  }

  #[test]
  fn malformed_yaml_is_a_config_error() {
    assert!(matches!(
      BusConfig::from_yaml_str("validate: [oops"),
      Err(Error::Config(_))
    ));
  }
}
