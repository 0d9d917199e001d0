//! Container configuration, loadable from YAML.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ContainerConfig {
  /// Fail with `Unresolvable::Circular` when a key is re-entered on one thread.
  pub detect_cycles: bool,
  /// Send `Requested`/`Resolved` events to registered dispatchers.
  pub notify: bool,
}

impl Default for ContainerConfig {
  fn default() -> Self {
    Self {
      detect_cycles: true,
      notify: true,
    }
  }
}

impl ContainerConfig {
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
  use std::io::Write;

  #[test]
  fn missing_fields_take_defaults() {
    let config = ContainerConfig::from_yaml_str("notify: false").unwrap();
    assert_eq!(
      config,
      ContainerConfig {
        detect_cycles: true,
        notify: false,
      }
    );
  }

  #[test]
  fn unknown_fields_are_rejected() {
    assert!(matches!(
      ContainerConfig::from_yaml_str("autowire: true"),
      Err(Error::Config(_))
    ));
  }

  #[test]
  fn loads_from_a_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "detect_cycles: false").unwrap();
    let config = ContainerConfig::from_path(file.path()).unwrap();
    assert!(!config.detect_cycles);
    assert!(config.notify);
  }
}
