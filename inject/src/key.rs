//! Service keys and type identifiers.

use crate::error::{Error, Result};
use std::any::Any;
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// An opaque identifier for a service registration or a registered type.
///
/// The same key space is used for both: registering `service("Mailer")` binds
/// the key `Mailer` to a provider that resolves the type named `Mailer`.
/// Cloning is cheap.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceKey(Arc<str>);

impl ServiceKey {
  pub fn new(name: impl AsRef<str>) -> Self {
    Self(Arc::from(name.as_ref()))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// Builds a key out of an arbitrary dynamically typed value.
  ///
  /// Only string-like values are accepted; anything else, and the empty
  /// string, fails with [`Error::InvalidKey`].
  pub fn from_any(key: &dyn Any) -> Result<Self> {
    let name = if let Some(key) = key.downcast_ref::<ServiceKey>() {
      return Self::checked(key.as_str());
    } else if let Some(name) = key.downcast_ref::<String>() {
      name.as_str()
    } else if let Some(name) = key.downcast_ref::<&'static str>() {
      name
    } else {
      return Err(Error::InvalidKey(
        "container keys must be strings".to_string(),
      ));
    };
    Self::checked(name)
  }

  fn checked(name: &str) -> Result<Self> {
    if name.is_empty() {
      return Err(Error::InvalidKey("container keys cannot be empty".to_string()));
    }
    Ok(Self::new(name))
  }

  /// The unqualified name of a Rust type, e.g. `DoSomething` for
  /// `my_app::commands::DoSomething`.
  pub fn short_type_name<T: ?Sized>() -> Self {
    let full = std::any::type_name::<T>();
    // Strip generic arguments before taking the last path segment.
    let base = full.split('<').next().unwrap_or(full);
    Self::new(base.rsplit("::").next().unwrap_or(base))
  }
}

impl fmt::Debug for ServiceKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Key({})", self.0)
  }
}

impl fmt::Display for ServiceKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl Borrow<str> for ServiceKey {
  fn borrow(&self) -> &str {
    &self.0
  }
}

impl AsRef<str> for ServiceKey {
  fn as_ref(&self) -> &str {
    &self.0
  }
}

impl From<&str> for ServiceKey {
  fn from(name: &str) -> Self {
    Self::new(name)
  }
}

impl From<String> for ServiceKey {
  fn from(name: String) -> Self {
    Self(Arc::from(name))
  }
}

impl From<&ServiceKey> for ServiceKey {
  fn from(key: &ServiceKey) -> Self {
    key.clone()
  }
}
