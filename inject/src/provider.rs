//! Providers: lazy factories bound to a lifecycle policy.

use crate::container::Container;
use crate::core::Instance;
use crate::error::Result;
use once_cell::sync::OnceCell;

pub(crate) type FactoryFn = Box<dyn Fn(&Container) -> Result<Option<Instance>> + Send + Sync>;

/// Produces the value registered under a key.
///
/// `Ok(None)` means "registered but empty"; the container reports it as
/// [`Error::OutOfBounds`](crate::Error::OutOfBounds).
pub trait Provider: Send + Sync {
  fn provide(&self, container: &Container) -> Result<Option<Instance>>;
}

/// Invokes its factory at most once and caches the first successful result.
pub struct SimpleProvider {
  cell: OnceCell<Option<Instance>>,
  factory: FactoryFn,
}

impl SimpleProvider {
  pub fn new(
    factory: impl Fn(&Container) -> Result<Option<Instance>> + Send + Sync + 'static,
  ) -> Self {
    Self {
      cell: OnceCell::new(),
      factory: Box::new(factory),
    }
  }

  /// A provider that is already initialized with `instance`.
  pub fn with_value(instance: Instance) -> Self {
    Self {
      cell: OnceCell::with_value(Some(instance)),
      factory: Box::new(|_| Ok(None)),
    }
  }

  pub fn is_initialized(&self) -> bool {
    self.cell.get().is_some()
  }
}

impl Provider for SimpleProvider {
  fn provide(&self, container: &Container) -> Result<Option<Instance>> {
    self
      .cell
      .get_or_try_init(|| (self.factory)(container))
      .map(|value| value.clone())
  }
}

/// Invokes its factory on every call.
pub struct PrototypeProvider {
  factory: FactoryFn,
}

impl PrototypeProvider {
  pub fn new(
    factory: impl Fn(&Container) -> Result<Option<Instance>> + Send + Sync + 'static,
  ) -> Self {
    Self {
      factory: Box::new(factory),
    }
  }
}

impl Provider for PrototypeProvider {
  fn provide(&self, container: &Container) -> Result<Option<Instance>> {
    (self.factory)(container)
  }
}

/// Always yields nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProvider;

impl Provider for NullProvider {
  fn provide(&self, _container: &Container) -> Result<Option<Instance>> {
    Ok(None)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Arc;

  #[test]
  fn simple_provider_runs_its_factory_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let provider = SimpleProvider::new(move |_| {
      counter.fetch_add(1, Ordering::SeqCst);
      Ok(Some(Arc::new(1u8) as Instance))
    });
    let container = Container::new();

    let a = provider.provide(&container).unwrap().unwrap();
    let b = provider.provide(&container).unwrap().unwrap();

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(provider.is_initialized());
  }

  #[test]
  fn simple_provider_does_not_cache_failures() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let provider = SimpleProvider::new(move |_| {
      if counter.fetch_add(1, Ordering::SeqCst) == 0 {
        return Err(crate::Error::Config("first call fails".into()));
      }
      Ok(Some(Arc::new(2u8) as Instance))
    });
    let container = Container::new();

    assert!(provider.provide(&container).is_err());
    assert!(provider.provide(&container).unwrap().is_some());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[test]
  fn prototype_provider_builds_fresh_values() {
    let provider = PrototypeProvider::new(|_| Ok(Some(Arc::new(3u8) as Instance)));
    let container = Container::new();

    let a = provider.provide(&container).unwrap().unwrap();
    let b = provider.provide(&container).unwrap().unwrap();

    assert!(!Arc::ptr_eq(&a, &b));
  }

  #[test]
  fn null_provider_is_empty() {
    assert!(NullProvider.provide(&Container::new()).unwrap().is_none());
  }
}
