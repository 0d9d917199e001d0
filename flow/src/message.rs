//! Messages carried by the bus.

use fibre_inject::{Instance, ServiceKey};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// The marker carried by a response whose handler returned nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Empty;

/// A payload travelling through a [`Bus`](crate::Bus), tagged with its type name.
///
/// The name is what handler lookup keys off, so it is fixed when the message
/// is created.
#[derive(Clone)]
pub struct Message {
  name: ServiceKey,
  body: Instance,
}

impl Message {
  /// Wraps `body`, naming the message after the unqualified type name of `T`.
  pub fn new<T: Any + Send + Sync>(body: T) -> Self {
    Self {
      name: ServiceKey::short_type_name::<T>(),
      body: Arc::new(body),
    }
  }

  pub fn from_instance(name: impl Into<ServiceKey>, body: Instance) -> Self {
    Self {
      name: name.into(),
      body,
    }
  }

  pub fn empty() -> Self {
    Self::new(Empty)
  }

  pub fn name(&self) -> &ServiceKey {
    &self.name
  }

  pub fn body(&self) -> &Instance {
    &self.body
  }

  pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
    self.body.clone().downcast::<T>().ok()
  }

  pub fn is<T: Any>(&self) -> bool {
    self.body.is::<T>()
  }

  pub fn is_empty(&self) -> bool {
    self.is::<Empty>()
  }
}

impl fmt::Debug for Message {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Message").field("name", &self.name).finish_non_exhaustive()
  }
}
