//! Notifications emitted by the resolver.

use crate::core::Instance;
use crate::key::ServiceKey;
use std::fmt;

/// An event raised while resolving a class.
#[derive(Clone)]
pub enum ResolverEvent {
  /// A class was requested from the resolver.
  Requested { class: ServiceKey },
  /// A class was built (or fetched) and is about to be returned.
  Resolved { class: ServiceKey, instance: Instance },
}

impl ResolverEvent {
  pub fn class(&self) -> &ServiceKey {
    match self {
      ResolverEvent::Requested { class } | ResolverEvent::Resolved { class, .. } => class,
    }
  }

  /// The event name, `<Class>Requested` or `<Class>Resolved`.
  pub fn name(&self) -> String {
    match self {
      ResolverEvent::Requested { class } => format!("{}Requested", class),
      ResolverEvent::Resolved { class, .. } => format!("{}Resolved", class),
    }
  }

  pub fn instance(&self) -> Option<&Instance> {
    match self {
      ResolverEvent::Requested { .. } => None,
      ResolverEvent::Resolved { instance, .. } => Some(instance),
    }
  }
}

impl fmt::Debug for ResolverEvent {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("ResolverEvent").field(&self.name()).finish()
  }
}

/// Anything that can receive resolver events.
///
/// Resolved instances whose type declared this capability in the
/// [`TypeRegistry`](crate::TypeRegistry) are picked up automatically and
/// receive every later event from the resolver that built them.
pub trait EventDispatcher: Send + Sync {
  fn dispatch(&self, event: ResolverEvent) -> ResolverEvent;
}
