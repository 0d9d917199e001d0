//! Core shared types and the resolution guard.

use crate::error::{Result, Unresolvable};
use crate::key::ServiceKey;
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A resolved value: any shared, thread-safe object.
pub type Instance = Arc<dyn Any + Send + Sync>;

static NEXT_OWNER: AtomicU64 = AtomicU64::new(1);

/// Hands out ids that scope guard frames to one resolver.
pub(crate) fn next_owner_id() -> u64 {
  NEXT_OWNER.fetch_add(1, Ordering::Relaxed)
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub(crate) enum FrameKind {
  Service,
  Class,
}

#[derive(Clone, PartialEq, Eq, Hash)]
struct Frame {
  owner: u64,
  kind: FrameKind,
  key: ServiceKey,
}

thread_local! {
  // The keys currently being resolved on this thread. Re-entering one of
  // them means the dependency graph has a cycle.
  static RESOLVING_STACK: RefCell<HashSet<Frame>> = RefCell::new(HashSet::new());
}

/// An RAII guard that detects circular dependencies.
///
/// Entering pushes the key onto the thread-local resolution set and fails with
/// [`Unresolvable::Circular`] if it was already there. Dropping the guard pops it.
pub(crate) struct ResolutionGuard {
  frame: Option<Frame>,
}

impl ResolutionGuard {
  pub(crate) fn enter(owner: u64, kind: FrameKind, key: &ServiceKey) -> Result<Self> {
    let frame = Frame {
      owner,
      kind,
      key: key.clone(),
    };
    let inserted = RESOLVING_STACK.with(|stack| stack.borrow_mut().insert(frame.clone()));
    if !inserted {
      return Err(Unresolvable::Circular { key: key.clone() }.into());
    }
    Ok(Self { frame: Some(frame) })
  }

  /// A guard that tracks nothing, used when cycle detection is switched off.
  pub(crate) fn disabled() -> Self {
    Self { frame: None }
  }
}

impl Drop for ResolutionGuard {
  fn drop(&mut self) {
    if let Some(frame) = self.frame.take() {
      RESOLVING_STACK.with(|stack| {
        stack.borrow_mut().remove(&frame);
      });
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::Error;

  #[test]
  fn reentering_a_key_fails_until_the_guard_drops() {
    let key = ServiceKey::new("Loop");
    let owner = next_owner_id();
    let guard = ResolutionGuard::enter(owner, FrameKind::Class, &key).unwrap();
    assert!(matches!(
      ResolutionGuard::enter(owner, FrameKind::Class, &key),
      Err(Error::Unresolvable(Unresolvable::Circular { .. }))
    ));
    // Same key in another namespace or for another owner is unrelated.
    assert!(ResolutionGuard::enter(owner, FrameKind::Service, &key).is_ok());
    assert!(ResolutionGuard::enter(next_owner_id(), FrameKind::Class, &key).is_ok());
    drop(guard);
    assert!(ResolutionGuard::enter(owner, FrameKind::Class, &key).is_ok());
  }
}
