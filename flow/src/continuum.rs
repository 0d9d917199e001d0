//! The continuation engine: a chain of links, each of which must call `next`.

use crate::error::{Error, Result};
use crate::pipeline::{Handoff, Stage};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// One link of a [`Continuum`].
///
/// A link advances the chain by calling [`Next::proceed`] exactly once.
/// Returning without calling it interrupts the chain. Calling it more than
/// once runs the remaining links again; the engine does not guard against it.
pub trait Link<P>: Send + Sync {
  fn handle(&self, payload: &mut P, next: &mut Next<'_, P>) -> Result<()>;
}

/// The continuation handed to a link: the rest of the chain.
pub struct Next<'a, P> {
  rest: &'a [Arc<dyn Link<P>>],
  position: usize,
  called: bool,
}

impl<'a, P> Next<'a, P> {
  /// Runs the remaining links over `payload`.
  pub fn proceed(&mut self, payload: &mut P) -> Result<()> {
    self.called = true;
    run(self.rest, self.position, payload)
  }

  pub fn is_called(&self) -> bool {
    self.called
  }

  /// Links still to run after the current one.
  pub fn remaining(&self) -> usize {
    self.rest.len()
  }
}

fn run<P>(links: &[Arc<dyn Link<P>>], position: usize, payload: &mut P) -> Result<()> {
  let Some((link, rest)) = links.split_first() else {
    return Ok(());
  };
  let mut next = Next {
    rest,
    position: position + 1,
    called: false,
  };
  link.handle(payload, &mut next)?;
  if !next.called {
    debug!(stage = position, "continuation interrupted");
    return Err(Error::Interrupted { stage: position });
  }
  Ok(())
}

/// Adapts a closure into a [`Link`].
pub struct FnLink<F>(F);

impl<P, F> Link<P> for FnLink<F>
where
  F: Fn(&mut P, &mut Next<'_, P>) -> Result<()> + Send + Sync,
{
  fn handle(&self, payload: &mut P, next: &mut Next<'_, P>) -> Result<()> {
    (self.0)(payload, next)
  }
}

/// Wraps a closure as a link.
pub fn link<P, F>(f: F) -> FnLink<F>
where
  F: Fn(&mut P, &mut Next<'_, P>) -> Result<()> + Send + Sync,
{
  FnLink(f)
}

/// An ordered chain of [`Link`]s run over a mutable payload.
///
/// # Examples
///
/// ```
/// use fibre_flow::Continuum;
///
/// let chain = Continuum::new()
///   .then(|log: &mut Vec<String>, next| {
///     log.push("auth".to_string());
///     next.proceed(log)
///   })
///   .then(|log: &mut Vec<String>, next| {
///     log.push("audit".to_string());
///     next.proceed(log)
///   });
///
/// let mut log = Vec::new();
/// chain.advance(&mut log).unwrap();
/// assert_eq!(log, vec!["auth", "audit"]);
/// ```
pub struct Continuum<P> {
  links: Vec<Arc<dyn Link<P>>>,
}

impl<P> Default for Continuum<P> {
  fn default() -> Self {
    Self { links: Vec::new() }
  }
}

impl<P> Clone for Continuum<P> {
  fn clone(&self) -> Self {
    Self {
      links: self.links.clone(),
    }
  }
}

impl<P> Continuum<P> {
  pub fn new() -> Self {
    Self::default()
  }

  /// Appends a link.
  pub fn link(self, link: impl Link<P> + 'static) -> Self {
    self.shared(Arc::new(link))
  }

  /// Appends a link that may also be part of other chains.
  pub fn shared(mut self, link: Arc<dyn Link<P>>) -> Self {
    self.links.push(link);
    self
  }

  /// Appends a closure link.
  pub fn then<F>(self, f: F) -> Self
  where
    F: Fn(&mut P, &mut Next<'_, P>) -> Result<()> + Send + Sync + 'static,
  {
    self.link(FnLink(f))
  }

  pub fn len(&self) -> usize {
    self.links.len()
  }

  pub fn is_empty(&self) -> bool {
    self.links.is_empty()
  }

  /// Runs every link in insertion order and hands the payload back.
  pub fn advance<'p>(&self, payload: &'p mut P) -> Result<&'p mut P> {
    Self::advance_with(payload, &self.links)
  }

  /// Runs `links` over `payload` without building a chain first.
  pub fn advance_with<'p>(payload: &'p mut P, links: &[Arc<dyn Link<P>>]) -> Result<&'p mut P> {
    run(links, 0, payload)?;
    Ok(payload)
  }
}

impl<P> fmt::Debug for Continuum<P> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Continuum")
      .field("links", &self.links.len())
      .finish()
  }
}

/// A whole chain can be a single link of an outer chain.
impl<P> Link<P> for Continuum<P> {
  fn handle(&self, payload: &mut P, next: &mut Next<'_, P>) -> Result<()> {
    self.advance(payload)?;
    next.proceed(payload)
  }
}

/// A chain used as a pipeline stage advances through the stage's `next`.
impl<P> Stage<P> for Continuum<P> {
  fn process(&self, mut payload: P, next: &mut Handoff<P>) -> Result<Option<P>> {
    self.advance(&mut payload)?;
    next.forward(payload);
    Ok(None)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_chain_returns_the_payload() {
    let mut payload = 5;
    let chain: Continuum<i32> = Continuum::new();
    assert_eq!(*chain.advance(&mut payload).unwrap(), 5);
  }

  #[test]
  fn next_reports_remaining_links() {
    let chain = Continuum::new()
      .then(|seen: &mut Vec<usize>, next| {
        seen.push(next.remaining());
        next.proceed(seen)
      })
      .then(|seen: &mut Vec<usize>, next| {
        seen.push(next.remaining());
        next.proceed(seen)
      });

    let mut seen = Vec::new();
    chain.advance(&mut seen).unwrap();

    assert_eq!(seen, vec![1, 0]);
  }

  #[test]
  fn nested_chains_run_inline() {
    let inner = Continuum::new().then(|s: &mut String, next| {
      s.push('b');
      next.proceed(s)
    });
    let outer = Continuum::new()
      .then(|s: &mut String, next| {
        s.push('a');
        next.proceed(s)
      })
      .link(inner)
      .then(|s: &mut String, next| {
        s.push('c');
        next.proceed(s)
      });

    let mut s = String::new();
    outer.advance(&mut s).unwrap();

    assert_eq!(s, "abc");
  }
}
