//! The pipeline engine: stages threaded by their return values.

use crate::error::{Error, Result};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// One stage of a [`Pipeline`].
///
/// A stage continues the pipeline either by returning `Some(payload)` or by
/// handing a payload to [`Handoff::forward`]. When both happen, the forwarded
/// payload wins. Doing neither interrupts the pipeline.
pub trait Stage<P>: Send + Sync {
  fn process(&self, payload: P, next: &mut Handoff<P>) -> Result<Option<P>>;
}

/// The `next` callback of a pipeline stage.
pub struct Handoff<P> {
  forwarded: Option<P>,
}

impl<P> Handoff<P> {
  fn new() -> Self {
    Self { forwarded: None }
  }

  /// Continues the pipeline with `payload`.
  pub fn forward(&mut self, payload: P) {
    self.forwarded = Some(payload);
  }

  pub fn is_forwarded(&self) -> bool {
    self.forwarded.is_some()
  }
}

/// How a stage signalled completion.
enum Outcome<P> {
  Advanced(P),
  Returned(P),
  Halted,
}

fn step<P>(stage: &dyn Stage<P>, payload: P) -> Result<Outcome<P>> {
  let mut next = Handoff::new();
  let returned = stage.process(payload, &mut next)?;
  Ok(match (next.forwarded, returned) {
    (Some(payload), _) => Outcome::Advanced(payload),
    (None, Some(payload)) => Outcome::Returned(payload),
    (None, None) => Outcome::Halted,
  })
}

/// Adapts a `(payload, next)` closure into a [`Stage`].
pub struct FnStage<F>(F);

impl<P, F> Stage<P> for FnStage<F>
where
  F: Fn(P, &mut Handoff<P>) -> Result<Option<P>> + Send + Sync,
{
  fn process(&self, payload: P, next: &mut Handoff<P>) -> Result<Option<P>> {
    (self.0)(payload, next)
  }
}

/// Adapts a `payload -> payload` closure into a [`Stage`] that always continues.
pub struct MapStage<F>(F);

impl<P, F> Stage<P> for MapStage<F>
where
  F: Fn(P) -> Result<P> + Send + Sync,
{
  fn process(&self, payload: P, _next: &mut Handoff<P>) -> Result<Option<P>> {
    (self.0)(payload).map(Some)
  }
}

pub fn stage<P, F>(f: F) -> FnStage<F>
where
  F: Fn(P, &mut Handoff<P>) -> Result<Option<P>> + Send + Sync,
{
  FnStage(f)
}

pub fn map<P, F>(f: F) -> MapStage<F>
where
  F: Fn(P) -> Result<P> + Send + Sync,
{
  MapStage(f)
}

/// An append-only, ordered list of [`Stage`]s.
///
/// # Examples
///
/// ```
/// use fibre_flow::Pipeline;
///
/// let pipeline = Pipeline::new()
///   .map(|n: u32| Ok(n + 1))
///   .map(|n: u32| Ok(n * 10));
///
/// assert_eq!(pipeline.send(1).unwrap(), 20);
/// ```
pub struct Pipeline<P> {
  stages: Vec<Arc<dyn Stage<P>>>,
}

impl<P> Default for Pipeline<P> {
  fn default() -> Self {
    Self { stages: Vec::new() }
  }
}

impl<P> Clone for Pipeline<P> {
  fn clone(&self) -> Self {
    Self {
      stages: self.stages.clone(),
    }
  }
}

impl<P> Pipeline<P> {
  pub fn new() -> Self {
    Self::default()
  }

  /// Appends a stage.
  pub fn pipe(self, stage: impl Stage<P> + 'static) -> Self {
    self.shared(Arc::new(stage))
  }

  /// Appends a stage that may also be part of other pipelines.
  pub fn shared(mut self, stage: Arc<dyn Stage<P>>) -> Self {
    self.stages.push(stage);
    self
  }

  /// Appends a `(payload, next)` closure stage.
  pub fn then<F>(self, f: F) -> Self
  where
    F: Fn(P, &mut Handoff<P>) -> Result<Option<P>> + Send + Sync + 'static,
  {
    self.pipe(FnStage(f))
  }

  /// Appends a `payload -> payload` closure stage.
  pub fn map<F>(self, f: F) -> Self
  where
    F: Fn(P) -> Result<P> + Send + Sync + 'static,
  {
    self.pipe(MapStage(f))
  }

  pub fn len(&self) -> usize {
    self.stages.len()
  }

  pub fn is_empty(&self) -> bool {
    self.stages.is_empty()
  }

  /// Runs the payload through every stage and returns the last stage's output.
  pub fn send(&self, payload: P) -> Result<P> {
    Self::process_with(payload, &self.stages)
  }

  /// Runs `payload` through `stages` without building a pipeline first.
  pub fn process_with(payload: P, stages: &[Arc<dyn Stage<P>>]) -> Result<P> {
    let mut payload = payload;
    for (position, stage) in stages.iter().enumerate() {
      payload = match step(stage.as_ref(), payload)? {
        Outcome::Advanced(next) | Outcome::Returned(next) => next,
        Outcome::Halted => {
          debug!(stage = position, "pipeline interrupted");
          return Err(Error::Interrupted { stage: position });
        }
      };
    }
    Ok(payload)
  }
}

impl<P> fmt::Debug for Pipeline<P> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Pipeline")
      .field("stages", &self.stages.len())
      .finish()
  }
}

/// A nested pipeline is a stage that returns its own result.
impl<P> Stage<P> for Pipeline<P> {
  fn process(&self, payload: P, _next: &mut Handoff<P>) -> Result<Option<P>> {
    self.send(payload).map(Some)
  }
}
