//! A command bus: validation, pre-stages, handler, post-stages.

use crate::config::BusConfig;
use crate::continuum::Continuum;
use crate::error::{Error, Result};
use crate::message::Message;
use crate::pipeline::{Handoff, Pipeline, Stage};
use crate::validator::{ShapeValidator, Validator};
use fibre_inject::{Container, Instance, ServiceKey, TypeRegistry};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Handles one kind of message and optionally answers with another.
pub trait Handler: Send + Sync {
  fn handle(&self, message: &Message) -> Result<Option<Message>>;
}

/// Adapts a closure into a [`Handler`].
pub struct HandlerFn<F>(F);

impl<F> Handler for HandlerFn<F>
where
  F: Fn(&Message) -> Result<Option<Message>> + Send + Sync,
{
  fn handle(&self, message: &Message) -> Result<Option<Message>> {
    (self.0)(message)
  }
}

/// Wraps a closure so it can be stored in a container as a handler.
///
/// The result is an `Arc<dyn Handler>`, which the bus recognises without any
/// capability registration.
pub fn handler_fn<F>(f: F) -> Arc<dyn Handler>
where
  F: Fn(&Message) -> Result<Option<Message>> + Send + Sync + 'static,
{
  Arc::new(HandlerFn(f))
}

/// Declares that instances of `T` may be dispatched to as handlers.
pub fn register_handler<T: Handler + 'static>(types: &TypeRegistry) -> &TypeRegistry {
  types.capability::<T, dyn Handler>(as_handler::<T>)
}

fn as_handler<T: Handler + 'static>(value: Arc<T>) -> Arc<dyn Handler> {
  value
}

fn handler_from(types: &TypeRegistry, key: &ServiceKey, instance: Instance) -> Result<Arc<dyn Handler>> {
  if let Some(handler) = types.cast::<dyn Handler>(&instance) {
    return Ok(handler);
  }
  match instance.downcast::<Arc<dyn Handler>>() {
    Ok(handler) => Ok(Arc::clone(&*handler)),
    Err(_) => Err(Error::NotAHandler { key: key.clone() }),
  }
}

struct HandleStage {
  container: Arc<Container>,
  suffix: String,
}

impl Stage<Message> for HandleStage {
  fn process(&self, message: Message, _next: &mut Handoff<Message>) -> Result<Option<Message>> {
    let key = Bus::key_for(message.name(), &self.suffix);
    debug!(message = %message.name(), handler = %key, "dispatching message");
    let instance = self.container.get(key.as_str())?;
    let handler = handler_from(self.container.types(), &key, instance)?;
    let response = handler.handle(&message)?.unwrap_or_else(Message::empty);
    Ok(Some(response))
  }
}

struct ValidateStage(Arc<dyn Validator>);

impl Stage<Message> for ValidateStage {
  fn process(&self, message: Message, _next: &mut Handoff<Message>) -> Result<Option<Message>> {
    self.0.validate(&message)?;
    Ok(Some(message))
  }
}

/// Dispatches messages to handlers resolved from a [`Container`].
///
/// The handler for a message named `DoSomething` is looked up under
/// `DoSomethingHandler` (the suffix is configurable). A dispatch runs, in order:
/// inbound validation, the `before` chain, the handler, outbound validation and
/// the `after` chain.
///
/// # Examples
///
/// ```
/// use fibre_flow::{handler_fn, Bus, Message};
/// use fibre_inject::Container;
/// use std::sync::Arc;
///
/// struct Ping;
/// struct Pong(u32);
///
/// let container = Arc::new(Container::new());
/// container.set("PingHandler", Arc::new(handler_fn(|_| Ok(Some(Message::new(Pong(1)))))));
///
/// let bus = Bus::new(container);
/// let response = bus.dispatch(Message::new(Ping)).unwrap();
/// assert_eq!(response.downcast::<Pong>().unwrap().0, 1);
/// ```
pub struct Bus {
  container: Arc<Container>,
  config: BusConfig,
  before: Continuum<Message>,
  after: Continuum<Message>,
  validator: Option<Arc<dyn Validator>>,
}

impl Bus {
  pub fn new(container: Arc<Container>) -> Self {
    Self::with_config(container, BusConfig::default())
  }

  pub fn with_config(container: Arc<Container>, config: BusConfig) -> Self {
    let validator = config.validate.then(|| {
      let types = container.resolver().types().clone();
      Arc::new(ShapeValidator::new(types)) as Arc<dyn Validator>
    });
    Self {
      container,
      config,
      before: Continuum::new(),
      after: Continuum::new(),
      validator,
    }
  }

  /// Replaces the chain run before the handler.
  pub fn before(mut self, chain: Continuum<Message>) -> Self {
    self.before = chain;
    self
  }

  /// Replaces the chain run over the handler's response.
  pub fn after(mut self, chain: Continuum<Message>) -> Self {
    self.after = chain;
    self
  }

  /// Validates both the inbound message and the response.
  pub fn validated(mut self, validator: impl Validator + 'static) -> Self {
    self.validator = Some(Arc::new(validator));
    self
  }

  pub fn config(&self) -> &BusConfig {
    &self.config
  }

  pub fn container(&self) -> &Arc<Container> {
    &self.container
  }

  /// The container key a message is dispatched to.
  pub fn handler_key(&self, message: &Message) -> ServiceKey {
    Self::key_for(message.name(), &self.config.handler_suffix)
  }

  fn key_for(name: &ServiceKey, suffix: &str) -> ServiceKey {
    ServiceKey::new(format!("{}{}", name, suffix))
  }

  fn pipeline(&self) -> Pipeline<Message> {
    let mut pipeline = Pipeline::new();
    if let Some(validator) = &self.validator {
      pipeline = pipeline.pipe(ValidateStage(validator.clone()));
    }
    pipeline = pipeline.pipe(self.before.clone()).pipe(HandleStage {
      container: self.container.clone(),
      suffix: self.config.handler_suffix.clone(),
    });
    if let Some(validator) = &self.validator {
      pipeline = pipeline.pipe(ValidateStage(validator.clone()));
    }
    pipeline.pipe(self.after.clone())
  }

  /// Sends `message` through the bus and returns the final response.
  ///
  /// A handler that answers with nothing yields [`Message::empty`].
  pub fn dispatch(&self, message: Message) -> Result<Message> {
    self.pipeline().send(message)
  }
}

impl fmt::Debug for Bus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Bus")
      .field("config", &self.config)
      .field("before", &self.before)
      .field("after", &self.after)
      .field("validated", &self.validator.is_some())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Ping;

  #[test]
  fn handler_key_uses_the_configured_suffix() {
    let container = Arc::new(Container::new());
    let config = BusConfig {
      handler_suffix: "Command".to_string(),
      ..BusConfig::default()
    };
    let bus = Bus::with_config(container, config);

    assert_eq!(bus.handler_key(&Message::new(Ping)).as_str(), "PingCommand");
  }

  #[test]
  fn non_handlers_are_rejected() {
    let container = Arc::new(Container::new());
    container.instance("PingHandler", 42u32);
    let bus = Bus::new(container);

    let err = bus.dispatch(Message::new(Ping)).unwrap_err();
    assert!(matches!(err, Error::NotAHandler { key } if key.as_str() == "PingHandler"));
  }

  #[test]
  fn missing_handler_propagates_the_container_error() {
    let bus = Bus::new(Arc::new(Container::new()));

    let err = bus.dispatch(Message::new(Ping)).unwrap_err();
    assert!(matches!(err, Error::Inject(fibre_inject::Error::OutOfBounds(_))));
  }
}
