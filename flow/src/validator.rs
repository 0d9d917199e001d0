//! Validation of message bodies as plain data carriers.

use crate::error::{Error, Result};
use crate::message::Message;
use fibre_inject::TypeRegistry;
use std::sync::Arc;

/// Decides whether a message body is an acceptable data carrier.
pub trait Validator: Send + Sync {
  fn validate(&self, message: &Message) -> Result<()>;
}

/// Accepts only sealed shapes whose public surface is read-only fields.
///
/// Shapes come from the [`TypeRegistry`]: the message body's concrete type
/// must be registered and carry a [`Shape`](fibre_inject::Shape). The
/// [`Empty`](crate::Empty) marker is always accepted.
pub struct ShapeValidator {
  types: Arc<TypeRegistry>,
}

impl ShapeValidator {
  pub fn new(types: Arc<TypeRegistry>) -> Self {
    Self { types }
  }

  fn invalid(message: &Message, reason: impl Into<String>) -> Error {
    Error::InvalidDto {
      type_name: message.name().to_string(),
      reason: reason.into(),
    }
  }
}

impl Validator for ShapeValidator {
  fn validate(&self, message: &Message) -> Result<()> {
    if message.is_empty() {
      return Ok(());
    }
    let descriptor = self
      .types
      .descriptor_of(message.body())
      .ok_or_else(|| Self::invalid(message, "type is not registered"))?;
    let shape = descriptor
      .get_shape()
      .ok_or_else(|| Self::invalid(message, "type declares no shape"))?;

    if !shape.sealed {
      return Err(Self::invalid(message, "type is not sealed"));
    }
    if let Some(field) = shape.fields.iter().find(|field| !field.readonly) {
      return Err(Self::invalid(
        message,
        format!("field `{}` is not read-only", field.name),
      ));
    }
    if let Some(method) = shape.methods.first() {
      return Err(Self::invalid(message, format!("exposes method `{}`", method)));
    }
    Ok(())
  }
}

impl<F> Validator for F
where
  F: Fn(&Message) -> Result<()> + Send + Sync,
{
  fn validate(&self, message: &Message) -> Result<()> {
    self(message)
  }
}
