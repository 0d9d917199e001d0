use crate::key::ServiceKey;
use thiserror::Error;

/// The family of failures raised when the resolver cannot build an instance.
///
/// Every variant is recoverable by the resolver's default-value fallback: a
/// parameter that declares a default swallows any `Unresolvable` raised while
/// resolving its class dependency.
#[derive(Debug, Error)]
pub enum Unresolvable {
  #[error("class `{name}` is unknown")]
  UnknownClass { name: String },

  #[error("class `{class}` is unresolvable: {reason}")]
  Class { class: ServiceKey, reason: String },

  #[error("parameter `${parameter}` of `{class}` is an unresolvable primitive")]
  Primitive { class: ServiceKey, parameter: String },

  #[error("parameter `${parameter}` of `{class}` has a union type and cannot be resolved")]
  UnionType { class: ServiceKey, parameter: String },

  #[error("circular dependency detected while resolving `{key}`")]
  Circular { key: ServiceKey },
}

impl Unresolvable {
  pub(crate) fn class(class: &ServiceKey, reason: impl Into<String>) -> Self {
    Unresolvable::Class {
      class: class.clone(),
      reason: reason.into(),
    }
  }
}

/// The main error type for `fibre_inject`.
#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Unresolvable(#[from] Unresolvable),

  #[error("invalid container key: {0}")]
  InvalidKey(String),

  #[error("no service is registered for `{0}`")]
  OutOfBounds(ServiceKey),

  #[error("`{context}` is not a `{expected}`")]
  TypeMismatch {
    context: String,
    expected: &'static str,
  },

  #[error("failed to load configuration: {0}")]
  Config(String),

  #[error("{0}")]
  Other(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// True for every resolution failure, false for lookup and key errors.
  pub fn is_unresolvable(&self) -> bool {
    matches!(self, Error::Unresolvable(_))
  }

  pub fn other<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Error::Other(Box::new(err))
  }
}

/// A specialized `Result` type for `fibre_inject` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
