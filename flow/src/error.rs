use fibre_inject::ServiceKey;
use thiserror::Error;

/// The main error type for `fibre_flow`.
#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Inject(#[from] fibre_inject::Error),

  /// A stage neither advanced the chain nor produced a payload.
  #[error("chain interrupted at stage #{stage}")]
  Interrupted { stage: usize },

  #[error("`{type_name}` is not a valid data transfer object: {reason}")]
  InvalidDto { type_name: String, reason: String },

  #[error("service `{key}` is not a message handler")]
  NotAHandler { key: ServiceKey },

  #[error("failed to load configuration: {0}")]
  Config(String),

  /// A failure raised by a stage or handler itself.
  #[error("{0}")]
  Stage(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn stage<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Error::Stage(Box::new(err))
  }

  pub fn is_interrupted(&self) -> bool {
    matches!(self, Error::Interrupted { .. })
  }
}

/// A specialized `Result` type for `fibre_flow` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
