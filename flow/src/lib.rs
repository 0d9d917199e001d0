//! # Fibre Flow
//!
//! Staged processing on top of [`fibre_inject`].
//!
//! - [`Continuum`]: a continuation chain. Every [`Link`] receives the payload
//!   and a [`Next`] continuation and must call [`Next::proceed`]; a link that
//!   does not interrupts the whole chain with [`Error::Interrupted`].
//! - [`Pipeline`]: a return-driven chain. Every [`Stage`] either returns the
//!   next payload or forwards it through its [`Handoff`]; doing neither
//!   interrupts the pipeline.
//! - [`Bus`]: dispatches a [`Message`] to the handler registered under
//!   `<MessageName>Handler` in a container, wrapping the call in `before` and
//!   `after` chains and, optionally, a [`Validator`].
//!
//! ## Quick Start
//!
//! ```
//! use fibre_flow::{Continuum, Pipeline};
//!
//! let trim = Continuum::new().then(|s: &mut String, next| {
//!   *s = s.trim().to_string();
//!   next.proceed(s)
//! });
//!
//! let pipeline = Pipeline::new()
//!   .pipe(trim)
//!   .map(|s: String| Ok(s.to_uppercase()));
//!
//! assert_eq!(pipeline.send("  hello ".to_string()).unwrap(), "HELLO");
//! ```

mod bus;
mod config;
mod continuum;
mod error;
mod message;
mod pipeline;
mod validator;

pub use bus::{handler_fn, register_handler, Bus, Handler, HandlerFn};
pub use config::BusConfig;
pub use continuum::{link, Continuum, FnLink, Link, Next};
pub use error::{Error, Result};
pub use message::{Empty, Message};
pub use pipeline::{map, stage, FnStage, Handoff, MapStage, Pipeline, Stage};
pub use validator::{ShapeValidator, Validator};
