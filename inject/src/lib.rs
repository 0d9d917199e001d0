//! # Fibre Inject
//!
//! A type-directed dependency resolver and service container for Rust.
//!
//! Rust has no runtime reflection, so every type the resolver can build is
//! described once in a [`TypeRegistry`]: its constructor parameters (class
//! dependencies, primitives with defaults, unions, variadics) and a build
//! function. The [`Resolver`] walks those descriptors recursively, and the
//! [`Container`] binds service keys to lifecycle-aware [`Provider`]s.
//!
//! ## Core Concepts
//!
//! - **Container**: maps keys to providers. `get` fails with `OutOfBounds`
//!   for unknown keys; `has` only checks registration.
//! - **Providers**: `SimpleProvider` (singleton, memoized), `PrototypeProvider`
//!   (fresh value per call) and `NullProvider` (always empty).
//! - **Resolver**: builds instances from descriptors, falling back to declared
//!   defaults when a class dependency is unresolvable.
//! - **Events**: instances that are [`EventDispatcher`]s are picked up by the
//!   resolver and notified of every later `Requested`/`Resolved` event.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_inject::{Container, ParameterDescriptor, TypeDescriptor};
//! use std::sync::Arc;
//!
//! struct Config {
//!   retries: u32,
//! }
//!
//! struct Client {
//!   config: Arc<Config>,
//! }
//!
//! let container = Container::new();
//! container
//!   .types()
//!   .register(
//!     TypeDescriptor::new("Config")
//!       .param(ParameterDescriptor::primitive("retries", "int").with_default(3u32))
//!       .construct(|args| Ok(Config { retries: args.value::<u32>(0)? })),
//!   )
//!   .register(
//!     TypeDescriptor::new("Client")
//!       .param(ParameterDescriptor::class("config", "Config"))
//!       .construct(|args| Ok(Client { config: args.get::<Config>(0)? })),
//!   );
//!
//! container.service("Client");
//! let client = container.get_as::<Client>("Client").unwrap();
//! assert_eq!(client.config.retries, 3);
//! ```

mod config;
mod container;
mod core;
mod descriptor;
mod error;
mod event;
mod key;
mod provider;
mod registry;
mod resolver;

pub use config::ContainerConfig;
pub use container::Container;
pub use crate::core::Instance;
pub use descriptor::{
  Arguments, Constructor, Field, ParamType, ParameterDescriptor, Shape, TypeDescriptor, TypeKind,
  PARENT,
};
pub use error::{Error, Result, Unresolvable};
pub use event::{EventDispatcher, ResolverEvent};
pub use key::ServiceKey;
pub use provider::{NullProvider, PrototypeProvider, Provider, SimpleProvider};
pub use registry::TypeRegistry;
pub use resolver::{Argument, Factory, Resolver, Target, CLOSURE};
