//! The main `Container` struct and its associated methods.

use crate::config::ContainerConfig;
use crate::core::{FrameKind, Instance};
use crate::descriptor::downcast;
use crate::error::{Error, Result};
use crate::key::ServiceKey;
use crate::provider::{NullProvider, PrototypeProvider, Provider, SimpleProvider};
use crate::registry::TypeRegistry;
use crate::resolver::{Argument, Resolver, Target};
use dashmap::DashMap;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// The service container.
///
/// Maps [`ServiceKey`]s to [`Provider`]s and owns the [`Resolver`] used to build
/// services that are registered by type name. Singletons are memoized inside
/// their provider, so re-registering a key drops the old instance.
///
/// The provider map is safe to share, but the container is designed for one
/// owner resolving on one thread at a time. Registering while another thread
/// resolves the same keys must be synchronized by the caller.
///
/// # Examples
///
/// ```
/// use fibre_inject::{Container, ParameterDescriptor, TypeDescriptor};
/// use std::sync::Arc;
///
/// struct Bar;
/// struct Foo {
///   bar: Arc<Bar>,
/// }
///
/// let container = Container::new();
/// container
///   .types()
///   .register(TypeDescriptor::new("Bar").construct(|_| Ok(Bar)))
///   .register(
///     TypeDescriptor::new("Foo")
///       .param(ParameterDescriptor::class("bar", "Bar"))
///       .construct(|args| Ok(Foo { bar: args.get::<Bar>(0)? })),
///   );
///
/// container.service("Foo");
/// let foo = container.get_as::<Foo>("Foo").unwrap();
/// let again = container.get_as::<Foo>("Foo").unwrap();
/// assert!(Arc::ptr_eq(&foo, &again));
/// assert!(Arc::ptr_eq(&foo.bar, &again.bar));
/// ```
pub struct Container {
  providers: DashMap<ServiceKey, Arc<dyn Provider>>,
  resolver: Resolver,
}

impl Default for Container {
  fn default() -> Self {
    Self::new()
  }
}

impl Container {
  /// Creates an empty container with its own, empty type registry.
  pub fn new() -> Self {
    Self::with_types(Arc::new(TypeRegistry::new()))
  }

  pub fn with_types(types: Arc<TypeRegistry>) -> Self {
    Self::with_resolver(Resolver::new(types))
  }

  pub fn from_config(types: Arc<TypeRegistry>, config: ContainerConfig) -> Self {
    Self::with_resolver(Resolver::with_config(types, config))
  }

  pub fn with_resolver(resolver: Resolver) -> Self {
    Self {
      providers: DashMap::new(),
      resolver,
    }
  }

  pub fn resolver(&self) -> &Resolver {
    &self.resolver
  }

  pub fn types(&self) -> &TypeRegistry {
    self.resolver.types()
  }

  // --- Registration ---

  /// Registers a singleton that resolves the type named `name`.
  pub fn service(&self, name: impl Into<ServiceKey>) -> &Self {
    let name = name.into();
    self.service_with(name.clone(), name)
  }

  /// Registers a singleton under `name` that resolves the type `implementation`.
  pub fn service_with(
    &self,
    name: impl Into<ServiceKey>,
    implementation: impl Into<ServiceKey>,
  ) -> &Self {
    let implementation = implementation.into();
    self.provider(
      name,
      SimpleProvider::new(move |container: &Container| {
        container
          .resolver
          .resolve(container, implementation.clone(), false)
          .map(Some)
      }),
    )
  }

  /// Registers a singleton built by `factory` on first access.
  pub fn factory<T, F>(&self, name: impl Into<ServiceKey>, factory: F) -> &Self
  where
    T: Any + Send + Sync,
    F: Fn(&Container) -> Result<T> + Send + Sync + 'static,
  {
    let target = Target::factory(factory);
    self.provider(
      name,
      SimpleProvider::new(move |container: &Container| {
        container
          .resolver
          .resolve(container, target.clone(), false)
          .map(Some)
      }),
    )
  }

  /// Registers a pre-built value.
  pub fn instance<T: Any + Send + Sync>(&self, name: impl Into<ServiceKey>, value: T) -> &Self {
    self.set(name, Arc::new(value))
  }

  /// Registers a pre-built, already shared instance.
  pub fn set(&self, name: impl Into<ServiceKey>, instance: Instance) -> &Self {
    self.provider(name, SimpleProvider::with_value(instance))
  }

  /// Registers an arbitrary provider.
  pub fn provider(&self, name: impl Into<ServiceKey>, provider: impl Provider + 'static) -> &Self {
    let name = name.into();
    trace!(key = %name, "registered provider");
    self.providers.insert(name, Arc::new(provider));
    self
  }

  /// Like [`service`](Self::service), but builds a new instance on every `get`.
  pub fn prototype(&self, name: impl Into<ServiceKey>) -> &Self {
    let name = name.into();
    self.prototype_with(name.clone(), name)
  }

  pub fn prototype_with(
    &self,
    name: impl Into<ServiceKey>,
    implementation: impl Into<ServiceKey>,
  ) -> &Self {
    let implementation = implementation.into();
    self.provider(
      name,
      PrototypeProvider::new(move |container: &Container| {
        container
          .resolver
          .resolve(container, implementation.clone(), false)
          .map(Some)
      }),
    )
  }

  /// Like [`factory`](Self::factory), but calls `factory` on every `get`.
  pub fn prototype_factory<T, F>(&self, name: impl Into<ServiceKey>, factory: F) -> &Self
  where
    T: Any + Send + Sync,
    F: Fn(&Container) -> Result<T> + Send + Sync + 'static,
  {
    let target = Target::factory(factory);
    self.provider(
      name,
      PrototypeProvider::new(move |container: &Container| {
        container
          .resolver
          .resolve(container, target.clone(), false)
          .map(Some)
      }),
    )
  }

  // --- Lookup ---

  /// Returns the value registered under `key`.
  ///
  /// Fails with [`Error::OutOfBounds`] when nothing is registered or the
  /// provider yields no value.
  pub fn get(&self, key: &str) -> Result<Instance> {
    let key = ServiceKey::new(key);
    let provider = self
      .providers
      .get(key.as_str())
      .map(|entry| entry.value().clone())
      .unwrap_or_else(|| Arc::new(NullProvider) as Arc<dyn Provider>);

    let _guard = self.resolver.guard(FrameKind::Service, &key)?;
    provider.provide(self)?.ok_or(Error::OutOfBounds(key))
  }

  /// Typed [`get`](Self::get).
  pub fn get_as<T: Any + Send + Sync>(&self, key: &str) -> Result<Arc<T>> {
    downcast(self.get(key)?, || key.to_string())
  }

  /// True if a provider is registered for `key`. Does not resolve anything.
  pub fn has(&self, key: &str) -> bool {
    self.providers.contains_key(key)
  }

  /// Removes the registration for `key`, returning whether one existed.
  pub fn remove(&self, key: &str) -> bool {
    self.providers.remove(key).is_some()
  }

  pub fn keys(&self) -> Vec<ServiceKey> {
    self.providers.iter().map(|entry| entry.key().clone()).collect()
  }

  /// Fetches `target` if it is registered, otherwise resolves it.
  pub fn make(&self, target: impl Into<Target>) -> Result<Instance> {
    match target.into() {
      Target::Class(class) if self.has(class.as_str()) => self.get(class.as_str()),
      target => self.resolve(target),
    }
  }

  pub fn resolve(&self, target: impl Into<Target>) -> Result<Instance> {
    self.resolver.resolve(self, target, false)
  }

  pub fn resolve_with(
    &self,
    class: impl Into<ServiceKey>,
    args: Vec<Option<Argument>>,
  ) -> Result<Instance> {
    self.resolver.resolve_with(self, class, args)
  }

  // --- Keyed access ---

  pub fn get_keyed(&self, key: &dyn Any) -> Result<Instance> {
    let key = ServiceKey::from_any(key)?;
    self.get(key.as_str())
  }

  pub fn set_keyed(&self, key: &dyn Any, instance: Instance) -> Result<()> {
    let key = ServiceKey::from_any(key)?;
    self.set(key, instance);
    Ok(())
  }

  pub fn has_keyed(&self, key: &dyn Any) -> Result<bool> {
    let key = ServiceKey::from_any(key)?;
    Ok(self.has(key.as_str()))
  }

  pub fn remove_keyed(&self, key: &dyn Any) -> Result<bool> {
    let key = ServiceKey::from_any(key)?;
    Ok(self.remove(key.as_str()))
  }
}

impl fmt::Debug for Container {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Container")
      .field("keys", &self.keys())
      .field("resolver", &self.resolver)
      .finish()
  }
}
