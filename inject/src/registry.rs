//! The explicit type registry that stands in for runtime reflection.

use crate::core::Instance;
use crate::descriptor::TypeDescriptor;
use crate::event::EventDispatcher;
use crate::key::ServiceKey;
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::sync::Arc;
use tracing::trace;

type Caster<I> = Arc<dyn Fn(Instance) -> Option<Arc<I>> + Send + Sync>;

/// Maps type names to their [`TypeDescriptor`]s and records which trait-object
/// capabilities each concrete Rust type provides.
///
/// A registry can be shared by several resolvers; it holds no per-resolution
/// state.
#[derive(Default)]
pub struct TypeRegistry {
  types: DashMap<ServiceKey, Arc<TypeDescriptor>>,
  names: DashMap<TypeId, ServiceKey>,
  capabilities: DashMap<(TypeId, TypeId), Box<dyn Any + Send + Sync>>,
}

impl TypeRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers a descriptor. A later registration under the same name wins.
  pub fn register(&self, descriptor: TypeDescriptor) -> &Self {
    if let Some(type_id) = descriptor.type_id() {
      self.names.insert(type_id, descriptor.name().clone());
    }
    trace!(class = %descriptor.name(), "registered type descriptor");
    self
      .types
      .insert(descriptor.name().clone(), Arc::new(descriptor));
    self
  }

  pub fn get(&self, name: &str) -> Option<Arc<TypeDescriptor>> {
    self.types.get(name).map(|entry| entry.value().clone())
  }

  pub fn contains(&self, name: &str) -> bool {
    self.types.contains_key(name)
  }

  pub fn len(&self) -> usize {
    self.types.len()
  }

  pub fn is_empty(&self) -> bool {
    self.types.is_empty()
  }

  /// The registered name of the concrete type behind `instance`, if any.
  pub fn name_of(&self, instance: &Instance) -> Option<ServiceKey> {
    let type_id = (**instance).type_id();
    self.names.get(&type_id).map(|entry| entry.value().clone())
  }

  /// The descriptor of the concrete type behind `instance`, if any.
  pub fn descriptor_of(&self, instance: &Instance) -> Option<Arc<TypeDescriptor>> {
    self.name_of(instance).and_then(|name| self.get(name.as_str()))
  }

  /// Declares that values of `T` can be viewed as `I`, typically a trait object.
  ///
  /// ```
  /// use fibre_inject::TypeRegistry;
  /// use std::sync::Arc;
  ///
  /// trait Greeter: Send + Sync {
  ///   fn greet(&self) -> String;
  /// }
  /// struct English;
  /// impl Greeter for English {
  ///   fn greet(&self) -> String {
  ///     "Hello!".to_string()
  ///   }
  /// }
  /// fn as_greeter(value: Arc<English>) -> Arc<dyn Greeter> {
  ///   value
  /// }
  ///
  /// let types = TypeRegistry::new();
  /// types.capability::<English, dyn Greeter>(as_greeter);
  ///
  /// let instance: fibre_inject::Instance = Arc::new(English);
  /// assert_eq!(types.cast::<dyn Greeter>(&instance).unwrap().greet(), "Hello!");
  /// ```
  pub fn capability<T, I>(&self, upcast: fn(Arc<T>) -> Arc<I>) -> &Self
  where
    T: Any + Send + Sync,
    I: ?Sized + 'static,
  {
    let caster: Caster<I> =
      Arc::new(move |instance: Instance| instance.downcast::<T>().ok().map(upcast));
    self
      .capabilities
      .insert((TypeId::of::<T>(), TypeId::of::<I>()), Box::new(caster));
    self
  }

  /// Views `instance` as `I` if its concrete type declared that capability.
  pub fn cast<I: ?Sized + 'static>(&self, instance: &Instance) -> Option<Arc<I>> {
    let key = ((**instance).type_id(), TypeId::of::<I>());
    let caster = self
      .capabilities
      .get(&key)
      .and_then(|entry| entry.value().downcast_ref::<Caster<I>>().cloned())?;
    caster(instance.clone())
  }

  /// Shorthand for declaring that `T` is an [`EventDispatcher`].
  pub fn dispatcher<T: EventDispatcher + 'static>(&self) -> &Self {
    self.capability::<T, dyn EventDispatcher>(as_dispatcher::<T>)
  }
}

fn as_dispatcher<T: EventDispatcher + 'static>(value: Arc<T>) -> Arc<dyn EventDispatcher> {
  value
}
