//! The recursive, descriptor-driven resolver.

use crate::config::ContainerConfig;
use crate::container::Container;
use crate::core::{next_owner_id, FrameKind, Instance, ResolutionGuard};
use crate::descriptor::{Arguments, ParamType, ParameterDescriptor, TypeDescriptor, PARENT};
use crate::error::{Error, Result, Unresolvable};
use crate::event::{EventDispatcher, ResolverEvent};
use crate::key::ServiceKey;
use crate::registry::TypeRegistry;
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// The class name reported for factory results whose type is not registered.
pub const CLOSURE: &str = "Closure";

pub type Factory = Arc<dyn Fn(&Container) -> Result<Instance> + Send + Sync>;

/// What to resolve: a registered type name, or a factory invoked with the container.
#[derive(Clone)]
pub enum Target {
  Class(ServiceKey),
  Factory(Factory),
}

impl Target {
  pub fn factory<T, F>(factory: F) -> Self
  where
    T: Any + Send + Sync,
    F: Fn(&Container) -> Result<T> + Send + Sync + 'static,
  {
    Target::Factory(Arc::new(move |container: &Container| {
      factory(container).map(|value| Arc::new(value) as Instance)
    }))
  }
}

impl fmt::Debug for Target {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Target::Class(class) => f.debug_tuple("Class").field(class).finish(),
      Target::Factory(_) => f.write_str("Factory(..)"),
    }
  }
}

impl From<&str> for Target {
  fn from(class: &str) -> Self {
    Target::Class(class.into())
  }
}

impl From<String> for Target {
  fn from(class: String) -> Self {
    Target::Class(class.into())
  }
}

impl From<ServiceKey> for Target {
  fn from(class: ServiceKey) -> Self {
    Target::Class(class)
  }
}

impl From<&ServiceKey> for Target {
  fn from(class: &ServiceKey) -> Self {
    Target::Class(class.clone())
  }
}

/// A caller-supplied positional argument for [`Resolver::resolve_with`].
#[derive(Clone)]
pub enum Argument {
  /// Resolved recursively as a dependency.
  Class(ServiceKey),
  /// Passed through unchanged.
  Value(Instance),
}

impl Argument {
  pub fn class(name: impl Into<ServiceKey>) -> Self {
    Argument::Class(name.into())
  }

  pub fn value<T: Any + Send + Sync>(value: T) -> Self {
    Argument::Value(Arc::new(value))
  }
}

/// A resolved parameter: one positional value, or values spread in place of
/// a variadic parameter.
enum Resolved {
  Single(Instance),
  Spread(Vec<Instance>),
}

/// Builds object graphs from the constructor descriptors in a [`TypeRegistry`].
///
/// A resolver keeps an append-only list of the event dispatchers it has built.
/// The list starts empty and is never shared with other resolvers.
pub struct Resolver {
  id: u64,
  types: Arc<TypeRegistry>,
  config: ContainerConfig,
  dispatchers: Mutex<Vec<Arc<dyn EventDispatcher>>>,
}

impl Resolver {
  pub fn new(types: Arc<TypeRegistry>) -> Self {
    Self::with_config(types, ContainerConfig::default())
  }

  pub fn with_config(types: Arc<TypeRegistry>, config: ContainerConfig) -> Self {
    Self {
      id: next_owner_id(),
      types,
      config,
      dispatchers: Mutex::new(Vec::new()),
    }
  }

  pub fn types(&self) -> &Arc<TypeRegistry> {
    &self.types
  }

  pub fn config(&self) -> &ContainerConfig {
    &self.config
  }

  /// The dispatchers registered so far, in registration order.
  pub fn dispatchers(&self) -> Vec<Arc<dyn EventDispatcher>> {
    self.dispatchers.lock().clone()
  }

  pub(crate) fn guard(&self, kind: FrameKind, key: &ServiceKey) -> Result<ResolutionGuard> {
    if self.config.detect_cycles {
      ResolutionGuard::enter(self.id, kind, key)
    } else {
      Ok(ResolutionGuard::disabled())
    }
  }

  /// Resolves `target` into an instance.
  ///
  /// With `is_dependency` set, a class that has a registration in `container`
  /// is fetched from it instead of being constructed.
  pub fn resolve(
    &self,
    container: &Container,
    target: impl Into<Target>,
    is_dependency: bool,
  ) -> Result<Instance> {
    match target.into() {
      Target::Factory(factory) => {
        let instance = factory(container)?;
        let class = self
          .types
          .name_of(&instance)
          .unwrap_or_else(|| ServiceKey::new(CLOSURE));
        Ok(self.finalize(&class, instance))
      }
      Target::Class(class) => self.resolve_class(container, &class, is_dependency),
    }
  }

  /// Resolves `class`, taking constructor arguments by position from `args`.
  ///
  /// A `None` slot, or a missing trailing slot, falls back to the parameter's
  /// default. A required parameter left unfilled is an error. Values supplied
  /// past a variadic parameter are all spread into it; with none supplied, its
  /// default is spread instead.
  pub fn resolve_with(
    &self,
    container: &Container,
    class: impl Into<ServiceKey>,
    args: Vec<Option<Argument>>,
  ) -> Result<Instance> {
    let class = class.into();
    let descriptor = self.descriptor(&class)?;
    let constructor = descriptor
      .constructor()
      .ok_or_else(|| Unresolvable::class(&class, "type is not instantiable"))?;
    if constructor.params.is_empty() {
      return self.resolve(container, class, false);
    }

    self.notify(ResolverEvent::Requested {
      class: class.clone(),
    });
    let _guard = self.guard(FrameKind::Class, &class)?;

    let mut supplied = args.into_iter();
    let mut values = Vec::with_capacity(constructor.params.len());
    for param in &constructor.params {
      if param.is_variadic() {
        if let (ParamType::Class(_), _) = param.ty.unwrap_variadic() {
          return Err(
            Unresolvable::class(
              &class,
              format!("variadic class parameter `${}` is not supported", param.name),
            )
            .into(),
          );
        }
        let spread_from = values.len();
        for arg in supplied.by_ref().flatten() {
          values.push(self.resolve_argument(container, &descriptor, param, arg)?);
        }
        if values.len() == spread_from {
          values.extend(param.default.clone());
        }
        break;
      }
      match supplied.next().flatten() {
        Some(arg) => values.push(self.resolve_argument(container, &descriptor, param, arg)?),
        None => match &param.default {
          Some(default) => values.push(default.clone()),
          None => {
            return Err(
              Unresolvable::class(
                &class,
                format!("missing required argument `${}`", param.name),
              )
              .into(),
            )
          }
        },
      }
    }

    let instance = constructor.build(&Arguments::with_types(values, self.types.clone()))?;
    Ok(self.finalize(&class, instance))
  }

  fn resolve_class(
    &self,
    container: &Container,
    class: &ServiceKey,
    is_dependency: bool,
  ) -> Result<Instance> {
    self.notify(ResolverEvent::Requested {
      class: class.clone(),
    });

    if is_dependency && container.has(class.as_str()) {
      trace!(class = %class, "dependency served by container");
      let instance = container.get(class.as_str())?;
      return Ok(self.finalize(class, instance));
    }

    let descriptor = self.descriptor(class)?;
    let constructor = descriptor
      .constructor()
      .ok_or_else(|| Unresolvable::class(class, "type is not instantiable"))?;
    let _guard = self.guard(FrameKind::Class, class)?;
    trace!(class = %class, params = constructor.params.len(), "constructing");

    let mut args = Vec::with_capacity(constructor.params.len());
    for param in &constructor.params {
      match self.resolve_parameter(container, &descriptor, param)? {
        Resolved::Single(value) => args.push(value),
        Resolved::Spread(values) => args.extend(values),
      }
    }

    let instance = constructor.build(&Arguments::with_types(args, self.types.clone()))?;
    Ok(self.finalize(class, instance))
  }

  fn resolve_parameter(
    &self,
    container: &Container,
    declaring: &TypeDescriptor,
    param: &ParameterDescriptor,
  ) -> Result<Resolved> {
    let (ty, variadic) = param.ty.unwrap_variadic();
    match ty {
      ParamType::Class(_) if variadic => Err(
        Unresolvable::class(
          declaring.name(),
          format!("variadic class parameter `${}` is not supported", param.name),
        )
        .into(),
      ),
      ParamType::Class(name) => {
        let resolved = self
          .class_name(declaring, name)
          .and_then(|dependency| self.resolve(container, dependency, true));
        self.or_default(declaring, param, resolved).map(Resolved::Single)
      }
      ParamType::Union(_) => Err(
        Unresolvable::UnionType {
          class: declaring.name().clone(),
          parameter: param.name.clone(),
        }
        .into(),
      ),
      _ => self.resolve_primitive(declaring, param, variadic),
    }
  }

  fn resolve_primitive(
    &self,
    declaring: &TypeDescriptor,
    param: &ParameterDescriptor,
    variadic: bool,
  ) -> Result<Resolved> {
    match (&param.default, variadic) {
      (Some(default), false) => Ok(Resolved::Single(default.clone())),
      (Some(default), true) => Ok(Resolved::Spread(vec![default.clone()])),
      (None, true) => Ok(Resolved::Spread(Vec::new())),
      (None, false) => Err(
        Unresolvable::Primitive {
          class: declaring.name().clone(),
          parameter: param.name.clone(),
        }
        .into(),
      ),
    }
  }

  fn resolve_argument(
    &self,
    container: &Container,
    declaring: &TypeDescriptor,
    param: &ParameterDescriptor,
    arg: Argument,
  ) -> Result<Instance> {
    match arg {
      Argument::Value(value) => Ok(value),
      Argument::Class(class) => {
        let resolved = self.resolve(container, class, true);
        self.or_default(declaring, param, resolved)
      }
    }
  }

  /// Swaps an unresolvable dependency for the parameter's default, if it has one.
  fn or_default(
    &self,
    declaring: &TypeDescriptor,
    param: &ParameterDescriptor,
    resolved: Result<Instance>,
  ) -> Result<Instance> {
    match (resolved, &param.default) {
      (Err(err), Some(default)) if err.is_unresolvable() => {
        debug!(
          class = %declaring.name(),
          parameter = %param.name,
          error = %err,
          "dependency unresolvable, using default"
        );
        Ok(default.clone())
      }
      (resolved, _) => resolved,
    }
  }

  /// Reduces a declared class type to a usable name.
  fn class_name(&self, declaring: &TypeDescriptor, name: &ServiceKey) -> Result<ServiceKey> {
    if name.as_str() == PARENT {
      return declaring.parent().cloned().ok_or_else(|| {
        Error::from(Unresolvable::UnknownClass {
          name: format!("{}::{}", declaring.name(), PARENT),
        })
      });
    }
    if name.as_str().is_empty() {
      return Err(
        Unresolvable::UnknownClass {
          name: format!("<unnamed type in {}>", declaring.name()),
        }
        .into(),
      );
    }
    Ok(name.clone())
  }

  fn descriptor(&self, class: &ServiceKey) -> Result<Arc<TypeDescriptor>> {
    self.types.get(class.as_str()).ok_or_else(|| {
      Unresolvable::UnknownClass {
        name: class.to_string(),
      }
      .into()
    })
  }

  /// Registers `instance` as a dispatcher if it is one, then announces it.
  fn finalize(&self, class: &ServiceKey, instance: Instance) -> Instance {
    if let Some(dispatcher) = self.types.cast::<dyn EventDispatcher>(&instance) {
      let mut dispatchers = self.dispatchers.lock();
      let known = dispatchers
        .iter()
        .any(|d| Arc::as_ptr(d) as *const () == Arc::as_ptr(&dispatcher) as *const ());
      if !known {
        debug!(class = %class, "registered event dispatcher");
        dispatchers.push(dispatcher);
      }
    }
    self.notify(ResolverEvent::Resolved {
      class: class.clone(),
      instance: instance.clone(),
    });
    instance
  }

  fn notify(&self, event: ResolverEvent) -> ResolverEvent {
    if !self.config.notify {
      return event;
    }
    // Dispatchers may resolve services themselves, so the lock is not held.
    let dispatchers = self.dispatchers.lock().clone();
    dispatchers
      .iter()
      .fold(event, |event, dispatcher| dispatcher.dispatch(event))
  }
}

impl fmt::Debug for Resolver {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Resolver")
      .field("id", &self.id)
      .field("types", &self.types.len())
      .field("dispatchers", &self.dispatchers.lock().len())
      .finish()
  }
}
