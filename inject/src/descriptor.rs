//! Constructor descriptors: the explicit signature metadata the resolver
//! walks instead of runtime reflection.

use crate::core::Instance;
use crate::error::{Error, Result};
use crate::key::ServiceKey;
use crate::registry::TypeRegistry;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// The name used in a [`ParamType::Class`] to refer to the declaring type's parent.
pub const PARENT: &str = "parent";

/// The declared type of a constructor parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
  /// No declared type.
  Untyped,
  /// A built-in type such as `int`, `string`, `mixed` or `callable`.
  Primitive(String),
  /// A named class, resolvable through the registry.
  Class(ServiceKey),
  /// Any of several types. Never resolved.
  Union(Vec<ParamType>),
  /// A rest parameter collecting zero or more values of the inner type.
  Variadic(Box<ParamType>),
}

impl ParamType {
  pub fn primitive(name: impl Into<String>) -> Self {
    ParamType::Primitive(name.into())
  }

  pub fn class(name: impl Into<ServiceKey>) -> Self {
    ParamType::Class(name.into())
  }

  pub fn variadic(inner: ParamType) -> Self {
    ParamType::Variadic(Box::new(inner))
  }

  /// Splits off the variadic wrapper, if any.
  pub fn unwrap_variadic(&self) -> (&ParamType, bool) {
    match self {
      ParamType::Variadic(inner) => (inner.as_ref(), true),
      other => (other, false),
    }
  }
}

impl fmt::Display for ParamType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ParamType::Untyped => f.write_str("mixed"),
      ParamType::Primitive(name) => f.write_str(name),
      ParamType::Class(name) => write!(f, "{}", name),
      ParamType::Union(members) => {
        for (i, member) in members.iter().enumerate() {
          if i > 0 {
            f.write_str("|")?;
          }
          write!(f, "{}", member)?;
        }
        Ok(())
      }
      ParamType::Variadic(inner) => write!(f, "...{}", inner),
    }
  }
}

/// One constructor parameter.
#[derive(Clone)]
pub struct ParameterDescriptor {
  pub name: String,
  pub ty: ParamType,
  pub default: Option<Instance>,
}

impl ParameterDescriptor {
  pub fn new(name: impl Into<String>, ty: ParamType) -> Self {
    Self {
      name: name.into(),
      ty,
      default: None,
    }
  }

  pub fn untyped(name: impl Into<String>) -> Self {
    Self::new(name, ParamType::Untyped)
  }

  pub fn primitive(name: impl Into<String>, ty: impl Into<String>) -> Self {
    Self::new(name, ParamType::primitive(ty))
  }

  pub fn class(name: impl Into<String>, class: impl Into<ServiceKey>) -> Self {
    Self::new(name, ParamType::class(class))
  }

  pub fn union(name: impl Into<String>, members: Vec<ParamType>) -> Self {
    Self::new(name, ParamType::Union(members))
  }

  pub fn variadic(name: impl Into<String>, inner: ParamType) -> Self {
    Self::new(name, ParamType::variadic(inner))
  }

  /// Declares a default value for this parameter.
  pub fn with_default<T: Any + Send + Sync>(mut self, value: T) -> Self {
    self.default = Some(Arc::new(value));
    self
  }

  pub fn with_default_instance(mut self, value: Instance) -> Self {
    self.default = Some(value);
    self
  }

  pub fn has_default(&self) -> bool {
    self.default.is_some()
  }

  pub fn is_variadic(&self) -> bool {
    matches!(self.ty, ParamType::Variadic(_))
  }
}

impl fmt::Debug for ParameterDescriptor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ParameterDescriptor")
      .field("name", &self.name)
      .field("ty", &self.ty)
      .field("has_default", &self.has_default())
      .finish()
  }
}

/// The positional argument list assembled by the resolver and handed to a
/// constructor's build function.
#[derive(Clone, Default)]
pub struct Arguments {
  values: Vec<Instance>,
  types: Option<Arc<TypeRegistry>>,
}

impl Arguments {
  pub fn new(values: Vec<Instance>) -> Self {
    Self {
      values,
      types: None,
    }
  }

  pub(crate) fn with_types(values: Vec<Instance>, types: Arc<TypeRegistry>) -> Self {
    Self {
      values,
      types: Some(types),
    }
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  pub fn instance(&self, index: usize) -> Option<&Instance> {
    self.values.get(index)
  }

  /// The argument at `index`, downcast to `T`.
  pub fn get<T: Any + Send + Sync>(&self, index: usize) -> Result<Arc<T>> {
    let instance = self.values.get(index).ok_or_else(|| Error::TypeMismatch {
      context: format!("argument #{}", index),
      expected: std::any::type_name::<T>(),
    })?;
    downcast(instance.clone(), || format!("argument #{}", index))
  }

  /// The argument at `index`, cloned out of its shared handle.
  pub fn value<T: Any + Send + Sync + Clone>(&self, index: usize) -> Result<T> {
    self.get::<T>(index).map(|value| (*value).clone())
  }

  /// The argument at `index`, viewed through a capability declared in the
  /// registry, e.g. as a `dyn Trait` implemented by the resolved class.
  pub fn cast<I: ?Sized + 'static>(&self, index: usize) -> Result<Arc<I>> {
    self
      .values
      .get(index)
      .and_then(|instance| self.types.as_ref()?.cast::<I>(instance))
      .ok_or_else(|| Error::TypeMismatch {
        context: format!("argument #{}", index),
        expected: std::any::type_name::<I>(),
      })
  }

  /// Every argument from `from` onwards, as spread by a variadic parameter.
  pub fn rest<T: Any + Send + Sync>(&self, from: usize) -> Result<Vec<Arc<T>>> {
    (from..self.values.len()).map(|i| self.get::<T>(i)).collect()
  }
}

pub(crate) fn downcast<T: Any + Send + Sync>(
  instance: Instance,
  context: impl FnOnce() -> String,
) -> Result<Arc<T>> {
  instance.downcast::<T>().map_err(|_| Error::TypeMismatch {
    context: context(),
    expected: std::any::type_name::<T>(),
  })
}

pub(crate) type BuildFn = Arc<dyn Fn(&Arguments) -> Result<Instance> + Send + Sync>;

/// A constructor: its ordered parameter list and the function that builds an
/// instance from resolved arguments.
#[derive(Clone)]
pub struct Constructor {
  pub params: Vec<ParameterDescriptor>,
  pub(crate) build: BuildFn,
}

impl Constructor {
  pub fn build(&self, args: &Arguments) -> Result<Instance> {
    (self.build)(args)
  }
}

impl fmt::Debug for Constructor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Constructor")
      .field("params", &self.params)
      .finish_non_exhaustive()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
  Concrete,
  Abstract,
  Interface,
}

/// A public field of a data carrier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
  pub name: String,
  pub readonly: bool,
}

/// The outward shape of a type, used to decide whether it is a plain data
/// carrier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Shape {
  pub sealed: bool,
  pub fields: Vec<Field>,
  pub methods: Vec<String>,
}

impl Shape {
  /// A closed shape with no fields or methods yet.
  pub fn sealed() -> Self {
    Self {
      sealed: true,
      ..Self::default()
    }
  }

  pub fn open() -> Self {
    Self::default()
  }

  pub fn readonly(mut self, name: impl Into<String>) -> Self {
    self.fields.push(Field {
      name: name.into(),
      readonly: true,
    });
    self
  }

  pub fn mutable(mut self, name: impl Into<String>) -> Self {
    self.fields.push(Field {
      name: name.into(),
      readonly: false,
    });
    self
  }

  pub fn method(mut self, name: impl Into<String>) -> Self {
    self.methods.push(name.into());
    self
  }
}

/// Everything the resolver knows about one named type.
///
/// # Examples
///
/// ```
/// use fibre_inject::{ParameterDescriptor, TypeDescriptor};
///
/// struct Bar;
/// struct Foo {
///   bar: std::sync::Arc<Bar>,
/// }
///
/// let bar = TypeDescriptor::new("Bar").construct(|_| Ok(Bar));
/// let foo = TypeDescriptor::new("Foo")
///   .param(ParameterDescriptor::class("bar", "Bar"))
///   .construct(|args| Ok(Foo { bar: args.get::<Bar>(0)? }));
///
/// assert!(bar.is_instantiable());
/// assert_eq!(foo.params().len(), 1);
/// ```
#[derive(Clone)]
pub struct TypeDescriptor {
  name: ServiceKey,
  kind: TypeKind,
  parent: Option<ServiceKey>,
  type_id: Option<TypeId>,
  params: Vec<ParameterDescriptor>,
  build: Option<BuildFn>,
  shape: Option<Shape>,
}

impl TypeDescriptor {
  /// A concrete type. It becomes instantiable once [`construct`](Self::construct) is called.
  pub fn new(name: impl Into<ServiceKey>) -> Self {
    Self {
      name: name.into(),
      kind: TypeKind::Concrete,
      parent: None,
      type_id: None,
      params: Vec::new(),
      build: None,
      shape: None,
    }
  }

  pub fn interface(name: impl Into<ServiceKey>) -> Self {
    Self {
      kind: TypeKind::Interface,
      ..Self::new(name)
    }
  }

  pub fn abstract_class(name: impl Into<ServiceKey>) -> Self {
    Self {
      kind: TypeKind::Abstract,
      ..Self::new(name)
    }
  }

  pub fn extends(mut self, parent: impl Into<ServiceKey>) -> Self {
    self.parent = Some(parent.into());
    self
  }

  pub fn param(mut self, param: ParameterDescriptor) -> Self {
    self.params.push(param);
    self
  }

  pub fn shape(mut self, shape: Shape) -> Self {
    self.shape = Some(shape);
    self
  }

  /// Sets the build function. The produced Rust type is recorded so that
  /// instances can be mapped back to this descriptor.
  pub fn construct<T, F>(mut self, build: F) -> Self
  where
    T: Any + Send + Sync,
    F: Fn(&Arguments) -> Result<T> + Send + Sync + 'static,
  {
    self.type_id = Some(TypeId::of::<T>());
    self.build = Some(Arc::new(move |args: &Arguments| {
      build(args).map(|value| Arc::new(value) as Instance)
    }));
    self
  }

  pub fn name(&self) -> &ServiceKey {
    &self.name
  }

  pub fn kind(&self) -> TypeKind {
    self.kind
  }

  pub fn parent(&self) -> Option<&ServiceKey> {
    self.parent.as_ref()
  }

  pub fn type_id(&self) -> Option<TypeId> {
    self.type_id
  }

  pub fn params(&self) -> &[ParameterDescriptor] {
    &self.params
  }

  pub fn get_shape(&self) -> Option<&Shape> {
    self.shape.as_ref()
  }

  /// Concrete and carrying a build function.
  pub fn is_instantiable(&self) -> bool {
    self.kind == TypeKind::Concrete && self.build.is_some()
  }

  /// The constructor, when the type is instantiable.
  pub fn constructor(&self) -> Option<Constructor> {
    if !self.is_instantiable() {
      return None;
    }
    self.build.as_ref().map(|build| Constructor {
      params: self.params.clone(),
      build: build.clone(),
    })
  }
}

impl fmt::Debug for TypeDescriptor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TypeDescriptor")
      .field("name", &self.name)
      .field("kind", &self.kind)
      .field("parent", &self.parent)
      .field("params", &self.params)
      .field("instantiable", &self.is_instantiable())
      .finish()
  }
}
