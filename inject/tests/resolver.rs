use fibre_inject::{
  Argument, Container, ContainerConfig, Error, EventDispatcher, Instance, ParamType,
  ParameterDescriptor, ResolverEvent, Target, TypeDescriptor, TypeRegistry, Unresolvable,
};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};

// --- Test Fixtures ---

struct Bar;

struct Foo {
  bar: Arc<Bar>,
}

struct Tagged {
  tags: Vec<Arc<String>>,
}

struct Child {
  parent: Arc<Base>,
}

struct Base;

struct Node {
  next: Option<Arc<Node>>,
}

#[derive(Default)]
struct Recorder {
  seen: Mutex<Vec<String>>,
}

impl Recorder {
  fn seen(&self) -> Vec<String> {
    self.seen.lock().unwrap().clone()
  }
}

impl EventDispatcher for Recorder {
  fn dispatch(&self, event: ResolverEvent) -> ResolverEvent {
    self.seen.lock().unwrap().push(event.name());
    event
  }
}

fn types() -> Arc<TypeRegistry> {
  let types = TypeRegistry::new();
  types
    .register(TypeDescriptor::new("Bar").construct(|_| Ok(Bar)))
    .register(
      TypeDescriptor::new("Foo")
        .param(ParameterDescriptor::class("bar", "Bar"))
        .construct(|args| Ok(Foo { bar: args.get::<Bar>(0)? })),
    )
    .register(TypeDescriptor::new("Base").construct(|_| Ok(Base)))
    .register(
      TypeDescriptor::new("Child")
        .extends("Base")
        .param(ParameterDescriptor::class("parent", "parent"))
        .construct(|args| Ok(Child { parent: args.get::<Base>(0)? })),
    )
    .register(
      TypeDescriptor::new("Tagged")
        .param(ParameterDescriptor::variadic("tags", ParamType::primitive("string")))
        .construct(|args| Ok(Tagged { tags: args.rest::<String>(0)? })),
    )
    .register(TypeDescriptor::interface("Logger"))
    .register(TypeDescriptor::new("Recorder").construct(|_| Ok(Recorder::default())))
    .dispatcher::<Recorder>();
  Arc::new(types)
}

fn container() -> Container {
  Container::with_types(types())
}

fn unresolvable(result: fibre_inject::Result<Instance>) -> Unresolvable {
  match result {
    Err(Error::Unresolvable(err)) => err,
    Err(other) => panic!("expected an unresolvable error, got {}", other),
    Ok(_) => panic!("expected an unresolvable error, got an instance"),
  }
}

// --- Construction Tests ---

#[test]
fn test_zero_parameter_types_are_built_without_the_container() {
  // Arrange: a registration under the same name must not be consulted.
  let container = container();
  let registered = Arc::new(Bar);
  container.set("Bar", registered.clone());

  // Act
  let built = container.resolve("Bar").unwrap().downcast::<Bar>().unwrap();

  // Assert
  assert!(!Arc::ptr_eq(&built, &registered));
}

#[test]
fn test_service_resolves_class_dependencies() {
  // Arrange
  let container = container();
  container.service("Foo");

  // Act
  let foo = container.get_as::<Foo>("Foo").unwrap();

  // Assert
  let _: &Bar = &foo.bar;
  assert!(!container.has("Bar"));
}

#[test]
fn test_registered_dependencies_short_circuit_construction() {
  let container = container();
  container.service("Bar");
  container.prototype("Foo");

  let first = container.get_as::<Foo>("Foo").unwrap();
  let second = container.get_as::<Foo>("Foo").unwrap();

  assert!(!Arc::ptr_eq(&first, &second));
  assert!(Arc::ptr_eq(&first.bar, &second.bar));
}

#[test]
fn test_parent_marker_resolves_the_declared_parent() {
  let container = container();
  let child = container.resolve("Child").unwrap().downcast::<Child>().unwrap();
  let _: &Base = &child.parent;
}

#[test]
fn test_parent_marker_without_parent_is_unknown() {
  let types = types();
  types.register(
    TypeDescriptor::new("Orphan")
      .param(ParameterDescriptor::class("parent", "parent"))
      .construct(|_| Ok(())),
  );
  let container = Container::with_types(types);

  assert!(matches!(
    unresolvable(container.resolve("Orphan")),
    Unresolvable::UnknownClass { .. }
  ));
}

#[test]
fn test_interfaces_and_unknown_types_fail() {
  let container = container();

  assert!(matches!(
    unresolvable(container.resolve("Logger")),
    Unresolvable::Class { .. }
  ));
  assert!(matches!(
    unresolvable(container.resolve("Nope")),
    Unresolvable::UnknownClass { .. }
  ));
}

// --- Parameter Policy Tests ---

#[test]
fn test_union_parameters_always_fail() {
  // Arrange: even with a default declared.
  let types = types();
  types.register(
    TypeDescriptor::new("Either")
      .param(
        ParameterDescriptor::union(
          "value",
          vec![ParamType::primitive("int"), ParamType::class("Bar")],
        )
        .with_default(0i64),
      )
      .construct(|_| Ok(())),
  );
  let container = Container::with_types(types);

  // Act
  let err = unresolvable(container.resolve("Either"));

  // Assert
  assert!(matches!(err, Unresolvable::UnionType { ref parameter, .. } if parameter == "value"));
}

#[test]
fn test_unresolvable_class_dependency_falls_back_to_default() {
  // Arrange
  let fallback = Arc::new(Bar);
  let types = types();
  types.register(
    TypeDescriptor::new("Lenient")
      .param(
        ParameterDescriptor::class("bar", "MissingBar").with_default_instance(fallback.clone()),
      )
      .construct(|args| Ok(Foo { bar: args.get::<Bar>(0)? })),
  );
  let container = Container::with_types(types);

  // Act
  let lenient = container.resolve("Lenient").unwrap().downcast::<Foo>().unwrap();

  // Assert
  assert!(Arc::ptr_eq(&lenient.bar, &fallback));
}

#[test]
fn test_unresolvable_class_dependency_without_default_propagates() {
  let types = types();
  types.register(
    TypeDescriptor::new("Strict")
      .param(ParameterDescriptor::class("bar", "MissingBar"))
      .construct(|args| Ok(Foo { bar: args.get::<Bar>(0)? })),
  );
  let container = Container::with_types(types);

  let err = unresolvable(container.resolve("Strict"));

  assert!(matches!(err, Unresolvable::UnknownClass { ref name } if name == "MissingBar"));
}

#[test]
fn test_primitive_parameters_use_defaults_or_fail() {
  let types = types();
  types
    .register(
      TypeDescriptor::new("Port")
        .param(ParameterDescriptor::primitive("port", "int").with_default(8080u16))
        .construct(|args| args.value::<u16>(0)),
    )
    .register(
      TypeDescriptor::new("Dsn")
        .param(ParameterDescriptor::untyped("dsn"))
        .construct(|_| Ok(())),
    );
  let container = Container::with_types(types);

  let port = container.resolve("Port").unwrap().downcast::<u16>().unwrap();
  assert_eq!(*port, 8080);

  assert!(matches!(
    unresolvable(container.resolve("Dsn")),
    Unresolvable::Primitive { ref parameter, .. } if parameter == "dsn"
  ));
}

#[test]
fn test_variadic_primitive_resolves_to_nothing() {
  let container = container();

  let tagged = container.resolve("Tagged").unwrap().downcast::<Tagged>().unwrap();

  assert!(tagged.tags.is_empty());
}

#[test]
fn test_variadic_class_parameters_always_fail() {
  let types = types();
  types.register(
    TypeDescriptor::new("Many")
      .param(
        ParameterDescriptor::variadic("bars", ParamType::class("Bar")).with_default(Bar),
      )
      .construct(|_| Ok(())),
  );
  let container = Container::with_types(types);

  assert!(matches!(
    unresolvable(container.resolve("Many")),
    Unresolvable::Class { .. }
  ));
}

#[test]
fn test_resolve_with_rejects_variadic_class_parameters() {
  // Arrange
  let types = types();
  types.register(
    TypeDescriptor::new("Many")
      .param(ParameterDescriptor::primitive("n", "int").with_default(1u32))
      .param(ParameterDescriptor::variadic("bars", ParamType::class("Bar")))
      .construct(|args| Ok(args.len())),
  );
  let container = Container::with_types(types);

  // Act
  let without_args = unresolvable(container.resolve_with("Many", vec![]));
  let with_args = unresolvable(container.resolve_with(
    "Many",
    vec![
      None,
      Some(Argument::class("Bar")),
      Some(Argument::class("Bar")),
    ],
  ));

  // Assert
  for err in [without_args, with_args] {
    assert!(matches!(
      err,
      Unresolvable::Class { ref reason, .. } if reason.contains("$bars")
    ));
  }
}

#[test]
fn test_interface_dependencies_are_cast_through_capabilities() {
  // Arrange
  trait Greeter: Send + Sync {
    fn greet(&self) -> String;
  }
  struct English;
  impl Greeter for English {
    fn greet(&self) -> String {
      "Hello!".to_string()
    }
  }
  fn as_greeter(value: Arc<English>) -> Arc<dyn Greeter> {
    value
  }
  struct Host {
    greeter: Arc<dyn Greeter>,
  }

  let types = types();
  types
    .register(TypeDescriptor::interface("Greeter"))
    .register(TypeDescriptor::new("English").construct(|_| Ok(English)))
    .register(
      TypeDescriptor::new("Host")
        .param(ParameterDescriptor::class("greeter", "Greeter"))
        .construct(|args| {
          Ok(Host {
            greeter: args.cast::<dyn Greeter>(0)?,
          })
        }),
    )
    .capability::<English, dyn Greeter>(as_greeter);
  let container = Container::with_types(types);
  container.service_with("Greeter", "English");

  // Act
  let host = container.resolve("Host").unwrap().downcast::<Host>().unwrap();

  // Assert
  assert_eq!(host.greeter.greet(), "Hello!");
}

// --- resolve_with Tests ---

#[test]
fn test_resolve_with_maps_positional_arguments() {
  // Arrange
  let types = types();
  types.register(
    TypeDescriptor::new("Endpoint")
      .param(ParameterDescriptor::class("bar", "Bar"))
      .param(ParameterDescriptor::primitive("host", "string"))
      .param(ParameterDescriptor::primitive("port", "int").with_default(80u16))
      .construct(|args| {
        let _ = args.get::<Bar>(0)?;
        Ok(format!("{}:{}", args.value::<String>(1)?, args.value::<u16>(2)?))
      }),
  );
  let container = Container::with_types(types);

  // Act
  let endpoint = container
    .resolve_with(
      "Endpoint",
      vec![
        Some(Argument::class("Bar")),
        Some(Argument::value(String::from("localhost"))),
      ],
    )
    .unwrap()
    .downcast::<String>()
    .unwrap();

  // Assert
  assert_eq!(*endpoint, "localhost:80");
}

#[test]
fn test_resolve_with_requires_every_required_argument() {
  let types = types();
  types.register(
    TypeDescriptor::new("Endpoint")
      .param(ParameterDescriptor::primitive("host", "string"))
      .param(ParameterDescriptor::primitive("port", "int"))
      .construct(|_| Ok(())),
  );
  let container = Container::with_types(types);

  let err = unresolvable(container.resolve_with("Endpoint", vec![Some(Argument::value(1u8)), None]));

  assert!(matches!(err, Unresolvable::Class { ref reason, .. } if reason.contains("$port")));
}

#[test]
fn test_resolve_with_spreads_trailing_arguments_into_variadics() {
  let container = container();

  let tagged = container
    .resolve_with(
      "Tagged",
      vec![
        Some(Argument::value(String::from("a"))),
        None,
        Some(Argument::value(String::from("b"))),
      ],
    )
    .unwrap()
    .downcast::<Tagged>()
    .unwrap();

  let tags: Vec<&str> = tagged.tags.iter().map(|t| t.as_str()).collect();
  assert_eq!(tags, vec!["a", "b"]);
}

#[test]
fn test_variadic_defaults_are_spread_by_both_resolution_paths() {
  // Arrange
  let types = types();
  types.register(
    TypeDescriptor::new("Labelled")
      .param(
        ParameterDescriptor::variadic("labels", ParamType::primitive("string"))
          .with_default(String::from("untitled")),
      )
      .construct(|args| Ok(Tagged { tags: args.rest::<String>(0)? })),
  );
  let container = Container::with_types(types);

  // Act
  let resolved = container.resolve("Labelled").unwrap().downcast::<Tagged>().unwrap();
  let supplied = container
    .resolve_with("Labelled", vec![])
    .unwrap()
    .downcast::<Tagged>()
    .unwrap();

  // Assert
  for tagged in [resolved, supplied] {
    let tags: Vec<&str> = tagged.tags.iter().map(|t| t.as_str()).collect();
    assert_eq!(tags, vec!["untitled"]);
  }
}

#[test]
fn test_resolve_with_degrades_to_resolve_without_parameters() {
  let container = container();
  let bar = container.resolve_with("Bar", vec![Some(Argument::value(1u8))]);
  assert!(bar.unwrap().downcast::<Bar>().is_ok());
}

// --- Factory & Cycle Tests ---

#[test]
fn test_factory_targets_are_invoked_with_the_container() {
  let container = container();
  container.instance("name", String::from("fibre"));

  let target = Target::factory(|c: &Container| Ok(format!("hello {}", c.get_as::<String>("name")?)));
  let greeting = container.resolve(target).unwrap().downcast::<String>().unwrap();

  assert_eq!(*greeting, "hello fibre");
}

#[test]
fn test_circular_dependencies_are_reported() {
  // Arrange: Loop -> Loop through the container.
  let types = types();
  types.register(
    TypeDescriptor::new("Loop")
      .param(ParameterDescriptor::class("next", "Loop"))
      .construct(|_| Ok(())),
  );
  let container = Container::with_types(types);
  container.service("Loop");

  // Act
  let err = container.get("Loop").unwrap_err();

  // Assert
  assert!(matches!(err, Error::Unresolvable(Unresolvable::Circular { .. })));
}

#[test]
fn test_circular_dependency_with_default_falls_back() {
  let types = types();
  types.register(
    TypeDescriptor::new("Node")
      .param(ParameterDescriptor::class("next", "Node").with_default(()))
      .construct(|args| {
        let next = args.get::<Node>(0).ok();
        Ok(Node { next })
      }),
  );
  let container = Container::with_types(types);

  let node = container.resolve("Node").unwrap().downcast::<Node>().unwrap();

  // The recursive attempt hit the cycle, so the parameter took its default.
  assert!(node.next.is_none());
}

// --- Event Tests ---

#[test]
fn test_resolved_dispatchers_receive_later_events() {
  // Arrange
  let container = container();

  // Act
  let recorder = container.resolve("Recorder").unwrap().downcast::<Recorder>().unwrap();
  container.resolve("Foo").unwrap();

  // Assert
  assert_eq!(
    recorder.seen(),
    vec![
      "RecorderResolved",
      "FooRequested",
      "BarRequested",
      "BarResolved",
      "FooResolved",
    ]
  );
  assert_eq!(container.resolver().dispatchers().len(), 1);
}

#[test]
fn test_dispatchers_are_registered_once() {
  let container = container();
  container.service("Recorder");
  container.types().register(
    TypeDescriptor::new("Audited")
      .param(ParameterDescriptor::class("recorder", "Recorder"))
      .construct(|args| args.get::<Recorder>(0).map(|_| ())),
  );

  let recorder = container.get_as::<Recorder>("Recorder").unwrap();
  container.resolve("Audited").unwrap();
  container.resolve("Audited").unwrap();

  assert_eq!(container.resolver().dispatchers().len(), 1);
  assert_eq!(recorder.seen().iter().filter(|e| *e == "AuditedResolved").count(), 2);
}

#[test]
fn test_events_pass_through_dispatchers_in_registration_order() {
  // Arrange
  struct Tap {
    label: &'static str,
    log: Arc<Mutex<Vec<String>>>,
  }

  impl EventDispatcher for Tap {
    fn dispatch(&self, event: ResolverEvent) -> ResolverEvent {
      self
        .log
        .lock()
        .unwrap()
        .push(format!("{}:{}", self.label, event.name()));
      event
    }
  }

  let log = Arc::new(Mutex::new(Vec::new()));
  let types = types();
  for (name, label) in [("One", "one"), ("Two", "two")] {
    let log = log.clone();
    types.register(
      TypeDescriptor::new(name).construct(move |_| {
        Ok(Tap {
          label,
          log: log.clone(),
        })
      }),
    );
  }
  types.dispatcher::<Tap>();
  let container = Container::with_types(types);
  container.resolve("One").unwrap();
  container.resolve("Two").unwrap();
  log.lock().unwrap().clear();

  // Act
  container.resolve("Bar").unwrap();

  // Assert
  assert_eq!(
    *log.lock().unwrap(),
    vec![
      "one:BarRequested",
      "two:BarRequested",
      "one:BarResolved",
      "two:BarResolved",
    ]
  );
  assert_eq!(container.resolver().dispatchers().len(), 2);
}

#[test]
fn test_notifications_can_be_disabled() {
  let config = ContainerConfig {
    notify: false,
    ..ContainerConfig::default()
  };
  let container = Container::from_config(types(), config);

  let recorder = container.resolve("Recorder").unwrap().downcast::<Recorder>().unwrap();
  container.resolve("Bar").unwrap();

  assert!(recorder.seen().is_empty());
  assert_eq!(container.resolver().dispatchers().len(), 1);
}
