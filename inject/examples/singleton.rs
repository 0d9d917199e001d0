use fibre_inject::{Container, TypeDescriptor};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};

// A simple service that gets a unique ID upon creation.
struct RequestTracker {
  id: usize,
}

// A global, thread-safe counter to generate unique IDs.
static ID_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn main() -> fibre_inject::Result<()> {
  let container = Container::new();
  container.types().register(TypeDescriptor::new("RequestTracker").construct(|_| {
    println!("Creating RequestTracker...");
    Ok(RequestTracker {
      id: ID_COUNTER.fetch_add(1, Ordering::SeqCst),
    })
  }));

  // --- Singleton Registration ---
  // The tracker is built once, on first access.
  container.service_with("singleton_tracker", "RequestTracker");

  // --- Prototype Registration ---
  // The tracker is built on every access.
  container.prototype_with("prototype_tracker", "RequestTracker");

  let s1 = container.get_as::<RequestTracker>("singleton_tracker")?;
  let s2 = container.get_as::<RequestTracker>("singleton_tracker")?;
  println!("singleton ids: {} {}", s1.id, s2.id);
  assert!(Arc::ptr_eq(&s1, &s2));

  let p1 = container.get_as::<RequestTracker>("prototype_tracker")?;
  let p2 = container.get_as::<RequestTracker>("prototype_tracker")?;
  println!("prototype ids: {} {}", p1.id, p2.id);
  assert_ne!(p1.id, p2.id);

  Ok(())
}
