use fibre_flow::{register_handler, Bus, Continuum, Handler, Message};
use fibre_inject::{Container, TypeDescriptor};
use std::sync::Arc;

struct RegisterUser {
  email: String,
}

struct UserRegistered {
  id: u64,
}

struct RegisterUserHandler;

impl Handler for RegisterUserHandler {
  fn handle(&self, message: &Message) -> fibre_flow::Result<Option<Message>> {
    let Some(command) = message.downcast::<RegisterUser>() else {
      return Ok(None);
    };
    println!("registering {}", command.email);
    Ok(Some(Message::new(UserRegistered { id: 1 })))
  }
}

fn main() -> fibre_flow::Result<()> {
  let container = Arc::new(Container::new());
  register_handler::<RegisterUserHandler>(container.types());
  container
    .types()
    .register(TypeDescriptor::new("RegisterUserHandler").construct(|_| Ok(RegisterUserHandler)));
  container.service("RegisterUserHandler");

  // Every message is logged on the way in; only the response is logged on the way out.
  let before = Continuum::new().then(|message: &mut Message, next| {
    println!("-> {}", message.name());
    next.proceed(message)
  });
  let after = Continuum::new().then(|message: &mut Message, next| {
    println!("<- {}", message.name());
    next.proceed(message)
  });

  let bus = Bus::new(container).before(before).after(after);
  let response = bus.dispatch(Message::new(RegisterUser {
    email: "ada@example.com".to_string(),
  }))?;

  if let Some(registered) = response.downcast::<UserRegistered>() {
    println!("user id: {}", registered.id);
  }
  Ok(())
}
