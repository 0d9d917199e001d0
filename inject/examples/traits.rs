use fibre_inject::{Container, ParameterDescriptor, TypeDescriptor};
use std::sync::Arc;

// 1. Define the abstraction (the trait)
trait Logger: Send + Sync {
  fn log(&self, message: &str);
}

// 2. Define a concrete implementation
struct ConsoleLogger;
impl Logger for ConsoleLogger {
  fn log(&self, message: &str) {
    println!("[CONSOLE LOG]: {}", message);
  }
}

fn as_logger(logger: Arc<ConsoleLogger>) -> Arc<dyn Logger> {
  logger
}

// 3. Define a service that depends on the abstraction
struct ReportService {
  logger: Arc<dyn Logger>,
}

impl ReportService {
  fn generate_report(&self) {
    self.logger.log("Starting report generation.");
    self.logger.log("Finished report generation.");
  }
}

fn main() -> fibre_inject::Result<()> {
  let container = Container::new();

  // The interface is described but cannot be built; the container binds it
  // to the concrete logger.
  container
    .types()
    .register(TypeDescriptor::interface("Logger"))
    .register(TypeDescriptor::new("ConsoleLogger").construct(|_| Ok(ConsoleLogger)))
    .capability::<ConsoleLogger, dyn Logger>(as_logger);
  container.service_with("Logger", "ConsoleLogger");

  // ReportService asks for `Logger`; the registration short-circuits the
  // interface and hands over the ConsoleLogger singleton as `dyn Logger`.
  container.types().register(
    TypeDescriptor::new("ReportService")
      .param(ParameterDescriptor::class("logger", "Logger"))
      .construct(|args| {
        Ok(ReportService {
          logger: args.cast::<dyn Logger>(0)?,
        })
      }),
  );

  println!("Resolving the high-level service...");
  container.service("ReportService");
  let report_service = container.get_as::<ReportService>("ReportService")?;

  println!("Using the service...");
  report_service.generate_report();
  Ok(())
}
