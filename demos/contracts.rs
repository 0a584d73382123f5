//! Binding trait contracts to concrete implementations, with identifiers
//! selecting between them.

use fibre_compose::{
  contracts, Container, ConstructorDescriptor, Injectable, Result, TypeDescriptor,
};

// --- Abstraction and implementations ---

trait MessageSender: Send + Sync {
  fn send(&self, to: &str, message: &str) -> String;
}

struct EmailSender;
impl MessageSender for EmailSender {
  fn send(&self, to: &str, message: &str) -> String {
    format!("Sending email to {}: '{}'", to, message)
  }
}

struct SmsSender;
impl MessageSender for SmsSender {
  fn send(&self, to: &str, message: &str) -> String {
    format!("Sending SMS to {}: '{}'", to, message)
  }
}

impl Injectable for EmailSender {
  fn describe() -> TypeDescriptor {
    TypeDescriptor::of::<Self>()
      .constructor(ConstructorDescriptor::public("new", vec![], |_| Ok(EmailSender)))
  }
}

impl Injectable for SmsSender {
  fn describe() -> TypeDescriptor {
    TypeDescriptor::of::<Self>()
      .constructor(ConstructorDescriptor::public("new", vec![], |_| Ok(SmsSender)))
  }
}

contracts!(MessageSender => EmailSender, SmsSender);

fn main() -> Result<()> {
  let scope = Container::new();

  // Register both implementations under unique identifiers.
  scope
    .bind::<dyn MessageSender>()
    .with_id("email")
    .to::<EmailSender>()
    .as_singleton()?;
  scope
    .bind::<dyn MessageSender>()
    .with_id("sms")
    .to::<SmsSender>()
    .as_singleton()?;

  // Choose the implementation at the point of resolution.
  let email = scope.resolve_with_id::<dyn MessageSender>("email")?;
  let sms = scope.resolve_with_id::<dyn MessageSender>("sms")?;

  let result1 = email.send("test@example.com", "Hello from Fibre!");
  let result2 = sms.send("+123456789", "Hello from Fibre!");

  println!("{}", result1);
  println!("{}", result2);

  assert!(result1.contains("email"));
  assert!(result2.contains("SMS"));

  Ok(())
}
