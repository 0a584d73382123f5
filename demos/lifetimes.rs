//! Binding lifetimes: instance, singleton, and transient.

use std::sync::Arc;

use fibre_compose::{Container, Result};

struct RequestCounter {
  label: &'static str,
}

fn main() -> Result<()> {
  let scope = Container::new();

  // An instance binding always returns the exact pre-built value.
  let prebuilt = Arc::new(RequestCounter { label: "prebuilt" });
  scope.bind::<RequestCounter>().to_instance(prebuilt.clone())?;

  let resolved = scope.resolve::<RequestCounter>()?;
  assert!(Arc::ptr_eq(&prebuilt, &resolved));
  println!("instance binding resolved: {}", resolved.label);

  // A singleton factory runs once; a transient factory runs per request.
  struct Singleton;
  struct Transient;

  scope
    .bind::<Singleton>()
    .from_factory(|_| Ok(Arc::new(Singleton)))
    .as_singleton()?;
  scope
    .bind::<Transient>()
    .from_factory(|_| Ok(Arc::new(Transient)))
    .as_transient()?;

  let s1 = scope.resolve::<Singleton>()?;
  let s2 = scope.resolve::<Singleton>()?;
  assert!(Arc::ptr_eq(&s1, &s2));
  println!("singleton resolutions share one value");

  let t1 = scope.resolve::<Transient>()?;
  let t2 = scope.resolve::<Transient>()?;
  assert!(!Arc::ptr_eq(&t1, &t2));
  println!("transient resolutions are distinct");

  Ok(())
}
