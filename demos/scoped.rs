//! Scope trees: sub-containers see parent bindings live, shadow them
//! locally, and are torn down by an explicit dispose.

use fibre_compose::{Container, Result};

#[derive(Debug)]
struct Environment {
  name: &'static str,
}

fn main() -> Result<()> {
  let root = Container::new();
  root.bind::<Environment>().to_instance(Environment { name: "production" })?;

  // A sub-container sees everything the root has...
  let request_scope = root.create_sub_container()?;
  println!(
    "request scope sees: {:?}",
    request_scope.resolve::<Environment>()?
  );

  // ...and can shadow it without touching the root.
  request_scope
    .bind::<Environment>()
    .to_instance(Environment { name: "request-local" })?;
  println!(
    "after shadowing, request scope sees: {:?}",
    request_scope.resolve::<Environment>()?
  );
  println!("the root still sees: {:?}", root.resolve::<Environment>()?);

  // Bindings added to the root later are visible to live children.
  root
    .bind::<Environment>()
    .with_id("canary")
    .to_instance(Environment { name: "canary" })?;
  println!(
    "late root binding, via the child: {:?}",
    request_scope.resolve_with_id::<Environment>("canary")?
  );

  // Dispose tears the child down; the root keeps working.
  request_scope.dispose();
  assert!(request_scope.resolve::<Environment>().is_err());
  println!("after dispose, the root still sees: {:?}", root.resolve::<Environment>()?);

  Ok(())
}
