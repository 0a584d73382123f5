//! Public macros for ergonomic resolution and contract registration.

/// Resolves a service from a scope, panicking if it cannot be resolved.
///
/// This is the ergonomic layer for application code that treats a missing
/// binding as fatal. Library code should prefer [`Container::resolve`] and
/// handle the error.
///
/// [`Container::resolve`]: crate::Container::resolve
///
/// # Examples
///
/// ```
/// use fibre_compose::{global, resolve};
///
/// global().bind::<String>().with_id("motd").to_instance(String::from("hello")).unwrap();
///
/// let message = resolve!(global(), String, "motd");
/// assert_eq!(*message, "hello");
/// ```
#[macro_export]
macro_rules! resolve {
  // Resolving a concrete type: resolve!(scope, MyService)
  ($scope:expr, $type:ty) => {
    ($scope).resolve::<$type>().unwrap_or_else(|err| {
      panic!(
        "failed to resolve required service {}: {}",
        std::any::type_name::<$type>(),
        err
      )
    })
  };

  // Resolving a named concrete type: resolve!(scope, MyService, "name")
  ($scope:expr, $type:ty, $id:expr) => {
    ($scope).resolve_with_id::<$type>($id).unwrap_or_else(|err| {
      panic!(
        "failed to resolve required service {} with id '{}': {}",
        std::any::type_name::<$type>(),
        $id,
        err
      )
    })
  };

  // Resolving a trait object: resolve!(scope, trait MyTrait)
  ($scope:expr, trait $trait_ident:ident) => {
    ($scope).resolve::<dyn $trait_ident>().unwrap_or_else(|err| {
      panic!(
        "failed to resolve required trait service {}: {}",
        std::any::type_name::<dyn $trait_ident>(),
        err
      )
    })
  };

  // Resolving a named trait object: resolve!(scope, trait MyTrait, "name")
  ($scope:expr, trait $trait_ident:ident, $id:expr) => {
    ($scope)
      .resolve_with_id::<dyn $trait_ident>($id)
      .unwrap_or_else(|err| {
        panic!(
          "failed to resolve required trait service {} with id '{}': {}",
          std::any::type_name::<dyn $trait_ident>(),
          $id,
          err
        )
      })
  };
}

/// Declares which concrete types may be bound under a trait contract.
///
/// Generates the [`ProvideAs`] impls that let
/// `bind::<dyn Trait>().to::<Impl>()` compile on stable Rust; the unsizing
/// coercion happens inside the generated impl, where both types are known.
///
/// [`ProvideAs`]: crate::ProvideAs
///
/// # Examples
///
/// ```
/// use fibre_compose::contracts;
///
/// trait Greeter: Send + Sync {
///   fn greet(&self) -> String;
/// }
///
/// struct EnglishGreeter;
/// impl Greeter for EnglishGreeter {
///   fn greet(&self) -> String {
///     "Hello!".to_string()
///   }
/// }
///
/// contracts!(Greeter => EnglishGreeter);
/// ```
#[macro_export]
macro_rules! contracts {
  ($trait_path:path => $($impl_ty:ty),+ $(,)?) => {
    $(
      impl $crate::ProvideAs<dyn $trait_path> for $impl_ty {
        fn provide_as(
          this: ::std::sync::Arc<Self>,
        ) -> ::std::sync::Arc<dyn $trait_path> {
          this
        }
      }
    )+
  };
}
