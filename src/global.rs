//! The process-wide root container and its access function.

use once_cell::sync::Lazy;
use std::sync::Arc;

use crate::container::Container;

// The one and only global root container, created on first access.
static GLOBAL_CONTAINER: Lazy<Arc<Container>> = Lazy::new(Container::new);

/// Provides the global root container.
///
/// Applications that prefer explicit composition roots can ignore this and
/// pass their own [`Container`] around; the global is never touched unless
/// asked for.
///
/// # Examples
///
/// ```
/// use fibre_compose::global;
///
/// fn register_services() -> fibre_compose::Result<()> {
///   global().bind::<String>().to_instance(String::from("Hello from global!"))
/// }
/// ```
pub fn global() -> &'static Arc<Container> {
  &GLOBAL_CONTAINER
}
