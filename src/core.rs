//! Core, non-public data structures shared across the runtime.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::metadata::InjectionPoint;

thread_local! {
  // The ordered stack of (scope, key) pairs currently being resolved on this
  // thread. Re-entering a pair that is already on the stack means the
  // dependency graph loops back onto itself.
  static RESOLVING: RefCell<Vec<GuardEntry>> = RefCell::new(Vec::new());
}

struct GuardEntry {
  scope: usize,
  type_id: TypeId,
  identifier: Option<String>,
  type_name: &'static str,
}

/// An RAII guard that detects circular dependencies across provider
/// re-entrancy.
///
/// `enter` pushes a (scope, key) frame onto the thread-local resolution
/// stack and reports `CircularDependency` if an equal frame is already
/// present; dropping the guard pops the frame. The scope pointer is part of
/// the frame so that delegation into a foreign container never collides with
/// an in-flight resolution of the same key in this one.
pub(crate) struct ResolutionGuard;

impl ResolutionGuard {
  pub(crate) fn enter(scope: usize, key: &BindingKey) -> Result<Self> {
    RESOLVING.with(|stack| {
      let mut stack = stack.borrow_mut();
      let looped = stack
        .iter()
        .any(|e| e.scope == scope && e.type_id == key.type_id && e.identifier == key.identifier);
      if looped {
        let chain = stack
          .iter()
          .map(|e| e.type_name)
          .chain([key.type_name])
          .collect::<Vec<_>>()
          .join(" -> ");
        return Err(Error::CircularDependency {
          type_name: key.type_name,
          chain,
        });
      }
      stack.push(GuardEntry {
        scope,
        type_id: key.type_id,
        identifier: key.identifier.clone(),
        type_name: key.type_name,
      });
      Ok(())
    })?;
    Ok(Self)
  }
}

impl Drop for ResolutionGuard {
  fn drop(&mut self) {
    RESOLVING.with(|stack| {
      stack.borrow_mut().pop();
    });
  }
}

/// The registry key: a contract type plus an optional identifier.
#[derive(Clone, PartialEq, Eq, Hash)]
pub(crate) struct BindingKey {
  pub(crate) type_id: TypeId,
  pub(crate) type_name: &'static str,
  pub(crate) identifier: Option<String>,
}

impl BindingKey {
  pub(crate) fn new<T: ?Sized + Any>(identifier: Option<&str>) -> Self {
    Self {
      type_id: TypeId::of::<T>(),
      type_name: std::any::type_name::<T>(),
      identifier: identifier.map(str::to_owned),
    }
  }

  pub(crate) fn for_point(point: &InjectionPoint) -> Self {
    Self {
      type_id: point.type_id,
      type_name: point.type_name,
      identifier: point.identifier.clone(),
    }
  }
}

impl fmt::Debug for BindingKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.identifier {
      Some(id) => write!(f, "Key({}, id \"{}\")", self.type_name, id),
      None => write!(f, "Key({})", self.type_name),
    }
  }
}

/// A clonable, type-erased handle to a shared value.
///
/// The payload is always an `Arc<T>` (or `Arc<dyn Trait>`) boxed behind a
/// second `Arc` so that the erased resolution pipeline can clone cached
/// values without knowing `T`.
#[derive(Clone)]
pub(crate) struct SharedValue(Arc<dyn Any + Send + Sync>);

impl SharedValue {
  /// Wraps an already-shared handle, typically an `Arc<T>`.
  pub(crate) fn new<H: Any + Send + Sync>(handle: H) -> Self {
    Self(Arc::new(handle))
  }

  /// Wraps a plain value into a fresh `Arc<T>` handle.
  pub(crate) fn of<T: Any + Send + Sync>(value: T) -> Self {
    Self::new(Arc::new(value))
  }

  pub(crate) fn extract<H: Any + Send + Sync + Clone>(&self) -> Option<H> {
    self.0.downcast_ref::<H>().cloned()
  }
}

/// The context a binding predicate is evaluated against.
pub struct InjectionContext<'a> {
  /// The identifier the consumer asked for, if any.
  pub identifier: Option<&'a str>,
  /// Whether the request tolerates an absent binding.
  pub optional: bool,
  /// The type being built when this request was made, if the request came
  /// from inside an `instantiate`/`inject` call.
  pub requesting: Option<&'static str>,
}
