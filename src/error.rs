//! The error surface of the composition runtime.
//!
//! Every failure is synchronous and deterministic: a missing binding or a
//! malformed type descriptor is a programming defect, not a transient
//! condition, so there is no retry machinery anywhere. Each variant carries
//! enough context (the requested type, its identifier, and the dependent type
//! being built when the failure occurred) to locate the broken binding
//! without a debugger.

use thiserror::Error;

/// The main error type for `fibre_compose`.
#[derive(Debug, Error)]
pub enum Error {
  /// A second unconditional binding was registered for an already-bound key.
  #[error("a binding for `{type_name}`{} is already registered", fmt_id(.identifier))]
  TypeAlreadyRegistered {
    type_name: &'static str,
    identifier: Option<String>,
  },

  /// A binding was opened with `bind` but never completed by a terminal call.
  #[error("the binding opened for `{type_name}` was never completed")]
  IncompleteBinding { type_name: &'static str },

  /// A binding completion did not match the binding that was pending.
  #[error("binding completion for `{completed}` does not match the pending binding `{expected}`")]
  UnexpectedBinding {
    expected: &'static str,
    completed: &'static str,
  },

  /// The type's descriptor declares it as not constructible at all.
  #[error("`{type_name}` cannot be constructed: {reason}")]
  TypeNotSupported {
    type_name: &'static str,
    reason: &'static str,
  },

  /// The type's descriptor declares it abstract.
  #[error("`{type_name}` is abstract and cannot be constructed directly")]
  AbstractClassConstruction { type_name: &'static str },

  /// The type's descriptor declares no constructor candidate.
  #[error("`{type_name}` declares no constructor")]
  HasNoConstructor { type_name: &'static str },

  /// Several constructor candidates, none of which can be selected.
  #[error("`{type_name}` declares multiple eligible constructors and none is marked for injection")]
  MultipleConstructors { type_name: &'static str },

  /// More than one injection marker on the same constructor or member.
  #[error("`{type_name}` carries more than one injection marker on `{member}`")]
  MultipleAttributes {
    type_name: &'static str,
    member: String,
  },

  /// A property declared injectable but with no setter.
  #[error("injectable property `{property}` on `{type_name}` has no setter")]
  ReadonlyProperty {
    type_name: &'static str,
    property: &'static str,
  },

  /// No binding anywhere in the scope chain for a required dependency.
  #[error("no binding registered for `{type_name}`{}{}", fmt_id(.identifier), fmt_requester(.requested_by))]
  TypeNotRegistered {
    type_name: &'static str,
    identifier: Option<String>,
    requested_by: Option<&'static str>,
  },

  /// The dependency graph loops back onto a type that is being built.
  #[error("circular dependency detected while resolving `{type_name}`: {chain}")]
  CircularDependency {
    type_name: &'static str,
    chain: String,
  },

  /// Misuse of the runtime itself, e.g. resolving from a disposed container.
  #[error("invalid operation: {message}")]
  InvalidOperation { message: String },
}

impl Error {
  /// A stable, machine-matchable code for the error kind.
  pub fn code(&self) -> &'static str {
    match self {
      Error::TypeAlreadyRegistered { .. } => "TypeAlreadyRegistered",
      Error::IncompleteBinding { .. } => "IncompleteBinding",
      Error::UnexpectedBinding { .. } => "UnexpectedBinding",
      Error::TypeNotSupported { .. } => "TypeNotSupported",
      Error::AbstractClassConstruction { .. } => "AbstractClassConstruction",
      Error::HasNoConstructor { .. } => "HasNoConstructor",
      Error::MultipleConstructors { .. } => "MultipleConstructors",
      Error::MultipleAttributes { .. } => "MultipleAttributes",
      Error::ReadonlyProperty { .. } => "ReadonlyProperty",
      Error::TypeNotRegistered { .. } => "TypeNotRegistered",
      Error::CircularDependency { .. } => "CircularDependency",
      Error::InvalidOperation { .. } => "InvalidOperation",
    }
  }

  pub(crate) fn disposed() -> Self {
    Error::InvalidOperation {
      message: "the container has been disposed".to_string(),
    }
  }

  pub(crate) fn value_mismatch(type_name: &'static str) -> Self {
    Error::InvalidOperation {
      message: format!("stored value does not match the requested type `{type_name}`"),
    }
  }
}

fn fmt_id(identifier: &Option<String>) -> String {
  match identifier {
    Some(id) => format!(" (id \"{id}\")"),
    None => String::new(),
  }
}

fn fmt_requester(requested_by: &Option<&'static str>) -> String {
  match requested_by {
    Some(dependent) => format!(" while building `{dependent}`"),
    None => String::new(),
  }
}

/// A specialized `Result` type for `fibre_compose` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
