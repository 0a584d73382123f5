//! # Fibre Compose
//!
//! A hierarchical, thread-safe Inversion of Control (IoC) composition
//! runtime for Rust.
//!
//! Fibre Compose maps requested contracts (a type, an optional identifier,
//! an optional predicate) to production strategies, and builds whole object
//! graphs on demand from per-type metadata that types declare about
//! themselves.
//!
//! ## Core Concepts
//!
//! - **Container**: the central scope; owns the binding registry and the
//!   injector, and can spawn sub-containers that see its bindings live.
//! - **Binding**: registered with the fluent `bind::<T>()` builder; a
//!   binding is keyed by contract type plus optional identifier, optionally
//!   guarded by a predicate, and completed by a lifetime terminal
//!   (`to_instance`, `as_singleton`, `as_transient`).
//! - **Injectable**: a type that declares its constructor candidates and
//!   injectable members through a [`TypeDescriptor`]; the analyzer validates
//!   and caches that metadata once per type.
//! - **Resolution**: `resolve` raises on a missing binding, `try_resolve`
//!   returns `None`; `instantiate` builds a fresh instance, `inject` fills
//!   the members of an existing one.
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use fibre_compose::{
//!   contracts, Container, ConstructorDescriptor, Injectable, InjectionPoint, TypeDescriptor,
//! };
//!
//! trait Notifier: Send + Sync {
//!   fn notify(&self) -> String;
//! }
//!
//! struct EmailNotifier;
//!
//! impl Notifier for EmailNotifier {
//!   fn notify(&self) -> String {
//!     "email sent".to_string()
//!   }
//! }
//!
//! impl Injectable for EmailNotifier {
//!   fn describe() -> TypeDescriptor {
//!     TypeDescriptor::of::<Self>()
//!       .constructor(ConstructorDescriptor::public("new", vec![], |_| Ok(EmailNotifier)))
//!   }
//! }
//!
//! contracts!(Notifier => EmailNotifier);
//!
//! struct Alerts {
//!   notifier: Arc<dyn Notifier>,
//! }
//!
//! impl Injectable for Alerts {
//!   fn describe() -> TypeDescriptor {
//!     TypeDescriptor::of::<Self>().constructor(ConstructorDescriptor::public(
//!       "new",
//!       vec![InjectionPoint::of::<dyn Notifier>("notifier")],
//!       |args| {
//!         Ok(Alerts {
//!           notifier: args.take()?,
//!         })
//!       },
//!     ))
//!   }
//! }
//!
//! fn main() -> fibre_compose::Result<()> {
//!   let scope = Container::new();
//!   scope.bind::<dyn Notifier>().to::<EmailNotifier>().as_singleton()?;
//!
//!   let alerts = scope.instantiate::<Alerts>()?;
//!   assert_eq!(alerts.notifier.notify(), "email sent");
//!   Ok(())
//! }
//! ```

mod analyzer;
mod binder;
mod builder;
mod container;
mod core;
mod error;
mod global;
mod injector;
mod macros;
mod metadata;
mod provider;

pub use analyzer::{Analyzer, Sections, TypeInfo};
pub use builder::{BindingBuilder, SourcedBuilder};
pub use container::Container;
pub use core::InjectionContext;
pub use error::{Error, Result};
pub use global::global;
pub use injector::Overrides;
pub use metadata::{
  Args, Constructibility, ConstructorDescriptor, FieldDescriptor, Injectable, InjectionPoint,
  MemberGroup, MethodDescriptor, PropertyDescriptor, ProvideAs, TypeDescriptor,
};
