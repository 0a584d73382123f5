//! The fluent binding builder.
//!
//! A builder is opened by [`Container::bind`] and must be driven to exactly
//! one terminal call (`to_instance`, `as_singleton`, `as_transient`), which
//! consumes it by move and routes to a single registry insertion. Qualifiers
//! (`with_id`, `when`) come first, then at most one source
//! (`to`, `from_factory`, `from_resolve`, `from_container`), then the
//! terminal. A builder that is dropped instead leaves its binding pending,
//! and the next registry operation reports `IncompleteBinding`.

use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::binder::{BuilderSlot, Predicate};
use crate::container::Container;
use crate::core::{BindingKey, InjectionContext, SharedValue};
use crate::error::Result;
use crate::injector::CallFrame;
use crate::metadata::{Injectable, ProvideAs};
use crate::provider::{Producer, ProducerKind, Provider};

/// An open binding for contract `T`, not yet tied to a value source.
pub struct BindingBuilder<'c, T: ?Sized + Any + Send + Sync> {
  scope: &'c Container,
  identifier: Option<String>,
  condition: Option<Predicate>,
  slot: BuilderSlot,
  _contract: PhantomData<fn(&T)>,
}

impl<'c, T: ?Sized + Any + Send + Sync> BindingBuilder<'c, T> {
  pub(crate) fn open(scope: &'c Container) -> Self {
    let slot = scope.binder_ref().open_pending(std::any::type_name::<T>());
    Self {
      scope,
      identifier: None,
      condition: None,
      slot,
      _contract: PhantomData,
    }
  }

  /// Registers the binding under an identifier, isolating it from the
  /// unnamed binding and from every other identifier.
  pub fn with_id(mut self, id: impl Into<String>) -> Self {
    self.identifier = Some(id.into());
    self
  }

  /// Guards the binding with a predicate evaluated at resolve time; the
  /// first matching entry in registration order wins.
  pub fn when<F>(mut self, condition: F) -> Self
  where
    F: Fn(&InjectionContext<'_>) -> bool + Send + Sync + 'static,
  {
    self.condition = Some(Box::new(condition));
    self
  }

  /// Restricts the binding to requests made while building `R`.
  pub fn when_injected_into<R: ?Sized + Any>(self) -> Self {
    self.when(|ctx| ctx.requesting == Some(std::any::type_name::<R>()))
  }

  // --- Sources ---

  /// Produces the value by constructing `C` through the injector and
  /// coercing it to the contract.
  pub fn to<C>(self) -> SourcedBuilder<'c, T>
  where
    C: Injectable + ProvideAs<T>,
  {
    self.sourced(
      ProducerKind::Construct,
      Box::new(move |scope: &Arc<Container>, call: &mut CallFrame| {
        let built: C = scope.instantiate_in(call)?;
        Ok(SharedValue::new(<C as ProvideAs<T>>::provide_as(Arc::new(built))))
      }),
    )
  }

  /// Produces the value through a user-supplied factory. The factory
  /// receives the resolving scope and may resolve its own dependencies.
  pub fn from_factory<F>(self, factory: F) -> SourcedBuilder<'c, T>
  where
    F: Fn(&Arc<Container>) -> Result<Arc<T>> + Send + Sync + 'static,
  {
    self.sourced(
      ProducerKind::Factory,
      Box::new(move |scope: &Arc<Container>, _call: &mut CallFrame| {
        Ok(SharedValue::new(factory(scope)?))
      }),
    )
  }

  /// Produces the value by resolving `S` (unnamed) in the same scope and
  /// coercing it to the contract.
  pub fn from_resolve<S>(self) -> SourcedBuilder<'c, T>
  where
    S: ?Sized + Any + Send + Sync + ProvideAs<T>,
  {
    self.from_resolve_inner::<S>(None)
  }

  /// Like [`BindingBuilder::from_resolve`], against the binding registered
  /// under `id`.
  pub fn from_resolve_with_id<S>(self, id: impl Into<String>) -> SourcedBuilder<'c, T>
  where
    S: ?Sized + Any + Send + Sync + ProvideAs<T>,
  {
    self.from_resolve_inner::<S>(Some(id.into()))
  }

  fn from_resolve_inner<S>(self, id: Option<String>) -> SourcedBuilder<'c, T>
  where
    S: ?Sized + Any + Send + Sync + ProvideAs<T>,
  {
    self.sourced(
      ProducerKind::Alias,
      Box::new(move |scope: &Arc<Container>, call: &mut CallFrame| {
        let source: Arc<S> = scope.resolve_nested(id.as_deref(), call)?;
        Ok(SharedValue::new(<S as ProvideAs<T>>::provide_as(source)))
      }),
    )
  }

  /// Delegates this key (same contract and identifier) to another,
  /// independently-owned container.
  pub fn from_container(self, other: &Arc<Container>) -> SourcedBuilder<'c, T> {
    let other = Arc::clone(other);
    let id = self.identifier.clone();
    self.sourced(
      ProducerKind::Foreign,
      Box::new(move |_scope: &Arc<Container>, call: &mut CallFrame| {
        let value: Arc<T> = other.resolve_nested(id.as_deref(), call)?;
        Ok(SharedValue::new(value))
      }),
    )
  }

  // --- Terminals ---

  /// Binds a pre-built value; every resolution returns this exact value.
  pub fn to_instance(self, value: impl Into<Arc<T>>) -> Result<()> {
    let shared = SharedValue::new(value.into());
    self.finish(Provider::Instance(shared))
  }

  /// Shorthand for `to::<T>().as_singleton()` on a concrete contract.
  pub fn as_singleton(self) -> Result<()>
  where
    T: Injectable,
  {
    self.to::<T>().as_singleton()
  }

  /// Shorthand for `to::<T>().as_transient()` on a concrete contract.
  pub fn as_transient(self) -> Result<()>
  where
    T: Injectable,
  {
    self.to::<T>().as_transient()
  }

  fn sourced(
    self,
    kind: ProducerKind,
    produce: crate::provider::ProduceFn,
  ) -> SourcedBuilder<'c, T> {
    SourcedBuilder {
      inner: self,
      producer: Producer { kind, produce },
    }
  }

  fn finish(self, provider: Provider) -> Result<()> {
    let binder = self.scope.binder_ref();
    binder.close_pending(&self.slot, std::any::type_name::<T>())?;
    let key = BindingKey::new::<T>(self.identifier.as_deref());
    binder.register(key, self.condition, provider)
  }
}

/// A binding whose value source is fixed; only the lifetime remains to be
/// chosen.
pub struct SourcedBuilder<'c, T: ?Sized + Any + Send + Sync> {
  inner: BindingBuilder<'c, T>,
  producer: Producer,
}

impl<'c, T: ?Sized + Any + Send + Sync> SourcedBuilder<'c, T> {
  /// The first resolution produces the value; later resolutions return the
  /// cached one.
  pub fn as_singleton(self) -> Result<()> {
    self.inner.finish(Provider::Singleton {
      cell: OnceCell::new(),
      producer: self.producer,
    })
  }

  /// Every resolution produces a fresh value.
  pub fn as_transient(self) -> Result<()> {
    self.inner.finish(Provider::Transient {
      producer: self.producer,
    })
  }
}
