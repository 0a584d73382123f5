//! The container facade: one binder + analyzer + injector, plus the
//! parent/child scoping hierarchy.

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::debug;

use crate::analyzer::Analyzer;
use crate::binder::Binder;
use crate::builder::BindingBuilder;
use crate::core::{BindingKey, InjectionContext, ResolutionGuard};
use crate::error::{Error, Result};
use crate::injector::{CallFrame, Injector, Overrides};
use crate::metadata::Injectable;
use crate::provider::{Producer, ProducerKind, Provider};

/// A composition scope.
///
/// A root container owns a fresh binder, analyzer, and injector. A
/// sub-container shares the tree's analyzer (metadata does not depend on
/// scope) and sees the parent's bindings through a live, read-only chain:
/// bindings added to the parent after the sub-container was created are
/// still visible to it, never the reverse.
pub struct Container {
  binder: Arc<Binder>,
  analyzer: Arc<Analyzer>,
  injector: Injector,
  parent: Option<Weak<Container>>,
  children: Mutex<Vec<Arc<Container>>>,
  disposed: AtomicBool,
}

impl std::fmt::Debug for Container {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Container")
      .field("is_root", &self.parent.is_none())
      .field("disposed", &self.disposed)
      .finish_non_exhaustive()
  }
}

impl Container {
  /// Creates a new root container.
  pub fn new() -> Arc<Self> {
    Self::build(None, None, None)
  }

  fn build(
    parent_binder: Option<Arc<Binder>>,
    parent: Option<Weak<Container>>,
    analyzer: Option<Arc<Analyzer>>,
  ) -> Arc<Self> {
    let binder = Arc::new(match parent_binder {
      Some(parent_binder) => Binder::with_parent(parent_binder),
      None => Binder::root(),
    });
    let analyzer = analyzer.unwrap_or_else(|| Arc::new(Analyzer::new()));
    let container = Arc::new(Container {
      injector: Injector::new(analyzer.clone(), binder.clone()),
      binder,
      analyzer,
      parent,
      children: Mutex::new(Vec::new()),
      disposed: AtomicBool::new(false),
    });
    container.register_self_binding();
    container
  }

  // Every scope answers for `Container` itself, so injected code can request
  // the scope it is being built in. The producer returns the resolving
  // scope rather than a captured `Arc`, which would pin the container
  // through its own registry.
  fn register_self_binding(&self) {
    let provider = Provider::Transient {
      producer: Producer {
        kind: ProducerKind::SelfScope,
        produce: Box::new(|scope: &Arc<Container>, _call: &mut CallFrame| {
          Ok(crate::core::SharedValue::new(Arc::clone(scope)))
        }),
      },
    };
    let _ = self
      .binder
      .register(BindingKey::new::<Container>(None), None, provider);
  }

  /// Creates a child scope that delegates lookups to this one.
  ///
  /// The parent owns the child; `dispose` is the only removal path.
  pub fn create_sub_container(self: &Arc<Self>) -> Result<Arc<Container>> {
    self.ensure_live()?;
    let child = Self::build(
      Some(self.binder.clone()),
      Some(Arc::downgrade(self)),
      Some(self.analyzer.clone()),
    );
    self.children.lock().push(child.clone());
    Ok(child)
  }

  /// Opens a binding for contract `T`.
  pub fn bind<T: ?Sized + Any + Send + Sync>(&self) -> BindingBuilder<'_, T> {
    BindingBuilder::open(self)
  }

  // --- Resolution ---

  /// Resolves the unnamed binding for `T` anywhere in the scope chain.
  pub fn resolve<T: ?Sized + Any + Send + Sync>(self: &Arc<Self>) -> Result<Arc<T>> {
    self.resolve_required::<T>(None)
  }

  /// Resolves the binding for `T` registered under `id`.
  pub fn resolve_with_id<T: ?Sized + Any + Send + Sync>(
    self: &Arc<Self>,
    id: &str,
  ) -> Result<Arc<T>> {
    self.resolve_required::<T>(Some(id))
  }

  /// Like [`Container::resolve`], but a total miss yields `Ok(None)` instead
  /// of an error. Genuine faults (a disposed scope, a failing provider)
  /// still surface.
  pub fn try_resolve<T: ?Sized + Any + Send + Sync>(self: &Arc<Self>) -> Result<Option<Arc<T>>> {
    self.lookup::<T>(None, true)
  }

  pub fn try_resolve_with_id<T: ?Sized + Any + Send + Sync>(
    self: &Arc<Self>,
    id: &str,
  ) -> Result<Option<Arc<T>>> {
    self.lookup::<T>(Some(id), true)
  }

  fn resolve_required<T: ?Sized + Any + Send + Sync>(
    self: &Arc<Self>,
    id: Option<&str>,
  ) -> Result<Arc<T>> {
    match self.lookup::<T>(id, false)? {
      Some(value) => Ok(value),
      None => Err(Error::TypeNotRegistered {
        type_name: std::any::type_name::<T>(),
        identifier: id.map(str::to_owned),
        requested_by: None,
      }),
    }
  }

  fn lookup<T: ?Sized + Any + Send + Sync>(
    self: &Arc<Self>,
    id: Option<&str>,
    optional: bool,
  ) -> Result<Option<Arc<T>>> {
    self.ensure_live()?;
    self.binder.take_stale_pending()?;

    let key = BindingKey::new::<T>(id);
    let _guard = ResolutionGuard::enter(Arc::as_ptr(self) as usize, &key)?;
    let mut call = CallFrame::new(Overrides::new());
    let ctx = InjectionContext {
      identifier: id,
      optional,
      requesting: None,
    };
    match self.binder.resolve(&key, &ctx, self, &mut call)? {
      Some(value) => value
        .extract::<Arc<T>>()
        .map(Some)
        .ok_or_else(|| Error::value_mismatch(std::any::type_name::<T>())),
      None => Ok(None),
    }
  }

  /// Required resolution inside an existing call frame; used by alias and
  /// foreign-container producers.
  pub(crate) fn resolve_nested<T: ?Sized + Any + Send + Sync>(
    self: &Arc<Self>,
    id: Option<&str>,
    call: &mut CallFrame,
  ) -> Result<Arc<T>> {
    self.ensure_live()?;
    let key = BindingKey::new::<T>(id);
    let _guard = ResolutionGuard::enter(Arc::as_ptr(self) as usize, &key)?;
    let ctx = InjectionContext {
      identifier: id,
      optional: false,
      requesting: None,
    };
    match self.binder.resolve(&key, &ctx, self, call)? {
      Some(value) => value
        .extract::<Arc<T>>()
        .ok_or_else(|| Error::value_mismatch(std::any::type_name::<T>())),
      None => Err(Error::TypeNotRegistered {
        type_name: std::any::type_name::<T>(),
        identifier: id.map(str::to_owned),
        requested_by: None,
      }),
    }
  }

  // --- Construction and injection ---

  /// Constructs a `T`, resolving its declared dependencies from this scope.
  pub fn instantiate<T: Injectable>(self: &Arc<Self>) -> Result<T> {
    self.instantiate_with(Overrides::new())
  }

  /// Like [`Container::instantiate`], with ad hoc override values that take
  /// precedence over the registry for this call only.
  pub fn instantiate_with<T: Injectable>(self: &Arc<Self>, overrides: Overrides) -> Result<T> {
    self.ensure_live()?;
    self.binder.take_stale_pending()?;
    self.injector.instantiate::<T>(self, overrides)
  }

  /// Injects the declared members of an existing instance.
  pub fn inject<T: Injectable>(self: &Arc<Self>, target: &mut T) -> Result<()> {
    self.inject_with(target, Overrides::new())
  }

  pub fn inject_with<T: Injectable>(
    self: &Arc<Self>,
    target: &mut T,
    overrides: Overrides,
  ) -> Result<()> {
    self.ensure_live()?;
    self.binder.take_stale_pending()?;
    self.injector.inject(self, target, overrides)
  }

  pub(crate) fn instantiate_in<T: Injectable>(
    self: &Arc<Self>,
    call: &mut CallFrame,
  ) -> Result<T> {
    self.ensure_live()?;
    self.injector.instantiate_in::<T>(self, call)
  }

  // --- Lifecycle ---

  /// Disposes this scope: children first, depth-first, then the local
  /// registry (releasing cached singletons), then the link from the parent.
  /// Idempotent; any later use of the scope reports `InvalidOperation`.
  pub fn dispose(&self) {
    if self.disposed.swap(true, Ordering::SeqCst) {
      return;
    }
    let children = std::mem::take(&mut *self.children.lock());
    for child in children {
      child.dispose();
    }
    self.binder.dispose();
    if let Some(parent) = self.parent.as_ref().and_then(Weak::upgrade) {
      parent
        .children
        .lock()
        .retain(|child| !std::ptr::eq(Arc::as_ptr(child), self));
    }
    debug!(target: "fibre_compose", "container disposed");
  }

  pub fn is_disposed(&self) -> bool {
    self.disposed.load(Ordering::SeqCst)
  }

  /// The analyzer shared by this scope tree.
  pub fn analyzer(&self) -> &Arc<Analyzer> {
    &self.analyzer
  }

  fn ensure_live(&self) -> Result<()> {
    if self.is_disposed() {
      return Err(Error::disposed());
    }
    Ok(())
  }

  pub(crate) fn binder_ref(&self) -> &Binder {
    &self.binder
  }
}
