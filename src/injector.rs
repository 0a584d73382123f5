//! The injector: constructs instances from analyzed metadata and performs
//! member injection, with override substitution and cycle detection.

use std::any::{Any, TypeId};
use std::sync::Arc;

use crate::analyzer::{Analyzer, Sections, TypeInfo};
use crate::binder::Binder;
use crate::container::Container;
use crate::core::{BindingKey, InjectionContext, SharedValue};
use crate::error::{Error, Result};
use crate::metadata::{Args, Injectable, InjectionPoint};

/// Ad hoc values for a single `instantiate`/`inject` call.
///
/// Each slot is matched by declared type only (never by identifier), takes
/// precedence over the registry, and is consumed at most once across the
/// whole call.
#[derive(Default)]
pub struct Overrides {
  slots: Vec<OverrideSlot>,
}

struct OverrideSlot {
  type_id: TypeId,
  value: Option<SharedValue>,
}

impl Overrides {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds an override for injection points declared as `V`.
  pub fn with<V: Any + Send + Sync>(mut self, value: V) -> Self {
    self.slots.push(OverrideSlot {
      type_id: TypeId::of::<V>(),
      value: Some(SharedValue::of(value)),
    });
    self
  }

  /// Adds an already-shared override, e.g. an `Arc<dyn Trait>`.
  pub fn with_arc<V: ?Sized + Any + Send + Sync>(mut self, value: Arc<V>) -> Self {
    self.slots.push(OverrideSlot {
      type_id: TypeId::of::<V>(),
      value: Some(SharedValue::new(value)),
    });
    self
  }

  fn take(&mut self, type_id: TypeId) -> Option<SharedValue> {
    self
      .slots
      .iter_mut()
      .find(|slot| slot.type_id == type_id && slot.value.is_some())
      .and_then(|slot| slot.value.take())
  }
}

/// Call-scoped resolution state: the override pool and the stack of types
/// currently under construction.
///
/// One frame exists per top-level `instantiate`/`inject`/`resolve` call and
/// is threaded through every nested construction, so independent concurrent
/// calls can never falsely report cycles against one another.
pub(crate) struct CallFrame {
  overrides: Overrides,
  building: Vec<(TypeId, &'static str)>,
}

impl CallFrame {
  pub(crate) fn new(overrides: Overrides) -> Self {
    Self {
      overrides,
      building: Vec::new(),
    }
  }

  fn enter(&mut self, type_id: TypeId, type_name: &'static str) -> Result<()> {
    if self.building.iter().any(|(id, _)| *id == type_id) {
      let chain = self
        .building
        .iter()
        .map(|(_, name)| *name)
        .chain([type_name])
        .collect::<Vec<_>>()
        .join(" -> ");
      return Err(Error::CircularDependency { type_name, chain });
    }
    self.building.push((type_id, type_name));
    Ok(())
  }

  fn leave(&mut self) {
    self.building.pop();
  }
}

pub(crate) struct Injector {
  analyzer: Arc<Analyzer>,
  binder: Arc<Binder>,
}

impl Injector {
  pub(crate) fn new(analyzer: Arc<Analyzer>, binder: Arc<Binder>) -> Self {
    Self { analyzer, binder }
  }

  pub(crate) fn instantiate<T: Injectable>(
    &self,
    scope: &Arc<Container>,
    overrides: Overrides,
  ) -> Result<T> {
    let mut call = CallFrame::new(overrides);
    self.instantiate_in::<T>(scope, &mut call)
  }

  /// Constructs `T` inside an existing call frame, sharing its override pool
  /// and cycle-detection stack.
  pub(crate) fn instantiate_in<T: Injectable>(
    &self,
    scope: &Arc<Container>,
    call: &mut CallFrame,
  ) -> Result<T> {
    let info = self.analyzer.info::<T>(Sections::ALL)?;
    let boxed = self.construct(scope, call, &info)?;
    boxed
      .downcast::<T>()
      .map(|value| *value)
      .map_err(|_| Error::value_mismatch(std::any::type_name::<T>()))
  }

  pub(crate) fn inject<T: Injectable>(
    &self,
    scope: &Arc<Container>,
    target: &mut T,
    overrides: Overrides,
  ) -> Result<()> {
    // Member metadata only; injecting into an existing instance must not
    // fail on constructor selection.
    let info = self.analyzer.info::<T>(Sections::MEMBERS)?;
    let mut call = CallFrame::new(overrides);
    call.enter(TypeId::of::<T>(), std::any::type_name::<T>())?;
    let outcome = self.apply_members(scope, &mut call, target, &info);
    call.leave();
    outcome
  }

  fn construct(
    &self,
    scope: &Arc<Container>,
    call: &mut CallFrame,
    info: &TypeInfo,
  ) -> Result<Box<dyn Any + Send + Sync>> {
    call.enter(info.descriptor.type_id, info.descriptor.type_name)?;
    let outcome = self.construct_inner(scope, call, info);
    call.leave();
    outcome
  }

  fn construct_inner(
    &self,
    scope: &Arc<Container>,
    call: &mut CallFrame,
    info: &TypeInfo,
  ) -> Result<Box<dyn Any + Send + Sync>> {
    let constructor = info.selected_constructor().ok_or_else(|| Error::InvalidOperation {
      message: format!(
        "constructor metadata for `{}` was not analyzed",
        info.descriptor.type_name
      ),
    })?;

    let mut values = Vec::with_capacity(constructor.params.len());
    for point in &constructor.params {
      values.push(self.resolve_point(scope, call, point, info.descriptor.type_name)?);
    }
    let mut args = Args::new(values);
    let mut built = (constructor.build)(&mut args)?;

    // The new instance sees the same override pool the constructor did.
    self.apply_members(scope, call, coerce_any(built.as_mut()), info)?;
    Ok(built)
  }

  /// Resolves one injection point: an unconsumed override of exactly the
  /// declared type wins, otherwise the registry decides. `Ok(None)` is only
  /// possible for optional points.
  fn resolve_point(
    &self,
    scope: &Arc<Container>,
    call: &mut CallFrame,
    point: &InjectionPoint,
    requesting: &'static str,
  ) -> Result<Option<SharedValue>> {
    if let Some(value) = call.overrides.take(point.type_id) {
      return Ok(Some(value));
    }

    let key = BindingKey::for_point(point);
    let _guard = crate::core::ResolutionGuard::enter(Arc::as_ptr(scope) as usize, &key)?;
    let ctx = InjectionContext {
      identifier: point.identifier.as_deref(),
      optional: point.optional,
      requesting: Some(requesting),
    };
    match self.binder.resolve(&key, &ctx, scope, call)? {
      Some(value) => Ok(Some(value)),
      None if point.optional => Ok(None),
      None => Err(Error::TypeNotRegistered {
        type_name: point.type_name,
        identifier: point.identifier.clone(),
        requested_by: Some(requesting),
      }),
    }
  }

  /// Walks the member groups in declared order (outermost level first); per
  /// level fields, then properties, then methods, each exactly once. The
  /// first resolution failure aborts the whole call.
  fn apply_members(
    &self,
    scope: &Arc<Container>,
    call: &mut CallFrame,
    target: &mut dyn Any,
    info: &TypeInfo,
  ) -> Result<()> {
    let requesting = info.descriptor.type_name;
    for group in &info.descriptor.groups {
      for field in &group.fields {
        let value = self.resolve_point(scope, call, &field.point, requesting)?;
        (field.apply)(target, value)?;
      }
      for property in &group.properties {
        let setter = property.setter.as_ref().ok_or_else(|| Error::ReadonlyProperty {
          type_name: requesting,
          property: property.point.name,
        })?;
        let value = self.resolve_point(scope, call, &property.point, requesting)?;
        setter(target, value)?;
      }
      for method in &group.methods {
        let mut values = Vec::with_capacity(method.params.len());
        for point in &method.params {
          values.push(self.resolve_point(scope, call, point, requesting)?);
        }
        let mut args = Args::new(values);
        (method.invoke)(target, &mut args)?;
      }
    }
    Ok(())
  }
}

// Auto-trait removal: the descriptor closures only need `dyn Any`.
fn coerce_any(value: &mut (dyn Any + Send + Sync)) -> &mut dyn Any {
  value
}
