//! Type descriptors: the injection metadata a concrete type declares about
//! itself.
//!
//! There is no runtime reflection in Rust, so types opt into composition by
//! implementing [`Injectable`] and returning a [`TypeDescriptor`] that
//! declares their constructor candidates and injectable members. The
//! descriptor is raw, unvalidated input; the analyzer selects a constructor,
//! validates the member declarations, and caches the result per type.

use std::any::{Any, TypeId};
use std::sync::Arc;

use crate::core::SharedValue;
use crate::error::{Error, Result};

/// A type that can be constructed and injected by the container.
///
/// `describe` is called at most once per analyzer; the returned descriptor
/// must be self-consistent with the type's actual shape, since the build and
/// apply closures inside it are the only way the injector touches the type.
pub trait Injectable: Sized + Any + Send + Sync {
  fn describe() -> TypeDescriptor;
}

/// Coercion from a concrete implementation to the contract it is bound
/// under.
///
/// The identity impl covers every `T -> T` binding; the [`contracts!`]
/// macro generates the `C -> dyn Trait` impls, which is where the unsizing
/// coercion actually happens.
///
/// [`contracts!`]: crate::contracts
pub trait ProvideAs<I: ?Sized + Any + Send + Sync>: Any + Send + Sync {
  fn provide_as(this: Arc<Self>) -> Arc<I>;
}

impl<T: ?Sized + Any + Send + Sync> ProvideAs<T> for T {
  fn provide_as(this: Arc<Self>) -> Arc<T> {
    this
  }
}

/// Whether a described type may be constructed at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Constructibility {
  Concrete,
  /// A contract-only type; instances exist, but the container must never
  /// construct one directly.
  Abstract,
  /// Rejected outright, with the reason reported to the caller.
  Unsupported(&'static str),
}

/// A single spot a resolved value flows into: a constructor or method
/// parameter, a field, or a property.
#[derive(Clone)]
pub struct InjectionPoint {
  pub(crate) name: &'static str,
  pub(crate) type_id: TypeId,
  pub(crate) type_name: &'static str,
  pub(crate) identifier: Option<String>,
  pub(crate) optional: bool,
}

impl InjectionPoint {
  /// Declares a required injection point of type `D`.
  pub fn of<D: ?Sized + Any>(name: &'static str) -> Self {
    Self {
      name,
      type_id: TypeId::of::<D>(),
      type_name: std::any::type_name::<D>(),
      identifier: None,
      optional: false,
    }
  }

  /// Restricts the point to a binding registered under `id`.
  pub fn with_id(mut self, id: impl Into<String>) -> Self {
    self.identifier = Some(id.into());
    self
  }

  /// Marks the point as tolerating an absent binding.
  pub fn optional(mut self) -> Self {
    self.optional = true;
    self
  }
}

/// The resolved values for one constructor or method call, consumed
/// positionally left to right.
pub struct Args {
  values: Vec<Option<SharedValue>>,
  cursor: usize,
}

impl Args {
  pub(crate) fn new(values: Vec<Option<SharedValue>>) -> Self {
    Self { values, cursor: 0 }
  }

  fn next_value(&mut self) -> Result<Option<SharedValue>> {
    let slot = self.values.get_mut(self.cursor).ok_or_else(|| Error::InvalidOperation {
      message: "constructor consumed more arguments than its descriptor declares".to_string(),
    })?;
    self.cursor += 1;
    Ok(slot.take())
  }

  /// Takes the next argument, which must have resolved to a value.
  pub fn take<D: ?Sized + Any + Send + Sync>(&mut self) -> Result<Arc<D>> {
    match self.next_value()? {
      Some(value) => value
        .extract::<Arc<D>>()
        .ok_or_else(|| Error::value_mismatch(std::any::type_name::<D>())),
      None => Err(Error::InvalidOperation {
        message: format!(
          "required argument of type `{}` was not supplied",
          std::any::type_name::<D>()
        ),
      }),
    }
  }

  /// Takes the next argument; an optional point that found no binding yields
  /// `None`.
  pub fn take_optional<D: ?Sized + Any + Send + Sync>(&mut self) -> Result<Option<Arc<D>>> {
    match self.next_value()? {
      Some(value) => {
        let arc = value
          .extract::<Arc<D>>()
          .ok_or_else(|| Error::value_mismatch(std::any::type_name::<D>()))?;
        Ok(Some(arc))
      }
      None => Ok(None),
    }
  }
}

pub(crate) type BuildFn = Box<dyn Fn(&mut Args) -> Result<Box<dyn Any + Send + Sync>> + Send + Sync>;
pub(crate) type ApplyFn = Box<dyn Fn(&mut dyn Any, Option<SharedValue>) -> Result<()> + Send + Sync>;
pub(crate) type InvokeFn = Box<dyn Fn(&mut dyn Any, &mut Args) -> Result<()> + Send + Sync>;

/// One constructor candidate: its parameters plus the closure that runs it.
pub struct ConstructorDescriptor {
  pub(crate) label: &'static str,
  pub(crate) public: bool,
  pub(crate) marked: bool,
  pub(crate) params: Vec<InjectionPoint>,
  pub(crate) build: BuildFn,
}

impl ConstructorDescriptor {
  fn new<T, F>(label: &'static str, public: bool, params: Vec<InjectionPoint>, build: F) -> Self
  where
    T: Any + Send + Sync,
    F: Fn(&mut Args) -> Result<T> + Send + Sync + 'static,
  {
    Self {
      label,
      public,
      marked: false,
      params,
      build: Box::new(move |args| Ok(Box::new(build(args)?))),
    }
  }

  pub fn public<T, F>(label: &'static str, params: Vec<InjectionPoint>, build: F) -> Self
  where
    T: Any + Send + Sync,
    F: Fn(&mut Args) -> Result<T> + Send + Sync + 'static,
  {
    Self::new(label, true, params, build)
  }

  pub fn private<T, F>(label: &'static str, params: Vec<InjectionPoint>, build: F) -> Self
  where
    T: Any + Send + Sync,
    F: Fn(&mut Args) -> Result<T> + Send + Sync + 'static,
  {
    Self::new(label, false, params, build)
  }

  /// Marks this candidate as the explicitly chosen injection constructor.
  pub fn marked(mut self) -> Self {
    self.marked = true;
    self
  }
}

/// An injectable field and the closure that assigns it.
pub struct FieldDescriptor {
  pub(crate) point: InjectionPoint,
  pub(crate) apply: ApplyFn,
}

impl FieldDescriptor {
  pub fn new<S, D, F>(point: InjectionPoint, assign: F) -> Self
  where
    S: Any,
    D: ?Sized + Any + Send + Sync,
    F: Fn(&mut S, Arc<D>) + Send + Sync + 'static,
  {
    let apply: ApplyFn = Box::new(move |target, value| {
      let target = target
        .downcast_mut::<S>()
        .ok_or_else(|| Error::value_mismatch(std::any::type_name::<S>()))?;
      if let Some(value) = value {
        let value = value
          .extract::<Arc<D>>()
          .ok_or_else(|| Error::value_mismatch(std::any::type_name::<D>()))?;
        assign(target, value);
      }
      Ok(())
    });
    Self { point, apply }
  }

  /// Like [`FieldDescriptor::new`], but the assignment sees an optional miss
  /// instead of being skipped on one.
  pub fn new_optional<S, D, F>(point: InjectionPoint, assign: F) -> Self
  where
    S: Any,
    D: ?Sized + Any + Send + Sync,
    F: Fn(&mut S, Option<Arc<D>>) + Send + Sync + 'static,
  {
    let apply: ApplyFn = Box::new(move |target, value| {
      let target = target
        .downcast_mut::<S>()
        .ok_or_else(|| Error::value_mismatch(std::any::type_name::<S>()))?;
      let value = match value {
        Some(value) => Some(
          value
            .extract::<Arc<D>>()
            .ok_or_else(|| Error::value_mismatch(std::any::type_name::<D>()))?,
        ),
        None => None,
      };
      assign(target, value);
      Ok(())
    });
    Self { point, apply }
  }
}

/// An injectable property: a field behind accessor methods. Declaring one
/// without a setter is a descriptor defect the analyzer rejects.
pub struct PropertyDescriptor {
  pub(crate) point: InjectionPoint,
  pub(crate) setter: Option<ApplyFn>,
}

impl PropertyDescriptor {
  pub fn new<S, D, F>(point: InjectionPoint, set: F) -> Self
  where
    S: Any,
    D: ?Sized + Any + Send + Sync,
    F: Fn(&mut S, Arc<D>) + Send + Sync + 'static,
  {
    let field = FieldDescriptor::new(point, set);
    Self {
      point: field.point,
      setter: Some(field.apply),
    }
  }

  /// Declares the property injectable without providing a setter.
  pub fn readonly(point: InjectionPoint) -> Self {
    Self {
      point,
      setter: None,
    }
  }
}

/// An injection method: invoked exactly once after fields and properties,
/// with its parameters resolved like constructor parameters.
pub struct MethodDescriptor {
  pub(crate) name: &'static str,
  pub(crate) params: Vec<InjectionPoint>,
  pub(crate) invoke: InvokeFn,
}

impl MethodDescriptor {
  pub fn new<S, F>(name: &'static str, params: Vec<InjectionPoint>, call: F) -> Self
  where
    S: Any,
    F: Fn(&mut S, &mut Args) -> Result<()> + Send + Sync + 'static,
  {
    let invoke: InvokeFn = Box::new(move |target, args| {
      let target = target
        .downcast_mut::<S>()
        .ok_or_else(|| Error::value_mismatch(std::any::type_name::<S>()))?;
      call(target, args)
    });
    Self { name, params, invoke }
  }
}

/// One level of member declarations.
///
/// Levels stand in for the base-type chain of the original object model:
/// each level declares only its own members, outermost base first, and the
/// injector walks them in order so no member is ever injected twice.
pub struct MemberGroup {
  pub(crate) level: &'static str,
  pub(crate) fields: Vec<FieldDescriptor>,
  pub(crate) properties: Vec<PropertyDescriptor>,
  pub(crate) methods: Vec<MethodDescriptor>,
}

impl MemberGroup {
  pub fn level(name: &'static str) -> Self {
    Self {
      level: name,
      fields: Vec::new(),
      properties: Vec::new(),
      methods: Vec::new(),
    }
  }

  pub fn field(mut self, field: FieldDescriptor) -> Self {
    self.fields.push(field);
    self
  }

  pub fn property(mut self, property: PropertyDescriptor) -> Self {
    self.properties.push(property);
    self
  }

  pub fn method(mut self, method: MethodDescriptor) -> Self {
    self.methods.push(method);
    self
  }
}

/// Everything a type declares about its own construction and injection.
pub struct TypeDescriptor {
  pub(crate) type_id: TypeId,
  pub(crate) type_name: &'static str,
  pub(crate) constructibility: Constructibility,
  pub(crate) constructors: Vec<ConstructorDescriptor>,
  pub(crate) groups: Vec<MemberGroup>,
}

impl TypeDescriptor {
  pub fn of<T: Any>() -> Self {
    Self {
      type_id: TypeId::of::<T>(),
      type_name: std::any::type_name::<T>(),
      constructibility: Constructibility::Concrete,
      constructors: Vec::new(),
      groups: Vec::new(),
    }
  }

  pub fn constructibility(mut self, constructibility: Constructibility) -> Self {
    self.constructibility = constructibility;
    self
  }

  pub fn constructor(mut self, constructor: ConstructorDescriptor) -> Self {
    self.constructors.push(constructor);
    self
  }

  pub fn members(mut self, group: MemberGroup) -> Self {
    self.groups.push(group);
    self
  }

  pub fn type_name(&self) -> &'static str {
    self.type_name
  }
}
