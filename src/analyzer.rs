//! The metadata analyzer: validates raw type descriptors and caches the
//! result per type.
//!
//! Analysis is split into sections so a call that only needs member metadata
//! (an `inject` into an existing instance) never pays for, or fails on,
//! constructor selection. A later call requesting more sections augments the
//! cached entry; nothing is ever recomputed or replaced.

use std::any::TypeId;
use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::OnceCell;

use crate::error::{Error, Result};
use crate::metadata::{Constructibility, ConstructorDescriptor, Injectable, TypeDescriptor};

/// Which parts of a type's metadata a caller needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sections(u8);

impl Sections {
  pub const CONSTRUCTOR: Sections = Sections(0b01);
  pub const MEMBERS: Sections = Sections(0b10);
  pub const ALL: Sections = Sections(0b11);

  pub fn contains(self, other: Sections) -> bool {
    self.0 & other.0 == other.0
  }
}

impl std::ops::BitOr for Sections {
  type Output = Sections;

  fn bitor(self, rhs: Sections) -> Sections {
    Sections(self.0 | rhs.0)
  }
}

/// The validated, cached view of one type's descriptor.
pub struct TypeInfo {
  pub(crate) descriptor: TypeDescriptor,
  constructor: OnceCell<usize>,
  members: OnceCell<()>,
}

impl std::fmt::Debug for TypeInfo {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TypeInfo")
      .field("type_name", &self.descriptor.type_name)
      .finish_non_exhaustive()
  }
}

impl TypeInfo {
  pub(crate) fn selected_constructor(&self) -> Option<&ConstructorDescriptor> {
    self
      .constructor
      .get()
      .map(|&index| &self.descriptor.constructors[index])
  }

  pub fn type_name(&self) -> &'static str {
    self.descriptor.type_name
  }

  /// The label of the selected constructor, once the constructor section has
  /// been analyzed.
  pub fn constructor_label(&self) -> Option<&'static str> {
    self.selected_constructor().map(|c| c.label)
  }
}

/// Caches analyzed type metadata for its own lifetime.
///
/// One analyzer is shared across a whole container tree: metadata does not
/// depend on scope.
pub struct Analyzer {
  cache: DashMap<TypeId, Arc<TypeInfo>>,
}

impl Analyzer {
  pub fn new() -> Self {
    Self {
      cache: DashMap::new(),
    }
  }

  /// Returns the cached metadata for `T`, computing any section requested
  /// for the first time.
  pub fn info<T: Injectable>(&self, sections: Sections) -> Result<Arc<TypeInfo>> {
    let info = self
      .cache
      .entry(TypeId::of::<T>())
      .or_insert_with(|| {
        Arc::new(TypeInfo {
          descriptor: T::describe(),
          constructor: OnceCell::new(),
          members: OnceCell::new(),
        })
      })
      .clone();

    if sections.contains(Sections::CONSTRUCTOR) {
      info
        .constructor
        .get_or_try_init(|| select_constructor(&info.descriptor))?;
    }
    if sections.contains(Sections::MEMBERS) {
      info
        .members
        .get_or_try_init(|| validate_members(&info.descriptor))?;
    }
    Ok(info)
  }
}

impl Default for Analyzer {
  fn default() -> Self {
    Self::new()
  }
}

/// Constructor selection: a single candidate is used as-is; among several,
/// the unique marked one wins, then the unique public one; anything else is
/// an error.
fn select_constructor(descriptor: &TypeDescriptor) -> Result<usize> {
  match descriptor.constructibility {
    Constructibility::Unsupported(reason) => {
      return Err(Error::TypeNotSupported {
        type_name: descriptor.type_name,
        reason,
      });
    }
    Constructibility::Abstract => {
      return Err(Error::AbstractClassConstruction {
        type_name: descriptor.type_name,
      });
    }
    Constructibility::Concrete => {}
  }

  let candidates = &descriptor.constructors;
  match candidates.len() {
    0 => Err(Error::HasNoConstructor {
      type_name: descriptor.type_name,
    }),
    1 => Ok(0),
    _ => {
      let marked: Vec<usize> = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| c.marked)
        .map(|(i, _)| i)
        .collect();
      match marked.len() {
        1 => Ok(marked[0]),
        0 => {
          let public: Vec<usize> = candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| c.public)
            .map(|(i, _)| i)
            .collect();
          if public.len() == 1 {
            Ok(public[0])
          } else {
            Err(Error::MultipleConstructors {
              type_name: descriptor.type_name,
            })
          }
        }
        _ => Err(Error::MultipleAttributes {
          type_name: descriptor.type_name,
          member: "constructor".to_string(),
        }),
      }
    }
  }
}

fn validate_members(descriptor: &TypeDescriptor) -> Result<()> {
  for group in &descriptor.groups {
    let mut seen: HashSet<&'static str> = HashSet::new();
    for field in &group.fields {
      if !seen.insert(field.point.name) {
        return Err(Error::MultipleAttributes {
          type_name: descriptor.type_name,
          member: format!("{}::{}", group.level, field.point.name),
        });
      }
    }
    for property in &group.properties {
      if !seen.insert(property.point.name) {
        return Err(Error::MultipleAttributes {
          type_name: descriptor.type_name,
          member: format!("{}::{}", group.level, property.point.name),
        });
      }
      if property.setter.is_none() {
        return Err(Error::ReadonlyProperty {
          type_name: descriptor.type_name,
          property: property.point.name,
        });
      }
    }
    for method in &group.methods {
      if !seen.insert(method.name) {
        return Err(Error::MultipleAttributes {
          type_name: descriptor.type_name,
          member: format!("{}::{}", group.level, method.name),
        });
      }
    }
  }
  Ok(())
}
