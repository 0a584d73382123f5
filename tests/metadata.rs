//! Analyzer behavior: constructor-selection precedence, structural
//! validation, and cache augmentation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use fibre_compose::{
  Analyzer, Constructibility, ConstructorDescriptor, Container, FieldDescriptor, Injectable,
  InjectionPoint, MemberGroup, PropertyDescriptor, Sections, TypeDescriptor,
};
use pretty_assertions::assert_eq;

// --- Constructor selection ---

#[derive(Debug, PartialEq, Eq)]
struct Seeded {
  seed: u32,
}

impl Injectable for Seeded {
  fn describe() -> TypeDescriptor {
    TypeDescriptor::of::<Self>()
      .constructor(ConstructorDescriptor::public("default", vec![], |_| {
        Ok(Seeded { seed: 0 })
      }))
      .constructor(
        ConstructorDescriptor::public("seeded", vec![], |_| Ok(Seeded { seed: 42 })).marked(),
      )
  }
}

#[test]
fn test_single_constructor_is_used_as_is() {
  struct Single;
  impl Injectable for Single {
    fn describe() -> TypeDescriptor {
      TypeDescriptor::of::<Self>()
        .constructor(ConstructorDescriptor::private("hidden", vec![], |_| Ok(Single)))
    }
  }

  // A lone candidate is selected regardless of visibility.
  let scope = Container::new();
  scope.instantiate::<Single>().unwrap();
}

#[test]
fn test_marked_constructor_wins_over_public_ones() {
  let scope = Container::new();
  let seeded = scope.instantiate::<Seeded>().unwrap();

  assert_eq!(seeded.seed, 42);
}

#[test]
fn test_unique_public_constructor_wins_over_private_ones() {
  #[derive(Debug, PartialEq, Eq)]
  struct Visible {
    via: &'static str,
  }
  impl Injectable for Visible {
    fn describe() -> TypeDescriptor {
      TypeDescriptor::of::<Self>()
        .constructor(ConstructorDescriptor::private("internal", vec![], |_| {
          Ok(Visible { via: "internal" })
        }))
        .constructor(ConstructorDescriptor::public("new", vec![], |_| {
          Ok(Visible { via: "public" })
        }))
    }
  }

  let scope = Container::new();
  let visible = scope.instantiate::<Visible>().unwrap();

  assert_eq!(visible.via, "public");
}

#[test]
fn test_two_public_unmarked_constructors_are_ambiguous() {
  #[derive(Debug)]
  struct Ambiguous;
  impl Injectable for Ambiguous {
    fn describe() -> TypeDescriptor {
      TypeDescriptor::of::<Self>()
        .constructor(ConstructorDescriptor::public("a", vec![], |_| Ok(Ambiguous)))
        .constructor(ConstructorDescriptor::public("b", vec![], |_| Ok(Ambiguous)))
    }
  }

  let scope = Container::new();
  let err = scope.instantiate::<Ambiguous>().unwrap_err();

  assert_eq!(err.code(), "MultipleConstructors");
}

#[test]
fn test_two_marked_constructors_are_rejected() {
  #[derive(Debug)]
  struct DoubleMarked;
  impl Injectable for DoubleMarked {
    fn describe() -> TypeDescriptor {
      TypeDescriptor::of::<Self>()
        .constructor(ConstructorDescriptor::public("a", vec![], |_| Ok(DoubleMarked)).marked())
        .constructor(ConstructorDescriptor::public("b", vec![], |_| Ok(DoubleMarked)).marked())
    }
  }

  let scope = Container::new();
  let err = scope.instantiate::<DoubleMarked>().unwrap_err();

  assert_eq!(err.code(), "MultipleAttributes");
}

#[test]
fn test_no_constructor_is_rejected() {
  #[derive(Debug)]
  struct Bare;
  impl Injectable for Bare {
    fn describe() -> TypeDescriptor {
      TypeDescriptor::of::<Self>()
    }
  }

  let scope = Container::new();
  let err = scope.instantiate::<Bare>().unwrap_err();

  assert_eq!(err.code(), "HasNoConstructor");
}

// --- Construction eligibility ---

#[test]
fn test_abstract_types_cannot_be_constructed() {
  #[derive(Debug)]
  struct ContractOnly;
  impl Injectable for ContractOnly {
    fn describe() -> TypeDescriptor {
      TypeDescriptor::of::<Self>().constructibility(Constructibility::Abstract)
    }
  }

  let scope = Container::new();
  let err = scope.instantiate::<ContractOnly>().unwrap_err();

  assert_eq!(err.code(), "AbstractClassConstruction");
}

#[test]
fn test_unsupported_types_are_rejected_with_the_reason() {
  #[derive(Debug)]
  struct Exotic;
  impl Injectable for Exotic {
    fn describe() -> TypeDescriptor {
      TypeDescriptor::of::<Self>()
        .constructibility(Constructibility::Unsupported("enum types cannot be constructed"))
    }
  }

  let scope = Container::new();
  let err = scope.instantiate::<Exotic>().unwrap_err();

  assert_eq!(err.code(), "TypeNotSupported");
  assert!(err.to_string().contains("enum types"));
}

// --- Member validation ---

#[test]
fn test_readonly_property_is_rejected() {
  #[derive(Default, Debug)]
  struct Sealed;
  impl Injectable for Sealed {
    fn describe() -> TypeDescriptor {
      TypeDescriptor::of::<Self>()
        .constructor(ConstructorDescriptor::public("default", vec![], |_| Ok(Sealed)))
        .members(
          MemberGroup::level("Sealed")
            .property(PropertyDescriptor::readonly(InjectionPoint::of::<String>("frozen"))),
        )
    }
  }

  let scope = Container::new();
  let err = scope.instantiate::<Sealed>().unwrap_err();

  assert_eq!(err.code(), "ReadonlyProperty");
  assert!(err.to_string().contains("frozen"));
}

#[test]
fn test_member_declared_twice_in_one_level_is_rejected() {
  #[derive(Default, Debug)]
  struct Doubled {
    value: Option<Arc<String>>,
  }
  impl Injectable for Doubled {
    fn describe() -> TypeDescriptor {
      TypeDescriptor::of::<Self>()
        .constructor(ConstructorDescriptor::public("default", vec![], |_| {
          Ok(Doubled::default())
        }))
        .members(
          MemberGroup::level("Doubled")
            .field(FieldDescriptor::new(
              InjectionPoint::of::<String>("value"),
              |d: &mut Doubled, v: Arc<String>| d.value = Some(v),
            ))
            .field(FieldDescriptor::new(
              InjectionPoint::of::<String>("value"),
              |d: &mut Doubled, v: Arc<String>| d.value = Some(v),
            )),
        )
    }
  }

  let scope = Container::new();
  let err = scope.instantiate::<Doubled>().unwrap_err();

  assert_eq!(err.code(), "MultipleAttributes");
}

// --- Caching ---

#[test]
fn test_cache_entry_is_augmented_not_replaced() {
  #[derive(Default)]
  struct Lopsided {
    label: Option<Arc<String>>,
  }
  impl Injectable for Lopsided {
    fn describe() -> TypeDescriptor {
      // Member metadata is fine; constructor selection is ambiguous.
      TypeDescriptor::of::<Self>()
        .constructor(ConstructorDescriptor::public("a", vec![], |_| {
          Ok(Lopsided::default())
        }))
        .constructor(ConstructorDescriptor::public("b", vec![], |_| {
          Ok(Lopsided::default())
        }))
        .members(MemberGroup::level("Lopsided").field(FieldDescriptor::new(
          InjectionPoint::of::<String>("label").optional(),
          |l: &mut Lopsided, v: Arc<String>| l.label = Some(v),
        )))
    }
  }

  let analyzer = Analyzer::new();

  // The member section analyzes cleanly on its own.
  let info = analyzer.info::<Lopsided>(Sections::MEMBERS).unwrap();
  assert!(info.constructor_label().is_none());

  // Requesting the constructor section later augments the same entry and
  // surfaces its defect.
  let err = analyzer.info::<Lopsided>(Sections::CONSTRUCTOR).unwrap_err();
  assert_eq!(err.code(), "MultipleConstructors");

  // The previously analyzed section is untouched by the failure.
  analyzer.info::<Lopsided>(Sections::MEMBERS).unwrap();
}

#[test]
fn test_injection_only_needs_the_member_section() {
  #[derive(Default, Debug)]
  struct ViewModel {
    title: Option<Arc<String>>,
  }
  impl Injectable for ViewModel {
    fn describe() -> TypeDescriptor {
      // Two ambiguous constructors: instantiation must fail, injection into
      // an existing instance must not.
      TypeDescriptor::of::<Self>()
        .constructor(ConstructorDescriptor::public("a", vec![], |_| {
          Ok(ViewModel::default())
        }))
        .constructor(ConstructorDescriptor::public("b", vec![], |_| {
          Ok(ViewModel::default())
        }))
        .members(MemberGroup::level("ViewModel").field(FieldDescriptor::new(
          InjectionPoint::of::<String>("title"),
          |v: &mut ViewModel, value: Arc<String>| v.title = Some(value),
        )))
    }
  }

  let scope = Container::new();
  scope
    .bind::<String>()
    .to_instance("Dashboard".to_string())
    .unwrap();

  let mut view_model = ViewModel::default();
  scope.inject(&mut view_model).unwrap();
  assert_eq!(view_model.title.as_deref().map(String::as_str), Some("Dashboard"));

  let err = scope.instantiate::<ViewModel>().unwrap_err();
  assert_eq!(err.code(), "MultipleConstructors");

  // Injection keeps working after the failed construction attempt.
  let mut second = ViewModel::default();
  scope.inject(&mut second).unwrap();
  assert!(second.title.is_some());
}

#[test]
fn test_descriptor_is_computed_once_per_scope_tree() {
  static DESCRIBE_CALLS: AtomicUsize = AtomicUsize::new(0);

  struct Counted;
  impl Injectable for Counted {
    fn describe() -> TypeDescriptor {
      DESCRIBE_CALLS.fetch_add(1, Ordering::SeqCst);
      TypeDescriptor::of::<Self>()
        .constructor(ConstructorDescriptor::public("new", vec![], |_| Ok(Counted)))
    }
  }

  // Arrange: the analyzer is shared by the whole tree.
  let parent = Container::new();
  let child = parent.create_sub_container().unwrap();

  // Act
  parent.instantiate::<Counted>().unwrap();
  child.instantiate::<Counted>().unwrap();
  child.instantiate::<Counted>().unwrap();

  // Assert
  assert_eq!(DESCRIBE_CALLS.load(Ordering::SeqCst), 1);
}

#[test]
fn test_type_info_reports_the_selected_constructor() {
  struct Probe;
  impl Injectable for Probe {
    fn describe() -> TypeDescriptor {
      TypeDescriptor::of::<Self>()
        .constructor(ConstructorDescriptor::public("build", vec![], |_| Ok(Probe)))
    }
  }

  let analyzer = Analyzer::new();
  let info = analyzer
    .info::<Probe>(Sections::CONSTRUCTOR | Sections::MEMBERS)
    .unwrap();

  assert_eq!(info.constructor_label(), Some("build"));
  assert!(info.type_name().contains("Probe"));
}
