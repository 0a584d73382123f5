//! Scope hierarchy: parent/child visibility, shadowing, disposal, and
//! cross-tree delegation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use fibre_compose::{global, resolve, Container};

// --- Fixtures ---

#[derive(Debug, PartialEq, Eq)]
struct Service {
  origin: &'static str,
}

// --- Visibility ---

#[test]
fn test_child_resolves_parent_bindings() {
  // Arrange
  let parent = Container::new();
  parent
    .bind::<Service>()
    .to_instance(Service { origin: "parent" })
    .unwrap();
  let child = parent.create_sub_container().unwrap();

  // Act
  let resolved = child.resolve::<Service>().unwrap();

  // Assert
  assert_eq!(resolved.origin, "parent");
}

#[test]
fn test_parent_never_resolves_child_bindings() {
  let parent = Container::new();
  let child = parent.create_sub_container().unwrap();
  child
    .bind::<Service>()
    .to_instance(Service { origin: "child" })
    .unwrap();

  assert!(parent.try_resolve::<Service>().unwrap().is_none());
  assert_eq!(child.resolve::<Service>().unwrap().origin, "child");
}

#[test]
fn test_child_binding_shadows_parent_for_the_child_only() {
  let parent = Container::new();
  parent
    .bind::<Service>()
    .to_instance(Service { origin: "parent" })
    .unwrap();
  let child = parent.create_sub_container().unwrap();
  child
    .bind::<Service>()
    .to_instance(Service { origin: "child" })
    .unwrap();

  assert_eq!(child.resolve::<Service>().unwrap().origin, "child");
  assert_eq!(parent.resolve::<Service>().unwrap().origin, "parent");
}

#[test]
fn test_bindings_added_to_the_parent_later_are_visible() {
  // The chain is live delegation, not a copy at creation time.
  let parent = Container::new();
  let child = parent.create_sub_container().unwrap();

  parent
    .bind::<Service>()
    .to_instance(Service { origin: "late" })
    .unwrap();

  assert_eq!(child.resolve::<Service>().unwrap().origin, "late");
}

#[test]
fn test_grandchild_walks_the_whole_chain() {
  let root = Container::new();
  root
    .bind::<Service>()
    .to_instance(Service { origin: "root" })
    .unwrap();
  let child = root.create_sub_container().unwrap();
  let grandchild = child.create_sub_container().unwrap();

  assert_eq!(grandchild.resolve::<Service>().unwrap().origin, "root");
}

#[test]
fn test_each_scope_resolves_itself_as_the_container() {
  let parent = Container::new();
  let child = parent.create_sub_container().unwrap();

  let resolved_parent = parent.resolve::<Container>().unwrap();
  let resolved_child = child.resolve::<Container>().unwrap();

  assert!(Arc::ptr_eq(&parent, &resolved_parent));
  assert!(Arc::ptr_eq(&child, &resolved_child));
}

// --- Disposal ---

#[test]
fn test_disposing_a_child_leaves_the_parent_usable() {
  let parent = Container::new();
  parent
    .bind::<Service>()
    .to_instance(Service { origin: "parent" })
    .unwrap();
  let child = parent.create_sub_container().unwrap();

  child.dispose();

  assert!(child.is_disposed());
  assert_eq!(child.resolve::<Service>().unwrap_err().code(), "InvalidOperation");
  assert_eq!(parent.resolve::<Service>().unwrap().origin, "parent");
}

#[test]
fn test_disposing_a_parent_disposes_live_children() {
  let parent = Container::new();
  let child = parent.create_sub_container().unwrap();
  let grandchild = child.create_sub_container().unwrap();

  parent.dispose();

  assert!(parent.is_disposed());
  assert!(child.is_disposed());
  assert!(grandchild.is_disposed());
  assert_eq!(
    grandchild.resolve::<Service>().unwrap_err().code(),
    "InvalidOperation"
  );
}

#[test]
fn test_dispose_is_idempotent() {
  let scope = Container::new();
  scope.dispose();
  scope.dispose();
  assert!(scope.is_disposed());
}

#[test]
fn test_sub_container_creation_fails_on_a_disposed_parent() {
  let parent = Container::new();
  parent.dispose();

  let err = parent.create_sub_container().unwrap_err();
  assert_eq!(err.code(), "InvalidOperation");
}

#[test]
fn test_dispose_releases_cached_singletons() {
  static DROPS: AtomicUsize = AtomicUsize::new(0);

  struct ConnectionPool;
  impl Drop for ConnectionPool {
    fn drop(&mut self) {
      DROPS.fetch_add(1, Ordering::SeqCst);
    }
  }

  // Arrange
  let scope = Container::new();
  scope
    .bind::<ConnectionPool>()
    .from_factory(|_| Ok(Arc::new(ConnectionPool)))
    .as_singleton()
    .unwrap();

  // Act: materialize the singleton, release the caller's handle, then
  // dispose the owning scope.
  let pool = scope.resolve::<ConnectionPool>().unwrap();
  assert_eq!(DROPS.load(Ordering::SeqCst), 0);
  drop(pool);
  assert_eq!(DROPS.load(Ordering::SeqCst), 0);
  scope.dispose();

  // Assert: the registry held the last strong reference.
  assert_eq!(DROPS.load(Ordering::SeqCst), 1);
}

// --- Cross-tree delegation ---

#[test]
fn test_from_container_delegates_to_an_independent_tree() {
  // Arrange: an infrastructure tree that owns the real binding.
  let infra = Container::new();
  let shared = Arc::new(Service { origin: "infra" });
  infra.bind::<Service>().to_instance(shared.clone()).unwrap();

  // An application tree that delegates the contract across.
  let app = Container::new();
  app
    .bind::<Service>()
    .from_container(&infra)
    .as_singleton()
    .unwrap();

  // Act
  let resolved = app.resolve::<Service>().unwrap();

  // Assert
  assert!(Arc::ptr_eq(&shared, &resolved));
}

#[test]
fn test_from_container_preserves_the_identifier() {
  let infra = Container::new();
  infra
    .bind::<Service>()
    .with_id("replica")
    .to_instance(Service { origin: "replica" })
    .unwrap();

  let app = Container::new();
  app
    .bind::<Service>()
    .with_id("replica")
    .from_container(&infra)
    .as_transient()
    .unwrap();

  assert_eq!(
    app.resolve_with_id::<Service>("replica").unwrap().origin,
    "replica"
  );
}

#[test]
fn test_mutual_cross_container_delegation_is_detected() {
  #[derive(Debug)]
  struct Pong;

  let left = Container::new();
  let right = Container::new();
  left
    .bind::<Pong>()
    .from_container(&right)
    .as_transient()
    .unwrap();
  right
    .bind::<Pong>()
    .from_container(&left)
    .as_transient()
    .unwrap();

  let err = left.resolve::<Pong>().unwrap_err();
  assert_eq!(err.code(), "CircularDependency");
}

#[test]
fn test_from_resolve_aliases_another_binding() {
  let scope = Container::new();
  scope
    .bind::<Service>()
    .with_id("primary")
    .to_instance(Service { origin: "primary" })
    .unwrap();

  // The unnamed contract is an alias for the named one.
  scope
    .bind::<Service>()
    .from_resolve_with_id::<Service>("primary")
    .as_transient()
    .unwrap();

  let via_alias = scope.resolve::<Service>().unwrap();
  let direct = scope.resolve_with_id::<Service>("primary").unwrap();
  assert!(Arc::ptr_eq(&via_alias, &direct));
}

// --- The global container ---

#[test]
fn test_global_container_with_the_resolve_macro() {
  struct GlobalProbe {
    id: u32,
  }

  global()
    .bind::<GlobalProbe>()
    .with_id("scopes_test_probe")
    .to_instance(GlobalProbe { id: 7 })
    .unwrap();

  let probe = resolve!(global(), GlobalProbe, "scopes_test_probe");
  assert_eq!(probe.id, 7);
}
