//! The binding registry: a type+identifier+predicate keyed table of
//! providers with live parent-chain delegation.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::trace;

use crate::container::Container;
use crate::core::{BindingKey, InjectionContext, SharedValue};
use crate::error::{Error, Result};
use crate::injector::CallFrame;
use crate::provider::Provider;

pub(crate) type Predicate = Box<dyn Fn(&InjectionContext<'_>) -> bool + Send + Sync>;

pub(crate) struct BindingEntry {
  pub(crate) condition: Option<Predicate>,
  pub(crate) provider: Provider,
}

struct PendingBinding {
  token: u64,
  type_name: &'static str,
}

/// The slot handed to a binding builder when it opens.
pub(crate) enum BuilderSlot {
  /// The builder owns the pending slot.
  Token(u64),
  /// Another binding was already pending when this builder opened; the field
  /// names it.
  Conflicted(&'static str),
}

pub(crate) struct Binder {
  // Bindings with no identifier live in a direct type -> entries map;
  // identified bindings live in a type -> (identifier -> entries) map.
  unnamed: DashMap<TypeId, Vec<Arc<BindingEntry>>>,
  named: DashMap<TypeId, HashMap<String, Vec<Arc<BindingEntry>>>>,
  parent: Option<Arc<Binder>>,
  pending: Mutex<Option<PendingBinding>>,
  next_token: AtomicU64,
  disposed: AtomicBool,
}

impl Binder {
  pub(crate) fn root() -> Self {
    Self::with_parent_link(None)
  }

  pub(crate) fn with_parent(parent: Arc<Binder>) -> Self {
    Self::with_parent_link(Some(parent))
  }

  fn with_parent_link(parent: Option<Arc<Binder>>) -> Self {
    Self {
      unnamed: DashMap::new(),
      named: DashMap::new(),
      parent,
      pending: Mutex::new(None),
      next_token: AtomicU64::new(0),
      disposed: AtomicBool::new(false),
    }
  }

  // --- Binding-completion state machine ---

  pub(crate) fn open_pending(&self, type_name: &'static str) -> BuilderSlot {
    let mut slot = self.pending.lock();
    if let Some(pending) = slot.as_ref() {
      return BuilderSlot::Conflicted(pending.type_name);
    }
    let token = self.next_token.fetch_add(1, Ordering::Relaxed) + 1;
    *slot = Some(PendingBinding { token, type_name });
    BuilderSlot::Token(token)
  }

  pub(crate) fn close_pending(&self, slot: &BuilderSlot, completing: &'static str) -> Result<()> {
    match slot {
      BuilderSlot::Conflicted(pending_name) => Err(Error::IncompleteBinding {
        type_name: *pending_name,
      }),
      BuilderSlot::Token(token) => {
        let mut pending = self.pending.lock();
        match pending.as_ref() {
          Some(p) if p.token == *token => {}
          Some(p) => {
            return Err(Error::UnexpectedBinding {
              expected: p.type_name,
              completed: completing,
            });
          }
          None => {
            return Err(Error::UnexpectedBinding {
              expected: "none",
              completed: completing,
            });
          }
        }
        *pending = None;
        Ok(())
      }
    }
  }

  /// Reports (and heals) a binding left open by an abandoned builder.
  pub(crate) fn take_stale_pending(&self) -> Result<()> {
    let mut slot = self.pending.lock();
    if let Some(pending) = slot.take() {
      return Err(Error::IncompleteBinding {
        type_name: pending.type_name,
      });
    }
    Ok(())
  }

  // --- Registration ---

  pub(crate) fn register(
    &self,
    key: BindingKey,
    condition: Option<Predicate>,
    provider: Provider,
  ) -> Result<()> {
    if self.disposed.load(Ordering::SeqCst) {
      return Err(Error::disposed());
    }
    trace!(
      target: "fibre_compose",
      contract = key.type_name,
      identifier = key.identifier.as_deref(),
      lifetime = provider.lifetime(),
      conditional = condition.is_some(),
      "binding registered"
    );
    let entry = Arc::new(BindingEntry { condition, provider });
    match &key.identifier {
      None => {
        let mut entries = self.unnamed.entry(key.type_id).or_default();
        Self::push_entry(&key, entries.value_mut(), entry)
      }
      Some(id) => {
        let mut by_id = self.named.entry(key.type_id).or_default();
        let entries = by_id.entry(id.clone()).or_default();
        Self::push_entry(&key, entries, entry)
      }
    }
  }

  // Two unconditional bindings for the same key collide; a binding with a
  // predicate coexists with anything, and registration order decides which
  // entry wins at resolve time.
  fn push_entry(
    key: &BindingKey,
    entries: &mut Vec<Arc<BindingEntry>>,
    entry: Arc<BindingEntry>,
  ) -> Result<()> {
    let collides = entry.condition.is_none() && entries.iter().any(|e| e.condition.is_none());
    if collides {
      return Err(Error::TypeAlreadyRegistered {
        type_name: key.type_name,
        identifier: key.identifier.clone(),
      });
    }
    entries.push(entry);
    Ok(())
  }

  // --- Resolution ---

  /// Looks the key up locally, then walks the parent chain. `Ok(None)` means
  /// no binding matched anywhere, which is distinct from a provider failure.
  pub(crate) fn resolve(
    &self,
    key: &BindingKey,
    ctx: &InjectionContext<'_>,
    scope: &Arc<Container>,
    call: &mut CallFrame,
  ) -> Result<Option<SharedValue>> {
    if self.disposed.load(Ordering::SeqCst) {
      return Err(Error::disposed());
    }
    // Matching entries are cloned out so no registry shard lock is held
    // while a provider runs; providers may re-enter the registry.
    let candidates: Vec<Arc<BindingEntry>> = match &key.identifier {
      None => self
        .unnamed
        .get(&key.type_id)
        .map(|entries| entries.value().clone())
        .unwrap_or_default(),
      Some(id) => self
        .named
        .get(&key.type_id)
        .and_then(|by_id| by_id.get(id).cloned())
        .unwrap_or_default(),
    };

    for entry in candidates {
      let matches = entry.condition.as_ref().map_or(true, |condition| condition(ctx));
      if matches {
        return entry.provider.provide(scope, call).map(Some);
      }
    }

    match &self.parent {
      Some(parent) => parent.resolve(key, ctx, scope, call),
      None => Ok(None),
    }
  }

  pub(crate) fn dispose(&self) {
    self.disposed.store(true, Ordering::SeqCst);
    self.pending.lock().take();
    self.unnamed.clear();
    self.named.clear();
  }
}
