//! Provider strategies: how a binding produces its value.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::trace;

use crate::container::Container;
use crate::core::SharedValue;
use crate::error::Result;
use crate::injector::CallFrame;

pub(crate) type ProduceFn =
  Box<dyn Fn(&Arc<Container>, &mut CallFrame) -> Result<SharedValue> + Send + Sync>;

/// How a value comes into existence, independent of its lifetime.
#[derive(Clone, Copy, Debug)]
pub(crate) enum ProducerKind {
  /// Construct a concrete type through the injector.
  Construct,
  /// Delegate to a user-supplied factory closure.
  Factory,
  /// Resolve another key in the same scope and coerce it.
  Alias,
  /// Delegate the key to an independently-owned container.
  Foreign,
  /// Produce the resolving scope itself.
  SelfScope,
}

impl ProducerKind {
  fn as_str(self) -> &'static str {
    match self {
      ProducerKind::Construct => "construct",
      ProducerKind::Factory => "factory",
      ProducerKind::Alias => "alias",
      ProducerKind::Foreign => "foreign",
      ProducerKind::SelfScope => "self-scope",
    }
  }
}

pub(crate) struct Producer {
  pub(crate) kind: ProducerKind,
  pub(crate) produce: ProduceFn,
}

impl Producer {
  fn run(&self, scope: &Arc<Container>, call: &mut CallFrame) -> Result<SharedValue> {
    trace!(target: "fibre_compose", kind = self.kind.as_str(), "producing value");
    (self.produce)(scope, call)
  }
}

/// The lifetime layer over a producer.
pub(crate) enum Provider {
  /// Always the same pre-built value.
  Instance(SharedValue),
  /// Produced on first request, cached afterwards.
  Singleton {
    cell: OnceCell<SharedValue>,
    producer: Producer,
  },
  /// Produced afresh on every request.
  Transient { producer: Producer },
}

impl Provider {
  pub(crate) fn provide(&self, scope: &Arc<Container>, call: &mut CallFrame) -> Result<SharedValue> {
    match self {
      Provider::Instance(value) => Ok(value.clone()),
      Provider::Singleton { cell, producer } => cell
        .get_or_try_init(|| producer.run(scope, call))
        .map(SharedValue::clone),
      Provider::Transient { producer } => producer.run(scope, call),
    }
  }

  pub(crate) fn lifetime(&self) -> &'static str {
    match self {
      Provider::Instance(_) => "instance",
      Provider::Singleton { .. } => "singleton",
      Provider::Transient { .. } => "transient",
    }
  }
}
