//! Deferred implementor registry for one trait page.
//!
//! # Responsibility
//! - Merge chunks that arrive over time into one package → implementors
//!   mapping.
//! - Deliver the full merged mapping to a single late-binding consumer,
//!   whichever side shows up first.
//!
//! # Invariants
//! - The merged mapping is the union of every delivered chunk, each package
//!   holding its latest list. Lists are replaced, never merged.
//! - A consumer attached before any chunk fires on the first chunk.
//! - A consumer attached after a chunk fires inside `attach_consumer`.
//! - Only the latest consumer is notified; replaced consumers are dropped.

use crate::model::descriptor::ImplementorDescriptor;
use crate::model::mapping::CapabilityMapping;
use log::debug;
use std::fmt::{Debug, Formatter};

/// Receiver for the merged implementor mapping (the page renderer).
///
/// Always handed the complete current mapping; diffing is the receiver's job.
pub trait MappingConsumer {
    fn on_mapping(&mut self, mapping: &CapabilityMapping);
}

impl<F> MappingConsumer for F
where
    F: FnMut(&CapabilityMapping),
{
    fn on_mapping(&mut self, mapping: &CapabilityMapping) {
        self(mapping)
    }
}

/// Process-owned registry state for one capability.
#[derive(Default)]
pub struct ImplementorRegistry {
    merged: CapabilityMapping,
    chunk_count: usize,
    consumer: Option<Box<dyn MappingConsumer>>,
}

impl ImplementorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges one chunk and notifies the attached consumer, if any.
    ///
    /// A chunk without packages still counts as a registration event.
    pub fn register_chunk(&mut self, chunk: CapabilityMapping) {
        let chunk_packages = chunk.len();
        self.merged.overwrite_from(chunk);
        self.chunk_count += 1;
        debug!(
            "event=chunk_register module=registry status=ok chunk_packages={} total_packages={} chunk_count={}",
            chunk_packages,
            self.merged.len(),
            self.chunk_count
        );

        if let Some(consumer) = self.consumer.as_mut() {
            consumer.on_mapping(&self.merged);
            debug!(
                "event=consumer_notify module=registry status=ok trigger=chunk packages={}",
                self.merged.len()
            );
        }
    }

    /// Installs `consumer` as the only consumer.
    ///
    /// Fires immediately when at least one chunk was registered; otherwise
    /// the consumer waits for the next `register_chunk`.
    pub fn attach_consumer<C>(&mut self, consumer: C)
    where
        C: MappingConsumer + 'static,
    {
        let mut consumer: Box<dyn MappingConsumer> = Box::new(consumer);
        let replaced = self.consumer.is_some();

        if self.has_chunks() {
            consumer.on_mapping(&self.merged);
            debug!(
                "event=consumer_notify module=registry status=ok trigger=attach packages={} replaced={}",
                self.merged.len(),
                replaced
            );
        } else {
            debug!(
                "event=consumer_attach module=registry status=pending replaced={}",
                replaced
            );
        }

        self.consumer = Some(consumer);
    }

    /// Current merged mapping.
    pub fn mapping(&self) -> &CapabilityMapping {
        &self.merged
    }

    pub fn packages(&self) -> impl Iterator<Item = &str> {
        self.merged.packages()
    }

    pub fn implementors(&self, package: &str) -> Option<&[ImplementorDescriptor]> {
        self.merged.get(package)
    }

    pub fn implementor_count(&self) -> usize {
        self.merged.implementor_count()
    }

    /// Whether any chunk (even an empty one) was registered.
    pub fn has_chunks(&self) -> bool {
        self.chunk_count > 0
    }

    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    pub fn has_consumer(&self) -> bool {
        self.consumer.is_some()
    }
}

impl Debug for ImplementorRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImplementorRegistry")
            .field("merged", &self.merged)
            .field("chunk_count", &self.chunk_count)
            .field("has_consumer", &self.consumer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{ImplementorRegistry, MappingConsumer};
    use crate::model::descriptor::ImplementorDescriptor;
    use crate::model::mapping::CapabilityMapping;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct CountingConsumer {
        calls: Rc<RefCell<usize>>,
    }

    impl MappingConsumer for CountingConsumer {
        fn on_mapping(&mut self, _mapping: &CapabilityMapping) {
            *self.calls.borrow_mut() += 1;
        }
    }

    fn chunk(package: &str, types: &[&str]) -> CapabilityMapping {
        let implementors: Vec<ImplementorDescriptor> = types
            .iter()
            .map(|ty| ImplementorDescriptor::new("TraitX", *ty))
            .collect();
        [(package, implementors)].into_iter().collect()
    }

    #[test]
    fn pending_consumer_fires_once_on_first_chunk() {
        let calls = Rc::new(RefCell::new(0));
        let mut registry = ImplementorRegistry::new();
        registry.attach_consumer(CountingConsumer {
            calls: Rc::clone(&calls),
        });
        assert_eq!(*calls.borrow(), 0);
        assert!(registry.has_consumer());

        registry.register_chunk(chunk("pkg-a", &["TypeA"]));
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn empty_chunk_counts_as_registration() {
        let calls = Rc::new(RefCell::new(0));
        let mut registry = ImplementorRegistry::new();
        registry.attach_consumer(CountingConsumer {
            calls: Rc::clone(&calls),
        });

        registry.register_chunk(CapabilityMapping::new());
        assert!(registry.has_chunks());
        assert!(registry.mapping().is_empty());
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn attach_without_chunks_does_not_fire() {
        let calls = Rc::new(RefCell::new(0));
        let mut registry = ImplementorRegistry::new();
        registry.attach_consumer(CountingConsumer {
            calls: Rc::clone(&calls),
        });
        registry.attach_consumer(CountingConsumer {
            calls: Rc::clone(&calls),
        });
        assert_eq!(*calls.borrow(), 0);
        assert_eq!(registry.chunk_count(), 0);
    }

    #[test]
    fn later_unrelated_chunk_keeps_earlier_packages() {
        let mut registry = ImplementorRegistry::new();
        registry.register_chunk(chunk("pkg-a", &["TypeA", "TypeB"]));
        registry.register_chunk(chunk("pkg-b", &[]));

        assert_eq!(registry.packages().collect::<Vec<_>>(), vec!["pkg-a", "pkg-b"]);
        assert_eq!(registry.implementors("pkg-a").map(<[_]>::len), Some(2));
        assert_eq!(registry.implementor_count(), 2);
        assert_eq!(registry.chunk_count(), 2);
    }

    #[test]
    fn debug_output_reports_consumer_presence() {
        let mut registry = ImplementorRegistry::new();
        registry.attach_consumer(|_: &CapabilityMapping| {});
        let rendered = format!("{registry:?}");
        assert!(rendered.contains("has_consumer: true"));
    }
}
