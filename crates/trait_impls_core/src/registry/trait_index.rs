//! Per-trait registry set for a whole documentation tree.

use crate::loader::chunk::Chunk;
use crate::registry::implementor_registry::{ImplementorRegistry, MappingConsumer};
use log::debug;
use std::collections::BTreeMap;

/// One `ImplementorRegistry` per trait path, created on first use.
#[derive(Debug, Default)]
pub struct TraitIndex {
    registries: BTreeMap<String, ImplementorRegistry>,
}

impl TraitIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes a chunk to its trait's registry.
    pub fn register_chunk(&mut self, chunk: Chunk) {
        let (trait_path, mapping) = chunk.into_parts();
        debug!(
            "event=chunk_route module=trait_index status=ok trait_path={} packages={}",
            trait_path,
            mapping.len()
        );
        self.registry_mut(trait_path).register_chunk(mapping);
    }

    /// Attaches the consumer for one trait page.
    pub fn attach_consumer<C>(&mut self, trait_path: &str, consumer: C)
    where
        C: MappingConsumer + 'static,
    {
        self.registry_mut(trait_path.trim().to_string())
            .attach_consumer(consumer);
    }

    pub fn get(&self, trait_path: &str) -> Option<&ImplementorRegistry> {
        self.registries.get(trait_path.trim())
    }

    /// Sorted trait paths with a registry.
    pub fn trait_paths(&self) -> Vec<String> {
        self.registries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.registries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ImplementorRegistry)> {
        self.registries
            .iter()
            .map(|(path, registry)| (path.as_str(), registry))
    }

    fn registry_mut(&mut self, trait_path: String) -> &mut ImplementorRegistry {
        self.registries.entry(trait_path).or_default()
    }
}
