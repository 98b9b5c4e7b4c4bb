//! Chunk construction and delivery.
//!
//! One chunk is one trait page's complete contribution from a documentation
//! build. Construction is structural only and cannot fail.

use crate::model::descriptor::ImplementorDescriptor;
use crate::model::mapping::CapabilityMapping;
use crate::registry::implementor_registry::ImplementorRegistry;
use crate::registry::trait_index::TraitIndex;

/// Implementors for one trait, grouped by package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    trait_path: String,
    mapping: CapabilityMapping,
}

impl Chunk {
    pub fn new(trait_path: impl Into<String>, mapping: CapabilityMapping) -> Self {
        Self {
            trait_path: trait_path.into().trim().to_string(),
            mapping,
        }
    }

    /// Fully qualified trait path, e.g. `core::fmt::Display`.
    pub fn trait_path(&self) -> &str {
        &self.trait_path
    }

    pub fn mapping(&self) -> &CapabilityMapping {
        &self.mapping
    }

    pub fn into_parts(self) -> (String, CapabilityMapping) {
        (self.trait_path, self.mapping)
    }
}

/// Builds a chunk from already well-formed package entries.
pub fn build_chunk<I, P>(trait_path: impl Into<String>, entries: I) -> Chunk
where
    I: IntoIterator<Item = (P, Vec<ImplementorDescriptor>)>,
    P: Into<String>,
{
    Chunk::new(trait_path, entries.into_iter().collect())
}

/// Hands a chunk's mapping to a single-trait registry.
pub fn deliver_chunk(chunk: Chunk, registry: &mut ImplementorRegistry) {
    let (_, mapping) = chunk.into_parts();
    registry.register_chunk(mapping);
}

/// Hands a chunk to the registry for its trait inside `index`.
pub fn deliver_chunk_to_index(chunk: Chunk, index: &mut TraitIndex) {
    index.register_chunk(chunk);
}
