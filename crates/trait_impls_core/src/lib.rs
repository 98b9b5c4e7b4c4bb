//! Trait implementor index for documentation pages.
//! Merges per-package implementor chunks and hands the merged view to the
//! page's consumer regardless of load order.

pub mod loader;
pub mod logging;
pub mod model;
pub mod registry;

pub use loader::chunk::{build_chunk, deliver_chunk, deliver_chunk_to_index, Chunk};
pub use loader::discovery::{
    discover_chunk_files, load_chunk_file, load_implementors_dir, trait_path_for_file,
};
pub use loader::script::{parse_chunk_script, ChunkScriptError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig};
pub use model::descriptor::ImplementorDescriptor;
pub use model::mapping::CapabilityMapping;
pub use registry::implementor_registry::{ImplementorRegistry, MappingConsumer};
pub use registry::trait_index::TraitIndex;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
