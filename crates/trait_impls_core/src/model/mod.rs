//! Implementor index data model.
//!
//! # Responsibility
//! - Define display-ready implementor descriptors.
//! - Define the ordered package → implementors mapping shared by chunks and
//!   the registry.
//!
//! # Invariants
//! - Descriptors are immutable once a chunk is built.
//! - Package keys are unique within one mapping.

pub mod descriptor;
pub mod mapping;
