//! Chunk loading.
//!
//! # Responsibility
//! - Build chunks from static per-package implementor data.
//! - Decode generated chunk scripts and discover them on disk.
//! - Deliver each chunk with exactly one registry call.
//!
//! # Invariants
//! - Loading never validates descriptor content beyond structural shape.
//! - Format errors exist only at the file boundary; registries never fail.

pub mod chunk;
pub mod discovery;
pub mod script;
