//! Implementor registries.
//!
//! # Responsibility
//! - Accumulate implementor chunks per trait page.
//! - Rendezvous merged data with the page's single consumer regardless of
//!   load order.
//!
//! # Invariants
//! - Registries are explicitly constructed and owned; there is no global
//!   instance.
//! - Every call runs to completion before the next; consumers cannot
//!   re-enter a registry while being notified.

pub mod implementor_registry;
pub mod trait_index;
