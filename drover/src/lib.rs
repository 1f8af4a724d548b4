//! Drover — a console-command framework over a typed service registry.
//!
//! This facade crate re-exports `drover-core` through a single
//! dependency. Import everything you need with:
//!
//! ```ignore
//! use drover::prelude::*;
//! ```

pub extern crate drover_core;

// Re-export everything from drover-core at the top level for convenience.
pub use drover_core::*;
