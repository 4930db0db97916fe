//! # trellis-core
//!
//! Core types, traits, and abstractions for the trellis note system.
//!
//! This crate provides the foundational data structures and trait definitions
//! that other trellis crates depend on: the error taxonomy, the shared
//! domain models (tags, notes, relationship edges), default constants, and
//! the seams for pluggable inference backends and store repositories.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
