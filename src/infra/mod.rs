//! Repository layer for the identity service
//!
//! Persistence is an external collaborator: this module defines the
//! lookup/write traits the core consults, plus in-memory implementations
//! backed by `RwLock<HashMap>` for development and testing. A production
//! deployment would add database-backed implementations behind the same
//! traits.

mod error;
mod memory;
mod traits;

pub use error::*;
pub use memory::*;
pub use traits::*;
