//! Core domain types for the identity service

mod types;

pub use types::*;
