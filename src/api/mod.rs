//! REST API for the identity service

mod error;
mod rest;

pub use error::*;
pub use rest::*;
