//! Core type definitions used across the Murmur workspace.

pub mod id;
pub mod name;
pub mod principal;

pub use id::*;
pub use name::*;
pub use principal::Principal;
