//! # murmur-core
//!
//! Core crate for Murmur. Contains configuration schemas, typed
//! identifiers, the authenticated [`Principal`](types::Principal), the
//! [`Clock`](clock::Clock) abstraction, collaborator traits, and the
//! unified error system.
//!
//! This crate has **no** internal dependencies on other Murmur crates.

pub mod clock;
pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{AppError, ErrorKind};
pub use result::AppResult;
