//! # murmur-entity
//!
//! Document models persisted through the
//! [`Repository`](murmur_core::traits::Repository) collaborator. Every struct
//! derives `Debug`, `Clone`, `Serialize`, `Deserialize` and implements
//! [`Document`](murmur_core::traits::Document).

pub mod message;
pub mod notification;
pub mod user;
