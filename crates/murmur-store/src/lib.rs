//! # murmur-store
//!
//! In-process implementations of the persistence and object-storage
//! collaborators. State lives in [`dashmap::DashMap`]s so concurrent
//! handlers only contend on the shard holding their key.

pub mod memory;

pub use memory::{MemoryObjectStore, MemoryRepository};
