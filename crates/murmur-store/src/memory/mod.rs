//! DashMap-backed stores.

pub mod object_store;
pub mod repository;

pub use object_store::MemoryObjectStore;
pub use repository::MemoryRepository;
