//! Custom Axum extractors.

pub mod auth;
pub mod client_addr;
pub mod pagination;

pub use auth::AuthUser;
pub use client_addr::ClientAddr;
pub use pagination::PaginationParams;
