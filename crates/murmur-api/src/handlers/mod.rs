//! Route handlers organized by domain.

pub mod auth;
pub mod file;
pub mod health;
pub mod notification;
pub mod presence;
pub mod private;
pub mod ws;
