//! Pagination query parameters.

use serde::{Deserialize, Serialize};

/// Largest page a client may ask for.
const MAX_PER_PAGE: usize = 100;

/// `?page=&per_page=` for list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationParams {
    /// Page number (1-based, default: 1).
    #[serde(default = "default_page")]
    pub page: usize,
    /// Items per page (default: 50, max: 100).
    #[serde(default = "default_per_page")]
    pub per_page: usize,
}

fn default_page() -> usize {
    1
}

fn default_per_page() -> usize {
    50
}

impl PaginationParams {
    /// Zero-based page index.
    pub fn index(&self) -> usize {
        self.page.max(1) - 1
    }

    /// Page size clamped to `1..=100`.
    pub fn size(&self) -> usize {
        self.per_page.clamp(1, MAX_PER_PAGE)
    }
}
