use serde::Deserialize;

pub mod auth;
pub mod documents;
pub mod orders;
pub mod payments;

/// Common pagination query parameters.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct PaginationParams {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl PaginationParams {
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> u64 {
        self.per_page.unwrap_or(20).clamp(1, 100)
    }
}
