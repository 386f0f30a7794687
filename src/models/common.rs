use serde::{Deserialize, Serialize};

/// Fixed page size for list endpoints.
pub const PER_PAGE: i64 = 15;

#[derive(Debug, Deserialize)]
pub struct PageParams {
    /// 1-indexed page number
    #[serde(default)]
    pub page: Option<i64>,
}

impl PageParams {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }
}

/// A page of results with the metadata list endpoints expose.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub current_page: i64,
    pub last_page: i64,
    pub per_page: i64,
    pub total: i64,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, current_page: i64, per_page: i64, total: i64) -> Self {
        let last_page = if total == 0 {
            1
        } else {
            (total + per_page - 1) / per_page
        };
        Self {
            data,
            current_page,
            last_page,
            per_page,
            total,
        }
    }
}
