use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Envelope used by the Jendo backend and mirrored by this API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub data: T,
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Set when `data` was served from fallback data instead of the live backend.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
            timestamp: Some(Utc::now().to_rfc3339()),
            degraded: false,
        }
    }

    pub fn degraded(mut self, degraded: bool) -> Self {
        self.degraded = degraded;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationResponse<T> {
    pub content: Vec<T>,
    pub page_number: u32,
    pub page_size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
    pub first: bool,
    pub last: bool,
}

impl<T> PaginationResponse<T> {
    /// Slices `items` into the requested zero-based page.
    pub fn paginate(items: Vec<T>, page: u32, size: u32) -> Self {
        let size = size.max(1);
        let total_elements = items.len() as u64;
        let total_pages = ((total_elements + size as u64 - 1) / size as u64) as u32;
        let start = (page as usize).saturating_mul(size as usize);
        let content: Vec<T> = items.into_iter().skip(start).take(size as usize).collect();

        Self {
            content,
            page_number: page,
            page_size: size,
            total_elements,
            total_pages,
            first: page == 0,
            last: page.saturating_add(1) >= total_pages,
        }
    }
}
