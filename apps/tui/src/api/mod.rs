pub mod cache;
pub mod client;
pub mod endpoints;
pub mod error;
pub mod models;

pub use cache::{CacheCategory, CachePolicy, CacheStats, ResponseCache};
pub use client::{ApiClient, PAGE_LIMIT, SEARCH_LIMIT};
pub use error::ApiError;
