pub mod client;
pub mod error;
pub(crate) mod retry;
pub mod types;

pub use client::SearchClient;
pub use error::ClientError;
pub use types::{
    SearchFilters, SearchQuery, SearchRequest, SearchResponse, Sort, SortBy, SortDirection,
    ViewportMetadata,
};
