//! The Search API collaborator as seen by the directory.

use async_trait::async_trait;
use provmap_client::{ClientError, SearchClient, SearchRequest, SearchResponse};
use provmap_core::Provider;

/// Paged provider search plus provider-by-id lookup.
///
/// [`SearchClient`] is the production implementation; tests substitute
/// scripted in-memory versions.
#[async_trait]
pub trait SearchApi: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, ClientError>;

    async fn provider(&self, provider_id: i64) -> Result<Provider, ClientError>;
}

#[async_trait]
impl SearchApi for SearchClient {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, ClientError> {
        self.search_providers(request).await
    }

    async fn provider(&self, provider_id: i64) -> Result<Provider, ClientError> {
        self.get_provider(provider_id).await
    }
}
