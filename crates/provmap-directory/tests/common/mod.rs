//! Scripted in-memory search API and fixtures shared by the directory tests.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use provmap_client::{ClientError, SearchRequest, SearchResponse, ViewportMetadata};
use provmap_core::{GeoPoint, Provider, ProviderLocation, Viewport};
use provmap_directory::SearchApi;
use tokio::sync::Notify;

/// Answers searches from a queue of canned results and records every request.
///
/// With a gate installed each search waits for one `notify_one` before
/// answering, which keeps a fetch in flight for as long as a test needs.
#[derive(Default)]
pub struct ScriptedApi {
    responses: Mutex<VecDeque<Result<SearchResponse, ClientError>>>,
    requests: Mutex<Vec<SearchRequest>>,
    providers: HashMap<i64, Provider>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn respond(self, result: Result<SearchResponse, ClientError>) -> Self {
        self.responses.lock().unwrap().push_back(result);
        self
    }

    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.providers.insert(provider.id, provider);
        self
    }

    pub fn requests(&self) -> Vec<SearchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchApi for ScriptedApi {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, ClientError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(server_error()))
    }

    async fn provider(&self, provider_id: i64) -> Result<Provider, ClientError> {
        self.providers
            .get(&provider_id)
            .cloned()
            .ok_or(ClientError::NotFound { provider_id })
    }
}

pub fn server_error() -> ClientError {
    ClientError::UnexpectedStatus {
        status: 503,
        url: "http://localhost:8081/api/map/providers/search".to_owned(),
    }
}

pub fn hyderabad() -> Viewport {
    Viewport::new(GeoPoint { lat: 17.40, lng: 78.50 }, 0.10, 0.10).unwrap()
}

pub fn provider_at(id: i64, lat: f64, lng: f64) -> Provider {
    Provider {
        id,
        name: format!("Provider {id}"),
        provider_type: Some("Clinic".to_owned()),
        locations: vec![ProviderLocation {
            id: Some(id * 10),
            latitude: lat,
            longitude: lng,
            is_primary: true,
            address_line1: None,
            address_line2: None,
            city: Some("Hyderabad".to_owned()),
            state: None,
            postal_code: None,
            country: None,
            phone: None,
            email: None,
        }],
        specialties: BTreeSet::new(),
        verified: true,
        languages: Vec::new(),
        description: None,
        rating: None,
        distance_in_km: None,
    }
}

/// Providers spaced about 1.1 km apart along a meridian so none cluster
/// at the Hyderabad zoom level.
pub fn spread(ids: impl IntoIterator<Item = i64>) -> Vec<Provider> {
    ids.into_iter()
        .map(|id| {
            #[allow(clippy::cast_precision_loss)]
            let offset = id as f64 * 0.01;
            provider_at(id, 17.0 + offset, 78.50)
        })
        .collect()
}

pub fn page(page: u32, providers: Vec<Provider>, total_count: u64, total_pages: u32) -> SearchResponse {
    SearchResponse {
        providers,
        page,
        page_size: 20,
        total_count,
        total_pages,
        viewport_metadata: ViewportMetadata {
            providers_in_viewport: u32::try_from(total_count).ok(),
            filtered_count: None,
        },
    }
}
