//! Wire types for the provider Search API.
//!
//! Requests and responses are camelCase JSON. A search request is always
//! scoped to a bounding box; everything else (text, id filters, sort) is
//! optional and carried by a [`SearchQuery`] that stays fixed for a session.

use provmap_core::{BoundingBox, GeoPoint, Provider, Viewport};
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Distance,
    Rating,
    Name,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sort {
    pub by: SortBy,
    pub direction: SortDirection,
}

/// Optional narrowing applied on top of the bounding box.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_term: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub specialty_ids: Vec<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub provider_type_ids: Vec<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub language_ids: Vec<i64>,
    #[serde(rename = "isVerifiedOnly")]
    pub verified_only: bool,
}

/// Everything about a search except the area and the page number.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub filters: SearchFilters,
    pub page_size: u32,
    /// Required by the backend for a meaningful distance sort.
    pub user_location: Option<GeoPoint>,
    pub sort: Option<Sort>,
}

impl SearchQuery {
    #[must_use]
    pub fn new(page_size: u32) -> Self {
        Self {
            filters: SearchFilters::default(),
            page_size,
            user_location: None,
            sort: None,
        }
    }

    /// Nearest-first search around the user's position.
    #[must_use]
    pub fn near(mut self, user_location: GeoPoint) -> Self {
        self.user_location = Some(user_location);
        self.sort = Some(Sort::default());
        self
    }

    #[must_use]
    pub fn with_filters(mut self, filters: SearchFilters) -> Self {
        self.filters = filters;
        self
    }

    /// Request for one page of this query over the viewport's bounding box.
    #[must_use]
    pub fn request(&self, viewport: &Viewport, page: u32) -> SearchRequest {
        SearchRequest {
            bounds: viewport.bounding_box(),
            filters: self.filters.clone(),
            page,
            page_size: self.page_size,
            user_lat: self.user_location.map(|p| p.lat),
            user_lng: self.user_location.map(|p| p.lng),
            sort_by: self.sort.map(|s| s.by),
            sort_direction: self.sort.map(|s| s.direction),
        }
    }
}

/// Body of `POST /providers/search`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(flatten)]
    pub bounds: BoundingBox,
    #[serde(flatten)]
    pub filters: SearchFilters,
    pub page: u32,
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_lng: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_direction: Option<SortDirection>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportMetadata {
    #[serde(default)]
    pub providers_in_viewport: Option<u32>,
    #[serde(default)]
    pub filtered_count: Option<u32>,
}

/// Response envelope as received. `providers` is mandatory; entries are
/// kept as raw JSON so one bad record does not sink the page.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSearchResponse {
    providers: Vec<serde_json::Value>,
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    page_size: Option<u32>,
    #[serde(default)]
    total_count: Option<u64>,
    #[serde(default)]
    total_pages: Option<u32>,
    #[serde(default)]
    viewport_metadata: Option<ViewportMetadata>,
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResponse {
    pub providers: Vec<Provider>,
    pub page: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub total_pages: u32,
    pub viewport_metadata: ViewportMetadata,
}

impl SearchResponse {
    /// Parses a response body, skipping (and logging) provider entries that
    /// do not deserialize.
    ///
    /// `page` and `page_size` fall back to the values that were requested
    /// when the backend omits them.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MalformedResponse`] if the body is not JSON or
    /// lacks the `providers` array.
    pub fn parse(body: &str, request: &SearchRequest) -> Result<Self, ClientError> {
        let raw: RawSearchResponse =
            serde_json::from_str(body).map_err(|e| ClientError::MalformedResponse {
                context: format!("providers/search(page={})", request.page),
                source: e,
            })?;

        let providers = raw
            .providers
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| {
                serde_json::from_value::<Provider>(value)
                    .map_err(|e| {
                        tracing::warn!(index, error = %e, "search response: skipping malformed provider");
                    })
                    .ok()
            })
            .collect();

        Ok(Self {
            providers,
            page: raw.page.unwrap_or(request.page),
            page_size: raw.page_size.unwrap_or(request.page_size),
            total_count: raw.total_count.unwrap_or(0),
            total_pages: raw.total_pages.unwrap_or(0),
            viewport_metadata: raw.viewport_metadata.unwrap_or_default(),
        })
    }
}
