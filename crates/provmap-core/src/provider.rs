//! Provider records as delivered by the Search API.
//!
//! Providers are immutable for the lifetime of a search session and are
//! identified by `id` alone.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};

use crate::geo::GeoPoint;

const DEFAULT_PROVIDER_TYPE: &str = "Healthcare Provider";

/// The backend sends `null` for empty collections and unset flags.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One practice address of a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderLocation {
    #[serde(default)]
    pub id: Option<i64>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_primary: bool,
    #[serde(default)]
    pub address_line1: Option<String>,
    #[serde(default)]
    pub address_line2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl ProviderLocation {
    #[must_use]
    pub fn point(&self) -> GeoPoint {
        GeoPoint {
            lat: self.latitude,
            lng: self.longitude,
        }
    }

    /// Single-line address built from whichever address parts are present.
    #[must_use]
    pub fn address(&self) -> String {
        [
            &self.address_line1,
            &self.address_line2,
            &self.city,
            &self.state,
            &self.postal_code,
            &self.country,
        ]
        .into_iter()
        .filter_map(|part| part.as_deref().map(str::trim))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub provider_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub locations: Vec<ProviderLocation>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub specialties: BTreeSet<String>,
    #[serde(
        default,
        rename = "isVerified",
        deserialize_with = "null_as_default"
    )]
    pub verified: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub languages: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub distance_in_km: Option<f64>,
}

impl Provider {
    /// The location used for map placement: the first one flagged primary,
    /// otherwise the first one listed.
    #[must_use]
    pub fn primary_location(&self) -> Option<&ProviderLocation> {
        self.locations
            .iter()
            .find(|loc| loc.is_primary)
            .or_else(|| self.locations.first())
    }

    /// Map coordinate for this provider, or `None` when it has no locations.
    #[must_use]
    pub fn display_point(&self) -> Option<GeoPoint> {
        self.primary_location().map(ProviderLocation::point)
    }

    #[must_use]
    pub fn display_type(&self) -> &str {
        self.provider_type
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(DEFAULT_PROVIDER_TYPE)
    }
}
