//! Plain-text rendering of markers and providers.

use provmap_core::{distance_km, GeoPoint, Provider};
use provmap_directory::MapMarker;

pub(crate) fn format_marker(marker: &MapMarker) -> String {
    match marker {
        MapMarker::Provider { provider, point } => {
            let verified = if provider.verified { " [verified]" } else { "" };
            format!(
                "{:>8}  {:.5},{:.5}  {}{} ({})",
                provider.id,
                point.lat,
                point.lng,
                provider.name,
                verified,
                provider.display_type()
            )
        }
        MapMarker::Badge {
            cluster_id,
            count,
            centroid,
        } => format!(
            "{:>8}  {:.5},{:.5}  cluster of {count} providers",
            format!("#{cluster_id}"),
            centroid.lat,
            centroid.lng
        ),
    }
}

/// One line per provider with the distance from `origin`, preferring the
/// distance the backend computed.
pub(crate) fn format_nearby(provider: &Provider, origin: GeoPoint) -> String {
    let distance = provider
        .distance_in_km
        .or_else(|| provider.display_point().map(|p| distance_km(origin, p)));
    let distance = distance.map_or_else(|| "     ?".to_owned(), |d| format!("{d:6.2}"));
    let address = provider
        .primary_location()
        .map(provmap_core::ProviderLocation::address)
        .unwrap_or_default();
    format!("{distance} km  {}  {address}", provider.name)
}

pub(crate) fn format_provider_details(provider: &Provider) -> String {
    let mut lines = vec![
        format!("{} (#{})", provider.name, provider.id),
        format!("type: {}", provider.display_type()),
        format!("verified: {}", if provider.verified { "yes" } else { "no" }),
    ];
    if !provider.specialties.is_empty() {
        let specialties: Vec<&str> = provider.specialties.iter().map(String::as_str).collect();
        lines.push(format!("specialties: {}", specialties.join(", ")));
    }
    if !provider.languages.is_empty() {
        lines.push(format!("languages: {}", provider.languages.join(", ")));
    }
    if let Some(rating) = provider.rating {
        lines.push(format!("rating: {rating:.1}"));
    }
    if let Some(description) = provider.description.as_deref() {
        lines.push(description.to_owned());
    }
    for location in &provider.locations {
        let primary = if location.is_primary { " (primary)" } else { "" };
        lines.push(format!("location: {}{primary}", location.address()));
        if let Some(phone) = location.phone.as_deref() {
            lines.push(format!("  phone: {phone}"));
        }
    }
    lines.join("\n")
}
