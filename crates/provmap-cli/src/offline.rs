//! Offline clustering of a saved search response.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use provmap_client::{SearchQuery, SearchResponse};
use provmap_core::Viewport;
use provmap_directory::{cluster_providers, ClusterRadius};

use crate::output::format_marker;

/// Clusters the providers in `input` as they would appear in `viewport`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a search response.
pub(crate) fn run_cluster(input: &Path, viewport: Viewport, page_size: u32) -> anyhow::Result<()> {
    let body = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let request = SearchQuery::new(page_size).request(&viewport, 1);
    let response = SearchResponse::parse(&body, &request)?;

    let providers: Vec<_> = response.providers.into_iter().map(Arc::new).collect();
    let radius = ClusterRadius::for_viewport(&viewport);
    let clusters = cluster_providers(&providers, radius);

    println!(
        "{} providers in {} clusters (radius {:.3} km)",
        providers.len(),
        clusters.len(),
        radius.km()
    );
    for cluster in &clusters {
        println!("{}", format_marker(&cluster.marker()));
    }
    Ok(())
}
