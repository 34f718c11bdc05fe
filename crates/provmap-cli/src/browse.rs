//! Command handlers that talk to the Search API.

use provmap_client::{SearchClient, SearchQuery};
use provmap_core::{AppConfig, GeoPoint, Viewport};
use provmap_directory::{DirectoryOptions, FetchOutcome, ProviderDirectory, SearchApi};

use crate::output::{format_marker, format_nearby, format_provider_details};

/// Searches `viewport` and loads up to `pages` pages, then prints the
/// resulting markers.
///
/// # Errors
///
/// Returns an error if the client cannot be built or the first page fails.
/// A failure on a later page is reported and the pages already loaded are
/// still printed.
pub(crate) async fn run_browse(
    config: &AppConfig,
    viewport: Viewport,
    query: SearchQuery,
    pages: u32,
) -> anyhow::Result<()> {
    let client = SearchClient::from_config(config)?;
    let directory = ProviderDirectory::new(
        client,
        DirectoryOptions {
            query,
            initial_viewport: viewport,
        },
    );
    load_pages(&directory, pages).await?;

    let snapshot = directory.snapshot();
    println!(
        "{} (page {} of {})",
        snapshot.progress(),
        snapshot.current_page,
        snapshot.total_pages
    );
    for marker in snapshot.markers() {
        println!("{}", format_marker(&marker));
    }
    if snapshot.has_more() {
        println!("more results available; pass --pages to load them");
    }
    Ok(())
}

/// Lists providers around `point`, nearest first.
///
/// # Errors
///
/// Same as [`run_browse`]; also fails for a non-positive radius.
pub(crate) async fn run_near(
    config: &AppConfig,
    point: GeoPoint,
    radius_km: f64,
    pages: u32,
) -> anyhow::Result<()> {
    let viewport = Viewport::around(point, radius_km)?;
    let client = SearchClient::from_config(config)?;
    let directory = ProviderDirectory::new(
        client,
        DirectoryOptions {
            query: SearchQuery::new(config.page_size).near(point),
            initial_viewport: viewport,
        },
    );
    load_pages(&directory, pages).await?;

    let snapshot = directory.snapshot();
    println!("{} within {radius_km} km", snapshot.progress());
    for provider in directory.providers() {
        println!("{}", format_nearby(&provider, point));
    }
    Ok(())
}

/// Prints one provider.
///
/// # Errors
///
/// Returns an error if the provider does not exist or the request fails.
pub(crate) async fn run_provider(config: &AppConfig, id: i64) -> anyhow::Result<()> {
    let client = SearchClient::from_config(config)?;
    let provider = client.get_provider(id).await?;
    println!("{}", format_provider_details(&provider));
    Ok(())
}

async fn load_pages<A: SearchApi>(
    directory: &ProviderDirectory<A>,
    pages: u32,
) -> anyhow::Result<()> {
    let mut outcome = directory.mark_display_ready().await;
    let mut loaded = 1;
    while loaded < pages && matches!(outcome, FetchOutcome::Loaded { .. }) {
        outcome = directory.load_more().await;
        if matches!(outcome, FetchOutcome::Loaded { .. }) {
            loaded += 1;
        }
    }

    if let FetchOutcome::Failed { page, error } = outcome {
        if page == 1 {
            anyhow::bail!("provider search failed: {error}");
        }
        eprintln!("warning: page {page} could not be loaded: {error}");
    }
    Ok(())
}
