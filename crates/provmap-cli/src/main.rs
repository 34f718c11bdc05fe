mod browse;
mod offline;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use provmap_client::{SearchFilters, SearchQuery};
use provmap_core::{AppConfig, GeoPoint, Viewport};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "provmap")]
#[command(about = "Browse healthcare providers on a map from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Map area options; anything left out comes from the configured initial viewport.
#[derive(Debug, Clone, Copy, Default, clap::Args)]
struct AreaArgs {
    /// Center latitude
    #[arg(long, allow_negative_numbers = true)]
    lat: Option<f64>,
    /// Center longitude
    #[arg(long, allow_negative_numbers = true)]
    lng: Option<f64>,
    /// Latitude span in degrees
    #[arg(long)]
    lat_span: Option<f64>,
    /// Longitude span in degrees
    #[arg(long)]
    lng_span: Option<f64>,
}

impl AreaArgs {
    fn viewport(self, config: &AppConfig) -> anyhow::Result<Viewport> {
        let initial = config.initial_viewport;
        let center = GeoPoint::new(
            self.lat.unwrap_or(initial.center.lat),
            self.lng.unwrap_or(initial.center.lng),
        )?;
        Ok(Viewport::new(
            center,
            self.lat_span.unwrap_or(initial.lat_span),
            self.lng_span.unwrap_or(initial.lng_span),
        )?)
    }
}

/// Map area for offline clustering. Nothing here falls back to configuration.
#[derive(Debug, Clone, Copy, clap::Args)]
struct ClusterArea {
    /// Center latitude
    #[arg(long, allow_negative_numbers = true)]
    lat: f64,
    /// Center longitude
    #[arg(long, allow_negative_numbers = true)]
    lng: f64,
    /// Latitude span in degrees
    #[arg(long, default_value = "0.1")]
    lat_span: f64,
    /// Longitude span in degrees
    #[arg(long, default_value = "0.1")]
    lng_span: f64,
    /// Page size the saved response was requested with
    #[arg(long, default_value = "20")]
    page_size: u32,
}

impl ClusterArea {
    fn viewport(self) -> anyhow::Result<Viewport> {
        let center = GeoPoint::new(self.lat, self.lng)?;
        Ok(Viewport::new(center, self.lat_span, self.lng_span)?)
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search a map area and print its markers
    Browse {
        #[command(flatten)]
        area: AreaArgs,
        /// Free-text search term
        #[arg(long)]
        search_term: Option<String>,
        /// Only show verified providers
        #[arg(long)]
        verified_only: bool,
        /// Number of result pages to load
        #[arg(long, default_value = "1")]
        pages: u32,
    },
    /// List providers nearest to a point
    Near {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// Search radius around the point
        #[arg(long, default_value = "5")]
        radius_km: f64,
        /// Number of result pages to load
        #[arg(long, default_value = "1")]
        pages: u32,
    },
    /// Show one provider by id
    Provider { id: i64 },
    /// Cluster a saved search response without contacting the API
    Cluster {
        /// JSON file holding a `providers/search` response body
        #[arg(long)]
        input: PathBuf,
        #[command(flatten)]
        area: ClusterArea,
    },
}

fn init_tracing(default_level: &str) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

/// Loads configuration and starts logging at its level. Only commands that
/// talk to the Search API need this.
fn online_config() -> anyhow::Result<AppConfig> {
    let config = provmap_core::load_app_config()?;
    init_tracing(&config.log_level)?;
    tracing::debug!(env = %config.env, api_base_url = %config.api_base_url, "configuration loaded");
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Browse {
            area,
            search_term,
            verified_only,
            pages,
        } => {
            let config = online_config()?;
            let viewport = area.viewport(&config)?;
            let query = SearchQuery::new(config.page_size).with_filters(SearchFilters {
                search_term,
                verified_only,
                ..SearchFilters::default()
            });
            browse::run_browse(&config, viewport, query, pages).await
        }
        Commands::Near {
            lat,
            lng,
            radius_km,
            pages,
        } => {
            let config = online_config()?;
            browse::run_near(&config, GeoPoint::new(lat, lng)?, radius_km, pages).await
        }
        Commands::Provider { id } => browse::run_provider(&online_config()?, id).await,
        Commands::Cluster { input, area } => {
            init_tracing("info")?;
            offline::run_cluster(&input, area.viewport()?, area.page_size)
        }
    }
}
