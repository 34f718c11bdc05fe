//! Viewport-driven clustering and incremental pagination of providers.
//!
//! [`ProviderDirectory`] is the entry point for a map screen: it decides when
//! a viewport change warrants a new search, accumulates paged results without
//! duplicates, and regroups the accumulated providers into map clusters.

pub mod api;
pub mod cluster;
pub mod directory;
pub mod pagination;
pub mod viewport;

pub use api::SearchApi;
pub use cluster::{cluster_providers, Cluster, ClusterRadius, MapMarker, CLUSTER_RADIUS_FACTOR};
pub use directory::{DirectoryOptions, DirectorySnapshot, ProviderDirectory};
pub use pagination::{FetchOutcome, FetchTicket, LoadState, PageState};
pub use viewport::{exceeds_refetch_threshold, ViewportChangeDetector, REFETCH_THRESHOLD};
