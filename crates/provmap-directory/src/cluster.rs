//! Single-pass greedy clustering of providers for map display.
//!
//! Providers are visited in input order and each joins the *first* existing
//! cluster whose running centroid lies within the clustering radius. The
//! result depends on input order; the same input always yields the same
//! clusters.

use std::sync::Arc;

use provmap_core::{distance_km, GeoPoint, Provider, Viewport, KM_PER_DEGREE};

/// Fraction of the viewport's smaller span used as the clustering radius.
pub const CLUSTER_RADIUS_FACTOR: f64 = 0.05;

/// Merge distance for one clustering pass, held in degrees of arc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterRadius {
    degrees: f64,
}

impl ClusterRadius {
    /// Radius for the viewport's zoom level: zoomed out merges more.
    #[must_use]
    pub fn for_viewport(viewport: &Viewport) -> Self {
        Self::from_degrees(viewport.min_span() * CLUSTER_RADIUS_FACTOR)
    }

    #[must_use]
    pub fn from_degrees(degrees: f64) -> Self {
        Self { degrees }
    }

    #[must_use]
    pub fn degrees(self) -> f64 {
        self.degrees
    }

    #[must_use]
    pub fn km(self) -> f64 {
        self.degrees * KM_PER_DEGREE
    }
}

/// A group of providers placed at the running mean of their points.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Creation index within the pass that produced it.
    pub id: usize,
    pub centroid: GeoPoint,
    pub members: Vec<Arc<Provider>>,
}

/// What the presentation layer draws for one cluster.
#[derive(Debug, Clone, PartialEq)]
pub enum MapMarker {
    Provider {
        provider: Arc<Provider>,
        point: GeoPoint,
    },
    Badge {
        cluster_id: usize,
        count: usize,
        centroid: GeoPoint,
    },
}

impl Cluster {
    fn seed(id: usize, provider: Arc<Provider>, point: GeoPoint) -> Self {
        Self {
            id,
            centroid: point,
            members: vec![provider],
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn join(&mut self, provider: Arc<Provider>, point: GeoPoint) {
        self.members.push(provider);
        let n = self.members.len() as f64;
        self.centroid.lat += (point.lat - self.centroid.lat) / n;
        self.centroid.lng += (point.lng - self.centroid.lng) / n;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// A single-member cluster is a plain marker at the provider's own
    /// point; anything larger is a count badge at the centroid.
    #[must_use]
    pub fn marker(&self) -> MapMarker {
        match self.members.as_slice() {
            [only] => MapMarker::Provider {
                provider: Arc::clone(only),
                point: only.display_point().unwrap_or(self.centroid),
            },
            members => MapMarker::Badge {
                cluster_id: self.id,
                count: members.len(),
                centroid: self.centroid,
            },
        }
    }
}

/// Partitions `providers` into clusters.
///
/// Providers without a location are skipped. A radius of zero or less
/// disables merging entirely.
#[must_use]
pub fn cluster_providers(providers: &[Arc<Provider>], radius: ClusterRadius) -> Vec<Cluster> {
    let radius_km = radius.km();
    let mut clusters: Vec<Cluster> = Vec::new();

    for provider in providers {
        let Some(point) = provider.display_point() else {
            continue;
        };

        let target = clusters
            .iter_mut()
            .find(|cluster| distance_km(point, cluster.centroid) < radius_km);

        match target {
            Some(cluster) => cluster.join(Arc::clone(provider), point),
            None => {
                let id = clusters.len();
                clusters.push(Cluster::seed(id, Arc::clone(provider), point));
            }
        }
    }

    tracing::trace!(
        providers = providers.len(),
        clusters = clusters.len(),
        radius_km,
        "clustered providers"
    );
    clusters
}
