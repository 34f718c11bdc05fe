//! Map-screen facade over the search API, the page state and clustering.
//!
//! All session state sits behind one mutex that is never held across an
//! `.await`. A fetch takes its ticket under the lock, performs the request
//! unlocked, then re-locks to merge the answer, so completions are applied
//! one at a time and in full.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use provmap_client::{ClientError, SearchFilters, SearchQuery, SearchRequest};
use provmap_core::{AppConfig, Provider, Viewport};

use crate::api::SearchApi;
use crate::cluster::{cluster_providers, Cluster, ClusterRadius, MapMarker};
use crate::pagination::{FetchOutcome, FetchTicket, LoadState, PageState};
use crate::viewport::ViewportChangeDetector;

/// Starting point of a directory: the fixed query and the first viewport.
#[derive(Debug, Clone)]
pub struct DirectoryOptions {
    pub query: SearchQuery,
    pub initial_viewport: Viewport,
}

impl DirectoryOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            query: SearchQuery::new(config.page_size),
            initial_viewport: config.initial_viewport,
        }
    }
}

/// Everything the presentation layer needs to draw one frame.
#[derive(Debug, Clone)]
pub struct DirectorySnapshot {
    pub clusters: Vec<Cluster>,
    pub state: LoadState,
    pub error: Option<String>,
    /// Providers accumulated so far.
    pub shown: usize,
    pub total_results: u64,
    pub current_page: u32,
    pub total_pages: u32,
    pub providers_in_viewport: Option<u32>,
    pub viewport: Viewport,
}

impl DirectorySnapshot {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    #[must_use]
    pub fn has_more(&self) -> bool {
        self.current_page < self.total_pages
    }

    #[must_use]
    pub fn markers(&self) -> Vec<MapMarker> {
        self.clusters.iter().map(Cluster::marker).collect()
    }

    /// "Showing N of M providers".
    #[must_use]
    pub fn progress(&self) -> String {
        format!(
            "Showing {} of {} providers",
            self.shown, self.total_results
        )
    }
}

struct Session {
    pages: PageState,
    detector: ViewportChangeDetector,
    /// Most recently reported viewport.
    viewport: Viewport,
    /// Viewport the current session searches; later pages stay on it.
    fetched_viewport: Option<Viewport>,
    query: SearchQuery,
    radius: ClusterRadius,
    clusters: Vec<Cluster>,
}

struct PendingFetch {
    ticket: FetchTicket,
    request: SearchRequest,
}

impl Session {
    fn recluster(&mut self) {
        self.radius = ClusterRadius::for_viewport(&self.viewport);
        self.clusters = cluster_providers(self.pages.providers(), self.radius);
    }

    fn pending(&self, ticket: FetchTicket) -> PendingFetch {
        let viewport = self.fetched_viewport.unwrap_or(self.viewport);
        PendingFetch {
            ticket,
            request: self.query.request(&viewport, ticket.page()),
        }
    }

    fn start_new_session(&mut self) -> Result<PendingFetch, FetchOutcome> {
        self.pages.reset_session();
        self.clusters.clear();
        self.fetched_viewport = Some(self.viewport);
        let ticket = self.pages.begin_fetch(1)?;
        Ok(self.pending(ticket))
    }
}

fn lock(session: &Mutex<Session>) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Releases the ticket if the fetch future is dropped before the request
/// completes, so the page state cannot stay `Loading` forever.
struct InFlight<'a> {
    session: &'a Mutex<Session>,
    ticket: Option<FetchTicket>,
}

impl InFlight<'_> {
    fn disarm(mut self) {
        self.ticket = None;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            tracing::warn!(page = ticket.page(), "fetch dropped before completion");
            lock(self.session).pages.abandon_fetch(ticket);
        }
    }
}

/// Viewport-driven provider directory for one map screen.
pub struct ProviderDirectory<A> {
    api: A,
    session: Mutex<Session>,
}

impl<A: SearchApi> ProviderDirectory<A> {
    #[must_use]
    pub fn new(api: A, options: DirectoryOptions) -> Self {
        let viewport = options.initial_viewport;
        let session = Session {
            pages: PageState::new(),
            detector: ViewportChangeDetector::new(),
            viewport,
            fetched_viewport: None,
            query: options.query,
            radius: ClusterRadius::for_viewport(&viewport),
            clusters: Vec::new(),
        };
        Self {
            api,
            session: Mutex::new(session),
        }
    }

    #[must_use]
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Signals that the map surface finished its initial layout and starts
    /// the first search over the current viewport.
    ///
    /// Only the first call searches; later calls return
    /// [`FetchOutcome::AlreadyReady`] and leave the session alone.
    pub async fn mark_display_ready(&self) -> FetchOutcome {
        let pending = {
            let mut session = lock(&self.session);
            if session.detector.is_display_ready() {
                return FetchOutcome::AlreadyReady;
            }
            session.detector.mark_display_ready();
            tracing::info!(viewport = ?session.viewport, "display ready, starting initial search");
            session.start_new_session()
        };
        self.run(pending).await
    }

    /// Records a new viewport and refetches if it moved far enough from the
    /// previously reported one.
    ///
    /// Returns `None` when no refetch was warranted. While a fetch is in
    /// flight a warranted refetch is not started and
    /// `Some(FetchOutcome::Ignored)` is returned; the visible results stay.
    pub async fn update_viewport(&self, viewport: Viewport) -> Option<FetchOutcome> {
        let pending = {
            let mut session = lock(&self.session);
            let previous = session.viewport;
            session.viewport = viewport;
            if ClusterRadius::for_viewport(&viewport) != session.radius {
                session.recluster();
            }

            if !session.detector.should_refetch(&viewport, &previous) {
                return None;
            }
            if session.pages.is_loading() {
                tracing::debug!(?viewport, "viewport moved during a fetch, not refetching");
                return Some(FetchOutcome::Ignored);
            }
            tracing::info!(?viewport, "viewport moved, starting new search");
            session.start_new_session()
        };
        Some(self.run(pending).await)
    }

    /// Replaces the search filters and starts a new session with them.
    ///
    /// Before the display is ready the filters are only stored and
    /// [`FetchOutcome::DisplayNotReady`] is returned; the initial search
    /// will use them.
    pub async fn set_filters(&self, filters: SearchFilters) -> FetchOutcome {
        let pending = {
            let mut session = lock(&self.session);
            session.query.filters = filters;
            if !session.detector.is_display_ready() {
                return FetchOutcome::DisplayNotReady;
            }
            tracing::info!(filters = ?session.query.filters, "filters changed, starting new search");
            session.start_new_session()
        };
        self.run(pending).await
    }

    /// Fetches the next page of the current session, if there is one.
    pub async fn load_more(&self) -> FetchOutcome {
        let pending = {
            let mut session = lock(&self.session);
            session
                .pages
                .load_next_page()
                .map(|ticket| session.pending(ticket))
        };
        self.run(pending).await
    }

    /// Re-issues the page whose fetch failed.
    pub async fn retry(&self) -> FetchOutcome {
        let pending = {
            let mut session = lock(&self.session);
            session.pages.retry().map(|ticket| session.pending(ticket))
        };
        self.run(pending).await
    }

    /// Looks a single provider up by id.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] for an unknown id and any other
    /// [`ClientError`] the search API produces.
    pub async fn provider_details(&self, provider_id: i64) -> Result<Provider, ClientError> {
        tracing::debug!(provider_id, "loading provider details");
        self.api.provider(provider_id).await
    }

    #[must_use]
    pub fn snapshot(&self) -> DirectorySnapshot {
        let session = lock(&self.session);
        DirectorySnapshot {
            clusters: session.clusters.clone(),
            state: session.pages.state(),
            error: session.pages.error().map(str::to_owned),
            shown: session.pages.providers().len(),
            total_results: session.pages.total_results(),
            current_page: session.pages.current_page(),
            total_pages: session.pages.total_pages(),
            providers_in_viewport: session.pages.providers_in_viewport(),
            viewport: session.viewport,
        }
    }

    /// Accumulated providers in the order they were received.
    #[must_use]
    pub fn providers(&self) -> Vec<Arc<Provider>> {
        lock(&self.session).pages.providers().to_vec()
    }

    async fn run(&self, pending: Result<PendingFetch, FetchOutcome>) -> FetchOutcome {
        let PendingFetch { ticket, request } = match pending {
            Ok(pending) => pending,
            Err(outcome) => return outcome,
        };

        let guard = InFlight {
            session: &self.session,
            ticket: Some(ticket),
        };
        let result = self.api.search(&request).await;
        guard.disarm();

        let mut session = lock(&self.session);
        let outcome = session.pages.complete_fetch(ticket, result);
        match &outcome {
            FetchOutcome::Loaded { page, added } => {
                session.recluster();
                tracing::info!(
                    page,
                    added,
                    shown = session.pages.providers().len(),
                    total_results = session.pages.total_results(),
                    clusters = session.clusters.len(),
                    "providers loaded"
                );
            }
            FetchOutcome::Failed { page, error } => {
                tracing::warn!(page, error = %error, "provider search failed");
            }
            FetchOutcome::Ignored
            | FetchOutcome::NoMorePages
            | FetchOutcome::NothingToRetry
            | FetchOutcome::Stale
            | FetchOutcome::DisplayNotReady
            | FetchOutcome::AlreadyReady => {}
        }
        outcome
    }
}
