//! Load state and result accumulation for one search session.
//!
//! [`PageState`] never performs I/O. A fetch is split around its single
//! suspension point: [`PageState::begin_fetch`] hands out a [`FetchTicket`],
//! the caller issues the request, and [`PageState::complete_fetch`] merges the
//! answer. Tickets carry the session they were issued in, so completions that
//! outlive a [`PageState::reset_session`] are recognised and dropped.

use std::collections::HashSet;
use std::sync::Arc;

use provmap_client::{ClientError, SearchResponse};
use provmap_core::Provider;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed,
}

/// Proof that a fetch was started; required to apply its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    session: u64,
    page: u32,
}

impl FetchTicket {
    #[must_use]
    pub fn session(self) -> u64 {
        self.session
    }

    #[must_use]
    pub fn page(self) -> u32 {
        self.page
    }
}

/// Result of asking for, or completing, a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The page was merged; `added` counts providers not seen before.
    Loaded { page: u32, added: usize },
    /// The request failed; accumulated providers are untouched.
    Failed { page: u32, error: String },
    /// A fetch was already in flight, so nothing was started.
    Ignored,
    /// The last page has already been loaded.
    NoMorePages,
    /// Retry was requested but the last fetch did not fail.
    NothingToRetry,
    /// The session was reset while the request was in flight.
    Stale,
    /// The display surface has not finished initializing, so no search
    /// was started.
    DisplayNotReady,
    /// The display was already marked ready; the initial search is not
    /// repeated.
    AlreadyReady,
}

const CANCELLED: &str = "fetch cancelled";

#[derive(Debug, Clone, PartialEq)]
pub struct PageState {
    session: u64,
    state: LoadState,
    current_page: u32,
    total_pages: u32,
    total_results: u64,
    providers: Vec<Arc<Provider>>,
    seen: HashSet<i64>,
    error: Option<String>,
    in_flight: Option<FetchTicket>,
    failed_page: Option<u32>,
    providers_in_viewport: Option<u32>,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            session: 0,
            state: LoadState::Idle,
            current_page: 1,
            total_pages: 1,
            total_results: 0,
            providers: Vec::new(),
            seen: HashSet::new(),
            error: None,
            in_flight: None,
            failed_page: None,
            providers_in_viewport: None,
        }
    }
}

impl PageState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new session: drops everything accumulated and invalidates
    /// any outstanding ticket.
    pub fn reset_session(&mut self) {
        let session = self.session.wrapping_add(1);
        *self = Self {
            session,
            ..Self::default()
        };
        tracing::debug!(session, "search session reset");
    }

    /// Moves to `Loading` for `page` (at least 1).
    ///
    /// # Errors
    ///
    /// [`FetchOutcome::Ignored`] if a fetch is already in flight; the state
    /// is left unchanged.
    pub fn begin_fetch(&mut self, page: u32) -> Result<FetchTicket, FetchOutcome> {
        if self.state == LoadState::Loading {
            tracing::debug!(session = self.session, page, "fetch already in flight, ignoring");
            return Err(FetchOutcome::Ignored);
        }
        let ticket = FetchTicket {
            session: self.session,
            page: page.max(1),
        };
        self.state = LoadState::Loading;
        self.error = None;
        self.in_flight = Some(ticket);
        Ok(ticket)
    }

    /// Starts fetching the page after the current one.
    ///
    /// # Errors
    ///
    /// [`FetchOutcome::Ignored`] while loading and [`FetchOutcome::NoMorePages`]
    /// once the last page is in; neither changes the state.
    pub fn load_next_page(&mut self) -> Result<FetchTicket, FetchOutcome> {
        if self.state == LoadState::Loading {
            return Err(FetchOutcome::Ignored);
        }
        if !self.has_more_pages() {
            return Err(FetchOutcome::NoMorePages);
        }
        self.begin_fetch(self.current_page + 1)
    }

    /// Re-issues the page whose fetch failed.
    ///
    /// # Errors
    ///
    /// [`FetchOutcome::Ignored`] while loading, [`FetchOutcome::NothingToRetry`]
    /// unless the state is `Failed`.
    pub fn retry(&mut self) -> Result<FetchTicket, FetchOutcome> {
        match self.state {
            LoadState::Loading => Err(FetchOutcome::Ignored),
            LoadState::Failed => {
                let page = self.failed_page.unwrap_or(self.current_page);
                self.begin_fetch(page)
            }
            LoadState::Idle | LoadState::Loaded => Err(FetchOutcome::NothingToRetry),
        }
    }

    /// Applies the result of the fetch identified by `ticket`.
    ///
    /// Page 1 replaces the accumulation; later pages append providers whose
    /// id is not present yet. On failure the accumulation is kept and the
    /// error message recorded. A ticket that is not the one in flight
    /// yields [`FetchOutcome::Stale`] and changes nothing.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<SearchResponse, ClientError>,
    ) -> FetchOutcome {
        if self.in_flight != Some(ticket) {
            tracing::debug!(
                session = self.session,
                ticket_session = ticket.session,
                page = ticket.page,
                "discarding stale fetch result"
            );
            return FetchOutcome::Stale;
        }
        self.in_flight = None;
        let page = ticket.page;

        match result {
            Ok(response) => {
                if page == 1 {
                    self.providers.clear();
                    self.seen.clear();
                }
                let before = self.providers.len();
                for provider in response.providers {
                    if self.seen.insert(provider.id) {
                        self.providers.push(Arc::new(provider));
                    }
                }
                let added = self.providers.len() - before;

                self.current_page = page;
                self.total_pages = response.total_pages.max(1);
                self.total_results = response.total_count;
                self.providers_in_viewport = response.viewport_metadata.providers_in_viewport;
                self.state = LoadState::Loaded;
                self.failed_page = None;
                tracing::debug!(
                    session = self.session,
                    page,
                    added,
                    shown = self.providers.len(),
                    total_results = self.total_results,
                    "page merged"
                );
                FetchOutcome::Loaded { page, added }
            }
            Err(e) => {
                let error = e.to_string();
                self.fail(page, error.clone());
                FetchOutcome::Failed { page, error }
            }
        }
    }

    /// Releases a ticket whose request will never complete, leaving the
    /// state `Failed` so the page can be retried.
    pub fn abandon_fetch(&mut self, ticket: FetchTicket) {
        if self.in_flight == Some(ticket) {
            self.in_flight = None;
            self.fail(ticket.page, CANCELLED.to_owned());
        }
    }

    fn fail(&mut self, page: u32, error: String) {
        self.state = LoadState::Failed;
        self.error = Some(error);
        self.failed_page = Some(page);
    }

    #[must_use]
    pub fn session(&self) -> u64 {
        self.session
    }

    #[must_use]
    pub fn state(&self) -> LoadState {
        self.state
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    #[must_use]
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    #[must_use]
    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    #[must_use]
    pub fn total_results(&self) -> u64 {
        self.total_results
    }

    #[must_use]
    pub fn has_more_pages(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// Accumulated providers in insertion order, unique by id.
    #[must_use]
    pub fn providers(&self) -> &[Arc<Provider>] {
        &self.providers
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn providers_in_viewport(&self) -> Option<u32> {
        self.providers_in_viewport
    }
}
