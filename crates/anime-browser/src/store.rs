//! Application state and its transitions.
//!
//! [`AppState`] is mutated only by [`AppState::apply`], one [`Action`] at a
//! time. A transition may ask for a fetch by returning an [`Effect`]; running
//! the effect is the caller's job. [`Store`] wraps the state and publishes a
//! read-only copy after every transition.

use jikan_client::{CatalogError, CatalogItem, RequestId, SearchPage};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::filters::FilterState;

/// Everything the views need to render
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub results: Vec<CatalogItem>,
    pub selected_item: Option<CatalogItem>,
    pub loading: bool,
    pub error: Option<String>,
    pub current_page: u32,
    pub total_pages: u32,
    pub committed_query: String,
    pub filters: FilterState,
    /// Most recently dispatched search; only its result may be applied
    latest_search: Option<RequestId>,
    /// Whether the latest search has yet to complete
    search_in_flight: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            results: Vec::new(),
            selected_item: None,
            loading: false,
            error: None,
            current_page: 1,
            total_pages: 1,
            committed_query: String::new(),
            filters: FilterState::default(),
            latest_search: None,
            search_in_flight: false,
        }
    }
}

/// Named state transitions
#[derive(Debug, Clone)]
pub enum Action {
    QueryCommitted(String),
    PageChanged(u32),
    SearchStarted(RequestId),
    SearchSucceeded(RequestId, SearchPage),
    SearchFailed(RequestId, CatalogError),
    DetailRequested(u32),
    DetailSucceeded(CatalogItem),
    DetailFailed(CatalogError),
    DetailCleared,
    /// The pending detail request will never be applied
    DetailAbandoned,
    ErrorCleared,
    FiltersChanged(FilterState),
    FiltersCleared,
}

/// Work a transition asks the caller to start
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Search { query: String, page: u32 },
    Detail { id: u32 },
}

impl AppState {
    /// Apply one transition
    pub fn apply(&mut self, action: Action) -> Option<Effect> {
        match action {
            Action::QueryCommitted(query) => {
                self.committed_query = query;
                self.current_page = 1;
                self.search_effect()
            }
            Action::PageChanged(page) => {
                if page < 1 || page > self.total_pages {
                    debug!(page = page, total_pages = self.total_pages, "Ignoring out-of-range page");
                    return None;
                }
                self.current_page = page;
                self.search_effect()
            }
            Action::SearchStarted(request) => {
                self.loading = true;
                self.error = None;
                self.latest_search = Some(request);
                self.search_in_flight = true;
                None
            }
            Action::SearchSucceeded(request, page) => {
                if !self.is_latest(request) {
                    debug!(request = request, "Dropping stale search result");
                    return None;
                }
                self.loading = false;
                self.search_in_flight = false;
                self.total_pages = page.last_page();
                self.results = page.data;
                self.error = None;
                None
            }
            Action::SearchFailed(_, CatalogError::Cancelled) => None,
            Action::SearchFailed(request, error) => {
                if !self.is_latest(request) {
                    debug!(request = request, error = %error, "Dropping stale search failure");
                    return None;
                }
                warn!(error = %error, "Search failed");
                self.loading = false;
                self.search_in_flight = false;
                self.error = Some(error.to_string());
                None
            }
            Action::DetailRequested(id) => {
                self.loading = true;
                self.error = None;
                self.selected_item = None;
                Some(Effect::Detail { id })
            }
            Action::DetailSucceeded(item) => {
                self.loading = false;
                self.selected_item = Some(item);
                self.error = None;
                None
            }
            Action::DetailFailed(error) => {
                warn!(error = %error, "Detail request failed");
                self.loading = false;
                self.error = Some(error.to_string());
                None
            }
            Action::DetailCleared => {
                self.selected_item = None;
                None
            }
            Action::DetailAbandoned => {
                if !self.search_in_flight {
                    self.loading = false;
                }
                None
            }
            Action::ErrorCleared => {
                self.error = None;
                None
            }
            Action::FiltersChanged(filters) => {
                self.filters = filters;
                None
            }
            Action::FiltersCleared => {
                self.filters = FilterState::default();
                None
            }
        }
    }

    fn is_latest(&self, request: RequestId) -> bool {
        self.latest_search == Some(request)
    }

    fn search_effect(&self) -> Option<Effect> {
        if self.committed_query.is_empty() {
            return None;
        }
        Some(Effect::Search {
            query: self.committed_query.clone(),
            page: self.current_page,
        })
    }

    /// Results on the current page that pass the active filters
    pub fn visible_results(&self) -> impl Iterator<Item = &CatalogItem> {
        self.results.iter().filter(|item| self.filters.matches(item))
    }

    pub fn has_previous_page(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next_page(&self) -> bool {
        self.current_page < self.total_pages
    }
}

/// Owner of the application state
#[derive(Debug)]
pub struct Store {
    state: AppState,
    tx: watch::Sender<AppState>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        let state = AppState::default();
        let (tx, _) = watch::channel(state.clone());
        Self { state, tx }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Read-only view of every published state
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.tx.subscribe()
    }

    /// Apply a transition and publish the result
    pub fn dispatch(&mut self, action: Action) -> Option<Effect> {
        let effect = self.state.apply(action);
        self.tx.send_replace(self.state.clone());
        effect
    }
}
