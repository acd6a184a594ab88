//! The application event loop.
//!
//! One task owns all mutable state. It waits on three sources at once: user
//! commands, the debounce timer and completions of the requests it started.
//! Every event is turned into store actions here, and a fresh [`Snapshot`]
//! is published after each one.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use jikan_client::{CatalogError, CatalogItem, CatalogSource, RequestCoordinator, RequestId};
use shared::KeyValueStore;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::bookmarks::{Bookmark, BookmarkSet};
use crate::debounce::QueryDebouncer;
use crate::store::{Action, AppState, Effect, Store};

/// Which view is on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    Search,
    Detail(u32),
    Bookmarks,
}

/// User intents coming from the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Raw search box contents after a keystroke
    Input(String),
    Page(u32),
    NextPage,
    PrevPage,
    Open(u32),
    Back,
    ToggleBookmark(u32),
    ShowBookmarks,
    /// `key=value` filter settings, applied on top of the current filters
    Filter(Vec<(String, String)>),
    ClearFilters,
    DismissError,
    Help,
    Quit,
}

/// Everything a view needs, published after every event
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub state: AppState,
    pub route: Route,
    pub bookmarks: Vec<Bookmark>,
    /// One-off message for the user (confirmations, input errors)
    pub notice: Option<String>,
}

impl Snapshot {
    pub fn is_bookmarked(&self, id: u32) -> bool {
        self.bookmarks.iter().any(|b| b.id() == id)
    }
}

/// Results of spawned requests
#[derive(Debug)]
enum Completion {
    Search(Action),
    Detail {
        request: RequestId,
        id: u32,
        result: Result<CatalogItem, CatalogError>,
    },
}

pub const HELP: &str = "\
type to search | :page N | :next | :prev | :open ID | :back
:save ID (toggle bookmark) | :saved | :filter type=tv status=airing rating=pg13 score=7
:clear-filters | :dismiss | :help | :quit";

pub struct App<S, K> {
    store: Store,
    coordinator: Arc<RequestCoordinator<S>>,
    debouncer: QueryDebouncer,
    bookmarks: BookmarkSet<K>,
    route: Route,
    notice: Option<String>,
    detail_requests: RequestId,
    /// Detail request whose completion may still be applied
    latest_detail: Option<RequestId>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    snapshots: watch::Sender<Snapshot>,
}

impl<S, K> App<S, K>
where
    S: CatalogSource + 'static,
    K: KeyValueStore,
{
    pub fn new(source: S, bookmarks: BookmarkSet<K>, debounce: Duration) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (snapshots, _) = watch::channel(Snapshot::default());

        let app = Self {
            store: Store::new(),
            coordinator: Arc::new(RequestCoordinator::new(source)),
            debouncer: QueryDebouncer::new(debounce),
            bookmarks,
            route: Route::Search,
            notice: None,
            detail_requests: 0,
            latest_detail: None,
            completions_tx,
            completions_rx,
            snapshots,
        };
        app.publish();
        app
    }

    /// Receive a snapshot after every handled event
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.subscribe()
    }

    pub fn state(&self) -> &AppState {
        self.store.state()
    }

    /// Run until `Quit` or until every command sender is gone
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) -> Result<()> {
        info!("Event loop started");

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Quit) | None => break,
                    Some(command) => self.handle(command),
                },
                query = self.debouncer.committed(), if self.debouncer.is_pending() => {
                    debug!(query = %query, "Query committed");
                    self.dispatch(Action::QueryCommitted(query));
                }
                Some(completion) = self.completions_rx.recv() => self.complete(completion),
            }
            self.publish();
        }

        self.debouncer.dispose();
        info!("Event loop stopped");
        Ok(())
    }

    fn handle(&mut self, command: Command) {
        debug!(?command, "Handling command");
        self.notice = None;

        match command {
            Command::Input(value) => {
                self.leave_detail();
                self.route = Route::Search;
                self.debouncer.input(value);
            }
            Command::Page(page) => self.change_page(page),
            Command::NextPage => self.change_page(self.state().current_page.saturating_add(1)),
            Command::PrevPage => self.change_page(self.state().current_page.saturating_sub(1)),
            Command::Open(id) => {
                self.leave_detail();
                self.route = Route::Detail(id);
                self.dispatch(Action::DetailRequested(id));
            }
            Command::Back => {
                self.leave_detail();
                self.route = Route::Search;
            }
            Command::ToggleBookmark(id) => self.toggle_bookmark(id),
            Command::ShowBookmarks => {
                self.leave_detail();
                self.route = Route::Bookmarks;
            }
            Command::Filter(pairs) => {
                let mut filters = self.state().filters.clone();
                for (key, value) in &pairs {
                    if let Err(e) = filters.set(key, value) {
                        self.notice = Some(e.to_string());
                        return;
                    }
                }
                self.dispatch(Action::FiltersChanged(filters));
            }
            Command::ClearFilters => self.dispatch(Action::FiltersCleared),
            Command::DismissError => self.dispatch(Action::ErrorCleared),
            Command::Help => self.notice = Some(HELP.to_string()),
            Command::Quit => {}
        }
    }

    fn change_page(&mut self, page: u32) {
        let total = self.state().total_pages;
        if page < 1 || page > total {
            self.notice = Some(format!("Page {} is out of range (1-{})", page, total));
        }
        self.leave_detail();
        self.route = Route::Search;
        self.dispatch(Action::PageChanged(page));
    }

    fn leave_detail(&mut self) {
        if matches!(self.route, Route::Detail(_)) {
            self.dispatch(Action::DetailCleared);
        }
        if let Some(request) = self.latest_detail.take() {
            debug!(request = request, "Abandoning detail request");
            self.dispatch(Action::DetailAbandoned);
        }
    }

    fn toggle_bookmark(&mut self, id: u32) {
        let state = self.store.state();
        let item = state
            .selected_item
            .iter()
            .chain(state.results.iter())
            .find(|item| item.mal_id == id)
            .cloned()
            .or_else(|| self.bookmarks.get(id).map(|b| b.item.clone()));

        let Some(item) = item else {
            self.notice = Some(format!("No anime with id {} on screen", id));
            return;
        };

        let title = item.title.clone();
        self.notice = Some(match self.bookmarks.toggle(item) {
            Ok(true) => format!("Saved {}", title),
            Ok(false) => format!("Removed {}", title),
            Err(e) => {
                warn!(id = id, error = %e, "Failed to update bookmarks");
                format!("Could not update bookmarks: {:#}", e)
            }
        });
    }

    fn dispatch(&mut self, action: Action) {
        if let Some(effect) = self.store.dispatch(action) {
            self.start(effect);
        }
    }

    fn start(&mut self, effect: Effect) {
        let tx = self.completions_tx.clone();
        let coordinator = self.coordinator.clone();

        match effect {
            Effect::Search { query, page } => {
                let ticket = coordinator.begin();
                let request = ticket.id();
                self.store.dispatch(Action::SearchStarted(request));

                tokio::spawn(async move {
                    let action = match coordinator.run(&ticket, &query, page).await {
                        Ok(results) => Action::SearchSucceeded(request, results),
                        Err(e) => Action::SearchFailed(request, e),
                    };
                    // A closed channel means the loop has stopped
                    let _ = tx.send(Completion::Search(action));
                });
            }
            Effect::Detail { id } => {
                self.detail_requests += 1;
                let request = self.detail_requests;
                self.latest_detail = Some(request);

                tokio::spawn(async move {
                    let result = coordinator.fetch_detail(id).await;
                    let _ = tx.send(Completion::Detail {
                        request,
                        id,
                        result,
                    });
                });
            }
        }
    }

    fn complete(&mut self, completion: Completion) {
        match completion {
            Completion::Search(action) => self.dispatch(action),
            Completion::Detail {
                request,
                id,
                result,
            } => {
                if self.latest_detail != Some(request) {
                    debug!(request = request, id = id, "Dropping stale detail result");
                    return;
                }
                self.latest_detail = None;
                match result {
                    Ok(item) => self.dispatch(Action::DetailSucceeded(item)),
                    Err(e) => self.dispatch(Action::DetailFailed(e)),
                }
            }
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(Snapshot {
            state: self.store.state().clone(),
            route: self.route,
            bookmarks: self.bookmarks.iter().cloned().collect(),
            notice: self.notice.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jikan_client::api::Pagination;
    use jikan_client::SearchPage;
    use shared::MemoryStore;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::{sleep, timeout};

    const DEBOUNCE: Duration = Duration::from_millis(250);

    /// Catalog answering after a per-query delay; every query has 5 pages
    #[derive(Default)]
    struct ScriptedSource {
        delays: HashMap<String, Duration>,
        detail_delays: HashMap<u32, Duration>,
        searches: Arc<AtomicUsize>,
    }

    fn item(id: u32, title: &str) -> CatalogItem {
        serde_json::from_value(serde_json::json!({ "mal_id": id, "title": title, "type": "TV" }))
            .unwrap()
    }

    impl CatalogSource for ScriptedSource {
        async fn search(&self, query: &str, page: u32) -> Result<SearchPage, CatalogError> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delays.get(query) {
                sleep(*delay).await;
            }
            Ok(SearchPage {
                data: (0..20).map(|i| item(page * 100 + i, query)).collect(),
                pagination: Pagination {
                    last_visible_page: 5,
                    has_next_page: page < 5,
                    current_page: page,
                    items: None,
                },
            })
        }

        async fn get_by_id(&self, id: u32) -> Result<CatalogItem, CatalogError> {
            if let Some(delay) = self.detail_delays.get(&id) {
                sleep(*delay).await;
            }
            if id == 5114 {
                return Err(CatalogError::Network("connection reset".into()));
            }
            Ok(item(id, "detail"))
        }
    }

    struct Harness {
        commands: mpsc::Sender<Command>,
        snapshots: watch::Receiver<Snapshot>,
        searches: Arc<AtomicUsize>,
        handle: tokio::task::JoinHandle<Result<()>>,
    }

    fn start(delays: &[(&str, u64)]) -> Harness {
        start_with(ScriptedSource {
            delays: delays
                .iter()
                .map(|(q, ms)| (q.to_string(), Duration::from_millis(*ms)))
                .collect(),
            ..Default::default()
        })
    }

    fn start_with(source: ScriptedSource) -> Harness {
        let searches = source.searches.clone();
        let app = App::new(
            source,
            BookmarkSet::load(MemoryStore::new(), "savedAnime"),
            DEBOUNCE,
        );
        let snapshots = app.subscribe();
        let (commands, rx) = mpsc::channel(16);
        let handle = tokio::spawn(app.run(rx));

        Harness {
            commands,
            snapshots,
            searches,
            handle,
        }
    }

    impl Harness {
        async fn send(&self, command: Command) {
            self.commands.send(command).await.unwrap();
        }

        async fn until(&mut self, condition: impl FnMut(&Snapshot) -> bool) -> Snapshot {
            timeout(Duration::from_secs(30), self.snapshots.wait_for(condition))
                .await
                .expect("condition not reached")
                .unwrap()
                .clone()
        }
    }

    fn settled_with(query: &'static str) -> impl FnMut(&Snapshot) -> bool {
        move |s| {
            !s.state.loading
                && s.state.results.first().is_some_and(|i| i.title == query)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_burst_issues_one_search() {
        let mut harness = start(&[]);

        for value in ["b", "be", "beb", "bebop"] {
            harness.send(Command::Input(value.into())).await;
            sleep(Duration::from_millis(50)).await;
        }

        let snapshot = harness.until(settled_with("bebop")).await;
        assert_eq!(snapshot.state.committed_query, "bebop");
        assert_eq!(snapshot.state.current_page, 1);
        assert_eq!(harness.searches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_search_is_not_applied() {
        let mut harness = start(&[("a", 1_000), ("ab", 100)]);

        harness.send(Command::Input("a".into())).await;
        harness.until(|s| s.state.loading && s.state.committed_query == "a").await;

        harness.send(Command::Input("ab".into())).await;
        let snapshot = harness.until(settled_with("ab")).await;
        assert_eq!(snapshot.state.error, None);

        // Long after the older request would have finished
        sleep(Duration::from_secs(5)).await;
        let snapshot = harness.snapshots.borrow().clone();
        assert!(snapshot.state.results.iter().all(|i| i.title == "ab"));
        assert_eq!(snapshot.state.error, None);
        assert!(!snapshot.state.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_change_fetches_next_page() {
        let mut harness = start(&[]);

        harness.send(Command::Input("naruto".into())).await;
        let snapshot = harness.until(settled_with("naruto")).await;
        assert_eq!(snapshot.state.results.len(), 20);
        assert_eq!(snapshot.state.total_pages, 5);

        harness.send(Command::Page(2)).await;
        let snapshot = harness
            .until(|s| !s.state.loading && s.state.results[0].mal_id == 200)
            .await;
        assert_eq!(snapshot.state.current_page, 2);
        assert_eq!(snapshot.state.results.len(), 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_out_of_range_page_is_reported() {
        let mut harness = start(&[]);

        harness.send(Command::Input("naruto".into())).await;
        harness.until(settled_with("naruto")).await;

        harness.send(Command::Page(9)).await;
        let snapshot = harness.until(|s| s.notice.is_some()).await;
        assert_eq!(snapshot.state.current_page, 1);
        assert_eq!(harness.searches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_detail_failure_sets_error() {
        let mut harness = start(&[]);

        harness.send(Command::Open(5114)).await;
        let snapshot = harness
            .until(|s| !s.state.loading && s.state.error.is_some())
            .await;

        assert_eq!(snapshot.route, Route::Detail(5114));
        assert_eq!(snapshot.state.selected_item, None);
        assert!(!snapshot.state.error.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_detail_then_back_clears_selection() {
        let mut harness = start(&[]);

        harness.send(Command::Open(1)).await;
        harness.until(|s| s.state.selected_item.is_some()).await;

        harness.send(Command::Back).await;
        let snapshot = harness.until(|s| s.route == Route::Search).await;
        assert_eq!(snapshot.state.selected_item, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_page_from_detail_clears_selection() {
        let mut harness = start(&[]);

        harness.send(Command::Input("naruto".into())).await;
        harness.until(settled_with("naruto")).await;

        harness.send(Command::Open(100)).await;
        harness
            .until(|s| s.state.selected_item.as_ref().is_some_and(|i| i.mal_id == 100))
            .await;

        harness.send(Command::NextPage).await;
        let snapshot = harness
            .until(|s| s.route == Route::Search && s.state.current_page == 2)
            .await;
        assert_eq!(snapshot.state.selected_item, None);

        let snapshot = harness
            .until(|s| !s.state.loading && s.state.results[0].mal_id == 200)
            .await;
        assert_eq!(snapshot.state.selected_item, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_detail_is_not_applied() {
        let mut harness = start_with(ScriptedSource {
            detail_delays: [(1, Duration::from_millis(100)), (2, Duration::from_millis(500))]
                .into_iter()
                .collect(),
            ..Default::default()
        });

        harness.send(Command::Open(1)).await;
        harness.send(Command::Open(2)).await;

        // Item 1 has arrived by now and must not end the wait for item 2
        sleep(Duration::from_millis(200)).await;
        let snapshot = harness.snapshots.borrow().clone();
        assert_eq!(snapshot.route, Route::Detail(2));
        assert!(snapshot.state.loading);
        assert_eq!(snapshot.state.selected_item, None);

        let snapshot = harness.until(|s| !s.state.loading).await;
        assert_eq!(snapshot.state.selected_item.map(|i| i.mal_id), Some(2));
        assert_eq!(snapshot.state.error, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_leaving_pending_detail_stops_loading() {
        let mut harness = start_with(ScriptedSource {
            detail_delays: [(5114, Duration::from_millis(300))].into_iter().collect(),
            ..Default::default()
        });

        harness.send(Command::Open(5114)).await;
        harness.until(|s| s.state.loading).await;

        harness.send(Command::Back).await;
        let snapshot = harness.until(|s| s.route == Route::Search).await;
        assert!(!snapshot.state.loading);

        // The late failure belongs to a closed view
        sleep(Duration::from_secs(1)).await;
        let snapshot = harness.snapshots.borrow().clone();
        assert_eq!(snapshot.state.error, None);
        assert!(!snapshot.state.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bookmark_toggle_from_results() {
        let mut harness = start(&[]);

        harness.send(Command::Input("monster".into())).await;
        harness.until(settled_with("monster")).await;

        harness.send(Command::ToggleBookmark(105)).await;
        let snapshot = harness.until(|s| s.is_bookmarked(105)).await;
        assert_eq!(snapshot.bookmarks.len(), 1);

        harness.send(Command::ShowBookmarks).await;
        harness.send(Command::ToggleBookmark(105)).await;
        let snapshot = harness
            .until(|s| s.route == Route::Bookmarks && s.bookmarks.is_empty())
            .await;
        assert!(!snapshot.is_bookmarked(105));
    }

    #[tokio::test(start_paused = true)]
    async fn test_filter_command() {
        let mut harness = start(&[]);

        harness
            .send(Command::Filter(vec![("type".into(), "movie".into())]))
            .await;
        let snapshot = harness.until(|s| s.state.filters.active_count() == 1).await;
        assert_eq!(snapshot.state.visible_results().count(), 0);

        harness
            .send(Command::Filter(vec![("rating".into(), "nc17".into())]))
            .await;
        let snapshot = harness.until(|s| s.notice.is_some()).await;
        assert_eq!(snapshot.state.filters.active_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_quit_discards_pending_input() {
        let harness = start(&[]);

        harness.send(Command::Input("trigun".into())).await;
        harness.send(Command::Quit).await;

        harness.handle.await.unwrap().unwrap();
        sleep(Duration::from_secs(1)).await;
        assert_eq!(harness.searches.load(Ordering::SeqCst), 0);
    }
}
