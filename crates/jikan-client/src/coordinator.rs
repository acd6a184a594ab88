//! Last-writer-wins coordination of search requests.
//!
//! Only the most recently issued search may complete meaningfully. Starting a
//! search cancels the previous one; a cancelled search resolves with
//! [`CatalogError::Cancelled`]. Each search also carries a [`RequestId`] so
//! consumers can check at apply time that a result still belongs to the
//! latest request.

use std::sync::{Mutex, MutexGuard};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::{CatalogError, CatalogItem, SearchPage};
use crate::source::CatalogSource;

/// Generation number of a dispatched search, increasing from 1
pub type RequestId = u64;

/// Handle for one dispatched search
#[derive(Debug, Clone)]
pub struct SearchTicket {
    id: RequestId,
    token: CancellationToken,
}

impl SearchTicket {
    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[derive(Debug, Default)]
struct Current {
    generation: RequestId,
    token: Option<CancellationToken>,
}

/// Serializes search requests against a [`CatalogSource`]
#[derive(Debug)]
pub struct RequestCoordinator<S> {
    source: S,
    current: Mutex<Current>,
}

impl<S: CatalogSource> RequestCoordinator<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            current: Mutex::new(Current::default()),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn current(&self) -> MutexGuard<'_, Current> {
        // The guarded data is two plain values; a panic cannot leave it torn.
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start a new search generation, cancelling the previous one
    pub fn begin(&self) -> SearchTicket {
        let mut current = self.current();

        if let Some(previous) = current.token.take() {
            if !previous.is_cancelled() {
                debug!(request = current.generation, "Cancelling superseded search");
            }
            previous.cancel();
        }

        current.generation += 1;
        let token = CancellationToken::new();
        current.token = Some(token.clone());

        SearchTicket {
            id: current.generation,
            token,
        }
    }

    /// Whether `id` is still the latest search generation
    pub fn is_current(&self, id: RequestId) -> bool {
        self.current().generation == id
    }

    /// Run the search for a ticket obtained from [`begin`](Self::begin)
    pub async fn run(
        &self,
        ticket: &SearchTicket,
        query: &str,
        page: u32,
    ) -> Result<SearchPage, CatalogError> {
        let result = tokio::select! {
            biased;
            _ = ticket.token.cancelled() => Err(CatalogError::Cancelled),
            result = self.source.search(query, page) => result,
        };

        if !self.is_current(ticket.id) {
            debug!(request = ticket.id, query = query, "Discarding superseded search result");
            return Err(CatalogError::Cancelled);
        }

        result
    }

    /// Start and run a search, superseding any search still in flight
    pub async fn search(&self, query: &str, page: u32) -> Result<SearchPage, CatalogError> {
        let ticket = self.begin();
        self.run(&ticket, query, page).await
    }

    /// Fetch one entry; detail requests are never cancelled
    pub async fn fetch_detail(&self, id: u32) -> Result<CatalogItem, CatalogError> {
        self.source.get_by_id(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Images, Pagination};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Source answering each query after a fixed delay
    #[derive(Default)]
    struct DelayedSource {
        delays: HashMap<String, Duration>,
        calls: AtomicUsize,
    }

    impl DelayedSource {
        fn with(delays: &[(&str, u64)]) -> Self {
            Self {
                delays: delays
                    .iter()
                    .map(|(q, ms)| (q.to_string(), Duration::from_millis(*ms)))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    fn item(id: u32, title: &str) -> CatalogItem {
        CatalogItem {
            mal_id: id,
            images: Images::default(),
            title: title.to_string(),
            title_english: None,
            title_japanese: None,
            kind: None,
            episodes: None,
            status: None,
            aired: None,
            rating: None,
            year: None,
            score: None,
            synopsis: None,
            genres: Vec::new(),
            studios: Vec::new(),
        }
    }

    impl CatalogSource for DelayedSource {
        async fn search(&self, query: &str, page: u32) -> Result<SearchPage, CatalogError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = self.delays.get(query).copied().unwrap_or_default();
            tokio::time::sleep(delay).await;
            Ok(SearchPage {
                data: vec![item(1, query)],
                pagination: Pagination {
                    last_visible_page: 1,
                    has_next_page: false,
                    current_page: page,
                    items: None,
                },
            })
        }

        async fn get_by_id(&self, id: u32) -> Result<CatalogItem, CatalogError> {
            if id == 0 {
                return Err(CatalogError::Http { status: 404 });
            }
            Ok(item(id, "detail"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_search_cancels_older() {
        let coordinator = Arc::new(RequestCoordinator::new(DelayedSource::with(&[
            ("a", 100),
            ("ab", 50),
        ])));

        let first = coordinator.begin();
        let older = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.run(&first, "a", 1).await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        let newer = coordinator.search("ab", 1).await.unwrap();

        assert_eq!(newer.data[0].title, "ab");
        assert_eq!(older.await.unwrap(), Err(CatalogError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_newer_search_still_wins() {
        let coordinator = Arc::new(RequestCoordinator::new(DelayedSource::with(&[
            ("a", 20),
            ("ab", 200),
        ])));

        let first = coordinator.begin();
        let second = coordinator.begin();
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());

        let (older, newer) = tokio::join!(
            coordinator.run(&first, "a", 1),
            coordinator.run(&second, "ab", 1)
        );

        assert_eq!(older, Err(CatalogError::Cancelled));
        assert_eq!(newer.unwrap().data[0].title, "ab");
    }

    #[tokio::test]
    async fn test_cancelled_ticket_never_reaches_source() {
        let coordinator = RequestCoordinator::new(DelayedSource::default());

        let stale = coordinator.begin();
        let _fresh = coordinator.begin();

        assert_eq!(coordinator.run(&stale, "a", 1).await, Err(CatalogError::Cancelled));
        assert_eq!(coordinator.source().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_sequential_searches_both_complete() {
        let coordinator = RequestCoordinator::new(DelayedSource::default());

        let first = coordinator.search("naruto", 1).await.unwrap();
        let second = coordinator.search("naruto", 2).await.unwrap();

        assert_eq!(first.current_page(), 1);
        assert_eq!(second.current_page(), 2);
        assert!(coordinator.is_current(2));
        assert!(!coordinator.is_current(1));
    }

    #[tokio::test]
    async fn test_fetch_detail_is_not_cancelled_by_search() {
        let coordinator = RequestCoordinator::new(DelayedSource::default());

        let _ticket = coordinator.begin();
        assert_eq!(coordinator.fetch_detail(5114).await.unwrap().mal_id, 5114);
        assert_eq!(
            coordinator.fetch_detail(0).await,
            Err(CatalogError::Http { status: 404 })
        );
    }
}
