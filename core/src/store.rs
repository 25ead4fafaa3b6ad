//! Client-side synchronization store for the song collection.
//!
//! # Design
//! `SongStore` is the only writer of the collection state. Views read
//! snapshots through [`SongStore::state`] or a [`Subscription`] and change
//! things only by calling intents.
//!
//! - Loads are tagged with an increasing sequence number when issued. A
//!   response is applied only while its number is still the latest; anything
//!   older is dropped without touching state or reporting an error.
//! - Writes (`create`, `update`, `remove`) patch `items` only after the server
//!   confirms them. A failed write returns its error and leaves state alone.
//! - Writes do not re-fetch the page, so a created song is appended even if
//!   the active sort or filter would place it elsewhere. Call
//!   [`SongStore::refresh`] to resynchronise with the server.
//!
//! State sits behind a `std::sync::Mutex` that is released before any
//! `.await` and before listeners run. Listeners run under a separate delivery
//! lock, one snapshot at a time and in revision order, so a listener must not
//! block on another store intent.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::{debug, warn};

use crate::api::SongApi;
use crate::error::ApiError;
use crate::types::{Song, SongDraft, SongId, SongQuery, SortOrder};

/// Progress of the most recently issued load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(String),
}

/// Read-only snapshot of the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreState {
    /// Songs of the current page, in server order.
    pub items: Vec<Song>,
    /// Songs matching the current filter across all pages.
    pub total_count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    /// Query that produced `items`.
    pub query: SongQuery,
    pub status: LoadStatus,
}

impl StoreState {
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }

    /// Reason of the last failed load, if the latest load failed.
    pub fn error(&self) -> Option<&str> {
        match &self.status {
            LoadStatus::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn find(&self, id: SongId) -> Option<&Song> {
        self.items.iter().find(|song| song.id == id)
    }
}

/// What happened to a load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The response replaced the current page.
    Applied,
    /// A newer load was issued before this one resolved; its result was dropped.
    Superseded,
    /// No adjacent page exists, so nothing was requested.
    Unavailable,
}

pub type Listener = Arc<dyn Fn(&StoreState) + Send + Sync>;

type SubscriptionId = u64;
type Listeners = Mutex<HashMap<SubscriptionId, Listener>>;

/// Registration of a state listener. Dropping it unsubscribes.
#[must_use = "dropping a Subscription removes the listener"]
pub struct Subscription {
    id: SubscriptionId,
    listeners: Weak<Listeners>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            lock(&*listeners).remove(&self.id);
        }
    }
}

struct Inner {
    state: StoreState,
    /// Last query handed to `load`, including ones still in flight.
    requested: SongQuery,
    latest_load: u64,
    revision: u64,
}

pub struct SongStore {
    api: SongApi,
    inner: Mutex<Inner>,
    listeners: Arc<Listeners>,
    next_listener: AtomicU64,
    /// Revision of the last snapshot handed to listeners.
    delivered: Mutex<u64>,
}

impl SongStore {
    pub fn new(api: SongApi) -> Self {
        Self {
            api,
            inner: Mutex::new(Inner {
                state: StoreState::default(),
                requested: SongQuery::default(),
                latest_load: 0,
                revision: 0,
            }),
            listeners: Arc::new(Mutex::new(HashMap::new())),
            next_listener: AtomicU64::new(1),
            delivered: Mutex::new(0),
        }
    }

    pub fn state(&self) -> StoreState {
        lock(&self.inner).state.clone()
    }

    pub fn requested_query(&self) -> SongQuery {
        lock(&self.inner).requested.clone()
    }

    /// Run `listener` after every state change.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&StoreState) + Send + Sync + 'static,
    {
        let id = self.next_listener.fetch_add(1, Ordering::SeqCst);
        lock(&*self.listeners).insert(id, Arc::new(listener));
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Fetch a page and make it current, unless a newer load overtakes it.
    ///
    /// A failure is recorded as `LoadStatus::Failed` (keeping the previous
    /// items) and also returned.
    pub async fn load(&self, query: SongQuery) -> Result<LoadOutcome, ApiError> {
        let seq = {
            let mut inner = lock(&self.inner);
            inner.latest_load += 1;
            inner.requested = query.clone();
            inner.state.status = LoadStatus::Loading;
            let seq = inner.latest_load;
            self.publish(inner);
            seq
        };
        debug!(seq, ?query, "load issued");

        let result = self.api.list(&query).await;

        let mut inner = lock(&self.inner);
        if inner.latest_load != seq {
            debug!(seq, latest = inner.latest_load, "discarding superseded load");
            return Ok(LoadOutcome::Superseded);
        }

        match result {
            Ok(page) => {
                let state = &mut inner.state;
                state.items = page.results;
                state.total_count = page.count;
                state.next = page.next;
                state.previous = page.previous;
                state.query = query;
                state.status = LoadStatus::Ready;
                self.publish(inner);
                Ok(LoadOutcome::Applied)
            }
            Err(error) => {
                inner.state.status = LoadStatus::Failed(error.to_string());
                self.publish(inner);
                Err(error)
            }
        }
    }

    /// Re-run the last requested query.
    pub async fn refresh(&self) -> Result<LoadOutcome, ApiError> {
        let query = self.requested_query();
        self.load(query).await
    }

    /// Load the first page matching `term`, keeping the ordering.
    pub async fn search(&self, term: impl Into<String>) -> Result<LoadOutcome, ApiError> {
        let query = self.requested_query().with_search(term);
        self.load(query).await
    }

    /// Load the first page in `order`, keeping the search term.
    pub async fn sort(&self, order: SortOrder) -> Result<LoadOutcome, ApiError> {
        let query = self.requested_query().with_ordering(order);
        self.load(query).await
    }

    pub async fn next_page(&self) -> Result<LoadOutcome, ApiError> {
        let query = {
            let inner = lock(&self.inner);
            if !inner.state.has_next() {
                return Ok(LoadOutcome::Unavailable);
            }
            inner.requested.next_page()
        };
        self.load(query).await
    }

    pub async fn previous_page(&self) -> Result<LoadOutcome, ApiError> {
        let query = {
            let inner = lock(&self.inner);
            if !inner.state.has_previous() {
                return Ok(LoadOutcome::Unavailable);
            }
            inner.requested.previous_page()
        };
        self.load(query).await
    }

    /// Create a song and append the server's copy to `items`.
    pub async fn create(&self, draft: &SongDraft) -> Result<Song, ApiError> {
        reject_invalid("create", draft)?;
        let song = self.api.create(draft).await?;

        let mut inner = lock(&self.inner);
        let position = inner.state.items.iter().position(|s| s.id == song.id);
        match position {
            Some(index) => inner.state.items[index] = song.clone(),
            None => inner.state.items.push(song.clone()),
        }
        self.publish(inner);
        Ok(song)
    }

    /// Replace a song; the local copy is patched only if it is on the page.
    pub async fn update(&self, id: SongId, draft: &SongDraft) -> Result<Song, ApiError> {
        reject_invalid("update", draft)?;
        let song = self.api.update(id, draft).await?;

        let mut inner = lock(&self.inner);
        match inner.state.items.iter().position(|s| s.id == song.id) {
            Some(index) => {
                inner.state.items[index] = song.clone();
                self.publish(inner);
            }
            None => debug!(id = %song.id, "updated song not on current page"),
        }
        Ok(song)
    }

    /// Delete a song and drop it from `items`.
    pub async fn remove(&self, id: SongId) -> Result<SongId, ApiError> {
        let removed = self.api.delete(id).await?;

        let mut inner = lock(&self.inner);
        let before = inner.state.items.len();
        inner.state.items.retain(|song| song.id != removed);
        if inner.state.items.len() != before {
            self.publish(inner);
        }
        Ok(removed)
    }

    /// Bump the revision, release the state lock and notify listeners.
    ///
    /// A snapshot older than one already delivered is skipped, and the check
    /// and the calls happen under the delivery lock, so listeners never step
    /// backwards when intents finish on different threads.
    fn publish(&self, mut inner: MutexGuard<'_, Inner>) {
        inner.revision += 1;
        let revision = inner.revision;
        let snapshot = inner.state.clone();
        drop(inner);

        let mut delivered = lock(&self.delivered);
        if *delivered >= revision {
            debug!(revision, delivered = *delivered, "skipping stale snapshot");
            return;
        }
        *delivered = revision;
        let listeners: Vec<Listener> = lock(&*self.listeners).values().cloned().collect();
        for listener in listeners {
            listener(&snapshot);
        }
    }
}

/// Validate a draft before any request is sent, logging a rejection.
fn reject_invalid(operation: &'static str, draft: &SongDraft) -> Result<(), ApiError> {
    draft.validate().inspect_err(|error| {
        warn!(operation, %error, "song intent rejected");
    })
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
