use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::{self, BoxFuture, Shared};
use futures::FutureExt;
use tokio::sync::watch;
use tokio::task::JoinError;
use tokio::time::Instant;
use tracing::debug;

use super::{CacheKey, Mutation, Resource};
use crate::api::{ApiError, GatewayError};

/// Serve cached reads for 5 minutes before going back to the server.
pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(5 * 60);

/// Type-erased cached result. Each key always holds the same concrete type.
pub type CachedValue = Arc<dyn Any + Send + Sync>;

type SharedFetch = Shared<BoxFuture<'static, Result<CachedValue, GatewayError>>>;

#[derive(Clone)]
struct CachedData {
    value: CachedValue,
    fetched_at: Instant,
    cached_at: DateTime<Utc>,
}

impl CachedData {
    fn new(value: CachedValue) -> Self {
        Self {
            value,
            fetched_at: Instant::now(),
            cached_at: Utc::now(),
        }
    }
}

struct InFlight {
    id: u64,
    fetch: SharedFetch,
}

/// One key's slot: the last good value and the request currently refreshing it.
#[derive(Default)]
struct Entry {
    data: Option<CachedData>,
    in_flight: Option<InFlight>,
}

enum Lookup {
    Hit(CachedValue),
    Join(SharedFetch),
    Miss,
}

struct State {
    entries: HashMap<CacheKey, Entry>,
    /// Session generation the entries were fetched under
    generation: u64,
    next_request_id: u64,
}

struct Inner {
    state: Mutex<State>,
    freshness: Duration,
    session: Option<watch::Receiver<u64>>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.sync_session(&mut state);
        state
    }

    /// Drop everything if the session changed since the entries were fetched.
    fn sync_session(&self, state: &mut State) {
        let Some(session) = &self.session else {
            return;
        };
        let current = *session.borrow();
        if current != state.generation {
            if !state.entries.is_empty() {
                debug!(
                    entries = state.entries.len(),
                    generation = current,
                    "Session changed, clearing cache"
                );
            }
            state.entries.clear();
            state.generation = current;
        }
    }

    /// Apply a finished fetch. The value is stored only if the request is
    /// still the one the entry is waiting on and the session is unchanged;
    /// otherwise it was superseded by an invalidation and is dropped.
    fn settle(&self, key: &CacheKey, id: u64, generation: u64, result: &Result<CachedValue, GatewayError>) {
        let mut state = self.lock();
        if state.generation != generation {
            debug!(key = %key, "Discarding result fetched under a previous session");
            return;
        }

        let Some(entry) = state.entries.get_mut(key) else {
            debug!(key = %key, "Discarding result for invalidated key");
            return;
        };
        if entry.in_flight.as_ref().map(|f| f.id) != Some(id) {
            debug!(key = %key, "Discarding superseded result");
            return;
        }
        entry.in_flight = None;

        let remove = match result {
            Ok(value) => {
                entry.data = Some(CachedData::new(Arc::clone(value)));
                debug!(key = %key, "Cached");
                false
            }
            Err(e) => {
                debug!(key = %key, error = %e, "Fetch failed, nothing cached");
                entry.data.is_none()
            }
        };
        if remove {
            state.entries.remove(key);
        }
    }

    fn lookup(&self, state: &State, key: &CacheKey) -> Lookup {
        let Some(entry) = state.entries.get(key) else {
            return Lookup::Miss;
        };
        if let Some(data) = &entry.data {
            if data.fetched_at.elapsed() < self.freshness {
                return Lookup::Hit(Arc::clone(&data.value));
            }
        }
        match &entry.in_flight {
            Some(in_flight) => Lookup::Join(in_flight.fetch.clone()),
            None => Lookup::Miss,
        }
    }

    fn invalidate(&self, prefixes: &[Resource]) -> usize {
        let mut state = self.lock();
        let before = state.entries.len();
        state
            .entries
            .retain(|key, _| !prefixes.iter().any(|prefix| key.matches(*prefix)));
        before - state.entries.len()
    }
}

/// In-memory cache of gateway results.
///
/// Reads within the freshness window are served locally; concurrent reads
/// for the same key share a single request. Writes go through [`mutate`],
/// which discards dependent keys once the write succeeds. When attached to
/// a session, any login or logout empties the cache before the next access.
///
/// Fetches and writes run as spawned tasks, so a dispatched request always
/// completes even if every caller stops waiting for it.
///
/// [`mutate`]: SyncCache::mutate
#[derive(Clone)]
pub struct SyncCache {
    inner: Arc<Inner>,
}

impl SyncCache {
    pub fn new(freshness: Duration) -> Self {
        Self::build(freshness, None)
    }

    /// Cache that clears itself whenever the watched session generation moves.
    pub fn with_session(freshness: Duration, session: watch::Receiver<u64>) -> Self {
        Self::build(freshness, Some(session))
    }

    fn build(freshness: Duration, session: Option<watch::Receiver<u64>>) -> Self {
        let generation = session.as_ref().map(|s| *s.borrow()).unwrap_or_default();
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    entries: HashMap::new(),
                    generation,
                    next_request_id: 0,
                }),
                freshness,
                session,
            }),
        }
    }

    pub fn freshness(&self) -> Duration {
        self.inner.freshness
    }

    /// Read `key`, calling `fetch` only when there is no fresh value and no
    /// request already under way.
    ///
    /// `fetch` runs outside the cache lock, so it may use the cache itself.
    pub async fn get<T, F, Fut>(&self, key: CacheKey, fetch: F) -> Result<Arc<T>, GatewayError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, GatewayError>> + Send + 'static,
    {
        let lookup = {
            let state = self.inner.lock();
            self.inner.lookup(&state, &key)
        };
        let pending = match lookup {
            Lookup::Hit(value) => {
                debug!(key = %key, "Cache hit");
                return downcast(&key, value);
            }
            Lookup::Join(in_flight) => {
                debug!(key = %key, "Joining in-flight request");
                in_flight
            }
            Lookup::Miss => self.start(&key, fetch()),
        };

        let value = pending.await?;
        downcast(&key, value)
    }

    /// Spawn `producer` for `key` unless another caller got there first while
    /// it was being built.
    fn start<T, Fut>(&self, key: &CacheKey, producer: Fut) -> SharedFetch
    where
        T: Send + Sync + 'static,
        Fut: Future<Output = Result<T, GatewayError>> + Send + 'static,
    {
        let mut state = self.inner.lock();
        match self.inner.lookup(&state, key) {
            Lookup::Hit(value) => return future::ready(Ok(value)).boxed().shared(),
            Lookup::Join(in_flight) => {
                debug!(key = %key, "Joining request started concurrently");
                return in_flight;
            }
            Lookup::Miss => {}
        }

        debug!(key = %key, "Cache miss, fetching");
        let generation = state.generation;
        let id = state.next_request_id;
        state.next_request_id += 1;

        let inner = Arc::clone(&self.inner);
        let task_key = key.clone();
        let handle = tokio::spawn(async move {
            let result = match AssertUnwindSafe(producer).catch_unwind().await {
                Ok(result) => result.map(|value| Arc::new(value) as CachedValue),
                Err(panic) => Err(producer_panicked(panic)),
            };
            inner.settle(&task_key, id, generation, &result);
            result
        });

        // The task settles its own result; this only covers a task that never
        // finished, e.g. one aborted by runtime shutdown.
        let inner = Arc::clone(&self.inner);
        let task_key = key.clone();
        let shared = async move {
            match handle.await {
                Ok(result) => result,
                Err(e) => {
                    let result = Err(task_failed(e));
                    inner.settle(&task_key, id, generation, &result);
                    result
                }
            }
        }
        .boxed()
        .shared();

        state.entries.entry(key.clone()).or_default().in_flight = Some(InFlight {
            id,
            fetch: shared.clone(),
        });
        shared
    }

    /// Run a write and, if it succeeds, discard every entry its mutation
    /// invalidates before handing back the result. A failed write leaves the
    /// cache untouched and returns the error as is.
    pub async fn mutate<T, Fut>(&self, mutation: Mutation, write: Fut) -> Result<T, GatewayError>
    where
        T: Send + 'static,
        Fut: Future<Output = Result<T, GatewayError>> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            let result = write.await;
            match &result {
                Ok(_) => {
                    let removed = inner.invalidate(mutation.invalidates());
                    debug!(mutation = %mutation, removed, "Mutation committed");
                }
                Err(e) => debug!(mutation = %mutation, error = %e, "Mutation failed, cache untouched"),
            }
            result
        });
        handle.await.unwrap_or_else(|e| Err(task_failed(e)))
    }

    /// Discard every entry under the given prefixes, including in-flight
    /// markers. Returns how many entries were removed.
    pub fn invalidate(&self, prefixes: &[Resource]) -> usize {
        self.inner.invalidate(prefixes)
    }

    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    /// Number of keys holding a value.
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .entries
            .values()
            .filter(|e| e.data.is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `key` holds a value, fresh or not.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.inner
            .lock()
            .entries
            .get(key)
            .is_some_and(|e| e.data.is_some())
    }

    pub fn is_in_flight(&self, key: &CacheKey) -> bool {
        self.inner
            .lock()
            .entries
            .get(key)
            .is_some_and(|e| e.in_flight.is_some())
    }

    /// Describe every entry, sorted by key.
    pub fn snapshot(&self) -> Vec<EntryInfo> {
        let state = self.inner.lock();
        let mut entries: Vec<EntryInfo> = state
            .entries
            .iter()
            .map(|(key, entry)| EntryInfo {
                key: key.clone(),
                cached_at: entry.data.as_ref().map(|d| d.cached_at),
                stale: entry
                    .data
                    .as_ref()
                    .map_or(true, |d| d.fetched_at.elapsed() >= self.inner.freshness),
                in_flight: entry.in_flight.is_some(),
            })
            .collect();
        entries.sort_by_key(|e| e.key.to_string());
        entries
    }
}

/// Point-in-time view of one cache entry.
#[derive(Debug, Clone)]
pub struct EntryInfo {
    pub key: CacheKey,
    pub cached_at: Option<DateTime<Utc>>,
    pub stale: bool,
    pub in_flight: bool,
}

impl EntryInfo {
    pub fn age_minutes(&self) -> Option<i64> {
        self.cached_at.map(|at| (Utc::now() - at).num_minutes())
    }

    pub fn age_display(&self) -> String {
        let Some(minutes) = self.age_minutes() else {
            return "never".to_string();
        };
        if minutes < 1 {
            // Clock skew lands here too
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}

fn downcast<T: Send + Sync + 'static>(key: &CacheKey, value: CachedValue) -> Result<Arc<T>, GatewayError> {
    value.downcast::<T>().map_err(|_| {
        GatewayError::new(
            "Failed to read cache",
            ApiError::InvalidResponse(format!("unexpected value type for key {}", key)),
        )
    })
}

fn task_failed(e: JoinError) -> GatewayError {
    GatewayError::new("Request task failed", ApiError::InvalidResponse(e.to_string()))
}

fn producer_panicked(panic: Box<dyn Any + Send>) -> GatewayError {
    let message = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "fetch panicked".to_string());
    GatewayError::new("Request task failed", ApiError::InvalidResponse(message))
}

// ============================================================================
// Tests
// ============================================================================
