//! Stale-while-revalidate cache with single-flight refresh.
//!
//! One [`SwrCache`] is built per aggregation domain at startup and shared
//! through `web::Data`. Reads never wait on the network once a value exists:
//! a stale value is returned as-is and a refresh is started in the background.
//! Only the very first load of a process blocks, and only that load reports
//! its failure to the caller.
//!
//! At most one refresh runs per cache. The in-flight refresh is a
//! [`Shared`] future stored under the state mutex; every caller that arrives
//! while it runs awaits a clone of it. The refresh is also spawned onto the
//! runtime, so it completes and clears its slot even if every caller that
//! was waiting on it has gone away.

use std::{
    any::Any,
    future::Future,
    panic::AssertUnwindSafe,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;

use crate::sources::SourceError;

pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

type Loader<T> = Box<dyn Fn() -> BoxFuture<'static, Result<T, SourceError>> + Send + Sync>;
type Flight<T> = Shared<BoxFuture<'static, Result<Arc<T>, SourceError>>>;

struct Entry<T> {
    value: Arc<T>,
    fetched_at: DateTime<Utc>,
}

struct State<T> {
    entry: Option<Entry<T>>,
    inflight: Option<Flight<T>>,
}

/// Point-in-time view of a cache, for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct CacheSnapshot {
    pub name: &'static str,
    pub ttl_seconds: u64,
    pub fetched_at: Option<DateTime<Utc>>,
    pub stale: bool,
    pub refreshing: bool,
}

pub struct SwrCache<T> {
    name: &'static str,
    ttl: Duration,
    loader: Loader<T>,
    clock: Arc<dyn Clock>,
    state: Mutex<State<T>>,
}

impl<T> SwrCache<T>
where
    T: Send + Sync + 'static,
{
    pub fn new<F, Fut>(name: &'static str, ttl: Duration, loader: F) -> Arc<Self>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, SourceError>> + Send + 'static,
    {
        Self::with_clock(name, ttl, Arc::new(SystemClock), loader)
    }

    pub fn with_clock<F, Fut>(
        name: &'static str,
        ttl: Duration,
        clock: Arc<dyn Clock>,
        loader: F,
    ) -> Arc<Self>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, SourceError>> + Send + 'static,
    {
        Arc::new(Self {
            name,
            ttl,
            loader: Box::new(move || loader().boxed()),
            clock,
            state: Mutex::new(State {
                entry: None,
                inflight: None,
            }),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Current value, refreshing it first only if nothing has been loaded yet.
    pub async fn get(self: &Arc<Self>) -> Result<Arc<T>, SourceError> {
        let flight = {
            let mut guard = self.lock();
            let state = &mut *guard;
            if let Some(entry) = &state.entry {
                if self.is_stale(entry.fetched_at) && state.inflight.is_none() {
                    tracing::debug!(cache = self.name, "Serving stale value, refreshing in background");
                    state.inflight = Some(self.start_flight());
                }
                return Ok(Arc::clone(&entry.value));
            }
            self.join_or_start(state)
        };
        flight.await
    }

    /// Refresh now and wait for it. When the refresh fails the previous value
    /// is returned if there is one.
    pub async fn refresh(self: &Arc<Self>) -> Result<Arc<T>, SourceError> {
        let flight = {
            let mut guard = self.lock();
            self.join_or_start(&mut guard)
        };
        match flight.await {
            Ok(value) => Ok(value),
            Err(err) => match self.current() {
                Some(previous) => {
                    tracing::warn!(cache = self.name, error = %err, "Forced refresh failed, keeping previous value");
                    Ok(previous)
                }
                None => Err(err),
            },
        }
    }

    /// Starts a background refresh unless one is already running. Callers
    /// use this after changing the data a loader reads.
    pub fn revalidate(self: &Arc<Self>) {
        let mut state = self.lock();
        if state.inflight.is_none() {
            state.inflight = Some(self.start_flight());
        }
    }

    /// Drops the stored value so the next `get` loads from scratch. A
    /// refresh already in flight still stores its result.
    pub fn clear(&self) {
        self.lock().entry = None;
    }

    /// Last stored value, without triggering any refresh.
    pub fn current(&self) -> Option<Arc<T>> {
        self.lock().entry.as_ref().map(|entry| Arc::clone(&entry.value))
    }

    pub fn snapshot(&self) -> CacheSnapshot {
        let state = self.lock();
        let fetched_at = state.entry.as_ref().map(|entry| entry.fetched_at);
        CacheSnapshot {
            name: self.name,
            ttl_seconds: self.ttl.as_secs(),
            fetched_at,
            stale: fetched_at.map(|at| self.is_stale(at)).unwrap_or(true),
            refreshing: state.inflight.is_some(),
        }
    }

    fn is_stale(&self, fetched_at: DateTime<Utc>) -> bool {
        // A clock that went backwards leaves the value fresh.
        match (self.clock.now() - fetched_at).to_std() {
            Ok(age) => age >= self.ttl,
            Err(_) => false,
        }
    }

    fn join_or_start(self: &Arc<Self>, state: &mut State<T>) -> Flight<T> {
        match &state.inflight {
            Some(flight) => flight.clone(),
            None => {
                let flight = self.start_flight();
                state.inflight = Some(flight.clone());
                flight
            }
        }
    }

    fn start_flight(self: &Arc<Self>) -> Flight<T> {
        let cache = Arc::clone(self);
        let flight = async move {
            let started = Instant::now();
            tracing::debug!(cache = cache.name, "Cache refresh started");
            let load = async { (cache.loader)().await };
            let result = match AssertUnwindSafe(load).catch_unwind().await {
                Ok(result) => result,
                Err(panic) => Err(SourceError::Panicked(panic_message(panic.as_ref()))),
            };
            cache.complete(result, started)
        }
        .boxed()
        .shared();

        tokio::spawn(flight.clone());
        flight
    }

    /// Runs exactly once per refresh, inside the shared future.
    fn complete(
        &self,
        result: Result<T, SourceError>,
        started: Instant,
    ) -> Result<Arc<T>, SourceError> {
        let mut state = self.lock();
        state.inflight = None;
        let duration_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(value) => {
                let value = Arc::new(value);
                state.entry = Some(Entry {
                    value: Arc::clone(&value),
                    fetched_at: self.clock.now(),
                });
                tracing::info!(cache = self.name, duration_ms, "Cache refreshed");
                Ok(value)
            }
            Err(err) => {
                tracing::warn!(cache = self.name, duration_ms, error = %err, "Cache refresh failed");
                Err(err)
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|msg| msg.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

impl<U> SwrCache<Vec<U>>
where
    U: Clone + Send + Sync + 'static,
{
    /// Like [`SwrCache::get`], truncated to at most `limit` items.
    pub async fn get_limited(self: &Arc<Self>, limit: Option<usize>) -> Result<Vec<U>, SourceError> {
        let items = self.get().await?;
        let limit = limit.unwrap_or(items.len());
        Ok(items.iter().take(limit).cloned().collect())
    }
}
