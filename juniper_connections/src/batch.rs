use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OnceCell;

/// Batch lookup for one kind of entity.
///
/// Implement this once per entity type; a `BatchResolver` takes care of collecting keys,
/// deduplicating them and caching the results.
///
/// ```nocompile
/// struct LocationFetch { db: Arc<Database> }
///
/// #[async_trait]
/// impl BatchFetch for LocationFetch {
///     type Key = String;
///     type Value = Location;
///     type Error = DbError;
///
///     async fn load(&self, keys: &[String]) -> Result<Vec<Option<Result<Location, DbError>>>, DbError> {
///         let rows = self.db.locations_by_id(keys).await?;
///         Ok(keys.iter().map(|key| rows.get(key).cloned().map(Ok)).collect())
///     }
/// }
/// ```
#[async_trait]
pub trait BatchFetch: Send + Sync + 'static {
    type Key: Eq + Hash + Clone + Debug + Send + Sync + 'static;
    type Value: Clone + Send + Sync + 'static;
    type Error: Clone + Send + Sync + 'static;

    /// Fetches `keys` in one go.
    ///
    /// The returned vector must line up with `keys`: one entry per key, in the same order.
    /// `None` marks a key with nothing behind it, an `Err` inside the vector fails that key only
    /// and an outer `Err` fails the whole batch.
    async fn load(
        &self,
        keys: &[Self::Key],
    ) -> Result<Vec<Option<Result<Self::Value, Self::Error>>>, Self::Error>;
}

/// Failure to resolve one key.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum LoadError<E> {
    /// The fetch reported an error for this key.
    #[error("{0}")]
    Key(E),

    /// The whole batch fetch failed.
    #[error("{0}")]
    DataSource(E),

    /// The fetch has nothing for this key.
    #[error("No result for key")]
    NotFound,

    /// The fetch broke the positional contract.
    #[error("Batch fetch returned {actual} results for {expected} keys")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Outcome of loading a single key through `F`.
pub type LoadResult<F> =
    Result<<F as BatchFetch>::Value, LoadError<<F as BatchFetch>::Error>>;

/// Batching settings.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Keys per fetch. A batch reaching this size is dispatched on its own and later keys start
    /// a new one. Unlimited when unset.
    pub max_batch_size: Option<usize>,

    /// How long a batch keeps collecting keys before it is dispatched. When unset the batch
    /// dispatches after a single cooperative yield.
    pub dispatch_delay_ms: Option<u64>,
}

impl BatchConfig {
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = Some(max_batch_size);
        self
    }

    pub fn with_dispatch_delay(mut self, delay: Duration) -> Self {
        self.dispatch_delay_ms = Some(u64::try_from(delay.as_millis()).unwrap_or(u64::MAX));
        self
    }

    fn dispatch_delay(&self) -> Option<Duration> {
        self.dispatch_delay_ms.map(Duration::from_millis)
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Batch<F: BatchFetch> {
    keys: Mutex<Vec<F::Key>>,
    results: OnceCell<HashMap<F::Key, LoadResult<F>>>,
}

impl<F: BatchFetch> Batch<F> {
    fn open() -> Self {
        Batch {
            keys: Mutex::new(Vec::new()),
            results: OnceCell::new(),
        }
    }

    fn resolved(key: F::Key, value: F::Value) -> Self {
        Batch {
            keys: Mutex::new(vec![key.clone()]),
            results: OnceCell::new_with(Some(HashMap::from([(key, Ok(value))]))),
        }
    }
}

struct State<F: BatchFetch> {
    /// Every key seen in this scope, pointing at the batch that resolves it.
    entries: HashMap<F::Key, Arc<Batch<F>>>,

    /// The batch still collecting keys, if any.
    open: Option<Arc<Batch<F>>>,
}

struct Inner<F: BatchFetch> {
    fetcher: F,
    config: BatchConfig,
    state: Mutex<State<F>>,
}

/// Per-scope loader that coalesces key lookups into batched fetches and caches the results.
///
/// Keys requested before a batch is dispatched are fetched together, each key at most once and
/// in the order it was first requested. Results stay cached for the lifetime of the resolver, so
/// create one per request (see `LoaderScope`) and drop it with the request.
///
/// Cloning is cheap and clones share the same cache.
pub struct BatchResolver<F: BatchFetch> {
    inner: Arc<Inner<F>>,
}

impl<F: BatchFetch> Clone for BatchResolver<F> {
    fn clone(&self) -> Self {
        BatchResolver {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: BatchFetch> BatchResolver<F> {
    pub fn new(fetcher: F) -> Self {
        Self::with_config(fetcher, BatchConfig::default())
    }

    pub fn with_config(fetcher: F, config: BatchConfig) -> Self {
        BatchResolver {
            inner: Arc::new(Inner {
                fetcher,
                config,
                state: Mutex::new(State {
                    entries: HashMap::new(),
                    open: None,
                }),
            }),
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.inner.fetcher
    }

    /// Loads one key, batched with every other key requested before dispatch.
    pub async fn load_one(&self, key: F::Key) -> LoadResult<F> {
        let batch = self.enqueue(&key);
        self.resolve(&key, batch).await
    }

    /// Loads several keys. The result lines up with `keys`; a key that fails only fails its own
    /// position.
    pub async fn load_many(&self, keys: &[F::Key]) -> Vec<LoadResult<F>> {
        let batches: Vec<_> = keys.iter().map(|key| self.enqueue(key)).collect();

        let mut results = Vec::with_capacity(keys.len());
        for (key, batch) in keys.iter().zip(batches) {
            results.push(self.resolve(key, batch).await);
        }
        results
    }

    /// Seeds the cache with a known value. Keys already requested are left untouched.
    pub fn prime(&self, key: F::Key, value: F::Value) {
        let mut state = lock(&self.inner.state);
        if !state.entries.contains_key(&key) {
            let batch = Arc::new(Batch::resolved(key.clone(), value));
            state.entries.insert(key, batch);
        }
    }

    /// Forgets `key`; the next load fetches it again.
    pub fn clear_one(&self, key: &F::Key) {
        lock(&self.inner.state).entries.remove(key);
    }

    /// Forgets every cached key.
    pub fn clear_all(&self) {
        lock(&self.inner.state).entries.clear();
    }

    fn enqueue(&self, key: &F::Key) -> Arc<Batch<F>> {
        let mut state = lock(&self.inner.state);
        if let Some(batch) = state.entries.get(key) {
            tracing::trace!(?key, "batch resolver cache hit");
            return Arc::clone(batch);
        }

        let batch = match state.open.clone() {
            Some(open) => open,
            None => {
                let batch = Arc::new(Batch::open());
                state.open = Some(Arc::clone(&batch));
                batch
            }
        };

        let queued = {
            let mut keys = lock(&batch.keys);
            // A key cleared while its batch is still open is already queued.
            if !keys.contains(key) {
                keys.push(key.clone());
            }
            keys.len()
        };
        if self
            .inner
            .config
            .max_batch_size
            .is_some_and(|max| queued >= max)
        {
            state.open = None;
        }

        state.entries.insert(key.clone(), Arc::clone(&batch));
        batch
    }

    async fn resolve(&self, key: &F::Key, batch: Arc<Batch<F>>) -> LoadResult<F> {
        let results = batch.results.get_or_init(|| self.dispatch(&batch)).await;
        results.get(key).cloned().unwrap_or(Err(LoadError::NotFound))
    }

    async fn dispatch(&self, batch: &Arc<Batch<F>>) -> HashMap<F::Key, LoadResult<F>> {
        match self.inner.config.dispatch_delay() {
            Some(delay) => tokio::time::sleep(delay).await,
            None => tokio::task::yield_now().await,
        }

        let keys = {
            let mut state = lock(&self.inner.state);
            if state
                .open
                .as_ref()
                .is_some_and(|open| Arc::ptr_eq(open, batch))
            {
                state.open = None;
            }
            lock(&batch.keys).clone()
        };

        tracing::debug!(keys = keys.len(), "dispatching batch");
        match self.inner.fetcher.load(&keys).await {
            Ok(values) if values.len() == keys.len() => keys
                .into_iter()
                .zip(values.into_iter().map(|value| match value {
                    Some(value) => value.map_err(LoadError::Key),
                    None => Err(LoadError::NotFound),
                }))
                .collect(),
            Ok(values) => {
                tracing::warn!(
                    expected = keys.len(),
                    actual = values.len(),
                    "batch fetch broke the positional contract"
                );
                self.evict(&keys, batch);
                let err = LoadError::LengthMismatch {
                    expected: keys.len(),
                    actual: values.len(),
                };
                keys.into_iter().map(|key| (key, Err(err.clone()))).collect()
            }
            Err(err) => {
                tracing::debug!(keys = keys.len(), "batch fetch failed");
                self.evict(&keys, batch);
                keys.into_iter()
                    .map(|key| (key, Err(LoadError::DataSource(err.clone()))))
                    .collect()
            }
        }
    }

    /// Drops the cache entries still pointing at a failed batch so they are fetched again.
    fn evict(&self, keys: &[F::Key], batch: &Arc<Batch<F>>) {
        let mut state = lock(&self.inner.state);
        for key in keys {
            if state
                .entries
                .get(key)
                .is_some_and(|cached| Arc::ptr_eq(cached, batch))
            {
                state.entries.remove(key);
            }
        }
    }
}
