use crate::batch::{BatchConfig, BatchFetch, BatchResolver, lock};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Mutex;

/// Hands out one `BatchResolver` per fetcher type for the lifetime of a unit of work.
///
/// Create a scope per incoming request, usually as part of the Juniper context, and let it drop
/// with the request. Nothing cached in one scope is visible from another.
///
/// ```nocompile
/// impl Context {
///     pub fn locations(&self) -> BatchResolver<LocationFetch> {
///         self.loaders.get_or_create(|| LocationFetch::new(self.db.clone()))
///     }
/// }
/// ```
#[derive(Default)]
pub struct LoaderScope {
    config: BatchConfig,
    loaders: Mutex<HashMap<TypeId, Box<dyn Any + Send + Sync>>>,
}

impl LoaderScope {
    pub fn new(config: BatchConfig) -> Self {
        LoaderScope {
            config,
            loaders: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the scope's resolver for `F`, building it with `create` on first use.
    ///
    /// `create` runs while the scope is locked and must not call back into it.
    pub fn get_or_create<F: BatchFetch>(&self, create: impl FnOnce() -> F) -> BatchResolver<F> {
        let mut loaders = lock(&self.loaders);
        if let Some(resolver) = loaders
            .get(&TypeId::of::<F>())
            .and_then(|loader| loader.downcast_ref::<BatchResolver<F>>())
        {
            return resolver.clone();
        }

        tracing::trace!(loader = std::any::type_name::<F>(), "creating batch resolver");
        let resolver = BatchResolver::with_config(create(), self.config);
        loaders.insert(TypeId::of::<F>(), Box::new(resolver.clone()));
        resolver
    }

    /// Returns the scope's resolver for a fetcher that needs no dependencies.
    pub fn get<F: BatchFetch + Default>(&self) -> BatchResolver<F> {
        self.get_or_create(F::default)
    }
}
