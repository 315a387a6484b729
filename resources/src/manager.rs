use backend::{Authority, BackendError, Method, Route};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::{
    fmt::{Debug, Display},
    hash::Hash,
    sync::Arc,
};
use tempvoice_cache::ResourceCache;

use crate::ResourceError;

/// An entity family owned by the remote authority
pub trait Resource: DeserializeOwned + Send + Sync + 'static {
    type Key: Copy + Debug + Display + Eq + Hash + Send + Sync + 'static;
    /// What the routes of the family are scoped by
    type Scope: Copy + Send + Sync + 'static;
    type Create: Serialize + Sync;
    type Patch: Serialize + Sync;

    const NAME: &'static str;

    fn item_route(scope: Self::Scope, key: Self::Key) -> Route;

    fn collection_route(scope: Self::Scope) -> Route;
}

/// Cache-aside access to one entity family.
///
/// Reads are served from the cache and fall through to the authority on a miss. Writes always
/// go to the authority first, and the cache is then refreshed from the authority's answer, never
/// from the request. A failed call leaves the cache untouched.
pub struct ResourceManager<E: Resource> {
    scope: E::Scope,
    authority: Arc<dyn Authority>,
    cache: ResourceCache<E::Key, E>,
}

impl<E: Resource> ResourceManager<E> {
    pub fn new(scope: E::Scope, authority: Arc<dyn Authority>) -> Self {
        Self {
            scope,
            authority,
            cache: ResourceCache::new(),
        }
    }

    /// Peek at the cache without any I/O
    pub fn cached(&self, key: E::Key) -> Option<Arc<E>> {
        self.cache.get(&key)
    }

    pub fn evict(&self, key: E::Key) {
        if self.cache.evict(&key).is_some() {
            tracing::trace!(resource = E::NAME, key = %key, "Evicted");
        }
    }

    pub async fn get(&self, key: E::Key) -> Result<Arc<E>, ResourceError> {
        if let Some(entity) = self.cache.get(&key) {
            return Ok(entity);
        }

        let route = E::item_route(self.scope, key);
        let value = self.call(Method::GET, route, None).await?;
        let entity = decode::<E>(value)?;
        Ok(self.cache.insert(key, entity))
    }

    pub async fn create(&self, key: E::Key, init: &E::Create) -> Result<Arc<E>, ResourceError> {
        let body = serde_json::to_value(init)?;
        let route = E::collection_route(self.scope);
        let value = self.call(Method::POST, route, Some(body)).await?;
        let entity = decode::<E>(value)?;
        tracing::debug!(resource = E::NAME, key = %key, "Created");
        Ok(self.cache.insert(key, entity))
    }

    pub async fn update(&self, key: E::Key, patch: &E::Patch) -> Result<Arc<E>, ResourceError> {
        let body = serde_json::to_value(patch)?;
        let route = E::item_route(self.scope, key);
        let value = self.call(Method::PATCH, route, Some(body)).await?;
        let entity = decode::<E>(value)?;
        tracing::debug!(resource = E::NAME, key = %key, "Updated");
        Ok(self.cache.insert(key, entity))
    }

    /// Delete the entity. An entity the authority no longer knows counts as deleted.
    pub async fn delete(&self, key: E::Key) -> Result<(), ResourceError> {
        let route = E::item_route(self.scope, key);
        match self.call(Method::DELETE, route, None).await {
            Ok(_) => {}
            Err(err) if err.is_not_found() => {
                tracing::debug!(resource = E::NAME, key = %key, "Already gone on the authority");
            }
            Err(err) => return Err(err),
        }
        self.cache.evict(&key);
        Ok(())
    }

    async fn call(
        &self,
        method: Method,
        route: Route,
        body: Option<Value>,
    ) -> Result<Option<Value>, ResourceError> {
        match self.authority.request(method.clone(), route, body).await {
            Ok(value) => Ok(value),
            Err(err) => {
                tracing::warn!(method = %method, route = %route, err = %err, "Authority call failed");
                Err(err.into())
            }
        }
    }
}

fn decode<E: Resource>(value: Option<Value>) -> Result<E, ResourceError> {
    let value = value.ok_or(ResourceError::Transport(BackendError::MissingBody))?;
    Ok(serde_json::from_value(value)?)
}
