//! Actor-isolated persistence abstractions.
//!
//! One store per collection (inventory items, prep items, pending lines, orders,
//! waste). Every record is keyed by `(ActorId, K)`, so a caller can never see or
//! touch another actor's rows.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use thiserror::Error;

use galley_core::ActorId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store lock poisoned")]
    Poisoned,

    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Actor-isolated key/value store for one collection.
pub trait ActorStore<K, V>: Send + Sync {
    fn get(&self, actor: ActorId, key: &K) -> Result<Option<V>, StoreError>;
    fn upsert(&self, actor: ActorId, key: K, value: V) -> Result<(), StoreError>;

    /// Write several records. Backends that can should make this atomic.
    fn upsert_many(&self, actor: ActorId, entries: Vec<(K, V)>) -> Result<(), StoreError> {
        for (key, value) in entries {
            self.upsert(actor, key, value)?;
        }
        Ok(())
    }

    /// Remove a record, returning it if it existed.
    fn remove(&self, actor: ActorId, key: &K) -> Result<Option<V>, StoreError>;
    fn list(&self, actor: ActorId) -> Result<Vec<V>, StoreError>;

    /// Drop every record for an actor and return how many were removed.
    fn clear_actor(&self, actor: ActorId) -> Result<usize, StoreError>;
}

impl<K, V, S> ActorStore<K, V> for Arc<S>
where
    S: ActorStore<K, V> + ?Sized,
{
    fn get(&self, actor: ActorId, key: &K) -> Result<Option<V>, StoreError> {
        (**self).get(actor, key)
    }

    fn upsert(&self, actor: ActorId, key: K, value: V) -> Result<(), StoreError> {
        (**self).upsert(actor, key, value)
    }

    fn upsert_many(&self, actor: ActorId, entries: Vec<(K, V)>) -> Result<(), StoreError> {
        (**self).upsert_many(actor, entries)
    }

    fn remove(&self, actor: ActorId, key: &K) -> Result<Option<V>, StoreError> {
        (**self).remove(actor, key)
    }

    fn list(&self, actor: ActorId) -> Result<Vec<V>, StoreError> {
        (**self).list(actor)
    }

    fn clear_actor(&self, actor: ActorId) -> Result<usize, StoreError> {
        (**self).clear_actor(actor)
    }
}

/// In-memory actor-isolated store for tests/dev.
#[derive(Debug)]
pub struct InMemoryActorStore<K, V> {
    inner: RwLock<HashMap<(ActorId, K), V>>,
}

impl<K, V> InMemoryActorStore<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> Default for InMemoryActorStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> ActorStore<K, V> for InMemoryActorStore<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, actor: ActorId, key: &K) -> Result<Option<V>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(&(actor, key.clone())).cloned())
    }

    fn upsert(&self, actor: ActorId, key: K, value: V) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        map.insert((actor, key), value);
        Ok(())
    }

    fn upsert_many(&self, actor: ActorId, entries: Vec<(K, V)>) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        for (key, value) in entries {
            map.insert((actor, key), value);
        }
        Ok(())
    }

    fn remove(&self, actor: ActorId, key: &K) -> Result<Option<V>, StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        Ok(map.remove(&(actor, key.clone())))
    }

    fn list(&self, actor: ActorId) -> Result<Vec<V>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map
            .iter()
            .filter_map(|((a, _k), v)| if *a == actor { Some(v.clone()) } else { None })
            .collect())
    }

    fn clear_actor(&self, actor: ActorId) -> Result<usize, StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        let before = map.len();
        map.retain(|(a, _k), _v| *a != actor);
        Ok(before - map.len())
    }
}
