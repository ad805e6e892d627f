// SPDX-License-Identifier: Apache-2.0
//! Readers-writer façade for sharing one engine across threads.
use std::sync::{Arc, RwLock};

use crate::engine_impl::{Engine, EngineError};
use crate::tuple::{Entity, Node, RelationalTriple};

/// Cheaply clonable handle to one engine behind a readers-writer lock.
///
/// Checks, expansions, and listings take the read lock and may run
/// concurrently; writes, deletes, and entity removal take the write lock
/// exclusively. No operation suspends while holding a lock — the engine
/// underneath runs every call to completion — so the discipline here is
/// all the concurrency control the system needs. A poisoned lock (a
/// panicked writer mid-mutation means a possibly corrupt index) surfaces
/// as [`EngineError::Poisoned`] on every subsequent call rather than
/// cascading panics.
#[derive(Debug, Clone)]
pub struct SharedEngine {
    inner: Arc<RwLock<Engine>>,
}

impl SharedEngine {
    /// Wraps an engine for shared use.
    #[must_use]
    pub fn new(engine: Engine) -> Self {
        Self {
            inner: Arc::new(RwLock::new(engine)),
        }
    }

    /// Exclusive: records a tuple. See [`Engine::write`].
    pub fn write(&self, triple: RelationalTriple) -> Result<(), EngineError> {
        self.inner
            .write()
            .map_err(|_| EngineError::Poisoned)?
            .write(triple)
    }

    /// Exclusive: retracts a tuple. See [`Engine::delete`].
    pub fn delete(&self, triple: &RelationalTriple) -> Result<(), EngineError> {
        self.inner
            .write()
            .map_err(|_| EngineError::Poisoned)?
            .delete(triple)
    }

    /// Exclusive: removes an entity. See [`Engine::remove_entity`].
    pub fn remove_entity(&self, entity: &Entity) -> Result<usize, EngineError> {
        self.inner
            .write()
            .map_err(|_| EngineError::Poisoned)?
            .remove_entity(entity)
    }

    /// Shared: answers a relationship check. See [`Engine::check`].
    pub fn check(&self, triple: &RelationalTriple) -> Result<bool, EngineError> {
        Ok(self
            .inner
            .read()
            .map_err(|_| EngineError::Poisoned)?
            .check(triple))
    }

    /// Shared: expands a tuple through the schema. See [`Engine::expand`].
    pub fn expand(
        &self,
        triple: &RelationalTriple,
    ) -> Result<Vec<RelationalTriple>, EngineError> {
        self.inner
            .read()
            .map_err(|_| EngineError::Poisoned)?
            .expand(triple)
    }

    /// Shared: lists the forward closure of a vertex. See
    /// [`Engine::list_reachable`].
    pub fn list_reachable(&self, node: &Node) -> Result<Vec<Node>, EngineError> {
        Ok(self
            .inner
            .read()
            .map_err(|_| EngineError::Poisoned)?
            .list_reachable(node))
    }

    /// Shared: lists the reverse closure of a vertex. See
    /// [`Engine::list_reverse`].
    pub fn list_reverse(&self, node: &Node) -> Result<Vec<Node>, EngineError> {
        Ok(self
            .inner
            .read()
            .map_err(|_| EngineError::Poisoned)?
            .list_reverse(node))
    }
}
