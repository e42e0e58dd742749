//! Owner of every live context.
//!
//! Contexts are stored by id; everything else (the stack, the bus objects)
//! refers to them by [`ContextId`] only. Ids are allocated from a monotonic
//! counter and never reused for the lifetime of the process.

use std::collections::{BTreeSet, HashMap};

use eekboard_core::{ClientIdentity, ContextId, Outbox};
use tracing::{debug, info};

use super::context::Context;
use super::ports::{ContextFactory, FactoryError};

#[derive(Debug)]
pub struct ContextRegistry {
    contexts: HashMap<ContextId, Context>,
    /// `None` once the id space is exhausted.
    next_id: Option<ContextId>,
}

impl Default for ContextRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextRegistry {
    pub fn new() -> Self {
        Self {
            contexts: HashMap::new(),
            next_id: Some(ContextId(0)),
        }
    }

    /// Allocates an id and stores a context built by `factory`.
    ///
    /// The id is consumed even if the factory fails.
    pub fn create(
        &mut self,
        factory: &dyn ContextFactory,
        owner: ClientIdentity,
        client_name: &str,
    ) -> Result<ContextId, FactoryError> {
        let id = self
            .next_id
            .ok_or_else(|| FactoryError("context ids exhausted".into()))?;
        self.next_id = id.next();

        let context = factory.create_context(id, owner.clone(), client_name)?;
        self.contexts.insert(id, context);
        info!(context = %id, owner = %owner, client_name, "context created");
        Ok(id)
    }

    pub fn lookup(&self, id: ContextId) -> Option<&Context> {
        self.contexts.get(&id)
    }

    pub fn lookup_mut(&mut self, id: ContextId) -> Option<&mut Context> {
        self.contexts.get_mut(&id)
    }

    pub fn contains(&self, id: ContextId) -> bool {
        self.contexts.contains_key(&id)
    }

    pub fn owner_of(&self, id: ContextId) -> Option<&ClientIdentity> {
        self.contexts.get(&id).map(Context::owner)
    }

    /// Ids of all live contexts, in ascending order.
    pub fn ids(&self) -> Vec<ContextId> {
        let mut ids: Vec<_> = self.contexts.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Live contexts in ascending id order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Context> {
        let mut contexts: Vec<_> = self.contexts.values_mut().collect();
        contexts.sort_unstable_by_key(|c| c.id());
        contexts.into_iter()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Context> {
        self.contexts.values()
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Tears down and forgets a context.
    ///
    /// Returns `false` if the id was not registered.
    pub fn remove(&mut self, id: ContextId, outbox: &mut Outbox) -> bool {
        match self.contexts.remove(&id) {
            Some(mut context) => {
                context.teardown(outbox);
                debug!(context = %id, "context removed from registry");
                true
            }
            None => false,
        }
    }

    /// Removes every context owned by `client` and returns their ids.
    pub fn purge_owned_by(
        &mut self,
        client: &ClientIdentity,
        outbox: &mut Outbox,
    ) -> BTreeSet<ContextId> {
        let owned: BTreeSet<ContextId> = self
            .contexts
            .iter()
            .filter(|(_, c)| c.owner() == client)
            .map(|(id, _)| *id)
            .collect();
        for id in &owned {
            self.remove(*id, outbox);
        }
        if !owned.is_empty() {
            info!(client = %client, count = owned.len(), "purged contexts of vanished client");
        }
        owned
    }

    /// Tears down every context, in ascending id order.
    pub fn drain_all(&mut self, outbox: &mut Outbox) {
        for id in self.ids() {
            self.remove(id, outbox);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
