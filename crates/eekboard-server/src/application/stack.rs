//! The context stack.
//!
//! The head of the stack is the one enabled context; every other context is
//! disabled. Pushing disables the old head before the new one is enabled, so
//! observers always see `Disabled` for the old head first.

use eekboard_core::{ClientIdentity, ContextId, Outbox};
use thiserror::Error;
use tracing::debug;

use super::registry::ContextRegistry;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StackError {
    #[error("context {0} not found")]
    NotFound(ContextId),

    #[error("the stack head {head} is not owned by {requester}")]
    NotOwner {
        head: ContextId,
        requester: ClientIdentity,
    },

    /// Pushing a context that sits below the head would leave two entries
    /// for one context.
    #[error("context {0} is already on the stack")]
    AlreadyOnStack(ContextId),
}

/// Ids of stacked contexts. The last element is the head.
#[derive(Debug, Default)]
pub struct ContextStack {
    entries: Vec<ContextId>,
}

impl ContextStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn head(&self) -> Option<ContextId> {
        self.entries.last().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: ContextId) -> bool {
        self.entries.contains(&id)
    }

    /// Head first.
    pub fn iter(&self) -> impl Iterator<Item = ContextId> + '_ {
        self.entries.iter().rev().copied()
    }

    /// Makes `id` the enabled head.
    ///
    /// Pushing the current head again is a no-op.
    pub fn push(
        &mut self,
        id: ContextId,
        registry: &mut ContextRegistry,
        outbox: &mut Outbox,
    ) -> Result<(), StackError> {
        if !registry.contains(id) {
            return Err(StackError::NotFound(id));
        }
        if self.head() == Some(id) {
            return Ok(());
        }
        if self.contains(id) {
            return Err(StackError::AlreadyOnStack(id));
        }

        if let Some(old) = self.head().and_then(|h| registry.lookup_mut(h)) {
            old.disable(outbox);
        }
        self.entries.push(id);
        self.enable_head(registry, outbox);
        debug!(context = %id, depth = self.entries.len(), "context pushed");
        Ok(())
    }

    /// Pops the head on behalf of `requester`, which must own it.
    ///
    /// Returns the popped id, or `None` if the stack was empty.
    pub fn pop(
        &mut self,
        requester: &ClientIdentity,
        registry: &mut ContextRegistry,
        outbox: &mut Outbox,
    ) -> Result<Option<ContextId>, StackError> {
        let Some(head) = self.head() else {
            return Ok(None);
        };
        if registry.owner_of(head) != Some(requester) {
            return Err(StackError::NotOwner {
                head,
                requester: requester.clone(),
            });
        }

        if let Some(context) = registry.lookup_mut(head) {
            context.disable(outbox);
        }
        self.entries.pop();
        self.enable_head(registry, outbox);
        debug!(context = %head, depth = self.entries.len(), "context popped");
        Ok(Some(head))
    }

    /// Drops `id` wherever it sits. If it was the head, the context below is
    /// enabled.
    ///
    /// The removed context itself is not touched; callers tear it down
    /// through the registry.
    pub fn remove(&mut self, id: ContextId, registry: &mut ContextRegistry, outbox: &mut Outbox) {
        let was_head = self.head() == Some(id);
        self.entries.retain(|e| *e != id);
        if was_head {
            self.enable_head(registry, outbox);
        }
    }

    /// Keeps only entries for which `keep` returns `true`, preserving order.
    ///
    /// Does not enable anything; call [`ContextStack::enable_head`] after.
    pub fn retain(&mut self, mut keep: impl FnMut(ContextId) -> bool) {
        self.entries.retain(|id| keep(*id));
    }

    /// Enables the current head, if it is still registered.
    pub fn enable_head(&self, registry: &mut ContextRegistry, outbox: &mut Outbox) {
        if let Some(context) = self.head().and_then(|h| registry.lookup_mut(h)) {
            context.enable(outbox);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
