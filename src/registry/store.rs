//! Client registry implementation
//!
//! Bounded, insertion-ordered collection of subscribers. Membership only
//! changes through `admit` and `prune`; everything else can flag an entry
//! inactive but never removes it.

use std::time::Instant;

use super::config::RegistryConfig;
use super::entry::{ClientEntry, ClientId, ClientSummary};
use super::error::{RegistryError, Rejected};
use crate::transport::Transport;

/// Bounded set of stream subscribers
///
/// Not synchronized on its own. The owning service keeps it behind a single
/// lock so admission, pruning and fanout iteration never interleave.
pub struct ClientRegistry<T> {
    /// Entries in admission order
    entries: Vec<ClientEntry<T>>,

    /// Next ID to hand out
    next_id: u64,

    /// Configuration
    config: RegistryConfig,
}

impl<T: Transport> ClientRegistry<T> {
    /// Create a registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            entries: Vec::with_capacity(config.max_clients),
            next_id: 1,
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.config.max_clients
    }

    /// Number of entries, including inactive ones awaiting prune
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether another admission would be refused
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.config.max_clients
    }

    /// Number of entries still being served
    pub fn active_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_active()).count()
    }

    /// Admit a new subscriber
    ///
    /// Refuses with `CapacityExceeded` when the registry is full, returning
    /// the transport untouched.
    pub fn admit(&mut self, transport: T) -> Result<ClientId, Rejected<T>> {
        if self.is_full() {
            return Err(Rejected {
                transport,
                error: RegistryError::CapacityExceeded {
                    capacity: self.config.max_clients,
                },
            });
        }

        let id = ClientId(self.next_id);
        self.next_id += 1;

        let peer = transport.peer();
        self.entries
            .push(ClientEntry::new(id, transport, Instant::now()));

        tracing::info!(
            client_id = %id,
            peer = %peer,
            clients = self.entries.len(),
            capacity = self.config.max_clients,
            "Client admitted"
        );

        Ok(id)
    }

    /// Visit every active entry in admission order
    pub fn for_each_active<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut ClientEntry<T>),
    {
        for entry in self.entries.iter_mut().filter(|e| e.is_active()) {
            f(entry);
        }
    }

    /// Iterate active entries in admission order
    ///
    /// Used by the fanout loop, which needs to await between entries.
    pub fn active_entries_mut(&mut self) -> impl Iterator<Item = &mut ClientEntry<T>> {
        self.entries.iter_mut().filter(|e| e.is_active())
    }

    /// Flag an entry inactive; idempotent
    ///
    /// Returns `false` if no entry has that ID.
    pub fn mark_inactive(&mut self, id: ClientId) -> bool {
        match self.entries.iter_mut().find(|e| e.id() == id) {
            Some(entry) => {
                entry.mark_inactive();
                true
            }
            None => false,
        }
    }

    /// Look up an entry
    pub fn get(&self, id: ClientId) -> Option<&ClientEntry<T>> {
        self.entries.iter().find(|e| e.id() == id)
    }

    /// IDs of all entries in admission order
    pub fn ids(&self) -> Vec<ClientId> {
        self.entries.iter().map(|e| e.id()).collect()
    }

    /// Summaries of all entries in admission order
    pub fn summaries(&self) -> Vec<ClientSummary> {
        let now = Instant::now();
        self.entries.iter().map(|e| e.summary(now)).collect()
    }

    /// Remove inactive and disconnected entries
    ///
    /// Stable: survivors keep their relative order. Returns the removed IDs.
    pub fn prune(&mut self) -> Vec<ClientId> {
        let mut removed = Vec::new();

        self.entries.retain(|entry| {
            if entry.is_live() {
                return true;
            }
            removed.push(entry.id());
            false
        });

        for id in &removed {
            tracing::info!(client_id = %id, "Client pruned");
        }
        if !removed.is_empty() {
            tracing::debug!(
                removed = removed.len(),
                remaining = self.entries.len(),
                "Prune complete"
            );
        }

        removed
    }
}

impl<T: Transport> Default for ClientRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
