//! Ordered registry of active provider sessions.

use std::sync::Arc;

use indexmap::IndexMap;
use log::warn;

use omnisearch_provider_api::{RegistryError, SearchProvider};

use crate::session::{DEFAULT_APP_RESULTS, MAX_LIST_RESULTS, ProviderSession};

/// Registration-ordered, id-keyed set of [`ProviderSession`]s.
///
/// Registration order is display order and the tiebreak for default-result
/// selection, so it must be stable across the life of the registry.
#[derive(Default)]
pub struct ProviderRegistry {
    sessions: IndexMap<String, ProviderSession>,
    app_rows: usize,
}

impl ProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: IndexMap::new(),
            app_rows: DEFAULT_APP_RESULTS,
        }
    }

    /// Build a registry seeded with the built-in provider. The built-in is
    /// registered first so it always leads the display order, and it is never
    /// part of the external reload cycle.
    #[must_use]
    pub fn with_builtin(builtin: Arc<dyn SearchProvider>) -> Self {
        let mut registry = Self::new();
        let id = builtin.id().to_string();
        let session = ProviderSession::new(builtin, registry.app_rows);
        registry.sessions.insert(id, session);
        registry
    }

    /// Register a provider, appending its session after the existing ones.
    pub fn register(&mut self, provider: Arc<dyn SearchProvider>) -> Result<(), RegistryError> {
        let id = provider.id().to_string();
        if self.sessions.contains_key(&id) {
            return Err(RegistryError::DuplicateId { id });
        }
        let max_displayed = if provider.kind().is_remote() {
            MAX_LIST_RESULTS
        } else {
            self.app_rows
        };
        self.sessions
            .insert(id, ProviderSession::new(provider, max_displayed));
        Ok(())
    }

    /// Register every provider from a discovery batch, logging and skipping
    /// duplicates rather than failing the batch.
    pub fn register_discovered(&mut self, providers: Vec<Arc<dyn SearchProvider>>) {
        for provider in providers {
            if let Err(RegistryError::DuplicateId { id }) = self.register(provider) {
                warn!("ignoring search provider with duplicate id {id}");
            }
        }
    }

    /// Remove a provider's session, cancelling its outstanding fetch and
    /// dropping its metadata cache. Absent ids are a no-op.
    pub fn unregister(&mut self, id: &str) {
        if let Some(mut session) = self.sessions.shift_remove(id) {
            session.shutdown();
        }
    }

    /// Ids of every remote session, in registration order.
    #[must_use]
    pub fn remote_ids(&self) -> Vec<String> {
        self.sessions
            .iter()
            .filter(|(_, session)| session.provider().kind().is_remote())
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Rows shown in the app grid section; applies to the built-in session
    /// and any future `AppSearch` registrations.
    pub fn set_app_rows(&mut self, rows: usize) {
        self.app_rows = rows;
        for session in self.sessions.values_mut() {
            if !session.provider().kind().is_remote() {
                session.set_max_displayed(rows);
            }
        }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ProviderSession> {
        self.sessions.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut ProviderSession> {
        self.sessions.get_mut(id)
    }

    /// Sessions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProviderSession)> {
        self.sessions.iter().map(|(id, session)| (id.as_str(), session))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut ProviderSession)> {
        self.sessions
            .iter_mut()
            .map(|(id, session)| (id.as_str(), session))
    }

    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.sessions.keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
