//! Per-provider cache of resolved result metadata.

use std::collections::HashMap;

use omnisearch_provider_api::{ResultId, ResultMeta};

/// Map from result id to resolved metadata for one provider.
///
/// Entries are never evicted during a session; the whole cache is dropped
/// with its provider on unregistration. Stale entries are harmless because
/// ids are re-validated by presence in each new result set.
#[derive(Debug, Default)]
pub struct ResultCache {
    metas: HashMap<ResultId, ResultMeta>,
}

impl ResultCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the cached metadata for a result id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ResultMeta> {
        self.metas.get(id)
    }

    /// Returns `true` when metadata for `id` is already resolved.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.metas.contains_key(id)
    }

    /// Store one resolved meta, keyed by its id.
    pub fn insert(&mut self, meta: ResultMeta) {
        self.metas.insert(meta.id.clone(), meta);
    }

    /// Return the subset of `ids` with no cached metadata, in input order.
    #[must_use]
    pub fn missing_from(&self, ids: &[ResultId]) -> Vec<ResultId> {
        ids.iter()
            .filter(|id| !self.contains(id))
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.metas.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metas.is_empty()
    }
}
