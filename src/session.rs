//! Per-provider search state: progress flag, subsearch base, metadata cache
//! and display bookkeeping.

use std::sync::Arc;

use omnisearch_provider_api::{CancellationToken, ResultId, ResultMeta, SearchProvider};

use crate::cache::ResultCache;
use crate::fetcher::{Fetch, ResultFetcher};

/// Results shown per list-style (remote) provider section.
pub const MAX_LIST_RESULTS: usize = 6;

/// Default rows in the application grid section.
pub const DEFAULT_APP_RESULTS: usize = 6;

/// A filtered update waiting for its metadata fetch to complete.
#[derive(Debug)]
pub(crate) struct PendingUpdate {
    pub(crate) filtered: Vec<ResultId>,
    pub(crate) more_count: usize,
}

/// State the aggregation core keeps for one registered provider.
///
/// Display state follows atomic-replace semantics: `displayed` always holds
/// either the previous complete result set or the new complete one. Updates
/// go clear → fetch metas (if needed) → populate → show; a pending update is
/// committed in one step once its metadata resolves.
pub struct ProviderSession {
    fetcher: ResultFetcher,
    cache: ResultCache,
    search_in_progress: bool,
    cached_result_ids: Option<Vec<ResultId>>,
    /// Single live token for the provider's outstanding metadata fetch.
    fetch_token: CancellationToken,
    pending: Option<PendingUpdate>,
    displayed: Vec<ResultId>,
    visible: bool,
    more_count: usize,
    max_displayed: usize,
}

impl ProviderSession {
    pub(crate) fn new(provider: Arc<dyn SearchProvider>, max_displayed: usize) -> Self {
        Self {
            fetcher: ResultFetcher::new(provider),
            cache: ResultCache::new(),
            search_in_progress: false,
            cached_result_ids: None,
            fetch_token: CancellationToken::new(),
            pending: None,
            displayed: Vec::new(),
            visible: false,
            more_count: 0,
            max_displayed,
        }
    }

    /// The provider backing this session.
    #[must_use]
    pub fn provider(&self) -> &Arc<dyn SearchProvider> {
        self.fetcher.provider()
    }

    /// Whether this session's round of the current query is still running.
    #[must_use]
    pub fn search_in_progress(&self) -> bool {
        self.search_in_progress
    }

    /// Ordered result ids currently shown for this provider.
    #[must_use]
    pub fn displayed(&self) -> &[ResultId] {
        &self.displayed
    }

    /// Whether the provider's section is currently visible (non-empty).
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Count reported by the "N more" affordance; always 0 for providers
    /// that cannot launch their own search.
    #[must_use]
    pub fn more_count(&self) -> usize {
        self.more_count
    }

    /// Cached metadata for a displayed result id.
    #[must_use]
    pub fn meta(&self, id: &str) -> Option<&ResultMeta> {
        self.cache.get(id)
    }

    /// First visible result, the candidate for the cross-provider default.
    #[must_use]
    pub fn first_result(&self) -> Option<&ResultId> {
        if self.visible { self.displayed.first() } else { None }
    }

    #[must_use]
    pub(crate) fn max_displayed(&self) -> usize {
        self.max_displayed
    }

    pub(crate) fn set_max_displayed(&mut self, max_displayed: usize) {
        self.max_displayed = max_displayed;
    }

    pub(crate) fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Start a round for a new query: mark the session in progress and take
    /// the previous full result set as a potential subsearch base.
    pub(crate) fn begin_round(&mut self) -> Option<Vec<ResultId>> {
        self.search_in_progress = true;
        self.cached_result_ids.take()
    }

    pub(crate) fn finish_round(&mut self) {
        self.search_in_progress = false;
    }

    /// Record the provider's result set for this query; it becomes the
    /// subsearch base for an immediately-following prefix extension.
    pub(crate) fn store_results(&mut self, results: Vec<ResultId>) {
        self.cached_result_ids = Some(results);
    }

    #[cfg(test)]
    pub(crate) fn cached_result_ids(&self) -> Option<&Vec<ResultId>> {
        self.cached_result_ids.as_ref()
    }

    /// Cap the provider-filtered set and derive the "more" count from the
    /// full set size. `more` only surfaces when the provider can launch its
    /// own search; otherwise the affordance is meaningless and reads 0.
    pub(crate) fn cap_results(&self, filtered: Vec<ResultId>, total: usize) -> (Vec<ResultId>, usize) {
        let mut filtered = filtered;
        filtered.truncate(self.max_displayed);
        let more = total.saturating_sub(filtered.len());
        let more = if self.provider().can_launch_search() {
            more
        } else {
            0
        };
        (filtered, more)
    }

    /// Request metadata for a filtered update. On [`Fetch::Complete`] every
    /// meta was cached and the caller commits immediately; otherwise the
    /// update parks in `pending` until the continuation delivers.
    pub(crate) fn request_metas<F>(
        &mut self,
        update: PendingUpdate,
        parent: &CancellationToken,
        on_metas: F,
    ) -> Fetch
    where
        F: FnOnce(Vec<ResultId>, Vec<ResultMeta>, CancellationToken) + Send + 'static,
    {
        // Supersede any outstanding fetch before issuing the next one; at
        // most one fetch token is live per provider.
        self.fetch_token.cancel();
        self.fetch_token = parent.child();
        self.pending = None;

        let outcome = self
            .fetcher
            .fetch(&self.cache, &update.filtered, self.fetch_token.clone(), on_metas);
        match outcome {
            Fetch::Complete => self.commit_update(update),
            Fetch::Requested => self.pending = Some(update),
        }
        outcome
    }

    /// Apply a metadata reply for the pending update. Returns `true` when the
    /// round is finished (committed or failed); `false` when the reply was
    /// stale and the session is owned by a newer round.
    pub(crate) fn resolve_metas(
        &mut self,
        requested: &[ResultId],
        metas: Vec<ResultMeta>,
        token: &CancellationToken,
    ) -> bool {
        if token.is_cancelled() {
            self.fetcher.discard_stale(metas.len());
            return false;
        }

        let Some(pending) = self.pending.take() else {
            return false;
        };
        if self.fetcher.resolve(&mut self.cache, requested, metas) {
            self.commit_update(pending);
        } else {
            self.clear_display();
        }
        true
    }

    fn commit_update(&mut self, update: PendingUpdate) {
        self.displayed = update.filtered;
        self.more_count = update.more_count;
        self.visible = !self.displayed.is_empty();
    }

    /// Hide the section and drop its displayed results.
    pub(crate) fn clear_display(&mut self) {
        self.displayed.clear();
        self.visible = false;
        self.more_count = 0;
        self.pending = None;
    }

    /// Drop all per-query state: display, subsearch base and any outstanding
    /// fetch. The metadata cache survives; ids are re-validated by presence
    /// in the next result set.
    pub(crate) fn reset(&mut self) {
        self.fetch_token.cancel();
        self.clear_display();
        self.cached_result_ids = None;
        self.search_in_progress = false;
    }

    /// Cancel outstanding work ahead of unregistration.
    pub(crate) fn shutdown(&mut self) {
        self.fetch_token.cancel();
        self.pending = None;
    }
}
