//! Batched metadata resolution for one provider.

use std::sync::Arc;

use log::warn;

use omnisearch_provider_api::{CancellationToken, ResultId, ResultMeta, SearchProvider};

use crate::cache::ResultCache;

/// Outcome of a metadata request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fetch {
    /// Every requested id was already cached; no provider call was made.
    Complete,
    /// A batched provider call is outstanding; the continuation will fire.
    Requested,
}

/// Resolves result ids to metadata through one provider, consulting the
/// session's cache first and validating the provider's replies.
pub(crate) struct ResultFetcher {
    provider: Arc<dyn SearchProvider>,
}

impl ResultFetcher {
    pub(crate) fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self { provider }
    }

    pub(crate) fn provider(&self) -> &Arc<dyn SearchProvider> {
        &self.provider
    }

    /// Request metadata for the ids in `wanted` that are missing from
    /// `cache`. Returns [`Fetch::Complete`] without any provider call when
    /// nothing is missing; otherwise issues one batched request and hands the
    /// requested ids, the reply, and the fetch token to `on_metas`.
    pub(crate) fn fetch<F>(
        &self,
        cache: &ResultCache,
        wanted: &[ResultId],
        token: CancellationToken,
        on_metas: F,
    ) -> Fetch
    where
        F: FnOnce(Vec<ResultId>, Vec<ResultMeta>, CancellationToken) + Send + 'static,
    {
        let missing = cache.missing_from(wanted);
        if missing.is_empty() {
            return Fetch::Complete;
        }

        let requested = missing.clone();
        let reply_token = token.clone();
        self.provider.result_metas(
            &missing,
            Box::new(move |metas| on_metas(requested, metas, reply_token)),
            token,
        );
        Fetch::Requested
    }

    /// Validate a reply that arrived with a live token and cache it.
    ///
    /// Shape faults (wrong count, metas missing required fields) are logged
    /// and reported as `false`, which callers treat as an empty update for
    /// this provider this round. Nothing is cached on failure.
    pub(crate) fn resolve(
        &self,
        cache: &mut ResultCache,
        requested: &[ResultId],
        metas: Vec<ResultMeta>,
    ) -> bool {
        let provider_id = self.provider.id();
        if metas.len() != requested.len() {
            warn!(
                "wrong number of result metas from search provider {provider_id}: expected {}, got {}",
                requested.len(),
                metas.len()
            );
            return false;
        }
        if metas.iter().any(|meta| !meta.is_valid()) {
            warn!("invalid result meta from search provider {provider_id}");
            return false;
        }

        for meta in metas {
            cache.insert(meta);
        }
        true
    }

    /// Log a reply that arrived after its token was cancelled. An empty
    /// payload is the well-behaved case and stays silent.
    pub(crate) fn discard_stale(&self, meta_count: usize) {
        if meta_count > 0 {
            warn!(
                "search provider {} returned results after the request was canceled",
                self.provider.id()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    use omnisearch_provider_api::{MetaCallback, ProviderKind, ResultCallback};

    struct ScriptedProvider {
        metas: Mutex<Vec<ResultMeta>>,
        meta_calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(metas: Vec<ResultMeta>) -> Self {
            Self {
                metas: Mutex::new(metas),
                meta_calls: AtomicUsize::new(0),
            }
        }
    }

    impl SearchProvider for ScriptedProvider {
        fn id(&self) -> &str {
            "scripted"
        }

        fn kind(&self) -> &ProviderKind {
            &ProviderKind::AppSearch
        }

        fn initial_result_set(
            &self,
            _terms: &[String],
            on_results: ResultCallback,
            _token: CancellationToken,
        ) {
            on_results(Vec::new());
        }

        fn subsearch_result_set(
            &self,
            _previous: &[ResultId],
            _terms: &[String],
            on_results: ResultCallback,
            _token: CancellationToken,
        ) {
            on_results(Vec::new());
        }

        fn result_metas(
            &self,
            _ids: &[ResultId],
            on_metas: MetaCallback,
            _token: CancellationToken,
        ) {
            self.meta_calls.fetch_add(1, AtomicOrdering::SeqCst);
            on_metas(self.metas.lock().expect("metas lock").clone());
        }
    }

    fn ids(names: &[&str]) -> Vec<ResultId> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn fully_cached_batch_skips_the_provider() {
        let provider = Arc::new(ScriptedProvider::new(Vec::new()));
        let fetcher = ResultFetcher::new(Arc::clone(&provider) as Arc<dyn SearchProvider>);

        let mut cache = ResultCache::new();
        cache.insert(ResultMeta::new("a", "Alpha"));

        let outcome = fetcher.fetch(
            &cache,
            &ids(&["a"]),
            CancellationToken::new(),
            |_, _, _| {},
        );
        assert_eq!(outcome, Fetch::Complete);
        assert_eq!(provider.meta_calls.load(AtomicOrdering::SeqCst), 0);
    }

    #[test]
    fn only_missing_ids_are_requested() {
        let provider = Arc::new(ScriptedProvider::new(vec![ResultMeta::new("b", "Beta")]));
        let fetcher = ResultFetcher::new(Arc::clone(&provider) as Arc<dyn SearchProvider>);

        let mut cache = ResultCache::new();
        cache.insert(ResultMeta::new("a", "Alpha"));

        let requested: Arc<Mutex<Vec<ResultId>>> = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requested);
        let outcome = fetcher.fetch(
            &cache,
            &ids(&["a", "b"]),
            CancellationToken::new(),
            move |requested, _, _| {
                *seen.lock().expect("seen lock") = requested;
            },
        );
        assert_eq!(outcome, Fetch::Requested);
        assert_eq!(*requested.lock().expect("requested lock"), ids(&["b"]));
    }

    #[test]
    fn wrong_count_is_a_fault_and_caches_nothing() {
        let provider = Arc::new(ScriptedProvider::new(Vec::new()));
        let fetcher = ResultFetcher::new(provider as Arc<dyn SearchProvider>);

        let mut cache = ResultCache::new();
        let ok = fetcher.resolve(&mut cache, &ids(&["a", "b"]), vec![ResultMeta::new("a", "A")]);
        assert!(!ok);
        assert!(cache.is_empty());
    }

    #[test]
    fn invalid_meta_is_a_fault() {
        let provider = Arc::new(ScriptedProvider::new(Vec::new()));
        let fetcher = ResultFetcher::new(provider as Arc<dyn SearchProvider>);

        let mut cache = ResultCache::new();
        let ok = fetcher.resolve(
            &mut cache,
            &ids(&["a", "b"]),
            vec![ResultMeta::new("a", "A"), ResultMeta::new("b", "")],
        );
        assert!(!ok);
        assert!(cache.is_empty());
    }

    #[test]
    fn valid_reply_caches_every_meta() {
        let provider = Arc::new(ScriptedProvider::new(Vec::new()));
        let fetcher = ResultFetcher::new(provider as Arc<dyn SearchProvider>);

        let mut cache = ResultCache::new();
        let ok = fetcher.resolve(
            &mut cache,
            &ids(&["a", "b"]),
            vec![ResultMeta::new("a", "A"), ResultMeta::new("b", "B")],
        );
        assert!(ok);
        assert_eq!(cache.len(), 2);
        assert!(cache.contains("a"));
        assert!(cache.contains("b"));
    }
}
