use serde::{Deserialize, Serialize};

use crate::cancel::CancellationToken;
use crate::meta::{ResultId, ResultMeta};

/// Continuation receiving a provider's ordered result-id set.
pub type ResultCallback = Box<dyn FnOnce(Vec<ResultId>) + Send>;

/// Continuation receiving a batch of resolved result metadata.
pub type MetaCallback = Box<dyn FnOnce(Vec<ResultMeta>) + Send>;

/// Display metadata for a remote provider's section header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

impl ProviderInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            icon: None,
        }
    }
}

/// What kind of provider this is, checked exhaustively by the core.
///
/// `AppSearch` is the built-in application-index provider rendered as a grid
/// section; `Remote` providers carry the display info for their list-style
/// section header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderKind {
    AppSearch,
    Remote(ProviderInfo),
}

impl ProviderKind {
    /// Returns `true` for providers managed by the external reload cycle.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, ProviderKind::Remote(_))
    }
}

/// Capability contract every search provider must satisfy.
///
/// All query operations are asynchronous via callback continuation: a
/// provider may invoke the callback on the calling thread before returning or
/// from another thread later. A provider honoring its `CancellationToken`
/// simply never invokes the callback once the token is cancelled; the core
/// discards late deliveries either way.
pub trait SearchProvider: Send + Sync {
    /// Stable identifier, unique within one registry.
    fn id(&self) -> &str;

    /// Provider variant, fixed for the provider's lifetime.
    fn kind(&self) -> &ProviderKind;

    /// Whether the provider can open a full search for the current terms,
    /// making a "N more" affordance meaningful.
    fn can_launch_search(&self) -> bool {
        false
    }

    /// Compute the ordered result set for a fresh query.
    fn initial_result_set(
        &self,
        terms: &[String],
        on_results: ResultCallback,
        token: CancellationToken,
    );

    /// Refine a previous result set for a prefix-extended query.
    fn subsearch_result_set(
        &self,
        previous: &[ResultId],
        terms: &[String],
        on_results: ResultCallback,
        token: CancellationToken,
    );

    /// Resolve metadata for a batch of result ids. The reply must contain
    /// exactly one meta per requested id, in request order.
    fn result_metas(&self, ids: &[ResultId], on_metas: MetaCallback, token: CancellationToken);

    /// Rank and truncate a result set for display. The default keeps the
    /// provider's own ordering and truncates to `max_count`.
    fn filter_results(&self, results: Vec<ResultId>, max_count: usize) -> Vec<ResultId> {
        let mut results = results;
        results.truncate(max_count);
        results
    }

    /// Activate one result. Returning `false` means the provider has no
    /// activation of its own and the core falls back to generic
    /// launch-by-id behavior.
    fn activate_result(&self, _id: &str, _terms: &[String]) -> bool {
        false
    }

    /// Open the provider's own search UI for the given terms. Only invoked
    /// when [`can_launch_search`](Self::can_launch_search) is `true`.
    fn launch_search(&self, _terms: &[String]) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MinimalProvider(ProviderKind);

    impl SearchProvider for MinimalProvider {
        fn id(&self) -> &str {
            "minimal"
        }

        fn kind(&self) -> &ProviderKind {
            &self.0
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
            on_metas(Vec::new());
        }
    }

    #[test]
    fn default_filter_truncates_in_order() {
        let provider = MinimalProvider(ProviderKind::AppSearch);
        let ids: Vec<ResultId> = (0..9).map(|n| format!("id-{n}")).collect();
        let filtered = provider.filter_results(ids.clone(), 6);
        assert_eq!(filtered, ids[..6].to_vec());
    }

    #[test]
    fn defaults_are_conservative() {
        let provider = MinimalProvider(ProviderKind::Remote(ProviderInfo::new("Files")));
        assert!(!provider.can_launch_search());
        assert!(!provider.activate_result("id", &[]));
        assert!(provider.kind().is_remote());
    }
}
