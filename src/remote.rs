//! Externally discovered providers, bridged over an opaque transport.

use std::sync::Arc;

use omnisearch_provider_api::{
    CancellationToken, MetaCallback, ProviderInfo, ProviderKind, ResultCallback, ResultId,
    SearchProvider,
};

/// The IPC boundary to one remote provider process.
///
/// Replies arrive on arbitrary threads whenever the remote answers; the
/// bridging provider applies cancellation before forwarding them.
pub trait RemoteTransport: Send + Sync {
    /// Run a full query.
    fn query(&self, terms: &[String], reply: ResultCallback);

    /// Refine a previous result set for an extended query.
    fn query_within(&self, previous: &[ResultId], terms: &[String], reply: ResultCallback);

    /// Resolve result ids to metadata.
    fn fetch_metas(&self, ids: &[ResultId], reply: MetaCallback);

    /// Ask the remote to activate a result. Returns `false` when the remote
    /// does not handle activation itself.
    fn activate(&self, _id: &str, _terms: &[String]) -> bool {
        false
    }

    /// Open the remote's own search UI for the current terms.
    fn launch(&self, _terms: &[String]) {}
}

/// Connects transports for discovered providers. Returning `None` marks the
/// provider unreachable; discovery treats it as absent.
pub trait TransportFactory: Send + Sync {
    fn connect(&self, provider_id: &str) -> Option<Arc<dyn RemoteTransport>>;
}

/// A list-style provider backed by a [`RemoteTransport`].
pub struct RemoteProvider {
    id: String,
    kind: ProviderKind,
    can_launch_search: bool,
    transport: Arc<dyn RemoteTransport>,
}

impl RemoteProvider {
    #[must_use]
    pub fn new(
        id: String,
        info: ProviderInfo,
        can_launch_search: bool,
        transport: Arc<dyn RemoteTransport>,
    ) -> Self {
        Self {
            id,
            kind: ProviderKind::Remote(info),
            can_launch_search,
            transport,
        }
    }
}

/// Wrap a reply callback so a late answer for a cancelled request is dropped
/// instead of resurfacing in a newer round.
fn guarded<T: Send + 'static>(
    token: CancellationToken,
    reply: Box<dyn FnOnce(T) + Send>,
) -> Box<dyn FnOnce(T) + Send> {
    Box::new(move |payload| {
        if !token.is_cancelled() {
            reply(payload);
        }
    })
}

impl SearchProvider for RemoteProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> &ProviderKind {
        &self.kind
    }

    fn can_launch_search(&self) -> bool {
        self.can_launch_search
    }

    fn initial_result_set(
        &self,
        terms: &[String],
        on_results: ResultCallback,
        token: CancellationToken,
    ) {
        self.transport.query(terms, guarded(token, on_results));
    }

    fn subsearch_result_set(
        &self,
        previous: &[ResultId],
        terms: &[String],
        on_results: ResultCallback,
        token: CancellationToken,
    ) {
        self.transport
            .query_within(previous, terms, guarded(token, on_results));
    }

    fn result_metas(&self, ids: &[ResultId], on_metas: MetaCallback, token: CancellationToken) {
        // The session logs a non-empty cancelled reply as a provider fault;
        // the transport bridge is not the misbehaving party, so late answers
        // are swallowed here instead.
        self.transport.fetch_metas(ids, guarded(token, on_metas));
    }

    fn activate_result(&self, id: &str, terms: &[String]) -> bool {
        self.transport.activate(id, terms)
    }

    fn launch_search(&self, terms: &[String]) {
        self.transport.launch(terms);
    }
}
