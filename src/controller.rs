//! The query controller: debouncing, query classification, result
//! aggregation and default-result selection.
//!
//! The controller is single-owner. Provider continuations and timer
//! callbacks never touch its state directly; they enqueue
//! [`ControllerEvent`]s on an internal channel, and the owner thread applies
//! them by pumping. Staleness is decided by the generation token's cancelled
//! flag, never by comparing token identity.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::time::{Duration, Instant};

use omnisearch_provider_api::{
    CancellationToken, RegistryError, ResultCallback, ResultId, ResultMeta, SearchProvider,
};

use crate::discovery::ProviderDiscovery;
use crate::events::{Activation, ControllerEvents, DefaultResult, SearchStatus};
use crate::fetcher::Fetch;
use crate::registry::ProviderRegistry;
use crate::session::PendingUpdate;
use crate::settings::SearchSettings;
use crate::timer::{Timer, TimerHandle};

/// Keystroke debounce before a query round starts.
pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(150);

/// Work item applied on the controller's owner thread.
pub enum ControllerEvent {
    DebounceElapsed {
        token: CancellationToken,
    },
    Results {
        provider_id: String,
        ids: Vec<ResultId>,
        token: CancellationToken,
    },
    Metas {
        provider_id: String,
        requested: Vec<ResultId>,
        metas: Vec<ResultMeta>,
        token: CancellationToken,
    },
    Discovered {
        providers: Vec<Arc<dyn SearchProvider>>,
    },
}

/// Aggregates provider result streams for one search box.
pub struct QueryController {
    registry: ProviderRegistry,
    events: ControllerEvents,
    timer: Box<dyn Timer>,
    tx: Sender<ControllerEvent>,
    rx: Receiver<ControllerEvent>,
    terms: Vec<String>,
    search_string: String,
    is_sub_search: bool,
    starting_search: bool,
    /// Token for the current query generation; superseded rounds observe it
    /// cancelled and fall silent.
    generation: CancellationToken,
    debounce: Option<TimerHandle>,
    default: Option<DefaultResult>,
    highlight_default: bool,
    status: Option<SearchStatus>,
}

impl QueryController {
    /// Build a controller around the built-in provider. Remote providers
    /// arrive later through [`Self::reload_external`].
    #[must_use]
    pub fn new(builtin: Arc<dyn SearchProvider>, timer: Box<dyn Timer>) -> Self {
        let (tx, rx) = channel();
        Self {
            registry: ProviderRegistry::with_builtin(builtin),
            events: ControllerEvents::default(),
            timer,
            tx,
            rx,
            terms: Vec::new(),
            search_string: String::new(),
            is_sub_search: false,
            starting_search: false,
            generation: CancellationToken::new(),
            debounce: None,
            default: None,
            highlight_default: false,
            status: None,
        }
    }

    /// Observer registrations.
    pub fn events_mut(&mut self) -> &mut ControllerEvents {
        &mut self.events
    }

    /// Register an additional provider directly, outside the discovery cycle.
    pub fn register(&mut self, provider: Arc<dyn SearchProvider>) -> Result<(), RegistryError> {
        self.registry.register(provider)
    }

    #[must_use]
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Current query terms.
    #[must_use]
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Aggregate progress: true from query acceptance until every session
    /// settles.
    #[must_use]
    pub fn search_in_progress(&self) -> bool {
        self.starting_search || self.registry.iter().any(|(_, s)| s.search_in_progress())
    }

    /// The current default result, if any provider has visible results.
    #[must_use]
    pub fn top_result(&self) -> Option<DefaultResult> {
        self.default.clone()
    }

    /// Accept a new query. Duplicate of the current query string → no-op,
    /// checked before anything is cancelled. Empty → reset with no provider
    /// calls. Otherwise classify full vs. subsearch and (re)arm the debounce.
    pub fn set_terms(&mut self, terms: &[String]) {
        let joined = terms.join(" ");
        if joined == self.search_string {
            return;
        }

        self.generation.cancel();
        self.generation = CancellationToken::new();
        if let Some(handle) = self.debounce.take() {
            self.timer.cancel(&handle);
        }

        let previous = std::mem::replace(&mut self.search_string, joined.clone());
        self.terms = terms.to_vec();

        if joined.is_empty() {
            self.reset();
            return;
        }

        self.is_sub_search = !previous.is_empty() && joined.starts_with(&previous);
        self.starting_search = true;

        let tx = self.tx.clone();
        let token = self.generation.clone();
        let handle = self.timer.schedule(
            DEBOUNCE_DELAY,
            Box::new(move || {
                let _ = tx.send(ControllerEvent::DebounceElapsed { token });
            }),
        );
        self.debounce = Some(handle);

        self.events.emit_terms_changed(&self.terms);
        self.update_search_progress();
    }

    /// Drop all query state without calling any provider.
    fn reset(&mut self) {
        self.is_sub_search = false;
        self.starting_search = false;
        for (_, session) in self.registry.iter_mut() {
            session.reset();
        }
        self.recompute_default();
        self.update_search_progress();
    }

    /// Apply every queued event. Call from the owner thread whenever
    /// continuations may have arrived.
    pub fn pump(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            self.handle_event(event);
        }
    }

    /// Pump until every session settles or `timeout` elapses. Returns `true`
    /// when the search settled.
    pub fn pump_until_settled(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.pump();
            if !self.search_in_progress() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            match self.rx.recv_timeout(deadline - now) {
                Ok(event) => self.handle_event(event),
                Err(_) => return !self.search_in_progress(),
            }
        }
    }

    fn handle_event(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::DebounceElapsed { token } => {
                if token.is_cancelled() {
                    return;
                }
                self.debounce = None;
                self.do_search(token);
            }
            ControllerEvent::Results {
                provider_id,
                ids,
                token,
            } => {
                if token.is_cancelled() {
                    return;
                }
                self.handle_results(&provider_id, ids, &token);
            }
            ControllerEvent::Metas {
                provider_id,
                requested,
                metas,
                token,
            } => {
                self.handle_metas(&provider_id, &requested, metas, &token);
            }
            ControllerEvent::Discovered { providers } => {
                self.registry.register_discovered(providers);
            }
        }
    }

    /// Fan the query out to every session under the generation token.
    fn do_search(&mut self, token: CancellationToken) {
        self.starting_search = false;

        let mut calls = Vec::with_capacity(self.registry.len());
        for (id, session) in self.registry.iter_mut() {
            let base = session.begin_round();
            calls.push((id.to_string(), Arc::clone(session.provider()), base));
        }

        for (provider_id, provider, base) in calls {
            let tx = self.tx.clone();
            let reply_token = token.clone();
            let event_id = provider_id.clone();
            let on_results: ResultCallback = Box::new(move |ids| {
                let _ = tx.send(ControllerEvent::Results {
                    provider_id: event_id,
                    ids,
                    token: reply_token,
                });
            });

            if self.is_sub_search
                && let Some(base) = base
            {
                provider.subsearch_result_set(&base, &self.terms, on_results, token.clone());
            } else {
                provider.initial_result_set(&self.terms, on_results, token.clone());
            }
        }
        self.update_search_progress();
    }

    /// A provider delivered its result set for the current round.
    fn handle_results(&mut self, provider_id: &str, ids: Vec<ResultId>, token: &CancellationToken) {
        let Some(session) = self.registry.get_mut(provider_id) else {
            return;
        };

        let total = ids.len();
        session.store_results(ids.clone());

        let provider = Arc::clone(session.provider());
        let filtered = provider.filter_results(ids, session.max_displayed());
        let (filtered, more_count) = session.cap_results(filtered, total);

        if filtered.is_empty() {
            session.clear_display();
            self.finish_round(provider_id);
            return;
        }

        let tx = self.tx.clone();
        let event_id = provider_id.to_string();
        let outcome = session.request_metas(
            PendingUpdate {
                filtered,
                more_count,
            },
            token,
            move |requested, metas, reply_token| {
                let _ = tx.send(ControllerEvent::Metas {
                    provider_id: event_id,
                    requested,
                    metas,
                    token: reply_token,
                });
            },
        );
        if outcome == Fetch::Complete {
            self.finish_round(provider_id);
        }
    }

    fn handle_metas(
        &mut self,
        provider_id: &str,
        requested: &[ResultId],
        metas: Vec<ResultMeta>,
        token: &CancellationToken,
    ) {
        let Some(session) = self.registry.get_mut(provider_id) else {
            return;
        };
        if session.resolve_metas(requested, metas, token) {
            self.finish_round(provider_id);
        }
    }

    /// One session settled; refresh the aggregate view.
    fn finish_round(&mut self, provider_id: &str) {
        if let Some(session) = self.registry.get_mut(provider_id) {
            session.finish_round();
        }
        self.recompute_default();
        self.update_search_progress();
        self.events.emit_provider_updated(provider_id);
    }

    /// First visible result in registration order wins, independent of the
    /// order sessions completed in.
    fn recompute_default(&mut self) {
        let next = self.registry.iter().find_map(|(id, session)| {
            session.first_result().map(|result_id| DefaultResult {
                provider_id: id.to_string(),
                result_id: result_id.clone(),
            })
        });
        if next != self.default {
            self.default = next;
            self.events
                .emit_default_changed(self.default.as_ref(), self.highlight_default);
        }
    }

    fn update_search_progress(&mut self) {
        let any_visible = self.registry.iter().any(|(_, session)| session.is_visible());
        let status = if any_visible {
            SearchStatus::Results
        } else if self.search_in_progress() {
            SearchStatus::Searching
        } else {
            SearchStatus::NoResults
        };
        if self.status != Some(status) {
            self.status = Some(status);
            self.events.emit_status_changed(status);
        }
    }

    /// Toggle default-result highlighting; re-emits the current default so
    /// observers can apply the new mode.
    pub fn highlight_default(&mut self, highlighted: bool) {
        if self.highlight_default != highlighted {
            self.highlight_default = highlighted;
            self.events
                .emit_default_changed(self.default.as_ref(), highlighted);
        }
    }

    /// Activate a result. When the provider declines, fall back to generic
    /// launch-by-id.
    pub fn activate(&mut self, provider_id: &str, result_id: &str) -> Activation {
        let handled = self
            .registry
            .get(provider_id)
            .is_some_and(|session| session.provider().activate_result(result_id, &self.terms));

        let activation = if handled {
            Activation::Handled {
                provider_id: provider_id.to_string(),
                result_id: result_id.to_string(),
            }
        } else {
            Activation::LaunchById {
                result_id: result_id.to_string(),
            }
        };
        self.events.emit_activation(&activation);
        activation
    }

    /// Activate the current default result, if any.
    pub fn activate_default(&mut self) -> Option<Activation> {
        let default = self.default.clone()?;
        Some(self.activate(&default.provider_id, &default.result_id))
    }

    /// Hand the current terms to a provider's own search UI.
    pub fn launch_provider_search(&self, provider_id: &str) {
        if let Some(session) = self.registry.get(provider_id) {
            let provider = session.provider();
            if provider.can_launch_search() {
                provider.launch_search(&self.terms);
            }
        }
    }

    /// Replace the external provider set: every remote session is dropped,
    /// then discovery repopulates asynchronously through the event channel.
    /// The built-in provider is untouched.
    pub fn reload_external(&mut self, discovery: &dyn ProviderDiscovery, settings: &SearchSettings) {
        if let Some(rows) = settings.app_rows {
            self.registry.set_app_rows(rows);
        }
        for id in self.registry.remote_ids() {
            self.registry.unregister(&id);
        }

        let tx = self.tx.clone();
        discovery.discover(
            settings,
            Box::new(move |providers| {
                let _ = tx.send(ControllerEvent::Discovered { providers });
            }),
        );
    }
}

impl Drop for QueryController {
    fn drop(&mut self) {
        self.generation.cancel();
        if let Some(handle) = self.debounce.take() {
            self.timer.cancel(&handle);
        }
    }
}
