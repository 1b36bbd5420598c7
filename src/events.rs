//! Typed event surface consumed by the view layer.
//!
//! Each event is a strongly-typed callback registration instead of a
//! stringly-named signal; handlers run synchronously on the controller's
//! owner thread while it pumps.

use omnisearch_provider_api::ResultId;

/// Aggregate search status derived from per-provider progress flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    /// At least one provider is still working and nothing is visible yet.
    Searching,
    /// Every provider settled without visible results.
    NoResults,
    /// At least one provider has visible results.
    Results,
}

/// Weak reference to the first visible result across all providers, in
/// provider-registration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultResult {
    pub provider_id: String,
    pub result_id: ResultId,
}

/// Outcome of activating a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// The provider performed its own activation.
    Handled {
        provider_id: String,
        result_id: ResultId,
    },
    /// The provider declined; the host should launch the id generically.
    LaunchById { result_id: ResultId },
}

/// Observer registrations for the controller's emitted surface.
#[derive(Default)]
pub struct ControllerEvents {
    terms_changed: Vec<Box<dyn Fn(&[String]) + Send>>,
    status_changed: Vec<Box<dyn Fn(SearchStatus) + Send>>,
    provider_updated: Vec<Box<dyn Fn(&str) + Send>>,
    default_changed: Vec<Box<dyn Fn(Option<&DefaultResult>, bool) + Send>>,
    activation: Vec<Box<dyn Fn(&Activation) + Send>>,
}

impl ControllerEvents {
    /// Fired whenever a new non-duplicate, non-empty query is accepted.
    pub fn on_terms_changed(&mut self, handler: impl Fn(&[String]) + Send + 'static) {
        self.terms_changed.push(Box::new(handler));
    }

    /// Fired when the aggregate status changes.
    pub fn on_status_changed(&mut self, handler: impl Fn(SearchStatus) + Send + 'static) {
        self.status_changed.push(Box::new(handler));
    }

    /// Fired after a provider's displayed result set changed.
    pub fn on_provider_updated(&mut self, handler: impl Fn(&str) + Send + 'static) {
        self.provider_updated.push(Box::new(handler));
    }

    /// Fired when the default result changes or its highlight toggles. The
    /// boolean carries the current highlight mode.
    pub fn on_default_changed(
        &mut self,
        handler: impl Fn(Option<&DefaultResult>, bool) + Send + 'static,
    ) {
        self.default_changed.push(Box::new(handler));
    }

    /// Fired when a result is activated.
    pub fn on_activation(&mut self, handler: impl Fn(&Activation) + Send + 'static) {
        self.activation.push(Box::new(handler));
    }

    pub(crate) fn emit_terms_changed(&self, terms: &[String]) {
        for handler in &self.terms_changed {
            handler(terms);
        }
    }

    pub(crate) fn emit_status_changed(&self, status: SearchStatus) {
        for handler in &self.status_changed {
            handler(status);
        }
    }

    pub(crate) fn emit_provider_updated(&self, provider_id: &str) {
        for handler in &self.provider_updated {
            handler(provider_id);
        }
    }

    pub(crate) fn emit_default_changed(&self, default: Option<&DefaultResult>, highlighted: bool) {
        for handler in &self.default_changed {
            handler(default, highlighted);
        }
    }

    pub(crate) fn emit_activation(&self, activation: &Activation) {
        for handler in &self.activation {
            handler(activation);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::Mutex;

    #[test]
    fn handlers_receive_emissions() {
        let mut events = ControllerEvents::default();
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&seen);
        events.on_terms_changed(move |terms| {
            log.lock().expect("log lock").push(terms.join(" "));
        });
        let log = Arc::clone(&seen);
        events.on_status_changed(move |status| {
            log.lock().expect("log lock").push(format!("{status:?}"));
        });

        events.emit_terms_changed(&["fire".to_string(), "fox".to_string()]);
        events.emit_status_changed(SearchStatus::Searching);

        let seen = seen.lock().expect("log lock");
        assert_eq!(seen.as_slice(), ["fire fox", "Searching"]);
    }

    #[test]
    fn all_registered_handlers_run() {
        let mut events = ControllerEvents::default();
        let count = Arc::new(Mutex::new(0usize));
        for _ in 0..3 {
            let count = Arc::clone(&count);
            events.on_provider_updated(move |_| *count.lock().expect("count lock") += 1);
        }
        events.emit_provider_updated("applications");
        assert_eq!(*count.lock().expect("count lock"), 3);
    }
}
