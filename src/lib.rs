//! Incremental multi-provider search aggregation.
//!
//! The root module re-exports the controller surface so that embedders can
//! wire a search box without digging through the module hierarchy.

pub mod app_dirs;
pub mod cache;
pub mod controller;
pub mod discovery;
pub mod events;
pub mod logging;
pub mod registry;
pub mod remote;
pub mod session;
pub mod settings;
pub mod timer;

mod fetcher;

pub use controller::{DEBOUNCE_DELAY, ControllerEvent, QueryController};
pub use discovery::{DiscoveryCallback, ManifestDiscovery, ProviderDiscovery, ProviderManifest};
pub use events::{Activation, ControllerEvents, DefaultResult, SearchStatus};
pub use registry::ProviderRegistry;
pub use remote::{RemoteProvider, RemoteTransport, TransportFactory};
pub use session::{MAX_LIST_RESULTS, ProviderSession};
pub use settings::SearchSettings;
pub use timer::{ManualTimer, ThreadTimer, Timer, TimerHandle};
