//! Shared contract between the `omnisearch` aggregation core and the search
//! providers plugged into it.
//!
//! The aggregation core consumes this interface; providers implement it. The
//! crate deliberately carries no aggregation logic so that out-of-tree
//! providers only depend on the contract, not on the controller.

pub mod cancel;
pub mod error;
pub mod meta;
pub mod provider;

pub use cancel::CancellationToken;
pub use error::RegistryError;
pub use meta::{ResultId, ResultMeta};
pub use provider::{MetaCallback, ProviderInfo, ProviderKind, ResultCallback, SearchProvider};
