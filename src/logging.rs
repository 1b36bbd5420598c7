//! Logging setup for the binary. Library code only emits through the `log`
//! facade; embedders install whatever logger they prefer.

use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize `env_logger` once, honoring `RUST_LOG`. Safe to call from
/// multiple entry points.
pub fn initialize() {
    INIT.call_once(|| {
        env_logger::Builder::from_default_env()
            .format_timestamp_millis()
            .init();
    });
}
