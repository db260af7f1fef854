use std::sync::Once;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

static INIT: Once = Once::new();

/// Route `log` records to a compact subscriber filtered by `RUST_LOG`, once per test binary.
pub fn init_logging() {
    INIT.call_once(|| {
        Registry::default()
            .with(EnvFilter::from_default_env())
            .with(fmt::layer().compact().with_test_writer())
            .init()
    })
}
