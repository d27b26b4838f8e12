pub mod builders;
pub mod jobs;
pub mod logs;

use std::collections::BTreeMap;
use std::sync::Once;

use dojobber::NodeStatus;
use tracing_subscriber::{EnvFilter, fmt};

pub use builders::RegistryBuilder;
pub use jobs::{CallLog, CheckBehaviour, ScriptedJob};
pub use logs::{LogCapture, capture_logs};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Expected status map, for comparing against [`dojobber::DoJobber::statuses`].
pub fn statuses(entries: &[(&str, NodeStatus)]) -> BTreeMap<String, NodeStatus> {
    entries
        .iter()
        .map(|(name, status)| (name.to_string(), *status))
        .collect()
}
