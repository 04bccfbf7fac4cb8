//! Tracing setup shared by the integration tests.
//!
//! [`init_tracing`] installs one global `fmt` subscriber filtered by
//! `RUST_LOG` (default `info`). Output goes through the test writer, so it
//! shows up for failing tests or with `--nocapture`. Events from inside the
//! tree only exist when the crate is built with `--features tracing`.
//!
//! `OPTBST_LOG=json` prints one flat JSON object per event. The tree's
//! `key`, `node`, `parent`, `side` and `now` fields then sit at the top level:
//!
//! ```bash
//! OPTBST_LOG=json RUST_LOG=optimistic_bst::tree=trace \
//!     cargo test --features tracing --test concurrent_regression -- --nocapture \
//!     | jq -c 'select(.key == 16)'
//!
//! # Only successor-chain restarts, grouped by the node being removed
//! ... | jq -c 'select(.message == "remove: successor chain changed") | .node'
//! ```

use std::env;
use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

const DEFAULT_FILTER: &str = "info";

/// Install the test subscriber. Only the first call in a process does anything.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter: EnvFilter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_thread_ids(true);

        // Err only if something else already owns the global default.
        let _ = if json_output() {
            builder
                .json()
                .flatten_event(true)
                .with_current_span(false)
                .try_init()
        } else {
            builder.compact().try_init()
        };
    });
}

fn json_output() -> bool {
    env::var("OPTBST_LOG").is_ok_and(|v| v.eq_ignore_ascii_case("json"))
}
