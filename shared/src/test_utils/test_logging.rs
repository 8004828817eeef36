use std::sync::Once;

static INIT: Once = Once::new();

/// Initialises env_logger once per test binary. `RUST_LOG` still applies.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let _ = env_logger::builder()
            .is_test(true)
            .filter_level(log::LevelFilter::Info)
            .parse_default_env()
            .try_init();
    });
}
