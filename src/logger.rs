//! Process-wide `env_logger` setup

use std::sync::Once;

use env_logger::Builder;
use log::LevelFilter;

/// Guards logger installation
static INIT: Once = Once::new();

/// Installs the logger once. `RUST_LOG` overrides the default `info` level,
/// e.g. `RUST_LOG=probing_table=debug` shows every resize.
pub fn initialize_logger() {
    INIT.call_once_force(|_| {
        let mut builder = Builder::new();

        builder
            .filter_level(LevelFilter::Info)
            .filter_module("probing_table", LevelFilter::Info)
            .format_timestamp_millis()
            .parse_default_env();

        // Another logger may already be installed, e.g. by a test harness
        if builder.try_init().is_err() {
            log::debug!("logger already initialized");
        }
    });
}

#[cfg(test)]
mod tests {
    use log::{debug, info};

    use super::*;

    #[test]
    fn test_initialize_logger_twice() {
        initialize_logger();
        initialize_logger();

        info!("logger initialized");
        debug!("debug output is filtered unless RUST_LOG asks for it");
        assert!(INIT.is_completed());
    }
}
