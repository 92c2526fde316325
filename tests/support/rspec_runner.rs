//! Shared runner for the behavioural `rspec` suites.

use rspec::{block::Suite, ConfigurationBuilder, Logger, Runner};
use std::sync::Arc;

/// Runs `suite` on one thread with engine logging enabled, so controller
/// decisions interleave with the step output. Any failing step aborts the
/// test binary.
pub fn run_serial<T>(suite: &Suite<T>)
where
    T: Clone + Send + Sync + std::fmt::Debug,
{
    marksman::init_logging(false);
    let reporter = Arc::new(Logger::new(std::io::stdout()));
    let config = ConfigurationBuilder::default()
        .parallel(false)
        .exit_on_failure(true)
        .build()
        .unwrap_or_else(|err| panic!("invalid rspec configuration: {err}"));
    Runner::new(config, vec![reporter]).run(suite);
}
