//! Logger bootstrap for the replay binary and tests.
use env_logger::{Builder, Env};
use log::LevelFilter;

/// Initializes the global logger.
///
/// When `verbose` is `true`, target selection and mode transitions are
/// logged at debug level. Otherwise only info level and above are shown.
/// `RUST_LOG` overrides both.
pub fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let env = Env::default().default_filter_or(level.to_string());
    let mut builder = Builder::from_env(env);
    builder.format_timestamp_millis();

    // `try_init` only fails if a logger was already set. Ignore that case so
    // tests can call `init` multiple times without panicking.
    let _ = builder.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::quiet(false)]
    #[case::verbose(true)]
    fn repeated_init_is_harmless(#[case] verbose: bool) {
        init(verbose);
        init(verbose);
        log::debug!("logger initialised twice");
    }
}
