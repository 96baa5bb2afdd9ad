use env_logger::Env;

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => (
        {
            info!($($arg)*);
        }
    );
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => (
        {
            debug!($($arg)*);
        }
    );
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => (
        {
            warn!($($arg)*);
        }
    );
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => (
        {
            error!($($arg)*);
        }
    );
}

/// Set up the global logger. Nothing is logged unless `verbose` is set;
/// RUST_LOG still takes precedence over the default `info` filter.
pub fn init(verbose: bool) {
    if !verbose {
        return;
    }
    let env = Env::default().default_filter_or("info");
    // Already installed by the embedding application.
    let _ = env_logger::try_init_from_env(env);
}
