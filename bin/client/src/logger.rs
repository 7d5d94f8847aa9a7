/// Initialize the client logger
/// Sets up env_logger with `info` as the default filter, or `debug` when verbose
pub fn init(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}
