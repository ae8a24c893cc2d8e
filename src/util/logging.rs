use anyhow::Result;
use log::LevelFilter;

/// Initialize the logging system with env_logger.
///
/// The `verbose` flag raises the crate's own level to debug. `RUST_LOG`
/// overrides both defaults when set.
pub fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(LevelFilter::Warn)
        .filter_module("caroling", level)
        .filter_module("caroling_sim", level)
        .parse_default_env()
        .format_timestamp_millis()
        .try_init()?;

    Ok(())
}
