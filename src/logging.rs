use std::io;

use structured_logger::json::new_writer;
use structured_logger::Builder;

use crate::errors::Result;

/// Installs a JSON line logger on stdout. Fails if a logger is already set.
pub fn setup_logging(level: &str) -> Result<()> {
    Builder::with_level(level)
        .with_target_writer("*", new_writer(io::stdout()))
        .try_init()?;
    Ok(())
}
