/// Tracing bootstrap.
///
/// The terminal belongs to the renderer, so log lines go to a file.
/// `RUST_LOG` overrides the filter from `config.toml`.

use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

pub fn init(cfg: &LoggingConfig) -> io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(&cfg.file)?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
}
