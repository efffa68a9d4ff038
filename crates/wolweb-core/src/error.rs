use thiserror::Error;

/// Errors shared across wolweb crates.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid MAC address: {0}")]
    InvalidMac(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
}
