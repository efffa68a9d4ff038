//! Error types for the wolweb-discover crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscoverError {
    #[error("No local IPv4 network found")]
    NoLocalNetwork,

    #[error("Failed to enumerate network interfaces: {0}")]
    Interfaces(#[source] std::io::Error),

    #[error("Failed to read neighbor table: {0}")]
    NeighborTable(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DiscoverError>;
