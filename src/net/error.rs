//! Errors raised while establishing a connection or starting a session.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetError {
    /// Host name did not resolve to any address
    #[error("Failed to resolve '{host}': {source}")]
    Resolve {
        host: String,
        #[source]
        source: io::Error,
    },

    #[error("No addresses found for '{host}'")]
    NoAddress { host: String },

    /// Every resolved address refused or timed out
    #[error("Failed to connect to '{target}': {source}")]
    Connect {
        target: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to listen on '{addr}': {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to accept connection: {0}")]
    Accept(#[source] io::Error),

    /// A relay or console thread could not be started
    #[error("Failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: io::Error,
    },
}
