//! Interactive line relay between the local console and a TCP peer.
//!
//! Two relays run on their own threads: [`relay::InboundRelay`] copies
//! complete lines from the connection to the console and
//! [`relay::OutboundRelay`] sends console lines to the connection. Whichever
//! finishes first tells the [`shutdown::ShutdownCoordinator`], and
//! [`session::Session`] tears the other one down.

pub mod cli;
pub mod config;
pub mod console;
pub mod logging;
pub mod net;
pub mod relay;
pub mod session;
pub mod shutdown;
pub mod signals;
