mod connection;
mod error;
mod establish;

pub use connection::Connection;
pub use error::NetError;
pub use establish::{accept, connect, establish, listen, Established, Mode};
