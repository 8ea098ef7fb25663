use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};

/// An established, full-duplex byte stream shared by both relays.
///
/// Each relay uses one direction only, so implementations take `&self` and
/// need no locking between `read` and `write_all`. `shutdown` must be callable
/// concurrently with a blocked `read` or `write_all` and must unblock it.
pub trait Connection: Send + Sync {
    /// Block until at least one byte, end-of-stream (`Ok(0)`), or an error.
    fn read(&self, buf: &mut [u8]) -> io::Result<usize>;

    fn write_all(&self, bytes: &[u8]) -> io::Result<()>;

    /// Close the write direction only; the peer sees end-of-stream.
    fn shutdown_write(&self) -> io::Result<()>;

    /// Close both directions. Safe to call more than once.
    fn shutdown(&self) -> io::Result<()>;

    fn peer_addr(&self) -> Option<SocketAddr> {
        None
    }
}

impl Connection for TcpStream {
    fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match Read::read(&mut &*self, buf) {
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                other => return other,
            }
        }
    }

    fn write_all(&self, bytes: &[u8]) -> io::Result<()> {
        let mut stream = self;
        Write::write_all(&mut stream, bytes)?;
        Write::flush(&mut stream)
    }

    fn shutdown_write(&self) -> io::Result<()> {
        ignore_not_connected(TcpStream::shutdown(self, Shutdown::Write))
    }

    fn shutdown(&self) -> io::Result<()> {
        ignore_not_connected(TcpStream::shutdown(self, Shutdown::Both))
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        TcpStream::peer_addr(self).ok()
    }
}

/// A socket the peer already tore down reports `NotConnected` on shutdown.
fn ignore_not_connected(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(err) if err.kind() == io::ErrorKind::NotConnected => Ok(()),
        other => other,
    }
}
