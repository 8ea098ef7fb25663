//! Shared test utilities: loopback connections and scripted consoles.

#![allow(dead_code, unused_imports)]

use linecat::config::RelayConfig;
use linecat::console::ConsoleInput;
use linecat::net::Connection;
use linecat::session::{Session, SessionReport};
use linecat::shutdown::ShutdownCoordinator;
use parking_lot::Mutex;
use std::io::{self, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Upper bound for anything that should finish promptly.
pub const DEADLINE: Duration = Duration::from_secs(5);

pub type SpyBuffer = Arc<Mutex<Vec<u8>>>;

/// Console output sink the test can inspect after the session ends.
#[derive(Clone, Default)]
pub struct SharedOutput(pub SpyBuffer);

impl SharedOutput {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Console input fed line by line from the test. Dropping the sender closes it.
pub struct ScriptedConsole(Receiver<Option<String>>);

impl ConsoleInput for ScriptedConsole {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        Ok(self.0.recv().ok().flatten())
    }
}

pub fn scripted_console() -> (Sender<Option<String>>, ScriptedConsole) {
    let (tx, rx) = mpsc::channel();
    (tx, ScriptedConsole(rx))
}

/// Connected loopback pair: (session side, peer side).
pub fn tcp_pair() -> (TcpStream, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind loopback listener");
    let addr = listener.local_addr().unwrap();
    let local = TcpStream::connect(addr).expect("Failed to connect loopback");
    let (peer, _) = listener.accept().expect("Failed to accept loopback");
    (local, peer)
}

/// Run a session on its own thread; the report arrives on the returned channel.
pub fn spawn_session(
    stream: TcpStream,
    console: ScriptedConsole,
    output: SharedOutput,
) -> Receiver<SessionReport> {
    spawn_session_with_coordinator(stream, console, output).1
}

/// Like `spawn_session`, also handing back the session's coordinator so the
/// test can signal from outside the relays.
pub fn spawn_session_with_coordinator(
    stream: TcpStream,
    console: ScriptedConsole,
    output: SharedOutput,
) -> (ShutdownCoordinator, Receiver<SessionReport>) {
    let (tx, rx) = mpsc::channel();
    let connection: Arc<dyn Connection> = Arc::new(stream);
    let session = Session::new(connection, console, output, RelayConfig::default());
    let coordinator = session.coordinator();
    thread::spawn(move || {
        let report = session.run().expect("Session failed to start");
        let _ = tx.send(report);
    });
    (coordinator, rx)
}

/// Read from the peer side until `expected` bytes arrived or the stream ends.
pub fn read_exactly(peer: &mut TcpStream, expected: usize) -> Vec<u8> {
    peer.set_read_timeout(Some(DEADLINE)).unwrap();
    let mut received = Vec::new();
    let mut buf = [0u8; 256];
    while received.len() < expected {
        match peer.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => received.extend_from_slice(&buf[..n]),
        }
    }
    received
}
