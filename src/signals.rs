use std::io;
#[cfg(unix)]
use std::thread;

use crate::shutdown::ShutdownCoordinator;
#[cfg(unix)]
use crate::shutdown::{Direction, TerminationCause};

#[cfg(unix)]
use signal_hook::consts::signal::{SIGINT, SIGTERM};
#[cfg(unix)]
use signal_hook::iterator::Signals;

/// Turns SIGINT/SIGTERM into a local hangup for the running session.
///
/// `stop` does not restore the default actions: SIGINT and SIGTERM stay
/// swallowed for the rest of the process.
pub struct InterruptWatcher {
    #[cfg(unix)]
    handle: signal_hook::iterator::Handle,
    #[cfg(unix)]
    thread: thread::JoinHandle<()>,
}

impl InterruptWatcher {
    #[cfg(unix)]
    pub fn start(coordinator: ShutdownCoordinator) -> io::Result<Option<Self>> {
        let mut signals = Signals::new([SIGINT, SIGTERM])?;
        let handle = signals.handle();
        let thread = thread::Builder::new()
            .name("interrupt-watcher".to_string())
            .spawn(move || {
                for signal in signals.forever() {
                    tracing::info!("Received signal {}, hanging up", signal);
                    coordinator.signal_finished(Direction::Outbound, TerminationCause::Interrupted);
                }
            })?;
        Ok(Some(Self { handle, thread }))
    }

    #[cfg(not(unix))]
    pub fn start(coordinator: ShutdownCoordinator) -> io::Result<Option<Self>> {
        let _ = coordinator;
        Ok(None)
    }

    #[cfg(unix)]
    pub fn stop(self) {
        self.handle.close();
        let _ = self.thread.join();
    }

    #[cfg(not(unix))]
    pub fn stop(self) {}
}
