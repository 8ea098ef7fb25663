use std::fmt;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

/// Which half of the session a relay owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Connection → console output.
    Inbound,
    /// Console input → Connection.
    Outbound,
}

/// Why a session is ending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationCause {
    /// The peer closed its write side cleanly.
    PeerClosed,
    /// The peer sent the `exit` control line.
    PeerExitCommand,
    /// The local user typed `exit`.
    LocalExitCommand,
    /// SIGINT/SIGTERM delivered to the process.
    Interrupted,
    /// Reading from or writing to the connection failed.
    ConnectionError(String),
    /// Console input or output failed.
    ConsoleError(String),
    /// A relay thread panicked.
    RelayPanicked(Direction),
}

impl TerminationCause {
    /// Normal hangups are not failures and must not produce error output.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            TerminationCause::ConnectionError(_)
                | TerminationCause::ConsoleError(_)
                | TerminationCause::RelayPanicked(_)
        )
    }
}

impl fmt::Display for TerminationCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationCause::PeerClosed => f.write_str("peer closed the connection"),
            TerminationCause::PeerExitCommand => f.write_str("peer sent exit"),
            TerminationCause::LocalExitCommand => f.write_str("local exit"),
            TerminationCause::Interrupted => f.write_str("interrupted"),
            TerminationCause::ConnectionError(err) => write!(f, "connection error: {}", err),
            TerminationCause::ConsoleError(err) => write!(f, "console error: {}", err),
            TerminationCause::RelayPanicked(direction) => {
                write!(f, "{:?} relay panicked", direction)
            }
        }
    }
}

/// Orchestrator state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Running,
    Draining,
    Closed,
}

/// The first completion observed by [`ShutdownCoordinator::await_finished`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub direction: Direction,
    pub cause: TerminationCause,
}

#[derive(Debug, Default)]
struct FinishState {
    inbound_finished: bool,
    outbound_finished: bool,
    first: Option<Completion>,
}

struct Shared {
    state: Mutex<FinishState>,
    cond: Condvar,
}

/// Monitor over the per-direction finished flags.
///
/// Flags only ever go from `false` to `true`. The first signal wins the
/// recorded cause; later signals set their own flag but keep the original
/// cause for diagnostics.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    shared: Arc<Shared>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(FinishState::default()),
                cond: Condvar::new(),
            }),
        }
    }

    /// Mark `direction` as finished. Idempotent.
    ///
    /// Returns `true` if this call was the one that started teardown.
    pub fn signal_finished(&self, direction: Direction, cause: TerminationCause) -> bool {
        let mut state = self.shared.state.lock();
        let flag = match direction {
            Direction::Inbound => &mut state.inbound_finished,
            Direction::Outbound => &mut state.outbound_finished,
        };
        if *flag {
            return false;
        }
        *flag = true;

        let first = state.first.is_none();
        if first {
            tracing::debug!(?direction, %cause, "Session finish signalled");
            state.first = Some(Completion { direction, cause });
        } else {
            tracing::trace!(?direction, %cause, "Late finish signal");
        }
        self.shared.cond.notify_all();
        first
    }

    /// Block until at least one direction has signalled.
    pub fn await_finished(&self) -> Completion {
        let mut state = self.shared.state.lock();
        loop {
            if let Some(first) = state.first.clone() {
                return first;
            }
            self.shared.cond.wait(&mut state);
        }
    }

    pub fn is_finished(&self, direction: Direction) -> bool {
        let state = self.shared.state.lock();
        match direction {
            Direction::Inbound => state.inbound_finished,
            Direction::Outbound => state.outbound_finished,
        }
    }

    /// Check whether teardown has been triggered by either side.
    pub fn is_shutting_down(&self) -> bool {
        self.shared.state.lock().first.is_some()
    }

    pub fn first_completion(&self) -> Option<Completion> {
        self.shared.state.lock().first.clone()
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn starts_running() {
        let coordinator = ShutdownCoordinator::new();
        assert!(!coordinator.is_shutting_down());
        assert!(!coordinator.is_finished(Direction::Inbound));
        assert!(!coordinator.is_finished(Direction::Outbound));
        assert!(coordinator.first_completion().is_none());
    }

    #[test]
    fn signal_is_idempotent() {
        let coordinator = ShutdownCoordinator::new();
        assert!(coordinator.signal_finished(Direction::Inbound, TerminationCause::PeerClosed));
        assert!(!coordinator.signal_finished(Direction::Inbound, TerminationCause::PeerClosed));
        assert!(coordinator.is_finished(Direction::Inbound));
        assert!(!coordinator.is_finished(Direction::Outbound));
    }

    #[test]
    fn first_cause_is_retained() {
        let coordinator = ShutdownCoordinator::new();
        coordinator.signal_finished(Direction::Outbound, TerminationCause::LocalExitCommand);
        coordinator.signal_finished(
            Direction::Inbound,
            TerminationCause::ConnectionError("reset".to_string()),
        );

        let completion = coordinator.await_finished();
        assert_eq!(completion.direction, Direction::Outbound);
        assert_eq!(completion.cause, TerminationCause::LocalExitCommand);
        assert!(coordinator.is_finished(Direction::Inbound));
    }

    #[test]
    fn await_returns_immediately_when_already_signalled() {
        let coordinator = ShutdownCoordinator::new();
        coordinator.signal_finished(Direction::Inbound, TerminationCause::PeerExitCommand);
        let completion = coordinator.await_finished();
        assert_eq!(completion.cause, TerminationCause::PeerExitCommand);
    }

    #[test]
    fn await_wakes_on_signal_from_other_thread() {
        let coordinator = ShutdownCoordinator::new();
        let waiter = coordinator.clone();
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            let completion = waiter.await_finished();
            tx.send(completion).unwrap();
        });

        // Waiter must still be blocked.
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());

        coordinator.signal_finished(Direction::Inbound, TerminationCause::PeerClosed);
        let completion = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(completion.direction, Direction::Inbound);
        handle.join().unwrap();
    }

    #[test]
    fn only_connection_errors_are_failures() {
        assert!(!TerminationCause::PeerClosed.is_failure());
        assert!(!TerminationCause::PeerExitCommand.is_failure());
        assert!(!TerminationCause::LocalExitCommand.is_failure());
        assert!(!TerminationCause::Interrupted.is_failure());
        assert!(TerminationCause::ConnectionError("broken pipe".into()).is_failure());
        assert!(TerminationCause::RelayPanicked(Direction::Inbound).is_failure());
    }
}
