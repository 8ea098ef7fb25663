use std::sync::Arc;

use crate::console::{CancellableReader, ConsoleCanceller, ConsoleInput, ReadOutcome};
use crate::net::Connection;
use crate::relay::{RelayStats, EXIT_COMMAND};
use crate::shutdown::{Direction, ShutdownCoordinator, TerminationCause};

/// Console input → Connection.
///
/// Each console line is read on its own cancellable thread; see
/// [`CancellableReader`]. The orchestrator cancels it through
/// [`OutboundRelay::canceller`] when the inbound side finishes first.
pub struct OutboundRelay<C: ConsoleInput> {
    connection: Arc<dyn Connection>,
    reader: CancellableReader<C>,
    coordinator: ShutdownCoordinator,
}

impl<C: ConsoleInput> OutboundRelay<C> {
    pub fn new(
        connection: Arc<dyn Connection>,
        input: C,
        coordinator: ShutdownCoordinator,
    ) -> Self {
        Self {
            connection,
            reader: CancellableReader::new(input),
            coordinator,
        }
    }

    pub fn canceller(&self) -> ConsoleCanceller {
        self.reader.canceller()
    }

    /// Relay until `exit`, a write failure, cancellation, or closed input.
    ///
    /// Signals the coordinator only when this relay is the cause.
    pub fn run(mut self) -> RelayStats {
        let mut stats = RelayStats::default();

        loop {
            let line = match self.reader.read_line() {
                ReadOutcome::Line(line) => line,
                ReadOutcome::Cancelled => {
                    tracing::debug!("Outbound relay cancelled");
                    return stats;
                }
                ReadOutcome::Closed => {
                    tracing::info!("Console input closed, half-closing connection");
                    if let Err(err) = self.connection.shutdown_write() {
                        tracing::debug!("Half-close failed: {}", err);
                    }
                    return stats;
                }
                ReadOutcome::Failed(err) => {
                    return self.finish(TerminationCause::ConsoleError(err.to_string()), stats);
                }
            };

            let is_exit = line == EXIT_COMMAND;
            let mut payload = line.into_bytes();
            payload.push(b'\n');

            if let Err(err) = self.connection.write_all(&payload) {
                return self.finish(TerminationCause::ConnectionError(err.to_string()), stats);
            }
            stats.bytes += payload.len() as u64;
            stats.lines += 1;

            if is_exit {
                return self.finish(TerminationCause::LocalExitCommand, stats);
            }
        }
    }

    fn finish(self, cause: TerminationCause, mut stats: RelayStats) -> RelayStats {
        if self.coordinator.is_shutting_down() {
            tracing::debug!("Outbound relay stopped ({})", cause);
            self.coordinator.signal_finished(Direction::Outbound, cause);
            return stats;
        }

        if cause.is_failure() {
            tracing::warn!("Outbound relay failed: {}", cause);
        } else {
            tracing::info!("Outbound relay finished: {}", cause);
        }
        self.coordinator
            .signal_finished(Direction::Outbound, cause.clone());
        stats.cause = Some(cause);
        stats
    }
}
