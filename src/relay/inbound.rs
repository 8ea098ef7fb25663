use std::io::Write;
use std::sync::Arc;

use crate::net::Connection;
use crate::relay::line_buffer::LineBuffer;
use crate::relay::{RelayStats, EXIT_COMMAND};
use crate::shutdown::{Direction, ShutdownCoordinator, TerminationCause};

/// Connection → console output, one complete line at a time.
pub struct InboundRelay<W: Write> {
    connection: Arc<dyn Connection>,
    output: W,
    coordinator: ShutdownCoordinator,
    buffer_size: usize,
}

impl<W: Write> InboundRelay<W> {
    pub fn new(
        connection: Arc<dyn Connection>,
        output: W,
        coordinator: ShutdownCoordinator,
        buffer_size: usize,
    ) -> Self {
        Self {
            connection,
            output,
            coordinator,
            buffer_size: buffer_size.max(1),
        }
    }

    /// Relay until the peer closes, sends `exit`, or I/O fails.
    ///
    /// Always signals the coordinator before returning.
    pub fn run(mut self) -> RelayStats {
        let mut stats = RelayStats::default();
        let mut buf = vec![0u8; self.buffer_size];
        let mut lines = LineBuffer::new();

        let cause = 'relay: loop {
            let n = match self.connection.read(&mut buf) {
                Ok(0) => {
                    if !lines.is_empty() {
                        tracing::debug!(
                            "Discarding {} bytes of unterminated input",
                            lines.partial().len()
                        );
                    }
                    break TerminationCause::PeerClosed;
                }
                Ok(n) => n,
                Err(err) => break TerminationCause::ConnectionError(err.to_string()),
            };

            stats.bytes += n as u64;
            lines.push(&buf[..n]);

            while let Some(line) = lines.next_line() {
                if let Err(err) = self.emit(&line) {
                    break 'relay TerminationCause::ConsoleError(err.to_string());
                }
                stats.lines += 1;
                // The exit line is shown like any other; nothing after it is.
                if line == EXIT_COMMAND.as_bytes() {
                    break 'relay TerminationCause::PeerExitCommand;
                }
            }
        };

        self.finish(cause, stats)
    }

    fn emit(&mut self, line: &[u8]) -> std::io::Result<()> {
        self.output.write_all(line)?;
        self.output.write_all(b"\n")?;
        self.output.flush()
    }

    fn finish(self, cause: TerminationCause, mut stats: RelayStats) -> RelayStats {
        if self.coordinator.is_shutting_down() {
            // Unblocked by teardown; whatever the read reported is not news.
            tracing::debug!("Inbound relay stopped ({})", cause);
            self.coordinator.signal_finished(Direction::Inbound, cause);
            return stats;
        }

        if cause.is_failure() {
            tracing::warn!("Inbound relay failed: {}", cause);
        } else {
            tracing::info!("Inbound relay finished: {}", cause);
        }
        self.coordinator
            .signal_finished(Direction::Inbound, cause.clone());
        stats.cause = Some(cause);
        stats
    }
}
