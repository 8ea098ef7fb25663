use std::io::Write;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::config::RelayConfig;
use crate::console::ConsoleInput;
use crate::net::{Connection, NetError};
use crate::relay::{InboundRelay, OutboundRelay, RelayStats};
use crate::shutdown::{Completion, Direction, SessionPhase, ShutdownCoordinator, TerminationCause};

/// Summary of a finished session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    /// Whichever relay (or interrupt) ended the session first.
    pub completion: Completion,
    pub inbound: RelayStats,
    pub outbound: RelayStats,
    pub phase: SessionPhase,
}

/// One connection, two relays, one coordinator.
///
/// `run` blocks until both relays have exited and the connection is shut down.
pub struct Session<C: ConsoleInput, W: Write + Send + 'static> {
    connection: Arc<dyn Connection>,
    console_in: C,
    console_out: W,
    config: RelayConfig,
    coordinator: ShutdownCoordinator,
}

impl<C: ConsoleInput, W: Write + Send + 'static> Session<C, W> {
    pub fn new(
        connection: Arc<dyn Connection>,
        console_in: C,
        console_out: W,
        config: RelayConfig,
    ) -> Self {
        Self {
            connection,
            console_in,
            console_out,
            config,
            coordinator: ShutdownCoordinator::new(),
        }
    }

    /// Handle for signalling from outside the relays (e.g. the interrupt watcher).
    pub fn coordinator(&self) -> ShutdownCoordinator {
        self.coordinator.clone()
    }

    pub fn run(self) -> Result<SessionReport, NetError> {
        let Session {
            connection,
            console_in,
            console_out,
            config,
            coordinator,
        } = self;
        let mut phase = SessionPhase::Running;
        tracing::debug!(peer = ?connection.peer_addr(), "Session running");

        let inbound = InboundRelay::new(
            Arc::clone(&connection),
            console_out,
            coordinator.clone(),
            config.buffer_size,
        );
        let outbound = OutboundRelay::new(Arc::clone(&connection), console_in, coordinator.clone());
        let canceller = outbound.canceller();

        let inbound_handle = spawn_relay(
            "relay-inbound",
            Direction::Inbound,
            &coordinator,
            move || inbound.run(),
        )?;
        let outbound_handle = match spawn_relay(
            "relay-outbound",
            Direction::Outbound,
            &coordinator,
            move || outbound.run(),
        ) {
            Ok(handle) => handle,
            Err(err) => {
                // Release the inbound relay before reporting.
                shutdown_connection(connection.as_ref());
                let _ = inbound_handle.join();
                return Err(err);
            }
        };

        let completion = coordinator.await_finished();
        advance(&mut phase, SessionPhase::Draining);
        log_completion(&completion);

        if needs_console_cancel(&completion) {
            tracing::debug!("Cancelling pending console read");
            canceller.cancel();
        }
        shutdown_connection(connection.as_ref());

        let inbound = join_relay(inbound_handle, Direction::Inbound);
        let outbound = join_relay(outbound_handle, Direction::Outbound);
        drop(canceller);
        drop(connection);
        advance(&mut phase, SessionPhase::Closed);

        tracing::info!(
            "Session closed: received {} bytes / {} lines, sent {} bytes / {} lines",
            inbound.bytes,
            inbound.lines,
            outbound.bytes,
            outbound.lines
        );

        Ok(SessionReport {
            completion,
            inbound,
            outbound,
            phase,
        })
    }
}

fn advance(phase: &mut SessionPhase, next: SessionPhase) {
    *phase = next;
    tracing::debug!("Session phase: {:?}", next);
}

/// The outbound relay can only be parked in a console read if it did not end
/// the session itself. An interrupt signals on its behalf while it still reads.
fn needs_console_cancel(completion: &Completion) -> bool {
    match completion.direction {
        Direction::Inbound => true,
        Direction::Outbound => completion.cause == TerminationCause::Interrupted,
    }
}

fn log_completion(completion: &Completion) {
    if completion.cause.is_failure() {
        tracing::warn!("Session ending: {}", completion.cause);
    } else {
        tracing::info!("Session ending: {}", completion.cause);
    }
}

/// Shut both directions once; any relay blocked on the socket is released.
fn shutdown_connection(connection: &dyn Connection) {
    if let Err(err) = connection.shutdown() {
        tracing::warn!("Connection shutdown failed: {}", err);
    }
}

fn spawn_relay<F>(
    name: &'static str,
    direction: Direction,
    coordinator: &ShutdownCoordinator,
    body: F,
) -> Result<JoinHandle<RelayStats>, NetError>
where
    F: FnOnce() -> RelayStats + Send + 'static,
{
    let coordinator = coordinator.clone();
    thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            // A panicking relay still counts as finished, so teardown proceeds.
            let _guard = scopeguard::guard_on_unwind(coordinator, move |coordinator| {
                coordinator.signal_finished(direction, TerminationCause::RelayPanicked(direction));
            });
            body()
        })
        .map_err(|source| NetError::Spawn { name, source })
}

fn join_relay(handle: JoinHandle<RelayStats>, direction: Direction) -> RelayStats {
    match handle.join() {
        Ok(stats) => stats,
        Err(_) => {
            tracing::warn!("{:?} relay panicked", direction);
            RelayStats {
                cause: Some(TerminationCause::RelayPanicked(direction)),
                ..RelayStats::default()
            }
        }
    }
}
