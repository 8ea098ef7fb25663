use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::console::input::ConsoleInput;

/// Outcome delivered to the relay waiting on a console read.
#[derive(Debug)]
enum ReadEvent {
    Line(io::Result<Option<String>>),
    Cancelled,
}

/// What a [`CancellableReader::read_line`] call produced.
#[derive(Debug)]
pub enum ReadOutcome {
    Line(String),
    /// Process input is closed.
    Closed,
    Cancelled,
    Failed(io::Error),
}

#[derive(Default)]
struct CancelState {
    cancelled: bool,
    current: Option<Sender<ReadEvent>>,
}

/// Cross-thread handle that abandons the most recent console read.
#[derive(Clone, Default)]
pub struct ConsoleCanceller {
    state: Arc<Mutex<CancelState>>,
}

impl ConsoleCanceller {
    /// Request cancellation. Safe to call any number of times, including after
    /// the read already completed; every later read is cancelled immediately.
    pub fn cancel(&self) {
        let mut state = self.state.lock();
        state.cancelled = true;
        if let Some(tx) = state.current.take() {
            // Receiver gone means the relay already moved on.
            let _ = tx.send(ReadEvent::Cancelled);
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.lock().cancelled
    }
}

/// Runs each console read on a fresh thread so it can be abandoned.
///
/// The input source travels into the read thread and comes back through the
/// thread's join handle. After a cancellation the thread is detached and the
/// source is dropped whenever its blocked read returns.
pub struct CancellableReader<C: ConsoleInput> {
    input: Option<C>,
    canceller: ConsoleCanceller,
}

impl<C: ConsoleInput> CancellableReader<C> {
    pub fn new(input: C) -> Self {
        Self {
            input: Some(input),
            canceller: ConsoleCanceller::default(),
        }
    }

    pub fn canceller(&self) -> ConsoleCanceller {
        self.canceller.clone()
    }

    pub fn read_line(&mut self) -> ReadOutcome {
        let Some(mut input) = self.input.take() else {
            // A previous read was abandoned; the source is gone.
            return ReadOutcome::Cancelled;
        };

        let (tx, rx) = mpsc::channel();
        {
            let mut state = self.canceller.state.lock();
            if state.cancelled {
                self.input = Some(input);
                return ReadOutcome::Cancelled;
            }
            state.current = Some(tx.clone());
        }

        let spawned = thread::Builder::new()
            .name("console-read".to_string())
            .spawn(move || {
                let result = panic::catch_unwind(AssertUnwindSafe(|| input.read_line()))
                    .unwrap_or_else(|_| Err(io::Error::other("console input panicked")));
                let _ = tx.send(ReadEvent::Line(result));
                input
            });
        let handle = match spawned {
            Ok(handle) => handle,
            Err(err) => {
                self.canceller.state.lock().current = None;
                return ReadOutcome::Failed(err);
            }
        };

        // The canceller holds a sender clone, so this only returns on an event.
        let event = rx.recv().unwrap_or(ReadEvent::Cancelled);
        self.canceller.state.lock().current = None;

        match event {
            ReadEvent::Line(result) => {
                match handle.join() {
                    Ok(input) => self.input = Some(input),
                    Err(_) => {
                        return ReadOutcome::Failed(io::Error::other("console read thread panicked"))
                    }
                }
                match result {
                    Ok(Some(line)) => ReadOutcome::Line(line),
                    Ok(None) => ReadOutcome::Closed,
                    Err(err) => ReadOutcome::Failed(err),
                }
            }
            ReadEvent::Cancelled => {
                tracing::debug!("Console read cancelled, abandoning read thread");
                drop(handle);
                ReadOutcome::Cancelled
            }
        }
    }
}
