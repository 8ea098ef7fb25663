use std::io::{self, BufRead};

/// A blocking, line-oriented input source.
///
/// Implementations are moved into a short-lived thread for every read, so
/// they must be `Send + 'static`.
pub trait ConsoleInput: Send + 'static {
    /// Block until a full line is available.
    ///
    /// Returns the line without its terminator, or `None` once input is closed.
    fn read_line(&mut self) -> io::Result<Option<String>>;
}

/// Process standard input.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinConsole;

impl ConsoleInput for StdinConsole {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        read_trimmed_line(&mut io::stdin().lock())
    }
}

/// Read one line and strip the local line ending (`\n` or `\r\n`).
pub fn read_trimmed_line<R: BufRead>(reader: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(Some(line))
}
