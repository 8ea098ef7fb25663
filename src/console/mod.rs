mod input;
mod reader;

pub use input::{read_trimmed_line, ConsoleInput, StdinConsole};
pub use reader::{CancellableReader, ConsoleCanceller, ReadOutcome};
