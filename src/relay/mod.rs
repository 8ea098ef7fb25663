mod inbound;
mod line_buffer;
mod outbound;

pub use inbound::InboundRelay;
pub use line_buffer::LineBuffer;
pub use outbound::OutboundRelay;

use crate::shutdown::TerminationCause;

/// Control line that ends the session, matched exactly and case-sensitively.
pub const EXIT_COMMAND: &str = "exit";

/// Per-direction counters returned when a relay thread exits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub bytes: u64,
    pub lines: u64,
    /// Set when this relay detected a termination condition itself.
    /// `None` means it was stopped by teardown or by closed console input.
    pub cause: Option<TerminationCause>,
}
