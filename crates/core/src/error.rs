//! Error taxonomy shared by the controller, the sequence gate and the range
//! calculator.

/// Errors produced by the pageflow core.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A fetch result arrived after a newer request was issued. This is a race
    /// outcome and is discarded without ever reaching the view.
    #[error("stale result for sequence {sequence}, latest issued is {latest}")]
    StaleResult { sequence: u64, latest: u64 },

    /// The transport collaborator failed (network, timeout, bad payload).
    #[error("transport failure: {0}")]
    TransportFailure(String),

    /// The range calculator was called with a negative page count or window.
    #[error("invalid pagination range: total_pages={total_pages}, window_size={window_size}")]
    InvalidRange { total_pages: i64, window_size: i64 },

    /// A result carried a sequence that was never issued.
    #[error("sequence {sequence} is ahead of the latest issued sequence {latest}")]
    SequenceAhead { sequence: u64, latest: u64 },

    #[error("page size must be positive, got {0}")]
    InvalidPageSize(usize),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
