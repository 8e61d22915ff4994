//! Request sequencing for fetch race resolution
//!
//! Every issued fetch is stamped with a strictly increasing sequence number.
//! Only a result carrying the latest issued number may touch the view; older
//! results are stale and dropped on arrival.

use crate::error::{Error, Result};

/// Owner of the "latest issued" request counter.
#[derive(Debug, Default, Clone)]
pub struct SequenceGate {
    latest: u64,
}

impl SequenceGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently issued sequence, `0` before the first issue.
    pub fn latest(&self) -> u64 {
        self.latest
    }

    /// Issue the next sequence number, making it the only authoritative one.
    pub fn issue(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    /// Check whether a result with `sequence` may be applied.
    ///
    /// Returns `Error::StaleResult` when a newer request was issued since, and
    /// `Error::SequenceAhead` for a number this gate never handed out.
    pub fn admit(&self, sequence: u64) -> Result<()> {
        match sequence.cmp(&self.latest) {
            std::cmp::Ordering::Equal => Ok(()),
            std::cmp::Ordering::Less => Err(Error::StaleResult {
                sequence,
                latest: self.latest,
            }),
            std::cmp::Ordering::Greater => Err(Error::SequenceAhead {
                sequence,
                latest: self.latest,
            }),
        }
    }
}
