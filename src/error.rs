//! Error types surfaced by packet-window admission.
//!
//! Admission is the only fallible operation in the crate; delay arithmetic
//! and feedback generation are total over their inputs.

use thiserror::Error;

/// Reasons the packet window can reject an observation.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The sequence number is already present in the retained window.
    #[error("duplicate sequence number {sequence} within the log window")]
    DuplicateSequence {
        /// The offending 16-bit sequence number.
        sequence: u16,
    },

    /// The arrival timestamp precedes the newest retained record. Arrival
    /// stamps come from a single caller clock and must be non-decreasing.
    #[error("arrival timestamp is older than the newest retained packet")]
    NonMonotonicArrival,
}

/// A specialized `Result` for this crate.
pub type Result<T> = std::result::Result<T, Error>;
