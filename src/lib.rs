//! # nada
//!
//! Receiver-side estimation core for NADA congestion control (RFC 8698).
//!
//! Pure logic — no I/O, no clock reads. The transport layer feeds per-packet
//! arrival observations (receipt time, send time, sequence number, ECN mark,
//! size); the core maintains running estimates of one-way queuing delay,
//! loss ratio, and ECN marking ratio, and packages them into a periodic
//! feedback report for the rate-adapting sender.
//!
//! ## Crate structure
//!
//! - [`config`] — receiver parameters with RFC 8698 defaults
//! - [`error`] — packet-window admission failures
//! - [`filter`] — exponentially weighted moving average
//! - [`window`] — sliding time-window packet log with loss/marking/rate aggregation
//! - [`receiver`] — per-packet estimator updates and feedback generation

pub mod config;
pub mod error;
pub mod filter;
pub mod receiver;
pub mod window;
