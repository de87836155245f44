//! # Packet Window
//!
//! Bounded, time-ordered log of recent packet observations. Each admission
//! appends one record; each prune discards records older than the configured
//! window and computes the instantaneous aggregates the receiver folds into
//! its long-running estimates.
//!
//! Loss is derived from sequence-number continuity over the retained window,
//! not from a simple count: 16-bit sequence numbers are unwrapped into a
//! 64-bit space on admission (RFC 3550-style cycle tracking), and every
//! sequence inside the observed range that never arrived counts as lost.
//! Reordered packets that did arrive do not.

use quanta::Instant;
use serde::Serialize;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::trace;

use crate::error::{Error, Result};

// ─── Records & Aggregates ───────────────────────────────────────────────────

/// One retained packet observation.
#[derive(Debug, Clone, Copy)]
struct PacketRecord {
    arrival: Instant,
    sequence: u16,
    extended_sequence: u64,
    ecn_marked: bool,
    size_bits: u64,
    delay_exceeded: bool,
}

/// Instantaneous aggregates over the retained window.
///
/// An empty window yields the `Default` value: all ratios and the rate are
/// zero, nothing exceeded its delay threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct WindowAggregates {
    /// Fraction of the observed sequence range that never arrived.
    pub loss_ratio: f64,
    /// Fraction of retained packets carrying the ECN mark.
    pub marking_ratio: f64,
    /// Retained bits divided by the window duration.
    pub receiving_rate_bps: f64,
    /// Whether any retained packet exceeded the queuing delay threshold.
    pub delay_exceeded: bool,
}

// ─── Packet Window ──────────────────────────────────────────────────────────

/// Sliding time-window packet log.
pub struct PacketWindow {
    /// Retained records, oldest first. Time-ordered by construction:
    /// admission rejects arrival stamps older than the newest record.
    records: VecDeque<PacketRecord>,
    /// Window duration; records older than `now - window` are pruned.
    window: Duration,
    /// Sequence-unwrap cycle accumulator. Starts one cycle high so a
    /// reordered pre-wrap packet at session start stays representable.
    cycles: u64,
    /// Most recent (not highest) raw sequence admitted.
    last_sequence: u16,
    /// Whether the first packet has been admitted.
    initialized: bool,
}

impl PacketWindow {
    /// Create an empty window of the given duration.
    pub fn new(window: Duration) -> Self {
        PacketWindow {
            records: VecDeque::with_capacity(128),
            window,
            cycles: 1 << 16,
            last_sequence: 0,
            initialized: false,
        }
    }

    /// Admit a packet observation.
    ///
    /// Rejects a sequence number already present in the retained window and
    /// arrival stamps that move backwards relative to the newest record.
    pub fn add(
        &mut self,
        now: Instant,
        sequence: u16,
        ecn_marked: bool,
        size_bits: u64,
        delay_exceeded: bool,
    ) -> Result<()> {
        if let Some(newest) = self.records.back() {
            if now < newest.arrival {
                return Err(Error::NonMonotonicArrival);
            }
        }
        if self.records.iter().any(|r| r.sequence == sequence) {
            return Err(Error::DuplicateSequence { sequence });
        }

        let extended_sequence = self.unwrap_sequence(sequence);
        self.records.push_back(PacketRecord {
            arrival: now,
            sequence,
            extended_sequence,
            ecn_marked,
            size_bits,
            delay_exceeded,
        });
        Ok(())
    }

    /// Discard records older than the window ending at `now`, then compute
    /// the instantaneous aggregates over what remains.
    pub fn prune(&mut self, now: Instant) -> WindowAggregates {
        let mut dropped = 0usize;
        while let Some(front) = self.records.front() {
            if now.saturating_duration_since(front.arrival) > self.window {
                self.records.pop_front();
                dropped += 1;
            } else {
                break;
            }
        }
        if dropped > 0 {
            trace!(dropped, retained = self.records.len(), "pruned packet log");
        }

        if self.records.is_empty() {
            return WindowAggregates::default();
        }

        let mut min_seq = u64::MAX;
        let mut max_seq = 0u64;
        let mut marked = 0u64;
        let mut total_bits = 0u64;
        let mut delay_exceeded = false;
        for record in &self.records {
            min_seq = min_seq.min(record.extended_sequence);
            max_seq = max_seq.max(record.extended_sequence);
            marked += u64::from(record.ecn_marked);
            total_bits += record.size_bits;
            delay_exceeded |= record.delay_exceeded;
        }

        let retained = self.records.len() as u64;
        let expected = max_seq - min_seq + 1;
        WindowAggregates {
            loss_ratio: (expected - retained) as f64 / expected as f64,
            marking_ratio: marked as f64 / retained as f64,
            receiving_rate_bps: total_bits as f64 / self.window.as_secs_f64(),
            delay_exceeded,
        }
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the window holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Extend a 16-bit sequence number into the unwrapped 64-bit space.
    ///
    /// A forward step of less than half the sequence space advances the
    /// stream (incrementing the cycle count on wrap); anything else is a
    /// reordered packet belonging to the current or previous cycle.
    fn unwrap_sequence(&mut self, sequence: u16) -> u64 {
        if !self.initialized {
            self.initialized = true;
            self.last_sequence = sequence;
            return self.cycles + u64::from(sequence);
        }

        let forward = sequence.wrapping_sub(self.last_sequence);
        if forward < 0x8000 {
            if sequence < self.last_sequence {
                self.cycles += 1 << 16;
            }
            self.last_sequence = sequence;
            self.cycles + u64::from(sequence)
        } else if sequence > self.last_sequence {
            // Reordered from before the most recent wrap.
            self.cycles - (1 << 16) + u64::from(sequence)
        } else {
            self.cycles + u64::from(sequence)
        }
    }
}
