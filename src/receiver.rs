//! # NADA Receiver
//!
//! Per-packet estimator updates and periodic feedback aggregation
//! (RFC 8698 §4.2). Pure logic — the transport layer supplies every
//! timestamp, so nothing here reads a clock.
//!
//! For each media packet the receiver tracks the minimum one-way delay ever
//! observed (the baseline), attributes the excess over that baseline to
//! queuing, feeds the observation through the packet window, and smooths the
//! window's instantaneous loss/marking ratios into long-running estimates.
//! Feedback generation warps the queuing-delay estimate so a single outlier
//! cannot dominate, then folds in quadratic loss and marking penalties on
//! the same duration scale.

use quanta::Instant;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, trace};

use crate::config::Config;
use crate::error::Result;
use crate::filter::Ewma;
use crate::window::PacketWindow;

// ─── Rate Adaption Mode ─────────────────────────────────────────────────────

/// The receiver's recommendation on how aggressively the sender should
/// change its rate. A closed enum rather than a flag, so further modes can
/// be added without reinterpreting a boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RateAdaptionMode {
    /// No loss and no queuing-delay buildup in the window: the sender may
    /// ramp up quickly.
    AcceleratedRampUp,
    /// Congestion signals present: adjust gradually.
    GradualUpdate,
}

// ─── Feedback Report ────────────────────────────────────────────────────────

/// The value object handed to the feedback channel on each feedback cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeedbackReport {
    /// Recommended rate adaption mode at build time.
    pub mode: RateAdaptionMode,
    /// Aggregated congestion signal: warped queuing delay plus loss and
    /// marking penalties, all on the same duration scale.
    pub aggregated_congestion_signal: Duration,
    /// Receiving rate over the observation window.
    pub receiving_rate_bps: f64,
}

// ─── Receiver ───────────────────────────────────────────────────────────────

/// Receiver-side estimator state for one media session.
///
/// Owns the packet window exclusively. Single-threaded, call-and-return;
/// callers serialize [`on_receive_media_packet`](Receiver::on_receive_media_packet)
/// against [`build_feedback_report`](Receiver::build_feedback_report).
pub struct Receiver {
    config: Config,
    /// Running minimum of the observed one-way delay; non-increasing.
    baseline_delay: Duration,
    /// Forward delay of the latest packet minus the baseline.
    queuing_delay: Duration,
    loss_estimate: Ewma,
    marking_estimate: Ewma,
    receiving_rate_bps: f64,
    /// Timestamp of the last feedback report.
    last_timestamp: Instant,
    /// Timestamp of the most recent packet update.
    current_timestamp: Instant,
    mode: RateAdaptionMode,
    window: PacketWindow,
}

impl Receiver {
    /// Create a receiver at session start.
    ///
    /// Panics if the configuration violates its parameter invariants
    /// (alpha in (0, 1], positive warp threshold and reference ratios).
    pub fn new(now: Instant, config: Config) -> Self {
        assert!(
            !config.delay_warp_threshold.is_zero(),
            "delay warp threshold must be positive"
        );
        assert!(
            config.delay_warp_decay >= 0.0,
            "delay warp decay must be non-negative"
        );
        assert!(
            config.reference_marking_ratio > 0.0,
            "reference marking ratio must be positive"
        );
        assert!(
            config.reference_loss_ratio > 0.0,
            "reference loss ratio must be positive"
        );

        Receiver {
            baseline_delay: Duration::MAX,
            queuing_delay: Duration::ZERO,
            loss_estimate: Ewma::new(config.alpha),
            marking_estimate: Ewma::new(config.alpha),
            receiving_rate_bps: 0.0,
            last_timestamp: now,
            current_timestamp: now,
            mode: RateAdaptionMode::GradualUpdate,
            window: PacketWindow::new(config.log_window),
            config,
        }
    }

    /// Process one arriving media packet.
    ///
    /// `now` is the local receipt time, `sent` the send timestamp carried in
    /// the packet header, `size_bits` the packet size in bits. A send stamp
    /// ahead of the local clock clamps the forward delay to zero, which
    /// drags the baseline down permanently — unsynchronized clocks are the
    /// caller's problem, not detected here.
    ///
    /// On admission failure the error propagates without touching the
    /// loss/marking estimates, rate, or mode; the baseline and queuing delay
    /// updates that precede admission stand.
    pub fn on_receive_media_packet(
        &mut self,
        now: Instant,
        sent: Instant,
        sequence: u16,
        ecn_marked: bool,
        size_bits: u64,
    ) -> Result<()> {
        self.current_timestamp = now;

        let forward_delay = now.saturating_duration_since(sent);
        if forward_delay < self.baseline_delay {
            trace!(
                baseline_us = forward_delay.as_micros() as u64,
                "new baseline delay"
            );
            self.baseline_delay = forward_delay;
        }
        self.queuing_delay = forward_delay - self.baseline_delay;

        let delay_exceeded = self.queuing_delay > self.config.queueing_delay_threshold;
        self.window
            .add(now, sequence, ecn_marked, size_bits, delay_exceeded)?;

        let sample = self.window.prune(now);
        self.loss_estimate.update(sample.loss_ratio);
        self.marking_estimate.update(sample.marking_ratio);
        self.receiving_rate_bps = sample.receiving_rate_bps;

        let mode = if sample.loss_ratio == 0.0 && !sample.delay_exceeded {
            RateAdaptionMode::AcceleratedRampUp
        } else {
            RateAdaptionMode::GradualUpdate
        };
        if mode != self.mode {
            debug!(?mode, "rate adaption mode changed");
        }
        self.mode = mode;

        trace!(
            sequence,
            queuing_delay_us = self.queuing_delay.as_micros() as u64,
            loss = sample.loss_ratio,
            marking = sample.marking_ratio,
            rate_bps = sample.receiving_rate_bps,
            "media packet processed"
        );
        Ok(())
    }

    /// Build the feedback report for the current state.
    ///
    /// Always succeeds. Records the feedback instant in
    /// [`last_timestamp`](Receiver::last_timestamp) as a side effect.
    pub fn build_feedback_report(&mut self) -> FeedbackReport {
        let marking_penalty = scale(
            self.config.reference_delay_marking,
            (self.marking_estimate.value() / self.config.reference_marking_ratio).powi(2),
        );
        let loss_penalty = scale(
            self.config.reference_delay_loss,
            (self.loss_estimate.value() / self.config.reference_loss_ratio).powi(2),
        );
        let aggregated_congestion_signal =
            self.equivalent_delay() + marking_penalty + loss_penalty;

        self.last_timestamp = self.current_timestamp;

        FeedbackReport {
            mode: self.mode,
            aggregated_congestion_signal,
            receiving_rate_bps: self.receiving_rate_bps,
        }
    }

    /// Non-linear warp of the queuing-delay estimate (RFC 8698 eq. 1):
    /// identity below the threshold QTH, exponential decay
    /// `QTH * exp(-LAMBDA * (d_queue - QTH) / QTH)` above it. Both branches
    /// agree at the threshold.
    fn equivalent_delay(&self) -> Duration {
        if self.queuing_delay < self.config.delay_warp_threshold {
            return self.queuing_delay;
        }
        let knee = self.config.delay_warp_threshold.as_secs_f64();
        let excess = (self.queuing_delay.as_secs_f64() - knee) / knee;
        Duration::from_secs_f64(knee * (-self.config.delay_warp_decay * excess).exp())
    }

    // ─── Accessors ──────────────────────────────────────────────────────

    /// Running minimum of the observed one-way delay.
    pub fn baseline_delay(&self) -> Duration {
        self.baseline_delay
    }

    /// Queuing-delay estimate from the latest packet.
    pub fn queuing_delay(&self) -> Duration {
        self.queuing_delay
    }

    /// Smoothed packet loss ratio estimate.
    pub fn loss_ratio(&self) -> f64 {
        self.loss_estimate.value()
    }

    /// Smoothed ECN marking ratio estimate.
    pub fn marking_ratio(&self) -> f64 {
        self.marking_estimate.value()
    }

    /// Receiving rate over the observation window.
    pub fn receiving_rate_bps(&self) -> f64 {
        self.receiving_rate_bps
    }

    /// Current rate adaption recommendation.
    pub fn mode(&self) -> RateAdaptionMode {
        self.mode
    }

    /// Timestamp of the last feedback report.
    pub fn last_timestamp(&self) -> Instant {
        self.last_timestamp
    }

    /// Timestamp of the most recent packet update.
    pub fn current_timestamp(&self) -> Instant {
        self.current_timestamp
    }

    /// Number of packets currently retained in the log window.
    pub fn window_len(&self) -> usize {
        self.window.len()
    }
}

/// Scale a duration-valued penalty by a dimensionless factor.
fn scale(base: Duration, factor: f64) -> Duration {
    Duration::from_secs_f64(base.as_secs_f64() * factor)
}
