//! Configurable parameters for the NADA receiver.

use std::time::Duration;

/// Receiver parameters.
///
/// Defaults follow the parameter values suggested by RFC 8698. All values
/// are fixed for the lifetime of a [`Receiver`](crate::receiver::Receiver).
#[derive(Debug, Clone)]
pub struct Config {
    /// EWMA weight for the loss and marking ratio estimates, in (0, 1].
    pub alpha: f64,
    /// Queuing delay above which a packet is flagged as delay-exceeded.
    pub queueing_delay_threshold: Duration,
    /// QTH: queuing delay at which non-linear warping of the delay signal
    /// kicks in. Must be positive.
    pub delay_warp_threshold: Duration,
    /// LAMBDA: decay steepness of the warp beyond the threshold.
    pub delay_warp_decay: f64,
    /// DMARK: delay penalty when the marking ratio sits at its reference.
    pub reference_delay_marking: Duration,
    /// PMRREF: reference ECN marking ratio. Must be positive.
    pub reference_marking_ratio: f64,
    /// DLOSS: delay penalty when the loss ratio sits at its reference.
    pub reference_delay_loss: Duration,
    /// PLRREF: reference packet loss ratio. Must be positive.
    pub reference_loss_ratio: f64,
    /// Duration of the packet-log observation window (LOGWIN).
    pub log_window: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            alpha: 0.1,
            queueing_delay_threshold: Duration::from_millis(10),
            delay_warp_threshold: Duration::from_millis(50),
            delay_warp_decay: 0.5,
            reference_delay_marking: Duration::from_millis(2),
            reference_marking_ratio: 0.01,
            reference_delay_loss: Duration::from_millis(10),
            reference_loss_ratio: 0.01,
            log_window: Duration::from_millis(500),
        }
    }
}
