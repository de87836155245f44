//! Exponential smoothing for the loss and marking ratio estimates.

/// Exponentially weighted moving average.
///
/// Starts at zero and only ever moves through the smoothing step: the NADA
/// loss/marking estimates are defined as a recursive update from a zero
/// start, so there is no first-sample seeding.
#[derive(Debug, Clone)]
pub struct Ewma {
    /// Smoothing weight in (0, 1]. Higher = more responsive.
    alpha: f64,
    /// Current smoothed value.
    value: f64,
}

impl Ewma {
    /// Create a new EWMA with the given smoothing weight.
    pub fn new(alpha: f64) -> Self {
        assert!(
            alpha > 0.0 && alpha <= 1.0,
            "alpha must be in (0, 1]"
        );
        Ewma { alpha, value: 0.0 }
    }

    /// Fold in a new sample (`value += alpha * (sample - value)`) and
    /// return the smoothed value.
    pub fn update(&mut self, sample: f64) -> f64 {
        self.value += self.alpha * (sample - self.value);
        self.value
    }

    /// Get the current smoothed value.
    pub fn value(&self) -> f64 {
        self.value
    }
}
