//! Echo canceller configuration.

use crate::error::{AecError, Result};

/// Configuration for the NLMS echo canceller.
///
/// All values are fixed for the lifetime of a canceller instance.
#[derive(Debug, Clone, PartialEq)]
pub struct AecConfig {
    /// Length of the adaptive filter in taps. Bounds the longest echo-path
    /// delay the filter can model; estimate and update both cost O(taps) per
    /// sample, so longer reverberation coverage is proportionally more
    /// expensive.
    pub filter_length: usize,
    /// NLMS step size (mu). Controls convergence speed vs. stability; the
    /// normalized update is stable for values in (0, 2) regardless of
    /// reference signal level.
    pub step_size: f32,
    /// Small constant added to the reference energy before normalization, so
    /// a silent reference cannot drive the update step toward infinity.
    pub regularization: f32,
}

impl Default for AecConfig {
    fn default() -> Self {
        Self {
            filter_length: 1024,
            step_size: 0.01,
            regularization: 1e-10,
        }
    }
}

impl AecConfig {
    /// Checks that every parameter is usable.
    ///
    /// Invalid values are rejected rather than clamped: the canceller must
    /// never run with a degenerate tuning.
    pub fn validate(&self) -> Result<()> {
        if self.filter_length == 0 {
            return Err(AecError::InvalidFilterLength);
        }
        if !self.step_size.is_finite() || self.step_size <= 0.0 {
            return Err(AecError::InvalidStepSize(self.step_size));
        }
        if !self.regularization.is_finite() || self.regularization <= 0.0 {
            return Err(AecError::InvalidRegularization(self.regularization));
        }
        Ok(())
    }
}
