//! The NLMS adaptive filter.

use nalgebra::DVector;

use crate::config::AecConfig;
use crate::error::{AecError, Result, Stream};

/// Implements an Acoustic Echo Canceller using a time-domain adaptive FIR
/// filter with the Normalized Least Mean Squares (NLMS) update rule.
///
/// The filter models the echo path as an impulse response over the last
/// `filter_length` reference samples, predicts the echo leaking into the
/// microphone signal, and subtracts the prediction. The residual drives the
/// weight update, normalized by the instantaneous reference energy so the
/// adaptation step stays stable across varying reference loudness.
///
/// One instance serves one capture session; it holds no shared state and is
/// driven synchronously, one block at a time, in strict temporal order.
pub struct NlmsAec {
    weights: DVector<f32>,
    reference_history: DVector<f32>,
    step_size: f32,
    regularization: f32,
}

impl NlmsAec {
    /// Creates a new `NlmsAec` instance with zeroed weights and reference
    /// history.
    ///
    /// # Arguments
    ///
    /// * `config`: See [`AecConfig`]. Invalid values (zero filter length,
    ///   non-positive or non-finite step size or regularization) are
    ///   rejected here; the canceller never runs with them.
    pub fn new(config: AecConfig) -> Result<Self> {
        config.validate()?;
        log::debug!(
            "NlmsAec: {} taps, step size {}, regularization {:e}",
            config.filter_length,
            config.step_size,
            config.regularization
        );

        Ok(Self {
            weights: DVector::from_element(config.filter_length, 0.0),
            reference_history: DVector::from_element(config.filter_length, 0.0),
            step_size: config.step_size,
            regularization: config.regularization,
        })
    }

    /// Processes one block of audio, writing the echo-cancelled samples into
    /// `output`.
    ///
    /// This is the real-time entry point: it performs no allocation, takes no
    /// locks, and costs O(`filter_length`) per sample.
    ///
    /// # Arguments
    ///
    /// * `mic_frame`: The near-end microphone block. Must be non-empty.
    /// * `reference_frame`: The far-end (loopback/system) block believed to
    ///   be the echo source, time-aligned with `mic_frame` by the caller.
    ///   `None` or an empty slice means no reference exists for this block;
    ///   the mic block then passes through untouched and no adaptation
    ///   happens. When present it must match `mic_frame` in length.
    /// * `output`: Receives one echo-cancelled sample per mic sample. Must
    ///   match `mic_frame` in length.
    ///
    /// # Errors
    ///
    /// Length mismatches and non-finite (NaN/infinite) input samples are
    /// reported as errors. All validation happens before the first state
    /// mutation, so a failed call leaves the filter exactly as it was.
    pub fn process_into(
        &mut self,
        mic_frame: &[f32],
        reference_frame: Option<&[f32]>,
        output: &mut [f32],
    ) -> Result<()> {
        // An empty reference block carries no samples to model, same as no
        // reference at all.
        let reference_frame = reference_frame.filter(|frame| !frame.is_empty());

        if mic_frame.is_empty() {
            return Err(AecError::EmptyBlock);
        }
        if output.len() != mic_frame.len() {
            return Err(AecError::OutputLengthMismatch {
                mic: mic_frame.len(),
                output: output.len(),
            });
        }
        if let Some(reference_frame) = reference_frame {
            if reference_frame.len() != mic_frame.len() {
                return Err(AecError::BlockLengthMismatch {
                    mic: mic_frame.len(),
                    reference: reference_frame.len(),
                });
            }
            check_finite(reference_frame, Stream::Reference)?;
        }
        check_finite(mic_frame, Stream::Microphone)?;

        match reference_frame {
            Some(reference_frame) => {
                for ((out, &mic), &reference) in
                    output.iter_mut().zip(mic_frame).zip(reference_frame)
                {
                    *out = self.cancel_sample(mic, reference);
                }
            }
            // No reference: the echo estimate is zero for the whole block,
            // so the mic signal passes through and nothing adapts.
            None => output.copy_from_slice(mic_frame),
        }

        Ok(())
    }

    /// Processes one block of audio and returns the echo-cancelled samples
    /// in a freshly allocated `Vec`.
    ///
    /// Convenience wrapper around [`process_into`](Self::process_into) for
    /// offline use; inside a real-time callback, prefer `process_into` with
    /// a preallocated output buffer.
    pub fn process(&mut self, mic_frame: &[f32], reference_frame: Option<&[f32]>) -> Result<Vec<f32>> {
        let mut output = vec![0.0; mic_frame.len()];
        self.process_into(mic_frame, reference_frame, &mut output)?;
        Ok(output)
    }

    /// Runs one sample through the filter: slide the reference window, form
    /// the echo estimate, update the weights, return the residual.
    ///
    /// The update must see the same window that produced the estimate, so
    /// the shift happens first and everything else reads the shifted state.
    fn cancel_sample(&mut self, mic_sample: f32, reference_sample: f32) -> f32 {
        let taps = self.weights.len();

        // Slide the window: oldest sample out, newest in at index 0, so
        // weights[j] pairs with the reference sample j steps old.
        self.reference_history
            .as_mut_slice()
            .copy_within(..taps - 1, 1);
        self.reference_history[0] = reference_sample;

        let estimate = self.weights.dot(&self.reference_history);
        let residual = mic_sample - estimate;

        // Normalize the step by the windowed reference energy; the
        // regularization keeps the division sane over a silent reference.
        let energy = self.reference_history.norm_squared() + self.regularization;
        self.weights.axpy(
            self.step_size * residual / energy,
            &self.reference_history,
            1.0,
        );

        residual
    }

    /// Zeroes the weights and reference history, keeping the tunables.
    pub fn reset(&mut self) {
        self.weights.fill(0.0);
        self.reference_history.fill(0.0);
    }

    /// The current filter coefficients, newest-aligned tap first.
    pub fn weights(&self) -> &[f32] {
        self.weights.as_slice()
    }

    /// The configured number of filter taps.
    pub fn filter_length(&self) -> usize {
        self.weights.len()
    }

    /// The configured NLMS step size.
    pub fn step_size(&self) -> f32 {
        self.step_size
    }
}

fn check_finite(frame: &[f32], stream: Stream) -> Result<()> {
    match frame.iter().position(|sample| !sample.is_finite()) {
        Some(index) => Err(AecError::NonFiniteSample { stream, index }),
        None => Ok(()),
    }
}
