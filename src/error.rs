//! Error types for echo canceller construction and processing.

use thiserror::Error;

/// Identifies which input block an invalid sample was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    /// The microphone (near-end) block.
    Microphone,
    /// The reference (far-end/loopback) block.
    Reference,
}

impl std::fmt::Display for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stream::Microphone => write!(f, "microphone"),
            Stream::Reference => write!(f, "reference"),
        }
    }
}

/// Errors reported by [`NlmsAec`](crate::NlmsAec).
///
/// Processing errors are detected before any filter state is mutated, so a
/// failed call leaves the weights and reference history exactly as they were.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum AecError {
    /// The filter length was zero.
    #[error("filter length must be a positive number of taps")]
    InvalidFilterLength,

    /// The step size was non-positive or non-finite.
    #[error("step size must be positive and finite, got {0}")]
    InvalidStepSize(f32),

    /// The regularization constant was non-positive or non-finite.
    #[error("regularization must be positive and finite, got {0}")]
    InvalidRegularization(f32),

    /// The microphone block was empty.
    #[error("microphone block must not be empty")]
    EmptyBlock,

    /// The reference block length did not match the microphone block length.
    #[error("reference block length {reference} does not match microphone block length {mic}")]
    BlockLengthMismatch { mic: usize, reference: usize },

    /// The output buffer length did not match the microphone block length.
    #[error("output buffer length {output} does not match microphone block length {mic}")]
    OutputLengthMismatch { mic: usize, output: usize },

    /// An input sample was NaN or infinite.
    #[error("non-finite sample in {stream} block at index {index}")]
    NonFiniteSample { stream: Stream, index: usize },
}

pub type Result<T> = std::result::Result<T, AecError>;
