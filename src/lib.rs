//! Acoustic echo cancellation with a time-domain Normalized Least Mean
//! Squares (NLMS) adaptive filter.
//!
//! The canceller consumes two time-aligned sample streams per call, a
//! microphone block and an optional reference (loopback/system) block, and
//! produces one echo-cancelled output block. It adapts online, one sample at
//! a time, and is built to run inside a real-time audio callback: processing
//! allocates nothing, takes no locks, and costs O(filter length) per sample.
//!
//! Device capture, stream alignment and sample-rate matching belong to the
//! caller; the canceller assumes both blocks are already aligned when both
//! are present, and degrades to pass-through when no reference exists.
//!
//! ```
//! use nlms_aec::{AecConfig, NlmsAec};
//!
//! let mut aec = NlmsAec::new(AecConfig {
//!     filter_length: 256,
//!     step_size: 0.5,
//!     regularization: 1e-10,
//! })?;
//!
//! let reference = vec![0.0f32; 128];
//! let mic = vec![0.0f32; 128];
//! let mut cleaned = vec![0.0f32; 128];
//! aec.process_into(&mic, Some(&reference), &mut cleaned)?;
//! # Ok::<(), nlms_aec::AecError>(())
//! ```

mod canceller;
mod config;
mod error;

pub use canceller::NlmsAec;
pub use config::AecConfig;
pub use error::{AecError, Stream};
