//! Error taxonomy for the stitching engine.
//!
//! Only hard failures live here.  Format violations found by the verifier are
//! reported as a [`VerificationResult`](crate::verify::VerificationResult)
//! value, and degenerate numeric input (silent clips, tiny crossfades) always
//! has a defined fallback instead of an error.

use thiserror::Error;

/// All errors produced by the stitchcast library.
#[derive(Debug, Error)]
pub enum StitchError {
    #[error("no audio clips to concatenate")]
    EmptyInput,

    #[error("PCM payload has odd length {len}; expected whole 16-bit samples")]
    OddPcmLength { len: usize },

    #[error("resampler error: {0}")]
    Resample(String),

    #[error("MP3 encoder error: {0}")]
    Encode(String),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StitchError>;
