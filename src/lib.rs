//! # stitchcast
//!
//! Post-processing and concatenation engine for multi-speaker TTS narration.
//! Raw 24 kHz PCM clips go in; a single seamless, tag-free, 44.1 kHz mono MP3
//! comes out.
//!
//! ## Quick start
//!
//! ```no_run
//! use stitchcast::{concatenate, export, verify, PauseConfig, Segment};
//!
//! let clips: Vec<Vec<u8>> = vec![
//!     std::fs::read("batch_000.pcm").unwrap(),
//!     std::fs::read("batch_001.pcm").unwrap(),
//! ];
//! let metadata = vec![
//!     Segment::new("Narrator", "The door creaked open..."),
//!     Segment::new("Emma", "Who's there?"),
//! ];
//!
//! let track = concatenate(&clips, Some(metadata.as_slice()), &PauseConfig::default()).unwrap();
//! let mp3 = export(&track).unwrap();
//! let report = verify(&mp3);
//! assert!(report.passed, "{:?}", report.issues);
//! ```
//!
//! ## Pipeline
//! 1. **Decode**: little-endian 16-bit PCM bytes → [`AudioBuffer`].
//! 2. **Noise floor**: 10th-percentile RMS of 10 ms windows per clip.
//! 3. **Normalise**: trim silent edges, micro-fade, pad with comfort noise.
//! 4. **Pause**: speaker transition plus punctuation bonus, per junction.
//! 5. **Crossfade**: every join blended over a short curved overlap.
//! 6. **Export**: resample to 44.1 kHz, LAME encode, strip ID3 tags.
//! 7. **Verify**: check the first frame header and the absence of tags.

pub mod analysis;
pub mod buffer;
pub mod concat;
pub mod config;
pub mod crossfade;
pub mod error;
pub mod export;
pub mod manifest;
pub mod noise;
pub mod normalize;
pub mod pause;
pub mod resample;
pub mod script;
pub mod verify;

// C FFI for native hosts: render a manifest, verify a file.
pub mod ffi;

// ─── Re-exports for convenience ─────────────────────────────────────────────

pub use buffer::AudioBuffer;
pub use concat::Concatenator;
pub use config::PauseConfig;
pub use crossfade::FadeCurve;
pub use error::{Result, StitchError};
pub use export::{export_mp3, strip_id3_tags};
pub use script::{batch_segments, Segment, SegmentBatch};
pub use verify::{verify_mp3, VerificationResult};

/// Stitch raw 24 kHz PCM clips into one track.
///
/// `metadata` holds one pause-context segment per clip; see
/// [`Concatenator::concatenate`].
pub fn concatenate<C: AsRef<[u8]>>(
    clips: &[C],
    metadata: Option<&[Segment]>,
    config: &PauseConfig,
) -> Result<AudioBuffer> {
    Concatenator::new(config.clone()).concatenate(clips, metadata)
}

/// Encode a track as a tag-free 44.1 kHz mono MP3.
pub fn export(buffer: &AudioBuffer) -> Result<Vec<u8>> {
    export_mp3(buffer)
}

/// Check MP3 bytes against the export format.
pub fn verify(mp3: &[u8]) -> VerificationResult {
    verify_mp3(mp3)
}
