//! In-memory 16-bit audio buffer and the PCM decoder.
//!
//! [`AudioBuffer`] has value semantics: every transform (slice, fade, append)
//! returns a new buffer and leaves its input untouched.  Durations are
//! expressed in whole milliseconds and converted to frames with
//! `sample_rate * ms / 1000`, so slicing and crossfading agree on lengths.

use std::path::Path;

use crate::error::{Result, StitchError};

/// Interleaved signed 16-bit samples plus their format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBuffer {
    samples: Vec<i16>,
    sample_rate: u32,
    channels: u16,
}

impl AudioBuffer {
    /// Wrap already-decoded interleaved samples.
    pub fn new(samples: Vec<i16>, sample_rate: u32, channels: u16) -> Self {
        debug_assert!(channels > 0, "channel count must be non-zero");
        debug_assert!(sample_rate > 0, "sample rate must be non-zero");
        Self { samples, sample_rate, channels }
    }

    /// Decode raw signed 16-bit little-endian mono PCM.
    ///
    /// The only validation performed is that `pcm` holds whole samples.
    pub fn from_pcm_bytes(pcm: &[u8], sample_rate: u32) -> Result<Self> {
        if pcm.len() % 2 != 0 {
            return Err(StitchError::OddPcmLength { len: pcm.len() });
        }
        let samples = pcm
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        Ok(Self::new(samples, sample_rate, 1))
    }

    /// Digital silence of the given duration.
    pub fn silent(duration_ms: u32, sample_rate: u32, channels: u16) -> Self {
        let frames = ms_to_frames(duration_ms, sample_rate);
        Self::new(vec![0; frames * channels as usize], sample_rate, channels)
    }

    /// Empty buffer with the same format as `self`.
    pub fn empty_like(&self) -> Self {
        Self::new(Vec::new(), self.sample_rate, self.channels)
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<i16> {
        self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// Duration in whole milliseconds (truncated).
    pub fn duration_ms(&self) -> u32 {
        (self.frames() as u64 * 1000 / self.sample_rate as u64) as u32
    }

    /// Frame count covering `ms` milliseconds at this buffer's rate.
    pub fn frames_for_ms(&self, ms: u32) -> usize {
        ms_to_frames(ms, self.sample_rate)
    }

    pub fn same_format(&self, other: &Self) -> bool {
        self.sample_rate == other.sample_rate && self.channels == other.channels
    }

    // ── Transforms ────────────────────────────────────────────────────────────

    /// Frames `[start, end)`, clamped to the buffer.
    pub fn slice_frames(&self, start: usize, end: usize) -> Self {
        let ch = self.channels as usize;
        let end = end.min(self.frames());
        let start = start.min(end);
        Self::new(self.samples[start * ch..end * ch].to_vec(), self.sample_rate, self.channels)
    }

    /// Milliseconds `[start_ms, end_ms)`, clamped to the buffer.
    pub fn slice_ms(&self, start_ms: u32, end_ms: u32) -> Self {
        self.slice_frames(self.frames_for_ms(start_ms), self.frames_for_ms(end_ms))
    }

    /// `self` followed by `other`.
    pub fn append(&self, other: &Self) -> Self {
        debug_assert!(self.same_format(other), "appending buffers of different formats");
        let mut samples = Vec::with_capacity(self.samples.len() + other.samples.len());
        samples.extend_from_slice(&self.samples);
        samples.extend_from_slice(&other.samples);
        Self::new(samples, self.sample_rate, self.channels)
    }

    /// Linear amplitude ramp from silence up to full level over `ms`.
    pub fn fade_in(&self, ms: u32) -> Self {
        let n = self.frames_for_ms(ms).min(self.frames());
        self.apply_gain_ramp(0, n, |i| i as f64 / n as f64)
    }

    /// Linear amplitude ramp from full level down to silence over `ms`.
    pub fn fade_out(&self, ms: u32) -> Self {
        let n = self.frames_for_ms(ms).min(self.frames());
        let start = self.frames() - n;
        self.apply_gain_ramp(start, n, |i| 1.0 - (i + 1) as f64 / n as f64)
    }

    fn apply_gain_ramp(&self, start: usize, n: usize, gain: impl Fn(usize) -> f64) -> Self {
        let mut out = self.clone();
        if n == 0 {
            return out;
        }
        let ch = self.channels as usize;
        for (i, frame) in out.samples[start * ch..(start + n) * ch]
            .chunks_exact_mut(ch)
            .enumerate()
        {
            let g = gain(i);
            for s in frame {
                *s = to_i16(f64::from(*s) * g);
            }
        }
        out
    }

    // ── WAV writer ────────────────────────────────────────────────────────────

    /// Write the buffer as a 16-bit PCM WAV file at its own rate and layout.
    pub fn write_wav(&self, output_path: &Path) -> Result<()> {
        let spec = hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(output_path, spec)?;
        for &s in &self.samples {
            writer.write_sample(s)?;
        }
        writer.finalize()?;
        tracing::debug!(
            frames = self.frames(),
            path = %output_path.display(),
            "wrote WAV"
        );
        Ok(())
    }
}

/// Convert a duration to a frame count at `sample_rate`.
pub fn ms_to_frames(ms: u32, sample_rate: u32) -> usize {
    (u64::from(sample_rate) * u64::from(ms) / 1000) as usize
}

/// Float → i16, saturating at the 16-bit range and truncating toward zero.
pub fn to_i16(x: f64) -> i16 {
    x.clamp(i16::MIN as f64, i16::MAX as f64) as i16
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
