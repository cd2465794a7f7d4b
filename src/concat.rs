//! Concatenation orchestrator.
//!
//! Drives the whole stitching chain for one run:
//!
//! 1. **Decode**: every raw PCM clip becomes an [`AudioBuffer`].
//! 2. **Noise level**: with comfort noise enabled, one file-wide level is
//!    picked: `min(configured, mean(clip floors) - 5 dB)`.
//! 3. **Normalise**: each clip is trimmed, faded, and padded.
//! 4. **Join**: leading buffer, then clip / pause / clip … each crossfaded
//!    onto the running track.
//! 5. **Trail**: a trailing buffer is crossfaded onto the end.

use tracing::{debug, info};

use crate::{
    analysis::{analyze_noise_floor, dbfs},
    buffer::AudioBuffer,
    config::{PauseConfig, SOURCE_SAMPLE_RATE},
    crossfade::apply_crossfade,
    error::{Result, StitchError},
    noise::generate_comfort_noise,
    normalize::{normalize_segment, NormalizeOptions},
    pause::PausePlan,
    script::Segment,
};

/// How far under the average clip floor the shared comfort noise sits.
const FLOOR_MARGIN_DB: f64 = 5.0;

/// Joins TTS clips into one continuous narration track.
#[derive(Debug, Clone)]
pub struct Concatenator {
    config: PauseConfig,
    sample_rate: u32,
}

impl Default for Concatenator {
    fn default() -> Self {
        Self::new(PauseConfig::default())
    }
}

impl Concatenator {
    /// Concatenator for 24 kHz TTS output.
    pub fn new(config: PauseConfig) -> Self {
        Self::with_sample_rate(config, SOURCE_SAMPLE_RATE)
    }

    /// Concatenator for PCM clips at `sample_rate`.
    pub fn with_sample_rate(config: PauseConfig, sample_rate: u32) -> Self {
        Self { config, sample_rate }
    }

    pub fn config(&self) -> &PauseConfig {
        &self.config
    }

    /// Stitch `clips` (raw 16-bit LE mono PCM) into one buffer.
    ///
    /// `metadata` supplies one pause-context segment per clip.  When it is
    /// absent or its length differs from the clip count, every junction gets
    /// the flat fallback pause instead.
    ///
    /// # Errors
    /// [`StitchError::EmptyInput`] when `clips` is empty, or a decode error
    /// for a clip with an odd byte count.
    pub fn concatenate<C: AsRef<[u8]>>(&self, clips: &[C], metadata: Option<&[Segment]>) -> Result<AudioBuffer> {
        if clips.is_empty() {
            return Err(StitchError::EmptyInput);
        }
        let config = &self.config;
        let plan = PausePlan::resolve(metadata, clips.len(), config);

        match plan {
            PausePlan::ContextAware(_) => info!(
                "concatenating {} segments with context-aware pausing ({}, {} crossfade)",
                clips.len(),
                config.smoothing_mode(),
                config.crossfade_curve
            ),
            PausePlan::FlatFallback(ms) => info!(
                "concatenating {} segments with {}ms pauses ({})",
                clips.len(),
                ms,
                config.smoothing_mode()
            ),
        }

        // ── 1. Decode ────────────────────────────────────────────────────────
        let raw = clips
            .iter()
            .map(|pcm| AudioBuffer::from_pcm_bytes(pcm.as_ref(), self.sample_rate))
            .collect::<Result<Vec<_>>>()?;

        // ── 2. File-wide noise level ─────────────────────────────────────────
        let noise_db = self.target_noise_db(&raw);

        // ── 3. Normalise ─────────────────────────────────────────────────────
        let options = NormalizeOptions::from_config(config, noise_db);
        let normalized: Vec<AudioBuffer> = raw
            .iter()
            .enumerate()
            .map(|(i, audio)| {
                let out = normalize_segment(audio, &options);
                debug!("segment {}: {}ms -> {}ms (normalized)", i + 1, audio.duration_ms(), out.duration_ms());
                out
            })
            .collect();

        // ── 4. Join ──────────────────────────────────────────────────────────
        let mut track = self.filler(config.file_leading_ms, noise_db);
        for (i, segment) in normalized.iter().enumerate() {
            if i > 0 {
                let pause = self.filler(plan.pause_before(i, config), noise_db);
                track = self.crossfade(&track, &pause);
            }
            track = self.crossfade(&track, segment);
        }

        // ── 5. Trail ─────────────────────────────────────────────────────────
        let trailing = self.filler(config.file_trailing_ms, noise_db);
        track = self.crossfade(&track, &trailing);

        info!("concatenated track: {}ms", track.duration_ms());
        Ok(track)
    }

    /// Shared comfort-noise level for a run: the configured level, lowered to
    /// 5 dB under the mean noise floor of the non-silent clips.
    pub fn target_noise_db(&self, clips: &[AudioBuffer]) -> f64 {
        let configured = self.config.comfort_noise_db;
        if !self.config.use_comfort_noise {
            return configured;
        }
        let floors: Vec<f64> = clips
            .iter()
            .filter(|c| dbfs(c).is_some())
            .map(analyze_noise_floor)
            .collect();
        if floors.is_empty() {
            return configured;
        }
        let mean = floors.iter().sum::<f64>() / floors.len() as f64;
        let target = configured.min(mean - FLOOR_MARGIN_DB);
        debug!("target comfort noise level: {target:.1} dBFS");
        target
    }

    /// Pause or edge buffer: comfort noise or digital silence.
    fn filler(&self, duration_ms: u32, noise_db: f64) -> AudioBuffer {
        if self.config.use_comfort_noise {
            generate_comfort_noise(duration_ms, noise_db, self.sample_rate, None)
        } else {
            AudioBuffer::silent(duration_ms, self.sample_rate, 1)
        }
    }

    fn crossfade(&self, a: &AudioBuffer, b: &AudioBuffer) -> AudioBuffer {
        apply_crossfade(a, b, self.config.crossfade_ms, self.config.crossfade_curve)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
