//! Comfort-noise generator.
//!
//! Pauses and edge buffers are filled with low-level pink noise rather than
//! digital silence, which listeners hear as a dropped connection.  White
//! Gaussian noise is shaped by a three-pole recursive filter that
//! approximates a 1/f spectrum, peak-normalised, and scaled to a dBFS target.

use rand::Rng;
use rand_distr::StandardNormal;

use crate::{
    analysis::{analyze_noise_floor, dbfs, FULL_SCALE},
    buffer::{ms_to_frames, to_i16, AudioBuffer},
    config::NOISE_FADE_MS,
};

/// Margin kept between synthetic noise and a reference clip's real floor.
const REFERENCE_HEADROOM_DB: f64 = 3.0;

// ─────────────────────────────────────────────────────────────────────────────
// Pink filter
// ─────────────────────────────────────────────────────────────────────────────

/// Three leaky integrators summed with a share of the raw white sample.
///
/// Each output depends on the previous filter state, so samples are produced
/// strictly in order.
#[derive(Debug, Default, Clone, Copy)]
struct PinkFilter {
    b0: f64,
    b1: f64,
    b2: f64,
}

impl PinkFilter {
    fn step(&mut self, white: f64) -> f64 {
        self.b0 = 0.99886 * self.b0 + white * 0.0555179;
        self.b1 = 0.99332 * self.b1 + white * 0.0750759;
        self.b2 = 0.96900 * self.b2 + white * 0.1538520;
        self.b0 + self.b1 + self.b2 + white * 0.5362
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────────────────────────

/// Convert a dBFS level to a 16-bit linear amplitude.
pub fn db_to_amplitude(db: f64) -> f64 {
    10f64.powf(db / 20.0) * FULL_SCALE
}

/// Level actually used for noise next to `reference`: never louder than
/// 3 dB under the reference's own noise floor.
pub fn matched_level(target_db: f64, reference: Option<&AudioBuffer>) -> f64 {
    match reference {
        Some(r) if dbfs(r).is_some() => {
            target_db.min(analyze_noise_floor(r) - REFERENCE_HEADROOM_DB)
        }
        _ => target_db,
    }
}

/// Generate mono comfort noise using the thread-local RNG.
///
/// Peak amplitude matches `target_db`, optionally lowered to sit under the
/// noise floor of `reference`.  A zero duration yields an empty buffer.
pub fn generate_comfort_noise(
    duration_ms: u32,
    target_db: f64,
    sample_rate: u32,
    reference: Option<&AudioBuffer>,
) -> AudioBuffer {
    generate_comfort_noise_with(&mut rand::rng(), duration_ms, target_db, sample_rate, reference)
}

/// [`generate_comfort_noise`] with an explicit random source.
pub fn generate_comfort_noise_with<R: Rng>(
    rng: &mut R,
    duration_ms: u32,
    target_db: f64,
    sample_rate: u32,
    reference: Option<&AudioBuffer>,
) -> AudioBuffer {
    let num_samples = ms_to_frames(duration_ms, sample_rate);
    if num_samples == 0 {
        return AudioBuffer::new(Vec::new(), sample_rate, 1);
    }

    let mut filter = PinkFilter::default();
    let pink: Vec<f64> = (0..num_samples)
        .map(|_| filter.step(rng.sample(StandardNormal)))
        .collect();

    let peak = pink.iter().fold(0.0f64, |m, &x| m.max(x.abs()));
    let scale = if peak > 0.0 { 1.0 / peak } else { 0.0 };
    let amplitude = db_to_amplitude(matched_level(target_db, reference));

    let samples = pink.iter().map(|&x| to_i16(x * scale * amplitude)).collect();
    let noise = AudioBuffer::new(samples, sample_rate, 1);

    if duration_ms > NOISE_FADE_MS * 2 {
        noise.fade_in(NOISE_FADE_MS).fade_out(NOISE_FADE_MS)
    } else {
        noise
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
