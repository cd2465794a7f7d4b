//! Level analysis: dBFS, noise-floor estimation and edge-silence detection.

use crate::buffer::AudioBuffer;

/// Full-scale reference for noise-floor and comfort-noise levels.
pub const FULL_SCALE: f64 = 32_767.0;

/// Largest possible 16-bit magnitude; reference for whole-buffer dBFS.
const MAX_AMPLITUDE: f64 = 32_768.0;

/// Window length used by the noise-floor analyzer.
pub const NOISE_WINDOW_MS: u32 = 10;

/// Lower percentile of window RMS values taken as the noise floor.
pub const NOISE_PERCENTILE: f64 = 10.0;

/// Minimum number of non-silent windows for a percentile estimate.
const MIN_NOISE_WINDOWS: usize = 10;

/// Floor reported for clips with no signal at all.
pub const SILENT_FLOOR_DB: f64 = -60.0;

/// Chunk length used when scanning for leading/trailing silence.
const SILENCE_CHUNK_MS: u32 = 10;

// ─────────────────────────────────────────────────────────────────────────────
// Level helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Root-mean-square of raw samples.
pub fn rms(samples: &[i16]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
    (sum_sq / samples.len() as f64).sqrt()
}

fn samples_dbfs(samples: &[i16]) -> Option<f64> {
    let r = rms(samples);
    (r > 0.0).then(|| 20.0 * (r / MAX_AMPLITUDE).log10())
}

/// Loudness of the whole buffer in dBFS, or `None` for digital silence.
pub fn dbfs(audio: &AudioBuffer) -> Option<f64> {
    samples_dbfs(audio.samples())
}

/// Linear-interpolated percentile (`p` in 0–100) of unsorted values.
fn percentile(values: &mut [f64], p: f64) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let rank = p / 100.0 * (values.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    values[lo] + (values[hi] - values[lo]) * (rank - lo as f64)
}

// ─────────────────────────────────────────────────────────────────────────────
// Noise floor
// ─────────────────────────────────────────────────────────────────────────────

/// Estimate the ambient noise level of a clip in dBFS.
///
/// The clip is cut into 10 ms windows; windows of pure digital silence are
/// ignored, and the 10th percentile of the remaining window RMS values is
/// reported.  With fewer than ten usable windows the estimate falls back to
/// the clip's overall level minus 20 dB, or [`SILENT_FLOOR_DB`] when the clip
/// is entirely silent.
pub fn analyze_noise_floor(audio: &AudioBuffer) -> f64 {
    let window = audio.frames_for_ms(NOISE_WINDOW_MS) * audio.channels() as usize;
    let mut window_rms: Vec<f64> = if window == 0 {
        Vec::new()
    } else {
        audio
            .samples()
            .chunks_exact(window)
            .map(rms)
            .filter(|&r| r > 0.0)
            .collect()
    };

    if window_rms.len() < MIN_NOISE_WINDOWS {
        return dbfs(audio).map_or(SILENT_FLOOR_DB, |db| db - 20.0);
    }

    let floor_rms = percentile(&mut window_rms, NOISE_PERCENTILE);
    20.0 * (floor_rms / FULL_SCALE).log10()
}

// ─────────────────────────────────────────────────────────────────────────────
// Edge silence
// ─────────────────────────────────────────────────────────────────────────────

fn is_silent_chunk(chunk: &[i16], threshold_db: f64) -> bool {
    samples_dbfs(chunk).map_or(true, |db| db < threshold_db)
}

fn silent_chunks<'a>(chunks: impl Iterator<Item = &'a [i16]>, threshold_db: f64) -> u32 {
    chunks.take_while(|c| is_silent_chunk(c, threshold_db)).count() as u32
}

fn chunk_len(audio: &AudioBuffer) -> usize {
    (audio.frames_for_ms(SILENCE_CHUNK_MS) * audio.channels() as usize).max(1)
}

/// Milliseconds of silence (10 ms granularity) at the start of `audio`.
pub fn leading_silence_ms(audio: &AudioBuffer, threshold_db: f64) -> u32 {
    let chunks = silent_chunks(audio.samples().chunks(chunk_len(audio)), threshold_db);
    (chunks * SILENCE_CHUNK_MS).min(audio.duration_ms())
}

/// Milliseconds of silence (10 ms granularity) at the end of `audio`.
pub fn trailing_silence_ms(audio: &AudioBuffer, threshold_db: f64) -> u32 {
    let chunks = silent_chunks(audio.samples().rchunks(chunk_len(audio)), threshold_db);
    (chunks * SILENCE_CHUNK_MS).min(audio.duration_ms())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
