//! Per-clip edge normalisation.
//!
//! Each clip is trimmed of leading/trailing silence, given short fades so the
//! speech never starts or stops on a click, and wrapped in a buffer of
//! comfort noise (or digital silence) on both sides.

use crate::{
    analysis::{dbfs, leading_silence_ms, trailing_silence_ms},
    buffer::AudioBuffer,
    config::PauseConfig,
    noise::generate_comfort_noise,
};

/// Gap between a clip's loudness and the level treated as silence.
const SILENCE_MARGIN_DB: f64 = 16.0;

/// Silence threshold used when the clip itself is digital silence.
const SILENT_CLIP_THRESHOLD_DB: f64 = -50.0;

/// Shortest fade applied to clips too short for the configured fades.
const MIN_MINI_FADE_MS: u32 = 5;

/// Settings for [`normalize_segment`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizeOptions {
    pub buffer_ms: u32,
    pub fade_in_ms: u32,
    pub fade_out_ms: u32,
    pub use_comfort_noise: bool,
    /// Comfort-noise level, already adjusted for the whole file.
    pub comfort_noise_db: f64,
}

impl NormalizeOptions {
    /// Options from `config`, with the file-wide noise level `noise_db`.
    pub fn from_config(config: &PauseConfig, noise_db: f64) -> Self {
        Self {
            buffer_ms: config.segment_edge_buffer_ms,
            fade_in_ms: config.segment_fade_in_ms,
            fade_out_ms: config.segment_fade_out_ms,
            use_comfort_noise: config.use_comfort_noise,
            comfort_noise_db: noise_db,
        }
    }
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        let config = PauseConfig::default();
        Self::from_config(&config, config.comfort_noise_db)
    }
}

/// Trim the silent edges of `audio`; each side loses at most half the clip.
pub fn trim_silence(audio: &AudioBuffer) -> AudioBuffer {
    let threshold = dbfs(audio).map_or(SILENT_CLIP_THRESHOLD_DB, |db| db - SILENCE_MARGIN_DB);

    let duration = audio.duration_ms();
    let start = leading_silence_ms(audio, threshold).min(duration / 2);
    let end = trailing_silence_ms(audio, threshold).min(duration / 2);

    if start + end < duration {
        audio.slice_ms(start, duration - end)
    } else {
        audio.clone()
    }
}

/// Fade the edges of trimmed speech.  When the configured fades do not fit,
/// both ends get a "mini-fade" of a quarter of the content (at least 5 ms).
pub fn fade_edges(speech: &AudioBuffer, fade_in_ms: u32, fade_out_ms: u32) -> AudioBuffer {
    if speech.is_empty() {
        return speech.clone();
    }
    let len = speech.duration_ms();
    if len > fade_in_ms + fade_out_ms {
        speech.fade_in(fade_in_ms).fade_out(fade_out_ms)
    } else {
        let mini = (len / 4).max(MIN_MINI_FADE_MS);
        speech.fade_in(mini).fade_out(mini)
    }
}

/// Trim, fade, and pad one clip.
///
/// The result is the trimmed speech surrounded by `buffer_ms` of comfort
/// noise (matched under the clip's own noise floor) or digital silence.
pub fn normalize_segment(audio: &AudioBuffer, options: &NormalizeOptions) -> AudioBuffer {
    let trimmed = trim_silence(audio);
    let speech = fade_edges(&trimmed, options.fade_in_ms, options.fade_out_ms);

    let pad = if options.use_comfort_noise && options.buffer_ms > 0 {
        generate_comfort_noise(
            options.buffer_ms,
            options.comfort_noise_db,
            audio.sample_rate(),
            Some(audio),
        )
    } else {
        AudioBuffer::silent(options.buffer_ms, audio.sample_rate(), audio.channels())
    };

    pad.append(&speech).append(&pad)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 24_000;

    fn tone(ms: u32, amp: f64) -> Vec<i16> {
        (0..(RATE / 1000 * ms)).map(|i| (amp * (i as f64 * 0.2).sin()) as i16).collect()
    }

    fn clip(parts: &[(u32, f64)]) -> AudioBuffer {
        let samples = parts.iter().flat_map(|&(ms, amp)| tone(ms, amp)).collect();
        AudioBuffer::new(samples, RATE, 1)
    }

    fn silent_opts(buffer_ms: u32) -> NormalizeOptions {
        NormalizeOptions { buffer_ms, use_comfort_noise: false, ..NormalizeOptions::default() }
    }

    #[test]
    fn test_trims_silent_edges() {
        let audio = clip(&[(300, 0.0), (600, 12_000.0), (200, 0.0)]);
        let trimmed = trim_silence(&audio);
        assert_eq!(trimmed.duration_ms(), 600);
    }

    #[test]
    fn test_trim_capped_at_half() {
        // 80% leading silence: only half the clip may go
        let audio = clip(&[(800, 0.0), (200, 12_000.0)]);
        let trimmed = trim_silence(&audio);
        assert_eq!(trimmed.duration_ms(), 500);
    }

    #[test]
    fn test_silent_clip_is_not_emptied() {
        let audio = AudioBuffer::silent(400, RATE, 1);
        let trimmed = trim_silence(&audio);
        assert_eq!(trimmed.duration_ms(), 400);
    }

    #[test]
    fn test_trim_never_empties_nonempty_clips() {
        for ms in [1, 5, 15, 33, 120] {
            for amp in [0.0, 50.0, 9_000.0] {
                let audio = clip(&[(ms, amp)]);
                assert!(!trim_silence(&audio).is_empty(), "{ms}ms @ {amp}");
            }
        }
    }

    #[test]
    fn test_regular_fades() {
        let speech = AudioBuffer::new(vec![8_000; 24_000], RATE, 1);
        let faded = fade_edges(&speech, 15, 25);
        assert_eq!(faded.samples()[0], 0);
        // 15 ms in: fade-in finished
        assert_eq!(faded.samples()[360], 8_000);
        // 20 ms before the end: still inside the 25 ms fade-out
        assert!(faded.samples()[24_000 - 480] < 8_000);
    }

    #[test]
    fn test_mini_fade_on_short_clip() {
        let speech = AudioBuffer::new(vec![8_000; 120], RATE, 1); // 5 ms
        let faded = fade_edges(&speech, 15, 25);
        assert_eq!(faded.frames(), 120);
        assert_eq!(faded.samples()[0], 0);
        assert_eq!(*faded.samples().last().unwrap(), 0);
    }

    #[test]
    fn test_five_ms_clip_normalizes() {
        let audio = clip(&[(5, 9_000.0)]);
        let opts = NormalizeOptions { fade_in_ms: 15, fade_out_ms: 25, ..NormalizeOptions::default() };
        let out = normalize_segment(&audio, &opts);
        assert!(out.duration_ms() >= 2 * opts.buffer_ms + 5);
    }

    #[test]
    fn test_padding_with_silence() {
        let audio = clip(&[(500, 10_000.0)]);
        let out = normalize_segment(&audio, &silent_opts(200));
        assert_eq!(out.duration_ms(), 900);
        let pad = out.frames_for_ms(200);
        assert!(out.samples()[..pad].iter().all(|&s| s == 0));
        assert!(out.samples()[out.frames() - pad..].iter().all(|&s| s == 0));
    }

    #[test]
    fn test_padding_with_comfort_noise_stays_quiet() {
        let audio = clip(&[(500, 10_000.0)]);
        let opts = NormalizeOptions { comfort_noise_db: -55.0, ..NormalizeOptions::default() };
        let out = normalize_segment(&audio, &opts);
        assert_eq!(out.duration_ms(), 900);
        let pad = out.frames_for_ms(200);
        let peak = out.samples()[..pad].iter().map(|s| s.saturating_abs()).max().unwrap();
        assert!(peak <= 60, "comfort noise peak {peak}");
    }

    #[test]
    fn test_input_untouched() {
        let audio = clip(&[(100, 0.0), (300, 10_000.0)]);
        let copy = audio.clone();
        let _ = normalize_segment(&audio, &silent_opts(50));
        assert_eq!(audio, copy);
    }
}
