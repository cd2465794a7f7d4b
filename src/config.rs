//! Pause timing and smoothing configuration.
//!
//! [`PauseConfig`] is an immutable snapshot handed to every stage of one
//! concatenation run.  It deserialises from JSON with `#[serde(default)]`, so
//! a render manifest only needs to spell out the fields it overrides.

use serde::{Deserialize, Serialize};

use crate::crossfade::FadeCurve;

// ─────────────────────────────────────────────────────────────────────────────
// Format constants
// ─────────────────────────────────────────────────────────────────────────────

/// Sample rate of the raw PCM returned by the TTS service.
pub const SOURCE_SAMPLE_RATE: u32 = 24_000;

/// Sample rate of the exported MP3.
pub const TARGET_SAMPLE_RATE: u32 = 44_100;

/// Channel count of the exported MP3 (mono).
pub const TARGET_CHANNELS: u16 = 1;

/// Speaker name that marks the narrator role in a script.
pub const NARRATOR: &str = "Narrator";

// ─────────────────────────────────────────────────────────────────────────────
// Smoothing constants
// ─────────────────────────────────────────────────────────────────────────────

/// Default comfort-noise level in dBFS.
pub const COMFORT_NOISE_LEVEL_DB: f64 = -55.0;

/// Micro-fade applied to both edges of every comfort-noise buffer.
pub const NOISE_FADE_MS: u32 = 10;

/// Crossfades shorter than this are skipped and the buffers butt-joined.
pub const MIN_CROSSFADE_MS: u32 = 10;

// ─────────────────────────────────────────────────────────────────────────────
// PauseConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Tunable durations and toggles for one concatenation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PauseConfig {
    /// Paragraph transition.
    pub narrator_to_narrator_ms: u32,
    /// Setup to dialogue.
    pub narrator_to_character_ms: u32,
    /// Return to narration.
    pub character_to_narrator_ms: u32,
    /// Quick dialogue exchange (same speaker; a new voice gets 1.25×).
    pub character_to_character_ms: u32,
    /// Junction pause when no usable segment metadata is available.
    pub flat_pause_ms: u32,

    /// Buffer at the very start of the file.
    pub file_leading_ms: u32,
    /// Buffer at the very end of the file.
    pub file_trailing_ms: u32,
    /// Buffer wrapped around each trimmed clip.
    pub segment_edge_buffer_ms: u32,

    pub crossfade_ms: u32,
    pub crossfade_curve: FadeCurve,

    /// Fill buffers and pauses with pink noise instead of digital silence.
    pub use_comfort_noise: bool,
    /// Upper bound for the comfort-noise level, in dBFS.
    pub comfort_noise_db: f64,

    pub segment_fade_in_ms: u32,
    pub segment_fade_out_ms: u32,
}

impl Default for PauseConfig {
    fn default() -> Self {
        Self {
            narrator_to_narrator_ms: 750,
            narrator_to_character_ms: 500,
            character_to_narrator_ms: 500,
            character_to_character_ms: 400,
            flat_pause_ms: 500,
            file_leading_ms: 500,
            file_trailing_ms: 1500,
            segment_edge_buffer_ms: 200,
            crossfade_ms: 75,
            crossfade_curve: FadeCurve::Logarithmic,
            use_comfort_noise: true,
            comfort_noise_db: COMFORT_NOISE_LEVEL_DB,
            segment_fade_in_ms: 15,
            segment_fade_out_ms: 25,
        }
    }
}

impl PauseConfig {
    /// Human-readable description of the gap filler, for logging.
    pub fn smoothing_mode(&self) -> &'static str {
        if self.use_comfort_noise {
            "comfort noise"
        } else {
            "digital silence"
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let cfg: PauseConfig =
            serde_json::from_str(r#"{"crossfade_ms": 40, "crossfade_curve": "s_curve"}"#).unwrap();
        assert_eq!(cfg.crossfade_ms, 40);
        assert_eq!(cfg.crossfade_curve, FadeCurve::SCurve);
        assert_eq!(cfg.narrator_to_narrator_ms, 750);
        assert!(cfg.use_comfort_noise);
    }

    #[test]
    fn test_empty_json_is_default() {
        let cfg: PauseConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, PauseConfig::default());
    }

    #[test]
    fn test_unknown_curve_rejected() {
        let res: Result<PauseConfig, _> = serde_json::from_str(r#"{"crossfade_curve": "cubic"}"#);
        assert!(res.is_err());
    }
}
