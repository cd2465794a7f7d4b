//! MP3 output verification.
//!
//! Inspects an encoded byte stream for the properties the exporter promises:
//! no ID3 tags, a valid MPEG audio frame, a 44.1 kHz sample rate, and mono.
//! Only the first frame header is examined.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::TARGET_SAMPLE_RATE;

/// Length of an ID3v1 trailer.
const ID3V1_LEN: usize = 128;

/// `(h >> 6) & 3` value for single-channel audio.
const CHANNEL_MODE_MONO: u32 = 3;

/// `(h >> 17) & 3` value for Layer III.
const LAYER_III: u32 = 1;

/// Outcome of [`verify_mp3`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    /// `true` when `issues` is empty.
    pub passed: bool,
    /// Human-readable problems, in the order they were found.
    pub issues: Vec<String>,
}

impl VerificationResult {
    fn from_issues(issues: Vec<String>) -> Self {
        Self { passed: issues.is_empty(), issues }
    }
}

/// Sample rate for an MPEG version id and a 2-bit rate index.
fn sample_rate(version: u32, index: u32) -> Option<u32> {
    let table: [u32; 3] = match version {
        3 => [44_100, 48_000, 32_000], // MPEG-1
        2 => [22_050, 24_000, 16_000], // MPEG-2
        0 => [11_025, 12_000, 8_000],  // MPEG-2.5
        _ => return None,
    };
    table.get(index as usize).copied()
}

fn channel_mode_name(mode: u32) -> &'static str {
    match mode {
        0 => "stereo",
        1 => "joint stereo",
        2 => "dual channel",
        _ => "mono",
    }
}

/// Byte offset of the first MPEG frame sync (11 set bits).
fn find_frame_sync(data: &[u8]) -> Option<usize> {
    data.windows(4).position(|w| w[0] == 0xFF && w[1] & 0xE0 == 0xE0)
}

/// Check `data` against the export contract.  Never fails; problems are
/// reported in [`VerificationResult::issues`].
pub fn verify_mp3(data: &[u8]) -> VerificationResult {
    let mut issues = Vec::new();

    if data.starts_with(b"ID3") {
        issues.push("ID3v2 tag present at start of file".to_string());
    }
    if data.len() >= ID3V1_LEN && data[data.len() - ID3V1_LEN..].starts_with(b"TAG") {
        issues.push("ID3v1 tag present at end of file".to_string());
    }

    let Some(pos) = find_frame_sync(data) else {
        issues.push("No valid MP3 frame sync found".to_string());
        return report(issues);
    };

    let header = u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]);
    let version = (header >> 19) & 0x3;
    let layer = (header >> 17) & 0x3;
    let rate_index = (header >> 10) & 0x3;
    let channel_mode = (header >> 6) & 0x3;

    if layer != LAYER_III {
        issues.push(format!("Not a Layer III frame (layer bits: {layer:#04b})"));
    }

    match sample_rate(version, rate_index) {
        Some(rate) if rate == TARGET_SAMPLE_RATE => {}
        Some(rate) => issues.push(format!("Sample rate is {rate}Hz, expected {TARGET_SAMPLE_RATE}Hz")),
        None => issues.push(format!(
            "Unable to determine sample rate (version: {version}, index: {rate_index})"
        )),
    }

    if channel_mode != CHANNEL_MODE_MONO {
        issues.push(format!("Channel mode is {}, expected mono", channel_mode_name(channel_mode)));
    }

    report(issues)
}

fn report(issues: Vec<String>) -> VerificationResult {
    let result = VerificationResult::from_issues(issues);
    if result.passed {
        info!("MP3 verification PASSED");
    } else {
        for issue in &result.issues {
            warn!("MP3 verification issue: {issue}");
        }
    }
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
