//! MP3 export with tag stripping.
//!
//! Output contract: MPEG-1 Layer III, mono, 44 100 Hz, and not a single
//! ID3v1 or ID3v2 byte.  The encoder is never given tag data, and the encoded
//! stream is scanned afterwards anyway so that a tag from any source is
//! removed before the bytes leave this module.

use std::{fs, path::Path};

use mp3lame_encoder::{Bitrate, Builder, FlushNoGap, MonoPcm, Quality};
use tracing::{debug, info};

use crate::{
    buffer::AudioBuffer,
    config::{TARGET_CHANNELS, TARGET_SAMPLE_RATE},
    error::{Result, StitchError},
    resample::resample,
};

/// Size of an ID3v2 header (`"ID3"`, version, flags, syncsafe size).
const ID3V2_HEADER_LEN: usize = 10;

/// Size of an ID3v1 trailer.
const ID3V1_LEN: usize = 128;

// ─────────────────────────────────────────────────────────────────────────────
// Encoding
// ─────────────────────────────────────────────────────────────────────────────

/// Encode `audio` as a tag-free 44.1 kHz mono MP3 byte stream.
///
/// The buffer is down-mixed and resampled first if its format differs.
///
/// # Errors
/// [`StitchError::Resample`] or [`StitchError::Encode`].
pub fn export_mp3(audio: &AudioBuffer) -> Result<Vec<u8>> {
    let audio = if audio.sample_rate() != TARGET_SAMPLE_RATE || audio.channels() != TARGET_CHANNELS {
        resample(audio, TARGET_SAMPLE_RATE)?
    } else {
        audio.clone()
    };

    let encoded = encode_mono(audio.samples(), TARGET_SAMPLE_RATE)?;
    Ok(strip_id3_tags(&encoded).to_vec())
}

/// [`export_mp3`], then write the bytes to `output_path` (creating parent
/// directories).  Returns the written bytes.
pub fn export_mp3_to_file(audio: &AudioBuffer, output_path: &Path) -> Result<Vec<u8>> {
    let mp3 = export_mp3(audio)?;
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(output_path, &mp3)?;

    info!("exported audio to {}", output_path.display());
    info!("total duration: {}ms, file size: {} bytes", audio.duration_ms(), mp3.len());
    Ok(mp3)
}

fn encode_error(stage: &str, e: impl std::fmt::Debug) -> StitchError {
    StitchError::Encode(format!("{stage}: {e:?}"))
}

/// Run LAME over mono 16-bit samples.  No ID3 tag is configured.
fn encode_mono(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>> {
    let mut builder = Builder::new().ok_or_else(|| StitchError::Encode("cannot allocate LAME encoder".into()))?;
    builder.set_num_channels(1).map_err(|e| encode_error("channels", e))?;
    builder.set_sample_rate(sample_rate).map_err(|e| encode_error("sample rate", e))?;
    builder.set_brate(Bitrate::Kbps128).map_err(|e| encode_error("bitrate", e))?;
    builder.set_quality(Quality::Best).map_err(|e| encode_error("quality", e))?;
    let mut encoder = builder.build().map_err(|e| encode_error("init", e))?;

    let mut out: Vec<u8> = Vec::new();
    out.reserve(mp3lame_encoder::max_required_buffer_size(samples.len()));

    let written = encoder
        .encode(MonoPcm(samples), out.spare_capacity_mut())
        .map_err(|e| encode_error("encode", e))?;
    // SAFETY: LAME initialised exactly `written` bytes of the spare capacity.
    unsafe { out.set_len(out.len() + written) };

    out.reserve(7_200);
    let written = encoder
        .flush::<FlushNoGap>(out.spare_capacity_mut())
        .map_err(|e| encode_error("flush", e))?;
    // SAFETY: as above, for the flushed tail.
    unsafe { out.set_len(out.len() + written) };

    debug!(samples = samples.len(), bytes = out.len(), "encoded MP3");
    Ok(out)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tag stripping
// ─────────────────────────────────────────────────────────────────────────────

/// Decode the 28-bit syncsafe size stored in an ID3v2 header (bytes 6–9).
fn syncsafe_size(header: &[u8]) -> usize {
    header[6..10]
        .iter()
        .fold(0usize, |acc, &b| (acc << 7) | usize::from(b & 0x7F))
}

/// Remove every leading ID3v2 block and a trailing ID3v1 block.
pub fn strip_id3_tags(data: &[u8]) -> &[u8] {
    let mut data = data;

    while data.starts_with(b"ID3") && data.len() >= ID3V2_HEADER_LEN {
        let total = ID3V2_HEADER_LEN + syncsafe_size(data);
        debug!("stripping ID3v2 tag: {total} bytes");
        data = data.get(total..).unwrap_or(&[]);
    }

    if data.len() >= ID3V1_LEN && data[data.len() - ID3V1_LEN..].starts_with(b"TAG") {
        debug!("stripping ID3v1 tag: {ID3V1_LEN} bytes");
        data = &data[..data.len() - ID3V1_LEN];
    }
    data
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn id3v2(payload_len: usize) -> Vec<u8> {
        let s = payload_len;
        let mut tag = vec![
            b'I', b'D', b'3', 4, 0, 0,
            ((s >> 21) & 0x7F) as u8,
            ((s >> 14) & 0x7F) as u8,
            ((s >> 7) & 0x7F) as u8,
            (s & 0x7F) as u8,
        ];
        tag.extend(vec![0xAA; payload_len]);
        tag
    }

    fn id3v1() -> Vec<u8> {
        let mut tag = b"TAG".to_vec();
        tag.extend([b' '; 125]);
        tag
    }

    const FRAME: [u8; 4] = [0xFF, 0xFB, 0x90, 0xC4];

    #[test]
    fn test_syncsafe_decoding() {
        let header = [b'I', b'D', b'3', 4, 0, 0, 0x00, 0x00, 0x02, 0x01];
        assert_eq!(syncsafe_size(&header), 257);
        // high bit of every byte ignored
        let header = [b'I', b'D', b'3', 4, 0, 0, 0x80, 0x80, 0x82, 0x81];
        assert_eq!(syncsafe_size(&header), 257);
        let header = [b'I', b'D', b'3', 4, 0, 0, 0x7F, 0x7F, 0x7F, 0x7F];
        assert_eq!(syncsafe_size(&header), (1 << 28) - 1);
    }

    #[test]
    fn test_strip_leading_v2() {
        let mut data = id3v2(300);
        data.extend(FRAME);
        assert_eq!(strip_id3_tags(&data), &FRAME);
    }

    #[test]
    fn test_strip_multiple_v2_blocks() {
        let mut data = id3v2(20);
        data.extend(id3v2(1_000));
        data.extend(id3v2(0));
        data.extend(FRAME);
        assert_eq!(strip_id3_tags(&data), &FRAME);
    }

    #[test]
    fn test_strip_trailing_v1() {
        let mut data = FRAME.to_vec();
        data.extend(vec![0u8; 200]);
        let body_len = data.len();
        data.extend(id3v1());
        let stripped = strip_id3_tags(&data);
        assert_eq!(stripped.len(), body_len);
        assert!(stripped.starts_with(&FRAME));
    }

    #[test]
    fn test_strip_both() {
        let mut data = id3v2(64);
        data.extend(FRAME);
        data.extend(vec![0u8; 500]);
        data.extend(id3v1());
        let stripped = strip_id3_tags(&data);
        assert_eq!(stripped.len(), 504);
        assert!(stripped.starts_with(&FRAME));
    }

    #[test]
    fn test_untagged_is_untouched() {
        let mut data = FRAME.to_vec();
        data.extend(vec![0x11; 400]);
        assert_eq!(strip_id3_tags(&data), data.as_slice());
    }

    #[test]
    fn test_oversized_v2_size_strips_everything() {
        let mut data = id3v2(10);
        data[6] = 0x7F; // claims ~256 MiB
        assert!(strip_id3_tags(&data).is_empty());
    }

    #[test]
    fn test_short_id3_prefix_left_alone() {
        let data = b"ID3\x04".to_vec();
        assert_eq!(strip_id3_tags(&data), data.as_slice());
    }

    #[test]
    fn test_export_produces_tag_free_stream() {
        let audio = AudioBuffer::new(
            (0..24_000).map(|i| ((i as f64 * 0.05).sin() * 6_000.0) as i16).collect(),
            24_000,
            1,
        );
        let mp3 = export_mp3(&audio).unwrap();
        assert!(mp3.len() > 1_000);
        assert!(!mp3.starts_with(b"ID3"));
        assert!(!mp3[mp3.len() - ID3V1_LEN..].starts_with(b"TAG"));
    }
}
