//! Whole-buffer sample-rate conversion and down-mixing.
//!
//! The narration track is built at the TTS rate (24 kHz) and only converted
//! once, right before MP3 encoding.  Conversion uses a rubato `FastFixedIn`
//! cubic resampler fed in fixed-size chunks.  The resampler's output delay is
//! dropped and the result trimmed to exactly `round(len * to / from)` frames,
//! so durations survive the conversion.

use rubato::{FastFixedIn, PolynomialDegree, Resampler};

use crate::{
    buffer::{to_i16, AudioBuffer},
    error::{Result, StitchError},
};

/// Input frames per rubato call.
const CHUNK_SIZE: usize = 1_024;

const I16_SCALE: f32 = 32_768.0;

/// Average interleaved channels into a mono buffer.
pub fn downmix_to_mono(audio: &AudioBuffer) -> AudioBuffer {
    if audio.channels() == 1 {
        return audio.clone();
    }
    let samples = audio
        .samples()
        .chunks_exact(audio.channels() as usize)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| i32::from(s)).sum();
            (sum / frame.len() as i32) as i16
        })
        .collect();
    AudioBuffer::new(samples, audio.sample_rate(), 1)
}

/// Convert a mono buffer to `target_rate`.  Same-rate input is returned as-is.
///
/// # Errors
/// [`StitchError::Resample`] if rubato cannot be initialised or fails.
pub fn resample(audio: &AudioBuffer, target_rate: u32) -> Result<AudioBuffer> {
    let audio = downmix_to_mono(audio);
    let source_rate = audio.sample_rate();
    if source_rate == target_rate {
        return Ok(audio);
    }

    let ratio = f64::from(target_rate) / f64::from(source_rate);
    let expected = (audio.frames() as f64 * ratio).round() as usize;
    if expected == 0 {
        return Ok(AudioBuffer::new(Vec::new(), target_rate, 1));
    }

    let mut resampler = FastFixedIn::<f32>::new(
        ratio,
        1.0, // fixed ratio, no dynamic adjustment
        PolynomialDegree::Cubic,
        CHUNK_SIZE,
        1, // mono
    )
    .map_err(|e| StitchError::Resample(format!("resampler init: {e}")))?;

    let delay = resampler.output_delay();
    let input: Vec<f32> = audio.samples().iter().map(|&s| f32::from(s) / I16_SCALE).collect();
    let mut output: Vec<f32> = Vec::with_capacity(expected + delay + 2 * CHUNK_SIZE);

    let mut chunks = input.chunks_exact(CHUNK_SIZE);
    for chunk in chunks.by_ref() {
        let block = resampler
            .process(&[chunk], None)
            .map_err(|e| StitchError::Resample(e.to_string()))?;
        output.extend_from_slice(&block[0]);
    }

    let rest: [&[f32]; 1] = [chunks.remainder()];
    if !rest[0].is_empty() {
        let block = resampler
            .process_partial(Some(&rest[..]), None)
            .map_err(|e| StitchError::Resample(e.to_string()))?;
        output.extend_from_slice(&block[0]);
    }

    // Flush the filter tail until the delayed output is complete.
    while output.len() < expected + delay {
        let block = resampler
            .process_partial::<&[f32]>(None, None)
            .map_err(|e| StitchError::Resample(e.to_string()))?;
        if block[0].is_empty() {
            break;
        }
        output.extend_from_slice(&block[0]);
    }

    let mut samples: Vec<i16> = output
        .iter()
        .skip(delay)
        .take(expected)
        .map(|&x| to_i16(f64::from(x * I16_SCALE).round()))
        .collect();
    samples.resize(expected, 0);

    tracing::debug!(
        from = source_rate,
        to = target_rate,
        frames_in = audio.frames(),
        frames_out = samples.len(),
        "resampled track"
    );
    Ok(AudioBuffer::new(samples, target_rate, 1))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::rms;

    fn sine(frames: usize, rate: u32, freq: f64, amp: f64) -> AudioBuffer {
        let samples = (0..frames)
            .map(|i| (amp * (2.0 * std::f64::consts::PI * freq * i as f64 / rate as f64).sin()) as i16)
            .collect();
        AudioBuffer::new(samples, rate, 1)
    }

    #[test]
    fn test_same_rate_passthrough() {
        let buf = sine(1_000, 44_100, 440.0, 8_000.0);
        assert_eq!(resample(&buf, 44_100).unwrap(), buf);
    }

    #[test]
    fn test_24k_to_44k1_length() {
        let buf = sine(24_000, 24_000, 440.0, 8_000.0);
        let out = resample(&buf, 44_100).unwrap();
        assert_eq!(out.sample_rate(), 44_100);
        assert_eq!(out.frames(), 44_100);
        assert_eq!(out.duration_ms(), 1_000);
    }

    #[test]
    fn test_odd_length_is_rounded() {
        let buf = sine(1_001, 24_000, 300.0, 4_000.0);
        let out = resample(&buf, 44_100).unwrap();
        assert_eq!(out.frames(), (1_001.0f64 * 44_100.0 / 24_000.0).round() as usize);
    }

    #[test]
    fn test_level_is_preserved() {
        let buf = sine(48_000, 24_000, 440.0, 10_000.0);
        let out = resample(&buf, 44_100).unwrap();
        let ratio = rms(out.samples()) / rms(buf.samples());
        assert!((ratio - 1.0).abs() < 0.05, "rms ratio {ratio}");
    }

    #[test]
    fn test_empty_buffer() {
        let buf = AudioBuffer::new(Vec::new(), 24_000, 1);
        let out = resample(&buf, 44_100).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.sample_rate(), 44_100);
    }

    #[test]
    fn test_downmix_averages_frames() {
        let stereo = AudioBuffer::new(vec![100, 300, -50, -150], 44_100, 2);
        let mono = downmix_to_mono(&stereo);
        assert_eq!(mono.channels(), 1);
        assert_eq!(mono.samples(), &[200, -100]);
    }
}
