//! Crossfade mixer with selectable fade curves.
//!
//! The tail of the first buffer and the head of the second are overlapped;
//! each overlapping frame is `fade_out(t)·a + fade_in(t)·b` with `t` running
//! from 0 to 1 across the overlap.  Every curve keeps
//! `fade_out(t) + fade_in(t) == 1`.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    buffer::{to_i16, AudioBuffer},
    config::MIN_CROSSFADE_MS,
};

/// Amplitude envelope family for crossfades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FadeCurve {
    Linear,
    /// Slow decay; natural for trailing speech.
    #[default]
    Logarithmic,
    /// Fast attack.
    Exponential,
    /// Smoothstep: slow at both ends.
    SCurve,
}

impl FadeCurve {
    /// `(fade_out, fade_in)` gains at normalised time `t ∈ [0, 1]`.
    pub fn gains(self, t: f64) -> (f64, f64) {
        let fade_in = match self {
            Self::Linear => t,
            Self::Logarithmic => (t * (std::f64::consts::E - 1.0)).ln_1p(),
            Self::Exponential => t * t,
            Self::SCurve => t * t * (3.0 - 2.0 * t),
        }
        .clamp(0.0, 1.0);
        (1.0 - fade_in, fade_in)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Logarithmic => "logarithmic",
            Self::Exponential => "exponential",
            Self::SCurve => "s_curve",
        }
    }
}

impl fmt::Display for FadeCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FadeCurve {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(Self::Linear),
            "logarithmic" => Ok(Self::Logarithmic),
            "exponential" => Ok(Self::Exponential),
            "s_curve" => Ok(Self::SCurve),
            other => Err(format!(
                "unknown fade curve '{other}' (expected linear, logarithmic, exponential or s_curve)"
            )),
        }
    }
}

/// Overlap actually used when crossfading `a` into `b` for `requested_ms`:
/// `min(len(a), len(b), requested_ms)`, or 0 if that is under 10 ms.
pub fn effective_overlap_ms(a: &AudioBuffer, b: &AudioBuffer, requested_ms: u32) -> u32 {
    let overlap = a.duration_ms().min(b.duration_ms()).min(requested_ms);
    if overlap < MIN_CROSSFADE_MS {
        0
    } else {
        overlap
    }
}

/// Join `a` and `b`, blending `a`'s tail into `b`'s head.
///
/// Output length is `len(a) + len(b) - overlap` frames.  Too-short overlaps
/// degrade to a plain append.  Mixed samples are rounded and saturate at the
/// 16-bit range rather than wrapping.
pub fn apply_crossfade(a: &AudioBuffer, b: &AudioBuffer, requested_ms: u32, curve: FadeCurve) -> AudioBuffer {
    debug_assert!(a.same_format(b), "crossfading buffers of different formats");

    let overlap_ms = effective_overlap_ms(a, b, requested_ms);
    if overlap_ms == 0 {
        return a.append(b);
    }
    if overlap_ms < requested_ms {
        tracing::debug!("reducing crossfade from {requested_ms}ms to {overlap_ms}ms (segment too short)");
    }

    let n = a.frames_for_ms(overlap_ms).min(a.frames()).min(b.frames());
    let ch = a.channels() as usize;
    let a_keep = a.frames() - n;

    let tail = &a.samples()[a_keep * ch..];
    let head = &b.samples()[..n * ch];

    let mut samples = Vec::with_capacity(a.samples().len() + b.samples().len() - n * ch);
    samples.extend_from_slice(&a.samples()[..a_keep * ch]);

    for (i, (fa, fb)) in tail.chunks_exact(ch).zip(head.chunks_exact(ch)).enumerate() {
        // numpy-style linspace(0, 1, n)
        let t = if n > 1 { i as f64 / (n - 1) as f64 } else { 0.0 };
        let (g_out, g_in) = curve.gains(t);
        samples.extend(
            fa.iter()
                .zip(fb)
                .map(|(&sa, &sb)| to_i16((g_out * f64::from(sa) + g_in * f64::from(sb)).round())),
        );
    }

    samples.extend_from_slice(&b.samples()[n * ch..]);
    AudioBuffer::new(samples, a.sample_rate(), a.channels())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const ALL: [FadeCurve; 4] =
        [FadeCurve::Linear, FadeCurve::Logarithmic, FadeCurve::Exponential, FadeCurve::SCurve];

    fn constant(ms: u32, value: i16) -> AudioBuffer {
        let frames = (24 * ms) as usize;
        AudioBuffer::new(vec![value; frames], 24_000, 1)
    }

    #[test]
    fn test_curves_are_complementary() {
        for curve in ALL {
            for i in 0..=20 {
                let t = i as f64 / 20.0;
                let (out, inn) = curve.gains(t);
                assert_relative_eq!(out + inn, 1.0, epsilon = 1e-12);
                assert!((0.0..=1.0).contains(&inn), "{curve}: {inn} at t={t}");
            }
            let (o0, i0) = curve.gains(0.0);
            let (o1, i1) = curve.gains(1.0);
            assert_relative_eq!(o0, 1.0, epsilon = 1e-12);
            assert_relative_eq!(i0, 0.0, epsilon = 1e-12);
            assert_relative_eq!(o1, 0.0, epsilon = 1e-12);
            assert_relative_eq!(i1, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_curve_shapes() {
        let (_, lin) = FadeCurve::Linear.gains(0.5);
        let (_, log) = FadeCurve::Logarithmic.gains(0.5);
        let (_, exp) = FadeCurve::Exponential.gains(0.5);
        let (_, s) = FadeCurve::SCurve.gains(0.5);
        assert!(log > lin, "log fade-in rises early");
        assert!(exp < lin, "exponential fade-in rises late");
        assert_relative_eq!(s, 0.5);
        assert_relative_eq!(exp, 0.25);
    }

    #[test]
    fn test_length_bound() {
        for curve in ALL {
            for (la, lb, ms) in [(200, 300, 75), (50, 300, 75), (300, 40, 75), (100, 100, 0), (5, 300, 75), (300, 9, 75)] {
                let a = constant(la, 1000);
                let b = constant(lb, -1000);
                let overlap = effective_overlap_ms(&a, &b, ms);
                let expected_overlap = if la.min(lb).min(ms) >= 10 { la.min(lb).min(ms) } else { 0 };
                assert_eq!(overlap, expected_overlap);
                let out = apply_crossfade(&a, &b, ms, curve);
                assert_eq!(
                    out.frames(),
                    a.frames() + b.frames() - a.frames_for_ms(expected_overlap),
                    "{curve} {la}/{lb}/{ms}"
                );
            }
        }
    }

    #[test]
    fn test_short_overlap_is_plain_append() {
        let a = constant(9, 100);
        let b = constant(500, 200);
        let out = apply_crossfade(&a, &b, 75, FadeCurve::SCurve);
        assert_eq!(out, a.append(&b));
    }

    #[test]
    fn test_mixed_region_moves_from_a_to_b() {
        let a = constant(100, 10_000);
        let b = constant(100, -10_000);
        for curve in ALL {
            let out = apply_crossfade(&a, &b, 50, curve);
            let start = a.frames() - a.frames_for_ms(50);
            let end = a.frames() - 1;
            assert_eq!(out.samples()[start], 10_000, "{curve}");
            assert_eq!(out.samples()[end], -10_000, "{curve}");
            assert_eq!(out.samples()[0], 10_000);
            assert_eq!(*out.samples().last().unwrap(), -10_000);
        }
    }

    #[test]
    fn test_mix_saturates_instead_of_wrapping() {
        let a = constant(50, i16::MAX);
        let b = constant(50, i16::MAX);
        let out = apply_crossfade(&a, &b, 50, FadeCurve::Linear);
        assert!(out.samples().iter().all(|&s| s > 30_000));
    }

    #[test]
    fn test_parse_names() {
        for curve in ALL {
            assert_eq!(curve.name().parse::<FadeCurve>().unwrap(), curve);
        }
        assert!("cosine".parse::<FadeCurve>().is_err());
    }
}
