//! Context-aware pause calculation between consecutive clips.
//!
//! A pause is a base duration chosen by the speaker transition plus a bonus
//! read from the punctuation that ends the previous line.

use crate::{config::PauseConfig, script::Segment};

/// Speaker transition class between two consecutive segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    NarratorToNarrator,
    NarratorToCharacter,
    CharacterToNarrator,
    /// The same character keeps talking.
    SameCharacter,
    /// A different character answers.
    CharacterToCharacter,
}

impl Transition {
    pub fn classify(prev: &Segment, next: &Segment) -> Self {
        match (prev.is_narrator(), next.is_narrator()) {
            (true, true) => Self::NarratorToNarrator,
            (true, false) => Self::NarratorToCharacter,
            (false, true) => Self::CharacterToNarrator,
            (false, false) if prev.speaker == next.speaker => Self::SameCharacter,
            (false, false) => Self::CharacterToCharacter,
        }
    }

    /// Base pause for this transition.
    pub fn base_ms(self, config: &PauseConfig) -> u32 {
        match self {
            Self::NarratorToNarrator => config.narrator_to_narrator_ms,
            Self::NarratorToCharacter => config.narrator_to_character_ms,
            Self::CharacterToNarrator => config.character_to_narrator_ms,
            Self::SameCharacter => config.character_to_character_ms,
            // a longer beat to mark the new voice
            Self::CharacterToCharacter => (f64::from(config.character_to_character_ms) * 1.25) as u32,
        }
    }
}

/// Extra pause implied by how `text` ends.
///
/// | Ending            | Bonus  |
/// |-------------------|--------|
/// | `...` / `…`       | 750 ms |
/// | `—` / `--`        | 200 ms |
/// | `?`               | 300 ms |
/// | `!`               | 200 ms |
pub fn punctuation_bonus_ms(text: &str) -> u32 {
    let t = text.trim_end();
    if t.ends_with("...") || t.ends_with('…') {
        750
    } else if t.ends_with('—') || t.ends_with("--") {
        200
    } else if t.ends_with('?') {
        300
    } else if t.ends_with('!') {
        200
    } else {
        0
    }
}

/// Pause between `prev` and `next`.  At a file boundary (either side absent)
/// the narrator-to-narrator pause is used.
pub fn calculate_pause(prev: Option<&Segment>, next: Option<&Segment>, config: &PauseConfig) -> u32 {
    let (Some(prev), Some(next)) = (prev, next) else {
        return config.narrator_to_narrator_ms;
    };

    let transition = Transition::classify(prev, next);
    let base = transition.base_ms(config);
    let bonus = punctuation_bonus_ms(&prev.text);

    tracing::debug!(
        "pause {}->{} ({:?}) = {}ms + {}ms",
        prev.speaker,
        next.speaker,
        transition,
        base,
        bonus
    );
    base + bonus
}

// ─────────────────────────────────────────────────────────────────────────────
// PausePlan
// ─────────────────────────────────────────────────────────────────────────────

/// How junction pauses are chosen for a whole run, decided once up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PausePlan<'a> {
    /// One metadata segment per clip.
    ContextAware(&'a [Segment]),
    /// Metadata missing or misaligned: same pause at every junction.
    FlatFallback(u32),
}

impl<'a> PausePlan<'a> {
    /// Pick context-aware pausing only when `metadata` lines up with the clips.
    pub fn resolve(metadata: Option<&'a [Segment]>, clip_count: usize, config: &PauseConfig) -> Self {
        match metadata {
            Some(segments) if segments.len() == clip_count => Self::ContextAware(segments),
            _ => Self::FlatFallback(config.flat_pause_ms),
        }
    }

    /// Pause inserted before clip `index` (`index >= 1`).
    pub fn pause_before(&self, index: usize, config: &PauseConfig) -> u32 {
        match *self {
            Self::ContextAware(segments) => calculate_pause(
                index.checked_sub(1).and_then(|i| segments.get(i)),
                segments.get(index),
                config,
            ),
            Self::FlatFallback(ms) => ms,
        }
    }

    pub fn is_context_aware(&self) -> bool {
        matches!(self, Self::ContextAware(_))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NARRATOR;

    fn seg(speaker: &str, text: &str) -> Segment {
        Segment::new(speaker, text)
    }

    #[test]
    fn test_boundary_uses_narrator_pause() {
        let cfg = PauseConfig::default();
        let s = seg("Emma", "Hi?");
        assert_eq!(calculate_pause(None, Some(&s), &cfg), 750);
        assert_eq!(calculate_pause(Some(&s), None, &cfg), 750);
        assert_eq!(calculate_pause(None, None, &cfg), 750);
    }

    #[test]
    fn test_transition_bases() {
        let cfg = PauseConfig::default();
        let n = seg(NARRATOR, "Plain.");
        let emma = seg("Emma", "Plain.");
        let leo = seg("Leo", "Plain.");
        assert_eq!(calculate_pause(Some(&n), Some(&n), &cfg), 750);
        assert_eq!(calculate_pause(Some(&n), Some(&emma), &cfg), 500);
        assert_eq!(calculate_pause(Some(&emma), Some(&n), &cfg), 500);
        assert_eq!(calculate_pause(Some(&emma), Some(&emma), &cfg), 400);
        assert_eq!(calculate_pause(Some(&emma), Some(&leo), &cfg), 500);
    }

    #[test]
    fn test_new_voice_multiplier_truncates() {
        let cfg = PauseConfig { character_to_character_ms: 333, ..PauseConfig::default() };
        assert_eq!(Transition::CharacterToCharacter.base_ms(&cfg), 416);
    }

    #[test]
    fn test_punctuation_bonus() {
        assert_eq!(punctuation_bonus_ms("Wow..."), 750);
        assert_eq!(punctuation_bonus_ms("Wow…  "), 750);
        assert_eq!(punctuation_bonus_ms("Wait—"), 200);
        assert_eq!(punctuation_bonus_ms("Wait--\n"), 200);
        assert_eq!(punctuation_bonus_ms("Really?"), 300);
        assert_eq!(punctuation_bonus_ms("Hi!"), 200);
        assert_eq!(punctuation_bonus_ms("The end."), 0);
        assert_eq!(punctuation_bonus_ms(""), 0);
    }

    #[test]
    fn test_ellipsis_never_shortens_pause() {
        let cfg = PauseConfig::default();
        let speakers = [NARRATOR, "Emma", "Leo"];
        for a in speakers {
            for b in speakers {
                let next = seg(b, "x");
                let plain = calculate_pause(Some(&seg(a, "Then.")), Some(&next), &cfg);
                let trailing = calculate_pause(Some(&seg(a, "Then...")), Some(&next), &cfg);
                assert!(trailing >= plain);
                assert_eq!(trailing - plain, 750);
            }
        }
    }

    #[test]
    fn test_character_to_narrator_with_ellipsis() {
        let cfg = PauseConfig::default();
        let pause = calculate_pause(Some(&seg("Emma", "Wow...")), Some(&seg(NARRATOR, "The end.")), &cfg);
        assert_eq!(pause, cfg.character_to_narrator_ms + 750);
    }

    #[test]
    fn test_plan_resolution() {
        let cfg = PauseConfig::default();
        let meta = vec![seg(NARRATOR, "Hi!"), seg("Emma", "Wow...")];

        let plan = PausePlan::resolve(Some(meta.as_slice()), 2, &cfg);
        assert!(plan.is_context_aware());
        assert_eq!(plan.pause_before(1, &cfg), 700);

        let plan = PausePlan::resolve(Some(meta.as_slice()), 3, &cfg);
        assert_eq!(plan, PausePlan::FlatFallback(500));
        assert_eq!(plan.pause_before(2, &cfg), 500);

        assert_eq!(PausePlan::resolve(None, 2, &cfg), PausePlan::FlatFallback(500));
    }
}
