//! Script segments and their batching into TTS calls.
//!
//! The TTS service accepts at most two distinct speakers per call.  Segments
//! are grouped so that each character line is synthesised together with the
//! narration leading up to it, and each batch produces exactly one clip.

use serde::{Deserialize, Serialize};

use crate::config::NARRATOR;

/// A single speaker utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub speaker: String,
    pub text: String,
    /// Free-text delivery hint (e.g. `"warm"`); empty when absent.
    #[serde(default)]
    pub emotion: String,
}

impl Segment {
    pub fn new(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self { speaker: speaker.into(), text: text.into(), emotion: String::new() }
    }

    pub fn with_emotion(mut self, emotion: impl Into<String>) -> Self {
        self.emotion = emotion.into();
        self
    }

    pub fn is_narrator(&self) -> bool {
        self.speaker == NARRATOR
    }
}

/// Segments submitted together in one TTS call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentBatch {
    pub segments: Vec<Segment>,
    /// Distinct speakers in this batch, in first-appearance order (≤ 2).
    pub speakers: Vec<String>,
}

impl SegmentBatch {
    /// The segment that decides the pause after this batch's clip: its last.
    pub fn pause_context(&self) -> Option<&Segment> {
        self.segments.last()
    }
}

/// Group `segments` into two-speaker batches.
///
/// - Narrator lines accumulate until a character line arrives.
/// - A character line closes a batch together with the pending narration,
///   or forms a single-speaker batch if nothing is pending.
/// - Narration left over at the end becomes a narrator-only batch.
pub fn batch_segments(segments: &[Segment]) -> Vec<SegmentBatch> {
    let mut batches = Vec::new();
    let mut pending: Vec<Segment> = Vec::new();

    for segment in segments {
        if segment.is_narrator() {
            pending.push(segment.clone());
            continue;
        }
        let batch = if pending.is_empty() {
            SegmentBatch {
                segments: vec![segment.clone()],
                speakers: vec![segment.speaker.clone()],
            }
        } else {
            let mut segs = std::mem::take(&mut pending);
            segs.push(segment.clone());
            SegmentBatch {
                segments: segs,
                speakers: vec![NARRATOR.to_string(), segment.speaker.clone()],
            }
        };
        batches.push(batch);
    }

    if !pending.is_empty() {
        batches.push(SegmentBatch { segments: pending, speakers: vec![NARRATOR.to_string()] });
    }
    batches
}

/// One pause-context segment per batch, aligned with the batches' clips.
pub fn pause_contexts(batches: &[SegmentBatch]) -> Vec<Segment> {
    batches.iter().filter_map(SegmentBatch::pause_context).cloned().collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
