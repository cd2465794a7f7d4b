//! JSON render manifests.
//!
//! A manifest names the PCM clips of one run, optionally the pause-context
//! segment for each clip, and any [`PauseConfig`] overrides:
//!
//! ```json
//! {
//!   "clips": ["batch_000.pcm", "batch_001.pcm"],
//!   "segments": [
//!     { "speaker": "Narrator", "text": "She opened the door..." },
//!     { "speaker": "Emma", "text": "Who's there?", "emotion": "nervous" }
//!   ],
//!   "config": { "crossfade_curve": "s_curve", "crossfade_ms": 60 }
//! }
//! ```
//!
//! Relative clip paths are resolved against the manifest's own directory.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    buffer::AudioBuffer,
    concat::Concatenator,
    config::PauseConfig,
    export::export_mp3_to_file,
    script::Segment,
    verify::{verify_mp3, VerificationResult},
};

/// One concatenation run described on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderManifest {
    /// Raw 16-bit LE mono PCM files at 24 kHz, in playback order.
    pub clips: Vec<PathBuf>,
    /// One pause-context segment per clip.
    #[serde(default)]
    pub segments: Option<Vec<Segment>>,
    #[serde(default)]
    pub config: PauseConfig,
}

/// Output of [`render`].
#[derive(Debug, Clone)]
pub struct Rendered {
    /// Concatenated track at the source rate, before MP3 encoding.
    pub track: AudioBuffer,
    /// Bytes written to the output file.
    pub mp3: Vec<u8>,
    /// `None` when verification was skipped.
    pub verification: Option<VerificationResult>,
}

impl RenderManifest {
    /// Parse a manifest from JSON text.  Clip paths are kept as written.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid render manifest")
    }

    /// Load a manifest file and resolve relative clip paths against its
    /// directory.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("cannot read manifest {}", path.display()))?;
        let mut manifest = Self::from_json(&json)
            .with_context(|| format!("in {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        for clip in &mut manifest.clips {
            if clip.is_relative() {
                *clip = base.join(&*clip);
            }
        }
        Ok(manifest)
    }

    /// Read every clip's raw bytes.
    pub fn read_clips(&self) -> Result<Vec<Vec<u8>>> {
        self.clips
            .iter()
            .map(|p| fs::read(p).with_context(|| format!("cannot read clip {}", p.display())))
            .collect()
    }
}

/// Concatenate the manifest's clips, export the track to `output_path`, and
/// optionally verify the written MP3.
pub fn render(manifest: &RenderManifest, output_path: &Path, verify: bool) -> Result<Rendered> {
    let clips = manifest.read_clips()?;
    info!("loaded {} clips", clips.len());

    let concatenator = Concatenator::new(manifest.config.clone());
    let track = concatenator
        .concatenate(&clips, manifest.segments.as_deref())
        .context("concatenation failed")?;

    let mp3 = export_mp3_to_file(&track, output_path)
        .with_context(|| format!("cannot export {}", output_path.display()))?;

    let verification = verify.then(|| verify_mp3(&mp3));
    Ok(Rendered { track, mp3, verification })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
