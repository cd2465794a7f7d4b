//! `stitchcast`: render narration manifests to MP3 and check MP3 output.
//!
//! ```text
//! stitchcast render story/manifest.json -o story.mp3 --wav story.wav
//! stitchcast verify story.mp3
//! ```
//!
//! Log level follows `RUST_LOG`; `-v` raises the default from `info` to `debug`.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use stitchcast::manifest::{render, RenderManifest};
use stitchcast::verify_mp3;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Concatenate the clips of a JSON manifest into one MP3
    Render {
        /// Render manifest (clips, optional segments, optional config)
        manifest: PathBuf,

        /// Output MP3 path
        #[arg(short, long)]
        output: PathBuf,

        /// Skip the post-export format check
        #[arg(long)]
        no_verify: bool,

        /// Also write the pre-encoding track as a 16-bit WAV
        #[arg(long, value_name = "PATH")]
        wav: Option<PathBuf>,
    },
    /// Check an MP3 for tags, sample rate and channel mode
    Verify {
        file: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Render { manifest, output, no_verify, wav } => {
            let loaded = RenderManifest::load(&manifest)?;
            let rendered = render(&loaded, &output, !no_verify)?;

            if let Some(wav) = wav {
                rendered
                    .track
                    .write_wav(&wav)
                    .with_context(|| format!("cannot write {}", wav.display()))?;
                info!("wrote debug track to {}", wav.display());
            }

            match rendered.verification {
                Some(v) if !v.passed => {
                    warn!("{} failed verification", output.display());
                    Ok(ExitCode::FAILURE)
                }
                _ => Ok(ExitCode::SUCCESS),
            }
        }
        Command::Verify { file } => {
            let data = std::fs::read(&file).with_context(|| format!("cannot read {}", file.display()))?;
            let result = verify_mp3(&data);
            for issue in &result.issues {
                println!("  - {issue}");
            }
            println!("{}: {}", file.display(), if result.passed { "PASSED" } else { "FAILED" });
            Ok(if result.passed { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
    }
}
