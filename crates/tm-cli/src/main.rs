//! trackmerge - Mix compressed audio tracks from the command line
//!
//! Usage:
//!   trackmerge probe a.mp3 b.mp3                 - Show duration and stream facts
//!   trackmerge mix a.mp3 b.mp3 -g 80 -g 50 -o out.mp3
//!                                                - Mix with per-track gain

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tm_codec::{estimate_duration, EstimatedDuration, StreamSummary};
use tm_engine::{EngineConfig, MergeEngine, TrackSource};

#[derive(Parser)]
#[command(name = "trackmerge", version, about = "Mix MPEG audio tracks with per-track gain")]
struct Cli {
    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show estimated duration and stream facts per file
    Probe {
        files: Vec<PathBuf>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Mix files into one MP3
    Mix {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Gain per file in percent (0-100), in file order; defaults to 100 for all
        #[arg(short, long = "gain")]
        gains: Vec<u8>,

        /// Output file
        #[arg(short, long, default_value = "mix.mp3")]
        output: PathBuf,

        /// Engine configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output bitrate in kbps, overrides the config
        #[arg(short, long)]
        bitrate: Option<u32>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    match cli.command {
        Commands::Probe { files, json } => probe(&files, json),
        Commands::Mix {
            files,
            gains,
            output,
            config,
            bitrate,
        } => mix(&files, gains, &output, config.as_deref(), bitrate),
    }
}

#[derive(Serialize)]
struct ProbeReport {
    file: String,
    bytes: usize,
    estimated_duration: EstimatedDuration,
    summary: Option<StreamSummary>,
}

fn probe(files: &[PathBuf], json: bool) -> Result<()> {
    if files.is_empty() {
        bail!("No files given");
    }

    let mut reports = Vec::with_capacity(files.len());
    for path in files {
        let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        reports.push(ProbeReport {
            file: path.display().to_string(),
            bytes: bytes.len(),
            estimated_duration: estimate_duration(&bytes, bytes.len() as u64),
            summary: StreamSummary::scan(&bytes),
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for report in &reports {
        println!("{}", report.file);
        println!("  estimated duration: {}", report.estimated_duration);
        match &report.summary {
            Some(s) => {
                println!(
                    "  {} frames, {} Hz, {} ch, {}",
                    s.frame_count,
                    s.sample_rate,
                    s.channels,
                    if s.is_constant_bitrate() {
                        format!("{} kbps CBR", s.min_bitrate_kbps)
                    } else {
                        format!(
                            "{}-{} kbps VBR (avg {:.0})",
                            s.min_bitrate_kbps,
                            s.max_bitrate_kbps,
                            s.average_bitrate_kbps()
                        )
                    }
                );
                println!("  exact duration: {:.3}s", s.duration());
            }
            None => println!("  no MPEG audio frames found"),
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            Ok(EngineConfig::from_json_str(&json)?)
        }
        None => Ok(EngineConfig::export()),
    }
}

fn mix(
    files: &[PathBuf],
    gains: Vec<u8>,
    output: &Path,
    config: Option<&Path>,
    bitrate: Option<u32>,
) -> Result<()> {
    let mut config = load_config(config)?;
    if let Some(kbps) = bitrate {
        config.encoder = config.encoder.with_bitrate(kbps);
    }

    let gains = if gains.is_empty() {
        vec![100; files.len()]
    } else {
        gains
    };

    let mut sources = Vec::with_capacity(files.len());
    for path in files {
        let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        sources.push(TrackSource::new(name, bytes));
    }

    let engine = MergeEngine::new(config);
    let outcome = engine.ingest(sources).context("Ingest failed")?;
    for (track, gain) in outcome.tracks.iter().zip(&gains) {
        println!("{:>4}%  {}  {}", gain, track.duration, track.display_name);
    }

    let combined = engine.combine(&gains).context("Mix failed")?;
    fs::write(output, &combined.bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "Wrote {} ({} bytes, {:.2}s, {} Hz, {} ch)",
        output.display(),
        combined.len(),
        combined.duration(),
        combined.sample_rate,
        combined.channels
    );
    Ok(())
}
