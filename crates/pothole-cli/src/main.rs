//! Pothole Analyzer - Main Entry Point

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use frame_io::load_image;
use pothole_cli::{cancel_on_ctrl_c, init_logging, load_config, run_video, Preset, VideoJob};
use pothole_core::{FrameAnalysisPipeline, RunStatus};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "pothole-analyzer")]
#[command(about = "Measure and score road potholes in images and image sequences")]
#[command(version)]
struct Cli {
    /// Configuration file (toml, json or yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Built-in configuration the file and environment are layered on
    #[arg(long, global = true, value_enum, default_value_t = Preset::Default)]
    preset: Preset,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a single road image.
    Image {
        /// Path to the input image.
        path: PathBuf,

        /// Write the annotated image here.
        #[arg(long)]
        annotated_out: Option<PathBuf>,
    },

    /// Analyze a directory of frames as a video.
    Video {
        /// Directory of frame images, read in file-name order.
        dir: PathBuf,

        /// Frame rate of the sequence.
        #[arg(long)]
        fps: f64,

        /// Analyze every Nth frame (overrides configuration).
        #[arg(long)]
        stride: Option<u32>,

        /// Write every output frame here, annotated where a pothole was found.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Write the thumbnail frame here.
        #[arg(long)]
        thumbnail: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    info!("=== Pothole Analyzer v{} ===", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let config = load_config(cli.preset, cli.config.as_deref())?;

    match cli.command {
        Commands::Image { path, annotated_out } => {
            let frame = load_image(&path).with_context(|| format!("reading {}", path.display()))?;
            let pipeline = FrameAnalysisPipeline::new(&config)?;
            let analysis = pipeline
                .analyze_image(&frame)
                .with_context(|| format!("analyzing {}", path.display()))?;

            info!(
                "Pothole: {} cm2, ~{} cm deep, {} severity",
                analysis.measurement.area_cm2,
                analysis.measurement.depth_cm,
                analysis.severity.severity
            );

            if let Some(out) = annotated_out {
                match &analysis.annotated {
                    Some(annotated) => {
                        annotated
                            .frame
                            .to_rgb_image()?
                            .save(&out)
                            .with_context(|| format!("writing {}", out.display()))?;
                        info!("Annotated image written to {}", out.display());
                    }
                    None => warn!("Annotation disabled in configuration; nothing written"),
                }
            }

            println!("{}", serde_json::to_string_pretty(&analysis)?);
        }

        Commands::Video {
            dir,
            fps,
            stride,
            out,
            thumbnail,
        } => {
            let job = VideoJob {
                input: dir,
                fps,
                stride: stride.unwrap_or(config.video.frame_stride),
                output: out,
            };
            let cancel = Arc::new(AtomicBool::new(false));
            cancel_on_ctrl_c(cancel.clone());

            let analysis = run_video(config, job, cancel).await?;

            match analysis.status {
                RunStatus::Completed { faulted_frames } if faulted_frames > 0 => {
                    warn!("{} sampled frames could not be analyzed", faulted_frames)
                }
                RunStatus::Cancelled { at_frame } => warn!("Run cancelled at frame {}", at_frame),
                RunStatus::Completed { .. } => {}
            }

            if let (Some(path), Some(frame)) = (thumbnail, &analysis.thumbnail) {
                frame
                    .to_rgb_image()?
                    .save(&path)
                    .with_context(|| format!("writing {}", path.display()))?;
                info!("Thumbnail written to {}", path.display());
            }

            println!("{}", serde_json::to_string_pretty(&analysis)?);
        }
    }

    Ok(())
}
