//! Pothole Analyzer command-line support
//!
//! Logging setup, layered configuration and the video runner used by the
//! `pothole-analyzer` binary.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use frame_io::{FrameSink, ImageSequenceSink, ImageSequenceSource, SourceError, VideoFrame};
use pothole_core::{AnalyzerConfig, FrameAnalysisPipeline, VideoAnalysis, VideoFrameSampler};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "POTHOLE";

/// Initialize logging; level comes from `RUST_LOG`, default `info`
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();
}

/// Starting point for configuration layering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Preset {
    #[default]
    Default,
    /// Sparse sampling, no overlays
    Survey,
    /// Every frame analyzed
    Inspection,
}

impl Preset {
    pub fn config(self) -> AnalyzerConfig {
        match self {
            Preset::Default => AnalyzerConfig::default(),
            Preset::Survey => AnalyzerConfig::survey(),
            Preset::Inspection => AnalyzerConfig::inspection(),
        }
    }
}

/// Load configuration: preset, then optional file, then `POTHOLE__*` environment
pub fn load_config(preset: Preset, file: Option<&Path>) -> anyhow::Result<AnalyzerConfig> {
    load_config_with_env(preset, file, None)
}

fn load_config_with_env(
    preset: Preset,
    file: Option<&Path>,
    env: Option<HashMap<String, String>>,
) -> anyhow::Result<AnalyzerConfig> {
    let mut builder = config::Config::builder().add_source(
        config::Config::try_from(&preset.config()).context("serializing preset configuration")?,
    );
    if let Some(path) = file {
        info!("Loading configuration from {}", path.display());
        builder = builder.add_source(config::File::from(path).required(true));
    }
    builder = builder.add_source(
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .source(env),
    );

    let config = builder
        .build()
        .context("building configuration")?
        .try_deserialize::<AnalyzerConfig>()
        .context("invalid configuration")?;
    Ok(config)
}

/// Sink that drops frames when no output directory is requested
#[derive(Debug, Default)]
pub struct DiscardSink {
    pub frames: u64,
}

impl FrameSink for DiscardSink {
    fn write_frame(&mut self, _frame: &VideoFrame) -> Result<(), SourceError> {
        self.frames += 1;
        Ok(())
    }
}

/// Video run parameters
#[derive(Debug, Clone)]
pub struct VideoJob {
    pub input: PathBuf,
    pub fps: f64,
    pub stride: u32,
    pub output: Option<PathBuf>,
}

/// Run a video analysis on the blocking pool, logging progress as it arrives.
///
/// Setting `cancel` stops the run between frames; the partial result is returned.
pub async fn run_video(
    config: AnalyzerConfig,
    job: VideoJob,
    cancel: Arc<AtomicBool>,
) -> anyhow::Result<VideoAnalysis> {
    let pipeline = FrameAnalysisPipeline::new(&config).context("building analysis pipeline")?;
    let (tx, mut rx) = mpsc::channel::<u8>(64);

    let reporter = tokio::spawn(async move {
        let mut last = None;
        while let Some(percent) = rx.recv().await {
            if last != Some(percent) {
                info!("Progress: {}%", percent);
                last = Some(percent);
            }
        }
    });

    let worker = tokio::task::spawn_blocking(move || -> anyhow::Result<VideoAnalysis> {
        let mut source = ImageSequenceSource::new(&job.input, job.fps);
        let on_progress = |percent: u8| {
            // Receiver gone only when the runtime is shutting down
            let _ = tx.blocking_send(percent);
        };

        let mut sampler = VideoFrameSampler::new(&pipeline, job.stride)?
            .with_cancel_flag(cancel.as_ref());
        let analysis = match &job.output {
            Some(dir) => {
                let mut sink = ImageSequenceSink::create(dir)
                    .with_context(|| format!("creating output directory {}", dir.display()))?;
                sampler.run(&mut source, &mut sink, on_progress)?
            }
            None => sampler.run(&mut source, &mut DiscardSink::default(), on_progress)?,
        };
        Ok(analysis)
    });

    let result = worker.await.context("video worker panicked")?;
    if let Err(e) = reporter.await {
        warn!("Progress reporter stopped: {}", e);
    }
    result
}

/// Set `flag` on Ctrl-C
pub fn cancel_on_ctrl_c(flag: Arc<AtomicBool>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; stopping after the current frame");
            flag.store(true, Ordering::Relaxed);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pothole_core::{CalibrationConfig, RunStatus};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pothole-cli-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_frames(dir: &Path, count: usize) {
        for i in 0..count {
            let frame = VideoFrame::filled(64, 48, [150, 150, 150]);
            frame
                .to_rgb_image()
                .unwrap()
                .save(dir.join(format!("{:03}.png", i)))
                .unwrap();
        }
    }

    #[test]
    fn test_preset_without_overrides() {
        let config = load_config_with_env(Preset::Survey, None, Some(HashMap::new())).unwrap();
        assert_eq!(config.video.frame_stride, 15);
        assert!(!config.annotation.enabled);
    }

    #[test]
    fn test_file_then_env_override() {
        let dir = scratch_dir("config");
        let path = dir.join("analyzer.json");
        std::fs::write(
            &path,
            r#"{"video": {"frame_stride": 10}, "cost": {"base_cost": 80.0}}"#,
        )
        .unwrap();

        let env = HashMap::from([("POTHOLE__VIDEO__FRAME_STRIDE".to_string(), "3".to_string())]);
        let config = load_config_with_env(Preset::Default, Some(&path), Some(env)).unwrap();

        assert_eq!(config.video.frame_stride, 3);
        assert_eq!(config.cost.base_cost, 80.0);
        assert_eq!(config.cost.cost_per_cm2, 0.5);
        assert!(matches!(config.calibration, CalibrationConfig::FrameHeight { .. }));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let missing = Path::new("/nonexistent/analyzer.toml");
        assert!(load_config_with_env(Preset::Default, Some(missing), Some(HashMap::new())).is_err());
    }

    #[tokio::test]
    async fn test_run_video_writes_every_frame() {
        let input = scratch_dir("video-in");
        let output = scratch_dir("video-out");
        write_frames(&input, 4);

        let job = VideoJob {
            input: input.clone(),
            fps: 2.0,
            stride: 2,
            output: Some(output.clone()),
        };
        let analysis = run_video(AnalyzerConfig::default(), job, Arc::new(AtomicBool::new(false)))
            .await
            .unwrap();

        assert_eq!(analysis.metadata.frames_analyzed, 2);
        assert_eq!(analysis.status, RunStatus::Completed { faulted_frames: 0 });
        assert_eq!(std::fs::read_dir(&output).unwrap().count(), 4);

        std::fs::remove_dir_all(&input).ok();
        std::fs::remove_dir_all(&output).ok();
    }

    #[tokio::test]
    async fn test_cancel_flag_stops_run() {
        let input = scratch_dir("video-cancel");
        write_frames(&input, 3);

        let job = VideoJob {
            input: input.clone(),
            fps: 2.0,
            stride: 1,
            output: None,
        };
        let analysis = run_video(AnalyzerConfig::default(), job, Arc::new(AtomicBool::new(true)))
            .await
            .unwrap();

        assert_eq!(analysis.status, RunStatus::Cancelled { at_frame: 0 });
        std::fs::remove_dir_all(&input).ok();
    }
}
