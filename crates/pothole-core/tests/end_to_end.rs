//! Image-sequence runs through the full pipeline

use std::path::PathBuf;

use frame_io::{load_image, ImageSequenceSink, ImageSequenceSource};
use image::{Rgb, RgbImage};
use pothole_core::{
    analyze_video, AnalyzerConfig, FrameAnalysisPipeline, RunStatus, Severity, VideoError,
};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("pothole-e2e-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn road_image(with_pothole: bool) -> RgbImage {
    RgbImage::from_fn(160, 120, |x, y| {
        let dx = (x as f32 - 80.0) / 35.0;
        let dy = (y as f32 - 60.0) / 22.0;
        if with_pothole && dx * dx + dy * dy <= 1.0 {
            Rgb([40, 40, 40])
        } else {
            Rgb([185, 185, 185])
        }
    })
}

#[test]
fn still_image_produces_full_record() {
    let dir = scratch_dir("still");
    let path = dir.join("road.png");
    road_image(true).save(&path).unwrap();

    let frame = load_image(&path).unwrap();
    let pipeline = FrameAnalysisPipeline::new(&AnalyzerConfig::default()).unwrap();
    let analysis = pipeline.analyze_image(&frame).unwrap();

    // 120 px height -> 1.2 px/cm; ellipse spans ~71 px horizontally
    assert!((analysis.measurement.width_cm - 59.17).abs() < 2.0);
    assert!(analysis.measurement.depth_cm > 5.0);
    assert!((2..=5).contains(&analysis.impact.repair_priority));

    let json = serde_json::to_value(&analysis).unwrap();
    assert!(json["measurement"]["area_cm2"].as_f64().unwrap() > 0.0);
    assert!(json.get("annotated").is_none());

    let annotated = analysis.annotated.unwrap();
    annotated
        .frame
        .to_rgb_image()
        .unwrap()
        .save(dir.join("annotated.png"))
        .unwrap();
    assert!(dir.join("annotated.png").exists());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn image_sequence_round_trip() {
    let input = scratch_dir("seq-in");
    let output = scratch_dir("seq-out");
    for i in 0..7 {
        road_image(i != 3).save(input.join(format!("{:03}.png", i))).unwrap();
    }

    let pipeline = FrameAnalysisPipeline::new(&AnalyzerConfig::default()).unwrap();
    let mut source = ImageSequenceSource::new(&input, 2.0);
    let mut sink = ImageSequenceSink::create(&output).unwrap();
    let mut progress = Vec::new();

    let result = analyze_video(&pipeline, &mut source, &mut sink, 3, |p| progress.push(p)).unwrap();

    // Frame 3 is sampled but blank
    let frames: Vec<u64> = result.detections.iter().map(|d| d.frame_number).collect();
    assert_eq!(frames, vec![0, 6]);
    assert_eq!(result.metadata.frames_analyzed, 3);
    assert_eq!(result.metadata.total_frames, 7);
    assert_eq!(result.metadata.duration_seconds, 3.5);
    assert_eq!(result.status, RunStatus::Completed { faulted_frames: 0 });
    assert_eq!(progress, vec![0, 42, 85]);

    assert_eq!(sink.frames_written(), 7);
    let written = std::fs::read_dir(&output).unwrap().count();
    assert_eq!(written, 7);

    let stats = &result.aggregate;
    assert_eq!(stats.total_potholes, 2);
    assert_eq!(stats.timeline[1].timestamp, 3.0);
    assert!(stats.max_severity.is_some_and(|s| Severity::ALL.contains(&s)));

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["status"]["status"], "completed");
    assert!(json.get("thumbnail").is_none());

    std::fs::remove_dir_all(&input).ok();
    std::fs::remove_dir_all(&output).ok();
}

#[test]
fn missing_directory_is_source_unavailable() {
    let output = scratch_dir("missing-out");
    let pipeline = FrameAnalysisPipeline::new(&AnalyzerConfig::default()).unwrap();
    let mut source = ImageSequenceSource::new("/nonexistent/pothole/frames", 30.0);
    let mut sink = ImageSequenceSink::create(&output).unwrap();

    let err = analyze_video(&pipeline, &mut source, &mut sink, 5, |_| {}).unwrap_err();

    assert!(matches!(err, VideoError::SourceUnavailable(_)));
    assert_eq!(sink.frames_written(), 0);
    std::fs::remove_dir_all(&output).ok();
}
