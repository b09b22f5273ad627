//! Route-level statistics over video detections

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::CostModel;
use crate::round2;
use crate::severity::Severity;
use crate::video::FrameDetection;

/// One point on the detection timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub timestamp: f64,
    pub frame: u64,
    pub severity: Severity,
    pub area: f64,
}

/// Summary of all detections in one video
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VideoAggregateStats {
    pub total_potholes: usize,
    /// Mean severity ordinal bucketed back to a category; `None` without detections
    pub average_severity: Option<Severity>,
    pub max_severity: Option<Severity>,
    pub average_area_cm2: f64,
    pub average_depth_cm: f64,
    pub total_estimated_cost: f64,
    /// Count per category present in the input
    pub severity_breakdown: BTreeMap<Severity, usize>,
    /// Detections in frame order
    pub timeline: Vec<TimelineEntry>,
}

/// Reduces detections to route statistics
pub struct AggregateStatsCalculator;

impl AggregateStatsCalculator {
    /// Compute statistics from scratch
    pub fn compute(detections: &[FrameDetection], cost: &CostModel) -> VideoAggregateStats {
        if detections.is_empty() {
            return VideoAggregateStats::default();
        }

        let n = detections.len() as f64;

        let mut severity_breakdown = BTreeMap::new();
        let mut ordinal_sum = 0u32;
        let mut max_severity: Option<Severity> = None;
        let mut area_sum = 0.0;
        let mut depth_sum = 0.0;
        let mut total_cost = 0.0;

        for d in detections {
            let severity = d.severity.severity;
            *severity_breakdown.entry(severity).or_insert(0) += 1;
            ordinal_sum += severity.ordinal() as u32;
            // Strict comparison keeps the first of equal severities
            if max_severity.map_or(true, |max| severity > max) {
                max_severity = Some(severity);
            }
            area_sum += d.measurement.area_cm2;
            depth_sum += d.measurement.depth_cm;
            total_cost += cost.estimate_unrounded(d.measurement.area_cm2, d.measurement.depth_cm);
        }

        let timeline = detections
            .iter()
            .map(|d| TimelineEntry {
                timestamp: d.timestamp_seconds,
                frame: d.frame_number,
                severity: d.severity.severity,
                area: d.measurement.area_cm2,
            })
            .collect();

        VideoAggregateStats {
            total_potholes: detections.len(),
            average_severity: Some(Severity::from_mean_ordinal(ordinal_sum as f64 / n)),
            max_severity,
            average_area_cm2: round2(area_sum / n),
            average_depth_cm: round2(depth_sum / n),
            total_estimated_cost: round2(total_cost),
            severity_breakdown,
            timeline,
        }
    }
}
