//! Severity scoring

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::measurement::PotholeMeasurement;
use crate::{round2, AnalysisError};

/// Confidence ceiling; the score is a heuristic, never a certainty
pub const MAX_CONFIDENCE: f64 = 0.95;

/// Pothole severity category
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    /// Ordinal on the 1..=4 scale used for route averages
    pub fn ordinal(self) -> u8 {
        match self {
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
            Severity::Critical => 4,
        }
    }

    /// Category for a 0..=100 severity score
    pub fn from_score(score: u32) -> Self {
        match score {
            s if s < 30 => Severity::Low,
            s if s < 50 => Severity::Medium,
            s if s < 70 => Severity::High,
            _ => Severity::Critical,
        }
    }

    /// Category for a mean ordinal; each upper boundary is inclusive
    pub fn from_mean_ordinal(mean: f64) -> Self {
        if mean <= 1.5 {
            Severity::Low
        } else if mean <= 2.5 {
            Severity::Medium
        } else if mean <= 3.5 {
            Severity::High
        } else {
            Severity::Critical
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity category with its confidence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityAssessment {
    pub severity: Severity,
    /// Confidence in [0, 0.95]
    pub confidence: f64,
    /// Underlying 0..=100 score
    pub score: u32,
}

/// Multi-factor severity heuristic over area, depth and shape
pub struct SeverityScorer;

impl SeverityScorer {
    /// Area contribution (0-40)
    pub fn area_points(area_cm2: f64) -> u32 {
        if area_cm2 < 100.0 {
            10
        } else if area_cm2 < 300.0 {
            20
        } else if area_cm2 < 600.0 {
            30
        } else {
            40
        }
    }

    /// Depth contribution (0-40)
    pub fn depth_points(depth_cm: f64) -> u32 {
        if depth_cm < 2.0 {
            5
        } else if depth_cm < 5.0 {
            15
        } else if depth_cm < 8.0 {
            25
        } else {
            40
        }
    }

    /// Shape irregularity contribution (0-20); irregular outlines score higher
    pub fn circularity_points(circularity: f64) -> u32 {
        if circularity < 0.5 {
            15
        } else if circularity < 0.7 {
            10
        } else {
            5
        }
    }

    /// `min(score / 100, 0.95)`, rounded to 0.01
    pub fn confidence(score: u32) -> f64 {
        round2((score as f64 / 100.0).min(MAX_CONFIDENCE))
    }

    /// Score a measurement
    pub fn assess(m: &PotholeMeasurement) -> Result<SeverityAssessment, AnalysisError> {
        let values = [m.area_cm2, m.perimeter_cm, m.depth_cm];
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(AnalysisError::DegenerateContour(format!(
                "non-finite or negative measurement: area {}, perimeter {}, depth {}",
                m.area_cm2, m.perimeter_cm, m.depth_cm
            )));
        }
        let circularity = m.circularity().ok_or_else(|| {
            AnalysisError::DegenerateContour("zero perimeter".to_string())
        })?;

        let score = Self::area_points(m.area_cm2)
            + Self::depth_points(m.depth_cm)
            + Self::circularity_points(circularity);

        Ok(SeverityAssessment {
            severity: Severity::from_score(score),
            confidence: Self::confidence(score),
            score,
        })
    }
}
