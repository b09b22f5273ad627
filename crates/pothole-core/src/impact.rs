//! Impact, repair priority and repair cost

use serde::{Deserialize, Serialize};

use crate::config::CostModel;
use crate::measurement::PotholeMeasurement;
use crate::round2;
use crate::severity::{Severity, SeverityAssessment};

/// Ceiling of the impact scale
pub const MAX_IMPACT: u8 = 10;

/// Damage significance and repair planning figures
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactAssessment {
    /// 0..=10
    pub impact_score: u8,
    /// 2 (low) ..= 5 (critical)
    pub repair_priority: u8,
    /// Currency units, at least the base cost
    pub estimated_cost: f64,
}

impl CostModel {
    /// Repair cost for a pothole, rounded to 0.01
    pub fn estimate(&self, area_cm2: f64, depth_cm: f64) -> f64 {
        round2(self.estimate_unrounded(area_cm2, depth_cm))
    }

    pub(crate) fn estimate_unrounded(&self, area_cm2: f64, depth_cm: f64) -> f64 {
        self.base_cost + area_cm2 * self.cost_per_cm2 + depth_cm * self.cost_per_cm_depth
    }
}

/// Derives impact and repair figures from measurement and severity
pub struct ImpactScorer;

impl ImpactScorer {
    /// `min(10, floor(area/100 + depth/2))`
    pub fn impact_score(area_cm2: f64, depth_cm: f64) -> u8 {
        let raw = (area_cm2 / 100.0 + depth_cm / 2.0).floor();
        raw.clamp(0.0, MAX_IMPACT as f64) as u8
    }

    /// Scheduling weight for a severity category
    pub fn repair_priority(severity: Severity) -> u8 {
        match severity {
            Severity::Low => 2,
            Severity::Medium => 3,
            Severity::High => 4,
            Severity::Critical => 5,
        }
    }

    pub fn assess(
        m: &PotholeMeasurement,
        severity: &SeverityAssessment,
        cost: &CostModel,
    ) -> ImpactAssessment {
        ImpactAssessment {
            impact_score: Self::impact_score(m.area_cm2, m.depth_cm),
            repair_priority: Self::repair_priority(severity.severity),
            estimated_cost: cost.estimate(m.area_cm2, m.depth_cm),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contour::BoundingBox;
    use proptest::prelude::*;

    fn measurement(area_cm2: f64, depth_cm: f64) -> PotholeMeasurement {
        PotholeMeasurement {
            width_cm: 0.0,
            height_cm: 0.0,
            area_cm2,
            perimeter_cm: 10.0,
            depth_cm,
            bbox: BoundingBox::default(),
        }
    }

    fn assessment(severity: Severity) -> SeverityAssessment {
        SeverityAssessment {
            severity,
            confidence: 0.5,
            score: 50,
        }
    }

    #[test]
    fn test_reference_pothole() {
        let impact = ImpactScorer::assess(
            &measurement(250.0, 6.0),
            &assessment(Severity::High),
            &CostModel::default(),
        );
        // floor(2.5 + 3.0) = 5
        assert_eq!(impact.impact_score, 5);
        assert_eq!(impact.repair_priority, 4);
        // 50 + 125 + 60
        assert_eq!(impact.estimated_cost, 235.0);
    }

    #[test]
    fn test_impact_capped_at_ten() {
        assert_eq!(ImpactScorer::impact_score(5000.0, 15.0), 10);
        assert_eq!(ImpactScorer::impact_score(0.0, 0.0), 0);
    }

    #[test]
    fn test_impact_floors_sum() {
        // 0.49 + 0.5
        assert_eq!(ImpactScorer::impact_score(49.0, 1.0), 0);
        // 0.99 + 0.95
        assert_eq!(ImpactScorer::impact_score(99.0, 1.9), 1);
        assert_eq!(ImpactScorer::impact_score(100.0, 0.0), 1);
    }

    #[test]
    fn test_priority_table() {
        let priorities: Vec<u8> = Severity::ALL
            .iter()
            .map(|&s| ImpactScorer::repair_priority(s))
            .collect();
        assert_eq!(priorities, vec![2, 3, 4, 5]);
    }

    #[test]
    fn test_cost_rounding() {
        let cost = CostModel::default().estimate(12.34, 0.111);
        assert_eq!(cost, 57.28);
    }

    proptest! {
        #[test]
        fn prop_cost_and_impact_bounds(area in 0.0f64..100_000.0, depth in 0.0f64..15.0) {
            let impact = ImpactScorer::assess(
                &measurement(area, depth),
                &assessment(Severity::Medium),
                &CostModel::default(),
            );
            prop_assert!(impact.estimated_cost >= 50.0);
            prop_assert!(impact.impact_score <= MAX_IMPACT);
        }
    }
}
