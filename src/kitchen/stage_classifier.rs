use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::model::{ColorSummary, CookingStage};

pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StageThresholds {
    pub burnt_dark_ratio: f64,
    pub done_brown_ratio: f64,
    pub done_avg_r: f64,
    pub cooking_brown_ratio: f64,
    pub cooking_avg_r: f64,
}

impl Default for StageThresholds {
    fn default() -> Self {
        Self {
            burnt_dark_ratio: 0.4,
            done_brown_ratio: 0.3,
            done_avg_r: 120.0,
            cooking_brown_ratio: 0.1,
            cooking_avg_r: 100.0,
        }
    }
}

/// First matching rule wins; the categories overlap.
pub fn classify(colors: &ColorSummary, thresholds: &StageThresholds) -> CookingStage {
    if colors.dark_ratio > thresholds.burnt_dark_ratio {
        return CookingStage::Burnt;
    }
    if colors.brown_ratio > thresholds.done_brown_ratio && colors.avg_r > thresholds.done_avg_r {
        return CookingStage::Done;
    }
    if colors.brown_ratio > thresholds.cooking_brown_ratio
        || (colors.avg_r > thresholds.cooking_avg_r && colors.avg_r > colors.avg_g)
    {
        return CookingStage::Cooking;
    }
    CookingStage::Raw
}

/// Throttles frame classification to at most one sample per interval.
#[derive(Debug)]
pub struct StageSampler {
    interval: Duration,
    last_sample: Option<Instant>,
}

impl Default for StageSampler {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_INTERVAL)
    }
}

impl StageSampler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_sample: None,
        }
    }

    /// Returns `None` when the previous accepted sample is still fresh.
    pub fn sample(
        &mut self,
        colors: &ColorSummary,
        thresholds: &StageThresholds,
        now: Instant,
    ) -> Option<CookingStage> {
        if let Some(last) = self.last_sample {
            if now.saturating_duration_since(last) < self.interval {
                return None;
            }
        }
        self.last_sample = Some(now);
        Some(classify(colors, thresholds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(avg: f64, brown_ratio: f64, dark_ratio: f64) -> ColorSummary {
        ColorSummary {
            avg_r: avg,
            avg_g: avg,
            avg_b: avg,
            brown_ratio,
            dark_ratio,
        }
    }

    #[test]
    fn test_black_is_burnt() {
        let stage = classify(&summary(0.0, 0.0, 1.0), &StageThresholds::default());
        assert_eq!(stage, CookingStage::Burnt);
    }

    #[test]
    fn test_white_is_raw() {
        let stage = classify(&summary(255.0, 0.0, 0.0), &StageThresholds::default());
        assert_eq!(stage, CookingStage::Raw);
    }

    #[test]
    fn test_golden_brown_is_done() {
        let colors = ColorSummary {
            avg_r: 170.0,
            avg_g: 110.0,
            avg_b: 60.0,
            brown_ratio: 0.5,
            dark_ratio: 0.05,
        };
        assert_eq!(
            classify(&colors, &StageThresholds::default()),
            CookingStage::Done
        );
    }

    #[test]
    fn test_burnt_takes_precedence_over_done() {
        let colors = ColorSummary {
            avg_r: 170.0,
            avg_g: 110.0,
            avg_b: 60.0,
            brown_ratio: 0.5,
            dark_ratio: 0.45,
        };
        assert_eq!(
            classify(&colors, &StageThresholds::default()),
            CookingStage::Burnt
        );
    }

    #[test]
    fn test_cooking_rules() {
        let thresholds = StageThresholds::default();
        // some browning, too dim for done
        let browning = ColorSummary {
            avg_r: 90.0,
            avg_g: 80.0,
            avg_b: 70.0,
            brown_ratio: 0.2,
            dark_ratio: 0.0,
        };
        assert_eq!(classify(&browning, &thresholds), CookingStage::Cooking);

        // no browning but reddish and bright
        let reddish = ColorSummary {
            avg_r: 150.0,
            avg_g: 120.0,
            avg_b: 120.0,
            brown_ratio: 0.0,
            dark_ratio: 0.0,
        };
        assert_eq!(classify(&reddish, &thresholds), CookingStage::Cooking);
    }

    #[test]
    fn test_classifies_raw_pixels() {
        let pixels: Vec<u8> = std::iter::repeat([0u8, 0, 0, 255])
            .take(100)
            .flatten()
            .collect();
        let colors = ColorSummary::from_rgba(&pixels);
        assert_eq!(
            classify(&colors, &StageThresholds::default()),
            CookingStage::Burnt
        );
    }

    #[test]
    fn test_sampler_throttles() {
        let start = Instant::now();
        let thresholds = StageThresholds::default();
        let colors = summary(255.0, 0.0, 0.0);
        let mut sampler = StageSampler::default();

        assert_eq!(
            sampler.sample(&colors, &thresholds, start),
            Some(CookingStage::Raw)
        );
        assert_eq!(
            sampler.sample(&colors, &thresholds, start + Duration::from_millis(200)),
            None
        );
        assert!(sampler
            .sample(&colors, &thresholds, start + Duration::from_millis(500))
            .is_some());
    }
}
