use std::fmt;

use serde::{Deserialize, Serialize};

use crate::options::{HealthThresholds, TierPoints, TierThresholds};

/// Tri-state project health.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum HealthStatus {
    /// Score at or above the green cut-off.
    Green,
    /// Score at or above the yellow cut-off.
    Yellow,
    /// Everything else.
    Red,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Green => write!(f, "Green"),
            Self::Yellow => write!(f, "Yellow"),
            Self::Red => write!(f, "Red"),
        }
    }
}

/// Health status plus the integer-truncated 0–100 score behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthAssessment {
    /// Classification.
    pub status: HealthStatus,
    /// Combined score, truncated toward zero.
    pub percentage: u32,
}

impl TierThresholds {
    /// Points for `index`; each tier's lower bound is inclusive.
    #[must_use]
    pub fn points_for(&self, index: f64, points: &TierPoints) -> f64 {
        if index >= self.full {
            points.full
        } else if index >= self.partial {
            points.partial
        } else if index >= self.minimal {
            points.minimal
        } else {
            0.0
        }
    }
}

/// Risk score at which the risk adjustment reaches zero.
///
/// Fixed regardless of [`RiskWeights::max_score`](crate::options::RiskWeights),
/// which only clamps the composite score.
pub const RISK_SCALE: f64 = 100.0;

impl HealthThresholds {
    /// Raw (untruncated) combined score.
    #[must_use]
    pub fn score(&self, spi: f64, cpi: f64, risk_score: f64) -> f64 {
        let schedule = self.schedule.points_for(spi, &self.points);
        let cost = self.cost.points_for(cpi, &self.points);
        let risk_adjustment = (self.risk_points * (1.0 - risk_score / RISK_SCALE)).max(0.0);
        schedule + cost + risk_adjustment
    }

    /// Maps a combined score onto a status.
    #[must_use]
    pub fn classify(&self, score: f64) -> HealthStatus {
        if score >= self.green_min {
            HealthStatus::Green
        } else if score >= self.yellow_min {
            HealthStatus::Yellow
        } else {
            HealthStatus::Red
        }
    }

    /// Scores and classifies one project.
    #[must_use]
    pub fn assess(&self, spi: f64, cpi: f64, risk_score: f64) -> HealthAssessment {
        let score = self.score(spi, cpi, risk_score);
        let status = self.classify(score);
        tracing::debug!(%status, score, "project health");
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let percentage = score as u32;
        HealthAssessment { status, percentage }
    }
}

/// Classifies a project from SPI, CPI and risk using the stock thresholds.
///
/// Schedule and cost each award 40/25/10 points by tier, risk adds up to 20;
/// 75 and above is Green, 50 and above Yellow.
#[must_use]
pub fn calculate_project_health(spi: f64, cpi: f64, risk_score: f64) -> HealthAssessment {
    HealthThresholds::default().assess(spi, cpi, risk_score)
}
