use serde::{Deserialize, Serialize};

use crate::{indices::round_to, options::RiskWeights};

/// Weighted components of a composite risk score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskBreakdown {
    /// Weighted schedule-variance contribution.
    pub schedule: f64,
    /// Weighted cost-variance contribution.
    pub cost: f64,
    /// Weighted mean of the risk factors (zero when none were given).
    pub factors: f64,
    /// Clamped total, rounded to 1 decimal.
    pub total: f64,
}

impl RiskWeights {
    /// Splits the composite risk score into its weighted components.
    #[must_use]
    pub fn breakdown(
        &self,
        schedule_variance: f64,
        cost_variance: f64,
        risk_factors: &[f64],
    ) -> RiskBreakdown {
        let schedule = self.capped(schedule_variance) * self.schedule_weight;
        let cost = self.capped(cost_variance) * self.cost_weight;
        let factors = mean(risk_factors).map_or(0.0, |avg| avg * self.factor_weight);
        let total = (schedule + cost + factors).min(self.max_score).max(0.0);
        let total = round_to(total, 1);
        tracing::debug!(total, "calculated risk score");
        RiskBreakdown {
            schedule,
            cost,
            factors,
            total,
        }
    }

    /// Composite risk score in `[0, max_score]`, rounded to 1 decimal.
    #[must_use]
    pub fn score(&self, schedule_variance: f64, cost_variance: f64, risk_factors: &[f64]) -> f64 {
        self.breakdown(schedule_variance, cost_variance, risk_factors)
            .total
    }

    fn capped(&self, variance: f64) -> f64 {
        (variance.abs() * self.variance_scale).min(self.component_cap)
    }
}

/// Composite 0–100 risk score using the stock weights.
///
/// Each |variance| is scaled by 10 and capped at 100 before weighting (0.3 schedule,
/// 0.3 cost); the mean risk factor carries 0.4. The sum is clamped to 100.
#[must_use]
pub fn calculate_risk_score(schedule_variance: f64, cost_variance: f64, risk_factors: &[f64]) -> f64 {
    RiskWeights::default().score(schedule_variance, cost_variance, risk_factors)
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let denominator = values.len() as f64;
    Some(values.iter().sum::<f64>() / denominator)
}
