use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::health::HealthStatus;

/// KPIs computed for one project. Field names are part of the reporting contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetrics {
    /// Cache key.
    pub project_id: String,
    /// SPI, 3 decimals.
    pub schedule_performance_index: f64,
    /// CPI, 3 decimals; `1.0` when no cost has been incurred.
    pub cost_performance_index: f64,
    /// The `cost_variance` input, unchanged.
    pub budget_variance: f64,
    /// The `schedule_variance` input, unchanged.
    pub schedule_variance: f64,
    /// Composite risk in `[0, 100]`, 1 decimal.
    pub risk_score: f64,
    /// Passed through.
    pub team_utilization: f64,
    /// Passed through.
    pub completion_percentage: f64,
    /// Health classification.
    pub health_status: HealthStatus,
    /// When the record was computed.
    pub calculated_at: DateTime<Utc>,
}

impl ProjectMetrics {
    /// Whether the project classified as Red.
    #[must_use]
    pub fn is_at_risk(&self) -> bool {
        self.health_status == HealthStatus::Red
    }

    /// Compares every field except `calculated_at`.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn same_values(&self, other: &Self) -> bool {
        self.project_id == other.project_id
            && self.schedule_performance_index == other.schedule_performance_index
            && self.cost_performance_index == other.cost_performance_index
            && self.budget_variance == other.budget_variance
            && self.schedule_variance == other.schedule_variance
            && self.risk_score == other.risk_score
            && self.team_utilization == other.team_utilization
            && self.completion_percentage == other.completion_percentage
            && self.health_status == other.health_status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ProjectMetrics {
        ProjectMetrics {
            project_id: "PROJ-001".into(),
            schedule_performance_index: 0.938,
            cost_performance_index: 0.006,
            budget_variance: -5000.0,
            schedule_variance: -50.0,
            risk_score: 70.0,
            team_utilization: 0.85,
            completion_percentage: 93.75,
            health_status: HealthStatus::Red,
            calculated_at: Utc::now(),
        }
    }

    #[test]
    fn serializes_with_reporting_field_names() {
        let value = serde_json::to_value(sample()).unwrap();
        let object = value.as_object().unwrap();
        for key in [
            "project_id",
            "schedule_performance_index",
            "cost_performance_index",
            "budget_variance",
            "schedule_variance",
            "risk_score",
            "team_utilization",
            "completion_percentage",
            "health_status",
            "calculated_at",
        ] {
            assert!(object.contains_key(key), "missing {key}");
        }
        assert_eq!(value["health_status"], json!("Red"));
    }

    #[test]
    fn same_values_ignores_timestamp() {
        let first = sample();
        let mut second = first.clone();
        second.calculated_at = first.calculated_at + chrono::Duration::seconds(5);
        assert!(first.same_values(&second));
        second.risk_score = 71.0;
        assert!(!first.same_values(&second));
        assert!(first.is_at_risk());
    }
}
