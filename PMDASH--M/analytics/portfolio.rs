use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    error::{AnalyticsError, AnalyticsResult},
    inputs::ProjectInputs,
    metrics::ProjectMetrics,
};

/// One entry of a portfolio run: an id plus its loose field bag.
///
/// Fields are only checked when the engine runs the entry, so a bad field
/// aborts the run at that project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioProject {
    /// Project identifier.
    pub id: String,
    /// Input fields; absent means all defaults.
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl PortfolioProject {
    /// Creates an entry from a field bag.
    #[must_use]
    pub fn new(id: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    /// Creates an entry from typed inputs.
    #[must_use]
    pub fn from_inputs(id: impl Into<String>, inputs: &ProjectInputs) -> Self {
        let data = match serde_json::to_value(inputs) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        Self::new(id, data)
    }

    /// Typed view of the field bag.
    pub fn inputs(&self) -> AnalyticsResult<ProjectInputs> {
        ProjectInputs::from_fields(&self.data)
    }

    /// Parses `{ "id": .., "data": { .. } }`; `data` may be absent or `null`.
    pub fn from_value(value: &Value) -> AnalyticsResult<Self> {
        let id = match value.get("id") {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            Some(_) => {
                return Err(AnalyticsError::InvalidField {
                    field: "id".into(),
                    reason: "expected a string or number".into(),
                })
            }
            None => {
                return Err(AnalyticsError::InvalidField {
                    field: "id".into(),
                    reason: "missing".into(),
                })
            }
        };
        let data = match value.get("data") {
            Some(Value::Object(map)) => map.clone(),
            None | Some(Value::Null) => Map::new(),
            Some(_) => {
                return Err(AnalyticsError::InvalidField {
                    field: "data".into(),
                    reason: "expected an object of fields".into(),
                })
            }
        };
        Ok(Self { id, data })
    }
}

/// Portfolio rollup. Field names are part of the reporting contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioMetrics {
    /// Number of projects processed.
    pub total_projects: usize,
    /// Mean **risk score** across projects. The name is kept for report
    /// compatibility; it is not the 0–100 health percentage.
    pub avg_health_score: f64,
    /// Projects classified Red.
    pub at_risk_count: usize,
    /// Mean team utilization.
    pub avg_budget_utilization: f64,
    /// Mean SPI.
    pub avg_schedule_health: f64,
}

/// Result of a portfolio run. An empty input yields `Empty`, serialized as `{}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortfolioSummary {
    /// Metrics over at least one project.
    Computed(PortfolioMetrics),
    /// No projects were supplied.
    Empty {},
}

impl PortfolioSummary {
    /// Whether the run had no projects.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty {})
    }

    /// Rollup, when there was anything to roll up.
    #[must_use]
    pub const fn metrics(&self) -> Option<&PortfolioMetrics> {
        match self {
            Self::Computed(metrics) => Some(metrics),
            Self::Empty {} => None,
        }
    }
}

/// Collects per-project values during a run.
#[derive(Debug, Default)]
pub(crate) struct PortfolioAccumulator {
    risk_scores: Vec<f64>,
    utilizations: Vec<f64>,
    schedule_indices: Vec<f64>,
    at_risk_count: usize,
}

impl PortfolioAccumulator {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            risk_scores: Vec::with_capacity(capacity),
            utilizations: Vec::with_capacity(capacity),
            schedule_indices: Vec::with_capacity(capacity),
            at_risk_count: 0,
        }
    }

    pub(crate) fn push(&mut self, metrics: &ProjectMetrics) {
        self.risk_scores.push(metrics.risk_score);
        self.utilizations.push(metrics.team_utilization);
        self.schedule_indices.push(metrics.schedule_performance_index);
        if metrics.is_at_risk() {
            self.at_risk_count += 1;
        }
    }

    pub(crate) fn finish(self) -> PortfolioSummary {
        if self.risk_scores.is_empty() {
            return PortfolioSummary::Empty {};
        }
        PortfolioSummary::Computed(PortfolioMetrics {
            total_projects: self.risk_scores.len(),
            avg_health_score: mean(&self.risk_scores),
            at_risk_count: self.at_risk_count,
            avg_budget_utilization: mean(&self.utilizations),
            avg_schedule_health: mean(&self.schedule_indices),
        })
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let denominator = values.len() as f64;
    values.iter().sum::<f64>() / denominator
}
