use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AnalyticsError, AnalyticsResult};

/// Every field the engine reads for one project. Absent fields take the defaults
/// of [`ProjectInputs::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectInputs {
    /// Value of work completed. Default `0`.
    pub earned_value: f64,
    /// Value of work scheduled. Default `100`.
    pub planned_value: f64,
    /// Cost incurred so far. Default `0`, which makes CPI neutral.
    pub actual_cost: f64,
    /// Signed schedule variance. Default `0`.
    pub schedule_variance: f64,
    /// Signed cost variance, reported as `budget_variance`. Default `0`.
    pub cost_variance: f64,
    /// Passed through unchanged. Default `0`.
    pub completion_percentage: f64,
    /// Passed through unchanged. Default `0`.
    pub team_utilization: f64,
    /// Individual risk factor scores. Default empty.
    pub risk_factors: Vec<f64>,
}

impl Default for ProjectInputs {
    fn default() -> Self {
        Self {
            earned_value: 0.0,
            planned_value: 100.0,
            actual_cost: 0.0,
            schedule_variance: 0.0,
            cost_variance: 0.0,
            completion_percentage: 0.0,
            team_utilization: 0.0,
            risk_factors: Vec::new(),
        }
    }
}

impl ProjectInputs {
    /// Builds inputs from a loose bag of named fields, as handed over by the data
    /// preparation layer. Unknown keys are ignored; known keys must hold numbers
    /// (or, for `risk_factors`, an array of numbers).
    pub fn from_fields(fields: &Map<String, Value>) -> AnalyticsResult<Self> {
        let mut inputs = Self::default();
        for (key, value) in fields {
            let slot = match key.as_str() {
                "earned_value" => &mut inputs.earned_value,
                "planned_value" => &mut inputs.planned_value,
                "actual_cost" => &mut inputs.actual_cost,
                "schedule_variance" => &mut inputs.schedule_variance,
                "cost_variance" => &mut inputs.cost_variance,
                "completion_percentage" => &mut inputs.completion_percentage,
                "team_utilization" => &mut inputs.team_utilization,
                "risk_factors" => {
                    inputs.risk_factors = parse_risk_factors(value)?;
                    continue;
                }
                other => {
                    tracing::debug!(field = other, "ignoring unrecognised project field");
                    continue;
                }
            };
            *slot = value.as_f64().ok_or_else(|| AnalyticsError::InvalidField {
                field: key.clone(),
                reason: format!("expected a number, got {}", describe(value)),
            })?;
        }
        Ok(inputs)
    }

    /// Same as [`ProjectInputs::from_fields`] for an arbitrary JSON value, which must be an object.
    pub fn from_value(value: &Value) -> AnalyticsResult<Self> {
        match value {
            Value::Object(map) => Self::from_fields(map),
            Value::Null => Ok(Self::default()),
            other => Err(AnalyticsError::InvalidField {
                field: "data".into(),
                reason: format!("expected an object of fields, got {}", describe(other)),
            }),
        }
    }
}

fn parse_risk_factors(value: &Value) -> AnalyticsResult<Vec<f64>> {
    let Value::Array(items) = value else {
        return Err(AnalyticsError::InvalidField {
            field: "risk_factors".into(),
            reason: format!("expected an array, got {}", describe(value)),
        });
    };
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.as_f64().ok_or_else(|| AnalyticsError::InvalidRiskFactor {
                index,
                reason: format!("expected a number, got {}", describe(item)),
            })
        })
        .collect()
}

const fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
