use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, AnalyticsResult};

/// Full scoring configuration. Defaults reproduce the stock dashboard constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    /// Composite risk weights.
    #[serde(default)]
    pub risk: RiskWeights,
    /// Health tiers and status cut-offs.
    #[serde(default)]
    pub health: HealthThresholds,
}

impl ScoringConfig {
    /// Loads and validates a TOML document. Missing tables and keys take defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading scoring config {}", path.display()))?;
        let config = Self::from_toml_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Parses and validates a TOML string.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks ordering and sign constraints on every threshold.
    pub fn validate(&self) -> AnalyticsResult<()> {
        self.risk.validate()?;
        self.health.validate()
    }
}

/// Weights and caps for the composite risk score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RiskWeights {
    /// Multiplier applied to |variance| before capping.
    #[serde(default = "default_variance_scale")]
    pub variance_scale: f64,
    /// Cap on each scaled variance component.
    #[serde(default = "default_component_cap")]
    pub component_cap: f64,
    /// Weight of the schedule-variance component.
    #[serde(default = "default_schedule_weight")]
    pub schedule_weight: f64,
    /// Weight of the cost-variance component.
    #[serde(default = "default_cost_weight")]
    pub cost_weight: f64,
    /// Weight of the mean risk factor.
    #[serde(default = "default_factor_weight")]
    pub factor_weight: f64,
    /// Upper clamp on the final score. Health always reads risk on the
    /// 0–100 scale of [`crate::health::RISK_SCALE`], so lowering this only clamps.
    #[serde(default = "default_max_score")]
    pub max_score: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            variance_scale: default_variance_scale(),
            component_cap: default_component_cap(),
            schedule_weight: default_schedule_weight(),
            cost_weight: default_cost_weight(),
            factor_weight: default_factor_weight(),
            max_score: default_max_score(),
        }
    }
}

impl RiskWeights {
    fn validate(&self) -> AnalyticsResult<()> {
        let named = [
            ("risk.variance_scale", self.variance_scale),
            ("risk.component_cap", self.component_cap),
            ("risk.schedule_weight", self.schedule_weight),
            ("risk.cost_weight", self.cost_weight),
            ("risk.factor_weight", self.factor_weight),
            ("risk.max_score", self.max_score),
        ];
        for (name, value) in named {
            if !value.is_finite() || value < 0.0 {
                return Err(AnalyticsError::Config(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Lower bounds of the three scoring tiers for one index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TierThresholds {
    /// Index at or above which the full tier applies.
    pub full: f64,
    /// Index at or above which the partial tier applies.
    pub partial: f64,
    /// Index at or above which the minimal tier applies.
    pub minimal: f64,
}

impl TierThresholds {
    /// Stock schedule (SPI) tiers: 1.0 / 0.95 / 0.85.
    #[must_use]
    pub const fn schedule() -> Self {
        Self {
            full: 1.0,
            partial: 0.95,
            minimal: 0.85,
        }
    }

    /// Stock cost (CPI) tiers: 1.0 / 0.90 / 0.75.
    #[must_use]
    pub const fn cost() -> Self {
        Self {
            full: 1.0,
            partial: 0.90,
            minimal: 0.75,
        }
    }

    fn validate(&self, name: &str) -> AnalyticsResult<()> {
        let ordered = self.full > self.partial && self.partial > self.minimal;
        if !ordered || !self.minimal.is_finite() || !self.full.is_finite() {
            return Err(AnalyticsError::Config(format!(
                "{name} tiers must satisfy full > partial > minimal, got {} / {} / {}",
                self.full, self.partial, self.minimal
            )));
        }
        Ok(())
    }
}

/// Points awarded per tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TierPoints {
    /// Points for the full tier.
    pub full: f64,
    /// Points for the partial tier.
    pub partial: f64,
    /// Points for the minimal tier.
    pub minimal: f64,
}

impl Default for TierPoints {
    fn default() -> Self {
        Self {
            full: 40.0,
            partial: 25.0,
            minimal: 10.0,
        }
    }
}

/// Tier boundaries and cut-offs for the health classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HealthThresholds {
    /// SPI tiers.
    #[serde(default = "TierThresholds::schedule")]
    pub schedule: TierThresholds,
    /// CPI tiers.
    #[serde(default = "TierThresholds::cost")]
    pub cost: TierThresholds,
    /// Points per tier, shared by schedule and cost.
    #[serde(default)]
    pub points: TierPoints,
    /// Points for zero risk; scaled down linearly to zero at risk 100.
    #[serde(default = "default_risk_points")]
    pub risk_points: f64,
    /// Minimum score for Green.
    #[serde(default = "default_green_min")]
    pub green_min: f64,
    /// Minimum score for Yellow.
    #[serde(default = "default_yellow_min")]
    pub yellow_min: f64,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            schedule: TierThresholds::schedule(),
            cost: TierThresholds::cost(),
            points: TierPoints::default(),
            risk_points: default_risk_points(),
            green_min: default_green_min(),
            yellow_min: default_yellow_min(),
        }
    }
}

impl HealthThresholds {
    fn validate(&self) -> AnalyticsResult<()> {
        self.schedule.validate("health.schedule")?;
        self.cost.validate("health.cost")?;
        let p = self.points;
        if !(p.full >= p.partial && p.partial >= p.minimal && p.minimal >= 0.0) {
            return Err(AnalyticsError::Config(
                "health.points must satisfy full >= partial >= minimal >= 0".into(),
            ));
        }
        if !self.risk_points.is_finite() || self.risk_points < 0.0 {
            return Err(AnalyticsError::Config(
                "health.risk_points must be non-negative".into(),
            ));
        }
        if self.green_min <= self.yellow_min {
            return Err(AnalyticsError::Config(format!(
                "health.green_min ({}) must exceed health.yellow_min ({})",
                self.green_min, self.yellow_min
            )));
        }
        Ok(())
    }
}

const fn default_variance_scale() -> f64 {
    10.0
}

const fn default_component_cap() -> f64 {
    100.0
}

const fn default_schedule_weight() -> f64 {
    0.3
}

const fn default_cost_weight() -> f64 {
    0.3
}

const fn default_factor_weight() -> f64 {
    0.4
}

const fn default_max_score() -> f64 {
    100.0
}

const fn default_risk_points() -> f64 {
    20.0
}

const fn default_green_min() -> f64 {
    75.0
}

const fn default_yellow_min() -> f64 {
    50.0
}
