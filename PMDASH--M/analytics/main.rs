use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::{json, Map, Value};
use shared_logging::LogLevel;
use uuid::Uuid;

use crate::{
    cache::MetricsCache,
    error::{AnalyticsError, AnalyticsResult},
    health::HealthAssessment,
    indices,
    inputs::ProjectInputs,
    metrics::ProjectMetrics,
    options::ScoringConfig,
    portfolio::{PortfolioAccumulator, PortfolioProject, PortfolioSummary},
    telemetry::AnalyticsTelemetry,
};

/// CPI used when no cost has been incurred yet.
pub const NEUTRAL_CPI: f64 = 1.0;

/// Metrics engine: calculators, the per-project pipeline, its cache and portfolio rollups.
#[derive(Debug, Default)]
pub struct MetricsEngine {
    config: ScoringConfig,
    cache: MetricsCache,
    telemetry: Option<AnalyticsTelemetry>,
}

impl MetricsEngine {
    /// Returns a builder.
    #[must_use]
    pub fn builder() -> MetricsEngineBuilder {
        MetricsEngineBuilder::default()
    }

    /// Engine with stock thresholds, an empty cache and no telemetry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Active scoring configuration.
    #[must_use]
    pub const fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Cache of the latest metrics per project.
    #[must_use]
    pub const fn cache(&self) -> &MetricsCache {
        &self.cache
    }

    /// Returns telemetry handle.
    #[must_use]
    pub const fn telemetry(&self) -> Option<&AnalyticsTelemetry> {
        self.telemetry.as_ref()
    }

    /// SPI; a zero planned value yields `0.0` and a warning record.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn calculate_schedule_performance_index(&self, earned_value: f64, planned_value: f64) -> f64 {
        if planned_value == 0.0 {
            self.emit(
                LogLevel::Warn,
                "analytics.index.zero_denominator",
                json!({ "index": "spi", "earned_value": earned_value }),
            );
        }
        indices::calculate_schedule_performance_index(earned_value, planned_value)
    }

    /// CPI; a zero actual cost yields `0.0` and a warning record.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn calculate_cost_performance_index(&self, earned_value: f64, actual_cost: f64) -> f64 {
        if actual_cost == 0.0 {
            self.emit(
                LogLevel::Warn,
                "analytics.index.zero_denominator",
                json!({ "index": "cpi", "earned_value": earned_value }),
            );
        }
        indices::calculate_cost_performance_index(earned_value, actual_cost)
    }

    /// Composite risk score under the configured weights.
    #[must_use]
    pub fn calculate_risk_score(
        &self,
        schedule_variance: f64,
        cost_variance: f64,
        risk_factors: &[f64],
    ) -> f64 {
        self.config
            .risk
            .score(schedule_variance, cost_variance, risk_factors)
    }

    /// Health status and percentage under the configured thresholds.
    #[must_use]
    pub fn calculate_project_health(&self, spi: f64, cpi: f64, risk_score: f64) -> HealthAssessment {
        let health = self.config.health.assess(spi, cpi, risk_score);
        self.emit(
            LogLevel::Debug,
            "analytics.health.assessed",
            json!({ "status": health.status, "percentage": health.percentage }),
        );
        health
    }

    /// Runs the per-project pipeline and caches the result, replacing any earlier entry.
    ///
    /// Typed inputs cannot fail; NaN and infinities flow through like any other value.
    pub fn calculate_metrics(&self, project_id: &str, inputs: &ProjectInputs) -> ProjectMetrics {
        let metrics = self.compute(project_id, inputs);
        self.cache.insert(metrics.clone());
        self.emit(
            LogLevel::Info,
            "analytics.metrics.calculated",
            json!({
                "project_id": project_id,
                "spi": metrics.schedule_performance_index,
                "cpi": metrics.cost_performance_index,
                "risk_score": metrics.risk_score,
                "health_status": metrics.health_status,
            }),
        );
        metrics
    }

    /// Like [`MetricsEngine::calculate_metrics`], starting from a loose field bag.
    ///
    /// A field of the wrong type is logged with the project id and returned;
    /// nothing is cached for it.
    pub fn calculate_metrics_from_fields(
        &self,
        project_id: &str,
        fields: &Map<String, Value>,
    ) -> AnalyticsResult<ProjectMetrics> {
        let inputs = ProjectInputs::from_fields(fields).inspect_err(|err| {
            self.emit_failure(project_id, err);
        })?;
        Ok(self.calculate_metrics(project_id, &inputs))
    }

    /// Latest cached metrics for `project_id`.
    #[must_use]
    pub fn get_project_metrics(&self, project_id: &str) -> Option<ProjectMetrics> {
        self.cache.get(project_id)
    }

    /// Empties the cache.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Runs every project in order and rolls the results up.
    ///
    /// The first failing project aborts the run; projects before it stay cached.
    pub fn calculate_portfolio_metrics(
        &self,
        projects: &[PortfolioProject],
    ) -> AnalyticsResult<PortfolioSummary> {
        if projects.is_empty() {
            self.emit(
                LogLevel::Warn,
                "analytics.portfolio.empty",
                json!({ "reason": "no projects provided for portfolio analysis" }),
            );
            return Ok(PortfolioSummary::Empty {});
        }

        let run_id = Uuid::new_v4();
        let mut accumulator = PortfolioAccumulator::with_capacity(projects.len());
        for project in projects {
            let metrics = self.calculate_metrics_from_fields(&project.id, &project.data)?;
            accumulator.push(&metrics);
        }
        let summary = accumulator.finish();
        if let Some(rollup) = summary.metrics() {
            self.emit(
                LogLevel::Info,
                "analytics.portfolio.calculated",
                json!({
                    "run_id": run_id,
                    "total_projects": rollup.total_projects,
                    "at_risk_count": rollup.at_risk_count,
                }),
            );
        }
        Ok(summary)
    }

    fn compute(&self, project_id: &str, inputs: &ProjectInputs) -> ProjectMetrics {
        let spi = self.calculate_schedule_performance_index(inputs.earned_value, inputs.planned_value);
        let cpi = if inputs.actual_cost > 0.0 {
            self.calculate_cost_performance_index(inputs.earned_value, inputs.actual_cost)
        } else {
            NEUTRAL_CPI
        };
        let risk_score = self.calculate_risk_score(
            inputs.schedule_variance,
            inputs.cost_variance,
            &inputs.risk_factors,
        );
        let health = self.calculate_project_health(spi, cpi, risk_score);
        ProjectMetrics {
            project_id: project_id.to_owned(),
            schedule_performance_index: spi,
            cost_performance_index: cpi,
            budget_variance: inputs.cost_variance,
            schedule_variance: inputs.schedule_variance,
            risk_score,
            team_utilization: inputs.team_utilization,
            completion_percentage: inputs.completion_percentage,
            health_status: health.status,
            calculated_at: Utc::now(),
        }
    }

    fn emit_failure(&self, project_id: &str, err: &AnalyticsError) {
        self.emit(
            LogLevel::Error,
            "analytics.metrics.failed",
            json!({ "project_id": project_id, "kind": err.kind(), "error": err.to_string() }),
        );
    }

    fn emit(&self, level: LogLevel, message: &str, metadata: Value) {
        if let Some(tel) = &self.telemetry {
            let _ = tel.log(level, message, metadata);
        }
    }
}

/// Builder for `MetricsEngine`.
#[derive(Debug, Default)]
pub struct MetricsEngineBuilder {
    config: ScoringConfig,
    telemetry: Option<AnalyticsTelemetry>,
}

impl MetricsEngineBuilder {
    /// Sets telemetry.
    #[must_use]
    pub fn telemetry(mut self, telemetry: AnalyticsTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Uses `config` instead of the stock thresholds.
    #[must_use]
    pub fn config(mut self, config: ScoringConfig) -> Self {
        self.config = config;
        self
    }

    /// Loads the scoring configuration from a TOML file.
    pub fn config_path(mut self, path: impl AsRef<Path>) -> Result<Self> {
        self.config = ScoringConfig::load(path).context("loading scoring configuration")?;
        Ok(self)
    }

    /// Builds the engine with an empty cache.
    pub fn build(self) -> Result<MetricsEngine> {
        self.config.validate()?;
        Ok(MetricsEngine {
            config: self.config,
            cache: MetricsCache::new(),
            telemetry: self.telemetry,
        })
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::{
        health::HealthStatus,
        options::{HealthThresholds, RiskWeights, TierThresholds},
    };
    use serde_json::json;
    use tempfile::tempdir;

    fn reference_inputs() -> ProjectInputs {
        ProjectInputs {
            earned_value: 750.0,
            planned_value: 800.0,
            actual_cost: 120_000.0,
            schedule_variance: -50.0,
            cost_variance: -5000.0,
            completion_percentage: 93.75,
            team_utilization: 0.85,
            risk_factors: vec![25.0, 30.0, 20.0],
        }
    }

    fn engine_with_log() -> (MetricsEngine, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let telemetry = AnalyticsTelemetry::builder("analytics")
            .log_path(dir.path().join("analytics.log"))
            .build()
            .unwrap();
        let engine = MetricsEngine::builder().telemetry(telemetry).build().unwrap();
        (engine, dir)
    }

    #[test]
    fn reference_project_end_to_end() {
        let engine = MetricsEngine::new();
        let metrics = engine.calculate_metrics("PROJ-001", &reference_inputs());
        assert!((metrics.schedule_performance_index - 0.938).abs() < 1e-12);
        assert!((metrics.cost_performance_index - 0.006).abs() < 1e-12);
        assert!((metrics.risk_score - 70.0).abs() < 1e-9);
        assert_eq!(metrics.health_status, HealthStatus::Red);
        assert!((metrics.budget_variance + 5000.0).abs() < f64::EPSILON);
        assert!((metrics.schedule_variance + 50.0).abs() < f64::EPSILON);
        assert!((metrics.team_utilization - 0.85).abs() < f64::EPSILON);
        assert!((metrics.completion_percentage - 93.75).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_actual_cost_is_neutral_at_orchestration_level() {
        let engine = MetricsEngine::new();
        let inputs = ProjectInputs {
            earned_value: 100.0,
            ..ProjectInputs::default()
        };
        let metrics = engine.calculate_metrics("fresh", &inputs);
        assert!((metrics.cost_performance_index - NEUTRAL_CPI).abs() < f64::EPSILON);
        assert!((engine.calculate_cost_performance_index(100.0, 0.0)).abs() < f64::EPSILON);
        // 40 + 40 + 20
        assert_eq!(metrics.health_status, HealthStatus::Green);
    }

    #[test]
    fn defaults_only_project() {
        let engine = MetricsEngine::new();
        let metrics = engine.calculate_metrics("blank", &ProjectInputs::default());
        // SPI 0 -> 0 points, CPI neutral -> 40, zero risk -> 20.
        assert_eq!(metrics.schedule_performance_index, 0.0);
        assert_eq!(metrics.risk_score, 0.0);
        assert_eq!(metrics.health_status, HealthStatus::Yellow);
    }

    #[test]
    fn recalculation_is_idempotent_and_cache_keeps_latest() {
        let engine = MetricsEngine::new();
        let first = engine.calculate_metrics("PROJ-001", &reference_inputs());
        let second = engine.calculate_metrics("PROJ-001", &reference_inputs());
        assert!(first.same_values(&second));
        assert_eq!(engine.cache().len(), 1);
        let cached = engine.get_project_metrics("PROJ-001").unwrap();
        assert_eq!(cached, second);
    }

    #[test]
    fn unknown_project_is_absent() {
        let engine = MetricsEngine::new();
        assert!(engine.get_project_metrics("missing").is_none());
        engine.calculate_metrics("known", &ProjectInputs::default());
        engine.clear_cache();
        assert!(engine.get_project_metrics("known").is_none());
    }

    #[test]
    fn failure_is_logged_returned_and_not_cached() {
        let (engine, _dir) = engine_with_log();
        let fields = json!({ "earned_value": 750, "risk_factors": [25, "high"] });
        let err = engine
            .calculate_metrics_from_fields("broken", fields.as_object().unwrap())
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidRiskFactor { index: 1, .. }));
        assert!(engine.get_project_metrics("broken").is_none());
        let records = engine.telemetry().unwrap().records().unwrap();
        let failure = records
            .iter()
            .find(|r| r.message == "analytics.metrics.failed")
            .unwrap();
        assert_eq!(failure.level, LogLevel::Error);
        assert_eq!(failure.metadata["project_id"], "broken");
        assert_eq!(failure.metadata["kind"], "invalid_risk_factor");
    }

    #[test]
    fn non_finite_pass_through_fields_do_not_fail() {
        let engine = MetricsEngine::new();
        let inputs = ProjectInputs {
            team_utilization: f64::INFINITY,
            completion_percentage: f64::NAN,
            ..ProjectInputs::default()
        };
        let metrics = engine.calculate_metrics("odd", &inputs);
        assert!(metrics.team_utilization.is_infinite());
        assert!(metrics.completion_percentage.is_nan());
        // SPI 0 -> 0, neutral CPI -> 40, zero risk -> 20.
        assert_eq!(metrics.health_status, HealthStatus::Yellow);
        assert!(engine.get_project_metrics("odd").is_some());
    }

    #[test]
    fn non_finite_indices_score_no_tier_points() {
        let engine = MetricsEngine::new();
        let inputs = ProjectInputs {
            earned_value: f64::NAN,
            actual_cost: 100.0,
            ..ProjectInputs::default()
        };
        let metrics = engine.calculate_metrics("nan", &inputs);
        assert!(metrics.schedule_performance_index.is_nan());
        // Only the risk adjustment scores.
        assert_eq!(metrics.health_status, HealthStatus::Red);
    }

    #[test]
    fn near_tie_cpi_rounds_down_and_stays_yellow() {
        let engine = MetricsEngine::new();
        let inputs = ProjectInputs {
            earned_value: 1799.0,
            planned_value: 1799.0,
            actual_cost: 2000.0,
            ..ProjectInputs::default()
        };
        let metrics = engine.calculate_metrics("PROJ-TIE", &inputs);
        assert_eq!(metrics.cost_performance_index, 0.899);
        // 40 + 10 + 20
        assert_eq!(metrics.health_status, HealthStatus::Yellow);
        assert_eq!(engine.calculate_project_health(1.0, 0.899, 0.0).percentage, 70);
    }

    #[test]
    fn lower_max_score_only_clamps_risk() {
        let config = ScoringConfig {
            risk: RiskWeights {
                max_score: 50.0,
                ..RiskWeights::default()
            },
            ..ScoringConfig::default()
        };
        let engine = MetricsEngine::builder().config(config).build().unwrap();
        let inputs = ProjectInputs {
            earned_value: 100.0,
            actual_cost: 100.0,
            schedule_variance: -1000.0,
            cost_variance: -1000.0,
            ..ProjectInputs::default()
        };
        let metrics = engine.calculate_metrics("clamped", &inputs);
        assert_eq!(metrics.risk_score, 50.0);
        // Risk is read on the 0-100 scale: 40 + 40 + 20 * 0.5.
        let health = engine.calculate_project_health(1.0, 1.0, metrics.risk_score);
        assert_eq!(health.percentage, 90);
        assert_eq!(metrics.health_status, HealthStatus::Green);
    }

    #[test]
    fn field_bag_type_mismatch_propagates() {
        let (engine, _dir) = engine_with_log();
        let fields = json!({ "earned_value": "750" });
        let err = engine
            .calculate_metrics_from_fields("PROJ-9", fields.as_object().unwrap())
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidField { .. }));
        let records = engine.telemetry().unwrap().records().unwrap();
        assert!(records.iter().any(|r| r.message == "analytics.metrics.failed"));
    }

    #[test]
    fn zero_denominators_emit_warnings() {
        let (engine, _dir) = engine_with_log();
        assert_eq!(engine.calculate_schedule_performance_index(10.0, 0.0), 0.0);
        let records = engine.telemetry().unwrap().records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, LogLevel::Warn);
        assert_eq!(records[0].metadata["index"], "spi");
    }

    #[test]
    fn successful_calculation_is_logged() {
        let (engine, _dir) = engine_with_log();
        engine.calculate_metrics("PROJ-001", &reference_inputs());
        let records = engine.telemetry().unwrap().records().unwrap();
        let record = records
            .iter()
            .find(|r| r.message == "analytics.metrics.calculated")
            .unwrap();
        assert_eq!(record.metadata["health_status"], "Red");
    }

    #[test]
    fn custom_thresholds_change_classification() {
        let config = ScoringConfig {
            health: HealthThresholds {
                cost: TierThresholds {
                    full: 0.005,
                    partial: 0.004,
                    minimal: 0.003,
                },
                ..HealthThresholds::default()
            },
            ..ScoringConfig::default()
        };
        let engine = MetricsEngine::builder().config(config).build().unwrap();
        let metrics = engine.calculate_metrics("PROJ-001", &reference_inputs());
        // 10 + 40 + 6 = 56
        assert_eq!(metrics.health_status, HealthStatus::Yellow);
    }

    #[test]
    fn builder_rejects_invalid_config() {
        let mut config = ScoringConfig::default();
        config.health.yellow_min = 90.0;
        assert!(MetricsEngine::builder().config(config).build().is_err());
    }

    #[test]
    fn builder_loads_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scoring.toml");
        std::fs::write(&path, "[health]\ngreen_min = 99.0\n").unwrap();
        let engine = MetricsEngine::builder().config_path(&path).unwrap().build().unwrap();
        let health = engine.calculate_project_health(1.05, 1.02, 10.0);
        assert_eq!(health.percentage, 98);
        assert_eq!(health.status, HealthStatus::Yellow);
    }

    #[test]
    fn empty_portfolio_is_not_an_error() {
        let (engine, _dir) = engine_with_log();
        let summary = engine.calculate_portfolio_metrics(&[]).unwrap();
        assert!(summary.is_empty());
        let records = engine.telemetry().unwrap().records().unwrap();
        assert_eq!(records[0].message, "analytics.portfolio.empty");
    }
}
