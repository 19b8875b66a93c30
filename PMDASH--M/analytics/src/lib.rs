#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! PMDash analytics – earned-value KPIs, composite risk, health scoring and portfolio rollups.

/// Error types shared by the engine.
#[path = "../error.rs"]
pub mod error;

/// Scoring thresholds and weights, loadable from TOML.
#[path = "../options.rs"]
pub mod options;

/// SPI/CPI calculators.
#[path = "../indices.rs"]
pub mod indices;

/// Composite risk scoring.
#[path = "../risk.rs"]
pub mod risk;

/// Tiered health classification.
#[path = "../health.rs"]
pub mod health;

/// Per-project input fields and defaults.
#[path = "../inputs.rs"]
pub mod inputs;

/// Per-project metrics record.
#[path = "../metrics.rs"]
pub mod metrics;

/// In-memory cache of the latest metrics per project.
#[path = "../cache.rs"]
pub mod cache;

/// Portfolio aggregation.
#[path = "../portfolio.rs"]
pub mod portfolio;

/// Structured JSON telemetry for the engine.
#[path = "../telemetry.rs"]
pub mod telemetry;

/// Engine entry point tying the calculators, cache and telemetry together.
#[path = "../main.rs"]
pub mod engine;

pub use cache::MetricsCache;
pub use engine::{MetricsEngine, MetricsEngineBuilder, NEUTRAL_CPI};
pub use error::{AnalyticsError, AnalyticsResult};
pub use health::{calculate_project_health, HealthAssessment, HealthStatus};
pub use indices::{calculate_cost_performance_index, calculate_schedule_performance_index};
pub use inputs::ProjectInputs;
pub use metrics::ProjectMetrics;
pub use options::{HealthThresholds, RiskWeights, ScoringConfig, TierPoints, TierThresholds};
pub use portfolio::{PortfolioMetrics, PortfolioProject, PortfolioSummary};
pub use risk::{calculate_risk_score, RiskBreakdown};
pub use telemetry::{AnalyticsTelemetry, AnalyticsTelemetryBuilder};
