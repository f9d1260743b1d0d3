//! Churn early warning: scores customers for churn risk and answers
//! free-text questions about the scored customer base.
//!
//! Both [`risk::Scorer`] and [`query::QueryInterpreter`] are pure: callers
//! pass in the records they want evaluated and get values back.

pub mod config;
pub mod ingest;
pub mod models;
pub mod query;
pub mod report;
pub mod risk;
pub mod sample;
pub mod stats;

pub use config::{ConfigError, ScoringConfig};
pub use models::{CustomerRecord, RiskCategory, ScoreResult, ScoredCustomer};
pub use query::{interpret, Intent, IntentKind, QueryInterpreter, Response};
pub use risk::Scorer;
pub use stats::PortfolioStats;
