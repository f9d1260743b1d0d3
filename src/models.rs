use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Engagement assumed when a source supplies none.
pub const NEUTRAL_ENGAGEMENT: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub registration_date: Option<NaiveDate>,
    pub last_transaction_date: Option<NaiveDate>,
    pub transaction_count: u32,
    pub total_spent: f64,
    pub engagement_score: f64,
    pub support_tickets: u32,
}

impl CustomerRecord {
    pub fn new(id: i64, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            ..Self::default()
        }
    }
}

impl Default for CustomerRecord {
    fn default() -> Self {
        Self {
            id: 0,
            name: "Unknown".to_string(),
            email: String::new(),
            phone: None,
            registration_date: None,
            last_transaction_date: None,
            transaction_count: 0,
            total_spent: 0.0,
            engagement_score: NEUTRAL_ENGAGEMENT,
            support_tickets: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Low,
    Medium,
    High,
}

impl RiskCategory {
    pub const ALL: [RiskCategory; 3] = [RiskCategory::High, RiskCategory::Medium, RiskCategory::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::High => "High",
            RiskCategory::Medium => "Medium",
            RiskCategory::Low => "Low",
        }
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RiskCategory {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(RiskCategory::High),
            "medium" => Ok(RiskCategory::Medium),
            "low" => Ok(RiskCategory::Low),
            other => Err(format!("unknown risk category: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorKind {
    Recency,
    Frequency,
    Monetary,
    Engagement,
    SupportIssues,
}

impl FactorKind {
    pub fn label(&self) -> &'static str {
        match self {
            FactorKind::Recency => "Recency",
            FactorKind::Frequency => "Frequency",
            FactorKind::Monetary => "Monetary",
            FactorKind::Engagement => "Engagement",
            FactorKind::SupportIssues => "Support Issues",
        }
    }
}

/// `contribution = weight * sub_score`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorContribution {
    pub factor: FactorKind,
    pub weight: f64,
    pub sub_score: f64,
    pub contribution: f64,
}

/// Relative to the scorer's reference date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signals {
    pub days_since_last_transaction: Option<i64>,
    pub transaction_count: u32,
    pub total_spent: f64,
    pub avg_transaction: f64,
    pub engagement_score: f64,
    pub account_age_days: Option<i64>,
    pub support_tickets: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub probability: f64,
    pub category: RiskCategory,
    pub factors: Vec<FactorContribution>,
    pub signals: Signals,
}

impl ScoreResult {
    pub fn contribution(&self, factor: FactorKind) -> Option<&FactorContribution> {
        self.factors.iter().find(|entry| entry.factor == factor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    High,
    Medium,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChurnReason {
    pub factor: String,
    pub description: String,
    pub impact: Impact,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCustomer {
    pub record: CustomerRecord,
    pub score: ScoreResult,
}
