use chrono::NaiveDate;

use crate::config::{FactorWeights, Saturation, ScoringConfig};
use crate::models::{
    ChurnReason, CustomerRecord, FactorContribution, FactorKind, Impact, ScoreResult,
    ScoredCustomer, Signals, NEUTRAL_ENGAGEMENT,
};

type Normalizer = fn(&Signals, &Saturation) -> f64;

/// One entry of the weighted linear model.
#[derive(Debug, Clone, Copy)]
pub struct Factor {
    pub kind: FactorKind,
    pub weight: f64,
    normalize: Normalizer,
}

impl Factor {
    pub fn sub_score(&self, signals: &Signals, saturation: &Saturation) -> f64 {
        (self.normalize)(signals, saturation).clamp(0.0, 1.0)
    }
}

pub fn factor_table(weights: &FactorWeights) -> [Factor; 5] {
    [
        Factor {
            kind: FactorKind::Recency,
            weight: weights.recency,
            normalize: recency_risk,
        },
        Factor {
            kind: FactorKind::Frequency,
            weight: weights.frequency,
            normalize: frequency_risk,
        },
        Factor {
            kind: FactorKind::Monetary,
            weight: weights.monetary,
            normalize: monetary_risk,
        },
        Factor {
            kind: FactorKind::Engagement,
            weight: weights.engagement,
            normalize: engagement_risk,
        },
        Factor {
            kind: FactorKind::SupportIssues,
            weight: weights.support_issues,
            normalize: support_risk,
        },
    ]
}

fn saturating_ratio(value: f64, saturation: f64) -> f64 {
    (value / saturation).clamp(0.0, 1.0)
}

fn recency_risk(signals: &Signals, saturation: &Saturation) -> f64 {
    // No transaction on record counts as fully lapsed.
    match signals.days_since_last_transaction {
        Some(days) => saturating_ratio(days as f64, saturation.recency_days),
        None => 1.0,
    }
}

fn frequency_risk(signals: &Signals, saturation: &Saturation) -> f64 {
    1.0 - saturating_ratio(signals.transaction_count as f64, saturation.transaction_count)
}

fn monetary_risk(signals: &Signals, saturation: &Saturation) -> f64 {
    1.0 - saturating_ratio(signals.total_spent, saturation.total_spent)
}

fn engagement_risk(signals: &Signals, saturation: &Saturation) -> f64 {
    1.0 - saturating_ratio(signals.engagement_score, saturation.engagement_max)
}

fn support_risk(signals: &Signals, saturation: &Saturation) -> f64 {
    saturating_ratio(signals.support_tickets as f64, saturation.support_tickets)
}

impl Signals {
    /// Derives signals as of `as_of`. Values the upstream validator should
    /// have caught are mapped to neutral ones instead of failing.
    pub fn from_record(record: &CustomerRecord, as_of: NaiveDate) -> Self {
        let total_spent = if record.total_spent.is_finite() {
            record.total_spent.max(0.0)
        } else {
            0.0
        };
        let engagement_score = if record.engagement_score.is_finite() {
            record.engagement_score.clamp(0.0, 100.0)
        } else {
            NEUTRAL_ENGAGEMENT
        };
        let avg_transaction = if record.transaction_count > 0 {
            total_spent / record.transaction_count as f64
        } else {
            0.0
        };

        Signals {
            days_since_last_transaction: record
                .last_transaction_date
                .map(|date| (as_of - date).num_days().max(0)),
            transaction_count: record.transaction_count,
            total_spent,
            avg_transaction,
            engagement_score,
            account_age_days: record
                .registration_date
                .map(|date| (as_of - date).num_days().max(0)),
            support_tickets: record.support_tickets,
        }
    }
}

/// Converts customer records into churn scores.
///
/// Holds only the validated configuration and the reference date, so the
/// same record always yields the same result from the same scorer.
#[derive(Debug, Clone)]
pub struct Scorer {
    config: ScoringConfig,
    factors: [Factor; 5],
    as_of: NaiveDate,
}

impl Scorer {
    /// `config` must already have passed [`ScoringConfig::validate`].
    pub fn new(config: ScoringConfig, as_of: NaiveDate) -> Self {
        let factors = factor_table(&config.weights);
        Self {
            config,
            factors,
            as_of,
        }
    }

    pub fn with_defaults(as_of: NaiveDate) -> Self {
        Self::new(ScoringConfig::default(), as_of)
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    pub fn score(&self, record: &CustomerRecord) -> ScoreResult {
        let signals = Signals::from_record(record, self.as_of);

        let factors: Vec<FactorContribution> = self
            .factors
            .iter()
            .map(|factor| {
                let sub_score = factor.sub_score(&signals, &self.config.saturation);
                FactorContribution {
                    factor: factor.kind,
                    weight: factor.weight,
                    sub_score,
                    contribution: factor.weight * sub_score,
                }
            })
            .collect();

        let probability = factors
            .iter()
            .map(|entry| entry.contribution)
            .sum::<f64>()
            .clamp(0.0, 1.0);
        let category = self.config.thresholds.category_for(probability);

        tracing::trace!(customer_id = record.id, probability, %category, "customer scored");

        ScoreResult {
            probability,
            category,
            factors,
            signals,
        }
    }

    /// Scores every record, highest probability first.
    pub fn score_all(&self, records: &[CustomerRecord]) -> Vec<ScoredCustomer> {
        let mut scored: Vec<ScoredCustomer> = records
            .iter()
            .map(|record| ScoredCustomer {
                record: record.clone(),
                score: self.score(record),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .probability
                .partial_cmp(&a.score.probability)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.record.id.cmp(&b.record.id))
        });
        scored
    }
}

/// Human-readable drivers behind a score.
pub fn churn_reasons(signals: &Signals) -> Vec<ChurnReason> {
    let mut reasons = Vec::new();

    match signals.days_since_last_transaction {
        Some(days) if days > 60 => reasons.push(ChurnReason {
            factor: "Inactivity".to_string(),
            description: format!("No transaction in {days} days"),
            impact: Impact::High,
        }),
        None => reasons.push(ChurnReason {
            factor: "Inactivity".to_string(),
            description: "No transaction on record".to_string(),
            impact: Impact::High,
        }),
        _ => {}
    }

    if signals.transaction_count <= 2 {
        reasons.push(ChurnReason {
            factor: "Low Engagement".to_string(),
            description: format!("Only {} transactions", signals.transaction_count),
            impact: Impact::High,
        });
    }

    if signals.total_spent < 100.0 {
        reasons.push(ChurnReason {
            factor: "Low Value".to_string(),
            description: format!("Total spent: ${:.2}", signals.total_spent),
            impact: Impact::Medium,
        });
    }

    if signals.support_tickets > 3 {
        reasons.push(ChurnReason {
            factor: "Support Issues".to_string(),
            description: format!("{} support tickets", signals.support_tickets),
            impact: Impact::Medium,
        });
    }

    if signals.engagement_score < 40.0 {
        reasons.push(ChurnReason {
            factor: "Poor Engagement".to_string(),
            description: format!("Engagement score: {:.0}/100", signals.engagement_score),
            impact: Impact::High,
        });
    }

    reasons
}
