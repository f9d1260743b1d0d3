//! Free-text questions over a scored customer snapshot.
//!
//! Classification walks [`RULES`] in declaration order and takes the first
//! rule whose keywords all appear in the tokenized utterance. There is no
//! scoring between rules: earlier rules win.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{
    ChurnReason, FactorContribution, RiskCategory, ScoredCustomer,
};
use crate::risk::churn_reasons;
use crate::stats::{format_currency, PortfolioStats};

/// Keyword matching an all-digit token that comes after the rule's
/// previous keyword (anywhere, when it is the first keyword).
pub const ID_PLACEHOLDER: &str = "#id";

const HIGH_RISK_PREVIEW: usize = 5;
const RECENT_LIMIT: usize = 10;
const CHURN_RATE_ALERT: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntentKind {
    ListHighRisk,
    ChurnRate,
    CustomerCount,
    RevenueStats,
    RecentActivity,
    CustomerLookup,
    Help,
    Unknown,
}

impl IntentKind {
    pub fn tag(&self) -> &'static str {
        match self {
            IntentKind::ListHighRisk => "list-high-risk",
            IntentKind::ChurnRate => "churn-rate",
            IntentKind::CustomerCount => "customer-count",
            IntentKind::RevenueStats => "revenue-stats",
            IntentKind::RecentActivity => "recent-activity",
            IntentKind::CustomerLookup => "customer-lookup",
            IntentKind::Help => "help",
            IntentKind::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Intent {
    pub kind: IntentKind,
    pub customer_id: Option<i64>,
}

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub keywords: &'static [&'static str],
    pub intent: IntentKind,
}

impl Rule {
    pub fn matches(&self, tokens: &[String]) -> bool {
        self.keywords.iter().enumerate().all(|(index, keyword)| {
            if *keyword == ID_PLACEHOLDER {
                let anchor = index.checked_sub(1).map(|prev| stem(self.keywords[prev]));
                numeric_after(tokens, anchor.as_deref()).is_some()
            } else {
                let keyword = stem(keyword);
                tokens.iter().any(|token| *token == keyword)
            }
        })
    }
}

pub const RULES: &[Rule] = &[
    Rule { keywords: &["revenue", "risk"], intent: IntentKind::RevenueStats },
    Rule { keywords: &["high", "risk"], intent: IntentKind::ListHighRisk },
    Rule { keywords: &["at", "risk"], intent: IntentKind::ListHighRisk },
    Rule { keywords: &["likely", "churn"], intent: IntentKind::ListHighRisk },
    Rule { keywords: &["who", "churn"], intent: IntentKind::ListHighRisk },
    Rule { keywords: &["churn", "rate"], intent: IntentKind::ChurnRate },
    Rule { keywords: &["percentage", "churn"], intent: IntentKind::ChurnRate },
    Rule { keywords: &["percent", "churn"], intent: IntentKind::ChurnRate },
    Rule { keywords: &["how", "many", "customers"], intent: IntentKind::CustomerCount },
    Rule { keywords: &["total", "customers"], intent: IntentKind::CustomerCount },
    Rule { keywords: &["number", "customers"], intent: IntentKind::CustomerCount },
    Rule { keywords: &["count", "customers"], intent: IntentKind::CustomerCount },
    Rule { keywords: &["recent", "activity"], intent: IntentKind::RecentActivity },
    Rule { keywords: &["recent", "customers"], intent: IntentKind::RecentActivity },
    Rule { keywords: &["latest", "customers"], intent: IntentKind::RecentActivity },
    Rule { keywords: &["latest", "transactions"], intent: IntentKind::RecentActivity },
    Rule { keywords: &["revenue"], intent: IntentKind::RevenueStats },
    Rule { keywords: &["total", "spent"], intent: IntentKind::RevenueStats },
    Rule { keywords: &["sales"], intent: IntentKind::RevenueStats },
    Rule { keywords: &["monetary"], intent: IntentKind::RevenueStats },
    Rule { keywords: &["customer", ID_PLACEHOLDER], intent: IntentKind::CustomerLookup },
    Rule { keywords: &["about", "customer"], intent: IntentKind::CustomerLookup },
    Rule { keywords: &["customer", "details"], intent: IntentKind::CustomerLookup },
    Rule { keywords: &["customer", "info"], intent: IntentKind::CustomerLookup },
    Rule { keywords: &["customer", "information"], intent: IntentKind::CustomerLookup },
    Rule { keywords: &["help"], intent: IntentKind::Help },
    Rule { keywords: &["what", "can", "you", "do"], intent: IntentKind::Help },
    Rule { keywords: &["commands"], intent: IntentKind::Help },
];

// "what's" -> "whats", "high-risk" -> "high risk"
pub fn normalize(utterance: &str) -> String {
    let mut normalized = String::with_capacity(utterance.len());
    for ch in utterance.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() || ch.is_whitespace() {
            normalized.push(ch);
        } else if ch == '\'' || ch == '\u{2019}' {
            continue;
        } else {
            normalized.push(' ');
        }
    }
    normalized
}

pub fn stem(token: &str) -> String {
    if token.chars().count() > 3 && token.ends_with('s') && !token.ends_with("ss") {
        token[..token.len() - 1].to_string()
    } else {
        token.to_string()
    }
}

pub fn tokenize(utterance: &str) -> Vec<String> {
    normalize(utterance).split_whitespace().map(stem).collect()
}

fn is_numeric(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|ch| ch.is_ascii_digit())
}

fn numeric_after<'a>(tokens: &'a [String], anchor: Option<&str>) -> Option<&'a String> {
    let start = match anchor {
        Some(anchor) => tokens.iter().position(|token| token == anchor)? + 1,
        None => 0,
    };
    tokens[start..].iter().find(|token| is_numeric(token))
}

/// First all-digit token, if it fits an identifier.
pub fn extract_customer_id(tokens: &[String]) -> Option<i64> {
    numeric_after(tokens, None).and_then(|token| token.parse().ok())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub probability: f64,
    pub category: RiskCategory,
    pub last_transaction_date: Option<NaiveDate>,
}

impl From<&ScoredCustomer> for CustomerSummary {
    fn from(customer: &ScoredCustomer) -> Self {
        Self {
            id: customer.record.id,
            name: customer.record.name.clone(),
            email: customer.record.email.clone(),
            probability: customer.score.probability,
            category: customer.score.category,
            last_transaction_date: customer.record.last_transaction_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerDetail {
    #[serde(flatten)]
    pub summary: CustomerSummary,
    pub phone: Option<String>,
    pub total_spent: f64,
    pub transaction_count: u32,
    pub factors: Vec<FactorContribution>,
    pub reasons: Vec<ChurnReason>,
}

impl From<&ScoredCustomer> for CustomerDetail {
    fn from(customer: &ScoredCustomer) -> Self {
        Self {
            summary: CustomerSummary::from(customer),
            phone: customer.record.phone.clone(),
            total_spent: customer.record.total_spent,
            transaction_count: customer.record.transaction_count,
            factors: customer.score.factors.clone(),
            reasons: churn_reasons(&customer.score.signals),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    Customers {
        customers: Vec<CustomerSummary>,
    },
    Customer {
        customer: Box<CustomerDetail>,
    },
    Stats {
        stats: PortfolioStats,
    },
    ChurnRate {
        churn_rate: f64,
        high_risk: usize,
        total: usize,
    },
    Revenue {
        total_revenue: f64,
        at_risk_revenue: f64,
        at_risk_share: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub intent: Intent,
    pub text: String,
    pub payload: Option<Payload>,
}

#[derive(Debug, Clone, Copy)]
pub struct QueryInterpreter {
    rules: &'static [Rule],
}

impl Default for QueryInterpreter {
    fn default() -> Self {
        Self::new(RULES)
    }
}

impl QueryInterpreter {
    pub fn new(rules: &'static [Rule]) -> Self {
        Self { rules }
    }

    pub fn classify(&self, utterance: &str) -> Intent {
        let tokens = tokenize(utterance);
        let kind = self
            .rules
            .iter()
            .find(|rule| rule.matches(&tokens))
            .map(|rule| rule.intent)
            .unwrap_or(IntentKind::Unknown);

        let customer_id = match kind {
            IntentKind::CustomerLookup => extract_customer_id(&tokens),
            _ => None,
        };

        tracing::debug!(intent = kind.tag(), ?customer_id, "query classified");
        Intent { kind, customer_id }
    }

    /// Answers `utterance` from `scored`. Never fails: unmatched questions
    /// and unknown identifiers produce ordinary responses.
    pub fn interpret(&self, utterance: &str, scored: &[ScoredCustomer]) -> Response {
        let intent = self.classify(utterance);
        let (text, payload) = match intent.kind {
            IntentKind::ListHighRisk => high_risk(scored),
            IntentKind::ChurnRate => churn_rate(scored),
            IntentKind::CustomerCount => customer_count(scored),
            IntentKind::RevenueStats => revenue(scored),
            IntentKind::RecentActivity => recent_activity(scored),
            IntentKind::CustomerLookup => customer_lookup(intent.customer_id, scored),
            IntentKind::Help => (HELP_TEXT.to_string(), None),
            IntentKind::Unknown => (UNKNOWN_TEXT.to_string(), None),
        };

        Response {
            intent,
            text,
            payload,
        }
    }
}

pub fn interpret(utterance: &str, scored: &[ScoredCustomer]) -> Response {
    QueryInterpreter::default().interpret(utterance, scored)
}

type Handled = (String, Option<Payload>);

fn by_probability_desc(a: &&ScoredCustomer, b: &&ScoredCustomer) -> std::cmp::Ordering {
    b.score
        .probability
        .partial_cmp(&a.score.probability)
        .unwrap_or(std::cmp::Ordering::Equal)
        .then_with(|| a.record.id.cmp(&b.record.id))
}

fn high_risk(scored: &[ScoredCustomer]) -> Handled {
    let mut matches: Vec<&ScoredCustomer> = scored
        .iter()
        .filter(|customer| customer.score.category == RiskCategory::High)
        .collect();
    matches.sort_by(by_probability_desc);

    let customers: Vec<CustomerSummary> =
        matches.iter().map(|customer| CustomerSummary::from(*customer)).collect();

    if customers.is_empty() {
        return (
            "Great news! There are currently no high-risk customers.".to_string(),
            Some(Payload::Customers { customers }),
        );
    }

    let mut text = format!(
        "I found {} high-risk customers who are likely to churn:\n\n",
        customers.len()
    );
    for (index, customer) in customers.iter().take(HIGH_RISK_PREVIEW).enumerate() {
        text.push_str(&format!(
            "{}. {} - Churn Probability: {:.1}%\n",
            index + 1,
            customer.name,
            customer.probability * 100.0
        ));
    }
    if customers.len() > HIGH_RISK_PREVIEW {
        text.push_str(&format!(
            "\n...and {} more.",
            customers.len() - HIGH_RISK_PREVIEW
        ));
    }
    text.push_str("\n\nI recommend creating a retention campaign for these customers.");

    (text, Some(Payload::Customers { customers }))
}

fn churn_rate(scored: &[ScoredCustomer]) -> Handled {
    let stats = PortfolioStats::from_scored(scored);
    let rate = stats.churn_rate();
    let hint = if rate > CHURN_RATE_ALERT {
        "Action needed: churn risk is elevated."
    } else {
        "Churn risk is under control."
    };

    let text = format!(
        "Current churn risk analysis:\n\n\
         • High-risk customers: {} ({:.1}%)\n\
         • Total customers: {}\n\n{}",
        stats.high_risk_count, rate, stats.total_customers, hint
    );

    (
        text,
        Some(Payload::ChurnRate {
            churn_rate: rate,
            high_risk: stats.high_risk_count,
            total: stats.total_customers,
        }),
    )
}

fn customer_count(scored: &[ScoredCustomer]) -> Handled {
    let stats = PortfolioStats::from_scored(scored);
    let text = format!(
        "You have {} customers.\n\n\
         • High Risk: {}\n\
         • Medium Risk: {}\n\
         • Low Risk: {}",
        stats.total_customers,
        stats.high_risk_count,
        stats.medium_risk_count,
        stats.low_risk_count
    );
    (text, Some(Payload::Stats { stats }))
}

fn revenue(scored: &[ScoredCustomer]) -> Handled {
    let stats = PortfolioStats::from_scored(scored);
    let share = stats.at_risk_share();
    let text = format!(
        "Revenue overview:\n\n\
         • Total revenue: {}\n\
         • Revenue at risk: {}\n\
         • Share at risk: {:.1}%\n\n\
         Retaining high-risk customers protects {} in revenue.",
        format_currency(stats.total_revenue),
        format_currency(stats.at_risk_revenue),
        share,
        format_currency(stats.at_risk_revenue)
    );
    (
        text,
        Some(Payload::Revenue {
            total_revenue: stats.total_revenue,
            at_risk_revenue: stats.at_risk_revenue,
            at_risk_share: share,
        }),
    )
}

fn recent_activity(scored: &[ScoredCustomer]) -> Handled {
    let mut recent: Vec<&ScoredCustomer> = scored.iter().collect();
    // Option orders None first, so reversing puts undated customers last.
    recent.sort_by(|a, b| {
        b.record
            .last_transaction_date
            .cmp(&a.record.last_transaction_date)
            .then_with(|| a.record.id.cmp(&b.record.id))
    });
    recent.truncate(RECENT_LIMIT);

    if recent.is_empty() {
        return (
            "No customer activity is available yet.".to_string(),
            Some(Payload::Customers {
                customers: Vec::new(),
            }),
        );
    }

    let mut text = format!(
        "Here are the {} most recently active customers:\n\n",
        recent.len()
    );
    for (index, customer) in recent.iter().enumerate() {
        let last = customer
            .record
            .last_transaction_date
            .map(|date| date.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        text.push_str(&format!(
            "{}. {} - Last activity: {}\n",
            index + 1,
            customer.record.name,
            last
        ));
    }

    let customers = recent
        .into_iter()
        .map(CustomerSummary::from)
        .collect();
    (text, Some(Payload::Customers { customers }))
}

fn customer_lookup(customer_id: Option<i64>, scored: &[ScoredCustomer]) -> Handled {
    let Some(customer_id) = customer_id else {
        return (
            "Please specify a customer ID, for example: 'Tell me about customer 123'.".to_string(),
            None,
        );
    };

    let Some(customer) = scored
        .iter()
        .find(|customer| customer.record.id == customer_id)
    else {
        return (format!("Customer with ID {customer_id} not found."), None);
    };

    let detail = CustomerDetail::from(customer);
    let mut text = format!(
        "Customer details:\n\n\
         Name: {}\n\
         Email: {}\n\
         Churn Risk: {}\n\
         Churn Probability: {:.1}%\n\
         Total Spent: {}\n\
         Transactions: {}\n",
        detail.summary.name,
        detail.summary.email,
        detail.summary.category,
        detail.summary.probability * 100.0,
        format_currency(detail.total_spent),
        detail.transaction_count
    );
    if !detail.reasons.is_empty() {
        text.push_str("\nRisk drivers:\n");
        for reason in &detail.reasons {
            text.push_str(&format!("• {}: {}\n", reason.factor, reason.description));
        }
    }

    (
        text,
        Some(Payload::Customer {
            customer: Box::new(detail),
        }),
    )
}

const HELP_TEXT: &str = "I can help you with:

1. Customer risk analysis
   • \"Show me high-risk customers\"
   • \"Who is likely to churn?\"

2. Statistics
   • \"How many customers do we have?\"
   • \"What's our churn rate?\"

3. Revenue insights
   • \"Show me revenue statistics\"
   • \"How much revenue is at risk?\"

4. Customer details
   • \"Tell me about customer 123\"

5. Recent activity
   • \"Show recent customer activity\"";

const UNKNOWN_TEXT: &str = "I'm not sure I understand that question. Here are some things you can ask me:

• \"Show me high-risk customers\"
• \"What's our churn rate?\"
• \"How many customers do we have?\"
• \"Tell me about customer 123\"

Type 'help' to see everything I can answer.";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CustomerRecord;
    use crate::risk::Scorer;
    use chrono::Duration;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    fn lapsed(id: i64) -> CustomerRecord {
        CustomerRecord {
            total_spent: 50.0,
            engagement_score: 20.0,
            support_tickets: 4,
            ..CustomerRecord::new(id, format!("Lapsed {id}"), format!("lapsed{id}@example.com"))
        }
    }

    fn loyal(id: i64, days_ago: i64) -> CustomerRecord {
        CustomerRecord {
            last_transaction_date: Some(as_of() - Duration::days(days_ago)),
            transaction_count: 30,
            total_spent: 1200.0,
            engagement_score: 85.0,
            ..CustomerRecord::new(id, format!("Loyal {id}"), format!("loyal{id}@example.com"))
        }
    }

    fn snapshot() -> Vec<ScoredCustomer> {
        let records = vec![lapsed(1), loyal(2, 5), loyal(3, 1), lapsed(4)];
        Scorer::with_defaults(as_of()).score_all(&records)
    }

    fn kind(utterance: &str) -> IntentKind {
        QueryInterpreter::default().classify(utterance).kind
    }

    #[test]
    fn normalizes_punctuation_and_case() {
        assert_eq!(normalize("What's our CHURN rate?"), "whats our churn rate ");
        assert_eq!(tokenize("Show high-risk customers!"), vec!["show", "high", "risk", "customer"]);
    }

    #[test]
    fn stemming_leaves_short_and_double_s_words() {
        assert_eq!(stem("customers"), "customer");
        assert_eq!(stem("is"), "is");
        assert_eq!(stem("has"), "has");
        assert_eq!(stem("access"), "access");
    }

    #[test]
    fn classifies_the_documented_questions() {
        assert_eq!(kind("Show me high-risk customers"), IntentKind::ListHighRisk);
        assert_eq!(kind("Who is likely to churn?"), IntentKind::ListHighRisk);
        assert_eq!(kind("What's our churn rate?"), IntentKind::ChurnRate);
        assert_eq!(kind("How many customers do we have?"), IntentKind::CustomerCount);
        assert_eq!(kind("Show me revenue statistics"), IntentKind::RevenueStats);
        assert_eq!(kind("How much revenue is at risk?"), IntentKind::RevenueStats);
        assert_eq!(kind("Tell me about customer 123"), IntentKind::CustomerLookup);
        assert_eq!(kind("Show recent customer activity"), IntentKind::RecentActivity);
        assert_eq!(kind("help"), IntentKind::Help);
        assert_eq!(kind("asdkfj random text"), IntentKind::Unknown);
        assert_eq!(kind(""), IntentKind::Unknown);
    }

    #[test]
    fn earlier_rules_win_over_later_ones() {
        // Matches both the at-risk revenue rule and the high-risk rule.
        assert_eq!(kind("high risk revenue"), IntentKind::RevenueStats);
        // Matches both the high-risk rule and the churn-rate rule.
        assert_eq!(kind("churn rate of high risk customers"), IntentKind::ListHighRisk);
    }

    #[test]
    fn numbers_outside_a_lookup_do_not_become_customer_ids() {
        let intent = QueryInterpreter::default().classify("show the 10 most recent customers");
        assert_eq!(intent.kind, IntentKind::RecentActivity);
        assert_eq!(intent.customer_id, None);

        let intent = QueryInterpreter::default().classify("revenue from customers since 2025");
        assert_eq!(intent.kind, IntentKind::RevenueStats);
        assert_eq!(intent.customer_id, None);
    }

    #[test]
    fn id_placeholder_needs_a_number_after_customer() {
        let rule = Rule { keywords: &["customer", ID_PLACEHOLDER], intent: IntentKind::CustomerLookup };
        assert!(rule.matches(&tokenize("customer 42")));
        assert!(rule.matches(&tokenize("is customers 7 active")));
        assert!(!rule.matches(&tokenize("top 3 customers")));
        assert!(!rule.matches(&tokenize("customer please")));
    }

    #[test]
    fn custom_rule_order_is_respected() {
        static REVERSED: &[Rule] = &[
            Rule { keywords: &["churn", "rate"], intent: IntentKind::ChurnRate },
            Rule { keywords: &["high", "risk"], intent: IntentKind::ListHighRisk },
        ];
        let interpreter = QueryInterpreter::new(REVERSED);
        assert_eq!(
            interpreter.classify("churn rate of high risk customers").kind,
            IntentKind::ChurnRate
        );
    }

    #[test]
    fn every_intent_has_a_rule() {
        for intent in [
            IntentKind::ListHighRisk,
            IntentKind::ChurnRate,
            IntentKind::CustomerCount,
            IntentKind::RevenueStats,
            IntentKind::RecentActivity,
            IntentKind::CustomerLookup,
            IntentKind::Help,
        ] {
            assert!(RULES.iter().any(|rule| rule.intent == intent), "{intent:?}");
        }
    }

    #[test]
    fn extracts_first_number_for_lookup() {
        let intent = QueryInterpreter::default().classify("customer 42 or maybe 7");
        assert_eq!(intent.kind, IntentKind::CustomerLookup);
        assert_eq!(intent.customer_id, Some(42));
    }

    #[test]
    fn lookup_without_id_asks_for_one() {
        let response = interpret("tell me about a customer", &snapshot());
        assert_eq!(response.intent.kind, IntentKind::CustomerLookup);
        assert_eq!(response.intent.customer_id, None);
        assert!(response.text.contains("Please specify a customer ID"));
        assert!(response.payload.is_none());
    }

    #[test]
    fn lookup_returns_details_and_reasons() {
        let response = interpret("show customer 1", &snapshot());
        assert!(response.text.contains("Name: Lapsed 1"));
        assert!(response.text.contains("Churn Risk: High"));
        assert!(response.text.contains("Inactivity"));
        match response.payload {
            Some(Payload::Customer { customer }) => {
                assert_eq!(customer.summary.id, 1);
                assert_eq!(customer.factors.len(), 5);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn high_risk_lists_only_high_customers() {
        let response = interpret("show me high-risk customers", &snapshot());
        assert!(response.text.starts_with("I found 2 high-risk customers"));
        match response.payload {
            Some(Payload::Customers { customers }) => {
                let ids: Vec<i64> = customers.iter().map(|c| c.id).collect();
                assert_eq!(ids.len(), 2);
                assert!(ids.contains(&1) && ids.contains(&4));
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn high_risk_preview_is_capped() {
        let records: Vec<CustomerRecord> = (1..=8).map(lapsed).collect();
        let scored = Scorer::with_defaults(as_of()).score_all(&records);
        let response = interpret("at risk customers", &scored);
        assert!(response.text.contains("...and 3 more."));
        assert!(!response.text.contains("6. "));
    }

    #[test]
    fn no_high_risk_customers_is_good_news() {
        let scored = Scorer::with_defaults(as_of()).score_all(&[loyal(2, 3)]);
        let response = interpret("high risk customers", &scored);
        assert!(response.text.starts_with("Great news!"));
    }

    #[test]
    fn recent_activity_orders_by_last_transaction() {
        let response = interpret("recent activity", &snapshot());
        match response.payload {
            Some(Payload::Customers { customers }) => {
                let ids: Vec<i64> = customers.iter().map(|c| c.id).collect();
                assert_eq!(ids, vec![3, 2, 1, 4]);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn revenue_reports_amount_at_risk() {
        let response = interpret("total revenue please", &snapshot());
        assert!(response.text.contains("Total revenue: $2,500.00"));
        assert!(response.text.contains("Revenue at risk: $100.00"));
        assert!(response.text.contains("Share at risk: 4.0%"));
    }

    #[test]
    fn churn_rate_flags_elevated_risk() {
        let response = interpret("what's our churn rate?", &snapshot());
        assert!(response.text.contains("High-risk customers: 2 (50.0%)"));
        assert!(response.text.contains("Action needed"));
    }

    #[test]
    fn response_serializes_with_tagged_payload() {
        let response = interpret("how many customers", &snapshot());
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["intent"]["kind"], "customer-count");
        assert_eq!(json["payload"]["kind"], "stats");
        assert_eq!(json["payload"]["stats"]["total_customers"], 4);
    }
}
