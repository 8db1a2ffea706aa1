//! Domain models for Fina

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of money movement a category represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    Income,
    Expense,
    Investment,
}

impl CategoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Investment => "investment",
        }
    }

    /// Money leaving the budget (expenses and investments both reduce cash flow)
    pub fn is_outflow(&self) -> bool {
        matches!(self, Self::Expense | Self::Investment)
    }
}

impl std::str::FromStr for CategoryType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            "investment" => Ok(Self::Investment),
            _ => Err(format!("Unknown category type: {}", s)),
        }
    }
}

impl std::fmt::Display for CategoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A budget category (owned by the storage layer, read-only for the engine)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub category_type: CategoryType,
}

/// A budget item; entries are recorded against items, items belong to a category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
}

/// Planned/actual values of one item for one month, in cents
///
/// `actual_value` is `None` until the user records what was actually spent or received.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyEntry {
    pub item_id: i64,
    pub actual_value: Option<i64>,
    pub planned_value: Option<i64>,
}

/// How a learned classification entered the history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationSource {
    /// User picked the category by hand
    Manual,
    /// User accepted one of the engine's suggestions
    Confirmed,
}

impl ClassificationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Confirmed => "confirmed",
        }
    }
}

impl std::str::FromStr for ClassificationSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "confirmed" => Ok(Self::Confirmed),
            _ => Err(format!("Unknown classification source: {}", s)),
        }
    }
}

impl std::fmt::Display for ClassificationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One learned description→category mapping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationRecord {
    pub id: i64,
    pub user_id: i64,
    /// Trimmed, lower-cased description
    pub description: String,
    /// Signed amount in cents at capture time
    pub amount: i64,
    pub category_id: i64,
    /// 0..=100, never decreases
    pub confidence: i64,
    pub confirmations: i64,
    pub source: ClassificationSource,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A classification record to insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewClassificationRecord {
    pub user_id: i64,
    pub description: String,
    pub amount: i64,
    pub category_id: i64,
    pub confidence: i64,
    pub confirmations: i64,
    pub source: ClassificationSource,
}

/// New confidence/confirmation values for an existing record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfidenceUpdate {
    pub confidence: i64,
    pub confirmations: i64,
}

/// Where a suggestion came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionSource {
    /// Category given explicitly by the caller
    Provided,
    /// Matched against the user's learned history
    History,
    /// Matched a keyword rule
    Keyword,
    /// Nothing matched; generic income/expense/investment bucket
    Fallback,
}

impl SuggestionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Provided => "provided",
            Self::History => "history",
            Self::Keyword => "keyword",
            Self::Fallback => "fallback",
        }
    }
}

/// A ranked category suggestion (not persisted)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub category_name: String,
    pub category_type: CategoryType,
    pub confidence: u8,
    pub source: SuggestionSource,
}

impl Suggestion {
    pub fn new(
        category_name: impl Into<String>,
        category_type: CategoryType,
        confidence: u8,
        source: SuggestionSource,
    ) -> Self {
        Self {
            category_name: category_name.into(),
            category_type,
            confidence,
            source,
        }
    }
}

/// Projected net cash flow for a future month, in cents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub month: u32,
    pub year: i32,
    pub predicted_balance: i64,
}

/// Result of comparing an amount against its category's trailing average
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyCheck {
    pub is_anomalous: bool,
    /// Mean of the trailing observations (0 when there were too few)
    pub average: f64,
    /// Number of trailing observations found
    pub samples: usize,
    /// Entries skipped because their item could not be resolved
    pub skipped: usize,
}

impl AnomalyCheck {
    /// The "not enough evidence" result
    pub fn no_signal(samples: usize, skipped: usize) -> Self {
        Self {
            is_anomalous: false,
            average: 0.0,
            samples,
            skipped,
        }
    }
}

/// Category ranked by how often the user confirmed it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopCategory {
    pub category_id: i64,
    pub name: String,
    pub confirmations: i64,
}

/// Summary of a user's learned classification history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationStats {
    pub total_classifications: usize,
    pub high_confidence_count: usize,
    pub top_categories: Vec<TopCategory>,
}

/// Rule-based recommendations plus an optional LLM-phrased narrative
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightReport {
    pub recommendations: Vec<String>,
    pub narrative: Option<String>,
}
