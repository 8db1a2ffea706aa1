//! Fina Core Library
//!
//! Transaction intelligence for the Fina budgeting tool:
//! - Category suggestions from learned history, keyword rules and fallbacks
//! - Learning from the user's confirmations and corrections
//! - Spending anomaly detection against the trailing category average
//! - Flat moving-average cash-flow forecasting
//! - Rule-based recommendations, optionally phrased by a local LLM
//! - SQLite storage adapter behind the `BudgetStore` port

pub mod config;
pub mod db;
pub mod error;
pub mod intelligence;
pub mod keywords;
pub mod models;
pub mod period;
pub mod phraser;
pub mod store;

/// Test utilities including an in-memory store and a mock Ollama server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{AnomalyOptions, EngineConfig};
pub use db::Database;
pub use error::{Error, Result};
pub use intelligence::IntelligenceEngine;
pub use keywords::{KeywordRule, KeywordRuleTable};
pub use models::{
    AnomalyCheck, Category, CategoryType, ClassificationRecord, ClassificationSource,
    ClassificationStats, ForecastPoint, InsightReport, Item, MonthlyEntry, Suggestion,
    SuggestionSource,
};
pub use period::YearMonth;
pub use phraser::{InsightPhraser, OllamaPhraser};
pub use store::BudgetStore;
