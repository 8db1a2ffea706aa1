//! Transaction intelligence engine
//!
//! Every operation is a request-scoped computation over the injected
//! `BudgetStore`. The only shared state is the keyword table and the config,
//! both immutable and held behind `Arc`, so an engine is cheap to clone into
//! request handlers.
//!
//! Storage failures never surface to callers: reads degrade to empty results
//! and writes to no-ops, each logged with `warn!`.

mod anomaly;
mod classify;
mod forecast;
mod learn;
mod recommend;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::keywords::KeywordRuleTable;
use crate::models::{Category, MonthlyEntry};
use crate::period::YearMonth;
use crate::store::BudgetStore;

pub use classify::{classify_simple, normalize_description};
pub use recommend::format_brl;

/// Category suggestion, learning, anomaly, forecast and recommendation engine
#[derive(Clone)]
pub struct IntelligenceEngine<S> {
    store: S,
    keywords: Arc<KeywordRuleTable>,
    config: Arc<EngineConfig>,
}

impl<S: BudgetStore> IntelligenceEngine<S> {
    /// Build an engine; the keyword table comes from the config
    pub fn new(store: S, config: EngineConfig) -> Self {
        let keywords = Arc::new(config.keyword_table());
        Self {
            store,
            keywords,
            config: Arc::new(config),
        }
    }

    /// Build an engine with the built-in defaults
    pub fn with_defaults(store: S) -> Self {
        Self::new(store, EngineConfig::default())
    }

    /// Build an engine sharing an already constructed keyword table
    pub fn with_keywords(store: S, config: EngineConfig, keywords: Arc<KeywordRuleTable>) -> Self {
        Self {
            store,
            keywords,
            config: Arc::new(config),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn keywords(&self) -> &KeywordRuleTable {
        &self.keywords
    }

    /// A month's entries, or none if the store fails
    fn month_entries(&self, user_id: i64, period: YearMonth) -> Vec<MonthlyEntry> {
        match self.store.entries_for_month(user_id, period) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(user_id, %period, error = %e, "Entries unavailable, skipping month");
                Vec::new()
            }
        }
    }

    fn resolver(&self) -> EntryResolver<'_, S> {
        EntryResolver {
            store: &self.store,
            items: HashMap::new(),
            categories: HashMap::new(),
            skipped: 0,
        }
    }
}

/// Per-call cache for entry → item → category lookups
///
/// Entries whose item or category cannot be resolved are logged, skipped and
/// counted in `skipped`.
struct EntryResolver<'a, S> {
    store: &'a S,
    items: HashMap<i64, Option<i64>>,
    categories: HashMap<i64, Option<Category>>,
    skipped: usize,
}

impl<S: BudgetStore> EntryResolver<'_, S> {
    /// Category id of the entry's item
    fn category_id(&mut self, entry: &MonthlyEntry) -> Option<i64> {
        let store = self.store;
        let resolved = *self
            .items
            .entry(entry.item_id)
            .or_insert_with(|| match store.get_item(entry.item_id) {
                Ok(Some(item)) => Some(item.category_id),
                Ok(None) => {
                    debug!(item_id = entry.item_id, "Entry references a missing item");
                    None
                }
                Err(e) => {
                    warn!(item_id = entry.item_id, error = %e, "Item lookup failed");
                    None
                }
            });
        if resolved.is_none() {
            self.skipped += 1;
        }
        resolved
    }

    /// Full category of the entry's item
    fn category(&mut self, entry: &MonthlyEntry) -> Option<Category> {
        let category_id = self.category_id(entry)?;
        let store = self.store;
        let resolved = self
            .categories
            .entry(category_id)
            .or_insert_with(|| match store.get_category(category_id) {
                Ok(category) => {
                    if category.is_none() {
                        debug!(category_id, "Item references a missing category");
                    }
                    category
                }
                Err(e) => {
                    warn!(category_id, error = %e, "Category lookup failed");
                    None
                }
            })
            .clone();
        if resolved.is_none() {
            self.skipped += 1;
        }
        resolved
    }
}
