//! Learning from user decisions, and summary stats over what was learned

use std::collections::HashMap;

use tracing::{debug, warn};

use super::classify::normalize_description;
use super::IntelligenceEngine;
use crate::error::Result;
use crate::models::{
    ClassificationSource, ClassificationStats, ConfidenceUpdate, NewClassificationRecord,
    TopCategory,
};
use crate::store::BudgetStore;

/// Outcome of one read-modify-write attempt
enum Attempt {
    Done,
    Conflict,
}

impl<S: BudgetStore> IntelligenceEngine<S> {
    /// Record that `description` belongs to `category_id` for this user
    ///
    /// Repeating the same decision raises confidence by the confirmation step
    /// up to the cap. Best-effort: storage failures are logged and swallowed.
    pub fn learn(
        &self,
        user_id: i64,
        description: &str,
        amount: i64,
        category_id: i64,
        source: ClassificationSource,
    ) {
        let normalized = normalize_description(description);
        if normalized.is_empty() {
            debug!(user_id, "Ignoring empty description");
            return;
        }

        let max_attempts = self.config.learning.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            match self.try_learn(user_id, &normalized, amount, category_id, source) {
                Ok(Attempt::Done) => return,
                Ok(Attempt::Conflict) => {
                    debug!(user_id, category_id, attempt, "Concurrent confirmation, retrying");
                }
                Err(e) => {
                    warn!(user_id, category_id, error = %e, "Failed to learn classification");
                    return;
                }
            }
        }

        warn!(
            user_id,
            category_id, max_attempts, "Gave up learning classification after repeated conflicts"
        );
    }

    fn try_learn(
        &self,
        user_id: i64,
        normalized: &str,
        amount: i64,
        category_id: i64,
        source: ClassificationSource,
    ) -> Result<Attempt> {
        let tuning = &self.config.learning;

        let existing = self
            .store
            .list_classification_history(user_id)?
            .into_iter()
            .find(|r| r.description == normalized && r.category_id == category_id);

        match existing {
            Some(record) => {
                let confidence = (record.confidence + tuning.confirmation_step)
                    .min(tuning.max_confidence)
                    .max(record.confidence);
                let update = ConfidenceUpdate {
                    confidence,
                    confirmations: record.confirmations + 1,
                };
                if self
                    .store
                    .update_classification_record(record.id, record.confirmations, update)?
                {
                    debug!(
                        user_id,
                        category_id,
                        confidence,
                        confirmations = update.confirmations,
                        "Confirmed learned classification"
                    );
                    Ok(Attempt::Done)
                } else {
                    Ok(Attempt::Conflict)
                }
            }
            None => {
                let confidence = match source {
                    ClassificationSource::Confirmed => tuning.confirmed_initial_confidence,
                    ClassificationSource::Manual => tuning.manual_initial_confidence,
                };
                let record = NewClassificationRecord {
                    user_id,
                    description: normalized.to_string(),
                    amount,
                    category_id,
                    confidence,
                    confirmations: 1,
                    source,
                };
                match self.store.insert_classification_record(&record)? {
                    Some(id) => {
                        debug!(user_id, category_id, id, confidence, "Learned new classification");
                        Ok(Attempt::Done)
                    }
                    // Someone inserted it first; next attempt takes the update path
                    None => Ok(Attempt::Conflict),
                }
            }
        }
    }

    /// Summary of the user's learned history
    pub fn classification_stats(&self, user_id: i64) -> ClassificationStats {
        let tuning = &self.config.stats;

        let records = match self.store.list_classification_history(user_id) {
            Ok(records) => records,
            Err(e) => {
                warn!(user_id, error = %e, "Classification history unavailable");
                return ClassificationStats::default();
            }
        };

        let high_confidence_count = records
            .iter()
            .filter(|r| r.confidence >= tuning.high_confidence_threshold)
            .count();

        // Summed confirmations per category, first-seen order for stable ties
        let mut order: Vec<i64> = Vec::new();
        let mut totals: HashMap<i64, i64> = HashMap::new();
        for record in &records {
            let total = totals.entry(record.category_id).or_insert_with(|| {
                order.push(record.category_id);
                0
            });
            *total += record.confirmations;
        }

        let mut ranked: Vec<(i64, i64)> = order.into_iter().map(|id| (id, totals[&id])).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        let mut top_categories = Vec::new();
        for (category_id, confirmations) in ranked {
            if top_categories.len() >= tuning.top_categories {
                break;
            }
            match self.store.get_category(category_id) {
                Ok(Some(category)) => top_categories.push(TopCategory {
                    category_id,
                    name: category.name,
                    confirmations,
                }),
                Ok(None) => debug!(user_id, category_id, "Skipping deleted category in stats"),
                Err(e) => warn!(user_id, category_id, error = %e, "Category lookup failed"),
            }
        }

        ClassificationStats {
            total_classifications: records.len(),
            high_confidence_count,
            top_categories,
        }
    }
}
