//! Similarity scoring and suggestion ranking

use std::collections::HashSet;

use tracing::{debug, warn};

use super::IntelligenceEngine;
use crate::config::ClassificationTuning;
use crate::keywords::{mentions_investment, KeywordRuleTable};
use crate::models::{CategoryType, ClassificationRecord, Suggestion, SuggestionSource};
use crate::store::BudgetStore;

/// Canonical form used for storage and comparison (trimmed, lower-cased)
pub fn normalize_description(description: &str) -> String {
    description.trim().to_lowercase()
}

/// Suggestion for a caller-provided category name, if non-blank
fn provided_suggestion(provided_category: Option<&str>, amount: i64) -> Option<Suggestion> {
    let name = provided_category.map(str::trim).filter(|n| !n.is_empty())?;
    let category_type = if mentions_investment(name) {
        CategoryType::Investment
    } else if amount > 0 {
        CategoryType::Income
    } else {
        CategoryType::Expense
    };
    Some(Suggestion::new(
        name,
        category_type,
        100,
        SuggestionSource::Provided,
    ))
}

/// Generic bucket used when nothing else matched
fn fallback_suggestion(description: &str, amount: i64, confidence: u8) -> Suggestion {
    let (name, category_type) = if amount > 0 {
        ("Receita", CategoryType::Income)
    } else if mentions_investment(description) {
        ("Investimento", CategoryType::Investment)
    } else {
        ("Despesa", CategoryType::Expense)
    };
    Suggestion::new(name, category_type, confidence, SuggestionSource::Fallback)
}

/// Single-result classification without any per-user history
///
/// Applies the provided-category override, then the first keyword hit, then
/// the generic fallback. Needs no store.
pub fn classify_simple(
    keywords: &KeywordRuleTable,
    tuning: &ClassificationTuning,
    description: &str,
    amount: i64,
    provided_category: Option<&str>,
) -> Suggestion {
    if let Some(suggestion) = provided_suggestion(provided_category, amount) {
        return suggestion;
    }

    let normalized = normalize_description(description);
    keywords
        .first_candidate(&normalized, amount, tuning.keyword_confidence)
        .unwrap_or_else(|| fallback_suggestion(&normalized, amount, tuning.fallback_confidence))
}

/// Relative amount difference is inside the proximity band
fn amounts_close(tuning: &ClassificationTuning, amount: i64, recorded: i64) -> bool {
    let largest = amount.unsigned_abs().max(recorded.unsigned_abs());
    if largest == 0 {
        return false;
    }
    let diff = amount.abs_diff(recorded) as f64;
    diff / (largest as f64) < tuning.amount_proximity_band
}

/// Score how well a candidate matches one learned record (0..=100)
///
/// `tokens` are the whitespace tokens of `normalized`.
fn match_score(
    tuning: &ClassificationTuning,
    normalized: &str,
    tokens: &[&str],
    amount: i64,
    record: &ClassificationRecord,
) -> f64 {
    let textual = if record.description == normalized {
        tuning.exact_match_score
    } else {
        let record_tokens: HashSet<&str> = record.description.split_whitespace().collect();
        let longest = tokens.len().max(record_tokens.len());
        if longest == 0 {
            0.0
        } else {
            let common = tokens.iter().filter(|t| record_tokens.contains(*t)).count();
            common as f64 / longest as f64 * tuning.word_overlap_weight
        }
    };

    let bonus = if amounts_close(tuning, amount, record.amount) {
        tuning.amount_proximity_bonus
    } else {
        0.0
    };

    textual + bonus
}

/// Best-matching record for one category
struct CategoryMatch<'a> {
    record: &'a ClassificationRecord,
    score: f64,
}

impl CategoryMatch<'_> {
    fn combined(&self) -> f64 {
        self.score * self.record.confidence as f64 / 100.0
    }

    fn confidence(&self) -> u8 {
        (self.record.confidence as f64 * self.score / 100.0)
            .round()
            .clamp(0.0, 100.0) as u8
    }
}

/// Dedupe by category name (first wins), stable sort by confidence, truncate
fn finalize(suggestions: Vec<Suggestion>, limit: usize) -> Vec<Suggestion> {
    let mut seen = HashSet::new();
    let mut ranked: Vec<Suggestion> = suggestions
        .into_iter()
        .filter(|s| seen.insert(s.category_name.clone()))
        .collect();
    ranked.sort_by(|a, b| b.confidence.cmp(&a.confidence));
    ranked.truncate(limit);
    ranked
}

impl<S: BudgetStore> IntelligenceEngine<S> {
    /// Ranked category suggestions for a transaction (at most `max_suggestions`)
    pub fn classify(
        &self,
        user_id: i64,
        description: &str,
        amount: i64,
        provided_category: Option<&str>,
    ) -> Vec<Suggestion> {
        if let Some(suggestion) = provided_suggestion(provided_category, amount) {
            debug!(user_id, category = %suggestion.category_name, "Using provided category");
            return vec![suggestion];
        }

        let tuning = &self.config.classification;
        let normalized = normalize_description(description);

        let mut suggestions = self.history_suggestions(user_id, &normalized, amount);

        for candidate in self
            .keywords
            .candidates(&normalized, amount, tuning.keyword_confidence)
        {
            if !suggestions
                .iter()
                .any(|s| s.category_name == candidate.category_name)
            {
                suggestions.push(candidate);
            }
        }

        if suggestions.is_empty() {
            suggestions.push(fallback_suggestion(
                &normalized,
                amount,
                tuning.fallback_confidence,
            ));
        }

        let ranked = finalize(suggestions, tuning.max_suggestions);
        debug!(user_id, count = ranked.len(), "Classified transaction");
        ranked
    }

    /// Single-result classification (no history consulted)
    pub fn classify_simple(
        &self,
        description: &str,
        amount: i64,
        provided_category: Option<&str>,
    ) -> Suggestion {
        classify_simple(
            &self.keywords,
            &self.config.classification,
            description,
            amount,
            provided_category,
        )
    }

    /// Suggestions from the user's learned history, best combined score first
    fn history_suggestions(&self, user_id: i64, normalized: &str, amount: i64) -> Vec<Suggestion> {
        let tuning = &self.config.classification;

        let records = match self.store.list_classification_history(user_id) {
            Ok(records) => records,
            Err(e) => {
                warn!(user_id, error = %e, "Classification history unavailable, skipping");
                return Vec::new();
            }
        };

        let tokens: Vec<&str> = normalized.split_whitespace().collect();

        // Best record per category, in first-seen order
        let mut best: Vec<(i64, CategoryMatch)> = Vec::new();
        for record in &records {
            let score = match_score(tuning, normalized, &tokens, amount, record);
            if score <= tuning.min_match_score {
                continue;
            }
            match best.iter_mut().find(|(id, _)| *id == record.category_id) {
                Some((_, current)) if score > current.score => {
                    *current = CategoryMatch { record, score };
                }
                Some(_) => {}
                None => best.push((record.category_id, CategoryMatch { record, score })),
            }
        }

        best.sort_by(|(_, a), (_, b)| b.combined().total_cmp(&a.combined()));
        best.truncate(tuning.max_suggestions);

        let mut suggestions = Vec::with_capacity(best.len());
        let mut skipped = 0usize;
        for (category_id, matched) in &best {
            match self.store.get_category(*category_id) {
                Ok(Some(category)) => suggestions.push(Suggestion::new(
                    category.name,
                    category.category_type,
                    matched.confidence(),
                    SuggestionSource::History,
                )),
                Ok(None) => {
                    debug!(user_id, category_id, "Learned category no longer exists");
                    skipped += 1;
                }
                Err(e) => {
                    warn!(user_id, category_id, error = %e, "Category lookup failed");
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            debug!(user_id, skipped, "Skipped unresolvable history categories");
        }
        suggestions
    }
}
