//! Spending anomaly detection against the trailing category average

use tracing::debug;

use super::IntelligenceEngine;
use crate::config::AnomalyOptions;
use crate::models::AnomalyCheck;
use crate::period::YearMonth;
use crate::store::BudgetStore;

impl<S: BudgetStore> IntelligenceEngine<S> {
    /// Check whether `amount` is unusually high for a category
    ///
    /// Scans the `lookback_months` before `(month, year)` for recorded actuals
    /// of the category. With fewer than `min_samples` observations nothing is
    /// flagged; otherwise the amount is anomalous when it is strictly above
    /// `average × threshold`. `options` defaults to the engine config.
    pub fn detect_anomaly(
        &self,
        user_id: i64,
        category_id: i64,
        amount: i64,
        month: u32,
        year: i32,
        options: Option<AnomalyOptions>,
    ) -> AnomalyCheck {
        let options = options.unwrap_or(self.config.anomaly);

        let Some(period) = YearMonth::new(year, month) else {
            debug!(user_id, month, year, "Invalid month, no anomaly signal");
            return AnomalyCheck::no_signal(0, 0);
        };

        let mut resolver = self.resolver();
        let mut observations: Vec<i64> = Vec::new();

        for previous in period.trailing(options.lookback_months) {
            for entry in self.month_entries(user_id, previous) {
                let Some(actual) = entry.actual_value else {
                    continue;
                };
                if resolver.category_id(&entry) == Some(category_id) {
                    observations.push(actual);
                }
            }
        }

        let samples = observations.len();
        let skipped = resolver.skipped;

        if samples == 0 || samples < options.min_samples {
            debug!(user_id, category_id, samples, skipped, "Not enough history for anomaly check");
            return AnomalyCheck::no_signal(samples, skipped);
        }

        let average = observations.iter().map(|v| *v as f64).sum::<f64>() / samples as f64;
        let is_anomalous = amount as f64 > average * options.threshold;

        debug!(
            user_id,
            category_id,
            amount,
            average,
            samples,
            skipped,
            is_anomalous,
            "Anomaly check"
        );

        AnomalyCheck {
            is_anomalous,
            average,
            samples,
            skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CategoryType;
    use crate::test_utils::MemoryStore;

    fn ym(year: i32, month: u32) -> YearMonth {
        YearMonth::new(year, month).unwrap()
    }

    struct Fixture {
        engine: IntelligenceEngine<MemoryStore>,
        store: MemoryStore,
        category: i64,
        item: i64,
    }

    fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let category = store.add_category("Lazer", CategoryType::Expense);
        let item = store.add_item(category, "Cinema");
        Fixture {
            engine: IntelligenceEngine::with_defaults(store.clone()),
            store,
            category,
            item,
        }
    }

    #[test]
    fn test_flags_spike() {
        let f = fixture();
        for (month, value) in [(2, 1000), (3, 1100), (4, 900), (5, 1050)] {
            f.store.add_actual(1, ym(2024, month), f.item, value);
        }

        let check = f.engine.detect_anomaly(1, f.category, 2500, 6, 2024, None);
        assert!(check.is_anomalous);
        assert_eq!(check.average, 1012.5);
        assert_eq!(check.samples, 4);

        let check = f.engine.detect_anomaly(1, f.category, 1500, 6, 2024, None);
        assert!(!check.is_anomalous);
    }

    #[test]
    fn test_threshold_is_strict() {
        let f = fixture();
        for month in 3..=5 {
            f.store.add_actual(1, ym(2024, month), f.item, 1000);
        }
        let check = f.engine.detect_anomaly(1, f.category, 2000, 6, 2024, None);
        assert!(!check.is_anomalous);
        assert_eq!(check.average, 1000.0);

        let check = f.engine.detect_anomaly(1, f.category, 2001, 6, 2024, None);
        assert!(check.is_anomalous);
    }

    #[test]
    fn test_too_few_samples_never_flags() {
        let f = fixture();
        f.store.add_actual(1, ym(2024, 4), f.item, 10);
        f.store.add_actual(1, ym(2024, 5), f.item, 10);

        let check = f.engine.detect_anomaly(1, f.category, 1_000_000, 6, 2024, None);
        assert!(!check.is_anomalous);
        assert_eq!(check.average, 0.0);
        assert_eq!(check.samples, 2);
    }

    #[test]
    fn test_lookback_wraps_year_and_excludes_current_month() {
        let f = fixture();
        f.store.add_actual(1, ym(2023, 11), f.item, 100);
        f.store.add_actual(1, ym(2023, 12), f.item, 100);
        f.store.add_actual(1, ym(2024, 1), f.item, 100);
        // Same month as the checked amount: not part of the baseline
        f.store.add_actual(1, ym(2024, 2), f.item, 100_000);
        // Outside the six-month window
        f.store.add_actual(1, ym(2023, 7), f.item, 100_000);

        let check = f.engine.detect_anomaly(1, f.category, 250, 2, 2024, None);
        assert_eq!(check.samples, 3);
        assert_eq!(check.average, 100.0);
        assert!(check.is_anomalous);
    }

    #[test]
    fn test_ignores_other_categories_users_and_unrecorded() {
        let f = fixture();
        let other_category = f.store.add_category("Moradia", CategoryType::Expense);
        let rent = f.store.add_item(other_category, "Aluguel");

        for month in 1..=3 {
            f.store.add_actual(1, ym(2024, month), f.item, 100);
            f.store.add_actual(1, ym(2024, month), rent, 200_000);
            f.store.add_actual(2, ym(2024, month), f.item, 1);
            f.store.add_entry(1, ym(2024, month), f.item, None, Some(50_000));
        }

        let check = f.engine.detect_anomaly(1, f.category, 150, 4, 2024, None);
        assert_eq!(check.samples, 3);
        assert_eq!(check.average, 100.0);
        assert!(!check.is_anomalous);
    }

    #[test]
    fn test_missing_items_are_skipped_and_counted() {
        let f = fixture();
        let ghost = f.store.add_item(f.category, "Fantasma");
        for month in 1..=3 {
            f.store.add_actual(1, ym(2024, month), f.item, 100);
            f.store.add_actual(1, ym(2024, month), ghost, 100);
        }
        f.store.remove_item(ghost);

        let check = f.engine.detect_anomaly(1, f.category, 500, 4, 2024, None);
        assert_eq!(check.samples, 3);
        assert_eq!(check.skipped, 3);
        assert!(check.is_anomalous);
    }

    #[test]
    fn test_custom_options() {
        let f = fixture();
        f.store.add_actual(1, ym(2024, 5), f.item, 100);

        let options = AnomalyOptions {
            threshold: 1.5,
            min_samples: 1,
            lookback_months: 1,
        };
        let check = f.engine.detect_anomaly(1, f.category, 151, 6, 2024, Some(options));
        assert!(check.is_anomalous);
    }

    #[test]
    fn test_invalid_month_is_no_signal() {
        let f = fixture();
        let check = f.engine.detect_anomaly(1, f.category, 100, 13, 2024, None);
        assert_eq!(check, AnomalyCheck::no_signal(0, 0));
        let check = f.engine.detect_anomaly(1, f.category, 100, 0, 2024, None);
        assert!(!check.is_anomalous);
    }

    #[test]
    fn test_store_unavailable_is_no_signal() {
        let f = fixture();
        for month in 1..=3 {
            f.store.add_actual(1, ym(2024, month), f.item, 100);
        }
        f.store.set_available(false);
        let check = f.engine.detect_anomaly(1, f.category, 10_000, 4, 2024, None);
        assert!(!check.is_anomalous);
        assert_eq!(check.samples, 0);
    }
}
