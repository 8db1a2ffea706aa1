//! Cash-flow forecasting
//!
//! A flat moving average: the mean monthly net over the last `n` months is
//! projected unchanged over the next `n`. No trend or seasonality.

use tracing::debug;

use super::IntelligenceEngine;
use crate::models::ForecastPoint;
use crate::period::YearMonth;
use crate::store::BudgetStore;

impl<S: BudgetStore> IntelligenceEngine<S> {
    /// Forecast the next `n_months` from the current calendar month
    pub fn forecast_cash_flow(&self, user_id: i64, n_months: u32) -> Vec<ForecastPoint> {
        self.forecast_cash_flow_from(user_id, n_months, YearMonth::current())
    }

    /// Forecast the next `n_months` after `current`
    ///
    /// Returns an empty list when `n_months` is 0 or no actual was recorded in
    /// the `n_months` ending at `current`.
    pub fn forecast_cash_flow_from(
        &self,
        user_id: i64,
        n_months: u32,
        current: YearMonth,
    ) -> Vec<ForecastPoint> {
        if n_months == 0 {
            return Vec::new();
        }

        let mut resolver = self.resolver();
        let mut nets: Vec<i64> = Vec::with_capacity(n_months as usize);
        let mut recorded = 0usize;

        for period in current.window_ending(n_months) {
            let mut income = 0i64;
            let mut outflow = 0i64;
            for entry in self.month_entries(user_id, period) {
                let Some(actual) = entry.actual_value else {
                    continue;
                };
                let Some(category) = resolver.category(&entry) else {
                    continue;
                };
                recorded += 1;
                if category.category_type.is_outflow() {
                    outflow = outflow.saturating_add(actual);
                } else {
                    income = income.saturating_add(actual);
                }
            }
            nets.push(income.saturating_sub(outflow));
        }

        if recorded == 0 {
            debug!(user_id, n_months, "No recorded history, empty forecast");
            return Vec::new();
        }

        let total: i128 = nets.iter().map(|n| *n as i128).sum();
        let predicted_balance = (total as f64 / nets.len() as f64).round() as i64;

        debug!(
            user_id,
            n_months,
            predicted_balance,
            skipped = resolver.skipped,
            "Cash-flow forecast"
        );

        current
            .upcoming(n_months)
            .map(|period| ForecastPoint {
                month: period.month(),
                year: period.year(),
                predicted_balance,
            })
            .collect()
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
        salary: i64,
        rent: i64,
        savings: i64,
    }

    fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let income = store.add_category("Salário", CategoryType::Income);
        let housing = store.add_category("Moradia", CategoryType::Expense);
        let invest = store.add_category("Investimento", CategoryType::Investment);
        Fixture {
            engine: IntelligenceEngine::with_defaults(store.clone()),
            salary: store.add_item(income, "Salário"),
            rent: store.add_item(housing, "Aluguel"),
            savings: store.add_item(invest, "Tesouro"),
            store,
        }
    }

    #[test]
    fn test_flat_projection_with_year_rollover() {
        let f = fixture();
        let current = ym(2024, 1);
        // Nets: Nov 3000, Dec 1000, Jan 2000
        f.store.add_actual(1, ym(2023, 11), f.salary, 5000);
        f.store.add_actual(1, ym(2023, 11), f.rent, 2000);
        f.store.add_actual(1, ym(2023, 12), f.salary, 5000);
        f.store.add_actual(1, ym(2023, 12), f.rent, 2000);
        f.store.add_actual(1, ym(2023, 12), f.savings, 2000);
        f.store.add_actual(1, current, f.salary, 4000);
        f.store.add_actual(1, current, f.rent, 2000);

        let points = f.engine.forecast_cash_flow_from(1, 3, current);
        assert_eq!(points.len(), 3);
        assert_eq!(
            points
                .iter()
                .map(|p| (p.month, p.year))
                .collect::<Vec<_>>(),
            vec![(2, 2024), (3, 2024), (4, 2024)]
        );
        assert!(points.iter().all(|p| p.predicted_balance == 2000));
    }

    #[test]
    fn test_projection_crosses_into_next_year() {
        let f = fixture();
        let current = ym(2024, 11);
        f.store.add_actual(1, current, f.salary, 100);

        let points = f.engine.forecast_cash_flow_from(1, 3, current);
        let months: Vec<_> = points.iter().map(|p| (p.month, p.year)).collect();
        assert_eq!(months, vec![(12, 2024), (1, 2025), (2, 2025)]);
        // Empty months count as zero net: round(100 / 3)
        assert!(points.iter().all(|p| p.predicted_balance == 33));
    }

    #[test]
    fn test_zero_months_is_empty() {
        let f = fixture();
        f.store.add_actual(1, ym(2024, 1), f.salary, 100);
        assert!(f.engine.forecast_cash_flow_from(1, 0, ym(2024, 1)).is_empty());
    }

    #[test]
    fn test_no_history_is_empty() {
        let f = fixture();
        // Only planned values, and another user's actuals
        f.store.add_entry(1, ym(2024, 1), f.salary, None, Some(5000));
        f.store.add_actual(2, ym(2024, 1), f.salary, 5000);
        assert!(f.engine.forecast_cash_flow_from(1, 3, ym(2024, 1)).is_empty());
    }

    #[test]
    fn test_negative_forecast_rounds() {
        let f = fixture();
        let current = ym(2024, 6);
        f.store.add_actual(1, ym(2024, 5), f.rent, 1001);
        f.store.add_actual(1, current, f.rent, 1000);

        let points = f.engine.forecast_cash_flow_from(1, 2, current);
        assert_eq!(points.len(), 2);
        // mean(-1001, -1000) = -1000.5, rounded away from zero
        assert!(points.iter().all(|p| p.predicted_balance == -1001));
    }

    #[test]
    fn test_uses_local_clock() {
        let f = fixture();
        f.store.add_actual(1, YearMonth::current(), f.salary, 900);
        let points = f.engine.forecast_cash_flow(1, 1);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].predicted_balance, 900);
    }
}
