//! Rule-based recommendations and LLM-phrased insight reports

use std::collections::HashMap;

use tracing::{debug, warn};

use super::IntelligenceEngine;
use crate::models::{CategoryType, InsightReport};
use crate::period::YearMonth;
use crate::phraser::InsightPhraser;
use crate::store::BudgetStore;

/// Format cents as Brazilian reais, e.g. `R$ 1.234,56`
pub fn format_brl(cents: i64) -> String {
    let abs = cents.unsigned_abs();
    let reais = (abs / 100).to_string();
    let fraction = abs % 100;

    let mut grouped = String::with_capacity(reais.len() + reais.len() / 3);
    for (i, digit) in reais.chars().enumerate() {
        if i > 0 && (reais.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if cents < 0 { "-" } else { "" };
    format!("{}R$ {},{:02}", sign, grouped, fraction)
}

/// `2.0` → "2", `2.5` → "2,5"
fn format_multiplier(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.1}", value).replace('.', ",")
    }
}

/// Spend accumulated for one expense category
#[derive(Default)]
struct CategorySpend {
    name: String,
    /// Sum of the per-month totals over months with an observation
    baseline_total: i64,
    baseline_months: usize,
    current_total: i64,
    current_recorded: bool,
}

impl<S: BudgetStore> IntelligenceEngine<S> {
    /// Advisory messages for the current calendar month
    pub fn generate_recommendations(&self, user_id: i64) -> Vec<String> {
        self.generate_recommendations_from(user_id, YearMonth::current())
    }

    /// Advisory messages for `current`
    ///
    /// Warns for each expense category whose spend this month exceeds the
    /// trailing mean by the configured multiplier (categories without history
    /// never warn), plus one warning when the forecast turns negative.
    pub fn generate_recommendations_from(&self, user_id: i64, current: YearMonth) -> Vec<String> {
        let tuning = &self.config.recommendations;
        let mut resolver = self.resolver();
        let mut spend: HashMap<i64, CategorySpend> = HashMap::new();

        for period in current.trailing(tuning.window_months) {
            let mut month_totals: HashMap<i64, i64> = HashMap::new();
            for entry in self.month_entries(user_id, period) {
                let Some(actual) = entry.actual_value else {
                    continue;
                };
                let Some(category) = resolver.category(&entry) else {
                    continue;
                };
                if category.category_type != CategoryType::Expense {
                    continue;
                }
                let total = month_totals.entry(category.id).or_insert(0);
                *total = total.saturating_add(actual);
                spend.entry(category.id).or_default().name = category.name;
            }
            for (category_id, total) in month_totals {
                let slot = spend.entry(category_id).or_default();
                slot.baseline_total = slot.baseline_total.saturating_add(total);
                slot.baseline_months += 1;
            }
        }

        for entry in self.month_entries(user_id, current) {
            let Some(actual) = entry.actual_value else {
                continue;
            };
            let Some(category) = resolver.category(&entry) else {
                continue;
            };
            if category.category_type != CategoryType::Expense {
                continue;
            }
            let slot = spend.entry(category.id).or_default();
            slot.name = category.name;
            slot.current_total = slot.current_total.saturating_add(actual);
            slot.current_recorded = true;
        }

        let mut flagged: Vec<&CategorySpend> = spend
            .values()
            .filter(|s| s.current_recorded && s.baseline_months > 0)
            .filter(|s| {
                let mean = s.baseline_total as f64 / s.baseline_months as f64;
                s.current_total as f64 > mean * tuning.overspend_multiplier
            })
            .collect();
        flagged.sort_by(|a, b| a.name.cmp(&b.name));

        let mut recommendations: Vec<String> = flagged
            .into_iter()
            .map(|s| {
                let mean = (s.baseline_total as f64 / s.baseline_months as f64).round() as i64;
                format!(
                    "Seus gastos com {} em {} somam {}, mais de {}x a média dos últimos {} meses ({}). Considere revisar essa categoria.",
                    s.name,
                    current,
                    format_brl(s.current_total),
                    format_multiplier(tuning.overspend_multiplier),
                    tuning.window_months,
                    format_brl(mean),
                )
            })
            .collect();

        let forecast = self.forecast_cash_flow_from(user_id, tuning.forecast_months, current);
        if let Some(point) = forecast.iter().find(|p| p.predicted_balance < 0) {
            recommendations.push(format!(
                "Atenção: a previsão de fluxo de caixa para os próximos {} meses é negativa ({} por mês). Reduza despesas ou reforce suas receitas.",
                tuning.forecast_months,
                format_brl(point.predicted_balance),
            ));
        }

        if resolver.skipped > 0 {
            debug!(user_id, skipped = resolver.skipped, "Skipped unresolvable entries");
        }
        debug!(user_id, count = recommendations.len(), "Generated recommendations");
        recommendations
    }

    /// Recommendations for the current month, phrased into a narrative when a phraser is given
    pub async fn generate_insights(
        &self,
        user_id: i64,
        phraser: Option<&dyn InsightPhraser>,
    ) -> InsightReport {
        self.generate_insights_from(user_id, YearMonth::current(), phraser)
            .await
    }

    /// Recommendations for `current`, phrased into a narrative when a phraser is given
    ///
    /// Phrasing failures are logged and leave `narrative` empty; the
    /// recommendations are always returned.
    pub async fn generate_insights_from(
        &self,
        user_id: i64,
        current: YearMonth,
        phraser: Option<&dyn InsightPhraser>,
    ) -> InsightReport {
        let recommendations = self.generate_recommendations_from(user_id, current);

        let narrative = match phraser {
            Some(phraser) if !recommendations.is_empty() => {
                match phraser.phrase(&recommendations).await {
                    Ok(text) => Some(text),
                    Err(e) => {
                        warn!(user_id, error = %e, "Insight phrasing failed");
                        None
                    }
                }
            }
            _ => None,
        };

        InsightReport {
            recommendations,
            narrative,
        }
    }
}
