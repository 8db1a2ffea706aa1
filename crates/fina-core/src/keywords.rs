//! Keyword rule table for category suggestions
//!
//! A static, ordered mapping from lower-case substrings to canonical category
//! names. The table is built once (built-in defaults or the `[[keywords]]`
//! section of the engine config) and shared read-only across requests.

use serde::Deserialize;

use crate::models::{CategoryType, Suggestion, SuggestionSource};

/// Built-in rules: (keyword, category name, implied type)
///
/// Order matters for the single-result classifier, which takes the first hit.
const BUILTIN_RULES: &[(&str, &str, CategoryType)] = &[
    // Food
    ("ifood", "Restaurante", CategoryType::Expense),
    ("rappi", "Restaurante", CategoryType::Expense),
    ("restaurante", "Restaurante", CategoryType::Expense),
    ("lanchonete", "Restaurante", CategoryType::Expense),
    ("padaria", "Restaurante", CategoryType::Expense),
    ("supermercado", "Supermercado", CategoryType::Expense),
    ("mercado", "Supermercado", CategoryType::Expense),
    ("carrefour", "Supermercado", CategoryType::Expense),
    ("assai", "Supermercado", CategoryType::Expense),
    ("atacadao", "Supermercado", CategoryType::Expense),
    // Transport
    ("posto", "Combustível", CategoryType::Expense),
    ("shell", "Combustível", CategoryType::Expense),
    ("ipiranga", "Combustível", CategoryType::Expense),
    ("gasolina", "Combustível", CategoryType::Expense),
    ("combustivel", "Combustível", CategoryType::Expense),
    ("combustível", "Combustível", CategoryType::Expense),
    ("uber", "Transporte", CategoryType::Expense),
    ("taxi", "Transporte", CategoryType::Expense),
    ("metro", "Transporte", CategoryType::Expense),
    ("metrô", "Transporte", CategoryType::Expense),
    ("onibus", "Transporte", CategoryType::Expense),
    ("ônibus", "Transporte", CategoryType::Expense),
    ("estacionamento", "Transporte", CategoryType::Expense),
    // Health
    ("farmacia", "Saúde", CategoryType::Expense),
    ("farmácia", "Saúde", CategoryType::Expense),
    ("drogaria", "Saúde", CategoryType::Expense),
    ("hospital", "Saúde", CategoryType::Expense),
    ("consulta", "Saúde", CategoryType::Expense),
    ("academia", "Saúde", CategoryType::Expense),
    // Home
    ("aluguel", "Moradia", CategoryType::Expense),
    ("condominio", "Moradia", CategoryType::Expense),
    ("condomínio", "Moradia", CategoryType::Expense),
    ("energia", "Contas da Casa", CategoryType::Expense),
    ("enel", "Contas da Casa", CategoryType::Expense),
    ("sabesp", "Contas da Casa", CategoryType::Expense),
    ("internet", "Contas da Casa", CategoryType::Expense),
    // Subscriptions
    ("netflix", "Assinaturas", CategoryType::Expense),
    ("spotify", "Assinaturas", CategoryType::Expense),
    ("disney", "Assinaturas", CategoryType::Expense),
    ("amazon prime", "Assinaturas", CategoryType::Expense),
    // Education
    ("escola", "Educação", CategoryType::Expense),
    ("faculdade", "Educação", CategoryType::Expense),
    ("curso", "Educação", CategoryType::Expense),
    // Income
    ("salario", "Salário", CategoryType::Income),
    ("salário", "Salário", CategoryType::Income),
    ("freela", "Renda Extra", CategoryType::Income),
    ("reembolso", "Renda Extra", CategoryType::Income),
    // Investments
    ("tesouro", "Investimento", CategoryType::Investment),
    ("cdb", "Investimento", CategoryType::Investment),
    ("aplicacao", "Investimento", CategoryType::Investment),
    ("aplicação", "Investimento", CategoryType::Investment),
    ("invest", "Investimento", CategoryType::Investment),
];

/// True when a category name or description refers to investments
pub(crate) fn mentions_investment(text: &str) -> bool {
    text.to_lowercase().contains("invest")
}

/// Resolve the final type for a keyword hit
///
/// Investment-named categories always stay investments; otherwise a positive
/// amount means money came in.
pub(crate) fn resolve_type(category_name: &str, implied: CategoryType, amount: i64) -> CategoryType {
    if mentions_investment(category_name) {
        CategoryType::Investment
    } else if amount > 0 {
        CategoryType::Income
    } else {
        implied
    }
}

/// A single keyword rule
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeywordRule {
    /// Lower-case substring matched against the description
    pub keyword: String,
    pub category_name: String,
    #[serde(rename = "type")]
    pub implied_type: CategoryType,
}

/// Immutable, ordered keyword rule table
#[derive(Debug, Clone)]
pub struct KeywordRuleTable {
    rules: Vec<KeywordRule>,
}

impl Default for KeywordRuleTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl KeywordRuleTable {
    /// Build a table from rules; keywords are lower-cased and empty ones dropped
    pub fn new(rules: Vec<KeywordRule>) -> Self {
        let rules = rules
            .into_iter()
            .filter_map(|rule| {
                let keyword = rule.keyword.trim().to_lowercase();
                if keyword.is_empty() {
                    None
                } else {
                    Some(KeywordRule { keyword, ..rule })
                }
            })
            .collect();
        Self { rules }
    }

    /// The built-in pt-BR rule set
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_RULES
                .iter()
                .map(|(keyword, category_name, implied_type)| KeywordRule {
                    keyword: keyword.to_string(),
                    category_name: category_name.to_string(),
                    implied_type: *implied_type,
                })
                .collect(),
        )
    }

    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// All rules whose keyword occurs in the description, in table order
    pub fn matching<'a>(&'a self, description: &str) -> impl Iterator<Item = &'a KeywordRule> {
        let lowered = description.to_lowercase();
        self.rules
            .iter()
            .filter(move |rule| lowered.contains(&rule.keyword))
    }

    /// One suggestion per distinct matched category, in table order
    pub fn candidates(&self, description: &str, amount: i64, confidence: u8) -> Vec<Suggestion> {
        let mut suggestions: Vec<Suggestion> = Vec::new();
        for rule in self.matching(description) {
            if suggestions
                .iter()
                .any(|s| s.category_name == rule.category_name)
            {
                continue;
            }
            suggestions.push(Suggestion::new(
                rule.category_name.clone(),
                resolve_type(&rule.category_name, rule.implied_type, amount),
                confidence,
                SuggestionSource::Keyword,
            ));
        }
        suggestions
    }

    /// The first matching rule as a suggestion
    pub fn first_candidate(&self, description: &str, amount: i64, confidence: u8) -> Option<Suggestion> {
        self.matching(description).next().map(|rule| {
            Suggestion::new(
                rule.category_name.clone(),
                resolve_type(&rule.category_name, rule.implied_type, amount),
                confidence,
                SuggestionSource::Keyword,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_is_lowercase() {
        let table = KeywordRuleTable::builtin();
        assert!(!table.is_empty());
        for rule in table.rules() {
            assert_eq!(rule.keyword, rule.keyword.to_lowercase());
        }
    }

    #[test]
    fn test_case_insensitive_match() {
        let table = KeywordRuleTable::builtin();
        let candidates = table.candidates("IFOOD *Almoço", -4500, 70);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].category_name, "Restaurante");
        assert_eq!(candidates[0].category_type, CategoryType::Expense);
        assert_eq!(candidates[0].confidence, 70);
        assert_eq!(candidates[0].source, SuggestionSource::Keyword);
    }

    #[test]
    fn test_duplicate_categories_collapse() {
        let table = KeywordRuleTable::builtin();
        // "posto" and "shell" both map to Combustível
        let candidates = table.candidates("posto shell", -20000, 70);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].category_name, "Combustível");
    }

    #[test]
    fn test_multiple_distinct_matches() {
        let table = KeywordRuleTable::builtin();
        let candidates = table.candidates("uber para o restaurante", -3000, 70);
        let names: Vec<_> = candidates.iter().map(|s| s.category_name.as_str()).collect();
        assert_eq!(names, vec!["Restaurante", "Transporte"]);
    }

    #[test]
    fn test_positive_amount_overrides_type() {
        let table = KeywordRuleTable::builtin();
        let candidates = table.candidates("reembolso uber", 3000, 70);
        assert!(candidates
            .iter()
            .all(|s| s.category_type == CategoryType::Income));
    }

    #[test]
    fn test_investment_name_wins_over_sign() {
        let table = KeywordRuleTable::builtin();
        let candidate = table.first_candidate("resgate tesouro selic", 150000, 70).unwrap();
        assert_eq!(candidate.category_name, "Investimento");
        assert_eq!(candidate.category_type, CategoryType::Investment);
    }

    #[test]
    fn test_no_match() {
        let table = KeywordRuleTable::builtin();
        assert!(table.candidates("xyz 123", -100, 70).is_empty());
        assert!(table.first_candidate("xyz 123", -100, 70).is_none());
    }

    #[test]
    fn test_custom_rules_drop_empty_keywords() {
        let table = KeywordRuleTable::new(vec![
            KeywordRule {
                keyword: "  PET SHOP ".to_string(),
                category_name: "Pets".to_string(),
                implied_type: CategoryType::Expense,
            },
            KeywordRule {
                keyword: "   ".to_string(),
                category_name: "Nada".to_string(),
                implied_type: CategoryType::Expense,
            },
        ]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.rules()[0].keyword, "pet shop");
        let candidate = table.first_candidate("Pet Shop do Bairro", -5000, 70).unwrap();
        assert_eq!(candidate.category_name, "Pets");
    }

    #[test]
    fn test_resolve_type() {
        assert_eq!(
            resolve_type("Investimentos", CategoryType::Expense, -100),
            CategoryType::Investment
        );
        assert_eq!(
            resolve_type("Restaurante", CategoryType::Expense, 100),
            CategoryType::Income
        );
        assert_eq!(
            resolve_type("Salário", CategoryType::Income, -100),
            CategoryType::Income
        );
        assert_eq!(
            resolve_type("Restaurante", CategoryType::Expense, 0),
            CategoryType::Expense
        );
    }
}
