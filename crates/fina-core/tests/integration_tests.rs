//! Integration tests for fina-core
//!
//! These tests run the engine against the SQLite store: learn → classify,
//! entries → anomaly/forecast/recommendations.

use std::sync::Arc;
use std::thread;

use fina_core::{
    db::Database, CategoryType, ClassificationSource, IntelligenceEngine, SuggestionSource,
    YearMonth,
};

fn ym(year: i32, month: u32) -> YearMonth {
    YearMonth::new(year, month).unwrap()
}

fn setup() -> (IntelligenceEngine<Arc<Database>>, Arc<Database>) {
    let db = Arc::new(Database::in_memory().expect("Failed to create in-memory database"));
    db.seed_default_categories(1).unwrap();
    (IntelligenceEngine::with_defaults(db.clone()), db)
}

// =============================================================================
// Classification
// =============================================================================

#[test]
fn test_learn_then_classify_roundtrip() {
    let (engine, db) = setup();
    let health = db.get_category_by_name(1, "Saúde").unwrap().unwrap();

    // Unknown merchant: fallback
    let before = engine.classify(1, "Clinica Vida Plena", -25000, None);
    assert_eq!(before[0].source, SuggestionSource::Fallback);

    engine.learn(1, "Clinica Vida Plena", -25000, health.id, ClassificationSource::Manual);
    engine.learn(1, "clinica vida plena", -25000, health.id, ClassificationSource::Confirmed);

    let history = db.list_classification_history(1).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].confirmations, 2);
    assert_eq!(history[0].confidence, 60);
    assert_eq!(history[0].description, "clinica vida plena");

    let after = engine.classify(1, "CLINICA VIDA PLENA", -24000, None);
    assert_eq!(after[0].category_name, "Saúde");
    assert_eq!(after[0].source, SuggestionSource::History);
    assert_eq!(after[0].confidence, 72);

    // Another user sees none of it
    let other = engine.classify(2, "CLINICA VIDA PLENA", -24000, None);
    assert_eq!(other[0].source, SuggestionSource::Fallback);
}

#[test]
fn test_concurrent_learns_are_not_lost() {
    let (engine, db) = setup();
    let food_id = db.get_category_by_name(1, "Restaurante").unwrap().unwrap().id;
    engine.learn(1, "ifood", -3000, food_id, ClassificationSource::Manual);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = engine.clone();
            thread::spawn(move || {
                engine.learn(1, "ifood", -3000, food_id, ClassificationSource::Manual);
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let history = db.list_classification_history(1).unwrap();
    assert_eq!(history.len(), 1);
    // Confidence only ever moves up, whatever the interleaving
    assert!(history[0].confidence >= 60);
    assert!(history[0].confirmations >= 2);
    assert!(history[0].confirmations <= 5);
}

#[test]
fn test_stats_from_sqlite() {
    let (engine, db) = setup();
    let food = db.get_category_by_name(1, "Restaurante").unwrap().unwrap();
    let transport = db.get_category_by_name(1, "Transporte").unwrap().unwrap();

    for _ in 0..5 {
        engine.learn(1, "ifood", -3000, food.id, ClassificationSource::Confirmed);
    }
    engine.learn(1, "uber", -1500, transport.id, ClassificationSource::Manual);

    let stats = engine.classification_stats(1);
    assert_eq!(stats.total_classifications, 2);
    assert_eq!(stats.high_confidence_count, 1);
    assert_eq!(stats.top_categories[0].name, "Restaurante");
    assert_eq!(stats.top_categories[0].confirmations, 5);
}

// =============================================================================
// Entries: anomaly, forecast, recommendations
// =============================================================================

#[test]
fn test_anomaly_from_recorded_entries() {
    let (engine, db) = setup();
    let fun = db.get_category_by_name(1, "Lazer").unwrap().unwrap();
    let cinema = db.create_item(1, fun.id, "Cinema").unwrap();

    for (month, value) in [(10, 1000), (11, 1100), (12, 900)] {
        db.upsert_entry(1, cinema, ym(2023, month), None, Some(value))
            .unwrap();
    }
    db.upsert_entry(1, cinema, ym(2024, 1), None, Some(1050)).unwrap();

    let check = engine.detect_anomaly(1, fun.id, 2500, 2, 2024, None);
    assert!(check.is_anomalous);
    assert_eq!(check.samples, 4);
    assert_eq!(check.average, 1012.5);
}

#[test]
fn test_forecast_and_recommendations() {
    let (engine, db) = setup();
    let salary_cat = db.get_category_by_name(1, "Salário").unwrap().unwrap();
    let rent_cat = db.get_category_by_name(1, "Moradia").unwrap().unwrap();
    let food_cat = db.get_category_by_name(1, "Restaurante").unwrap().unwrap();

    let salary = db.create_item(1, salary_cat.id, "Salário").unwrap();
    let rent = db.create_item(1, rent_cat.id, "Aluguel").unwrap();
    let food = db.create_item(1, food_cat.id, "Delivery").unwrap();

    let current = ym(2024, 2);
    for period in current.window_ending(3) {
        db.upsert_entry(1, salary, period, Some(500_000), Some(500_000))
            .unwrap();
        db.upsert_entry(1, rent, period, Some(200_000), Some(200_000))
            .unwrap();
    }
    db.upsert_entry(1, food, ym(2024, 1), None, Some(30_000)).unwrap();
    db.upsert_entry(1, food, current, None, Some(90_000)).unwrap();

    let forecast = engine.forecast_cash_flow_from(1, 3, current);
    assert_eq!(forecast.len(), 3);
    assert_eq!((forecast[0].month, forecast[0].year), (3, 2024));
    // Nets: 300000, 270000, 210000
    assert!(forecast.iter().all(|p| p.predicted_balance == 260_000));

    let recommendations = engine.generate_recommendations_from(1, current);
    assert_eq!(recommendations.len(), 1);
    assert!(recommendations[0].contains("Restaurante"));
    assert!(recommendations[0].contains("R$ 900,00"));
}

#[test]
fn test_degrades_when_items_are_deleted() {
    let (engine, db) = setup();
    let fun = db.get_category_by_name(1, "Lazer").unwrap().unwrap();
    let item = db.create_item(1, fun.id, "Show").unwrap();
    db.upsert_entry(1, item, ym(2024, 1), None, Some(5000)).unwrap();

    db.conn()
        .unwrap()
        .execute("DELETE FROM items WHERE id = ?", [item])
        .unwrap();

    // Entry rows cascade away with the item
    assert!(db.entries_for_month(1, ym(2024, 1)).unwrap().is_empty());
    assert!(engine.forecast_cash_flow_from(1, 1, ym(2024, 1)).is_empty());
}

#[test]
fn test_category_types_seeded() {
    let (_, db) = setup();
    let types: Vec<CategoryType> = db
        .list_categories(1)
        .unwrap()
        .into_iter()
        .map(|c| c.category_type)
        .collect();
    assert!(types.contains(&CategoryType::Income));
    assert!(types.contains(&CategoryType::Expense));
    assert!(types.contains(&CategoryType::Investment));
}
