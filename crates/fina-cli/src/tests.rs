//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::io::Write;

use fina_core::db::Database;
use fina_core::test_utils::MockOllamaServer;
use fina_core::{
    AnomalyCheck, AnomalyOptions, InsightPhraser, IntelligenceEngine, OllamaPhraser, YearMonth,
};

use crate::commands;

fn setup_test_db() -> Database {
    let db = Database::in_memory().unwrap();
    db.seed_default_categories(1).unwrap();
    db
}

fn setup_engine() -> IntelligenceEngine<Database> {
    IntelligenceEngine::with_defaults(setup_test_db())
}

// ========== Init ==========

#[test]
fn test_cmd_init_creates_and_seeds() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fina.db");

    commands::cmd_init(&path, true, 7).unwrap();
    assert!(path.exists());

    let db = commands::open_db(&path, true).unwrap();
    assert_eq!(db.list_categories(7).unwrap().len(), 13);

    // Idempotent
    commands::cmd_init(&path, true, 7).unwrap();
    assert_eq!(db.list_categories(7).unwrap().len(), 13);
}

// ========== Categories & Items ==========

#[test]
fn test_cmd_categories() {
    let db = setup_test_db();
    assert!(commands::cmd_categories_list(&db, 1).is_ok());
    assert!(commands::cmd_categories_list(&db, 2).is_ok());

    commands::cmd_categories_add(&db, 1, "Pets", "expense").unwrap();
    let pets = db.get_category_by_name(1, "pets").unwrap().unwrap();
    assert_eq!(pets.name, "Pets");

    assert!(commands::cmd_categories_add(&db, 1, "Cripto", "gamble").is_err());
    // Duplicate name for the same user
    assert!(commands::cmd_categories_add(&db, 1, "Pets", "expense").is_err());
}

#[test]
fn test_cmd_items() {
    let db = setup_test_db();
    assert!(commands::cmd_items_list(&db, 1, None).is_ok());

    commands::cmd_items_add(&db, 1, "moradia", "Aluguel").unwrap();
    let housing = db.get_category_by_name(1, "Moradia").unwrap().unwrap();
    let items = db.list_items(1, Some(housing.id)).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "Aluguel");

    assert!(commands::cmd_items_list(&db, 1, Some("Moradia")).is_ok());
    assert!(commands::cmd_items_list(&db, 1, Some("Nope")).is_err());
    assert!(commands::cmd_items_add(&db, 1, "Nope", "Coisa").is_err());
    assert!(commands::cmd_items_add(&db, 1, "Moradia", "  ").is_err());
}

#[test]
fn test_cmd_entry() {
    let db = setup_test_db();
    let housing = db.get_category_by_name(1, "Moradia").unwrap().unwrap();
    let rent = db.create_item(1, housing.id, "Aluguel").unwrap();

    commands::cmd_entry(&db, 1, rent, Some("2024-03"), Some("1.500,00"), None).unwrap();
    commands::cmd_entry(&db, 1, rent, Some("2024-03"), None, Some("1499,90")).unwrap();

    let entries = db
        .entries_for_month(1, YearMonth::new(2024, 3).unwrap())
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].planned_value, Some(150_000));
    assert_eq!(entries[0].actual_value, Some(149_990));
}

#[test]
fn test_cmd_entry_errors() {
    let db = setup_test_db();
    let housing = db.get_category_by_name(1, "Moradia").unwrap().unwrap();
    let rent = db.create_item(1, housing.id, "Aluguel").unwrap();

    // Nothing to record
    assert!(commands::cmd_entry(&db, 1, rent, None, None, None).is_err());
    // Bad month / amount
    assert!(commands::cmd_entry(&db, 1, rent, Some("2024-13"), Some("10"), None).is_err());
    assert!(commands::cmd_entry(&db, 1, rent, None, Some("dez"), None).is_err());
    // Another user's item
    assert!(commands::cmd_entry(&db, 2, rent, None, Some("10"), None).is_err());
    assert!(commands::cmd_entry(&db, 1, 9999, None, Some("10"), None).is_err());
}

// ========== Intelligence ==========

#[test]
fn test_cmd_learn_then_classify() {
    let engine = setup_engine();

    commands::cmd_learn(&engine, 1, "Petz Loja", "-150,00", "Lazer", true).unwrap();

    let history = engine.store().list_classification_history(1).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].description, "petz loja");
    assert_eq!(history[0].amount, -15_000);
    assert_eq!(history[0].confidence, 60);

    assert!(commands::cmd_classify(&engine, 1, "PETZ LOJA", "-150", None, false, false).is_ok());
    assert!(commands::cmd_classify(&engine, 1, "PETZ LOJA", "-150", None, false, true).is_ok());
    assert!(commands::cmd_classify(&engine, 1, "ifood", "-35,90", None, true, false).is_ok());
}

#[test]
fn test_cmd_learn_errors() {
    let engine = setup_engine();
    assert!(commands::cmd_learn(&engine, 1, "uber", "-20", "Nope", false).is_err());
    assert!(commands::cmd_learn(&engine, 1, "  ", "-20", "Transporte", false).is_err());
    assert!(commands::cmd_learn(&engine, 1, "uber", "vinte", "Transporte", false).is_err());
    assert!(engine
        .store()
        .list_classification_history(1)
        .unwrap()
        .is_empty());
}

#[test]
fn test_cmd_classify_bad_amount() {
    let engine = setup_engine();
    assert!(commands::cmd_classify(&engine, 1, "ifood", "abc", None, false, false).is_err());
}

#[test]
fn test_cmd_anomaly() {
    let engine = setup_engine();
    let db = engine.store();
    let fun = db.get_category_by_name(1, "Lazer").unwrap().unwrap();
    let cinema = db.create_item(1, fun.id, "Cinema").unwrap();
    for month in 2..=5 {
        db.upsert_entry(1, cinema, YearMonth::new(2024, month).unwrap(), None, Some(1000))
            .unwrap();
    }

    assert!(commands::cmd_anomaly(&engine, 1, "Lazer", "25,00", Some("2024-06")).is_ok());
    assert!(commands::cmd_anomaly(&engine, 1, "Lazer", "5,00", Some("2024-06")).is_ok());
    assert!(commands::cmd_anomaly(&engine, 1, "Nope", "5,00", None).is_err());
}

#[test]
fn test_anomaly_verdict_wording() {
    let options = AnomalyOptions::default();

    let verdict = commands::anomaly_verdict(&AnomalyCheck::no_signal(2, 0), &options);
    assert_eq!(verdict, "Not enough history (2 of 3 observations needed) - no signal");

    let flagged = AnomalyCheck {
        is_anomalous: true,
        average: 1000.0,
        samples: 4,
        skipped: 0,
    };
    let verdict = commands::anomaly_verdict(&flagged, &options);
    assert!(verdict.contains("more than 2x the average of R$ 10,00"));

    let usual = AnomalyCheck {
        is_anomalous: false,
        ..flagged
    };
    assert!(commands::anomaly_verdict(&usual, &options).contains("Within the usual range"));
}

#[test]
fn test_cmd_forecast() {
    let engine = setup_engine();
    assert!(commands::cmd_forecast(&engine, 1, 3, false).is_ok());
    assert!(commands::cmd_forecast(&engine, 1, 3, true).is_ok());
    assert!(commands::cmd_forecast(&engine, 1, 0, false).is_err());
    assert!(commands::cmd_forecast(&engine, 1, 25, false).is_err());
}

#[test]
fn test_cmd_stats() {
    let engine = setup_engine();
    commands::cmd_learn(&engine, 1, "uber", "-20", "Transporte", false).unwrap();
    assert!(commands::cmd_stats(&engine, 1, false).is_ok());
    assert!(commands::cmd_stats(&engine, 1, true).is_ok());
}

#[tokio::test]
async fn test_recommendations_with_phraser() {
    let server = MockOllamaServer::start().await;
    let phraser = OllamaPhraser::new(&server.url(), "llama3.2");

    let engine = setup_engine();
    let db = engine.store();
    let food = db.get_category_by_name(1, "Restaurante").unwrap().unwrap();
    let delivery = db.create_item(1, food.id, "Delivery").unwrap();
    db.upsert_entry(1, delivery, YearMonth::new(2024, 2).unwrap(), None, Some(10_000))
        .unwrap();
    db.upsert_entry(1, delivery, YearMonth::new(2024, 3).unwrap(), None, Some(50_000))
        .unwrap();

    let phraser: &dyn InsightPhraser = &phraser;
    let result = commands::print_recommendations(&engine, 1, Some("2024-03"), Some(phraser)).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cmd_recommend_without_phrase() {
    let engine = setup_engine();
    assert!(commands::cmd_recommend(&engine, 1, None, false).await.is_ok());
    assert!(commands::cmd_recommend(&engine, 1, Some("2024-00"), false)
        .await
        .is_err());
}

// ========== Config ==========

#[test]
fn test_open_engine_with_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[classification]
keyword_confidence = 65

[[keywords]]
keyword = "petz"
category_name = "Pets"
type = "expense"
"#
    )
    .unwrap();

    let engine = commands::open_engine(setup_test_db(), Some(file.path())).unwrap();
    assert_eq!(engine.config().classification.keyword_confidence, 65);

    let suggestion = engine.classify_simple("PETZ centro", -5000, None);
    assert_eq!(suggestion.category_name, "Pets");
    assert_eq!(suggestion.confidence, 65);
}

#[test]
fn test_open_engine_missing_config_errors() {
    let dir = tempfile::tempdir().unwrap();
    let bad = dir.path().join("broken.toml");
    std::fs::write(&bad, "[classification\nnot toml").unwrap();
    assert!(commands::open_engine(setup_test_db(), Some(&bad)).is_err());
}
