//! Test utilities for fina-core
//!
//! This module provides testing infrastructure:
//! - `MemoryStore`, an in-memory `BudgetStore` with an outage switch and
//!   injectable write contention
//! - `MockOllamaServer`, a local stand-in for the Ollama generate endpoint

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    extract::Json,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::error::{Error, Result};
use crate::models::{
    Category, CategoryType, ClassificationRecord, ConfidenceUpdate, Item, MonthlyEntry,
    NewClassificationRecord,
};
use crate::period::YearMonth;
use crate::store::BudgetStore;

#[derive(Default)]
struct MemoryState {
    next_id: i64,
    categories: HashMap<i64, Category>,
    items: HashMap<i64, Item>,
    entries: Vec<(i64, YearMonth, MonthlyEntry)>,
    history: Vec<ClassificationRecord>,
}

impl MemoryState {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn push_record(&mut self, record: NewClassificationRecord) -> i64 {
        let id = self.allocate_id();
        let now = Utc::now();
        self.history.push(ClassificationRecord {
            id,
            user_id: record.user_id,
            description: record.description,
            amount: record.amount,
            category_id: record.category_id,
            confidence: record.confidence,
            confirmations: record.confirmations,
            source: record.source,
            created_at: now,
            updated_at: now,
        });
        id
    }
}

/// In-memory `BudgetStore` for engine tests
///
/// Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    unavailable: Arc<AtomicBool>,
    contended_updates: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(Error::Unavailable("memory store switched off".into()))
        } else {
            Ok(())
        }
    }

    /// Simulate a storage outage: every call fails while `false`
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Make the next `n` updates lose a race against a concurrent confirmation
    ///
    /// Each contended update applies another writer's +1 confirmation first and
    /// then reports the compare-and-swap as failed.
    pub fn contend_next_updates(&self, n: usize) {
        self.contended_updates.store(n, Ordering::SeqCst);
    }

    pub fn add_category(&self, name: &str, category_type: CategoryType) -> i64 {
        let mut state = self.lock();
        let id = state.allocate_id();
        state.categories.insert(
            id,
            Category {
                id,
                name: name.to_string(),
                category_type,
            },
        );
        id
    }

    pub fn add_item(&self, category_id: i64, name: &str) -> i64 {
        let mut state = self.lock();
        let id = state.allocate_id();
        state.items.insert(
            id,
            Item {
                id,
                category_id,
                name: name.to_string(),
            },
        );
        id
    }

    /// Remove an item while leaving its entries behind (dangling references)
    pub fn remove_item(&self, item_id: i64) {
        self.lock().items.remove(&item_id);
    }

    /// Record an entry for a user and month
    pub fn add_entry(
        &self,
        user_id: i64,
        period: YearMonth,
        item_id: i64,
        actual_value: Option<i64>,
        planned_value: Option<i64>,
    ) {
        self.lock().entries.push((
            user_id,
            period,
            MonthlyEntry {
                item_id,
                actual_value,
                planned_value,
            },
        ));
    }

    /// Shorthand for an entry with only an actual value
    pub fn add_actual(&self, user_id: i64, period: YearMonth, item_id: i64, actual: i64) {
        self.add_entry(user_id, period, item_id, Some(actual), None);
    }

    /// Snapshot of every stored classification record (all users)
    pub fn records(&self) -> Vec<ClassificationRecord> {
        self.lock().history.clone()
    }

    /// Insert a record directly, bypassing the learner
    pub fn seed_record(&self, record: NewClassificationRecord) -> i64 {
        self.lock().push_record(record)
    }
}

impl BudgetStore for MemoryStore {
    fn get_category(&self, id: i64) -> Result<Option<Category>> {
        self.check_available()?;
        Ok(self.lock().categories.get(&id).cloned())
    }

    fn entries_for_month(&self, user_id: i64, period: YearMonth) -> Result<Vec<MonthlyEntry>> {
        self.check_available()?;
        Ok(self
            .lock()
            .entries
            .iter()
            .filter(|(user, month, _)| *user == user_id && *month == period)
            .map(|(_, _, entry)| *entry)
            .collect())
    }

    fn get_item(&self, item_id: i64) -> Result<Option<Item>> {
        self.check_available()?;
        Ok(self.lock().items.get(&item_id).cloned())
    }

    fn list_classification_history(&self, user_id: i64) -> Result<Vec<ClassificationRecord>> {
        self.check_available()?;
        let mut records: Vec<_> = self
            .lock()
            .history
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.confidence.cmp(&a.confidence));
        Ok(records)
    }

    fn insert_classification_record(
        &self,
        record: &NewClassificationRecord,
    ) -> Result<Option<i64>> {
        self.check_available()?;
        let mut state = self.lock();
        let exists = state.history.iter().any(|r| {
            r.user_id == record.user_id
                && r.description == record.description
                && r.category_id == record.category_id
        });
        if exists {
            return Ok(None);
        }
        Ok(Some(state.push_record(record.clone())))
    }

    fn update_classification_record(
        &self,
        id: i64,
        expected_confirmations: i64,
        update: ConfidenceUpdate,
    ) -> Result<bool> {
        self.check_available()?;
        let contended = self
            .contended_updates
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();

        let mut state = self.lock();
        let Some(record) = state.history.iter_mut().find(|r| r.id == id) else {
            return Ok(false);
        };

        if contended {
            record.confirmations += 1;
            record.confidence = (record.confidence + 10).min(100);
            record.updated_at = Utc::now();
            return Ok(false);
        }

        if record.confirmations != expected_confirmations {
            return Ok(false);
        }
        record.confidence = update.confidence;
        record.confirmations = update.confirmations;
        record.updated_at = Utc::now();
        Ok(true)
    }
}

/// Mock Ollama server for testing and development
pub struct MockOllamaServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockOllamaServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        Self::spawn(
            Router::new()
                .route("/api/tags", get(handle_tags))
                .route("/api/generate", post(handle_generate)),
        )
        .await
    }

    /// Start a server whose generate endpoint always fails with 500
    pub async fn start_failing() -> Self {
        Self::spawn(
            Router::new()
                .route("/api/tags", get(handle_tags))
                .route("/api/generate", post(handle_generate_failure)),
        )
        .await
    }

    async fn spawn(app: Router) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockOllamaServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Ollama tags endpoint response (health check)
async fn handle_tags() -> Json<TagsResponse> {
    Json(TagsResponse {
        models: vec![ModelInfo {
            name: "llama3.2:latest".to_string(),
            modified_at: "2024-01-01T00:00:00Z".to_string(),
            size: 4_000_000_000,
        }],
    })
}

/// Echo the bullet points of the prompt back as a one-paragraph summary
async fn handle_generate(Json(request): Json<GenerateRequest>) -> Json<GenerateResponse> {
    let bullets: Vec<&str> = request
        .prompt
        .lines()
        .filter_map(|line| line.strip_prefix("- "))
        .collect();

    let response = if bullets.is_empty() {
        "Tudo em ordem com o seu orçamento.".to_string()
    } else {
        format!("Resumo: {}", bullets.join(" "))
    };

    Json(GenerateResponse {
        model: request.model,
        response,
        done: true,
    })
}

async fn handle_generate_failure() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    model: String,
    response: String,
    done: bool,
}

#[derive(Debug, Serialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Debug, Serialize)]
struct ModelInfo {
    name: String,
    modified_at: String,
    size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_server_starts() {
        let server = MockOllamaServer::start().await;
        let url = server.url();
        assert!(url.starts_with("http://127.0.0.1:"));

        let client = reqwest::Client::new();
        let resp = client.get(format!("{}/api/tags", url)).send().await.unwrap();
        assert!(resp.status().is_success());
    }

    #[test]
    fn test_memory_store_outage() {
        let store = MemoryStore::new();
        let id = store.add_category("Lazer", CategoryType::Expense);
        assert!(store.get_category(id).unwrap().is_some());

        store.set_available(false);
        assert!(matches!(store.get_category(id), Err(Error::Unavailable(_))));

        store.set_available(true);
        assert!(store.get_category(id).is_ok());
    }
}
