//! Classification history operations and the `BudgetStore` implementation

use rusqlite::{params, Row};

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{
    Category, ClassificationRecord, ClassificationSource, ConfidenceUpdate, Item, MonthlyEntry,
    NewClassificationRecord,
};
use crate::period::YearMonth;
use crate::store::BudgetStore;

fn row_to_record(row: &Row) -> rusqlite::Result<ClassificationRecord> {
    let source_str: String = row.get(7)?;
    let created_at: String = row.get(8)?;
    let updated_at: String = row.get(9)?;
    Ok(ClassificationRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        description: row.get(2)?,
        amount: row.get(3)?,
        category_id: row.get(4)?,
        confidence: row.get(5)?,
        confirmations: row.get(6)?,
        source: source_str.parse().unwrap_or(ClassificationSource::Manual),
        created_at: parse_datetime(&created_at),
        updated_at: parse_datetime(&updated_at),
    })
}

impl Database {
    /// A user's learned classifications, highest confidence first
    pub fn list_classification_history(&self, user_id: i64) -> Result<Vec<ClassificationRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, user_id, description, amount, category_id, confidence,
                   confirmations, source, created_at, updated_at
            FROM classification_history
            WHERE user_id = ?
            ORDER BY confidence DESC, confirmations DESC, id
            "#,
        )?;
        let records = stmt
            .query_map(params![user_id], row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Insert a learned classification, or `None` if the triple already exists
    pub fn insert_classification_record(
        &self,
        record: &NewClassificationRecord,
    ) -> Result<Option<i64>> {
        let conn = self.conn()?;
        let inserted = conn.execute(
            r#"
            INSERT INTO classification_history
                (user_id, description, amount, category_id, confidence, confirmations, source)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id, description, category_id) DO NOTHING
            "#,
            params![
                record.user_id,
                record.description,
                record.amount,
                record.category_id,
                record.confidence,
                record.confirmations,
                record.source.as_str(),
            ],
        )?;

        if inserted == 0 {
            return Ok(None);
        }
        Ok(Some(conn.last_insert_rowid()))
    }

    /// Compare-and-swap update keyed on the current confirmation count
    pub fn update_classification_record(
        &self,
        id: i64,
        expected_confirmations: i64,
        update: ConfidenceUpdate,
    ) -> Result<bool> {
        let conn = self.conn()?;
        let updated = conn.execute(
            r#"
            UPDATE classification_history
            SET confidence = ?, confirmations = ?, updated_at = CURRENT_TIMESTAMP
            WHERE id = ? AND confirmations = ?
            "#,
            params![
                update.confidence,
                update.confirmations,
                id,
                expected_confirmations
            ],
        )?;
        Ok(updated == 1)
    }
}

impl BudgetStore for Database {
    fn get_category(&self, id: i64) -> Result<Option<Category>> {
        Database::get_category(self, id)
    }

    fn entries_for_month(&self, user_id: i64, period: YearMonth) -> Result<Vec<MonthlyEntry>> {
        Database::entries_for_month(self, user_id, period)
    }

    fn get_item(&self, item_id: i64) -> Result<Option<Item>> {
        Database::get_item(self, item_id)
    }

    fn list_classification_history(&self, user_id: i64) -> Result<Vec<ClassificationRecord>> {
        Database::list_classification_history(self, user_id)
    }

    fn insert_classification_record(
        &self,
        record: &NewClassificationRecord,
    ) -> Result<Option<i64>> {
        Database::insert_classification_record(self, record)
    }

    fn update_classification_record(
        &self,
        id: i64,
        expected_confirmations: i64,
        update: ConfidenceUpdate,
    ) -> Result<bool> {
        Database::update_classification_record(self, id, expected_confirmations, update)
    }
}
