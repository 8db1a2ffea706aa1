//! Storage port consumed by the intelligence engine
//!
//! Categories, items, monthly entries and the classification history all live
//! in an external store. The engine only sees this narrow contract; every
//! method may fail, and the engine degrades failures to empty results.

use std::sync::Arc;

use crate::error::Result;
use crate::models::{
    Category, ClassificationRecord, ConfidenceUpdate, Item, MonthlyEntry, NewClassificationRecord,
};
use crate::period::YearMonth;

/// Read/write contract the engine needs from storage
pub trait BudgetStore: Send + Sync {
    /// Look up a category by id
    fn get_category(&self, id: i64) -> Result<Option<Category>>;

    /// All entries a user recorded for a month
    fn entries_for_month(&self, user_id: i64, period: YearMonth) -> Result<Vec<MonthlyEntry>>;

    /// Look up a budget item by id
    fn get_item(&self, item_id: i64) -> Result<Option<Item>>;

    /// A user's learned classifications, highest confidence first
    fn list_classification_history(&self, user_id: i64) -> Result<Vec<ClassificationRecord>>;

    /// Insert a learned classification
    ///
    /// Returns `None` when a record for the same (user, description, category)
    /// already exists, so the caller can retry as an update.
    fn insert_classification_record(&self, record: &NewClassificationRecord)
        -> Result<Option<i64>>;

    /// Compare-and-swap update of a record's confidence and confirmations
    ///
    /// Applies only if the stored `confirmations` still equals
    /// `expected_confirmations`; returns whether the update was applied.
    fn update_classification_record(
        &self,
        id: i64,
        expected_confirmations: i64,
        update: ConfidenceUpdate,
    ) -> Result<bool>;
}

impl<T: BudgetStore + ?Sized> BudgetStore for Arc<T> {
    fn get_category(&self, id: i64) -> Result<Option<Category>> {
        (**self).get_category(id)
    }

    fn entries_for_month(&self, user_id: i64, period: YearMonth) -> Result<Vec<MonthlyEntry>> {
        (**self).entries_for_month(user_id, period)
    }

    fn get_item(&self, item_id: i64) -> Result<Option<Item>> {
        (**self).get_item(item_id)
    }

    fn list_classification_history(&self, user_id: i64) -> Result<Vec<ClassificationRecord>> {
        (**self).list_classification_history(user_id)
    }

    fn insert_classification_record(
        &self,
        record: &NewClassificationRecord,
    ) -> Result<Option<i64>> {
        (**self).insert_classification_record(record)
    }

    fn update_classification_record(
        &self,
        id: i64,
        expected_confirmations: i64,
        update: ConfidenceUpdate,
    ) -> Result<bool> {
        (**self).update_classification_record(id, expected_confirmations, update)
    }
}
