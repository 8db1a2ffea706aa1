//! Category, item and monthly entry operations

use rusqlite::{params, OptionalExtension, Row};
use tracing::info;

use super::Database;
use crate::error::{Error, Result};
use crate::models::{Category, CategoryType, Item, MonthlyEntry};
use crate::period::YearMonth;

/// Starter categories for a new user (pt-BR)
const DEFAULT_CATEGORIES: &[(&str, CategoryType)] = &[
    ("Salário", CategoryType::Income),
    ("Renda Extra", CategoryType::Income),
    ("Moradia", CategoryType::Expense),
    ("Contas da Casa", CategoryType::Expense),
    ("Supermercado", CategoryType::Expense),
    ("Restaurante", CategoryType::Expense),
    ("Transporte", CategoryType::Expense),
    ("Combustível", CategoryType::Expense),
    ("Saúde", CategoryType::Expense),
    ("Educação", CategoryType::Expense),
    ("Assinaturas", CategoryType::Expense),
    ("Lazer", CategoryType::Expense),
    ("Investimento", CategoryType::Investment),
];

fn row_to_category(row: &Row) -> rusqlite::Result<Category> {
    let type_str: String = row.get(2)?;
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        category_type: type_str.parse().unwrap_or(CategoryType::Expense),
    })
}

fn row_to_item(row: &Row) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get(0)?,
        category_id: row.get(1)?,
        name: row.get(2)?,
    })
}

impl Database {
    /// Create a category for a user
    pub fn create_category(
        &self,
        user_id: i64,
        name: &str,
        category_type: CategoryType,
    ) -> Result<i64> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidData("Category name cannot be empty".into()));
        }

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO categories (user_id, name, category_type) VALUES (?, ?, ?)",
            params![user_id, name, category_type.as_str()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List a user's categories ordered by type then name
    pub fn list_categories(&self, user_id: i64) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, category_type FROM categories
             WHERE user_id = ? ORDER BY category_type, name",
        )?;
        let categories = stmt
            .query_map(params![user_id], row_to_category)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    /// Get a category by id
    pub fn get_category(&self, id: i64) -> Result<Option<Category>> {
        let conn = self.conn()?;
        let category = conn
            .query_row(
                "SELECT id, name, category_type FROM categories WHERE id = ?",
                params![id],
                row_to_category,
            )
            .optional()?;
        Ok(category)
    }

    /// Find a user's category by name (case-insensitive)
    pub fn get_category_by_name(&self, user_id: i64, name: &str) -> Result<Option<Category>> {
        let conn = self.conn()?;
        // SQLite's lower() only folds ASCII; compare in Rust so "SAÚDE" finds "Saúde"
        let wanted = name.trim().to_lowercase();
        let mut stmt =
            conn.prepare("SELECT id, name, category_type FROM categories WHERE user_id = ?")?;
        let mut rows = stmt.query(params![user_id])?;
        while let Some(row) = rows.next()? {
            let category = row_to_category(row)?;
            if category.name.to_lowercase() == wanted {
                return Ok(Some(category));
            }
        }
        Ok(None)
    }

    /// Seed the default categories for a user (idempotent - skips existing names)
    ///
    /// Returns how many categories were created.
    pub fn seed_default_categories(&self, user_id: i64) -> Result<usize> {
        let conn = self.conn()?;
        let mut created = 0;

        for (name, category_type) in DEFAULT_CATEGORIES {
            created += conn.execute(
                "INSERT OR IGNORE INTO categories (user_id, name, category_type) VALUES (?, ?, ?)",
                params![user_id, name, category_type.as_str()],
            )?;
        }

        if created > 0 {
            info!(user_id, created, "Seeded default categories");
        }
        Ok(created)
    }

    /// Create a budget item under one of the user's categories
    pub fn create_item(&self, user_id: i64, category_id: i64, name: &str) -> Result<i64> {
        let conn = self.conn()?;

        let owner: Option<i64> = conn
            .query_row(
                "SELECT user_id FROM categories WHERE id = ?",
                params![category_id],
                |row| row.get(0),
            )
            .optional()?;
        match owner {
            Some(owner) if owner == user_id => {}
            _ => {
                return Err(Error::NotFound(format!(
                    "Category {} not found",
                    category_id
                )))
            }
        }

        conn.execute(
            "INSERT INTO items (user_id, category_id, name) VALUES (?, ?, ?)",
            params![user_id, category_id, name.trim()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List a user's items, optionally restricted to one category
    pub fn list_items(&self, user_id: i64, category_id: Option<i64>) -> Result<Vec<Item>> {
        let conn = self.conn()?;
        let items = match category_id {
            Some(category_id) => {
                let mut stmt = conn.prepare(
                    "SELECT id, category_id, name FROM items
                     WHERE user_id = ? AND category_id = ? ORDER BY name",
                )?;
                let rows = stmt.query_map(params![user_id, category_id], row_to_item)?;
                rows.collect::<std::result::Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT id, category_id, name FROM items WHERE user_id = ? ORDER BY name",
                )?;
                let rows = stmt.query_map(params![user_id], row_to_item)?;
                rows.collect::<std::result::Result<Vec<_>, _>>()?
            }
        };
        Ok(items)
    }

    /// Get an item by id
    pub fn get_item(&self, item_id: i64) -> Result<Option<Item>> {
        let conn = self.conn()?;
        let item = conn
            .query_row(
                "SELECT id, category_id, name FROM items WHERE id = ?",
                params![item_id],
                row_to_item,
            )
            .optional()?;
        Ok(item)
    }

    /// Record planned and/or actual values for an item in a month
    ///
    /// A `None` leaves the stored value unchanged when the entry already exists.
    pub fn upsert_entry(
        &self,
        user_id: i64,
        item_id: i64,
        period: YearMonth,
        planned_value: Option<i64>,
        actual_value: Option<i64>,
    ) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO monthly_entries (user_id, item_id, month, year, planned_value, actual_value)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(user_id, item_id, month, year) DO UPDATE SET
                planned_value = COALESCE(excluded.planned_value, planned_value),
                actual_value = COALESCE(excluded.actual_value, actual_value),
                updated_at = CURRENT_TIMESTAMP
            "#,
            params![
                user_id,
                item_id,
                period.month(),
                period.year(),
                planned_value,
                actual_value
            ],
        )?;
        Ok(())
    }

    /// All entries a user has for a month
    pub fn entries_for_month(&self, user_id: i64, period: YearMonth) -> Result<Vec<MonthlyEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT item_id, actual_value, planned_value FROM monthly_entries
             WHERE user_id = ? AND year = ? AND month = ? ORDER BY item_id",
        )?;
        let entries = stmt
            .query_map(params![user_id, period.year(), period.month()], |row| {
                Ok(MonthlyEntry {
                    item_id: row.get(0)?,
                    actual_value: row.get(1)?,
                    planned_value: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}
