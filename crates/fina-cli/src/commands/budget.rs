//! Budget management commands: categories, items and monthly entries

use anyhow::{bail, Context, Result};
use fina_core::intelligence::format_brl;
use fina_core::{db::Database, CategoryType};

use super::{parse_amount, parse_month, resolve_category};

pub fn cmd_categories_list(db: &Database, user_id: i64) -> Result<()> {
    let categories = db.list_categories(user_id)?;

    if categories.is_empty() {
        println!("No categories found. Run 'fina init' to seed the defaults.");
        return Ok(());
    }

    println!();
    println!("📂 Categories");
    println!("   ─────────────────────────────────────────");
    for category in &categories {
        println!(
            "   {:>4}  {:<24} {}",
            category.id, category.name, category.category_type
        );
    }

    Ok(())
}

pub fn cmd_categories_add(db: &Database, user_id: i64, name: &str, kind: &str) -> Result<()> {
    let category_type: CategoryType = kind.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let id = db
        .create_category(user_id, name, category_type)
        .with_context(|| format!("Failed to create category {}", name))?;

    println!("✅ Created category {} ({}) with ID {}", name.trim(), category_type, id);
    Ok(())
}

pub fn cmd_items_list(db: &Database, user_id: i64, category: Option<&str>) -> Result<()> {
    let category_id = match category {
        Some(name) => Some(resolve_category(db, user_id, name)?.id),
        None => None,
    };
    let items = db.list_items(user_id, category_id)?;

    if items.is_empty() {
        println!("No items found. Add one with:");
        println!("  fina items add <category> <name>");
        return Ok(());
    }

    let categories = db.list_categories(user_id)?;

    println!();
    println!("🧾 Items");
    println!("   ─────────────────────────────────────────");
    for item in &items {
        let category_name = categories
            .iter()
            .find(|c| c.id == item.category_id)
            .map(|c| c.name.as_str())
            .unwrap_or("?");
        println!("   {:>4}  {:<24} {}", item.id, item.name, category_name);
    }

    Ok(())
}

pub fn cmd_items_add(db: &Database, user_id: i64, category: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        bail!("Item name must not be empty");
    }
    let category = resolve_category(db, user_id, category)?;
    let id = db.create_item(user_id, category.id, name)?;

    println!("✅ Created item {} in {} with ID {}", name.trim(), category.name, id);
    Ok(())
}

pub fn cmd_entry(
    db: &Database,
    user_id: i64,
    item_id: i64,
    month: Option<&str>,
    planned: Option<&str>,
    actual: Option<&str>,
) -> Result<()> {
    if planned.is_none() && actual.is_none() {
        bail!("Nothing to record: pass --planned and/or --actual");
    }

    let period = parse_month(month)?;
    let planned = planned.map(parse_amount).transpose()?;
    let actual = actual.map(parse_amount).transpose()?;

    let item = db
        .list_items(user_id, None)?
        .into_iter()
        .find(|i| i.id == item_id)
        .ok_or_else(|| anyhow::anyhow!("Item not found: {} (run 'fina items' to list)", item_id))?;

    db.upsert_entry(user_id, item.id, period, planned, actual)?;

    println!("✅ Recorded {} for {}", item.name, period);
    if let Some(planned) = planned {
        println!("   Planned: {}", format_brl(planned));
    }
    if let Some(actual) = actual {
        println!("   Actual:  {}", format_brl(actual));
    }

    Ok(())
}
