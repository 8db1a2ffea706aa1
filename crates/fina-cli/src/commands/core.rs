//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` / `open_engine` - Shared utilities to open the database and engine
//! - `cmd_init` - Initialize the database
//! - `parse_amount` / `parse_month` - Argument parsing helpers

use std::path::Path;

use anyhow::{bail, Context, Result};
use fina_core::{db::Database, Category, EngineConfig, IntelligenceEngine, YearMonth};

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path must be valid UTF-8")?;
    if no_encrypt {
        Database::new_unencrypted(path_str).context("Failed to open database (unencrypted)")
    } else {
        Database::new(path_str).context("Failed to open database")
    }
}

/// Load the engine config (explicit path, FINA_CONFIG, data dir, built-in)
pub fn load_config(config_path: Option<&Path>) -> Result<EngineConfig> {
    EngineConfig::load(config_path).context("Failed to load engine config")
}

/// Build the intelligence engine over an opened database
pub fn open_engine(db: Database, config_path: Option<&Path>) -> Result<IntelligenceEngine<Database>> {
    Ok(IntelligenceEngine::new(db, load_config(config_path)?))
}

pub fn cmd_init(db_path: &Path, no_encrypt: bool, user_id: i64) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path, no_encrypt)?;

    let seeded = db
        .seed_default_categories(user_id)
        .context("Failed to seed default categories")?;
    println!("   Seeded {} default categories for user {}", seeded, user_id);

    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else {
        println!("   🔒 Encryption: ENABLED");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Add items: fina items add Moradia Aluguel");
    println!("  2. Record values: fina entry <item-id> --actual 1500,00");
    println!("  3. Start the API: fina serve");

    Ok(())
}

/// Look up one of the user's categories by name (case-insensitive)
pub fn resolve_category(db: &Database, user_id: i64, name: &str) -> Result<Category> {
    db.get_category_by_name(user_id, name)?.ok_or_else(|| {
        anyhow::anyhow!(
            "Category not found: {} (run 'fina categories' to list)",
            name
        )
    })
}

/// Parse a money amount into cents
///
/// Accepts an optional sign and `R$` prefix. A comma is the decimal
/// separator when present (dots are then thousands separators), otherwise a
/// dot is: `-1.234,56`, `R$ 35,9`, `-35.90` and `1500` are all valid.
pub fn parse_amount(input: &str) -> Result<i64> {
    let trimmed = input.trim();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let rest = rest.trim().trim_start_matches("R$").trim();

    let normalized = if rest.contains(',') {
        rest.replace('.', "").replace(',', ".")
    } else {
        rest.to_string()
    };

    let (whole, fraction) = normalized
        .split_once('.')
        .unwrap_or((normalized.as_str(), ""));

    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty())
        || !all_digits(whole)
        || !all_digits(fraction)
        || fraction.len() > 2
    {
        bail!("Invalid amount: {} (use e.g. -35,90 or 1500)", input);
    }

    let whole: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().with_context(|| format!("Amount too large: {}", input))?
    };
    let fraction: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>()? * 10,
        _ => fraction.parse()?,
    };

    let cents = whole
        .checked_mul(100)
        .and_then(|w| w.checked_add(fraction))
        .with_context(|| format!("Amount too large: {}", input))?;

    Ok(if negative { -cents } else { cents })
}

/// Parse a `YYYY-MM` month, defaulting to the current month
pub fn parse_month(input: Option<&str>) -> Result<YearMonth> {
    let Some(input) = input else {
        return Ok(YearMonth::current());
    };

    let (year, month) = input
        .trim()
        .split_once('-')
        .with_context(|| format!("Invalid month: {} (use YYYY-MM)", input))?;
    let year: i32 = year
        .parse()
        .with_context(|| format!("Invalid year in month: {}", input))?;
    let month: u32 = month
        .parse()
        .with_context(|| format!("Invalid month: {}", input))?;

    YearMonth::new(year, month)
        .with_context(|| format!("Month out of range: {} (expected 01-12)", input))
}
