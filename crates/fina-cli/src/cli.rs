//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Fina - Monthly budgeting with transaction intelligence
#[derive(Parser)]
#[command(name = "fina")]
#[command(about = "Self-hosted budgeting with category suggestions, anomalies and forecasts", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "fina.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set FINA_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    /// Engine config file (defaults to FINA_CONFIG, then the data dir, then built-in)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// User whose budget to work on
    #[arg(long, default_value_t = 1, global = true)]
    pub user: i64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and seed default categories
    Init,

    /// List or manage categories
    Categories {
        #[command(subcommand)]
        action: Option<CategoriesAction>,
    },

    /// List or manage budget items
    Items {
        /// Only list items in this category
        #[arg(long)]
        category: Option<String>,

        #[command(subcommand)]
        action: Option<ItemsAction>,
    },

    /// Record planned/actual values for an item in a month
    Entry {
        /// Item ID (see 'fina items')
        item: i64,

        /// Month as YYYY-MM (defaults to the current month)
        #[arg(long)]
        month: Option<String>,

        /// Planned value (e.g. 1500,00)
        #[arg(long, allow_hyphen_values = true)]
        planned: Option<String>,

        /// Actual value (e.g. 1499,90)
        #[arg(long, allow_hyphen_values = true)]
        actual: Option<String>,
    },

    /// Suggest categories for a transaction
    Classify {
        /// Transaction description
        description: String,

        /// Signed amount (negative = outflow), e.g. -35,90
        #[arg(allow_hyphen_values = true)]
        amount: String,

        /// Category chosen by you (skips all matching)
        #[arg(long)]
        category: Option<String>,

        /// Keyword rules and fallback only, no learned history
        #[arg(long)]
        simple: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Teach the engine which category a description belongs to
    Learn {
        /// Transaction description
        description: String,

        /// Signed amount, e.g. -35,90
        #[arg(allow_hyphen_values = true)]
        amount: String,

        /// Category name
        category: String,

        /// Mark as an accepted suggestion instead of a manual pick
        #[arg(long)]
        confirmed: bool,
    },

    /// Check whether an amount is unusually high for a category
    Anomaly {
        /// Category name
        category: String,

        /// Amount to check, e.g. 250,00
        #[arg(allow_hyphen_values = true)]
        amount: String,

        /// Month as YYYY-MM (defaults to the current month)
        #[arg(long)]
        month: Option<String>,
    },

    /// Project net cash flow for the coming months
    Forecast {
        /// Number of months to project
        #[arg(long, default_value_t = 3)]
        months: u32,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show spending recommendations for a month
    Recommend {
        /// Month as YYYY-MM (defaults to the current month)
        #[arg(long)]
        month: Option<String>,

        /// Phrase the recommendations with Ollama (requires OLLAMA_HOST)
        #[arg(long)]
        phrase: bool,
    },

    /// Show what the engine has learned
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Disable authentication (for local development only)
        #[arg(long)]
        no_auth: bool,
    },
}

#[derive(Subcommand)]
pub enum CategoriesAction {
    /// Add a new category
    Add {
        /// Category name
        name: String,
        /// Category type: income, expense or investment
        #[arg(long, default_value = "expense")]
        kind: String,
    },
}

#[derive(Subcommand)]
pub enum ItemsAction {
    /// Add a new item under a category
    Add {
        /// Category name
        category: String,
        /// Item name
        name: String,
    },
}
