//! Fina CLI - Monthly budgeting with transaction intelligence
//!
//! Usage:
//!   fina init                          Initialize database and default categories
//!   fina classify "ifood almoço" -35   Suggest categories for a transaction
//!   fina learn "ifood" -35 Restaurante Teach the engine a category
//!   fina forecast --months 3           Project net cash flow
//!   fina serve --port 3000             Start the API server

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let user = cli.user;
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt, user),
        Commands::Categories { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                None => commands::cmd_categories_list(&db, user),
                Some(CategoriesAction::Add { name, kind }) => {
                    commands::cmd_categories_add(&db, user, &name, &kind)
                }
            }
        }
        Commands::Items { category, action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                None => commands::cmd_items_list(&db, user, category.as_deref()),
                Some(ItemsAction::Add { category, name }) => {
                    commands::cmd_items_add(&db, user, &category, &name)
                }
            }
        }
        Commands::Entry {
            item,
            month,
            planned,
            actual,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_entry(
                &db,
                user,
                item,
                month.as_deref(),
                planned.as_deref(),
                actual.as_deref(),
            )
        }
        Commands::Classify {
            description,
            amount,
            category,
            simple,
            json,
        } => {
            let engine = commands::open_engine(commands::open_db(&cli.db, cli.no_encrypt)?, config)?;
            commands::cmd_classify(
                &engine,
                user,
                &description,
                &amount,
                category.as_deref(),
                simple,
                json,
            )
        }
        Commands::Learn {
            description,
            amount,
            category,
            confirmed,
        } => {
            let engine = commands::open_engine(commands::open_db(&cli.db, cli.no_encrypt)?, config)?;
            commands::cmd_learn(&engine, user, &description, &amount, &category, confirmed)
        }
        Commands::Anomaly {
            category,
            amount,
            month,
        } => {
            let engine = commands::open_engine(commands::open_db(&cli.db, cli.no_encrypt)?, config)?;
            commands::cmd_anomaly(&engine, user, &category, &amount, month.as_deref())
        }
        Commands::Forecast { months, json } => {
            let engine = commands::open_engine(commands::open_db(&cli.db, cli.no_encrypt)?, config)?;
            commands::cmd_forecast(&engine, user, months, json)
        }
        Commands::Recommend { month, phrase } => {
            let engine = commands::open_engine(commands::open_db(&cli.db, cli.no_encrypt)?, config)?;
            commands::cmd_recommend(&engine, user, month.as_deref(), phrase).await
        }
        Commands::Stats { json } => {
            let engine = commands::open_engine(commands::open_db(&cli.db, cli.no_encrypt)?, config)?;
            commands::cmd_stats(&engine, user, json)
        }
        Commands::Serve {
            port,
            host,
            no_auth,
        } => commands::cmd_serve(&cli.db, &host, port, no_auth, cli.no_encrypt, config).await,
    }
}
