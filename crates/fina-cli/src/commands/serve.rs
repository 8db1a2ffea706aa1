//! Server command implementation

use std::path::Path;

use anyhow::{Context, Result};

use super::{load_config, open_db};

/// Comma-separated list from an environment variable
fn env_list(name: &str) -> Vec<String> {
    std::env::var(name)
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

pub async fn cmd_serve(
    db_path: &Path,
    host: &str,
    port: u16,
    no_auth: bool,
    no_encrypt: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    println!("🚀 Starting Fina API server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);

    let api_keys = env_list("FINA_API_KEYS");
    let allowed_origins = env_list("FINA_ALLOWED_ORIGINS");

    if no_auth {
        println!();
        println!("   ⚠️  Authentication DISABLED - do not expose to network!");
    } else if api_keys.is_empty() {
        println!("   🔒 Authentication: API key required, but FINA_API_KEYS is empty");
    } else {
        println!(
            "   🔑 API keys: {} configured (FINA_API_KEYS)",
            api_keys.len()
        );
    }
    if !allowed_origins.is_empty() {
        println!("   🌐 CORS origins: {}", allowed_origins.join(", "));
    }
    if no_encrypt {
        println!("   ⚠️  Encryption DISABLED (--no-encrypt)");
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let db = open_db(db_path, no_encrypt)?;
    let engine_config = load_config(config_path)?;

    let config = fina_server::ServerConfig {
        require_auth: !no_auth,
        allowed_origins,
        api_keys,
    };

    fina_server::serve_with_config(db, host, port, config, engine_config)
        .await
        .context("Server stopped with an error")?;

    Ok(())
}
