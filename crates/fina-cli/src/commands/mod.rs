//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `budget` - Categories, items and monthly entries
//! - `core` - Init and shared utilities (open_db, load_config, amount/month parsing)
//! - `intelligence` - Classification, learning, anomalies, forecasts, recommendations
//! - `serve` - Web server command

pub mod budget;
pub mod core;
pub mod intelligence;
pub mod serve;

// Re-export command functions for main.rs
pub use budget::*;
pub use core::*;
pub use intelligence::*;
pub use serve::*;
