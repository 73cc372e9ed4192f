use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::db::SqliteStore;

pub const DATA_DIR: &str = ".civic";
pub const DB_FILE: &str = "issues.db";

pub fn run(path: &Path) -> Result<()> {
    let civic_dir = path.join(DATA_DIR);

    if civic_dir.exists() {
        println!("Already initialized at {}", path.display());
        return Ok(());
    }

    fs::create_dir_all(&civic_dir).context("Failed to create .civic directory")?;
    SqliteStore::open(&civic_dir.join(DB_FILE))?;
    println!("Created {}", civic_dir.display());

    println!("\nNext steps:");
    println!("  civic seed                                   # Load demo issues");
    println!("  civic report \"Title\" -c Roads -l \"Main St\"   # Report an issue");

    Ok(())
}
