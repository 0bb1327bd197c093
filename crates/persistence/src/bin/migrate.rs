#![deny(warnings)]

use persistence::{default_sqlite_url, init_db, load_progress, save_progress};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| default_sqlite_url().to_string());
    // Ensure directory exists
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"));
    if let Some(path) = path {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }
    let pool = init_db(&url).await?;
    // Seed an empty default slot so later loads find a record
    if load_progress(&pool, "default").await?.is_none() {
        save_progress(&pool, "default", &Default::default()).await?;
    }
    println!("DB migrated at {}", url);
    Ok(())
}
