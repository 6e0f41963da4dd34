//! Autoload warm-up walkthrough
//!
//! Seeds a file-backed store, then shows how bulk loading, the not-found
//! cache and update skipping keep store traffic down.
//!
//! ## Usage
//!
//! Choose a data directory (optional, defaults to a temp dir):
//! ```bash
//! export OPTSTORE_DEMO_DIR="/tmp/optstore-demo"
//! ```
//!
//! Run the example:
//! ```bash
//! cargo run --example warmup_demo
//! ```

use optstore_cache::{EngineConfig, FileStore, OptionCache, OptionValue, ScopeParam};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("optstore_cache=debug,warmup_demo=info")
        .init();

    println!("=== Option Cache Warm-up Demo ===\n");

    let dir = std::env::var("OPTSTORE_DEMO_DIR")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::env::temp_dir().join("optstore-warmup-demo"));
    println!("Data directory: {}\n", dir.display());

    let options = OptionCache::new(Arc::new(FileStore::new(&dir)), EngineConfig::site())?;

    println!("Step 1: Seeding options...");
    for (name, value) in [
        ("siteurl", "http://example.org"),
        ("blogname", "Example"),
        ("users_can_register", "1"),
    ] {
        let added = options.add(ScopeParam::Null, name, value).await?;
        println!("  {} -> {}", name, if added { "added" } else { "already present" });
    }
    options
        .add_with_autoload(ScopeParam::Null, "large_blob", "not preloaded", false)
        .await?;

    println!("\nStep 2: Bulk loading a fresh engine...");
    let options = OptionCache::new(Arc::new(FileStore::new(&dir)), EngineConfig::site())?;
    let autoloaded = options.load_autoloaded(ScopeParam::Null).await?;
    for (name, value) in &autoloaded {
        println!("  {} = {}", name, value);
    }

    println!("\nStep 3: Reading options...");
    let name = options.get(ScopeParam::Null, "blogname", OptionValue::Null).await?;
    println!("  blogname = {}", name);
    let missing = options
        .get(ScopeParam::Null, "no_such_option", OptionValue::from("(default)"))
        .await?;
    println!("  no_such_option = {}", missing);
    options
        .get(ScopeParam::Null, "no_such_option", OptionValue::Null)
        .await?;

    println!("\nStep 4: Updating with a loosely equal value...");
    let outcome = options
        .update(ScopeParam::Null, "users_can_register", true)
        .await?;
    println!("  users_can_register <- true: {}", outcome);

    let stats = options.stats().await;
    println!("\n{}", stats);
    println!("Store calls: {}", stats.store_calls());

    Ok(())
}
