//! Basic usage of versioned secrets
//!
//! Configure with the usual Vault variables:
//!
//! ```sh
//! VAULT_ADDR=http://127.0.0.1:8200 VAULT_TOKEN=root cargo run --example basic_usage
//! ```

use tracing_subscriber::EnvFilter;
use vault_versioned_sdk::{ClientBuilder, SecretMap, VaultService, Version};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let vault = ClientBuilder::from_env()?.build()?;
    println!("Connected to Vault {}", vault.server_version().await?);

    // Example 1: Scalar secrets and versions
    println!("\n=== Example 1: Scalar secrets ===");
    scalar_example(&vault).await?;

    // Example 2: Composite secrets
    println!("\n=== Example 2: Composite secrets ===");
    map_example(&vault).await?;

    // Example 3: Listing
    println!("\n=== Example 3: List secrets ===");
    for key in vault.list_secrets("secret").await? {
        println!("  {}", key);
    }

    let stats = vault.handle_stats();
    println!(
        "\nHandles created: {}, reused: {}",
        stats.created(),
        stats.hits()
    );
    Ok(())
}

async fn scalar_example(vault: &VaultService) -> anyhow::Result<()> {
    let first = vault.write_secret("secret", "demo/api-key", "first").await?;
    let second = vault.write_secret("secret", "demo/api-key", "second").await?;
    println!("Wrote versions {} and {}", first.version, second.version);

    let latest = vault.read_secret("secret", "demo/api-key").await?;
    println!("Latest: {:?}", latest);

    let previous = vault
        .read_secret_version("secret", "demo/api-key", Version::try_from(first.version)?)
        .await?;
    println!("Version {}: {:?}", first.version, previous);

    let missing = vault.read_secret("secret", "demo/does-not-exist").await?;
    println!("Missing secret reads as: {:?}", missing);
    Ok(())
}

async fn map_example(vault: &VaultService) -> anyhow::Result<()> {
    let mut db = SecretMap::new();
    db.insert("username".to_string(), "app".to_string());
    db.insert("password".to_string(), "hunter2".to_string());

    if let Some(metadata) = vault.write_secret_map("secret", "demo/database", &db).await? {
        println!("Stored database credentials as version {}", metadata.version);
    }

    let stored = vault.read_secret_map("secret", "demo/database").await?;
    println!("Fields: {:?}", stored.keys().collect::<Vec<_>>());

    // Empty maps are skipped
    let skipped = vault
        .write_secret_map("secret", "demo/database", &SecretMap::new())
        .await?;
    println!("Empty write created a version: {}", skipped.is_some());
    Ok(())
}
