//! Transit encryption round trip
//!
//! Requires a transit key, e.g. `vault secrets enable transit && vault write -f transit/keys/demo`.

use tracing_subscriber::EnvFilter;
use vault_versioned_sdk::{ClientBuilder, ErrorKind};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let key_name = std::env::args().nth(1).unwrap_or_else(|| "demo".to_string());
    let vault = ClientBuilder::from_env()?.build()?;

    let ciphertext = vault.encrypt(&key_name, b"4111 1111 1111 1111").await?;
    println!("Ciphertext: {}", ciphertext);

    let plaintext = vault.decrypt(&key_name, &ciphertext).await?;
    println!("Plaintext: {}", String::from_utf8_lossy(&plaintext));

    match vault.decrypt(&key_name, "not-a-ciphertext").await {
        Err(e) if e.kind() == ErrorKind::Decryption => println!("Rejected as expected: {}", e),
        other => println!("Unexpected result: {:?}", other),
    }
    Ok(())
}
