//! Backup Round Trip Example
//!
//! Streams a backup of one repository to a local file, then restores it from
//! that file. Neither direction holds the archive in memory.
//!
//! Run with: cargo run --example backup_roundtrip -- <repository> [config.json]

use graphdb_rs::{BackupOptions, Client, ClientConfig, RestoreOptions};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let repository = args
        .next()
        .ok_or_else(|| anyhow::anyhow!("usage: backup_roundtrip <repository> [config.json]"))?;
    let config = match args.next() {
        Some(path) => ClientConfig::load(&path)?,
        None => ClientConfig::default(),
    };
    let client = Client::from_config(&config)?;

    let opts = BackupOptions {
        repositories: vec![repository.clone()],
        ..Default::default()
    };
    let path = std::env::temp_dir().join(format!("{}-backup.tar", repository));
    let mut file = tokio::fs::File::create(&path).await?;
    let suggested = client.backups().create(&opts, &mut file, vec![]).await?;
    let written = file.metadata().await?.len();
    println!("💾 Backup written to {} ({} bytes)", path.display(), written);
    println!("   Server suggested filename: {}\n", suggested);

    let archive = tokio::fs::File::open(&path).await?;
    let restore = RestoreOptions {
        repositories: vec![repository.clone()],
        ..Default::default()
    };
    client.backups().restore(&restore, archive, vec![]).await?;
    println!("♻️  Restored {}", repository);

    while let Some(stats) = client.monitoring().recovery(vec![]).await? {
        println!("   Recovery in progress: {:?}", stats);
        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    }
    println!("✅ Done");

    Ok(())
}
