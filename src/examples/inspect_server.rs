//! Inspect Server Example
//!
//! Connects to a GraphDB server and prints its version, repositories,
//! cluster membership and page cache statistics.
//!
//! Run with: cargo run --example inspect_server -- [config.json]
//!
//! Without a config file the server is expected at http://localhost:7200.

use graphdb_rs::{Client, ClientConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => ClientConfig::load(&path)?,
        None => ClientConfig::default(),
    };
    let client = Client::from_config(&config)?;
    println!("GraphDB at {}\n", client.base_url());

    let version = client.info().version(vec![]).await?;
    println!("✅ {} {}", version.product, version.version);
    println!("   RDF4J: {}, Workbench: {}\n", version.sesame, version.workbench);

    let repositories = client.repositories().infos(vec![]).await?;
    println!("📚 {} repositories:", repositories.len());
    for repo in &repositories {
        println!("   {} ({}) [{}]", repo.id, repo.repository_type, repo.state);
    }
    println!();

    // A standalone server answers 404 on cluster endpoints
    match client.cluster().node_status(vec![]).await {
        Ok(node) => println!("🔗 Node {} is {} (term {})", node.address, node.node_state, node.term),
        Err(e) if e.is_not_found() => println!("🔗 No cluster configured"),
        Err(e) => println!("⚠️  Cluster status unavailable: {}", e),
    }

    let cache = client.monitoring().page_cache(vec![]).await?;
    println!(
        "\n📊 Page cache: {} hits, {} misses ({:.1}% hit ratio)",
        cache.hits,
        cache.misses,
        cache.hit_ratio() * 100.0
    );

    Ok(())
}
