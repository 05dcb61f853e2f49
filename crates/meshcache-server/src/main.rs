//! `MeshCache` node binary.
//!
//! Serves one cache group over the peer protocol, optionally exposes the
//! client-facing `/api` listener, and optionally runs a sentinel over its
//! peers. The group is backed by a small in-process table standing in for
//! the slow source of truth; real deployments embed the library crates and
//! supply their own loader.

use clap::Parser;
use meshcache_core::{Error, FnLoader, Group, NodeConfig, Registry};
use meshcache_server::{
    api_router, peer_router, AppState, HttpPool, PoolOptions, Sentinel, SentinelOptions,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// MeshCache node: distributed read-through cache server
#[derive(Parser, Debug)]
#[command(name = "meshcache-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "meshcache.toml", env = "MESHCACHE_CONFIG")]
    config: String,

    /// This node's base address, e.g. http://localhost:8001
    #[arg(long, env = "MESHCACHE_ADDR")]
    addr: Option<String>,

    /// Comma-separated peer addresses, own address included
    #[arg(long, env = "MESHCACHE_PEERS", value_delimiter = ',')]
    peers: Vec<String>,

    /// Also serve the client-facing API on this address
    #[arg(long, env = "MESHCACHE_API_ADDR")]
    api_addr: Option<String>,

    /// Probe peers and broadcast failures
    #[arg(long, env = "MESHCACHE_SENTINEL")]
    sentinel: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let mut config = NodeConfig::load_from_path(&args.config)?;
    if let Some(addr) = args.addr {
        config.cluster.self_addr = addr;
    }
    if !args.peers.is_empty() {
        config.cluster.peers = args.peers;
    }
    if args.api_addr.is_some() {
        config.api_addr = args.api_addr;
    }
    if args.sentinel {
        config.sentinel.enabled = true;
    }
    if config.cluster.peers.is_empty() {
        config.cluster.peers = vec![config.cluster.self_addr.clone()];
    }

    tracing::info!(
        group = %config.group,
        addr = %config.cluster.self_addr,
        peers = config.cluster.peers.len(),
        "starting meshcache node"
    );

    // Stand-in for the slow source of truth this demo node shields.
    let db: Arc<HashMap<String, String>> = Arc::new(
        [("Tom", "630"), ("Jack", "589"), ("Sam", "567")]
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect(),
    );
    let loader = Arc::new(FnLoader::new(move |key: String| {
        let db = Arc::clone(&db);
        async move {
            tracing::info!(key, "slow db lookup");
            db.get(&key)
                .map(|v| v.clone().into_bytes())
                .ok_or(Error::NotFound(key.clone()))
        }
    }));

    let registry = Arc::new(Registry::new());
    let group = Group::builder(&config.group, loader)
        .max_bytes(config.cache.max_bytes)
        .cache_remote(config.cache.cache_remote)
        .build();
    registry.add(group.clone())?;

    let pool = Arc::new(HttpPool::with_options(
        config.cluster.self_addr.clone(),
        PoolOptions {
            base_path: config.cluster.base_path.clone(),
            replicas: config.ring.replicas,
            peer_timeout: config.cluster.peer_timeout(),
        },
    ));
    pool.set_peers(&config.cluster.peers)?;
    group.register_peers(pool.clone())?;

    let state = Arc::new(AppState {
        registry,
        group,
        pool,
    });

    if config.sentinel.enabled {
        let watched: Vec<String> = config
            .cluster
            .peers
            .iter()
            .filter(|peer| **peer != config.cluster.self_addr)
            .cloned()
            .collect();
        if watched.is_empty() {
            tracing::info!("sentinel enabled but no peers to watch");
        } else {
            let sentinel = Sentinel::new(
                config.cluster.self_addr.clone(),
                watched,
                SentinelOptions {
                    probe_interval: config.sentinel.probe_interval(),
                    probe_timeout: config.sentinel.probe_timeout(),
                    base_path: config.cluster.base_path.clone(),
                },
            )?;
            sentinel.spawn();
            tracing::info!("sentinel probing started");
        }
    }

    if let Some(api_addr) = config.api_addr.clone() {
        let app = api_router(Arc::clone(&state));
        let listener = tokio::net::TcpListener::bind(bind_addr(&api_addr)).await?;
        tracing::info!(addr = %api_addr, "api server listening");
        tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app).await {
                tracing::error!(error = %err, "api server failed");
            }
        });
    }

    let app = peer_router(state);
    let listener = tokio::net::TcpListener::bind(bind_addr(&config.cluster.self_addr)).await?;
    tracing::info!(addr = %config.cluster.self_addr, "cache node listening");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Strips the URL scheme off a peer address to get a bindable socket address.
fn bind_addr(url: &str) -> &str {
    url.trim_start_matches("http://")
        .trim_start_matches("https://")
}
