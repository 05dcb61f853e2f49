//! Common test utilities for meshcache-server integration tests.

use meshcache_core::{Error, FnLoader, Group, Loader, Registry};
use meshcache_server::{peer_router, AppState, HttpPool, PoolOptions};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// One in-process cache node listening on an ephemeral port.
pub struct TestNode {
    /// Base address, e.g. `http://127.0.0.1:40123`.
    pub addr: String,
    /// The group this node serves.
    pub group: Group,
    /// The node's peer pool.
    pub pool: Arc<HttpPool>,
    /// Loader invocations on this node.
    pub loader_calls: Arc<AtomicUsize>,
    /// The serving task. Abort to simulate a crash.
    pub server: tokio::task::JoinHandle<()>,
}

/// Loader over the canonical scores table, with an invocation counter and
/// an optional artificial delay.
pub fn scores_loader(delay: Duration) -> (Arc<dyn Loader>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let loader: Arc<dyn Loader> = Arc::new(FnLoader::new(move |key: String| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            match key.as_str() {
                "Tom" => Ok(b"630".to_vec()),
                "Jack" => Ok(b"589".to_vec()),
                "Sam" => Ok(b"567".to_vec()),
                _ => Err(Error::NotFound(key.clone())),
            }
        }
    }));
    (loader, calls)
}

/// Starts `size` fully wired nodes serving `group_name`.
///
/// Listeners are bound first so every node is constructed with the complete
/// address list; each node gets its own registry, pool and loader counter.
pub async fn start_cluster(group_name: &str, size: usize, loader_delay: Duration) -> Vec<TestNode> {
    let mut listeners = Vec::with_capacity(size);
    for _ in 0..size {
        listeners.push(
            tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("bind ephemeral listener"),
        );
    }
    let addrs: Vec<String> = listeners
        .iter()
        .map(|l| format!("http://{}", l.local_addr().expect("listener addr")))
        .collect();

    let mut nodes = Vec::with_capacity(size);
    for (listener, addr) in listeners.into_iter().zip(addrs.iter()) {
        let (loader, loader_calls) = scores_loader(loader_delay);

        let registry = Arc::new(Registry::new());
        let group = Group::builder(group_name, loader).max_bytes(2 << 10).build();
        registry.add(group.clone()).expect("fresh registry");

        let pool = Arc::new(HttpPool::with_options(
            addr.clone(),
            PoolOptions {
                peer_timeout: Duration::from_secs(5),
                ..PoolOptions::default()
            },
        ));
        pool.set_peers(&addrs).expect("set peers");
        group.register_peers(pool.clone()).expect("register peers");

        let state = Arc::new(AppState {
            registry,
            group: group.clone(),
            pool: Arc::clone(&pool),
        });
        let app = peer_router(state);
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        nodes.push(TestNode {
            addr: addr.clone(),
            group,
            pool,
            loader_calls,
            server,
        });
    }
    nodes
}

/// Polls `condition` until it holds or `deadline` elapses.
pub async fn wait_for<F: FnMut() -> bool>(mut condition: F, deadline: Duration) -> bool {
    let started = tokio::time::Instant::now();
    loop {
        if condition() {
            return true;
        }
        if started.elapsed() > deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
