//! The three caching strategies.
//!
//! Every strategy resolves to a response. Network failures walk the fallback
//! chain and end in a synthetic 503; storage failures are logged and treated
//! as a miss (reads) or skipped (writes).

use std::sync::Arc;

use shellcache_core::cache::hash::compute_cache_key;
use shellcache_core::{CacheEntry, CacheStorage, InterceptedRequest, Response, Strategy};

use crate::fetch::Network;

pub const CACHE_FIRST_OFFLINE: &str = "Offline content not available";
pub const NETWORK_FIRST_OFFLINE: &str = "Content not available offline";
pub const NAVIGATION_OFFLINE: &str = "Page not available offline";

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const TEXT_HTML: &str = "text/html";

/// Runs strategies against one storage, one network and the two current
/// generation names.
pub struct StrategyRunner {
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    static_cache: String,
    dynamic_cache: String,
    /// Key of the root document, served for offline deep links.
    shell_key: String,
}

impl StrategyRunner {
    pub fn new(
        storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>, static_cache: String, dynamic_cache: String,
        shell_url: &url::Url,
    ) -> Self {
        Self { storage, network, static_cache, dynamic_cache, shell_key: compute_cache_key("GET", shell_url) }
    }

    pub async fn run(&self, strategy: Strategy, request: &InterceptedRequest) -> Response {
        match strategy {
            Strategy::CacheFirst => self.cache_first(request).await,
            Strategy::NetworkFirst => self.network_first(request).await,
            Strategy::NavigationFallback => self.navigation(request).await,
        }
    }

    async fn cache_first(&self, request: &InterceptedRequest) -> Response {
        let key = compute_cache_key(&request.method, &request.url);
        if let Some(entry) = self.lookup(&key).await {
            tracing::debug!("cache hit for {}", request.url);
            return entry.response;
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                self.store_if_ok(&self.static_cache, request, &response).await;
                response
            }
            Err(e) => {
                tracing::warn!("cache-first fetch failed for {}: {}", request.url, e);
                Response::service_unavailable(CACHE_FIRST_OFFLINE, TEXT_PLAIN)
            }
        }
    }

    async fn network_first(&self, request: &InterceptedRequest) -> Response {
        match self.network.fetch(request).await {
            Ok(response) => {
                self.store_if_ok(&self.dynamic_cache, request, &response).await;
                response
            }
            Err(e) => {
                tracing::debug!("network failed for {}, trying cache: {}", request.url, e);
                let key = compute_cache_key(&request.method, &request.url);
                match self.lookup(&key).await {
                    Some(entry) => entry.response,
                    None => Response::service_unavailable(NETWORK_FIRST_OFFLINE, TEXT_PLAIN),
                }
            }
        }
    }

    async fn navigation(&self, request: &InterceptedRequest) -> Response {
        match self.network.fetch(request).await {
            Ok(response) => {
                self.store_if_ok(&self.dynamic_cache, request, &response).await;
                response
            }
            Err(e) => {
                tracing::debug!("navigation network failed for {}, trying cache: {}", request.url, e);
                let key = compute_cache_key(&request.method, &request.url);
                if let Some(entry) = self.lookup(&key).await {
                    return entry.response;
                }
                if let Some(shell) = self.lookup(&self.shell_key).await {
                    tracing::debug!("serving app shell for {}", request.url);
                    return shell.response;
                }
                Response::service_unavailable(NAVIGATION_OFFLINE, TEXT_HTML)
            }
        }
    }

    /// Stored response for `key` in any generation. Read errors count as a miss.
    async fn lookup(&self, key: &str) -> Option<CacheEntry> {
        match self.storage.match_any(key).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!("cache read failed: {}", e);
                None
            }
        }
    }

    async fn store_if_ok(&self, generation: &str, request: &InterceptedRequest, response: &Response) {
        if !response.is_ok() {
            return;
        }
        store_detached(self.storage.clone(), generation.to_string(), CacheEntry::new(request, response.clone())).await;
    }
}

/// Write `entry` on its own task and wait for it.
///
/// The write outlives the caller: dropping the waiting future (the page went
/// away) does not abort a write that has already started.
pub(crate) async fn store_detached(storage: Arc<dyn CacheStorage>, generation: String, entry: CacheEntry) {
    let task = tokio::spawn(async move {
        if let Err(e) = storage.put(&generation, &entry).await {
            tracing::warn!(%generation, url = %entry.url, "failed to store response: {}", e);
        }
    });

    if let Err(e) = task.await {
        tracing::warn!("store task did not complete: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubNetwork;
    use async_trait::async_trait;
    use shellcache_core::{Error, MemoryStorage};
    use tokio::sync::Notify;

    const STATIC: &str = "portfolio-static-v1";
    const DYNAMIC: &str = "portfolio-dynamic-v1";

    fn url(path: &str) -> url::Url {
        url::Url::parse("https://portfolio.example").unwrap().join(path).unwrap()
    }

    fn runner(storage: &MemoryStorage, network: &Arc<StubNetwork>) -> StrategyRunner {
        StrategyRunner::new(
            Arc::new(storage.clone()),
            network.clone(),
            STATIC.into(),
            DYNAMIC.into(),
            &url("/"),
        )
    }

    async fn seed(storage: &MemoryStorage, generation: &str, path: &str, body: &str) {
        let entry = CacheEntry::for_url("GET", &url(path), Response::new(200, body.as_bytes().to_vec()));
        storage.put(generation, &entry).await.unwrap();
    }

    #[tokio::test]
    async fn test_cache_first_hit_skips_network() {
        let storage = MemoryStorage::new();
        let network = Arc::new(StubNetwork::new());
        seed(&storage, STATIC, "/app.css", "cached").await;
        network.respond(&url("/app.css"), Response::new(200, "fresh"));

        let response = runner(&storage, &network)
            .run(Strategy::CacheFirst, &InterceptedRequest::get(url("/app.css")))
            .await;

        assert_eq!(response.text(), "cached");
        assert_eq!(network.calls(), 0);
    }

    #[tokio::test]
    async fn test_cache_first_miss_stores_into_static() {
        let storage = MemoryStorage::new();
        let network = Arc::new(StubNetwork::new());
        network.respond(&url("/app.css"), Response::new(200, "body{}"));
        let request = InterceptedRequest::get(url("/app.css"));

        let response = runner(&storage, &network).run(Strategy::CacheFirst, &request).await;

        assert_eq!(response.text(), "body{}");
        let key = compute_cache_key("GET", &request.url);
        assert_eq!(storage.get(STATIC, &key).await.unwrap().unwrap().response, response);
        assert!(storage.get(DYNAMIC, &key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cache_first_does_not_store_errors() {
        let storage = MemoryStorage::new();
        let network = Arc::new(StubNetwork::new());
        network.respond(&url("/missing.png"), Response::new(404, "nope"));

        let response = runner(&storage, &network)
            .run(Strategy::CacheFirst, &InterceptedRequest::get(url("/missing.png")))
            .await;

        assert_eq!(response.status, 404);
        assert!(storage.entries(STATIC).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cache_first_offline_miss_is_503() {
        let storage = MemoryStorage::new();
        let network = Arc::new(StubNetwork::offline());

        let response = runner(&storage, &network)
            .run(Strategy::CacheFirst, &InterceptedRequest::get(url("/app.css")))
            .await;

        assert_eq!(response.status, 503);
        assert_eq!(response.text(), CACHE_FIRST_OFFLINE);
    }

    #[tokio::test]
    async fn test_cache_first_second_request_is_a_hit() {
        let storage = MemoryStorage::new();
        let network = Arc::new(StubNetwork::new());
        network.respond(&url("/main.js"), Response::new(200, "js"));
        let runner = runner(&storage, &network);

        runner.run(Strategy::CacheFirst, &InterceptedRequest::get(url("/main.js"))).await;
        let second = runner.run(Strategy::CacheFirst, &InterceptedRequest::get(url("/main.js"))).await;

        assert_eq!(second.text(), "js");
        assert_eq!(network.calls(), 1);
        assert_eq!(storage.entries(STATIC).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_repeated_fetch_overwrites_single_entry() {
        let storage = MemoryStorage::new();
        let network = Arc::new(StubNetwork::new());
        network.respond(&url("/api/projects"), Response::new(200, "v1"));
        let runner = runner(&storage, &network);

        runner.run(Strategy::NetworkFirst, &InterceptedRequest::get(url("/api/projects"))).await;
        network.respond(&url("/api/projects"), Response::new(200, "v2"));
        runner.run(Strategy::NetworkFirst, &InterceptedRequest::get(url("/api/projects"))).await;

        let entries = storage.entries(DYNAMIC).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].response.text(), "v2");
    }

    #[tokio::test]
    async fn test_network_first_online_stores_into_dynamic() {
        let storage = MemoryStorage::new();
        let network = Arc::new(StubNetwork::new());
        seed(&storage, DYNAMIC, "/api/projects", "stale").await;
        network.respond(&url("/api/projects"), Response::new(200, "live"));
        let request = InterceptedRequest::get(url("/api/projects"));

        let response = runner(&storage, &network).run(Strategy::NetworkFirst, &request).await;

        assert_eq!(response.text(), "live");
        let key = compute_cache_key("GET", &request.url);
        assert_eq!(storage.get(DYNAMIC, &key).await.unwrap().unwrap().response.text(), "live");
        assert_eq!(storage.entries(DYNAMIC).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_network_first_offline_falls_back() {
        let storage = MemoryStorage::new();
        let network = Arc::new(StubNetwork::offline());
        seed(&storage, DYNAMIC, "/api/projects", "stale").await;

        let response = runner(&storage, &network)
            .run(Strategy::NetworkFirst, &InterceptedRequest::get(url("/api/projects")))
            .await;

        assert_eq!(response.text(), "stale");
    }

    #[tokio::test]
    async fn test_network_first_offline_miss_is_503() {
        let storage = MemoryStorage::new();
        let network = Arc::new(StubNetwork::offline());

        let response = runner(&storage, &network)
            .run(Strategy::NetworkFirst, &InterceptedRequest::get(url("/api/projects")))
            .await;

        assert_eq!(response.status, 503);
        assert_eq!(response.text(), NETWORK_FIRST_OFFLINE);
    }

    #[tokio::test]
    async fn test_network_first_write_failure_still_returns() {
        let storage = MemoryStorage::new();
        storage.set_fail_writes(true);
        let network = Arc::new(StubNetwork::new());
        network.respond(&url("/api/projects"), Response::new(200, "live"));

        let response = runner(&storage, &network)
            .run(Strategy::NetworkFirst, &InterceptedRequest::get(url("/api/projects")))
            .await;

        assert_eq!(response.text(), "live");
        assert_eq!(storage.writes(), 1);
    }

    #[tokio::test]
    async fn test_navigation_exact_match_first() {
        let storage = MemoryStorage::new();
        let network = Arc::new(StubNetwork::offline());
        seed(&storage, STATIC, "/", "shell").await;
        seed(&storage, DYNAMIC, "/projects/42", "project page").await;

        let response = runner(&storage, &network)
            .run(Strategy::NavigationFallback, &InterceptedRequest::navigate(url("/projects/42")))
            .await;

        assert_eq!(response.text(), "project page");
    }

    #[tokio::test]
    async fn test_navigation_falls_back_to_shell() {
        let storage = MemoryStorage::new();
        let network = Arc::new(StubNetwork::offline());
        seed(&storage, STATIC, "/", "shell").await;

        let response = runner(&storage, &network)
            .run(Strategy::NavigationFallback, &InterceptedRequest::navigate(url("/projects/42")))
            .await;

        let shell = storage.match_any(&compute_cache_key("GET", &url("/"))).await.unwrap().unwrap();
        assert_eq!(response, shell.response);
    }

    #[tokio::test]
    async fn test_navigation_offline_without_shell_is_html_503() {
        let storage = MemoryStorage::new();
        let network = Arc::new(StubNetwork::offline());

        let response = runner(&storage, &network)
            .run(Strategy::NavigationFallback, &InterceptedRequest::navigate(url("/about")))
            .await;

        assert_eq!(response.status, 503);
        assert_eq!(response.content_type(), Some("text/html"));
        assert_eq!(response.text(), NAVIGATION_OFFLINE);
    }

    #[tokio::test]
    async fn test_navigation_online_stores_into_dynamic() {
        let storage = MemoryStorage::new();
        let network = Arc::new(StubNetwork::new());
        network.respond(&url("/about"), Response::new(200, "<h1>About</h1>"));

        let response = runner(&storage, &network)
            .run(Strategy::NavigationFallback, &InterceptedRequest::navigate(url("/about")))
            .await;

        assert_eq!(response.text(), "<h1>About</h1>");
        assert_eq!(storage.entries(DYNAMIC).await.unwrap().len(), 1);
    }

    /// Storage whose writes block until the gate opens.
    struct GatedStorage {
        inner: MemoryStorage,
        started: Arc<Notify>,
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl CacheStorage for GatedStorage {
        async fn open(&self, generation: &str) -> Result<(), Error> {
            self.inner.open(generation).await
        }
        async fn generations(&self) -> Result<Vec<String>, Error> {
            self.inner.generations().await
        }
        async fn delete_generation(&self, generation: &str) -> Result<bool, Error> {
            self.inner.delete_generation(generation).await
        }
        async fn get(&self, generation: &str, key: &str) -> Result<Option<CacheEntry>, Error> {
            self.inner.get(generation, key).await
        }
        async fn put(&self, generation: &str, entry: &CacheEntry) -> Result<(), Error> {
            self.started.notify_one();
            self.gate.notified().await;
            self.inner.put(generation, entry).await
        }
        async fn put_all(&self, generation: &str, entries: &[CacheEntry]) -> Result<(), Error> {
            self.inner.put_all(generation, entries).await
        }
        async fn match_any(&self, key: &str) -> Result<Option<CacheEntry>, Error> {
            self.inner.match_any(key).await
        }
        async fn entries(&self, generation: &str) -> Result<Vec<CacheEntry>, Error> {
            self.inner.entries(generation).await
        }
    }

    #[tokio::test]
    async fn test_store_survives_dropped_caller() {
        let inner = MemoryStorage::new();
        let started = Arc::new(Notify::new());
        let gate = Arc::new(Notify::new());
        let storage = GatedStorage { inner: inner.clone(), started: started.clone(), gate: gate.clone() };
        let entry = CacheEntry::for_url("GET", &url("/app.css"), Response::new(200, "body{}"));

        let caller = tokio::spawn(store_detached(Arc::new(storage), STATIC.into(), entry.clone()));
        started.notified().await;
        caller.abort();
        assert!(caller.await.unwrap_err().is_cancelled());

        gate.notify_one();
        for _ in 0..100 {
            if inner.get(STATIC, &entry.key).await.unwrap().is_some() {
                break;
            }
            tokio::task::yield_now().await;
        }

        assert_eq!(inner.get(STATIC, &entry.key).await.unwrap(), Some(entry));
    }
}
