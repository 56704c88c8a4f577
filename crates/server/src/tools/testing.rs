//! In-process site used by the tool tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use shellcache_client::{CacheManager, Network, RecordedHost};
use shellcache_core::{AppConfig, Error, InterceptedRequest, MemoryStorage, Response};

/// Serves pages by path; anything unknown is a 404.
#[derive(Default)]
pub(crate) struct SiteNetwork {
    pages: Mutex<HashMap<String, Response>>,
    offline: AtomicBool,
}

impl SiteNetwork {
    pub(crate) fn page(&self, path: &str, response: Response) {
        self.pages.lock().unwrap().insert(path.to_string(), response);
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl Network for SiteNetwork {
    async fn fetch(&self, request: &InterceptedRequest) -> Result<Response, Error> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("offline: {}", request.url)));
        }
        Ok(self
            .pages
            .lock()
            .unwrap()
            .get(request.url.path())
            .cloned()
            .unwrap_or_else(|| Response::new(404, "not found")))
    }
}

pub(crate) struct Fixture {
    pub manager: Arc<CacheManager>,
    pub host: Arc<RecordedHost>,
    pub storage: MemoryStorage,
    pub network: Arc<SiteNetwork>,
}

pub(crate) fn fixture() -> Fixture {
    let config = AppConfig {
        origin: "https://portfolio.example".into(),
        version: "v2".into(),
        notification_icon: "/icons/portfolio-192.png".into(),
        notification_badge: "/icons/portfolio-badge.png".into(),
        ..Default::default()
    };
    let storage = MemoryStorage::new();
    let network = Arc::new(SiteNetwork::default());
    network.page("/", Response::new(200, "<html>shell</html>").with_header("content-type", "text/html"));
    network.page("/index.html", Response::new(200, "<html>shell</html>").with_header("content-type", "text/html"));
    network.page("/manifest.json", Response::new(200, "{}").with_header("content-type", "application/json"));

    let host = Arc::new(RecordedHost::new());
    let manager = CacheManager::new(&config, Arc::new(storage.clone()), network.clone(), host.clone()).unwrap();

    Fixture { manager: Arc::new(manager), host, storage, network }
}

/// A fixture whose manager is installed and activated.
pub(crate) async fn active_fixture() -> Fixture {
    let f = fixture();
    f.manager.install().await.unwrap();
    f.manager.activate_if_waiting_skipped().await.unwrap();
    f.host.drain().await;
    f
}
