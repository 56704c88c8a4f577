//! Scripted network for tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use shellcache_core::{Error, InterceptedRequest, Response};

use crate::fetch::Network;

/// Answers from a fixed URL table; unknown URLs get a 404.
#[derive(Default)]
pub struct StubNetwork {
    responses: Mutex<HashMap<String, Response>>,
    failing: Mutex<HashSet<String>>,
    offline: AtomicBool,
    calls: AtomicUsize,
}

impl StubNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every fetch fails.
    pub fn offline() -> Self {
        let network = Self::default();
        network.set_offline(true);
        network
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn respond(&self, url: &url::Url, response: Response) {
        self.responses.lock().unwrap().insert(url.to_string(), response);
    }

    /// Fetches of `url` fail as if the connection were refused.
    pub fn fail(&self, url: &url::Url) {
        self.failing.lock().unwrap().insert(url.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Network for StubNetwork {
    async fn fetch(&self, request: &InterceptedRequest) -> Result<Response, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let url = request.url.to_string();

        if self.offline.load(Ordering::SeqCst) || self.failing.lock().unwrap().contains(&url) {
            return Err(Error::Network(format!("connection refused: {url}")));
        }

        Ok(self
            .responses
            .lock()
            .unwrap()
            .get(&url)
            .cloned()
            .unwrap_or_else(|| Response::new(404, "not found")))
    }
}
