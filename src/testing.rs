// Dobles de prueba compartidos por los tests del crate

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::rc::Rc;

use async_trait::async_trait;
use serde_json::json;

use crate::error::{CacheError, RemoteError, StorageError};
use crate::models::{CachedResponse, Payload};
use crate::services::api_client::{HttpReply, HttpTransport};
use crate::services::cache_service::{AssetFetcher, CacheBackend};
use crate::utils::storage::DurableStore;

pub fn payload(action: &str, id: &str, quantity: u32) -> Payload {
    match json!({"action": action, "id": id, "quantity": quantity}) {
        serde_json::Value::Object(map) => map,
        _ => unreachable!(),
    }
}

// ----------------------------------------------------------------------------
// DurableStore en memoria
// ----------------------------------------------------------------------------

pub struct MemoryStore {
    items: RefCell<HashMap<String, String>>,
    available: Cell<bool>,
    writes: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            items: RefCell::new(HashMap::new()),
            available: Cell::new(true),
            writes: Cell::new(0),
        }
    }

    /// `false` simula localStorage bloqueado
    pub fn set_available(&self, available: bool) {
        self.available.set(available);
    }

    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.available.get() {
            Ok(())
        } else {
            Err(StorageError::Unavailable("bloqueado en el test".to_string()))
        }
    }
}

impl DurableStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check()?;
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check()?;
        self.writes.set(self.writes.get() + 1);
        self.items.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.check()?;
        self.writes.set(self.writes.get() + 1);
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// HttpTransport con respuestas programadas
// ----------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub url: String,
    pub body: Option<String>,
}

#[derive(Default)]
struct TransportScript {
    offline: bool,
    gets: VecDeque<Result<HttpReply, RemoteError>>,
    posts: VecDeque<Result<HttpReply, RemoteError>>,
    requests: Vec<RecordedRequest>,
    on_next_post: Option<Box<dyn FnOnce()>>,
}

/// Sin guion: GET devuelve `[]` y POST `{"status":"success"}`.
/// `set_offline(true)` hace fallar todo con error de red.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Rc<RefCell<TransportScript>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.script.borrow_mut().offline = offline;
    }

    pub fn push_get(&self, reply: Result<HttpReply, RemoteError>) {
        self.script.borrow_mut().gets.push_back(reply);
    }

    pub fn push_post(&self, reply: Result<HttpReply, RemoteError>) {
        self.script.borrow_mut().posts.push_back(reply);
    }

    /// Se ejecuta durante el próximo POST, antes de responder
    pub fn on_next_post(&self, hook: impl FnOnce() + 'static) {
        self.script.borrow_mut().on_next_post = Some(Box::new(hook));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.script.borrow().requests.clone()
    }

    pub fn post_count(&self) -> usize {
        self.requests().iter().filter(|r| r.method == "POST").count()
    }
}

#[async_trait(?Send)]
impl HttpTransport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<HttpReply, RemoteError> {
        let mut script = self.script.borrow_mut();
        script.requests.push(RecordedRequest {
            method: "GET",
            url: url.to_string(),
            body: None,
        });
        if script.offline {
            return Err(RemoteError::Network("Failed to fetch".to_string()));
        }
        script
            .gets
            .pop_front()
            .unwrap_or_else(|| Ok(HttpReply::new(200, "[]")))
    }

    async fn post(&self, url: &str, body: String) -> Result<HttpReply, RemoteError> {
        let hook = {
            let mut script = self.script.borrow_mut();
            script.requests.push(RecordedRequest {
                method: "POST",
                url: url.to_string(),
                body: Some(body),
            });
            script.on_next_post.take()
        };
        if let Some(hook) = hook {
            hook();
        }

        let mut script = self.script.borrow_mut();
        if script.offline {
            return Err(RemoteError::Network("Failed to fetch".to_string()));
        }
        script
            .posts
            .pop_front()
            .unwrap_or_else(|| Ok(HttpReply::new(200, r#"{"status":"success"}"#)))
    }
}

// ----------------------------------------------------------------------------
// CacheBackend en memoria
// ----------------------------------------------------------------------------

#[derive(Default)]
struct CacheContents {
    caches: BTreeMap<String, BTreeMap<String, CachedResponse>>,
    fail_put_for: Option<String>,
    claims: usize,
}

#[derive(Clone, Default)]
pub struct MemoryCacheBackend {
    contents: Rc<RefCell<CacheContents>>,
}

impl MemoryCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_put_for(&self, url: &str) {
        self.contents.borrow_mut().fail_put_for = Some(url.to_string());
    }

    pub fn has_cache(&self, name: &str) -> bool {
        self.contents.borrow().caches.contains_key(name)
    }

    pub fn entry_count(&self, name: &str) -> usize {
        self.contents
            .borrow()
            .caches
            .get(name)
            .map(|c| c.len())
            .unwrap_or(0)
    }

    pub fn cache_names_now(&self) -> Vec<String> {
        self.contents.borrow().caches.keys().cloned().collect()
    }

    pub fn clients_claimed(&self) -> usize {
        self.contents.borrow().claims
    }
}

#[async_trait(?Send)]
impl CacheBackend for MemoryCacheBackend {
    async fn cache_names(&self) -> Result<Vec<String>, CacheError> {
        Ok(self.cache_names_now())
    }

    async fn put(&self, cache: &str, url: &str, response: &CachedResponse) -> Result<(), CacheError> {
        let mut contents = self.contents.borrow_mut();
        if contents.fail_put_for.as_deref() == Some(url) {
            return Err(CacheError::Store {
                cache: cache.to_string(),
                url: url.to_string(),
                reason: "QuotaExceededError".to_string(),
            });
        }
        contents
            .caches
            .entry(cache.to_string())
            .or_default()
            .insert(url.to_string(), response.clone());
        Ok(())
    }

    async fn lookup(&self, cache: &str, url: &str) -> Result<Option<CachedResponse>, CacheError> {
        Ok(self
            .contents
            .borrow()
            .caches
            .get(cache)
            .and_then(|c| c.get(url))
            .cloned())
    }

    async fn delete_cache(&self, cache: &str) -> Result<bool, CacheError> {
        Ok(self.contents.borrow_mut().caches.remove(cache).is_some())
    }

    async fn claim_clients(&self) -> Result<(), CacheError> {
        self.contents.borrow_mut().claims += 1;
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// AssetFetcher con respuestas fijas por URL
// ----------------------------------------------------------------------------

#[derive(Default)]
struct FetcherScript {
    responses: HashMap<String, CachedResponse>,
    failing: Vec<String>,
    calls: usize,
}

#[derive(Clone, Default)]
pub struct ScriptedFetcher {
    script: Rc<RefCell<FetcherScript>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, url: &str, response: CachedResponse) {
        self.script
            .borrow_mut()
            .responses
            .insert(url.to_string(), response);
    }

    pub fn fail(&self, url: &str) {
        self.script.borrow_mut().failing.push(url.to_string());
    }

    pub fn call_count(&self) -> usize {
        self.script.borrow().calls
    }
}

#[async_trait(?Send)]
impl AssetFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<CachedResponse, CacheError> {
        let mut script = self.script.borrow_mut();
        script.calls += 1;
        if script.failing.iter().any(|u| u == url) {
            return Err(CacheError::Fetch {
                url: url.to_string(),
                reason: "Failed to fetch".to_string(),
            });
        }
        script
            .responses
            .get(url)
            .cloned()
            .ok_or_else(|| CacheError::Fetch {
                url: url.to_string(),
                reason: "HTTP 404".to_string(),
            })
    }
}
