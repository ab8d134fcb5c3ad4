use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use statekit_core::{CancelToken, Dispose, Signal};

/// Flat string key/value store the host supplies (browser storage, a file,
/// a test map). statekit never persists anything itself.
pub trait StorageBackend {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&self, key: &str, value: String);
    fn remove(&self, key: &str);
    fn clear(&self);
    /// Every key currently present, so a namespaced facade can clear only
    /// its own slice of a shared backend.
    fn keys(&self) -> Vec<String>;
}

#[derive(Default)]
pub struct MemoryBackend {
    map: RefCell<HashMap<String, String>>,
}

impl StorageBackend for MemoryBackend {
    fn read(&self, key: &str) -> Option<String> {
        self.map.borrow().get(key).cloned()
    }

    fn write(&self, key: &str, value: String) {
        self.map.borrow_mut().insert(key.to_owned(), value);
    }

    fn remove(&self, key: &str) {
        self.map.borrow_mut().remove(key);
    }

    fn clear(&self) {
        self.map.borrow_mut().clear();
    }

    fn keys(&self) -> Vec<String> {
        self.map.borrow().keys().cloned().collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to encode value for key '{key}': {source}")]
    Encode {
        key: String,
        source: serde_json::Error,
    },
}

pub struct StorageConfig {
    pub backend: Rc<dyn StorageBackend>,
    pub prefix: Option<String>,
    pub namespace: Option<String>,
    /// Overrides the `prefix/namespace/key` scheme entirely.
    pub key_fn: Option<Box<dyn Fn(&str) -> String>>,
    pub cancel: Option<CancelToken>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: Rc::new(MemoryBackend::default()),
            prefix: None,
            namespace: None,
            key_fn: None,
            cancel: None,
        }
    }
}

/// JSON-encoded values over a [`StorageBackend`], with key namespacing and
/// signal synchronization.
pub struct Storage {
    backend: Rc<dyn StorageBackend>,
    prefix: Option<String>,
    namespace: Option<String>,
    key_fn: Option<Box<dyn Fn(&str) -> String>>,
    token: CancelToken,
}

impl Storage {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            backend: config.backend,
            prefix: config.prefix,
            namespace: config.namespace,
            key_fn: config.key_fn,
            token: CancelToken::linked(config.cancel.as_ref()),
        }
    }

    /// `prefix/namespace/key`, skipping empty parts.
    pub fn full_key(&self, key: &str) -> String {
        if let Some(f) = &self.key_fn {
            return f(key);
        }
        let mut parts: Vec<&str> = Vec::with_capacity(3);
        if let Some(p) = self.prefix.as_deref() {
            parts.push(p);
        }
        if let Some(ns) = self.namespace.as_deref() {
            parts.push(ns);
        }
        parts.push(key);
        parts.join("/")
    }

    /// Decoded value, or `None` when the key is absent or holds something
    /// the target type cannot decode (logged, not raised).
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let full = self.full_key(key);
        let raw = self.backend.read(&full)?;
        match serde_json::from_str(&raw) {
            Ok(v) => Some(v),
            Err(err) => {
                log::warn!("storage: undecodable value under '{full}': {err}");
                None
            }
        }
    }

    pub fn get_or<T: DeserializeOwned>(&self, key: &str, fallback: T) -> T {
        self.get(key).unwrap_or(fallback)
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let full = self.full_key(key);
        let encoded = serde_json::to_string(value).map_err(|source| StorageError::Encode {
            key: full.clone(),
            source,
        })?;
        self.backend.write(&full, encoded);
        Ok(())
    }

    pub fn remove(&self, key: &str) {
        self.backend.remove(&self.full_key(key));
    }

    /// Removes every key under this facade's `prefix`/`namespace`. Without
    /// either (or with a custom `key_fn`, whose keys carry no recoverable
    /// scope) the whole backend is cleared.
    pub fn clear(&self) {
        if self.key_fn.is_some() || (self.prefix.is_none() && self.namespace.is_none()) {
            self.backend.clear();
            return;
        }
        let scope = self.full_key("");
        for key in self.backend.keys() {
            if key.starts_with(&scope) {
                self.backend.remove(&key);
            }
        }
    }

    /// Binds a signal to a key: seeds the signal from storage when the key
    /// holds a decodable value, then writes every change back until the
    /// storage token cancels (or the returned guard runs).
    pub fn sync_signal<T>(&self, key: &str, sig: &Signal<T>) -> Dispose
    where
        T: Serialize + DeserializeOwned + Clone + 'static,
    {
        if let Some(v) = self.get::<T>(key) {
            sig.set(v);
        }

        let backend = self.backend.clone();
        let full = self.full_key(key);
        sig.subscribe_until(&self.token, move |v| match serde_json::to_string(v) {
            Ok(encoded) => backend.write(&full, encoded),
            Err(err) => log::warn!("storage: failed to encode '{full}': {err}"),
        })
    }

    pub fn destroy(&self) {
        self.token.cancel();
    }
}
