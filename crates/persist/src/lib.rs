use std::collections::BTreeMap;

use base64::Engine as _;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    StorageUnavailable,
    Corrupt(String),
    Io(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::StorageUnavailable => write!(f, "browser storage unavailable"),
            StoreError::Corrupt(msg) => write!(f, "state storage corrupt: {msg}"),
            StoreError::Io(msg) => write!(f, "state storage error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Key/value persistence for serialized UI state.
///
/// Blobs are opaque to the store; callers own the format.
pub trait StateStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn save(&mut self, key: &str, blob: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<bool, StoreError>;
}

/// Storage key for one tree's state on one page.
///
/// The page identity is the document URL with any query string stripped, so
/// the same page keeps its state across differently parameterized loads.
pub fn state_key(tree_name: &str, page_identity: &str) -> String {
    let page = page_identity.split('?').next().unwrap_or_default();
    let digest = blake3::hash(page.as_bytes()).to_hex();
    format!("{}_{}", tree_name, &digest[..16])
}

#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    entries: BTreeMap<String, String>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl StateStore for InMemoryStateStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, blob: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool, StoreError> {
        Ok(self.entries.remove(key).is_some())
    }
}

/// Cookie-backed store.
///
/// Holds the `name=value` pairs of a `Cookie` header. Values are base64url
/// encoded so arbitrary blobs survive the cookie grammar (no `;`, `,` or
/// whitespace).
#[derive(Debug, Default)]
pub struct CookieJarStore {
    cookies: BTreeMap<String, String>,
}

impl CookieJarStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a `document.cookie` / `Cookie:` header string.
    ///
    /// Malformed pairs are skipped; cookies not written by this store are
    /// kept and written back untouched.
    pub fn from_header(header: &str) -> Self {
        let mut cookies = BTreeMap::new();
        for pair in header.split(';') {
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            cookies.insert(name.to_string(), value.trim().to_string());
        }
        Self { cookies }
    }

    pub fn to_header(&self) -> String {
        self.cookies
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// `Set-Cookie` style assignment for one key, suitable for
    /// `document.cookie = ...`.
    pub fn assignment(&self, key: &str) -> Option<String> {
        self.cookies.get(key).map(|v| format!("{key}={v}; path=/"))
    }
}

fn encode_cookie_value(blob: &str) -> String {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(blob.as_bytes())
}

fn decode_cookie_value(value: &str) -> Result<String, StoreError> {
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(value)
        .map_err(|e| StoreError::Corrupt(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| StoreError::Corrupt(e.to_string()))
}

impl StateStore for CookieJarStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        let Some(raw) = self.cookies.get(key) else {
            return Ok(None);
        };
        if raw.is_empty() {
            return Ok(None);
        }
        decode_cookie_value(raw).map(Some)
    }

    fn save(&mut self, key: &str, blob: &str) -> Result<(), StoreError> {
        debug!(key, bytes = blob.len(), "saving cookie state");
        self.cookies.insert(key.to_string(), encode_cookie_value(blob));
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool, StoreError> {
        Ok(self.cookies.remove(key).is_some())
    }
}

#[cfg(target_arch = "wasm32")]
mod wasm_storage {
    use super::{StateStore, StoreError};

    /// `window.localStorage` backed store. Keys are namespaced with a prefix.
    #[derive(Debug)]
    pub struct LocalStorageStateStore {
        key_prefix: String,
    }

    impl LocalStorageStateStore {
        pub fn new(key_prefix: impl Into<String>) -> Result<Self, StoreError> {
            // Fail early when storage is disabled (private mode, sandboxed iframes).
            window_local_storage()?;
            Ok(Self {
                key_prefix: key_prefix.into(),
            })
        }

        fn full_key(&self, key: &str) -> String {
            format!("{}.{}", self.key_prefix, key)
        }
    }

    impl StateStore for LocalStorageStateStore {
        fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
            let storage = window_local_storage()?;
            let raw = storage
                .get_item(&self.full_key(key))
                .map_err(|e| StoreError::Io(format!("get_item failed: {:?}", e)))?;
            Ok(raw.filter(|s| !s.trim().is_empty()))
        }

        fn save(&mut self, key: &str, blob: &str) -> Result<(), StoreError> {
            let storage = window_local_storage()?;
            storage
                .set_item(&self.full_key(key), blob)
                .map_err(|e| StoreError::Io(format!("set_item failed: {:?}", e)))
        }

        fn remove(&mut self, key: &str) -> Result<bool, StoreError> {
            let existed = self.load(key)?.is_some();
            let storage = window_local_storage()?;
            storage
                .remove_item(&self.full_key(key))
                .map_err(|e| StoreError::Io(format!("remove_item failed: {:?}", e)))?;
            Ok(existed)
        }
    }

    fn window_local_storage() -> Result<web_sys::Storage, StoreError> {
        let win = web_sys::window().ok_or(StoreError::StorageUnavailable)?;
        win.local_storage()
            .map_err(|e| StoreError::Io(format!("localStorage error: {:?}", e)))?
            .ok_or(StoreError::StorageUnavailable)
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm_storage::LocalStorageStateStore;

#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct LocalStorageStateStore;

#[cfg(not(target_arch = "wasm32"))]
impl LocalStorageStateStore {
    pub fn new(_key_prefix: impl Into<String>) -> Result<Self, StoreError> {
        Err(StoreError::StorageUnavailable)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl StateStore for LocalStorageStateStore {
    fn load(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::StorageUnavailable)
    }

    fn save(&mut self, _key: &str, _blob: &str) -> Result<(), StoreError> {
        Err(StoreError::StorageUnavailable)
    }

    fn remove(&mut self, _key: &str) -> Result<bool, StoreError> {
        Err(StoreError::StorageUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn state_key_ignores_query_string() {
        let a = state_key("datasetTree", "http://host/moqua/index.html?x=1");
        let b = state_key("datasetTree", "http://host/moqua/index.html");
        assert_eq!(a, b);
        assert!(a.starts_with("datasetTree_"));
        assert_ne!(a, state_key("variableTree", "http://host/moqua/index.html"));
    }

    #[test]
    fn memory_store_round_trip() {
        let mut store = InMemoryStateStore::new();
        assert_eq!(store.load("k").unwrap(), None);
        store.save("k", "v").unwrap();
        assert_eq!(store.load("k").unwrap(), Some("v".to_string()));
        assert!(store.remove("k").unwrap());
        assert!(!store.remove("k").unwrap());
    }

    #[test]
    fn cookie_values_survive_delimiters() {
        let mut jar = CookieJarStore::new();
        let blob = r#"[{"id":"1","open":"open","check":1}; ,x]"#;
        jar.save("tree_abc", blob).unwrap();
        let header = jar.to_header();
        assert!(!header.contains(','));

        let reparsed = CookieJarStore::from_header(&header);
        assert_eq!(reparsed.load("tree_abc").unwrap(), Some(blob.to_string()));
    }

    #[test]
    fn foreign_cookies_are_preserved() {
        let jar = CookieJarStore::from_header("session=abc; junk; theme=dark");
        assert_eq!(jar.to_header(), "session=abc; theme=dark");
        assert_eq!(
            jar.assignment("theme"),
            Some("theme=dark; path=/".to_string())
        );
    }

    #[test]
    fn corrupt_cookie_is_reported() {
        let jar = CookieJarStore::from_header("tree=***");
        assert!(matches!(jar.load("tree"), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn local_storage_unavailable_off_wasm() {
        assert_eq!(
            LocalStorageStateStore::new("moqua").err(),
            Some(StoreError::StorageUnavailable)
        );
    }
}
