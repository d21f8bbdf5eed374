//! Durable key/value storage for the quote cart, and the persisted format.
//!
//! The cart is stored under [`CART_STORAGE_KEY`] as
//! `{"version": 1, "items": [{"product": {..}, "quantity": n}]}`. Carts written
//! before versioning existed are a bare JSON array of lines and still load.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::QuoteLine;

/// Key the cart is persisted under.
pub const CART_STORAGE_KEY: &str = "ayak_quote_cart";

/// Current persisted format version.
pub const CART_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum CartStoreError {
    #[error("cart storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("cart payload is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("cart payload has the wrong shape: expected a JSON object or array, found {0}")]
    UnexpectedShape(&'static str),

    #[error("unsupported cart format version {0}")]
    UnsupportedVersion(u64),

    #[error("cart storage unavailable: {0}")]
    Unavailable(String),
}

/// Durable string storage keyed by name, the server-side analogue of browser
/// local storage.
pub trait CartStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>, CartStoreError>;
    fn save(&self, key: &str, value: &str) -> Result<(), CartStoreError>;
}

#[derive(Serialize)]
struct PersistedCart<'a> {
    version: u32,
    items: &'a [QuoteLine],
}

#[derive(Deserialize)]
struct VersionedCart {
    items: Vec<QuoteLine>,
}

pub fn encode_cart(lines: &[QuoteLine]) -> Result<String, CartStoreError> {
    Ok(serde_json::to_string(&PersistedCart {
        version: CART_FORMAT_VERSION,
        items: lines,
    })?)
}

pub fn decode_cart(raw: &str) -> Result<Vec<QuoteLine>, CartStoreError> {
    let value: Value = serde_json::from_str(raw)?;
    match value {
        Value::Array(_) => Ok(serde_json::from_value(value)?),
        Value::Object(ref fields) => {
            let version = fields
                .get("version")
                .and_then(Value::as_u64)
                .unwrap_or_default();
            if version != u64::from(CART_FORMAT_VERSION) {
                return Err(CartStoreError::UnsupportedVersion(version));
            }
            let cart: VersionedCart = serde_json::from_value(value)?;
            Ok(cart.items)
        }
        other => Err(CartStoreError::UnexpectedShape(json_kind(&other))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// One JSON file per key inside a directory. Writes go to a temporary file
/// that is then renamed over the target.
#[derive(Debug, Clone)]
pub struct FileCartStore {
    dir: PathBuf,
}

impl FileCartStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn ensure_dir(&self) -> Result<(), CartStoreError> {
        if !Path::new(&self.dir).exists() {
            fs::create_dir_all(&self.dir)?;
        }
        Ok(())
    }
}

impl CartStore for FileCartStore {
    fn load(&self, key: &str) -> Result<Option<String>, CartStoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), CartStoreError> {
        self.ensure_dir()?;
        let target = self.path_for(key);
        let tmp = self.dir.join(format!(".{}.json.tmp", key));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &target)?;
        Ok(())
    }
}

/// Process-local store. Clones share the same entries, so two carts built
/// over clones behave like two tabs of one browser.
#[derive(Debug, Clone, Default)]
pub struct MemoryCartStore {
    inner: Arc<Mutex<MemoryCartInner>>,
}

#[derive(Debug, Default)]
struct MemoryCartInner {
    entries: HashMap<String, String>,
    unavailable: bool,
}

impl MemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent load and save fail, like a full or disabled
    /// browser storage.
    pub fn set_unavailable(&self, unavailable: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.unavailable = unavailable;
        }
    }

    /// Writes a raw value, bypassing the cart format.
    pub fn insert_raw(&self, key: &str, value: &str) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.entries.insert(key.to_string(), value.to_string());
        }
    }

    fn with_inner<T>(
        &self,
        f: impl FnOnce(&mut MemoryCartInner) -> T,
    ) -> Result<T, CartStoreError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| CartStoreError::Unavailable("store lock poisoned".to_string()))?;
        if inner.unavailable {
            return Err(CartStoreError::Unavailable("storage disabled".to_string()));
        }
        Ok(f(&mut inner))
    }
}

impl CartStore for MemoryCartStore {
    fn load(&self, key: &str) -> Result<Option<String>, CartStoreError> {
        self.with_inner(|inner| inner.entries.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), CartStoreError> {
        self.with_inner(|inner| {
            inner.entries.insert(key.to_string(), value.to_string());
        })
    }
}
