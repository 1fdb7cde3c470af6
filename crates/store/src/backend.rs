use crate::StoreError;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// Callback for [`StoreBackend::update`]. Receives the current value and
/// returns the replacement, or `None` to leave the key untouched.
pub type UpdateFn<'a> = dyn FnMut(Option<&[u8]>) -> Result<Option<Vec<u8>>, StoreError> + 'a;

/// Callback for [`StoreBackend::scan_prefix`].
pub type VisitFn<'a> = dyn FnMut(&str, &[u8]) -> Result<(), StoreError> + 'a;

/// Trait for a key-value storage backend.
///
/// Implementations must make [`update`](StoreBackend::update) atomic with
/// respect to every other call on the same key: the read, the callback and
/// the write happen as one step. Callbacks must not call back into the
/// backend.
pub trait StoreBackend: Send + Sync {
    /// Insert or overwrite a value.
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;
    /// Retrieve a value by key.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    /// Delete a key.
    fn delete(&self, key: &str) -> Result<(), StoreError>;
    /// Atomic read-modify-write of a single key.
    fn update(&self, key: &str, apply: &mut UpdateFn<'_>) -> Result<(), StoreError>;
    /// Visit every entry whose key starts with `prefix`, in key order.
    fn scan_prefix(&self, prefix: &str, visitor: &mut VisitFn<'_>) -> Result<(), StoreError>;
    /// Flush any buffered writes.
    fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Selects and builds a backend.
///
/// ```
/// use store::BackendConfig;
///
/// let config = BackendConfig::in_memory();
/// let backend = config.build().unwrap();
/// backend.put("k", b"v").unwrap();
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum BackendConfig {
    /// Single-file ACID store. Requires the `backend-redb` feature.
    Redb { path: String },
    /// Process-lifetime map. Useful for tests and single-instance demos.
    #[default]
    InMemory,
}

impl BackendConfig {
    pub fn in_memory() -> Self {
        BackendConfig::InMemory
    }

    pub fn redb<P: Into<String>>(path: P) -> Self {
        BackendConfig::Redb { path: path.into() }
    }

    pub fn build(&self) -> Result<Box<dyn StoreBackend>, StoreError> {
        match self {
            BackendConfig::InMemory => Ok(Box::new(InMemoryBackend::new())),
            BackendConfig::Redb { path } => {
                #[cfg(feature = "backend-redb")]
                {
                    Ok(Box::new(RedbBackend::open(path)?))
                }
                #[cfg(not(feature = "backend-redb"))]
                {
                    let _ = path;
                    Err(StoreError::backend("redb backend disabled at compile time"))
                }
            }
        }
    }
}

/// An in-memory backend using a `RwLock` around an ordered map.
pub struct InMemoryBackend {
    records: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreBackend for InMemoryBackend {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.records
            .write()
            .map_err(|_| StoreError::backend("poisoned lock"))?
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let guard = self
            .records
            .read()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        Ok(guard.get(key).cloned())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.records
            .write()
            .map_err(|_| StoreError::backend("poisoned lock"))?
            .remove(key);
        Ok(())
    }

    fn update(&self, key: &str, apply: &mut UpdateFn<'_>) -> Result<(), StoreError> {
        // The write lock spans the read, the callback and the write.
        let mut guard = self
            .records
            .write()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        if let Some(next) = apply(guard.get(key).map(Vec::as_slice))? {
            guard.insert(key.to_string(), next);
        }
        Ok(())
    }

    fn scan_prefix(&self, prefix: &str, visitor: &mut VisitFn<'_>) -> Result<(), StoreError> {
        let guard = self
            .records
            .read()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        for (key, value) in guard.range(prefix.to_string()..) {
            if !key.starts_with(prefix) {
                break;
            }
            visitor(key, value)?;
        }
        Ok(())
    }
}

#[cfg(feature = "backend-redb")]
pub mod redb;

#[cfg(feature = "backend-redb")]
pub use self::redb::RedbBackend;
