use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::{Mutex, RwLock};
use tracing::warn;

use crate::api::models::LoginResponse;
use crate::tprintln;

use super::session::{Role, Session};

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const ROLE_KEY: &str = "user_role";

/// Flat string key/value backend, the shape of browser local storage.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    map: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self { Self::default() }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> { self.map.read().get(key).cloned() }
    fn set(&self, key: &str, value: &str) { self.map.write().insert(key.to_string(), value.to_string()); }
    fn remove(&self, key: &str) { self.map.write().remove(key); }
}

/// Key/value map mirrored to a JSON file after every write.
/// The in-memory map stays authoritative; a failed flush is logged and otherwise ignored.
#[derive(Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
    map: RwLock<HashMap<String, String>>,
}

impl JsonFileStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let map = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading session file {}", path.display()))?;
            if text.trim().is_empty() {
                HashMap::new()
            } else {
                serde_json::from_str(&text)
                    .with_context(|| format!("parsing session file {}", path.display()))?
            }
        } else {
            HashMap::new()
        };
        Ok(Self { path, map: RwLock::new(map) })
    }

    pub fn path(&self) -> &Path { &self.path }

    fn flush(&self, map: &HashMap<String, String>) {
        let res = (|| -> Result<()> {
            if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir)?;
            }
            let text = serde_json::to_string_pretty(map)?;
            std::fs::write(&self.path, text)?;
            Ok(())
        })();
        if let Err(e) = res {
            warn!(target: "session", "failed to persist session file {}: {}", self.path.display(), e);
        }
    }
}

impl SessionStorage for JsonFileStorage {
    fn get(&self, key: &str) -> Option<String> { self.map.read().get(key).cloned() }

    fn set(&self, key: &str, value: &str) {
        let mut map = self.map.write();
        map.insert(key.to_string(), value.to_string());
        self.flush(&map);
    }

    fn remove(&self, key: &str) {
        let mut map = self.map.write();
        if map.remove(key).is_some() {
            self.flush(&map);
        }
    }
}

/// Session context shared by the request client and the session guard.
///
/// Cloning is cheap and every clone sees the same storage. Multi-key writes are serialized
/// so a `save` and a `clear` never interleave; otherwise the last writer wins.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn SessionStorage>,
    write_gate: Arc<Mutex<()>>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self { storage, write_gate: Arc::new(Mutex::new(())) }
    }

    pub fn in_memory() -> Self { Self::new(Arc::new(MemoryStorage::new())) }

    pub fn save(&self, tokens: &LoginResponse, role: Role) {
        let _gate = self.write_gate.lock();
        self.storage.set(ACCESS_TOKEN_KEY, &tokens.access_token);
        self.storage.set(REFRESH_TOKEN_KEY, &tokens.refresh_token);
        self.storage.set(ROLE_KEY, role.as_str());
        tprintln!("token_store.save role={}", role);
    }

    pub fn clear(&self) {
        let _gate = self.write_gate.lock();
        self.storage.remove(ACCESS_TOKEN_KEY);
        self.storage.remove(REFRESH_TOKEN_KEY);
        self.storage.remove(ROLE_KEY);
        tprintln!("token_store.clear");
    }

    pub fn access_token(&self) -> Option<String> {
        self.storage.get(ACCESS_TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.storage.get(REFRESH_TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn role(&self) -> Option<Role> {
        self.storage.get(ROLE_KEY).and_then(|r| r.parse().ok())
    }

    pub fn is_authenticated(&self) -> bool { self.access_token().is_some() }

    pub fn session(&self) -> Option<Session> {
        Some(Session {
            access_token: self.access_token()?,
            refresh_token: self.refresh_token().unwrap_or_default(),
            role: self.role()?,
        })
    }
}

impl Default for TokenStore {
    fn default() -> Self { Self::in_memory() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(access: &str) -> LoginResponse {
        LoginResponse { access_token: access.into(), refresh_token: "r-1".into(), expires_in: 3600 }
    }

    #[test]
    fn save_then_read_back() {
        let store = TokenStore::in_memory();
        assert!(!store.is_authenticated());
        assert_eq!(store.role(), None);

        store.save(&tokens("a-1"), Role::Admin);
        assert!(store.is_authenticated());
        assert_eq!(store.role(), Some(Role::Admin));
        assert_eq!(store.access_token().as_deref(), Some("a-1"));
        assert_eq!(
            store.session(),
            Some(Session { access_token: "a-1".into(), refresh_token: "r-1".into(), role: Role::Admin })
        );

        store.save(&tokens("a-2"), Role::User);
        assert_eq!(store.role(), Some(Role::User));
        assert_eq!(store.access_token().as_deref(), Some("a-2"));
    }

    #[test]
    fn clear_is_idempotent() {
        let store = TokenStore::in_memory();
        store.clear();
        assert!(!store.is_authenticated());

        store.save(&tokens("a-1"), Role::User);
        store.clear();
        assert!(!store.is_authenticated());
        assert_eq!(store.role(), None);
        assert_eq!(store.refresh_token(), None);
        store.clear();
        assert!(!store.is_authenticated());
        assert_eq!(store.session(), None);
    }

    #[test]
    fn clones_share_state() {
        let a = TokenStore::in_memory();
        let b = a.clone();
        a.save(&tokens("a-1"), Role::User);
        assert!(b.is_authenticated());
        b.clear();
        assert!(!a.is_authenticated());
    }

    #[test]
    fn unknown_role_reads_as_none() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(ACCESS_TOKEN_KEY, "a-1");
        storage.set(ROLE_KEY, "superuser");
        let store = TokenStore::new(storage);
        assert!(store.is_authenticated());
        assert_eq!(store.role(), None);
    }

    #[test]
    fn file_storage_survives_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("session.json");
        {
            let store = TokenStore::new(Arc::new(JsonFileStorage::open(&path).unwrap()));
            store.save(&tokens("a-9"), Role::Admin);
        }
        let reopened = TokenStore::new(Arc::new(JsonFileStorage::open(&path).unwrap()));
        assert_eq!(reopened.access_token().as_deref(), Some("a-9"));
        assert_eq!(reopened.role(), Some(Role::Admin));

        reopened.clear();
        let again = TokenStore::new(Arc::new(JsonFileStorage::open(&path).unwrap()));
        assert!(!again.is_authenticated());
    }

    #[test]
    fn file_storage_rejects_garbage() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(JsonFileStorage::open(&path).is_err());
    }
}
