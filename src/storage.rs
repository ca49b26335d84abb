use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::auth::AccessToken;
use crate::{Error, Locked, Result, Shared};

/// Key/value storage capability, mirroring what a browser offers through `localStorage` and
/// `sessionStorage`.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Volatile storage that lives as long as the process. Used for session scoped values.
#[derive(Debug, Default)]
pub struct MemoryStorage(Locked<HashMap<String, String>>);

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.0.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.0
            .lock()
            .map_err(|e| Error::Storage(e.to_string()))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.0
            .lock()
            .map_err(|e| Error::Storage(e.to_string()))?
            .remove(key);
        Ok(())
    }
}

/// Storage backed by one file per key inside a directory. Survives restarts of the process,
/// which is what the verifier needs while the user is away at the provider.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Storage inside the systems native cache directory
    ///
    /// Windows: `%LocalAppData%\statify`
    /// Linux: `$XDG_CACHE_HOME/statify` or `$HOME/.cache/statify`
    /// MacOs: `$HOME/Library/Caches/statify`
    pub fn cache() -> Result<Self> {
        dirs::cache_dir()
            .map(|dir| Self::new(dir.join("statify")))
            .ok_or_else(|| Error::Configuration("No cache directory available for this user".into()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file(&self, key: &str) -> PathBuf {
        self.path.join(format!("{key}.txt"))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.file(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if !self.path.exists() {
            std::fs::create_dir_all(&self.path)?;
        }
        std::fs::write(self.file(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match std::fs::remove_file(self.file(key)) {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

/// Holds the pkce verifier for the single pending login.
#[derive(Clone)]
pub struct VerifierStore {
    storage: Shared<dyn Storage>,
}

impl VerifierStore {
    pub const KEY: &'static str = "verifier";

    pub fn new(storage: Shared<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn save(&self, verifier: &str) -> Result<()> {
        self.storage.set(Self::KEY, verifier)
    }

    pub fn load(&self) -> Option<String> {
        self.storage.get(Self::KEY).filter(|v| !v.is_empty())
    }

    pub fn clear(&self) -> Result<()> {
        self.storage.remove(Self::KEY)
    }
}

/// Holds the access token for the lifetime of the session.
#[derive(Clone)]
pub struct SessionTokenStore {
    storage: Shared<dyn Storage>,
    verifier: VerifierStore,
}

impl SessionTokenStore {
    pub const KEY: &'static str = "access_token";

    pub fn new(storage: Shared<dyn Storage>, verifier: VerifierStore) -> Self {
        Self { storage, verifier }
    }

    pub fn set(&self, token: &AccessToken) -> Result<()> {
        self.storage.set(Self::KEY, token.secret())
    }

    pub fn get(&self) -> Option<AccessToken> {
        self.storage
            .get(Self::KEY)
            .filter(|v| !v.is_empty())
            .map(AccessToken::new)
    }

    /// Remove the token along with any lingering verifier so a logout always resets login state.
    pub fn clear(&self) -> Result<()> {
        let token = self.storage.remove(Self::KEY);
        self.verifier.clear()?;
        token
    }

    pub fn verifier(&self) -> &VerifierStore {
        &self.verifier
    }
}
