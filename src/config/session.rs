use crate::domain::model::TokenPair;
use crate::domain::ports::SessionStore;
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
struct SessionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 僅存在記憶體中的 session
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    data: Mutex<SessionData>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(access: &str, refresh: Option<&str>) -> Self {
        Self {
            data: Mutex::new(SessionData {
                access_token: Some(access.to_string()),
                refresh_token: refresh.map(str::to_string),
            }),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn access_token(&self) -> Option<String> {
        lock(&self.data).access_token.clone()
    }

    fn refresh_token(&self) -> Option<String> {
        lock(&self.data).refresh_token.clone()
    }

    fn store_tokens(&self, tokens: &TokenPair) -> Result<()> {
        let mut data = lock(&self.data);
        data.access_token = Some(tokens.access.clone());
        data.refresh_token = Some(tokens.refresh.clone());
        Ok(())
    }

    fn store_access(&self, access: &str) -> Result<()> {
        lock(&self.data).access_token = Some(access.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *lock(&self.data) = SessionData::default();
        Ok(())
    }
}

/// Session persisted as a small JSON file, so tokens survive between CLI runs.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    data: Mutex<SessionData>,
}

impl FileSessionStore {
    /// 從檔案載入 session；檔案不存在或損壞時視為未登入
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let data = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable session file {}: {}", path.display(), e);
                SessionData::default()
            }),
            Err(_) => SessionData::default(),
        };

        Self {
            path,
            data: Mutex::new(data),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, data: &SessionData) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_vec_pretty(data)?)?;
        tracing::debug!("Session saved to {}", self.path.display());
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn access_token(&self) -> Option<String> {
        lock(&self.data).access_token.clone()
    }

    fn refresh_token(&self) -> Option<String> {
        lock(&self.data).refresh_token.clone()
    }

    fn store_tokens(&self, tokens: &TokenPair) -> Result<()> {
        let mut data = lock(&self.data);
        data.access_token = Some(tokens.access.clone());
        data.refresh_token = Some(tokens.refresh.clone());
        self.persist(&data)
    }

    fn store_access(&self, access: &str) -> Result<()> {
        let mut data = lock(&self.data);
        data.access_token = Some(access.to_string());
        self.persist(&data)
    }

    fn clear(&self) -> Result<()> {
        *lock(&self.data) = SessionData::default();
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
