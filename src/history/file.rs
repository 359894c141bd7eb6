use crate::history::SessionStore;
use crate::models::chat::Session;
use log::{ error, info, warn };
use std::fs;
use std::io;
use std::path::{ Path, PathBuf };
use thiserror::Error;

#[derive(Debug, Error)]
enum StoreError {
    #[error("session file IO error: {0}")] Io(#[from] io::Error),
    #[error("session JSON error: {0}")] Json(#[from] serde_json::Error),
}

/// Keeps the session as one JSON document on disk.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Option<Session>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(None);
            }
            Err(e) => {
                return Err(e.into());
            }
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn write(&self, session: &Session) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Session {
        match self.read() {
            Ok(Some(session)) => {
                info!(
                    "Loaded session from {} ({} messages, {} turns)",
                    self.path.display(),
                    session.history.len(),
                    session.turns
                );
                session
            }
            Ok(None) => {
                info!("No saved session at {}, starting fresh", self.path.display());
                Session::default()
            }
            Err(e) => {
                error!("Failed to load session from {}: {}", self.path.display(), e);
                Session::default()
            }
        }
    }

    fn save(&self, session: &Session) {
        if let Err(e) = self.write(session) {
            error!("Failed to save session to {}: {}", self.path.display(), e);
        }
    }

    fn clear(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => info!("Cleared saved session at {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to clear session at {}: {}", self.path.display(), e),
        }
    }
}
