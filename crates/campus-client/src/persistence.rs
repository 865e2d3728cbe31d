//! Session persistence across runs.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use campus_models::Session;
use tracing::warn;

/// JSON file holding the last session handed out by the identity service.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing or unreadable file means no session. A corrupt file is removed.
    pub async fn load(&self) -> Option<Session> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "could not read session file");
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "discarding corrupt session file");
                self.clear().await;
                None
            }
        }
    }

    pub async fn save(&self, session: &Session) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(session)?;
        tokio::fs::write(&self.path, json).await
    }

    pub async fn clear(&self) {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "could not remove session file"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_models::UserId;
    use tempfile::TempDir;

    fn session() -> Session {
        Session {
            user_id: UserId::from_u128(5),
            email: Some("ada@campus.edu".into()),
            access_token: "access".into(),
            refresh_token: "refresh".into(),
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn test_save_load_clear() {
        let dir = TempDir::new().unwrap();
        let file = SessionFile::new(dir.path().join("nested").join("session.json"));

        assert_eq!(file.load().await, None);
        file.save(&session()).await.unwrap();
        assert_eq!(file.load().await, Some(session()));

        file.clear().await;
        assert_eq!(file.load().await, None);
        // Clearing twice is fine.
        file.clear().await;
    }

    #[tokio::test]
    async fn test_corrupt_file_is_discarded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let file = SessionFile::new(&path);
        assert_eq!(file.load().await, None);
        assert!(!path.exists());
    }
}
