use async_trait::async_trait;
use rand::Rng;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::errors::ServiceError;

/// An uploaded file as received from a multipart request, before storage.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// File storage collaborator: save binary, get back a reference; delete by
/// reference (idempotent); resolve a reference to an absolute URL.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Stores the bytes and returns a relative reference, e.g.
    /// "uploads/slip-1a2b3c4d.png".
    async fn save(&self, bytes: &[u8], suggested_name: &str) -> Result<String, ServiceError>;

    /// Deletes the file behind the reference. Returns true when a file was
    /// actually removed; a missing file is not an error.
    async fn delete(&self, reference: &str) -> Result<bool, ServiceError>;

    /// Resolves a stored reference to an absolute URL.
    fn resolve_url(&self, reference: &str) -> String;
}

/// Local-filesystem file store serving files under `public_base_url`.
pub struct LocalFileStore {
    base_dir: PathBuf,
    public_base_url: String,
}

impl LocalFileStore {
    pub fn new(base_dir: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Strip path components and anything that is not a safe filename
    /// character, keeping the extension usable.
    fn sanitize(name: &str) -> String {
        let file_name = Path::new(name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload");

        let cleaned: String = file_name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        if cleaned.trim_matches(|c| c == '.' || c == '_').is_empty() {
            "upload".to_string()
        } else {
            cleaned
        }
    }

    fn unique_name(suggested: &str) -> String {
        let sanitized = Self::sanitize(suggested);
        let tag: u32 = rand::thread_rng().gen();
        match sanitized.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => format!("{}-{:08x}.{}", stem, tag, ext),
            _ => format!("{}-{:08x}", sanitized, tag),
        }
    }

    fn path_for(&self, reference: &str) -> Result<PathBuf, ServiceError> {
        let relative = reference.strip_prefix("uploads/").unwrap_or(reference);
        if relative.contains("..") || relative.contains('/') {
            return Err(ServiceError::InvalidInput(format!(
                "Invalid file reference: {}",
                reference
            )));
        }
        Ok(self.base_dir.join(relative))
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn save(&self, bytes: &[u8], suggested_name: &str) -> Result<String, ServiceError> {
        tokio::fs::create_dir_all(&self.base_dir)
            .await
            .map_err(|e| ServiceError::FileStorage(format!("create upload dir: {}", e)))?;

        let name = Self::unique_name(suggested_name);
        let path = self.base_dir.join(&name);

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| ServiceError::FileStorage(format!("write {}: {}", path.display(), e)))?;

        debug!(path = %path.display(), size = bytes.len(), "Stored uploaded file");
        Ok(format!("uploads/{}", name))
    }

    async fn delete(&self, reference: &str) -> Result<bool, ServiceError> {
        let path = self.path_for(reference)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Deleted stored file");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to delete stored file");
                Err(ServiceError::FileStorage(format!(
                    "delete {}: {}",
                    path.display(),
                    e
                )))
            }
        }
    }

    fn resolve_url(&self, reference: &str) -> String {
        format!(
            "{}/{}",
            self.public_base_url,
            reference.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store(dir: &tempfile::TempDir) -> LocalFileStore {
        LocalFileStore::new(dir.path(), "http://localhost:8080/")
    }

    #[tokio::test]
    async fn save_then_delete_roundtrip() {
        let dir = tempdir().unwrap();
        let store = store(&dir);

        let reference = store.save(b"slip bytes", "slip.png").await.unwrap();
        assert!(reference.starts_with("uploads/slip-"));
        assert!(reference.ends_with(".png"));

        assert!(store.delete(&reference).await.unwrap());
        // Second delete is idempotent: missing file is not an error.
        assert!(!store.delete(&reference).await.unwrap());
    }

    #[tokio::test]
    async fn sanitizes_hostile_names() {
        let dir = tempdir().unwrap();
        let store = store(&dir);

        let reference = store.save(b"x", "../../etc/passwd").await.unwrap();
        assert!(reference.starts_with("uploads/passwd-"));

        let stored = dir.path().read_dir().unwrap().count();
        assert_eq!(stored, 1);
    }

    #[tokio::test]
    async fn delete_rejects_traversal_references() {
        let dir = tempdir().unwrap();
        let store = store(&dir);
        assert!(store.delete("uploads/../secret").await.is_err());
    }

    #[test]
    fn resolve_url_joins_base_and_reference() {
        let dir = tempdir().unwrap();
        let store = store(&dir);
        assert_eq!(
            store.resolve_url("uploads/slip-abc.png"),
            "http://localhost:8080/uploads/slip-abc.png"
        );
    }
}
