use crate::domain_port::*;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// One file per key inside `dir`. Writes go through a temporary file and a
/// rename so a crash never leaves a half-written record behind.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
            && !key.starts_with('.');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_owned()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[async_trait::async_trait]
impl KeyValueStorage for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path(key)?;
        match fs::read_to_string(&path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path(key)?;
        fs::create_dir_all(&self.dir).await?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("waypoint-storage-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn set_get_remove() {
        let dir = scratch_dir();
        let storage = FileStorage::new(&dir);

        assert_eq!(storage.get("auth_token").await.unwrap(), None);

        storage.set("auth_token", r#"{"a":1}"#).await.unwrap();
        storage.set("auth_token", r#"{"a":2}"#).await.unwrap();
        assert_eq!(
            storage.get("auth_token").await.unwrap().as_deref(),
            Some(r#"{"a":2}"#)
        );

        storage.remove("auth_token").await.unwrap();
        storage.remove("auth_token").await.unwrap();
        assert_eq!(storage.get("auth_token").await.unwrap(), None);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn rejects_keys_that_escape_the_directory() {
        let storage = FileStorage::new(scratch_dir());
        for key in ["", "../secrets", "a/b", ".hidden"] {
            assert!(matches!(
                storage.get(key).await,
                Err(StorageError::InvalidKey(_))
            ));
        }
    }
}
