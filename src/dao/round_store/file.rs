//! JSON file backend for the shared round document.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::future::BoxFuture;
use tokio::{fs, io::AsyncWriteExt};
use uuid::Uuid;

use crate::dao::{
    models::RoundStateEntity,
    round_store::RoundStore,
    storage::{StorageError, StorageResult},
};

/// Round store persisting the document as a JSON file.
///
/// Writes go to a uniquely named sibling file which is then renamed over the
/// canonical path, so readers in other processes see either the previous or
/// the next document and never a truncated one.
#[derive(Clone)]
pub struct FileRoundStore {
    path: Arc<PathBuf>,
}

impl FileRoundStore {
    /// Open a store at `path`, creating the parent directory when needed.
    pub async fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|source| {
                StorageError::unavailable(
                    format!("cannot create state directory `{}`", parent.display()),
                    source,
                )
            })?;
        }

        Ok(Self {
            path: Arc::new(path),
        })
    }

    /// Canonical location of the round document.
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "round_state.json".into());
        self.path
            .with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4().simple()))
    }
}

impl RoundStore for FileRoundStore {
    fn load(&self) -> BoxFuture<'static, StorageResult<Option<RoundStateEntity>>> {
        let path = self.path.clone();
        Box::pin(async move {
            let contents = match fs::read(path.as_path()).await {
                Ok(contents) => contents,
                Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
                Err(err) => {
                    return Err(StorageError::unavailable(
                        format!("cannot read `{}`", path.display()),
                        err,
                    ));
                }
            };

            serde_json::from_slice::<RoundStateEntity>(&contents)
                .map(Some)
                .map_err(|err| {
                    StorageError::decode(format!("cannot decode `{}`", path.display()), err)
                })
        })
    }

    fn replace(&self, round: RoundStateEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let payload = serde_json::to_vec(&round).map_err(|err| {
                StorageError::decode("cannot encode round document".into(), err)
            })?;

            let temp = store.temp_path();
            let written = write_file(&temp, &payload).await;
            let renamed = match written {
                Ok(()) => fs::rename(&temp, store.path.as_path()).await,
                Err(err) => Err(err),
            };

            if let Err(err) = renamed {
                let _ = fs::remove_file(&temp).await;
                return Err(StorageError::unavailable(
                    format!("cannot replace `{}`", store.path.display()),
                    err,
                ));
            }

            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let scratch = store.temp_path();
            let result = write_file(&scratch, b"{}").await;
            let _ = fs::remove_file(&scratch).await;
            result.map_err(|err| {
                StorageError::unavailable(
                    format!("state location `{}` is not writable", store.path.display()),
                    err,
                )
            })
        })
    }
}

async fn write_file(path: &Path, payload: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(payload).await?;
    file.sync_all().await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RoundStateEntity {
        RoundStateEntity {
            winner: Some("Red".into()),
            active: true,
            revealed: vec![2, 0],
            order: vec![2, 0, 3, 1],
            connected_teams: vec!["Red".into(), "Blue".into()],
            game_started: true,
            ..RoundStateEntity::default()
        }
    }

    #[tokio::test]
    async fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRoundStore::open(dir.path().join("state.json"))
            .await
            .unwrap();

        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn replace_then_load_returns_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRoundStore::open(dir.path().join("nested/state.json"))
            .await
            .unwrap();

        store.replace(sample()).await.unwrap();

        assert_eq!(store.load().await.unwrap(), Some(sample()));
    }

    #[tokio::test]
    async fn replace_leaves_no_temporary_files_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRoundStore::open(dir.path().join("state.json"))
            .await
            .unwrap();

        store.replace(sample()).await.unwrap();
        store.replace(RoundStateEntity::default()).await.unwrap();
        store.health_check().await.unwrap();

        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[tokio::test]
    async fn garbage_reports_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, b"{\"winner\": ").unwrap();
        let store = FileRoundStore::open(&path).await.unwrap();

        let err = store.load().await.unwrap_err();
        assert!(err.is_decode());
    }
}
