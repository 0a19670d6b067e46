//! [`DiskStateRepository`], the file implementation of [`StateRepository`].

use std::{
  io::ErrorKind,
  path::{Path, PathBuf},
};

use tracing::debug;

use idpscim_core::{
  model::State,
  service::{StateRepository, StoreStateResult},
};

use crate::{Error, Result};

// ─── Repository ──────────────────────────────────────────────────────────────

/// Sync state stored as a pretty-printed JSON document at a fixed path.
#[derive(Debug, Clone)]
pub struct DiskStateRepository {
  path: PathBuf,
}

impl DiskStateRepository {
  /// A repository reading and writing `path`. Nothing is touched until the
  /// first call.
  pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

  pub fn path(&self) -> &Path { &self.path }

  fn tmp_path(&self) -> PathBuf {
    let mut name = self.path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    self.path.with_file_name(name)
  }

  async fn read(&self) -> Result<Option<State>> {
    let bytes = match tokio::fs::read(&self.path).await {
      Ok(bytes) => bytes,
      Err(e) if e.kind() == ErrorKind::NotFound => {
        debug!(path = %self.path.display(), "no state file yet");
        return Ok(None);
      }
      Err(source) => return Err(io_error(&self.path, source)),
    };

    let state = serde_json::from_slice(&bytes).map_err(|source| Error::Json {
      path: self.path.clone(),
      source,
    })?;
    Ok(Some(state))
  }

  async fn write(&self, state: &State) -> Result<StoreStateResult> {
    if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
      tokio::fs::create_dir_all(parent)
        .await
        .map_err(|source| io_error(parent, source))?;
    }

    let body = serde_json::to_vec_pretty(state).map_err(|source| Error::Json {
      path: self.path.clone(),
      source,
    })?;

    let tmp = self.tmp_path();
    tokio::fs::write(&tmp, &body)
      .await
      .map_err(|source| io_error(&tmp, source))?;
    tokio::fs::rename(&tmp, &self.path)
      .await
      .map_err(|source| io_error(&self.path, source))?;

    debug!(path = %self.path.display(), bytes = body.len(), "wrote state file");
    Ok(StoreStateResult {
      location: self.path.display().to_string(),
    })
  }
}

fn io_error(path: &Path, source: std::io::Error) -> Error {
  Error::Io {
    path: path.to_path_buf(),
    source,
  }
}

impl StateRepository for DiskStateRepository {
  type Error = Error;

  async fn get_state(&self) -> Result<Option<State>> { self.read().await }

  async fn store_state(&self, state: &State) -> Result<StoreStateResult> {
    self.write(state).await
  }
}
