/*
 * Copyright 2025 Carver Automation Corporation.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! File transfer seam for roster download and report upload.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::error::{Error, Result};

#[async_trait]
pub trait FileTransfer: Send + Sync {
    /// Fetch a remote file's contents.
    async fn download_file(&self, remote_path: &str) -> Result<Vec<u8>>;

    /// Store `bytes` under `remote_name` in the upload location.
    async fn upload_file(&self, bytes: &[u8], remote_name: &str) -> Result<()>;
}

/// Transfer against a mounted directory tree.
///
/// Remote paths are relative to `root` and may not leave it.
#[derive(Debug, Clone)]
pub struct LocalDirTransfer {
    root: PathBuf,
    upload_dir: String,
}

impl LocalDirTransfer {
    pub fn new(root: impl Into<PathBuf>, upload_dir: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            upload_dir: upload_dir.into(),
        }
    }

    /// Map a remote path onto the local tree.
    pub fn resolve(&self, remote_path: &str) -> Result<PathBuf> {
        let relative = Path::new(remote_path);
        let mut resolved = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(Error::Transfer {
                        path: remote_path.to_string(),
                        message: "path escapes the transfer root".to_string(),
                    });
                }
            }
        }
        if resolved == self.root {
            return Err(Error::Transfer {
                path: remote_path.to_string(),
                message: "empty path".to_string(),
            });
        }
        Ok(resolved)
    }

    fn upload_path(&self, remote_name: &str) -> Result<PathBuf> {
        let dir = self.upload_dir.trim_matches('/');
        let joined = if dir.is_empty() {
            remote_name.to_string()
        } else {
            format!("{}/{}", dir, remote_name)
        };
        self.resolve(&joined)
    }
}

#[async_trait]
impl FileTransfer for LocalDirTransfer {
    async fn download_file(&self, remote_path: &str) -> Result<Vec<u8>> {
        let path = self.resolve(remote_path)?;
        let bytes = tokio::fs::read(&path).await.map_err(|e| Error::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "downloaded file");
        Ok(bytes)
    }

    async fn upload_file(&self, bytes: &[u8], remote_name: &str) -> Result<()> {
        let path = self.upload_path(remote_name)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| Error::Io {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        tokio::fs::write(&path, bytes).await.map_err(|e| Error::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "uploaded file");
        Ok(())
    }
}
