use std::path::{ Path, PathBuf };
use tracing::{ debug, info, warn };

use crate::api::FileApi;
use crate::error::Result;
use crate::models::DirectoryEntry;
use crate::paths;

/// Everything the front end draws. Owned by the [`Navigator`] and only
/// changed through its operations.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Session {
    pub current_path: String,
    pub listing_path: String,
    pub entries: Vec<DirectoryEntry>,
    pub drives: Vec<String>,
    pub editor: String,
    pub status: String,
}

#[derive(Debug, PartialEq)]
pub enum Opened {
    File,
    Directory,
}

pub struct Navigator<A> {
    api: A,
    session: Session,
}

impl<A: FileApi> Navigator<A> {
    pub fn new(api: A) -> Self {
        Navigator { api, session: Session::default() }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Points the selection at `path` without asking the server anything.
    pub fn select(&mut self, path: &str) {
        self.session.current_path = path.to_string();
    }

    #[cfg(test)]
    pub fn set_editor(&mut self, content: String) {
        self.session.editor = content;
    }

    pub fn set_status(&mut self, status: String) {
        self.session.status = status;
    }

    pub async fn list_drives(&mut self) -> Result<&[String]> {
        self.session.drives = self.api.drives().await?;
        Ok(&self.session.drives)
    }

    /// Replaces the listing with `path`'s entries. On failure the session is
    /// left exactly as it was.
    pub async fn browse(&mut self, path: &str) -> Result<()> {
        let entries = self.api.browse(path).await?;
        debug!(path, count = entries.len(), "browsed");
        self.session.entries = entries;
        self.session.listing_path = path.to_string();
        self.session.current_path = path.to_string();
        Ok(())
    }

    /// Reads `path` into the editor. When the server refuses to read it the
    /// path is treated as a directory and browsed instead.
    pub async fn open(&mut self, path: &str) -> Result<Opened> {
        match self.api.read(path).await {
            Ok(content) => {
                self.session.editor = content;
                self.session.current_path = path.to_string();
                Ok(Opened::File)
            }
            Err(e) if e.is_status() => {
                debug!(path, error = %e, "not readable as a file, browsing");
                self.browse(path).await?;
                Ok(Opened::Directory)
            }
            Err(e) => Err(e),
        }
    }

    /// Saves `content` to the current path and shows its parent directory.
    pub async fn save(&mut self, content: String) -> Result<()> {
        let path = self.session.current_path.clone();
        let result = self.api.save(&path, &content).await;
        if let Ok(reply) = &result {
            info!(path = %path, "saved");
            self.session.status = reply.summary();
        }
        self.session.editor = content;
        self.settle(result.map(|_| ()), paths::parent_or_self(&path)).await
    }

    /// Creates an empty file `name` under the current path.
    pub async fn create(&mut self, name: &str) -> Result<String> {
        let base = self.session.current_path.clone();
        let path = paths::child(&base, name);
        self.create_path(&path, &base).await?;
        Ok(path)
    }

    /// Creates an empty file at `path` as given, then shows `refresh`.
    pub async fn create_path(&mut self, path: &str, refresh: &str) -> Result<()> {
        let result = self.api.create(path).await;
        info!(path, ok = result.is_ok(), "create");
        self.settle(result.map(|_| ()), refresh).await
    }

    pub async fn mkdir(&mut self, name: &str) -> Result<String> {
        let base = self.session.current_path.clone();
        let path = paths::child(&base, name);
        self.mkdir_path(&path, &base).await?;
        Ok(path)
    }

    pub async fn mkdir_path(&mut self, path: &str, refresh: &str) -> Result<()> {
        let result = self.api.mkdir(path).await;
        info!(path, ok = result.is_ok(), "mkdir");
        self.settle(result.map(|_| ()), refresh).await
    }

    /// Deletes the current path once `confirm` agrees. Returns whether
    /// anything was sent.
    pub async fn delete<F>(&mut self, confirm: F) -> Result<bool> where F: FnOnce(&str) -> bool {
        let path = self.session.current_path.clone();
        if !confirm(&path) {
            return Ok(false);
        }
        self.session.editor.clear();
        let result = self.api.delete(&path).await;
        info!(path = %path, ok = result.is_ok(), "delete");
        self.settle(result, paths::parent_or_root(&path)).await?;
        Ok(true)
    }

    pub async fn rename(&mut self, old: &str, new: &str) -> Result<()> {
        let listing = self.session.listing_path.clone();
        let result = self.api.rename(old, new).await;
        info!(old, new, ok = result.is_ok(), "rename");
        self.settle(result.map(|_| ()), &listing).await
    }

    /// Uploads a local file as `name` under the current path.
    pub async fn upload(&mut self, local: &Path, name: &str) -> Result<String> {
        let base = self.session.current_path.clone();
        let path = paths::child(&base, name);
        self.upload_to(local, &path, &base).await?;
        Ok(path)
    }

    /// Uploads a local file to `path` as given, then shows `refresh`.
    pub async fn upload_to(&mut self, local: &Path, path: &str, refresh: &str) -> Result<()> {
        let bytes = tokio::fs::read(local).await?;
        let result = self.api.upload(path, paths::file_name(path), bytes).await;
        info!(path, ok = result.is_ok(), "upload");
        self.settle(result.map(|_| ()), refresh).await
    }

    /// Fetches the current path into `dest_dir`, named after its last segment.
    pub async fn download(&self, dest_dir: &Path) -> Result<PathBuf> {
        let path = &self.session.current_path;
        let bytes = self.api.download(path).await?;
        let target = dest_dir.join(paths::file_name(path));
        tokio::fs::write(&target, &bytes).await?;
        info!(path = %path, target = %target.display(), size = bytes.len(), "downloaded");
        Ok(target)
    }

    /// Submits free text to the server's prompt action. Error replies are
    /// shown like messages; the listing is refreshed either way.
    pub async fn run_prompt(&mut self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }
        let result = self.api.prompt(text).await;
        if let Ok(reply) = &result {
            self.session.status = reply.summary();
        }
        let refresh = if self.session.current_path.is_empty() {
            "/".to_string()
        } else {
            self.session.current_path.clone()
        };
        self.settle(result.map(|_| ()), &refresh).await
    }

    /// Refreshes `refresh` after a mutation, whatever its outcome. The
    /// mutation's own error takes precedence over a failed refresh.
    async fn settle<T>(&mut self, result: Result<T>, refresh: &str) -> Result<T> {
        let refreshed = self.browse(refresh).await;
        match (result, refreshed) {
            (Err(e), refreshed) => {
                if let Err(refresh_error) = refreshed {
                    warn!(path = refresh, error = %refresh_error, "refresh failed");
                }
                Err(e)
            }
            (Ok(_), Err(e)) => Err(e),
            (Ok(value), Ok(())) => Ok(value),
        }
    }
}
