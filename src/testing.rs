//! In-memory stand-in for the file server, recording every call.

use async_trait::async_trait;
use reqwest::Url;
use std::collections::{ HashMap, HashSet };
use std::sync::Mutex;

use crate::api::FileApi;
use crate::error::{ Error, Result };
use crate::models::{ DirectoryEntry, ServerReply };

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Drives,
    Browse(String),
    Read(String),
    Save(String, String),
    Create(String),
    Mkdir(String),
    Delete(String),
    Rename(String, String),
    Upload(String, Vec<u8>),
    Download(String),
    Prompt(String),
}

pub fn dir(name: &str, path: &str) -> DirectoryEntry {
    DirectoryEntry { name: name.to_string(), path: path.to_string(), is_dir: true, size: None }
}

pub fn file(name: &str, path: &str, size: u64) -> DirectoryEntry {
    DirectoryEntry { name: name.to_string(), path: path.to_string(), is_dir: false, size: Some(size) }
}

#[derive(Default)]
pub struct FakeApi {
    drives: Vec<String>,
    dirs: HashMap<String, Vec<DirectoryEntry>>,
    files: HashMap<String, String>,
    prompt_reply: Option<ServerReply>,
    refused: Mutex<HashSet<&'static str>>,
    transport_down: Mutex<bool>,
    calls: Mutex<Vec<Call>>,
}

impl FakeApi {
    pub fn new() -> Self {
        FakeApi::default()
    }

    pub fn with_drives(mut self, drives: &[&str]) -> Self {
        self.drives = drives
            .iter()
            .map(|d| d.to_string())
            .collect();
        self
    }

    pub fn with_dir(mut self, path: &str, entries: Vec<DirectoryEntry>) -> Self {
        self.dirs.insert(path.to_string(), entries);
        self
    }

    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.files.insert(path.to_string(), content.to_string());
        self
    }

    pub fn with_prompt_reply(mut self, reply: ServerReply) -> Self {
        self.prompt_reply = Some(reply);
        self
    }

    /// Makes `route` answer with a 500.
    pub fn refuse(&self, route: &'static str) {
        self.refused.lock().unwrap().insert(route);
    }

    pub fn fail_transport(&self, down: bool) {
        *self.transport_down.lock().unwrap() = down;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn browsed(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| {
                match call {
                    Call::Browse(path) => Some(path),
                    _ => None,
                }
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, route: &'static str, call: Call) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        if *self.transport_down.lock().unwrap() {
            return Err(Error::Io(std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "down")));
        }
        if self.refused.lock().unwrap().contains(route) {
            return Err(Error::Status { status: 500, detail: format!("{} refused", route) });
        }
        Ok(())
    }
}

fn not_found(what: &str) -> Error {
    Error::Status { status: 404, detail: format!("{} not found", what) }
}

#[async_trait]
impl FileApi for FakeApi {
    async fn drives(&self) -> Result<Vec<String>> {
        self.record("drives", Call::Drives)?;
        Ok(self.drives.clone())
    }

    async fn browse(&self, path: &str) -> Result<Vec<DirectoryEntry>> {
        self.record("browse", Call::Browse(path.to_string()))?;
        self.dirs.get(path).cloned().ok_or_else(|| not_found(path))
    }

    async fn read(&self, path: &str) -> Result<String> {
        self.record("read", Call::Read(path.to_string()))?;
        if self.dirs.contains_key(path) && !self.files.contains_key(path) {
            return Err(Error::Status { status: 400, detail: "Path is a directory".to_string() });
        }
        self.files.get(path).cloned().ok_or_else(|| not_found(path))
    }

    async fn save(&self, path: &str, content: &str) -> Result<ServerReply> {
        self.record("save", Call::Save(path.to_string(), content.to_string()))?;
        Ok(ServerReply::message(&format!("saved {}", path)))
    }

    async fn create(&self, path: &str) -> Result<ServerReply> {
        self.record("create", Call::Create(path.to_string()))?;
        Ok(ServerReply::default())
    }

    async fn mkdir(&self, path: &str) -> Result<ServerReply> {
        self.record("mkdir", Call::Mkdir(path.to_string()))?;
        Ok(ServerReply::default())
    }

    async fn delete(&self, path: &str) -> Result<ServerReply> {
        self.record("delete", Call::Delete(path.to_string()))?;
        Ok(ServerReply::default())
    }

    async fn rename(&self, old: &str, new: &str) -> Result<ServerReply> {
        self.record("rename", Call::Rename(old.to_string(), new.to_string()))?;
        Ok(ServerReply::default())
    }

    async fn upload(&self, path: &str, _file_name: &str, bytes: Vec<u8>) -> Result<ServerReply> {
        self.record("upload", Call::Upload(path.to_string(), bytes))?;
        Ok(ServerReply::default())
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>> {
        self.record("download", Call::Download(path.to_string()))?;
        self.files
            .get(path)
            .map(|content| content.as_bytes().to_vec())
            .ok_or_else(|| not_found(path))
    }

    async fn prompt(&self, text: &str) -> Result<ServerReply> {
        self.record("prompt", Call::Prompt(text.to_string()))?;
        Ok(self.prompt_reply.clone().unwrap_or_else(|| ServerReply::message("ok")))
    }

    fn download_url(&self, path: &str) -> Result<Url> {
        let mut url = Url::parse("http://fake.test/api/download")
            .map_err(|e| Error::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut().append_pair("path", path);
        Ok(url)
    }
}
