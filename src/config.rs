use serde::Deserialize;
use std::fs::File;
use std::io::{ ErrorKind, Read };
use std::path::{ Path, PathBuf };

use crate::error::{ Error, Result };

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000/";

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub server_url: String,
    /// Path to browse on startup. The first drive is used when unset.
    pub start_path: Option<String>,
    pub download_dir: PathBuf,
    pub log_level: String,
    /// Log destination. Stderr when unset.
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_url: DEFAULT_SERVER_URL.to_string(),
            start_path: None,
            download_dir: PathBuf::from("."),
            log_level: "warn".to_string(),
            log_file: None,
        }
    }
}

impl Config {
    /// Reads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Config> {
        let mut file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(Config::default());
            }
            Err(e) => {
                return Err(e.into());
            }
        };
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Config::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Config> {
        if contents.trim().is_empty() {
            return Ok(Config::default());
        }
        let mut config: Config = serde_yaml::from_str(contents)?;
        config.server_url = normalize_server_url(&config.server_url)?;
        Ok(config)
    }

    pub fn with_server(mut self, server_url: Option<String>) -> Result<Config> {
        if let Some(url) = server_url {
            self.server_url = normalize_server_url(&url)?;
        }
        Ok(self)
    }
}

/// Endpoint names are joined onto the server url, so it must end in `/`
/// for a base path like `http://host/files/` to survive the join.
pub fn normalize_server_url(url: &str) -> Result<String> {
    let url = url.trim();
    if url.is_empty() {
        return Err(Error::Config("server_url is empty".to_string()));
    }
    if url.ends_with('/') {
        return Ok(url.to_string());
    }
    Ok(format!("{}/", url))
}
