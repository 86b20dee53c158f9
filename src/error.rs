#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server answered {status}: {detail}")]
    Status {
        status: u16,
        detail: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("couldn't parse yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid url {0}")]
    InvalidUrl(String),

    #[error("{0}")]
    Config(String),
}

impl Error {
    /// True when the server answered but refused the request.
    pub fn is_status(&self) -> bool {
        matches!(self, Error::Status { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_are_told_apart_from_local_ones() {
        let refused = Error::Status { status: 404, detail: "File not found".to_string() };
        assert!(refused.is_status());
        assert_eq!(refused.to_string(), "server answered 404: File not found");

        let local = Error::Config("no server url".to_string());
        assert!(!local.is_status());
    }
}
