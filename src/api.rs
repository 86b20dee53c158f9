use async_trait::async_trait;
use reqwest::multipart::{ Form, Part };
use reqwest::{ Client, Method, RequestBuilder, Response, Url };
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{ Error, Result };
use crate::models::{
    BrowseResponse,
    DirectoryEntry,
    DrivesResponse,
    PromptRequest,
    ReadResponse,
    SaveRequest,
    ServerReply,
};

/// The server's file endpoints, one method per route.
#[async_trait]
pub trait FileApi: Send + Sync {
    async fn drives(&self) -> Result<Vec<String>>;
    async fn browse(&self, path: &str) -> Result<Vec<DirectoryEntry>>;
    /// Fails with [`Error::Status`] when the server won't read `path` as a file.
    async fn read(&self, path: &str) -> Result<String>;
    async fn save(&self, path: &str, content: &str) -> Result<ServerReply>;
    async fn create(&self, path: &str) -> Result<ServerReply>;
    async fn mkdir(&self, path: &str) -> Result<ServerReply>;
    async fn delete(&self, path: &str) -> Result<ServerReply>;
    async fn rename(&self, old: &str, new: &str) -> Result<ServerReply>;
    async fn upload(&self, path: &str, file_name: &str, bytes: Vec<u8>) -> Result<ServerReply>;
    async fn download(&self, path: &str) -> Result<Vec<u8>>;
    async fn prompt(&self, text: &str) -> Result<ServerReply>;
    /// URL that serves the raw bytes of `path`, for handing to a browser.
    fn download_url(&self, path: &str) -> Result<Url>;
}

pub struct HttpApi {
    client: Client,
    base: Url,
}

impl HttpApi {
    pub fn new(server_url: &str) -> Result<Self> {
        let base = Url::parse(server_url)
            .and_then(|url| url.join("api/"))
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", server_url, e)))?;
        Ok(HttpApi { client: Client::new(), base })
    }

    fn endpoint(&self, name: &str) -> Result<Url> {
        self.base.join(name).map_err(|e| Error::InvalidUrl(format!("{}: {}", name, e)))
    }

    fn request(&self, method: Method, name: &str) -> Result<RequestBuilder> {
        let url = self.endpoint(name)?;
        debug!(%method, %url, "request");
        Ok(self.client.request(method, url))
    }

    async fn json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
        let res = check(request.send().await?).await?;
        let text = res.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Status-only routes: the body is informative, never required.
    async fn reply(request: RequestBuilder) -> Result<ServerReply> {
        let res = check(request.send().await?).await?;
        let text = res.text().await?;
        Ok(serde_json::from_str(&text).unwrap_or_default())
    }
}

async fn check(res: Response) -> Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    let detail = error_detail(&body)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
    debug!(status = status.as_u16(), %detail, "server refused request");
    Err(Error::Status { status: status.as_u16(), detail })
}

/// Pulls the human readable part out of an error body. The server sends
/// `{"detail": ...}`; anything else is shown as-is.
pub fn error_detail(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) =>
            match map.get("detail") {
                Some(serde_json::Value::String(detail)) => Some(detail.to_string()),
                Some(detail) => Some(detail.to_string()),
                None => Some(body.to_string()),
            }
        _ => Some(body.to_string()),
    }
}

#[async_trait]
impl FileApi for HttpApi {
    async fn drives(&self) -> Result<Vec<String>> {
        let res: DrivesResponse = Self::json(self.request(Method::GET, "drives")?).await?;
        Ok(res.drives)
    }

    async fn browse(&self, path: &str) -> Result<Vec<DirectoryEntry>> {
        let request = self.request(Method::GET, "browse")?.query(&[("path", path)]);
        let res: BrowseResponse = Self::json(request).await?;
        Ok(res.items)
    }

    async fn read(&self, path: &str) -> Result<String> {
        let request = self.request(Method::GET, "read")?.query(&[("path", path)]);
        let res: ReadResponse = Self::json(request).await?;
        Ok(res.content)
    }

    async fn save(&self, path: &str, content: &str) -> Result<ServerReply> {
        let request = self.request(Method::POST, "save")?.json(&(SaveRequest { path, content }));
        Self::reply(request).await
    }

    async fn create(&self, path: &str) -> Result<ServerReply> {
        let request = self.request(Method::POST, "create")?.form(&[("path", path)]);
        Self::reply(request).await
    }

    async fn mkdir(&self, path: &str) -> Result<ServerReply> {
        let request = self.request(Method::POST, "mkdir")?.form(&[("path", path)]);
        Self::reply(request).await
    }

    async fn delete(&self, path: &str) -> Result<ServerReply> {
        let request = self.request(Method::DELETE, "delete")?.query(&[("path", path)]);
        Self::reply(request).await
    }

    async fn rename(&self, old: &str, new: &str) -> Result<ServerReply> {
        let request = self.request(Method::POST, "rename")?.form(
            &[
                ("old", old),
                ("new", new),
            ]
        );
        Self::reply(request).await
    }

    async fn upload(&self, path: &str, file_name: &str, bytes: Vec<u8>) -> Result<ServerReply> {
        let form = Form::new()
            .text("path", path.to_string())
            .part("file", Part::bytes(bytes).file_name(file_name.to_string()));
        let request = self.request(Method::POST, "upload")?.multipart(form);
        Self::reply(request).await
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>> {
        let request = self.request(Method::GET, "download")?.query(&[("path", path)]);
        let res = check(request.send().await?).await?;
        Ok(res.bytes().await?.to_vec())
    }

    async fn prompt(&self, text: &str) -> Result<ServerReply> {
        let request = self
            .request(Method::POST, "prompt")?
            .json(&(PromptRequest { prompt: text }));
        Self::json(request).await
    }

    fn download_url(&self, path: &str) -> Result<Url> {
        let mut url = self.endpoint("download")?;
        url.query_pairs_mut().append_pair("path", path);
        Ok(url)
    }
}
