use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;

use crate::types::{FailureKind, TransportError};
use crate::wire::{FilePayload, UploadRequest, UploadResponse};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8001";
const UPLOAD_PATH: &str = "/upload";
const UPLOAD_FOR_STREAMING_PATH: &str = "/upload_for_streaming";
const CHANNEL_PATH: &str = "/ws";

/// Where the service defaults document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultsSource {
    File(PathBuf),
    Url(String),
}

impl DefaultsSource {
    /// `http(s)://` locations are fetched, anything else is a file path.
    pub fn parse(location: &str) -> Self {
        let lower = location.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            DefaultsSource::Url(location.to_string())
        } else {
            DefaultsSource::File(PathBuf::from(location))
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub server_url: String,
    pub connect_timeout: Duration,
    /// Batch transcription of long recordings can take minutes.
    pub request_timeout: Duration,
    pub defaults: Option<DefaultsSource>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(600),
            defaults: None,
        }
    }
}

impl EngineSettings {
    /// WebSocket address of the event channel on the same server.
    pub fn channel_url(&self) -> Result<String, TransportError> {
        let mut url = url::Url::parse(&self.server_url)
            .map_err(|err| TransportError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            _ => "ws",
        };
        url.set_scheme(scheme)
            .map_err(|_| TransportError::new(FailureKind::InvalidUrl, "unsupported scheme"))?;
        url.set_path(CHANNEL_PATH);
        Ok(url.to_string())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.server_url.trim_end_matches('/'))
    }
}

/// An audio file read into memory for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl AudioFile {
    pub async fn read(path: &Path) -> Result<Self, TransportError> {
        let bytes = tokio::fs::read(path).await.map_err(|err| {
            TransportError::new(FailureKind::Io, format!("{}: {err}", path.display()))
        })?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());
        Ok(Self {
            mime: mime_for(&name).to_string(),
            name,
            bytes,
        })
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }
}

fn mime_for(name: &str) -> &'static str {
    let extension = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("m4a") => "audio/mp4",
        Some("ogg") | Some("opus") => "audio/ogg",
        Some("flac") => "audio/flac",
        Some("webm") => "audio/webm",
        _ => "application/octet-stream",
    }
}

#[async_trait::async_trait]
pub trait Uploader: Send + Sync {
    /// `POST /upload`: batch transcription. Returns the first transcript, if any.
    async fn upload_batch(
        &self,
        file: &AudioFile,
        params: &Value,
    ) -> Result<Option<String>, TransportError>;

    /// `POST /upload_for_streaming`: stores the file server-side for streaming.
    async fn upload_for_streaming(
        &self,
        file: &AudioFile,
        config: &Value,
    ) -> Result<String, TransportError>;

    /// `GET` of a text resource such as the defaults document.
    async fn fetch_text(&self, url: &str) -> Result<String, TransportError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestUploader {
    settings: EngineSettings,
}

impl ReqwestUploader {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    fn build_client(&self) -> Result<reqwest::Client, TransportError> {
        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .build()
            .map_err(|err| TransportError::new(FailureKind::Network, err.to_string()))
    }

    async fn post_upload(
        &self,
        path: &str,
        file: &AudioFile,
        config: &Value,
    ) -> Result<UploadResponse, TransportError> {
        let url = self.settings.endpoint(path);
        let parsed = reqwest::Url::parse(&url)
            .map_err(|err| TransportError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let request = UploadRequest {
            file: FilePayload {
                name: &file.name,
                data: file.data_url(),
            },
            config,
        };
        let body = serde_json::to_vec(&request)
            .map_err(|err| TransportError::new(FailureKind::MalformedResponse, err.to_string()))?;

        listen_logging::listen_debug!(
            "POST {url} ({} bytes of {})",
            file.bytes.len(),
            file.name
        );
        let response = self
            .build_client()?
            .post(parsed)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        let parsed: Option<UploadResponse> = serde_json::from_slice(&bytes).ok();

        if let Some(error) = parsed.as_ref().and_then(|body| body.error.clone()) {
            return Err(TransportError::new(FailureKind::Server, error));
        }
        if !status.is_success() {
            return Err(TransportError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        parsed.ok_or_else(|| {
            TransportError::new(FailureKind::MalformedResponse, "response is not a JSON object")
        })
    }
}

#[async_trait::async_trait]
impl Uploader for ReqwestUploader {
    async fn upload_batch(
        &self,
        file: &AudioFile,
        params: &Value,
    ) -> Result<Option<String>, TransportError> {
        let response = self.post_upload(UPLOAD_PATH, file, params).await?;
        Ok(response
            .results
            .as_ref()
            .and_then(|results| results.first_transcript())
            .map(str::to_string))
    }

    async fn upload_for_streaming(
        &self,
        file: &AudioFile,
        config: &Value,
    ) -> Result<String, TransportError> {
        let response = self
            .post_upload(UPLOAD_FOR_STREAMING_PATH, file, config)
            .await?;
        response.file_path.ok_or_else(|| {
            TransportError::new(FailureKind::MalformedResponse, "response has no file_path")
        })
    }

    async fn fetch_text(&self, url: &str) -> Result<String, TransportError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| TransportError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let response = self
            .build_client()?
            .get(parsed)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        response.text().await.map_err(map_reqwest_error)
    }
}

/// Reads the defaults document from its configured source.
pub async fn load_defaults(
    uploader: &dyn Uploader,
    source: &DefaultsSource,
) -> Result<String, TransportError> {
    match source {
        DefaultsSource::File(path) => tokio::fs::read_to_string(path).await.map_err(|err| {
            TransportError::new(FailureKind::Io, format!("{}: {err}", path.display()))
        }),
        DefaultsSource::Url(url) => uploader.fetch_text(url).await,
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::new(FailureKind::Timeout, err.to_string());
    }
    TransportError::new(FailureKind::Network, err.to_string())
}
