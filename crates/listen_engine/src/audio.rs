use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::AsyncReadExt;

use crate::types::DeviceError;

/// Default chunk: 250 ms of 16 kHz mono 16-bit audio.
pub const DEFAULT_CHUNK_BYTES: usize = 8000;
pub const DEFAULT_CHUNK_INTERVAL: Duration = Duration::from_millis(250);

/// A microphone-like input that can be opened for capture.
#[async_trait::async_trait]
pub trait AudioSource: Send + Sync {
    async fn open(&self) -> Result<Box<dyn AudioCapture>, DeviceError>;
}

/// An open capture. Dropping it releases the device.
#[async_trait::async_trait]
pub trait AudioCapture: Send {
    /// The next chunk of encoded audio; `None` once the input is exhausted.
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, DeviceError>;
}

/// Used when no input device is configured; opening always fails.
#[derive(Debug, Clone, Default)]
pub struct NoAudioSource;

#[async_trait::async_trait]
impl AudioSource for NoAudioSource {
    async fn open(&self) -> Result<Box<dyn AudioCapture>, DeviceError> {
        Err(DeviceError::Unavailable(
            "no input device configured".to_string(),
        ))
    }
}

/// Replays a raw audio file at a fixed pace, standing in for a microphone.
#[derive(Debug, Clone)]
pub struct FileAudioSource {
    path: PathBuf,
    chunk_bytes: usize,
    interval: Duration,
}

impl FileAudioSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            chunk_bytes: DEFAULT_CHUNK_BYTES,
            interval: DEFAULT_CHUNK_INTERVAL,
        }
    }

    pub fn with_chunk_bytes(mut self, chunk_bytes: usize) -> Self {
        self.chunk_bytes = chunk_bytes.max(1);
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

#[async_trait::async_trait]
impl AudioSource for FileAudioSource {
    async fn open(&self) -> Result<Box<dyn AudioCapture>, DeviceError> {
        let file = tokio::fs::File::open(&self.path).await.map_err(|err| {
            if err.kind() == std::io::ErrorKind::PermissionDenied {
                DeviceError::PermissionDenied(self.path.display().to_string())
            } else {
                DeviceError::Unavailable(format!("{}: {err}", self.path.display()))
            }
        })?;
        Ok(Box::new(FileCapture {
            file,
            chunk_bytes: self.chunk_bytes,
            interval: self.interval,
            started: false,
        }))
    }
}

struct FileCapture {
    file: tokio::fs::File,
    chunk_bytes: usize,
    interval: Duration,
    started: bool,
}

#[async_trait::async_trait]
impl AudioCapture for FileCapture {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, DeviceError> {
        if self.started {
            tokio::time::sleep(self.interval).await;
        }
        self.started = true;

        let mut buffer = vec![0u8; self.chunk_bytes];
        let mut filled = 0;
        while filled < buffer.len() {
            let read = self
                .file
                .read(&mut buffer[filled..])
                .await
                .map_err(|err| DeviceError::Read(err.to_string()))?;
            if read == 0 {
                break;
            }
            filled += read;
        }
        if filled == 0 {
            return Ok(None);
        }
        buffer.truncate(filled);
        Ok(Some(Bytes::from(buffer)))
    }
}
