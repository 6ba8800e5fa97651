use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;

use serde_json::Value;
use tokio::sync::mpsc as async_mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_util::sync::CancellationToken;

use crate::audio::{AudioCapture, AudioSource};
use crate::channel::{ChannelEventSink, EventChannel, EventSink};
use crate::http::{load_defaults, AudioFile, EngineSettings, ReqwestUploader, Uploader};
use crate::types::{EngineEvent, FailureKind, TransportError};
use crate::wire::{ClientEvent, ToggleAction};

enum EngineCommand {
    LoadDefaults,
    OpenMicrophone,
    ReleaseMicrophone,
    Send(ClientEvent),
    UploadBatch { path: PathBuf, params: Value },
    UploadForStreaming { path: PathBuf, config: Value },
}

/// Handle to the background IO thread. Commands are fire-and-forget; results
/// come back as [`EngineEvent`]s through [`EngineHandle::try_recv`].
pub struct EngineHandle {
    cmd_tx: async_mpsc::UnboundedSender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: EngineSettings, audio: Arc<dyn AudioSource>) -> Self {
        let (cmd_tx, cmd_rx) = async_mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            let sink: Arc<dyn EventSink> = Arc::new(ChannelEventSink::new(event_tx));
            let dispatcher = Dispatcher::new(settings, audio, sink);
            runtime.block_on(dispatcher.run(cmd_rx));
        });

        Self { cmd_tx, event_rx }
    }

    pub fn load_defaults(&self) {
        self.submit(EngineCommand::LoadDefaults);
    }

    pub fn open_microphone(&self) {
        self.submit(EngineCommand::OpenMicrophone);
    }

    pub fn release_microphone(&self) {
        self.submit(EngineCommand::ReleaseMicrophone);
    }

    pub fn send(&self, event: ClientEvent) {
        self.submit(EngineCommand::Send(event));
    }

    pub fn upload_batch(&self, path: impl Into<PathBuf>, params: Value) {
        self.submit(EngineCommand::UploadBatch {
            path: path.into(),
            params,
        });
    }

    pub fn upload_for_streaming(&self, path: impl Into<PathBuf>, config: Value) {
        self.submit(EngineCommand::UploadForStreaming {
            path: path.into(),
            config,
        });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    fn submit(&self, command: EngineCommand) {
        let _ = self.cmd_tx.send(command);
    }
}

/// Microphone opened but not yet pumping, or pumping into the channel.
enum Microphone {
    Open(Box<dyn AudioCapture>),
    Streaming(CancellationToken),
}

struct Dispatcher {
    settings: EngineSettings,
    uploader: Arc<dyn Uploader>,
    audio: Arc<dyn AudioSource>,
    sink: Arc<dyn EventSink>,
    channel: Option<EventChannel>,
    microphone: Option<Microphone>,
}

impl Dispatcher {
    fn new(
        settings: EngineSettings,
        audio: Arc<dyn AudioSource>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let uploader: Arc<dyn Uploader> = Arc::new(ReqwestUploader::new(settings.clone()));
        Self {
            settings,
            uploader,
            audio,
            sink,
            channel: None,
            microphone: None,
        }
    }

    async fn run(mut self, mut cmd_rx: async_mpsc::UnboundedReceiver<EngineCommand>) {
        while let Some(command) = cmd_rx.recv().await {
            self.handle(command).await;
        }
        self.release_microphone();
        if let Some(channel) = self.channel.as_mut() {
            channel.close();
        }
        listen_logging::listen_debug!("engine dispatcher stopped");
    }

    async fn handle(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::LoadDefaults => {
                let uploader = self.uploader.clone();
                let sink = self.sink.clone();
                let source = self.settings.defaults.clone();
                tokio::spawn(async move {
                    let result = match source {
                        Some(source) => load_defaults(uploader.as_ref(), &source).await,
                        None => Err(TransportError::new(
                            FailureKind::Io,
                            "no defaults source configured",
                        )),
                    };
                    sink.emit(EngineEvent::DefaultsLoaded(result));
                });
            }
            EngineCommand::OpenMicrophone => {
                self.release_microphone();
                match self.audio.open().await {
                    Ok(capture) => {
                        listen_logging::listen_info!("microphone opened");
                        self.microphone = Some(Microphone::Open(capture));
                        self.sink.emit(EngineEvent::MicrophoneOpened);
                    }
                    Err(err) => {
                        listen_logging::listen_warn!("microphone failed: {err}");
                        self.sink.emit(EngineEvent::MicrophoneFailed(err));
                    }
                }
            }
            EngineCommand::ReleaseMicrophone => self.release_microphone(),
            EngineCommand::Send(event) => self.send(event).await,
            EngineCommand::UploadBatch { path, params } => {
                let uploader = self.uploader.clone();
                let sink = self.sink.clone();
                tokio::spawn(async move {
                    let result = match AudioFile::read(&path).await {
                        Ok(file) => uploader.upload_batch(&file, &params).await,
                        Err(err) => Err(err),
                    };
                    if let Err(err) = &result {
                        listen_logging::listen_warn!(
                            "batch upload of {} failed: {err}",
                            path.display()
                        );
                    }
                    sink.emit(EngineEvent::BatchUploadCompleted(result));
                });
            }
            EngineCommand::UploadForStreaming { path, config } => {
                let uploader = self.uploader.clone();
                let sink = self.sink.clone();
                tokio::spawn(async move {
                    let result = match AudioFile::read(&path).await {
                        Ok(file) => uploader.upload_for_streaming(&file, &config).await,
                        Err(err) => Err(err),
                    };
                    if let Err(err) = &result {
                        listen_logging::listen_warn!(
                            "stream upload of {} failed: {err}",
                            path.display()
                        );
                    }
                    sink.emit(EngineEvent::StreamUploadCompleted(result));
                });
            }
        }
    }

    async fn send(&mut self, event: ClientEvent) {
        let starts_microphone = matches!(
            event,
            ClientEvent::ToggleTranscription {
                action: ToggleAction::Start,
                ..
            }
        );

        let sink = self.sink.clone();
        let sent = match self.channel_mut() {
            Ok(channel) => channel.send(&event).await,
            Err(err) => Err(err),
        };
        if let Err(err) = sent {
            listen_logging::listen_warn!("failed to send {}: {err}", event.name());
            sink.emit(EngineEvent::ChannelDisconnected(err.to_string()));
            return;
        }

        if starts_microphone {
            self.start_pump().await;
        }
    }

    fn channel_mut(&mut self) -> Result<&mut EventChannel, TransportError> {
        let channel = match self.channel.take() {
            Some(channel) => channel,
            None => EventChannel::new(self.settings.channel_url()?, self.sink.clone()),
        };
        Ok(self.channel.insert(channel))
    }

    /// Starts forwarding microphone chunks as binary frames.
    async fn start_pump(&mut self) {
        let Some(Microphone::Open(capture)) = self.microphone.take() else {
            return;
        };
        let outgoing = match self.channel_mut() {
            Ok(channel) => channel.sender().await,
            Err(err) => Err(err),
        };
        let outgoing = match outgoing {
            Ok(outgoing) => outgoing,
            Err(err) => {
                self.sink
                    .emit(EngineEvent::ChannelDisconnected(err.to_string()));
                return;
            }
        };

        let cancel = CancellationToken::new();
        tokio::spawn(pump_audio(capture, outgoing, cancel.clone()));
        self.microphone = Some(Microphone::Streaming(cancel));
    }

    fn release_microphone(&mut self) {
        match self.microphone.take() {
            Some(Microphone::Streaming(cancel)) => {
                cancel.cancel();
                listen_logging::listen_info!("microphone released");
            }
            Some(Microphone::Open(_)) => listen_logging::listen_info!("microphone released"),
            None => {}
        }
    }
}

async fn pump_audio(
    mut capture: Box<dyn AudioCapture>,
    outgoing: async_mpsc::UnboundedSender<WsMessage>,
    cancel: CancellationToken,
) {
    let mut sent = 0usize;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            chunk = capture.next_chunk() => match chunk {
                Ok(Some(bytes)) => {
                    sent += bytes.len();
                    if outgoing.send(WsMessage::Binary(bytes.to_vec())).is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    listen_logging::listen_info!("audio source exhausted");
                    break;
                }
                Err(err) => {
                    listen_logging::listen_warn!("audio capture failed: {err}");
                    break;
                }
            },
        }
    }
    listen_logging::listen_debug!("audio pump stopped after {sent} bytes");
}
