use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use listen_engine::{DEFAULT_CHUNK_BYTES, DEFAULT_SERVER_URL};

use crate::platform::LogDestination;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTarget {
    Terminal,
    File,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::File => LogDestination::File,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "listen_client",
    about = "Build, edit and run live transcription requests against a listen server"
)]
pub struct Cli {
    /// Base URL of the transcription server
    #[arg(long, default_value = DEFAULT_SERVER_URL)]
    pub server: String,

    /// Service defaults document (file path or http(s) URL)
    #[arg(long, default_value = "config/defaults.json")]
    pub defaults: String,

    /// Characters per line of the displayed request URL
    #[arg(long)]
    pub width: Option<usize>,

    /// Where log output goes
    #[arg(long, value_enum, default_value_t = LogTarget::File)]
    pub log: LogTarget,

    /// Raw audio file replayed as the microphone
    #[arg(long)]
    pub microphone: Option<PathBuf>,

    /// Bytes per microphone chunk
    #[arg(long, default_value_t = DEFAULT_CHUNK_BYTES)]
    pub chunk_bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_server() {
        let cli = Cli::parse_from(["listen_client"]);
        assert_eq!(cli.server, "http://localhost:8001");
        assert_eq!(cli.defaults, "config/defaults.json");
        assert_eq!(cli.log, LogTarget::File);
        assert_eq!(cli.width, None);
        assert_eq!(cli.chunk_bytes, DEFAULT_CHUNK_BYTES);
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "listen_client",
            "--server",
            "https://transcribe.example.com",
            "--width",
            "60",
            "--log",
            "both",
            "--microphone",
            "speech.raw",
        ]);
        assert_eq!(cli.server, "https://transcribe.example.com");
        assert_eq!(cli.width, Some(60));
        assert_eq!(cli.log, LogTarget::Both);
        assert_eq!(cli.microphone, Some(PathBuf::from("speech.raw")));
    }
}
