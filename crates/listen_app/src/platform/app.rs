use std::io::{self, BufRead, Write};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use listen_core::{update, AppState, Effect, Msg};
use listen_engine::{
    AudioSource, DefaultsSource, EngineSettings, FileAudioSource, NoAudioSource,
};
use listen_logging::{listen_debug, listen_info, set_event_seq};

use super::commands::{parse_command, Command, HELP};
use super::effects::EffectRunner;
use super::logging;
use super::render::{self, Renderer};
use crate::cli::Cli;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub fn run_app(cli: Cli) -> anyhow::Result<()> {
    logging::initialize(cli.log.into());
    listen_info!(
        "listen_client starting server={} defaults={}",
        cli.server,
        cli.defaults
    );

    let settings = EngineSettings {
        server_url: cli.server.clone(),
        defaults: Some(DefaultsSource::parse(&cli.defaults)),
        ..EngineSettings::default()
    };
    let audio: Arc<dyn AudioSource> = match &cli.microphone {
        Some(path) => Arc::new(FileAudioSource::new(path).with_chunk_bytes(cli.chunk_bytes)),
        None => Arc::new(NoAudioSource),
    };

    let (line_tx, line_rx) = mpsc::channel::<String>();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line_tx.send(line).is_err() {
                break;
            }
        }
    });

    let mut app = App::new(EffectRunner::new(settings, audio));
    app.runner.load_defaults();
    if let Some(width) = cli.width {
        app.dispatch(Msg::LineWidthChanged(width))?;
    }
    app.print(&render::full(&app.state.view()))?;
    app.print(&["Type help for commands.".to_string()])?;
    // The full dump above is the baseline for incremental output.
    app.renderer.render(&app.state.view());

    loop {
        match line_rx.recv_timeout(POLL_INTERVAL) {
            Ok(line) => match parse_command(&line) {
                Ok(Command::Quit) => break,
                Ok(Command::Show) => app.print(&render::full(&app.state.view()))?,
                Ok(Command::Help) => app.print(&[HELP.to_string()])?,
                Ok(Command::Dispatch(msg)) => app.dispatch(msg)?,
                Err(message) => app.print(&[message])?,
            },
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
        while let Some(msg) = app.runner.poll() {
            app.dispatch(msg)?;
        }
    }

    if app.state.session_mode().is_live() {
        app.dispatch(Msg::RecordToggled(false))?;
        // Give the engine thread a moment to flush the stop event.
        thread::sleep(POLL_INTERVAL);
    }
    listen_info!("listen_client exiting");
    Ok(())
}

struct App {
    state: AppState,
    runner: EffectRunner,
    renderer: Renderer,
    seq: u64,
}

impl App {
    fn new(runner: EffectRunner) -> Self {
        Self {
            state: AppState::new(),
            runner,
            renderer: Renderer::default(),
            seq: 0,
        }
    }

    fn dispatch(&mut self, msg: Msg) -> io::Result<()> {
        self.seq += 1;
        set_event_seq(self.seq);
        listen_debug!("dispatch {:?}", msg);

        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;

        let output = self.run_effects(effects);
        self.print(&output)?;
        if self.state.consume_dirty() {
            self.render()?;
        }
        Ok(())
    }

    fn run_effects(&self, effects: Vec<Effect>) -> Vec<String> {
        if effects.is_empty() {
            return Vec::new();
        }
        self.runner.enqueue(effects)
    }

    fn render(&mut self) -> io::Result<()> {
        let lines = self.renderer.render(&self.state.view());
        self.print(&lines)
    }

    fn print(&self, lines: &[String]) -> io::Result<()> {
        if lines.is_empty() {
            return Ok(());
        }
        let mut stdout = io::stdout().lock();
        for line in lines {
            writeln!(stdout, "{line}")?;
        }
        stdout.flush()
    }
}
