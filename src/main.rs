use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use tunebox::audio::{NativeAudioElement, NoEmbedSurface, UnavailableVideoHost};
use tunebox::controller::KeyOutcome;
use tunebox::logging;
use tunebox::model::{HttpPlaylistSource, JsonFileStore, OEmbedTitleLookup};
use tunebox::view::TerminalView;
use tunebox::{PlaybackController, PlayerConfig, PlayerHosts, ReadinessGate};

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = logging::init_logging() {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    tracing::info!("=== tunebox starting ===");

    let config = PlayerConfig::load()?;
    tracing::debug!(?config, "Configuration loaded");

    let client = reqwest::Client::builder()
        .user_agent(concat!("tunebox/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(20))
        .build()?;

    let audio = NativeAudioElement::open(client.clone())?;

    // No embedded video player in a terminal: settle readiness right away so
    // video tracks go straight to their audio fallback.
    let readiness = ReadinessGate::new(config.readiness_timeout());
    readiness.mark_unavailable();

    let hosts = PlayerHosts {
        audio: Arc::new(audio),
        video: Arc::new(UnavailableVideoHost),
        iframe: Arc::new(NoEmbedSurface),
        readiness,
    };

    let view = Arc::new(TerminalView::new());
    let store = Arc::new(JsonFileStore::new(config.data_dir.clone()));
    let remote_url = config.remote_playlist_url.clone();

    let (mut controller, event_channel) = PlaybackController::new(config, hosts, view.clone(), store);
    if let Some(url) = remote_url {
        controller = controller.with_playlist_source(
            Arc::new(HttpPlaylistSource::new(client.clone(), url)),
            Arc::new(OEmbedTitleLookup::new(client)),
        );
    }
    controller.start_player_event_listener(event_channel);

    let controller_for_init = controller.clone();
    tokio::spawn(async move {
        controller_for_init.initialize().await;
    });

    tracing::info!("Starting TUI...");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &view, &controller).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = ?err, "Application error");
    }

    if let Err(e) = controller.save_session().await {
        tracing::warn!(error = %e, "Could not save session");
    }
    controller.stop().await;

    tracing::info!("tunebox shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    view: &TerminalView,
    controller: &PlaybackController,
) -> Result<()> {
    loop {
        let state = view.snapshot();

        terminal.draw(|f| {
            TerminalView::draw(f, &state);
        })?;

        // Short poll keeps the progress bar smooth
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if controller.handle_key_event(view, key).await? == KeyOutcome::Quit {
                    break;
                }
            }
        }
    }

    Ok(())
}
