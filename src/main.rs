use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use voice_call::media::loopback::script_from_jsonl;
use voice_call::session::SessionIdentity;
use voice_call::view::render_call;
use voice_call::{
    create_router, AppState, CallController, Config, ConnectionState, LoopbackConnector,
    StaticToken, TokenClient, TokenSource, VirtualDevices,
};

#[derive(Debug, Parser)]
#[command(name = "voice-call", version, about = "Voice and video call front-end for an AI agent")]
struct Cli {
    /// Config file (without extension)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Request a room token from the backend and print it
    Token {
        #[arg(long)]
        room: Option<String>,

        #[arg(long)]
        participant: Option<String>,
    },

    /// Play a JSON-lines capture of agent messages through a call and print the result
    Replay {
        path: PathBuf,

        /// Delay between messages
        #[arg(long, default_value_t = 0)]
        pace_ms: u64,
    },

    /// Serve the HTTP control API
    Serve {
        /// JSON-lines capture played into every call
        #[arg(long)]
        script: Option<PathBuf>,

        /// Use this token instead of asking the backend
        #[arg(long, requires = "url")]
        token: Option<String>,

        /// Room URL paired with --token
        #[arg(long, requires = "token")]
        url: Option<String>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Token { room, participant } => token(&cfg, room, participant).await,
        Command::Replay { path, pace_ms } => replay(&cfg, path, pace_ms).await,
        Command::Serve { script, token, url } => serve(&cfg, script, token.zip(url)).await,
    }
}

async fn token(cfg: &Config, room: Option<String>, participant: Option<String>) -> Result<()> {
    let identity = SessionIdentity::generate();
    let room = room.unwrap_or(identity.room_name);
    let participant = participant.unwrap_or(identity.participant_name);

    let client = TokenClient::new(&cfg.api.base_url);
    let credentials = client.fetch(&room, &participant).await?;

    println!("{}", serde_json::to_string_pretty(&credentials)?);
    Ok(())
}

fn load_script(path: &Path) -> Result<Vec<Vec<u8>>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script {}", path.display()))?;
    let script = script_from_jsonl(&text);
    info!("Loaded {} messages from {}", script.len(), path.display());
    Ok(script)
}

async fn replay(cfg: &Config, path: PathBuf, pace_ms: u64) -> Result<()> {
    let connector = LoopbackConnector::new()
        .with_script(load_script(&path)?)
        .with_pacing(Duration::from_millis(pace_ms))
        .hang_up_after_script();

    let controller = CallController::new(
        cfg.session_config(),
        Arc::new(StaticToken::new("replay", "loopback://replay")),
        Arc::new(connector),
        Arc::new(VirtualDevices::new()),
    );

    let mut changes = controller.subscribe();
    controller.connect().await?;

    loop {
        if controller.snapshot().await.state.connection == ConnectionState::Disconnected {
            break;
        }

        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted before the script finished");
                break;
            }
        }
    }

    println!("{}", render_call(&controller.snapshot().await));
    controller.shutdown().await;

    Ok(())
}

async fn serve(cfg: &Config, script: Option<PathBuf>, credentials: Option<(String, String)>) -> Result<()> {
    let tokens: Arc<dyn TokenSource> = match credentials {
        Some((token, url)) => Arc::new(StaticToken::new(token, url)),
        None => Arc::new(TokenClient::new(&cfg.api.base_url)),
    };

    let mut connector = LoopbackConnector::new();
    if let Some(path) = &script {
        connector = connector.with_script(load_script(path)?);
    }

    let controller = Arc::new(CallController::new(
        cfg.session_config(),
        tokens,
        Arc::new(connector),
        Arc::new(VirtualDevices::new()),
    ));

    let app = create_router(AppState::new(Arc::clone(&controller)));

    let addr = format!("{}:{}", cfg.http.bind, cfg.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Voice call API listening on {}", addr);
    info!("Token backend: {}", cfg.api.base_url);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for ctrl-c: {}", e);
            }
            info!("Shutting down");
        })
        .await?;

    controller.shutdown().await;
    Ok(())
}
