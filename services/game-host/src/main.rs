use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use arcade_execution::{
    AccrualTick, CooldownGuard, GameCategory, GameInfo, GameRegistry, JsonRenderer, MemoryLedger,
    Orchestrator, Scheduler, SeededRng, SessionRegistry, SystemClock, TimerFired,
};
use arcade_types::PlayerId;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State as AxumState};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::{broadcast, mpsc};
use tokio::time;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod protocol;

use config::HostConfig;
use protocol::{Command, InboundMessage, OutboundMessage};

#[derive(Parser, Debug)]
#[command(name = "arcade-host", about = "Arcade game session engine host")]
struct Args {
    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit structured JSON logs
    #[arg(long)]
    log_json: bool,
}

/// Everything the engine task reacts to.
#[derive(Debug)]
enum EngineEvent {
    Command(Command),
    Timer(TimerFired),
    Accrual(AccrualTick),
    Sweep,
}

impl From<TimerFired> for EngineEvent {
    fn from(fired: TimerFired) -> Self {
        EngineEvent::Timer(fired)
    }
}

impl From<AccrualTick> for EngineEvent {
    fn from(tick: AccrualTick) -> Self {
        EngineEvent::Accrual(tick)
    }
}

type Engine = Orchestrator<MemoryLedger, JsonRenderer, Scheduler<EngineEvent>>;

fn game_registry(config: &HostConfig) -> anyhow::Result<GameRegistry> {
    let mut games = GameRegistry::new();
    for (game_type, limits) in config.game_limits()? {
        games.apply_limits(game_type, limits);
    }
    Ok(games)
}

fn build_engine(
    config: &HostConfig,
    games: GameRegistry,
    events: mpsc::UnboundedSender<EngineEvent>,
) -> anyhow::Result<Engine> {
    let seed = config.rng_seed.unwrap_or_else(rand::random);
    let orchestrator = Orchestrator::new(
        MemoryLedger::new(config.starting_balance),
        JsonRenderer,
        Scheduler::with_accrual_period(events, config.accrual_interval_ms),
        Arc::new(SystemClock),
        Box::new(SeededRng::new(seed)),
    )
    .with_games(games)
    .with_sessions(SessionRegistry::new(
        config.session_retention_ms,
        config.session_idle_ms,
    ))
    .with_cooldowns(CooldownGuard::new(
        config.burst_limit,
        config.burst_window_ms,
        config.cooldown_overrides.clone(),
    ));
    Ok(orchestrator)
}

/// Single owner of all session state. Events are applied strictly in arrival order.
async fn run_engine(
    mut engine: Engine,
    mut events: mpsc::UnboundedReceiver<EngineEvent>,
    outbound: broadcast::Sender<OutboundMessage>,
) {
    while let Some(event) = events.recv().await {
        let messages = match event {
            EngineEvent::Command(Command::Start(request)) => engine.handle_start(request),
            EngineEvent::Command(Command::Action(action)) => engine.handle_action(action),
            EngineEvent::Command(Command::Presence { player, joined }) => {
                presence(&mut engine, player, joined);
                Vec::new()
            }
            EngineEvent::Timer(fired) => engine.handle_timeout(fired),
            EngineEvent::Accrual(tick) => {
                engine.handle_accrual(tick.player);
                Vec::new()
            }
            EngineEvent::Sweep => engine.sweep(),
        };
        for message in messages {
            let _ = outbound.send(message.into());
        }
    }
    info!("engine event loop stopped");
}

fn presence(engine: &mut Engine, player: PlayerId, joined: bool) {
    if joined {
        engine.presence_joined(player);
    } else {
        engine.presence_left(player);
    }
}

#[derive(Clone)]
struct AppState {
    events: mpsc::UnboundedSender<EngineEvent>,
    broadcaster: broadcast::Sender<OutboundMessage>,
    games: Arc<GameRegistry>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogQuery {
    category: Option<GameCategory>,
}

/// Enabled games with their configured limits, optionally narrowed to one category.
fn catalog(games: &GameRegistry, category: Option<GameCategory>) -> Vec<GameInfo> {
    let listed: Vec<GameInfo> = match category {
        Some(category) => games
            .games_by_category(category)
            .into_iter()
            .map(|game_type| games.info(game_type))
            .collect(),
        None => games.all_games_info(),
    };
    listed.into_iter().filter(|info| info.is_active).collect()
}

async fn list_games(
    Query(query): Query<CatalogQuery>,
    AxumState(state): AxumState<AppState>,
) -> Json<Vec<GameInfo>> {
    Json(catalog(&state.games, query.category))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    AxumState(state): AxumState<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    let mut broadcast_rx = state.broadcaster.subscribe();

    let write_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let broadcast_task = {
        let tx = tx.clone();
        tokio::spawn(async move {
            loop {
                match broadcast_rx.recv().await {
                    Ok(event) => send_message(&tx, &event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "adapter lagging, outbound messages dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    };

    while let Some(Ok(message)) = receiver.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<InboundMessage>(&text) {
                Ok(inbound) => match Command::try_from(inbound) {
                    Ok(command) => {
                        let _ = state.events.send(EngineEvent::Command(command));
                    }
                    Err(error) => send_message(&tx, &error),
                },
                Err(err) => {
                    warn!(?err, "invalid inbound message");
                    send_message(
                        &tx,
                        &OutboundMessage::Error {
                            code: "INVALID_MESSAGE".to_string(),
                            message: err.to_string(),
                        },
                    );
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    debug!("adapter disconnected");
    write_task.abort();
    broadcast_task.abort();
}

fn send_message(tx: &mpsc::UnboundedSender<Message>, message: &OutboundMessage) {
    if let Ok(payload) = serde_json::to_string(message) {
        let _ = tx.send(Message::Text(payload));
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    let config = HostConfig::load(args.config.as_deref())?;
    info!(config = ?config, "loaded config");

    let (events_tx, events_rx) = mpsc::unbounded_channel::<EngineEvent>();
    let (broadcaster, _) = broadcast::channel::<OutboundMessage>(1024);

    let games = game_registry(&config).context("invalid game limits")?;
    info!(active = games.active_games().len(), "game catalog loaded");
    let catalog_games = Arc::new(games.clone());
    let engine = build_engine(&config, games, events_tx.clone())?;
    tokio::spawn(run_engine(engine, events_rx, broadcaster.clone()));

    // Sweep ticker
    let sweep_tx = events_tx.clone();
    let sweep_every = Duration::from_millis(config.sweep_interval_ms.max(1));
    tokio::spawn(async move {
        let mut interval = time::interval_at(time::Instant::now() + sweep_every, sweep_every);
        loop {
            interval.tick().await;
            if sweep_tx.send(EngineEvent::Sweep).is_err() {
                break;
            }
        }
    });

    let state = AppState {
        events: events_tx,
        broadcaster,
        games: catalog_games,
    };
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/games", get(list_games))
        .route("/healthz", get(healthz))
        .with_state(state);

    let addr = config.listen_addr()?;
    info!(%addr, "arcade host listening");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}
