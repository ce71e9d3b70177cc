use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use colored::*;
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tandem_client::transport::RtcTransportFactory;
use tandem_client::{CallEvent, CallHandle, SessionConfig, SessionError, SessionInput, join_room};
use tandem_core::utils::default_ice_servers;
use tandem_core::{IceServerConfig, RoomId};
use tandem_server::{
    DEFAULT_LIVENESS_INTERVAL, DEFAULT_OUTBOX_CAPACITY, DEFAULT_PORT, DEFAULT_STATIC_DIR,
    ServerConfig, serve,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Parser)]
#[command(name = "tandem", version, about = "Two-party video calls over a tiny signaling relay")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling server.
    Serve(ServeArgs),
    /// Join a room as a headless, receive-only peer.
    Join(JoinArgs),
}

#[derive(Args)]
struct ServeArgs {
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,

    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Directory with the browser client, served for every other path.
    #[arg(long, default_value = DEFAULT_STATIC_DIR)]
    static_dir: PathBuf,

    #[arg(long, default_value_t = DEFAULT_LIVENESS_INTERVAL.as_secs())]
    liveness_interval_secs: u64,

    #[arg(long, default_value_t = DEFAULT_OUTBOX_CAPACITY)]
    outbox_capacity: usize,

    /// JSON file with the ICE server list handed to clients.
    #[arg(long)]
    ice_config: Option<PathBuf>,
}

#[derive(Args)]
struct JoinArgs {
    room: String,

    #[arg(long, default_value = "http://127.0.0.1:3000")]
    server: Url,

    /// Ask for a call as soon as the room is joined.
    #[arg(long)]
    call: bool,

    #[arg(long, default_value_t = 10)]
    grace_secs: u64,

    #[arg(long)]
    ice_config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Serve(args) => run_server(args).await,
        Commands::Join(args) => run_peer(args).await,
    }
}

async fn run_server(args: ServeArgs) -> Result<()> {
    if args.liveness_interval_secs == 0 {
        bail!("--liveness-interval-secs must be at least 1");
    }

    let config = ServerConfig {
        host: args.host,
        port: args.port,
        static_dir: args.static_dir,
        liveness_interval: Duration::from_secs(args.liveness_interval_secs),
        outbox_capacity: args.outbox_capacity.max(1),
        ice_servers: load_ice_servers(args.ice_config.as_deref())?,
    };

    println!(
        "{} {}",
        "Signaling server listening on".green().bold(),
        config.bind_addr().to_string().cyan()
    );
    if !config.static_dir.is_dir() {
        warn!(dir = %config.static_dir.display(), "Static directory not found, only signaling routes will answer");
    }

    serve(config, shutdown_signal()).await?;
    println!("{}", "Server stopped".yellow());
    Ok(())
}

async fn run_peer(args: JoinArgs) -> Result<()> {
    let room = RoomId::parse(args.room)?;
    let config = SessionConfig {
        ice_servers: load_ice_servers(args.ice_config.as_deref())?,
        grace_period: Duration::from_secs(args.grace_secs),
    };

    let mut call = join_room(
        &args.server,
        &room,
        config,
        Arc::new(RtcTransportFactory::new()),
    )
    .await
    .with_context(|| format!("Failed to join room {room}"))?;
    println!("{} {}", "Joined room".green().bold(), room.as_str().cyan());

    if args.call {
        call.input.send(SessionInput::Call).await?;
    }

    let outcome = watch_call(&mut call).await;

    match outcome {
        Ok(()) => Ok(()),
        Err(SessionError::RoomFull) => {
            println!("{}", "Room is full, try another one".red().bold());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Prints call events until the session ends or Ctrl-C is pressed.
async fn watch_call(call: &mut CallHandle) -> Result<(), SessionError> {
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            Some(event) = call.events.recv() => print_event(&event),
            result = &mut call.task => {
                return match result {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!("Session task aborted: {}", e);
                        Ok(())
                    }
                };
            }
            _ = &mut shutdown => {
                info!("Leaving the room");
                let _ = call.input.send(SessionInput::HangUp).await;
                let _ = call.input.send(SessionInput::SignalingClosed).await;
                return match (&mut call.task).await {
                    Ok(outcome) => outcome,
                    Err(_) => Ok(()),
                };
            }
        }
    }
}

fn print_event(event: &CallEvent) {
    match event {
        CallEvent::PeerJoined => println!("{}", "A peer joined the room".green()),
        CallEvent::ParticipantCount(n) => println!("{} {}", "Participants:".cyan(), n),
        CallEvent::CallConnected => println!("{}", "Call in progress".green().bold()),
        CallEvent::RemoteStream(_) => println!("{}", "Receiving remote media".cyan()),
        CallEvent::CallEnded => println!("{}", "Call ended".yellow()),
        CallEvent::RoomFull => println!("{}", "Room is full".red()),
    }
}

fn load_ice_servers(path: Option<&Path>) -> Result<Vec<IceServerConfig>> {
    let Some(path) = path else {
        return Ok(default_ice_servers());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read ICE config {}", path.display()))?;
    let servers: Vec<IceServerConfig> = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid ICE config {}", path.display()))?;
    if servers.is_empty() {
        bail!("ICE config {} lists no servers", path.display());
    }
    Ok(servers)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
