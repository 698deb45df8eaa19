use std::{path::PathBuf, sync::Arc};

use {
    clap::Parser,
    secrecy::ExposeSecret,
    tokio_util::sync::CancellationToken,
    tracing::{error, info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    opencord_backend::{ServerSettings, Supervisor},
    opencord_config::OpencordConfig,
    opencord_discord::{BotState, DiscordSettings, OpencordHandler, SharedBotState},
    opencord_gateway::AppState,
};

#[derive(Parser)]
#[command(name = "opencord", about = "Discord bridge for OpenCode", version)]
struct Cli {
    /// Path to the config file (default: discover opencord.{toml,yaml,yml,json}).
    #[arg(long, env = "OPENCORD_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "opencord starting");

    // A missing or invalid config aborts here with a non-zero exit.
    let config = opencord_config::load(cli.config.as_deref())?;
    run(config).await
}

async fn run(config: OpencordConfig) -> anyhow::Result<()> {
    // The bridge cannot operate without the opencode server, so a failed
    // start is fatal to the whole run.
    let server_settings = ServerSettings {
        hostname: config.opencode.hostname.clone(),
        port: config.opencode.port,
        working_directory: config.opencode.working_directory.clone(),
        username: config.opencode.username.clone(),
        password: config.opencode.password.clone(),
    };
    let mut supervisor = Supervisor::new(server_settings);
    info!("starting opencode server");
    let backend = supervisor.start().await?;

    let settings = DiscordSettings {
        prefix: config.discord.prefix.clone(),
        allowed_channels: config.discord.allowed_channels.clone(),
    };
    let state: SharedBotState = Arc::new(BotState::new(settings, backend));

    let api_shutdown = CancellationToken::new();
    let api_task = if config.api.enabled {
        let app_state = AppState {
            bot: Arc::clone(&state),
            secret: config.api.secret(),
        };
        let bind = config.api.bind.clone();
        let port = config.api.port;
        let token = api_shutdown.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = opencord_gateway::serve(app_state, &bind, port, token).await {
                error!(error = %e, "API server failed");
            }
        }))
    } else {
        None
    };

    let mut client = serenity::Client::builder(
        config.discord.token.expose_secret(),
        OpencordHandler::intents(),
    )
    .event_handler(OpencordHandler {
        state: Arc::clone(&state),
    })
    .await?;
    let shard_manager = client.shard_manager.clone();

    info!("starting discord bot");
    let outcome = tokio::select! {
        result = client.start() => result.map_err(anyhow::Error::from),
        () = shutdown_signal() => {
            info!("shutdown signal received");
            Ok(())
        },
    };

    // Ordered shutdown: the gateway select above already stopped event
    // processing. Delete sessions while the backend is still up, close the
    // Discord connection, then stop the server. Cleanup failures are
    // logged inside each step, never propagated.
    info!("shutting down");
    state.cleanup_sessions().await;
    shard_manager.shutdown_all().await;
    api_shutdown.cancel();
    if let Some(task) = api_task {
        let _ = task.await;
    }
    supervisor.stop().await;
    info!("goodbye");

    outcome
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            },
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
