//! Guilded gateway client entry point
//!
//! Run with:
//! ```bash
//! GUILDED_AUTH_COOKIE=... cargo run -p guilded-gateway
//! ```
//!
//! Configuration is loaded from environment variables (and `.env` if present).

use guilded_cache::CacheOptions;
use guilded_common::{
    try_init_tracing_with_config, AppConfig, AppError, AppResult, ErrorReport, TracingConfig,
};
use guilded_gateway::{Client, EventArg, EventArgs, GatewayOptions};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        let report = ErrorReport::from(&err);
        error!(code = %report.code, error = %report, "Gateway client failed");
        std::process::exit(err.exit_code());
    }
}

async fn run() -> AppResult<()> {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_logging(TracingConfig::default());
            return Err(e.into());
        }
    };
    init_logging(TracingConfig::for_environment(config.app.env));

    info!(
        app = %config.app.name,
        env = ?config.app.env,
        url = %config.gateway.url,
        teams = config.gateway.team_ids.len(),
        "Configuration loaded"
    );

    let client = Client::builder(GatewayOptions::from(&config.gateway))
        .cache_options(CacheOptions::from(&config.cache))
        .build();
    register_logging_handlers(&client);

    let shutdown = client.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for shutdown signal");
            return;
        }
        info!("Shutdown signal received");
        shutdown.close().await;
    });

    client.run().await.map_err(AppError::gateway)?;
    info!("Gateway client stopped");
    Ok(())
}

fn init_logging(config: TracingConfig) {
    if let Err(e) = try_init_tracing_with_config(config) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }
}

fn register_logging_handlers(client: &Client) {
    client.event("ready", |_| async {
        info!("Gateway ready");
        Ok(())
    });

    client.event("disconnect", |args: EventArgs| async move {
        let code = match args.first() {
            Some(EventArg::CloseCode(code)) => *code,
            _ => None,
        };
        warn!(code = ?code, "Gateway disconnected");
        Ok(())
    });

    client.event("error", |args: EventArgs| async move {
        if let Some(err) = args.first().and_then(EventArg::as_error) {
            error!(error = %err, "Gateway error");
        }
        Ok(())
    });

    client.event("message", |args: EventArgs| async move {
        if let Some(message) = args.first().and_then(EventArg::as_message) {
            info!(
                message_id = %message.id,
                channel_id = %message.channel_id,
                author_id = ?message.author_id,
                "Message received"
            );
        }
        Ok(())
    });
}
