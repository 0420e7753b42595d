use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use aviso_gateway::app;
use aviso_notify::{EmailNotifier, Notifier, WhatsAppNotifier};
use aviso_scheduler::ReminderScheduler;

/// Notification and reminder dispatch service for the tutoring platform.
#[derive(Parser)]
#[command(name = "aviso-gateway")]
struct Args {
    /// Path to aviso.toml (defaults to ~/.aviso/aviso.toml).
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "aviso_gateway=info,aviso_scheduler=info,aviso_notify=info,tower_http=debug".into()
            }),
        )
        .init();

    let args = Args::parse();
    let config = aviso_core::config::AvisoConfig::load(args.config.as_deref()).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        aviso_core::config::AvisoConfig::default()
    });

    let bind = config.gateway.bind.clone();
    let port = config.gateway.port;

    let email: Arc<dyn Notifier> =
        Arc::new(EmailNotifier::new(&config.email, &config.frontend_url));
    let whatsapp: Arc<dyn Notifier> = Arc::new(WhatsAppNotifier::new(&config.whatsapp));

    let store = match &config.scheduler.checkpoint_path {
        Some(path) => {
            ensure_parent_dir(path);
            info!(path = %path, "opening reminder checkpoint database");
            Some(aviso_scheduler::JobStore::new(rusqlite::Connection::open(
                path,
            )?)?)
        }
        None => None,
    };

    // Scheduled reminders go out by email; the session fan-out additionally
    // uses the WhatsApp adapter directly.
    let scheduler = ReminderScheduler::new(Arc::clone(&email), store);
    let reloaded = scheduler.reload()?;
    if reloaded > 0 {
        info!(count = reloaded, "pending reminders restored from checkpoint");
    }

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(scheduler.clone().run(shutdown_rx));

    let state = Arc::new(app::AppState::new(config, scheduler, email, whatsapp));
    let router = app::build_router(state);

    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    info!("Aviso gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // signal the scheduler loop to stop
    let _ = shutdown_tx.send(true);
    info!("Aviso gateway shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl-C handler");
    }
}

/// Ensure the parent directory for a file path exists.
fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
}
