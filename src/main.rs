use std::str::FromStr;
use std::sync::Arc;

use storefront_telemetry::start_server;
use storefront_telemetry::ClientContext;
use storefront_telemetry::EntityId;
use storefront_telemetry::Error;
use storefront_telemetry::Result;
use storefront_telemetry::TelemetryClient;
use storefront_telemetry::TelemetryConfig;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tokio::sync::watch;
use tracing::error;
use tracing::info;
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    let settings = TelemetryConfig::new()?.validate()?;

    // Initializing Logs
    let _guard = init_observability();

    // Initializing Shutdown Signal
    let (graceful_tx, graceful_rx) = watch::channel(());
    let graceful_tx = Arc::new(graceful_tx);

    if settings.monitoring.prometheus_enabled {
        tokio::spawn(start_server(settings.monitoring.prometheus_port, graceful_rx.clone()));
    }

    let client = TelemetryClient::builder(settings)
        .client_context(ClientContext::new(
            format!("telemetry-agent/{}", env!("CARGO_PKG_VERSION")),
            None,
        ))
        .build()?;
    info!(session_id = client.session_id(), "telemetry agent started, reading commands from stdin");

    let listener = client.listen_for_shutdown(graceful_rx.clone());

    // Listen on Shutdown Signal
    let signal_tx = graceful_tx.clone();
    tokio::spawn(async move {
        if let Err(e) = graceful_shutdown(&signal_tx).await {
            error!("Failed to shutdown: {:?}", e);
        }
    });

    if read_commands(&client, graceful_rx).await {
        info!("stdin closed");
        send_shutdown_signal(&graceful_tx)?;
    }

    if let Some(listener) = listener {
        if let Err(e) = listener.await {
            error!("shutdown flush did not complete: {:?}", e);
        }
    }

    info!("Exiting program. {} events left undelivered", client.queued());
    Ok(())
}

/// Tracks one command per stdin line until EOF or the shutdown signal.
///
/// Returns `true` on EOF.
async fn read_commands(
    client: &TelemetryClient,
    mut shutdown_signal: watch::Receiver<()>,
) -> bool {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            _ = shutdown_signal.changed() => return false,
            line = lines.next_line() => line,
        };

        match line {
            Ok(Some(line)) if line.trim().is_empty() => {}
            Ok(Some(line)) => match line.parse::<Command>() {
                Ok(command) => command.apply(client).await,
                Err(e) => warn!("skipping line {:?}: {}", line, e),
            },
            Ok(None) => return true,
            Err(e) => {
                error!("failed to read stdin: {:?}", e);
                return true;
            }
        }
    }
}

#[derive(Debug, PartialEq)]
enum Command {
    View(EntityId),
    Click(EntityId),
    CartAdd(EntityId),
    Purchase(EntityId, Option<String>),
    Leave(EntityId),
    Flush,
}

impl Command {
    async fn apply(
        self,
        client: &TelemetryClient,
    ) {
        match self {
            Command::View(id) => client.track_view(id),
            Command::Click(id) => client.track_click(id),
            Command::CartAdd(id) => client.track_cart_add(id),
            Command::Purchase(id, order_ref) => client.track_purchase(id, order_ref.as_deref()),
            Command::Leave(id) => client.track_time_on_page(id),
            Command::Flush => {
                let outcome = client.flush().await;
                info!("flush: {:?}", outcome);
            }
        }
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let verb = parts.next().ok_or("empty command")?;

        let mut entity_id = || -> std::result::Result<EntityId, String> {
            let raw = parts.next().ok_or(format!("`{}` needs an entity id", verb))?;
            raw.parse().map_err(|e| format!("bad entity id {:?}: {}", raw, e))
        };

        let command = match verb {
            "view" => Command::View(entity_id()?),
            "click" => Command::Click(entity_id()?),
            "cart_add" => Command::CartAdd(entity_id()?),
            "purchase" => {
                let id = entity_id()?;
                Command::Purchase(id, parts.next().map(str::to_string))
            }
            "leave" => Command::Leave(entity_id()?),
            "flush" => Command::Flush,
            other => return Err(format!("unknown command `{}`", other)),
        };

        match parts.next() {
            Some(extra) => Err(format!("unexpected argument {:?}", extra)),
            None => Ok(command),
        }
    }
}

async fn graceful_shutdown(graceful_tx: &watch::Sender<()>) -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT detected.");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C detected.");
        },
    }

    send_shutdown_signal(graceful_tx)?;
    info!("Shutdown signal sent");
    Ok(())
}

fn send_shutdown_signal(graceful_tx: &watch::Sender<()>) -> Result<()> {
    graceful_tx.send(()).map_err(|e| {
        error!("Failed to send shutdown signal: {}", e);
        Error::SignalSenderClosed(format!("Failed to send shutdown signal: {}", e))
    })
}

/// Logs go to stderr; stdout stays free for the command stream's caller.
fn init_observability() -> WorkerGuard {
    let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stderr());
    let base_subscriber = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::from_default_env());
    tracing_subscriber::registry().with(base_subscriber).init();

    guard
}
