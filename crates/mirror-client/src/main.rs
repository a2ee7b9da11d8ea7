//! Mirror client entry point.
//!
//! Connects to a mirroring server reached through a local port forward,
//! consumes its video stream headlessly (keeping frame statistics) and
//! accepts navigation commands on stdin.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ Cli::into_config()           -- TOML file + CLI / env overrides
//!  └─ SessionController::new()     -- discovery, decoder factory, surface
//!  └─ controller.connect()         -- video socket, control socket, first config
//!  └─ event loop
//!       ├─ SessionEvent            -> log; StreamFailed -> exit
//!       ├─ stdin line              -> back / home / apps / on / off / toggle / quit
//!       └─ Ctrl-C                  -> disconnect and exit
//! ```
//!
//! # Usage
//!
//! ```text
//! mirror-client [OPTIONS]
//!
//! Options:
//!   --config    <PATH>   Config file [default: platform config dir]
//!   --host      <HOST>   Forwarded server host
//!   --port      <PORT>   Forwarded server port
//!   --log-level <LEVEL>  Log level when RUST_LOG is unset
//! ```
//!
//! Every option can also be set through the environment (`MIRROR_CONFIG`,
//! `MIRROR_HOST`, `MIRROR_PORT`, `MIRROR_LOG_LEVEL`).  CLI args take
//! precedence, then the environment, then the config file.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use mirror_client::application::session::SessionController;
use mirror_client::infrastructure::{
    decoder::StatsDecoderFactory,
    network::ForwardedServerDiscovery,
    storage::config::{default_config_path, load_config, MirrorConfig},
    surface::HeadlessSurface,
};
use mirror_client::{SessionError, SessionEvent};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Headless screen mirror client.
#[derive(Debug, Parser)]
#[command(
    name = "mirror-client",
    about = "Mirror an Android device screen over a forwarded server connection",
    version
)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, env = "MIRROR_CONFIG")]
    config: Option<PathBuf>,

    /// Host the mirroring server is forwarded to.
    #[arg(long, env = "MIRROR_HOST")]
    host: Option<String>,

    /// Port the mirroring server is forwarded to.
    #[arg(long, env = "MIRROR_PORT")]
    port: Option<u16>,

    /// Log level used when `RUST_LOG` is unset.
    #[arg(long, env = "MIRROR_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    /// Loads the config file and applies CLI / environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if no config path can be determined or the file
    /// exists but cannot be read or parsed.
    fn into_config(self) -> anyhow::Result<MirrorConfig> {
        let path = match self.config {
            Some(path) => path,
            None => default_config_path().context("no --config given")?,
        };
        let mut config =
            load_config(&path).with_context(|| format!("loading {}", path.display()))?;

        if let Some(host) = self.host {
            config.connection.host = host;
        }
        if let Some(port) = self.port {
            config.connection.port = port;
        }
        if let Some(level) = self.log_level {
            config.client.log_level = level;
        }
        Ok(config)
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

async fn run_command(controller: &SessionController, line: &str) -> Flow {
    let result: Result<(), SessionError> = match line {
        "" => Ok(()),
        "back" => controller.press_back().await,
        "home" => controller.press_home().await,
        "apps" => controller.press_app_switch().await,
        "on" => controller.turn_screen_on().await,
        "off" => controller.turn_screen_off().await,
        "toggle" => controller.toggle_screen().await,
        "quit" | "exit" => return Flow::Quit,
        other => {
            warn!(command = other, "unknown command (back, home, apps, on, off, toggle, quit)");
            Ok(())
        }
    };
    if let Err(e) = result {
        warn!(command = line, error = %e, "command failed");
    }
    Flow::Continue
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse().into_config()?;

    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.client.log_level)),
        )
        .init();

    info!(
        server = %config.connection.address(),
        codec = %config.server.video_codec,
        max_size = config.server.max_size,
        "mirror client starting"
    );

    // ── Collaborators ─────────────────────────────────────────────────────────
    let discovery = Arc::new(ForwardedServerDiscovery::new([config.connection.address()]));
    let decoders = Arc::new(StatsDecoderFactory::default());
    let stats = decoders.stats();
    let surface = Arc::new(HeadlessSurface::new());

    let (controller, mut events) =
        SessionController::new(discovery, decoders, surface, config.server.clone());

    let device = controller
        .request_permission()
        .await
        .context("requesting device access")?;
    info!(serial = %device.serial, "device selected");

    controller
        .connect()
        .await
        .with_context(|| format!("connecting to {}", device.serial))?;

    // ── Event loop ────────────────────────────────────────────────────────────
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
            event = events.recv() => match event {
                Some(SessionEvent::StreamFailed(reason)) => {
                    error!(%reason, "stream failed");
                    break;
                }
                Some(SessionEvent::StateChanged(state)) => info!(?state, "session state"),
                Some(SessionEvent::ResolutionChanged(size)) => {
                    info!(width = size.width, height = size.height, "resolution changed");
                }
                Some(SessionEvent::KeyframeInterval { interval_ms }) => {
                    info!(
                        interval_ms,
                        frames = stats.frames(),
                        keyframes = stats.keyframes(),
                        bytes = stats.bytes(),
                        "stream statistics"
                    );
                }
                None => break,
            },
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    if run_command(&controller, line.trim()).await == Flow::Quit {
                        break;
                    }
                }
                Ok(None) => stdin_open = false,
                Err(e) => {
                    warn!(error = %e, "stdin closed");
                    stdin_open = false;
                }
            },
        }
    }

    controller.disconnect().await;
    info!(
        frames = stats.frames(),
        keyframes = stats.keyframes(),
        bytes = stats.bytes(),
        "mirror client stopped"
    );
    Ok(())
}
