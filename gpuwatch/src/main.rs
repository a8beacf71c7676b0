//! Entry point for the gpuwatch TUI. Parses args, resolves the profile, and runs
//! either the dashboard or the headless logger.

use anyhow::Context;
use clap::Parser;
use tracing::info;

use gpuwatch::app::App;
use gpuwatch::config::Overrides;
use gpuwatch::connection::ConnectionManager;
use gpuwatch::profiles::{load_profiles, profiles_path, save_profiles};
use gpuwatch::ws::WsDialer;
use gpuwatch::{headless, logging};

#[derive(Parser, Debug)]
#[command(
    name = "gpuwatch",
    version,
    about = "Live GPU telemetry monitor over WebSocket"
)]
struct Cli {
    /// Agent endpoint: ws://HOST:PORT/ws, wss://..., or HOST:PORT
    url: Option<String>,

    /// PEM file with the CA certificate(s) to trust for wss:// endpoints
    #[arg(short = 't', long = "tls-ca", value_name = "CERT_PEM")]
    tls_ca: Option<String>,

    /// Load (or create, when a URL is given) a named connection profile
    #[arg(short = 'P', long, value_name = "NAME")]
    profile: Option<String>,

    /// Overwrite an existing profile without asking
    #[arg(long)]
    save: bool,

    /// Number of samples kept for the charts
    #[arg(short, long, value_name = "N")]
    window: Option<usize>,

    /// Reconnect attempts after the connection drops (0 disables)
    #[arg(long, value_name = "N")]
    retries: Option<u32>,

    /// Keep chart history across reconnects instead of starting fresh
    #[arg(long)]
    retain_history: bool,

    /// Log samples to stderr instead of drawing the dashboard
    #[arg(long)]
    headless: bool,

    /// Resolve and print the configuration, then exit
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            url: self.url.clone(),
            tls_ca: self.tls_ca.clone(),
            profile: self.profile.clone(),
            save: self.save,
            window: self.window,
            retries: self.retries,
            retain_history: self.retain_history,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let log_file = if cli.dry_run {
        None
    } else {
        logging::init(cli.headless)?
    };

    let mut profiles = load_profiles();
    let resolved = cli.overrides().resolve(&profiles)?;
    if let Some((name, entry)) = resolved.persist {
        profiles.profiles.insert(name, entry);
        save_profiles(&profiles)
            .with_context(|| format!("failed to write {}", profiles_path().display()))?;
    }
    let settings = resolved.settings;

    if cli.dry_run {
        println!("endpoint: {}", settings.endpoint);
        if let Some(ca) = &settings.tls_ca {
            println!("tls_ca: {}", ca.display());
        }
        println!("window: {}", settings.window_capacity);
        println!("retries: {}", settings.reconnect.max_retries);
        println!("history: {:?}", settings.history);
        return Ok(());
    }

    if let Some(path) = &log_file {
        info!(path = %path.display(), "logging to file");
    }

    let dialer = WsDialer::new(settings.tls_ca.as_deref())
        .context("failed to prepare the websocket transport")?;
    let mut conn = ConnectionManager::new(dialer, settings.session_options());

    if cli.headless {
        headless::run(&mut conn, &settings).await?;
        return Ok(());
    }

    let mut app = App::new(conn, settings);
    app.run().await
}
