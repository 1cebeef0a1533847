use agency_server::{routes, AppState, ServerConfig, VERSION};
use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, Command};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = Command::new("agency-server")
        .version(VERSION)
        .about("Agency project provisioning service")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_parser(value_parser!(PathBuf))
                .help("Path to a TOML configuration file"),
        )
        .arg(
            Arg::new("bind")
                .long("bind")
                .value_parser(value_parser!(SocketAddr))
                .help("Listen address, overrides the configuration file"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .get_matches();

    init_tracing(matches.get_flag("log-json"));

    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = matches.get_one::<SocketAddr>("bind") {
        config.bind = *bind;
    }

    tracing::info!(
        version = VERSION,
        clients = config.seed.clients.len(),
        profiles = config.seed.profiles.len(),
        "agency server starting"
    );

    let state = Arc::new(AppState::from_config(&config));
    let (addr, server) = warp::serve(routes(state))
        .try_bind_with_graceful_shutdown(config.bind, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
            }
        })
        .with_context(|| format!("binding {}", config.bind))?;

    tracing::info!(%addr, "listening");
    server.await;
    tracing::info!("shut down");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
