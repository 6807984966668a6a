use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use aquifer_core::{Config, ForwardModel};
use aquifer_server::{router, AppState};

#[derive(Parser)]
#[command(name = "aquifer-server", about = "Serve the forward groundwater model over HTTP")]
struct Opts {
    /// Port to listen on
    #[clap(long, default_value = "4242", env = "AQUIFER_PORT")]
    port: u16,

    /// Base model configuration (YAML)
    #[clap(long, default_value = "config/forward.yaml")]
    config: PathBuf,

    /// Simulator executable
    #[clap(long, default_value = "bin/mf2005", env = "AQUIFER_MF2005")]
    exe: PathBuf,

    /// Directory holding per-evaluation workspaces
    #[clap(long, default_value = "runs")]
    run_root: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let opts = Opts::parse();
    let base_config = Config::from_yaml_file(&opts.config)
        .with_context(|| format!("loading base configuration from {}", opts.config.display()))?;
    anyhow::ensure!(
        opts.exe.is_file(),
        "simulator executable not found at {} (run `cargo run -p aquifer-xtask -- build-sim`)",
        opts.exe.display()
    );

    let model = ForwardModel::new(&opts.exe, &opts.run_root);
    let state = AppState::new(model, base_config);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", opts.port))
        .await
        .with_context(|| format!("binding port {}", opts.port))?;
    tracing::info!(
        port = opts.port,
        exe = %opts.exe.display(),
        "serving model \"forward\""
    );
    axum::serve(listener, router(state))
        .await
        .context("server error")?;
    Ok(())
}
