use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::Level;

use rvcs_server::ServerConfig;
use rvcs_store::Database;
use rvcs_telemetry::{parse_module_level, TelemetryConfig};

/// Remote version-control command router.
#[derive(Debug, Parser)]
#[command(name = "rvcs", version)]
struct Cli {
    /// Interface to listen on.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Candidate port; repeat to give fallbacks. The first free one is used.
    #[arg(long = "port", default_values_t = [9091u16, 9092, 9093])]
    ports: Vec<u16>,

    /// Registry database file. Defaults to ~/.rvcs/database/registry.db.
    #[arg(long)]
    db: Option<PathBuf>,

    /// Default repository path for sessions. Defaults to the current directory.
    #[arg(long)]
    repo_root: Option<PathBuf>,

    #[arg(long, default_value_t = Level::INFO)]
    log_level: Level,

    /// Per-module level override, e.g. `rvcs_vcs=debug`. Repeatable.
    #[arg(long = "log-module", value_parser = parse_module_level)]
    log_modules: Vec<(String, Level)>,

    #[arg(long)]
    json_logs: bool,

    /// Limit for each VCS tool invocation; 0 disables it.
    #[arg(long, default_value_t = 300)]
    command_timeout_secs: u64,

    #[arg(long, default_value_t = 64 * 1024)]
    max_line_bytes: usize,
}

impl Cli {
    fn telemetry(&self) -> TelemetryConfig {
        TelemetryConfig {
            log_level: self.log_level,
            module_levels: self.log_modules.clone(),
            json: self.json_logs,
        }
    }

    fn server(&self) -> anyhow::Result<ServerConfig> {
        let repo_root = match &self.repo_root {
            Some(root) => root.clone(),
            None => std::env::current_dir().context("failed to resolve current directory")?,
        };
        Ok(ServerConfig {
            host: self.host.clone(),
            ports: self.ports.clone(),
            repo_root,
            max_line_bytes: self.max_line_bytes,
            command_timeout: (self.command_timeout_secs > 0)
                .then(|| Duration::from_secs(self.command_timeout_secs)),
        })
    }

    fn db_path(&self) -> PathBuf {
        self.db.clone().unwrap_or_else(|| {
            dirs_home()
                .join(".rvcs")
                .join("database")
                .join("registry.db")
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    rvcs_telemetry::init_telemetry(&cli.telemetry()).context("failed to initialize logging")?;

    let db_path = cli.db_path();
    let db = Database::open(&db_path)
        .with_context(|| format!("failed to open registry at {}", db_path.display()))?;

    let handle = rvcs_server::start(cli.server()?, db)
        .await
        .context("failed to start server")?;
    tracing::info!(port = handle.port, "rvcs ready");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl+c")?;

    tracing::info!(clients = handle.connected_clients(), "shutting down");
    handle.shutdown();
    Ok(())
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}
