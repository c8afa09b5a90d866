//! Host process for live Go matches.
//!
//! Loads configuration, sets up logging and runs the match service until a
//! termination signal arrives. A transport layer embeds the same
//! [`GameService`] to accept connections.

mod cli;
mod config;
mod logging;
mod signals;

use anyhow::Context;
use cli::CliArgs;
use config::AppConfig;
use goban_server::GameService;
use std::time::Duration;
use tracing::info;

/// How often the live match count is logged.
const MONITOR_INTERVAL: Duration = Duration::from_secs(60);

// ============================================================================
// Application
// ============================================================================

pub struct Application {
    config: AppConfig,
    service: GameService,
}

impl Application {
    /// Loads configuration, applies CLI overrides and builds the service.
    pub async fn new(args: CliArgs) -> anyhow::Result<Self> {
        // Configuration is loaded before logging exists.
        let mut config = AppConfig::load_from_file(&args.config_path)
            .await
            .with_context(|| format!("loading {}", args.config_path.display()))?;
        config.apply_cli(&args);

        config
            .validate()
            .map_err(|e| anyhow::anyhow!("Configuration validation failed: {e}"))?;

        logging::setup_logging(&config.logging)?;

        let service = GameService::with_config(config.to_server_config());
        info!("🎮 Goban host v{}", env!("CARGO_PKG_VERSION"));
        info!("📂 Config: {}", args.config_path.display());

        Ok(Self { config, service })
    }

    /// Runs until a shutdown signal is received.
    pub async fn run(self) -> anyhow::Result<()> {
        let defaults = &self.config.defaults;
        info!("📋 Configuration Summary:");
        info!(
            "  🕒 Idle matches expire after {}s, checked every {}s",
            self.config.registry.match_timeout_secs, self.config.registry.sweep_interval_secs
        );
        info!(
            "  ⚫ Default board {}x{}, komi {}, {}s + {}x{}s",
            defaults.board_size,
            defaults.board_size,
            defaults.komi,
            defaults.main_time_secs,
            defaults.overtime_periods,
            defaults.overtime_secs
        );

        self.service.registry().start_sweeper().await;

        let monitoring_handle = {
            let service = self.service.clone();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(MONITOR_INTERVAL);
                interval.tick().await;
                loop {
                    interval.tick().await;
                    info!(
                        "📊 {} live matches | {} channels",
                        service.registry().len(),
                        service.fanout().channel_count()
                    );
                }
            })
        };

        signals::setup_signal_handlers()
            .await
            .context("installing signal handlers")?;

        monitoring_handle.abort();
        self.service.shutdown().await;
        info!("👋 Goban host stopped");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let app = Application::new(args).await?;
    app.run().await
}
