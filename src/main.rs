use std::io::ErrorKind;
use std::sync::Arc;

use log::{error, info, warn};

use shift_solver::config::AppConfig;
use shift_solver::error::ConfigError;
use shift_solver::server;
use shift_solver::solver::ScheduleGenerator;

const CONFIG_ENV: &str = "SHIFT_SOLVER_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "shift_solver.toml";

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = match AppConfig::load(&path) {
        Ok(config) => {
            info!("Loaded configuration from {}", path);
            config
        }
        Err(ConfigError::Io(e)) if e.kind() == ErrorKind::NotFound => {
            warn!("No configuration at {}, using defaults", path);
            AppConfig::default()
        }
        Err(e) => {
            error!("Cannot load configuration from {}: {}", path, e);
            std::process::exit(1);
        }
    };

    let generator = Arc::new(ScheduleGenerator::new(config.engine));
    if let Err(e) = server::run_server(&config.server, generator).await {
        error!("Server stopped: {}", e);
        std::process::exit(1);
    }
}
