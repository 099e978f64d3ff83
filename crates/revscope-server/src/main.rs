mod api;
mod middleware;
mod users;

use std::sync::Arc;

use revscope_core::{AppConfig, Environment};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    users::{InMemoryUserRepository, UserService},
};

const DEV_PASSWORD_SALT: &str = "revscope-development-salt";

/// Configured salt, or the fixed development salt. Config loading already
/// rejects a missing salt outside development.
fn password_salt(config: &AppConfig) -> String {
    match &config.password_salt {
        Some(salt) => salt.clone(),
        None => {
            debug_assert_eq!(config.env, Environment::Development);
            tracing::warn!("REVSCOPE_PASSWORD_SALT not set; hashing with the development salt");
            DEV_PASSWORD_SALT.to_string()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = revscope_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let repository = Arc::new(InMemoryUserRepository::default());
    let state = AppState {
        users: Arc::new(UserService::new(repository, password_salt(&config))),
    };

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        env = %config.env,
        addr = %listener.local_addr()?,
        "revscope-server listening"
    );
    axum::serve(listener, build_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

/// Resolves on Ctrl-C or, on unix, SIGTERM.
async fn shutdown_signal() {
    let interrupt = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        signal(SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => tracing::info!("ctrl-c received; draining connections"),
        () = terminate => tracing::info!("SIGTERM received; draining connections"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(salt: Option<&str>) -> AppConfig {
        AppConfig {
            env: Environment::Development,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "info".to_string(),
            password_salt: salt.map(str::to_string),
            pipeline: revscope_core::PipelineConfig::default(),
            crawl: revscope_core::CrawlConfig::default(),
        }
    }

    #[test]
    fn configured_salt_wins() {
        assert_eq!(password_salt(&config(Some("pepper"))), "pepper");
    }

    #[test]
    fn development_falls_back_to_fixed_salt() {
        assert_eq!(password_salt(&config(None)), DEV_PASSWORD_SALT);
    }
}
