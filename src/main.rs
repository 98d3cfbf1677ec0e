mod config;
mod db;
mod entities;
mod error;
mod extract;
mod models;
mod repository;
mod routes;
mod session;

use std::sync::Arc;

use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::Config,
    error::{AppError, AppResult},
    session::Store,
};

pub struct AppState {
    pub config: Config,
    pub store: Store,
}

impl AppState {
    /// The store must already be bound; an unbound one aborts startup.
    pub fn new(config: Config, store: Store) -> AppResult<Self> {
        if !store.is_bound() {
            return Err(AppError::NotConfigured);
        }
        Ok(Self { config, store })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,movielens_api=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Config::from_env()?;
    let store = Store::bind(&config.store).await?;
    let state = Arc::new(AppState::new(config, store)?);

    let app = routes::router(state.clone())
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(state.config.addr).await?;
    tracing::info!(addr = %state.config.addr, store = state.config.store.url(), "listening");
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;

    fn config() -> Config {
        Config { addr: "127.0.0.1:0".parse().unwrap(), store: StoreConfig::Ephemeral }
    }

    #[test]
    fn unbound_store_aborts_startup() {
        let err = AppState::new(config(), Store::unbound()).err().unwrap();
        assert!(matches!(err, AppError::NotConfigured));
    }

    #[tokio::test]
    async fn bound_store_is_accepted() {
        let store = Store::bind(&StoreConfig::Ephemeral).await.unwrap();
        assert!(AppState::new(config(), store).is_ok());
    }
}
