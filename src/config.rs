use std::net::SocketAddr;

use anyhow::Context;

const DEFAULT_DATABASE_URL: &str = "sqlite://movielens.db?mode=rwc";
const MEMORY_DATABASE_URL: &str = "sqlite::memory:";

/// Which store the process binds to. Chosen once at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreConfig {
    Durable { url: String },
    Ephemeral,
}

impl StoreConfig {
    pub fn url(&self) -> &str {
        match self {
            StoreConfig::Durable { url } => url,
            StoreConfig::Ephemeral => MEMORY_DATABASE_URL,
        }
    }

    pub fn is_ephemeral(&self) -> bool {
        matches!(self, StoreConfig::Ephemeral)
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub store: StoreConfig,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 =
            lookup("PORT").unwrap_or_else(|| "5000".to_string()).parse().context("PORT")?;

        let testing =
            lookup("APP_ENV").is_some_and(|env| env.trim().eq_ignore_ascii_case("testing"));

        let store = if testing {
            StoreConfig::Ephemeral
        } else {
            let url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
            StoreConfig::Durable { url }
        };

        Ok(Self { addr: format!("{host}:{port}").parse().context("HOST/PORT")?, store })
    }
}
