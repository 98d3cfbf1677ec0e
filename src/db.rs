use std::time::Duration;

use migration::{Migrator, MigratorTrait};
use sea_orm::{
    ConnectOptions, Database, DatabaseConnection,
    sqlx::sqlite::{SqliteJournalMode, SqliteSynchronous},
};

use crate::{config::StoreConfig, error::AppResult};

/// Long enough that the pool never reaps the only `:memory:` connection.
const EPHEMERAL_CONNECTION_LIFETIME: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

pub fn connect_options(store: &StoreConfig) -> ConnectOptions {
    let mut options = ConnectOptions::new(store.url());
    options.sqlx_logging(false);

    // Every pooled connection to `:memory:` opens its own empty database, and
    // a reaped connection would be replaced by one without the schema.
    if store.is_ephemeral() {
        options
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(EPHEMERAL_CONNECTION_LIFETIME)
            .max_lifetime(EPHEMERAL_CONNECTION_LIFETIME);
    }

    // Applied to each connection as the pool opens it.
    let durable = !store.is_ephemeral();
    options.map_sqlx_sqlite_opts(move |sqlite| {
        let sqlite = sqlite.foreign_keys(true);
        if durable {
            sqlite.journal_mode(SqliteJournalMode::Wal).synchronous(SqliteSynchronous::Normal)
        } else {
            sqlite
        }
    });

    options
}

pub async fn connect_and_migrate(store: &StoreConfig) -> AppResult<DatabaseConnection> {
    let db = Database::connect(connect_options(store)).await?;

    Migrator::up(&db, None).await?;
    tracing::debug!(url = store.url(), "store schema ready");

    Ok(db)
}
