//! Per-request units of work.
//!
//! A [`Store`] is bound once at startup and cloned into the router state. Each
//! request asks it for a [`Session`], which wraps a database transaction. The
//! session must be committed explicitly; dropping it on any other path (an
//! early `?`, a business-rule failure, a panic unwinding through the handler)
//! rolls the transaction back and returns the connection to the pool.

use std::ops::Deref;

use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};

use crate::{
    config::StoreConfig,
    db,
    error::{AppError, AppResult},
};

#[derive(Clone, Debug, Default)]
pub struct Store {
    db: Option<DatabaseConnection>,
}

impl Store {
    pub async fn bind(config: &StoreConfig) -> AppResult<Self> {
        let db = db::connect_and_migrate(config).await?;
        tracing::info!(ephemeral = config.is_ephemeral(), "store bound");
        Ok(Self { db: Some(db) })
    }

    pub fn unbound() -> Self {
        Self::default()
    }

    pub fn is_bound(&self) -> bool {
        self.db.is_some()
    }

    pub async fn session(&self) -> AppResult<Session> {
        let db = self.db.as_ref().ok_or(AppError::NotConfigured)?;
        let txn = db.begin().await?;
        tracing::trace!("session opened");
        Ok(Session { txn })
    }
}

pub struct Session {
    txn: DatabaseTransaction,
}

impl Session {
    pub async fn commit(self) -> AppResult<()> {
        self.txn.commit().await?;
        tracing::trace!("session committed");
        Ok(())
    }
}

impl Deref for Session {
    type Target = DatabaseTransaction;

    fn deref(&self) -> &Self::Target {
        &self.txn
    }
}
