//! Postgres clients backing the [`Postgres`] database.
//!
//! [`Postgres`]: super::Postgres

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};
use tracerr::Traced;

use crate::infra::database::{self, postgres};

use super::connection::{Connection, OwnedTx, Pool, Pooled, Session};

/// Client running every statement on its own connection from a [`Pool`].
#[derive(Clone, Debug)]
pub struct NonTx {
    /// [`Pool`] of Postgres connections.
    pool: Pool,
}

impl NonTx {
    /// Wraps the provided [`Pool`].
    #[must_use]
    pub(crate) fn from_pool(pool: Pool) -> Self {
        Self { pool }
    }

    /// Takes a [`Pooled`] connection out of the [`Pool`].
    pub(crate) async fn pooled(
        &self,
    ) -> Result<Pooled, Traced<database::Error>> {
        self.pool
            .get()
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }
}

impl Connection for NonTx {
    async fn session(&self) -> Result<Session<'_>, Traced<database::Error>> {
        self.pooled()
            .await
            .map(Session::Pooled)
            .map_err(tracerr::wrap!())
    }
}

/// Client running every statement inside one shared transaction.
///
/// Clones share the transaction. Dropping the last clone before
/// [`Tx::commit()`] rolls the transaction back.
#[derive(Clone, Debug)]
pub struct Tx(Arc<Mutex<Option<OwnedTx>>>);

impl Tx {
    /// Begins a transaction on a connection taken by the provided [`NonTx`]
    /// client.
    ///
    /// # Errors
    ///
    /// If no connection is available, or `BEGIN` fails.
    pub async fn begin(client: &NonTx) -> Result<Self, Traced<database::Error>> {
        let conn = client.pooled().await.map_err(tracerr::wrap!())?;
        let tx = OwnedTx::open(conn).await.map_err(tracerr::wrap!())?;
        Ok(Self(Arc::new(Mutex::new(Some(tx)))))
    }

    /// Commits the shared transaction.
    ///
    /// # Errors
    ///
    /// If any clone has committed already, or `COMMIT` fails.
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        let tx = self
            .0
            .lock()
            .await
            .take()
            .ok_or_else(|| tracerr::new!(postgres::Error::TxCommitted))
            .map_err(tracerr::map_from)?;
        tx.commit().await.map_err(tracerr::wrap!())
    }
}

impl Connection for Tx {
    async fn session(&self) -> Result<Session<'_>, Traced<database::Error>> {
        MutexGuard::try_map(self.0.lock().await, Option::as_mut)
            .map(Session::Tx)
            .map_err(|_| {
                tracerr::map_from(tracerr::new!(postgres::Error::TxCommitted))
            })
    }
}
