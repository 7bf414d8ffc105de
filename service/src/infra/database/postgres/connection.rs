//! Statement execution on Postgres connections.

use std::{fmt, future::Future};

use futures::{FutureExt as _, TryFutureExt as _};
use ouroboros::self_referencing;
use tokio::sync::MappedMutexGuard;
use tokio_postgres::{types::ToSql, Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{self, postgres};

#[cfg(doc)]
use super::client;

pub use deadpool_postgres::{
    Client as Pooled, CreatePoolError as PoolCreationError, Pool, PoolError,
};
pub use tokio_postgres::Error;

/// Source of [`Session`]s to run SQL statements in.
///
/// Only [`Connection::session()`] is to be provided, the statement methods
/// are derived from it.
pub trait Connection {
    /// Acquires a [`Session`] for running a single statement.
    ///
    /// # Errors
    ///
    /// If no connection could be taken from the [`Pool`], or the transaction
    /// of this [`Connection`] is committed already.
    fn session(
        &self,
    ) -> impl Future<Output = Result<Session<'_>, Traced<database::Error>>>;

    /// Runs the provided statement, returning all the resulting rows.
    ///
    /// # Errors
    ///
    /// If no [`Session`] is available, or the statement fails.
    fn query<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = Result<Vec<Row>, Traced<database::Error>>>
    where
        T: ToStatement + ?Sized,
    {
        async move {
            let session = self.session().await.map_err(tracerr::wrap!())?;
            let rows = match &session {
                Session::Pooled(conn) => conn.query(stmt, params).await,
                Session::Tx(tx) => {
                    tx.opened()
                        .map_err(tracerr::wrap!())?
                        .query(stmt, params)
                        .await
                }
            };
            rows.map_err(tracerr::from_and_wrap!(=> postgres::Error))
                .map_err(tracerr::map_from)
        }
    }

    /// Runs the provided statement, returning its single resulting row, if
    /// any.
    ///
    /// # Errors
    ///
    /// If no [`Session`] is available, the statement fails or returns more
    /// than one row.
    fn query_opt<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = Result<Option<Row>, Traced<database::Error>>>
    where
        T: ToStatement + ?Sized,
    {
        async move {
            let session = self.session().await.map_err(tracerr::wrap!())?;
            let row = match &session {
                Session::Pooled(conn) => conn.query_opt(stmt, params).await,
                Session::Tx(tx) => {
                    tx.opened()
                        .map_err(tracerr::wrap!())?
                        .query_opt(stmt, params)
                        .await
                }
            };
            row.map_err(tracerr::from_and_wrap!(=> postgres::Error))
                .map_err(tracerr::map_from)
        }
    }

    /// Runs the provided statement, returning the number of affected rows.
    ///
    /// # Errors
    ///
    /// If no [`Session`] is available, or the statement fails.
    fn exec<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = Result<u64, Traced<database::Error>>>
    where
        T: ToStatement + ?Sized,
    {
        async move {
            let session = self.session().await.map_err(tracerr::wrap!())?;
            let affected = match &session {
                Session::Pooled(conn) => conn.execute(stmt, params).await,
                Session::Tx(tx) => {
                    tx.opened()
                        .map_err(tracerr::wrap!())?
                        .execute(stmt, params)
                        .await
                }
            };
            affected
                .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                .map_err(tracerr::map_from)
        }
    }
}

/// Connection held while running a statement.
pub enum Session<'c> {
    /// Connection taken from the [`Pool`] and returned right after the
    /// statement.
    Pooled(Pooled),

    /// Exclusive access to the transaction of a [`client::Tx`].
    Tx(MappedMutexGuard<'c, OwnedTx>),
}

/// Transaction owning the [`Pooled`] connection it is opened on.
///
/// The connection goes back to the [`Pool`] once this [`OwnedTx`] is
/// dropped, rolling the transaction back unless it was committed.
#[self_referencing]
pub struct OwnedTx {
    /// Connection the transaction is opened on.
    conn: Pooled,

    /// Transaction itself, [`None`] once committed.
    #[borrows(mut conn)]
    #[not_covariant]
    tx: Option<deadpool_postgres::Transaction<'this>>,
}

impl fmt::Debug for OwnedTx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let committed = self.with_tx(|tx| tx.is_none());
        f.debug_struct("OwnedTx")
            .field("committed", &committed)
            .finish_non_exhaustive()
    }
}

impl OwnedTx {
    /// Opens a transaction on the provided [`Pooled`] connection.
    ///
    /// # Errors
    ///
    /// If the `BEGIN` statement fails.
    pub async fn open(conn: Pooled) -> Result<Self, Traced<database::Error>> {
        Self::try_new_async_send(conn, |c| c.transaction().map_ok(Some).boxed())
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }

    /// Commits the transaction, leaving this [`OwnedTx`] unusable.
    ///
    /// # Errors
    ///
    /// If committed already, or the `COMMIT` statement fails.
    pub async fn commit(mut self) -> Result<(), Traced<database::Error>> {
        #[expect(
            clippy::redundant_closure_for_method_calls,
            reason = "different variance, see \
                      https://doc.rust-lang.org/nomicon/subtyping.html#variance"
        )]
        let tx = self
            .with_tx_mut(|tx| tx.take())
            .ok_or_else(|| tracerr::new!(postgres::Error::TxCommitted))
            .map_err(tracerr::map_from)?;
        tx.commit()
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }

    /// Returns the transaction, unless committed already.
    fn opened(
        &self,
    ) -> Result<&deadpool_postgres::Transaction<'_>, Traced<database::Error>>
    {
        self.with_tx(|tx| {
            tx.as_ref().ok_or_else(|| {
                tracerr::map_from(tracerr::new!(postgres::Error::TxCommitted))
            })
        })
    }
}
