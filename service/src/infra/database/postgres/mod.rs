//! [`Database`] backed by Postgres.
//!
//! Mutating commands run inside a [`Tx`], taking row locks in a fixed order
//! (accommodation, tenant, lease), so concurrent commands upon the same rows
//! wait for each other instead of racing past their checks.

pub mod client;
pub mod connection;
mod impls;

use deadpool_postgres::Runtime;
use derive_more::{Deref, Display, Error as StdError, From};
use tokio_postgres::NoTls;
use tracerr::Traced;

use crate::infra::database;
#[cfg(doc)]
use crate::infra::Database;

pub use deadpool_postgres::{Config, PoolConfig};
pub use refinery::embed_migrations;

pub use self::{
    client::{NonTx, Tx},
    connection::Connection,
};

/// Postgres [`Database`], either pooled ([`NonTx`]) or transactional
/// ([`Tx`]).
#[derive(Clone, Debug, Deref)]
pub struct Postgres<C = NonTx>(C);

impl Postgres {
    /// Connects a new [`Postgres`] pool, configured by the provided
    /// [`Config`].
    ///
    /// Connections are established lazily, on first use.
    ///
    /// # Errors
    ///
    /// If the [`Config`] is not valid for a pool.
    pub fn new(conf: &Config) -> Result<Self, Traced<database::Error>> {
        conf.create_pool(Some(Runtime::Tokio1), NoTls)
            .map(|pool| Self(NonTx::from_pool(pool)))
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)
    }
}

/// Failure of a [`Postgres`] operation.
#[derive(Debug, Display, StdError, From)]
pub enum Error {
    /// Statement failed on the server or the connection broke.
    #[display("Postgres statement failed: {_0}")]
    Statement(connection::Error),

    /// Pool could not be built out of a [`Config`].
    #[display("Invalid Postgres pool configuration: {_0}")]
    PoolConfig(connection::PoolCreationError),

    /// No connection could be taken from the pool.
    #[display("No Postgres connection available: {_0}")]
    PoolExhausted(connection::PoolError),

    /// [`Tx`] is used after being committed.
    #[display("Transaction is already committed")]
    #[from(ignore)]
    TxCommitted,
}
