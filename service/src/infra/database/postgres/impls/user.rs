//! [`User`]-related [`Database`] implementations.
//!
//! Users are owned by an external system, so they are only read and locked
//! here, never written.

use common::operations::{By, Lock, Select};
use tracerr::Traced;

use crate::{
    domain::{user, User},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Option<User>, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "SELECT role FROM users WHERE id = $1::INT8";

        let id = by.into_inner();
        let row = self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?;
        Ok(row.map(|r| User {
            id,
            role: r.get("role"),
        }))
    }
}

impl<C> Database<Lock<By<User, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    /// Holds the [`User`] row until the end of the transaction, so the
    /// tenant checks of concurrent commands go one by one.
    async fn execute(
        &self,
        Lock(by): Lock<By<User, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // `NO KEY` leaves rows referencing the user insertable meanwhile.
        const SQL: &str =
            "SELECT 1 FROM users WHERE id = $1::INT8 FOR NO KEY UPDATE";

        let id: user::Id = by.into_inner();
        _ = self.query(SQL, &[&id]).await.map_err(tracerr::wrap!())?;
        Ok(())
    }
}
