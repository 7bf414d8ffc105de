//! [`Lease`]-related [`Database`] implementations.

use common::operations::{By, Delete, Insert, Lock, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{lease, Lease},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read::lease::Filter,
};

/// Columns of the `leases` table read by [`from_row()`].
const COLUMNS: &str = "\
    id, tenant_id, accommodation_id, \
    start_at, end_at, \
    rent, charges, payment_at, \
    is_active, created_at";

/// Reads a [`Lease`] from the provided [`Row`] selecting [`COLUMNS`].
fn from_row(row: &Row) -> Lease {
    Lease {
        id: row.get("id"),
        tenant_id: row.get("tenant_id"),
        accommodation_id: row.get("accommodation_id"),
        start: row.get("start_at"),
        end: row.get("end_at"),
        rent: row.get("rent"),
        charges: row.get("charges"),
        payment_date: row.get("payment_at"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<Lease>, lease::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Lease>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Lease>, lease::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: lease::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM leases \
             WHERE id = $1::INT8",
        );
        Ok(self
            .query_opt(sql.as_str(), &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Lease>, Filter>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Lease>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Lease>, Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let rows = match by.into_inner() {
            Filter::All => {
                let sql = format!(
                    "SELECT {COLUMNS} \
                     FROM leases \
                     ORDER BY id",
                );
                self.query(sql.as_str(), &[]).await
            }
            Filter::Tenant(tenant_id) => {
                let sql = format!(
                    "SELECT {COLUMNS} \
                     FROM leases \
                     WHERE tenant_id = $1::INT8 \
                     ORDER BY id",
                );
                self.query(sql.as_str(), &[&tenant_id]).await
            }
            Filter::Accommodations(ids) => {
                if ids.is_empty() {
                    return Ok(vec![]);
                }
                let sql = format!(
                    "SELECT {COLUMNS} \
                     FROM leases \
                     WHERE accommodation_id = ANY($1::INT8[]) \
                     ORDER BY id",
                );
                self.query(sql.as_str(), &[&ids]).await
            }
        };
        Ok(rows
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<lease::Draft>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Lease;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(draft): Insert<lease::Draft>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            INSERT INTO leases (\
                tenant_id, accommodation_id, \
                start_at, end_at, \
                rent, charges, payment_at, \
                is_active, created_at\
            ) \
            VALUES (\
                $1::INT8, $2::INT8, \
                $3::TIMESTAMPTZ, $4::TIMESTAMPTZ, \
                $5::NUMERIC, $6::NUMERIC, $7::TIMESTAMPTZ, \
                TRUE, $8::TIMESTAMPTZ\
            ) \
            RETURNING id";
        let row = self
            .query_opt(
                SQL,
                &[
                    &draft.tenant_id,
                    &draft.accommodation_id,
                    &draft.start,
                    &draft.end,
                    &draft.rent,
                    &draft.charges,
                    &draft.payment_date,
                    &draft.created_at,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?;
        let Some(row) = row else {
            return Err(tracerr::new!(database::Error::MissingRow("leases")));
        };

        Ok(draft.into_lease(row.get("id")))
    }
}

impl<C> Database<Update<Lease>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(lease): Update<Lease>,
    ) -> Result<Self::Ok, Self::Err> {
        let Lease {
            id,
            tenant_id,
            accommodation_id,
            start,
            end,
            rent,
            charges,
            payment_date,
            is_active,
            created_at,
        } = lease;

        const SQL: &str = "\
            UPDATE leases \
            SET tenant_id = $2::INT8, \
                accommodation_id = $3::INT8, \
                start_at = $4::TIMESTAMPTZ, \
                end_at = $5::TIMESTAMPTZ, \
                rent = $6::NUMERIC, \
                charges = $7::NUMERIC, \
                payment_at = $8::TIMESTAMPTZ, \
                is_active = $9::BOOL, \
                created_at = $10::TIMESTAMPTZ \
            WHERE id = $1::INT8";
        self.exec(
            SQL,
            &[
                &id,
                &tenant_id,
                &accommodation_id,
                &start,
                &end,
                &rent,
                &charges,
                &payment_date,
                &is_active,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<Lease, lease::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Lease, lease::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: lease::Id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM leases \
            WHERE id = $1::INT8";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Lease, lease::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Lease, lease::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: lease::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM leases \
            WHERE id = $1::INT8 \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
