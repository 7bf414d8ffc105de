//! [`Accommodation`]-related [`Database`] implementations.

use common::{
    operations::{By, Delete, Insert, Lock, Select, Update},
    DateTime,
};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{accommodation, user, Accommodation},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read::accommodation::Vacated,
};

/// Columns of the `accommodations` table read by [`from_row()`].
const COLUMNS: &str = "\
    id, owner_id, occupant_id, is_available, address, created_at";

/// Reads an [`Accommodation`] from the provided [`Row`] selecting
/// [`COLUMNS`].
fn from_row(row: &Row) -> Accommodation {
    Accommodation {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        occupant_id: row.get("occupant_id"),
        is_available: row.get("is_available"),
        address: row.get("address"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<Accommodation>, accommodation::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Accommodation>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Accommodation>, accommodation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: accommodation::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM accommodations \
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

impl<C> Database<Select<By<Vec<accommodation::Id>, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<accommodation::Id>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<accommodation::Id>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let owner_id: user::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM accommodations \
            WHERE owner_id = $1::INT8 \
            ORDER BY id";
        Ok(self
            .query(SQL, &[&owner_id])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| row.get("id"))
            .collect())
    }
}

impl<C> Database<Insert<accommodation::Draft>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Accommodation;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(draft): Insert<accommodation::Draft>,
    ) -> Result<Self::Ok, Self::Err> {
        let accommodation::Draft {
            owner_id,
            address,
            created_at,
        } = draft;

        const SQL: &str = "\
            INSERT INTO accommodations (\
                owner_id, occupant_id, is_available, address, created_at\
            ) \
            VALUES (\
                $1::INT8, NULL, TRUE, $2::VARCHAR, $3::TIMESTAMPTZ\
            ) \
            RETURNING id";
        let row = self
            .query_opt(SQL, &[&owner_id, &address, &created_at])
            .await
            .map_err(tracerr::wrap!())?;
        let Some(row) = row else {
            return Err(tracerr::new!(database::Error::MissingRow(
                "accommodations"
            )));
        };

        Ok(Accommodation {
            id: row.get("id"),
            owner_id,
            occupant_id: None,
            is_available: true,
            address,
            created_at,
        })
    }
}

impl<C> Database<Update<Accommodation>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(accommodation): Update<Accommodation>,
    ) -> Result<Self::Ok, Self::Err> {
        let Accommodation {
            id,
            owner_id,
            occupant_id,
            is_available,
            address,
            created_at,
        } = accommodation;

        const SQL: &str = "\
            UPDATE accommodations \
            SET owner_id = $2::INT8, \
                occupant_id = $3::INT8, \
                is_available = $4::BOOL, \
                address = $5::VARCHAR, \
                created_at = $6::TIMESTAMPTZ \
            WHERE id = $1::INT8";
        self.exec(
            SQL,
            &[
                &id,
                &owner_id,
                &occupant_id,
                &is_available,
                &address,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<Accommodation, accommodation::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Accommodation, accommodation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: accommodation::Id = by.into_inner();

        // `leases` are removed by the `ON DELETE CASCADE` constraint.
        const SQL: &str = "\
            DELETE FROM accommodations \
            WHERE id = $1::INT8";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Accommodation, accommodation::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Accommodation, accommodation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: accommodation::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM accommodations \
            WHERE id = $1::INT8 \
            FOR NO KEY UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Vacated, DateTime>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Vacated, DateTime>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Ordered, so concurrent lockers never wait for each other in a cycle.
        const SQL: &str = "\
            SELECT id \
            FROM accommodations \
            WHERE NOT is_available \
            ORDER BY id \
            FOR NO KEY UPDATE";
        self.query(SQL, &[])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Update<By<Vacated, DateTime>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<accommodation::Id>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(by): Update<By<Vacated, DateTime>>,
    ) -> Result<Self::Ok, Self::Err> {
        let now: DateTime = by.into_inner();

        const SQL: &str = "\
            UPDATE accommodations \
            SET is_available = TRUE, \
                occupant_id = NULL \
            WHERE NOT is_available \
              AND NOT EXISTS (\
                  SELECT 1 \
                  FROM leases \
                  WHERE leases.accommodation_id = accommodations.id \
                    AND leases.is_active \
                    AND leases.end_at > $1::TIMESTAMPTZ\
              ) \
            RETURNING id";
        Ok(self
            .query(SQL, &[&now])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| row.get("id"))
            .collect())
    }
}
