//! [`Command`] for deleting an [`Accommodation`].

use common::{
    operations::{By, Commit, Delete, Lock, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{accommodation, Accommodation, Lease},
    infra::{database, Database},
    read::lease::Filter,
    Service,
};

use super::Command;

/// [`Command`] for deleting an [`Accommodation`] along with its [`Lease`]
/// history.
///
/// Refused while the [`Accommodation`] has an active [`Lease`].
#[derive(Clone, Copy, Debug)]
pub struct DeleteAccommodation {
    /// ID of the [`Accommodation`] to delete.
    pub accommodation_id: accommodation::Id,
}

impl<Db> Command<DeleteAccommodation> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Accommodation, accommodation::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Accommodation>, accommodation::Id>>,
            Ok = Option<Accommodation>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Lease>, Filter>>,
            Ok = Vec<Lease>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Accommodation, accommodation::Id>>,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeleteAccommodation,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteAccommodation { accommodation_id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::<Accommodation, _>::new(accommodation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let accommodation = tx
            .execute(Select(By::<Option<Accommodation>, _>::new(
                accommodation_id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::AccommodationNotExists(accommodation_id))
            .map_err(tracerr::wrap!())?;

        let now = DateTime::now();
        let is_leased = tx
            .execute(Select(By::<Vec<Lease>, _>::new(Filter::Accommodations(
                vec![accommodation.id],
            ))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .iter()
            .any(|l| l.is_active_at(now));
        if is_leased {
            return Err(tracerr::new!(E::AccommodationLeased(accommodation.id)));
        }

        tx.execute(Delete(By::<Accommodation, _>::new(accommodation.id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)
    }
}

/// Error of [`DeleteAccommodation`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Accommodation`] with the provided ID does not exist.
    #[display("`Accommodation(id: {_0})` does not exist")]
    AccommodationNotExists(#[error(not(source))] accommodation::Id),

    /// [`Accommodation`] has an active [`Lease`].
    #[display("`Accommodation(id: {_0})` has an active `Lease`")]
    AccommodationLeased(#[error(not(source))] accommodation::Id),
}
