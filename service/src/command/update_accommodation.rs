//! [`Command`] for updating an existing [`Accommodation`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        accommodation::{self, Address},
        user, Accommodation, User,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for changing the [`Address`] and/or the owner of an
/// [`Accommodation`].
#[derive(Clone, Debug)]
pub struct UpdateAccommodation {
    /// ID of the [`Accommodation`] to update.
    pub accommodation_id: accommodation::Id,

    /// New [`Address`], if any.
    pub address: Option<Address>,

    /// ID of the new owner [`User`], if any.
    pub owner_id: Option<user::Id>,
}

impl<Db> Command<UpdateAccommodation> for Service<Db>
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
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Update<Accommodation>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Accommodation;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateAccommodation,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateAccommodation {
            accommodation_id,
            address,
            owner_id,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::<Accommodation, _>::new(accommodation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut accommodation = tx
            .execute(Select(By::<Option<Accommodation>, _>::new(
                accommodation_id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::AccommodationNotExists(accommodation_id))
            .map_err(tracerr::wrap!())?;

        if let Some(id) = owner_id {
            let owner = tx
                .execute(Select(By::<Option<User>, _>::new(id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::UserNotExists(id))
                .map_err(tracerr::wrap!())?;
            if owner.role != user::Role::Owner {
                return Err(tracerr::new!(E::UserNotOwner(id)));
            }
            accommodation.owner_id = id;
        }
        if let Some(address) = address {
            accommodation.address = address;
        }

        tx.execute(Update(accommodation.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(accommodation)
    }
}

/// Error of [`UpdateAccommodation`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Accommodation`] with the provided ID does not exist.
    #[display("`Accommodation(id: {_0})` does not exist")]
    AccommodationNotExists(#[error(not(source))] accommodation::Id),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),

    /// [`User`] is not an owner.
    #[display("`User(id: {_0})` is not an owner")]
    UserNotOwner(#[error(not(source))] user::Id),
}
