//! [`Command`] for creating a new [`Accommodation`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime,
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

/// [`Command`] for creating a new [`Accommodation`] owned by an existing
/// owner [`User`].
#[derive(Clone, Debug)]
pub struct CreateAccommodation {
    /// ID of the owner [`User`] of a new [`Accommodation`].
    pub owner_id: user::Id,

    /// [`Address`] of a new [`Accommodation`].
    pub address: Address,
}

impl<Db> Command<CreateAccommodation> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Insert<accommodation::Draft>,
            Ok = Accommodation,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Accommodation;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateAccommodation,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateAccommodation { owner_id, address } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let owner = tx
            .execute(Select(By::<Option<User>, _>::new(owner_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(owner_id))
            .map_err(tracerr::wrap!())?;
        if owner.role != user::Role::Owner {
            return Err(tracerr::new!(E::UserNotOwner(owner_id)));
        }

        let accommodation = tx
            .execute(Insert(accommodation::Draft {
                owner_id,
                address,
                created_at: DateTime::now().coerce(),
            }))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(accommodation)
    }
}

/// Error of [`CreateAccommodation`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),

    /// [`User`] is not an owner.
    #[display("`User(id: {_0})` is not an owner")]
    UserNotOwner(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::accommodation::Address,
        test_support::{service, ADMIN, OWNER},
        Command as _,
    };

    use super::{CreateAccommodation, ExecutionError};

    #[tokio::test]
    async fn creates_available_accommodation() {
        let svc = service();

        let acc = svc
            .execute(CreateAccommodation {
                owner_id: OWNER.into(),
                address: Address::new("1 Main Street").unwrap(),
            })
            .await
            .unwrap();

        assert!(acc.is_available);
        assert_eq!(acc.occupant_id, None);
        assert_eq!(acc.owner_id, OWNER.into());
        assert_eq!(AsRef::<str>::as_ref(&acc.address), "1 Main Street");
    }

    #[tokio::test]
    async fn rejects_unknown_or_non_owner_user() {
        let svc = service();

        let err = svc
            .execute(CreateAccommodation {
                owner_id: 404.into(),
                address: Address::new("1 Main Street").unwrap(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::UserNotExists(_)));

        let err = svc
            .execute(CreateAccommodation {
                owner_id: ADMIN.into(),
                address: Address::new("1 Main Street").unwrap(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::UserNotOwner(_)));
    }
}
