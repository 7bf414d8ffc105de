//! [`Command`] for deleting a [`Lease`].

use common::{
    operations::{By, Commit, Delete, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        accommodation,
        lease::{
            self,
            eligibility::{self, Entity, Rejection},
        },
        Accommodation, Lease,
    },
    infra::{database, Database},
    read::lease::Filter,
    Service,
};

use super::Command;

/// [`Command`] for deleting a [`Lease`] and releasing its [`Accommodation`].
///
/// The [`Accommodation`] stays unavailable if another active [`Lease`] still
/// holds it.
#[derive(Clone, Copy, Debug)]
pub struct DeleteLease {
    /// ID of the [`Lease`] to delete.
    pub lease_id: lease::Id,
}

impl<Db> Command<DeleteLease> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Accommodation, accommodation::Id>>,
            Err = Traced<database::Error>,
        > + Database<Lock<By<Lease, lease::Id>>, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Lease>, lease::Id>>,
            Ok = Option<Lease>,
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
            Delete<By<Lease, lease::Id>>,
            Err = Traced<database::Error>,
        > + Database<Update<Accommodation>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DeleteLease) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteLease { lease_id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // The `Accommodation` must be locked before the `Lease`, so its ID is
        // looked up first.
        let accommodation_id = tx
            .execute(Select(By::<Option<Lease>, _>::new(lease_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .map(|l| l.accommodation_id)
            .ok_or(E::Rejected(Rejection::NotFound(Entity::Lease)))
            .map_err(tracerr::wrap!())?;

        tx.execute(Lock(By::<Accommodation, _>::new(accommodation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Lock(By::<Lease, _>::new(lease_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let lease = tx
            .execute(Select(By::<Option<Lease>, _>::new(lease_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let lease = eligibility::validate_delete(lease.as_ref())
            .map_err(tracerr::from_and_wrap!(=> E))?;

        tx.execute(Delete(By::<Lease, _>::new(lease.id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let accommodation = tx
            .execute(Select(By::<Option<Accommodation>, _>::new(
                lease.accommodation_id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if let Some(mut accommodation) = accommodation {
            let now = DateTime::now();
            let still_leased = tx
                .execute(Select(By::<Vec<Lease>, _>::new(
                    Filter::Accommodations(vec![accommodation.id]),
                )))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .iter()
                .any(|l| l.is_active_at(now));
            if !still_leased {
                accommodation.release();
                tx.execute(Update(accommodation))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;
            }
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)
    }
}

/// Error of [`DeleteLease`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Lease`] deletion is rejected.
    #[display("`Lease` deletion is rejected: {_0}")]
    #[from]
    Rejected(Rejection),
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Select};

    use crate::{
        command::{CreateAccommodation, CreateLease},
        domain::{
            accommodation::Address,
            lease::{
                self,
                eligibility::{CreateLeaseInput, Entity, Rejection},
            },
            Accommodation,
        },
        infra::{Database as _, Memory},
        query,
        test_support::{lease_input, service, OWNER},
        Command as _, Query as _, Service,
    };

    use super::{DeleteLease, ExecutionError};

    async fn accommodation(svc: &Service<Memory>) -> Accommodation {
        svc.execute(CreateAccommodation {
            owner_id: OWNER.into(),
            address: Address::new("1 Main Street").unwrap(),
        })
        .await
        .unwrap()
    }

    async fn reload(svc: &Service<Memory>, acc: &Accommodation) -> Accommodation {
        svc.database()
            .execute(Select(By::<Option<Accommodation>, _>::new(acc.id)))
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn deletes_lease_and_releases_accommodation() {
        let svc = service();
        let acc = accommodation(&svc).await;
        let lease = svc
            .execute(CreateLease {
                input: lease_input(1, acc.id.into()),
            })
            .await
            .unwrap();
        assert!(!reload(&svc, &acc).await.is_available);

        svc.execute(DeleteLease { lease_id: lease.id })
            .await
            .unwrap();

        assert_eq!(
            svc.execute(query::lease::ById::by(lease.id)).await.unwrap(),
            None,
        );
        let acc = reload(&svc, &acc).await;
        assert!(acc.is_available);
        assert_eq!(acc.occupant_id, None);
    }

    #[tokio::test]
    async fn rejects_unknown_lease() {
        let svc = service();

        let err = svc
            .execute(DeleteLease {
                lease_id: lease::Id::from(999_999),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::Rejected(Rejection::NotFound(Entity::Lease)),
        ));
    }

    #[tokio::test]
    async fn keeps_accommodation_held_by_another_active_lease() {
        let svc = service();
        let acc = accommodation(&svc).await;
        let past = svc
            .execute(CreateLease {
                input: CreateLeaseInput {
                    start: Some("2020-01-01".into()),
                    end: Some("2020-12-31".into()),
                    ..lease_input(1, acc.id.into())
                },
            })
            .await
            .unwrap();
        let current = svc
            .execute(CreateLease {
                input: lease_input(2, acc.id.into()),
            })
            .await
            .unwrap();

        svc.execute(DeleteLease { lease_id: past.id }).await.unwrap();

        let acc = reload(&svc, &acc).await;
        assert!(!acc.is_available);
        assert_eq!(acc.occupant_id, Some(current.tenant_id));
    }
}
