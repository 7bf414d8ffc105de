//! [`Command`] for updating an existing [`Lease`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        accommodation,
        lease::{
            self,
            eligibility::{self, Rejection, UpdateLeaseInput, UpdateSnapshot},
        },
        user, Accommodation, Lease, User,
    },
    infra::{database, Database},
    read::lease::Filter,
    Service,
};

use super::Command;

/// [`Command`] for updating an existing [`Lease`] with the supplied fields
/// only.
///
/// Never changes the availability of any [`Accommodation`].
#[derive(Clone, Debug)]
pub struct UpdateLease {
    /// ID of the [`Lease`] to update.
    pub lease_id: lease::Id,

    /// Raw [`UpdateLeaseInput`] to validate.
    pub input: UpdateLeaseInput,
}

impl<Db> Command<UpdateLease> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Accommodation, accommodation::Id>>,
            Err = Traced<database::Error>,
        > + Database<Lock<By<User, user::Id>>, Err = Traced<database::Error>>
        + Database<Lock<By<Lease, lease::Id>>, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Lease>, lease::Id>>,
            Ok = Option<Lease>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Accommodation>, accommodation::Id>>,
            Ok = Option<Accommodation>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Lease>, Filter>>,
            Ok = Vec<Lease>,
            Err = Traced<database::Error>,
        > + Database<Update<Lease>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Lease;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: UpdateLease) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateLease { lease_id, input } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Locks the accommodation and tenant the `Lease` ends up with, in the
        // same order as `CreateLease` does, to never deadlock with it. Once
        // the `Lease` itself is locked, a re-read confirms its rows are held.
        let mut locked = None;
        let mut lease = loop {
            let lease = tx
                .execute(Select(By::<Option<Lease>, _>::new(lease_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::Rejected(Rejection::NotFound(
                    eligibility::Entity::Lease,
                )))
                .map_err(tracerr::wrap!())?;
            let target = (
                input.accommodation_id.unwrap_or(lease.accommodation_id),
                input.tenant_id.unwrap_or(lease.tenant_id),
            );
            if locked == Some(target) {
                break lease;
            }

            let (accommodation_id, tenant_id) = target;
            tx.execute(Lock(By::<Accommodation, _>::new(accommodation_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
            tx.execute(Lock(By::<User, _>::new(tenant_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
            tx.execute(Lock(By::<Lease, _>::new(lease_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
            locked = Some(target);
        };
        let accommodation_id =
            input.accommodation_id.unwrap_or(lease.accommodation_id);
        let tenant_id = input.tenant_id.unwrap_or(lease.tenant_id);

        let tenant = if let Some(id) = input.tenant_id {
            tx.execute(Select(By::<Option<User>, _>::new(id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
        } else {
            None
        };
        let tenant_leases = tx
            .execute(Select(By::<Vec<Lease>, _>::new(Filter::Tenant(
                tenant_id,
            ))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let accommodation = if let Some(id) = input.accommodation_id {
            tx.execute(Select(By::<Option<Accommodation>, _>::new(id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
        } else {
            None
        };
        let accommodation_leases = tx
            .execute(Select(By::<Vec<Lease>, _>::new(
                Filter::Accommodations(vec![accommodation_id]),
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let patch = eligibility::validate_update(
            &input,
            UpdateSnapshot {
                lease: Some(&lease),
                tenant: tenant.as_ref(),
                tenant_leases: &tenant_leases,
                accommodation: accommodation.as_ref(),
                accommodation_leases: &accommodation_leases,
            },
            DateTime::now(),
        )
        .map_err(tracerr::from_and_wrap!(=> E))?;

        if patch.is_empty() {
            return Ok(lease);
        }
        patch.apply(&mut lease);

        tx.execute(Update(lease.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(lease)
    }
}

/// Error of [`UpdateLease`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Lease`] update is rejected.
    #[display("`Lease` update is rejected: {_0}")]
    #[from]
    Rejected(Rejection),
}

#[cfg(test)]
mod spec {
    use common::Money;
    use rust_decimal::Decimal;

    use crate::{
        command::{CreateAccommodation, CreateLease},
        domain::{
            accommodation::Address,
            lease::{
                self,
                eligibility::{
                    Conflict, CreateLeaseInput, Entity, Rejection,
                    UpdateLeaseInput,
                },
            },
            Accommodation, Lease,
        },
        infra::Memory,
        query,
        test_support::{lease_input, service, OWNER},
        Command as _, Query as _, Service,
    };

    use super::{ExecutionError, UpdateLease};

    async fn accommodation(svc: &Service<Memory>) -> Accommodation {
        svc.execute(CreateAccommodation {
            owner_id: OWNER.into(),
            address: Address::new("1 Main Street").unwrap(),
        })
        .await
        .unwrap()
    }

    async fn leased(svc: &Service<Memory>, tenant: i64) -> Lease {
        let acc = accommodation(svc).await;
        svc.execute(CreateLease {
            input: lease_input(tenant, acc.id.into()),
        })
        .await
        .unwrap()
    }

    fn rejection(err: &tracerr::Traced<ExecutionError>) -> Option<Rejection> {
        match err.as_ref() {
            ExecutionError::Rejected(r) => Some(*r),
            ExecutionError::Db(_) => None,
        }
    }

    #[tokio::test]
    async fn updates_only_supplied_fields() {
        let svc = service();
        let original = leased(&svc, 1).await;

        let updated = svc
            .execute(UpdateLease {
                lease_id: original.id,
                input: UpdateLeaseInput {
                    rent: Some(Decimal::from(1000)),
                    ..UpdateLeaseInput::default()
                },
            })
            .await
            .unwrap();

        assert_eq!(updated.rent, Money::new(Decimal::from(1000)).unwrap());
        assert_eq!(
            Lease {
                rent: original.rent,
                ..updated.clone()
            },
            original,
        );
        assert_eq!(
            svc.execute(query::lease::ById::by(original.id))
                .await
                .unwrap(),
            Some(updated),
        );
    }

    #[tokio::test]
    async fn rejects_unknown_lease() {
        let svc = service();

        let err = svc
            .execute(UpdateLease {
                lease_id: lease::Id::from(999_999),
                input: UpdateLeaseInput::default(),
            })
            .await
            .unwrap_err();

        assert_eq!(rejection(&err), Some(Rejection::NotFound(Entity::Lease)));
    }

    #[tokio::test]
    async fn rejects_reassignment_to_leased_tenant() {
        let svc = service();
        let first = leased(&svc, 1).await;
        _ = leased(&svc, 2).await;

        let err = svc
            .execute(UpdateLease {
                lease_id: first.id,
                input: UpdateLeaseInput {
                    tenant_id: Some(2.into()),
                    ..UpdateLeaseInput::default()
                },
            })
            .await
            .unwrap_err();
        assert_eq!(
            rejection(&err),
            Some(Rejection::Conflict(Conflict::TenantLeased)),
        );

        let moved = svc
            .execute(UpdateLease {
                lease_id: first.id,
                input: UpdateLeaseInput {
                    tenant_id: Some(3.into()),
                    ..UpdateLeaseInput::default()
                },
            })
            .await
            .unwrap();
        assert_eq!(moved.tenant_id, 3.into());
    }

    #[tokio::test]
    async fn keeps_own_tenant_on_reassignment() {
        let svc = service();
        let lease = leased(&svc, 1).await;

        let updated = svc
            .execute(UpdateLease {
                lease_id: lease.id,
                input: UpdateLeaseInput {
                    tenant_id: Some(1.into()),
                    ..UpdateLeaseInput::default()
                },
            })
            .await
            .unwrap();

        assert_eq!(updated, lease);
    }

    #[tokio::test]
    async fn never_revives_lease_into_conflict() {
        let svc = service();
        let acc = accommodation(&svc).await;
        let expired = svc
            .execute(CreateLease {
                input: CreateLeaseInput {
                    start: Some("2020-01-01".into()),
                    end: Some("2020-12-31".into()),
                    ..lease_input(1, acc.id.into())
                },
            })
            .await
            .unwrap();
        _ = svc
            .execute(CreateLease {
                input: lease_input(2, acc.id.into()),
            })
            .await
            .unwrap();

        let err = svc
            .execute(UpdateLease {
                lease_id: expired.id,
                input: UpdateLeaseInput {
                    end: Some("2999-12-31".into()),
                    ..UpdateLeaseInput::default()
                },
            })
            .await
            .unwrap_err();

        assert_eq!(
            rejection(&err),
            Some(Rejection::Conflict(Conflict::AccommodationLeased)),
        );
        assert_eq!(
            svc.execute(query::lease::ById::by(expired.id))
                .await
                .unwrap(),
            Some(expired),
        );
    }

    #[tokio::test]
    async fn rejects_reassignment_to_leased_accommodation() {
        let svc = service();
        let first = leased(&svc, 1).await;
        let second = leased(&svc, 2).await;

        let err = svc
            .execute(UpdateLease {
                lease_id: first.id,
                input: UpdateLeaseInput {
                    accommodation_id: Some(second.accommodation_id),
                    ..UpdateLeaseInput::default()
                },
            })
            .await
            .unwrap_err();

        assert_eq!(
            rejection(&err),
            Some(Rejection::Conflict(Conflict::AccommodationLeased)),
        );
    }

    #[tokio::test]
    async fn leaves_accommodation_availability_untouched() {
        let svc = service();
        let lease = leased(&svc, 1).await;
        let vacant = accommodation(&svc).await;

        let moved = svc
            .execute(UpdateLease {
                lease_id: lease.id,
                input: UpdateLeaseInput {
                    accommodation_id: Some(vacant.id),
                    ..UpdateLeaseInput::default()
                },
            })
            .await
            .unwrap();
        assert_eq!(moved.accommodation_id, vacant.id);

        let previous = svc
            .execute(query::accommodation::ById::by(lease.accommodation_id))
            .await
            .unwrap()
            .unwrap();
        assert!(!previous.is_available);
        assert_eq!(previous.occupant_id, Some(1.into()));

        let current = svc
            .execute(query::accommodation::ById::by(vacant.id))
            .await
            .unwrap()
            .unwrap();
        assert!(current.is_available);
        assert_eq!(current.occupant_id, None);
    }
}
