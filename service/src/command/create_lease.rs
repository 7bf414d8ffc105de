//! [`Command`] for creating a new [`Lease`].

use common::{
    operations::{
        By, Commit, Insert, Lock, Select, Transact, Transacted, Update,
    },
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        accommodation,
        lease::{
            self,
            eligibility::{
                self, CreateLeaseInput, CreateSnapshot, Entity, Rejection,
            },
        },
        user, Accommodation, Lease, User,
    },
    infra::{database, Database},
    read::lease::Filter,
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Lease`].
#[derive(Clone, Debug)]
pub struct CreateLease {
    /// Raw [`CreateLeaseInput`] to validate.
    pub input: CreateLeaseInput,
}

impl<Db> Command<CreateLease> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Accommodation, accommodation::Id>>,
            Err = Traced<database::Error>,
        > + Database<Lock<By<User, user::Id>>, Err = Traced<database::Error>>
        + Database<
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
        > + Database<
            Insert<lease::Draft>,
            Ok = Lease,
            Err = Traced<database::Error>,
        > + Database<Update<Accommodation>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Lease;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateLease) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        // Malformed input is rejected before touching the `Database` at all.
        let payload = eligibility::check_create_payload(
            &cmd.input,
            self.config().lease_policy,
        )
        .map_err(tracerr::from_and_wrap!(=> E))?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Serialize concurrent `Lease` operations upon the same
        // `Accommodation` and tenant.
        tx.execute(Lock(By::<Accommodation, _>::new(payload.accommodation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Lock(By::<User, _>::new(payload.tenant_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut accommodation = tx
            .execute(Select(By::<Option<Accommodation>, _>::new(
                payload.accommodation_id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::Rejected(Rejection::NotFound(Entity::Accommodation)))
            .map_err(tracerr::wrap!())?;
        let accommodation_leases = tx
            .execute(Select(By::<Vec<Lease>, _>::new(Filter::Accommodations(
                vec![accommodation.id],
            ))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let tenant = tx
            .execute(Select(By::<Option<User>, _>::new(payload.tenant_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let tenant_leases = tx
            .execute(Select(By::<Vec<Lease>, _>::new(Filter::Tenant(
                payload.tenant_id,
            ))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let draft = eligibility::approve_create(
            payload,
            CreateSnapshot {
                accommodation: Some(&accommodation),
                accommodation_leases: &accommodation_leases,
                tenant: tenant.as_ref(),
                tenant_leases: &tenant_leases,
            },
            DateTime::now(),
        )
        .map_err(tracerr::from_and_wrap!(=> E))?;

        let lease = tx
            .execute(Insert(draft))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        accommodation.occupy(lease.tenant_id);
        tx.execute(Update(accommodation))
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

/// Error of [`CreateLease`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Lease`] is not eligible for creation.
    #[display("`Lease` is rejected: {_0}")]
    #[from]
    Rejected(Rejection),
}
