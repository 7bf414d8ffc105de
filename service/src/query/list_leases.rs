//! [`Query`] listing the [`Lease`]s visible to a [`User`].

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        accommodation,
        lease::eligibility::{Entity, Rejection},
        user::{self, Role},
        Lease, User,
    },
    infra::{database, Database},
    read::lease::Filter,
    Service,
};

use super::Query;

/// [`Query`] listing the [`Lease`]s visible to the requesting [`User`]:
/// the ones it rents as a tenant, or the ones on the accommodations it owns.
#[derive(Clone, Copy, Debug)]
pub struct ListLeases {
    /// ID of the requesting [`User`].
    pub user_id: user::Id,
}

impl<Db> Query<ListLeases> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<accommodation::Id>, user::Id>>,
            Ok = Vec<accommodation::Id>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Lease>, Filter>>,
            Ok = Vec<Lease>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Vec<Lease>;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, query: ListLeases) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ListLeases { user_id } = query;

        let user = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::Rejected(Rejection::NotFound(Entity::User)))
            .map_err(tracerr::wrap!())?;

        let filter = match user.role {
            Role::Tenant => Filter::Tenant(user.id),
            Role::Owner => {
                let owned = self
                    .database()
                    .execute(Select(By::<Vec<accommodation::Id>, _>::new(
                        user.id,
                    )))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?;
                if owned.is_empty() {
                    return Ok(vec![]);
                }
                Filter::Accommodations(owned)
            }
            Role::Administrator => {
                return Err(tracerr::new!(E::Rejected(Rejection::Forbidden)));
            }
        };

        self.database()
            .execute(Select(By::<Vec<Lease>, _>::new(filter)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
    }
}

/// Error of [`ListLeases`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Listing is rejected.
    #[display("`Lease`s listing is rejected: {_0}")]
    #[from]
    Rejected(Rejection),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{CreateAccommodation, CreateLease},
        domain::{
            accommodation::Address,
            lease::eligibility::{Entity, Rejection},
        },
        test_support::{lease_input, service, ADMIN, OWNER},
        Command as _, Query as _,
    };

    use super::{ExecutionError, ListLeases};

    #[tokio::test]
    async fn lists_by_role() {
        let svc = service();
        let mut leases = vec![];
        for tenant in [1, 2] {
            let acc = svc
                .execute(CreateAccommodation {
                    owner_id: OWNER.into(),
                    address: Address::new("1 Main Street").unwrap(),
                })
                .await
                .unwrap();
            leases.push(
                svc.execute(CreateLease {
                    input: lease_input(tenant, acc.id.into()),
                })
                .await
                .unwrap(),
            );
        }

        let owned = svc
            .execute(ListLeases {
                user_id: OWNER.into(),
            })
            .await
            .unwrap();
        assert_eq!(owned, leases);

        let rented = svc
            .execute(ListLeases { user_id: 2.into() })
            .await
            .unwrap();
        assert_eq!(rented, vec![leases[1].clone()]);

        let none = svc
            .execute(ListLeases { user_id: 3.into() })
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn rejects_other_roles_and_unknown_users() {
        let svc = service();

        let err = svc
            .execute(ListLeases {
                user_id: ADMIN.into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::Rejected(Rejection::Forbidden),
        ));

        let err = svc
            .execute(ListLeases {
                user_id: 404.into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::Rejected(Rejection::NotFound(Entity::User)),
        ));
    }
}
