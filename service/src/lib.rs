//! Service contains the business logic of leases management.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
pub mod infra;
pub mod query;
pub mod read;
pub mod task;

use std::error::Error;

use common::operations::{By, Start};

use crate::domain::lease::eligibility::Policy;
#[cfg(doc)]
use crate::infra::Database;

pub use self::{command::Command, query::Query, task::Task};

/// [`Service`] configuration.
#[derive(Clone, Copy, Debug, Default)]
pub struct Config {
    /// [`Policy`] deciding which lease fields are mandatory.
    pub lease_policy: Policy,

    /// [`task::ReleaseVacatedAccommodations`] configuration.
    pub release_vacated_accommodations:
        task::release_vacated_accommodations::Config,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,
}

impl<Db> Service<Db> {
    /// Creates a new [`Service`] with the provided parameters, along with the
    /// [`task::Background`] running its [`Task`]s.
    pub fn new(config: Config, database: Db) -> (Self, task::Background)
    where
        Self: Task<
                Start<
                    By<
                        task::ReleaseVacatedAccommodations<Self>,
                        task::release_vacated_accommodations::Config,
                    >,
                >,
                Ok = (),
                Err: Error,
            > + Clone
            + 'static,
    {
        let this = Self { config, database };

        let mut bg = task::Background::default();
        let svc = this.clone();
        bg.spawn("ReleaseVacatedAccommodations", async move {
            svc.execute(Start(By::new(
                svc.config().release_vacated_accommodations,
            )))
            .await
        });

        (this, bg)
    }

    /// Returns [`Config`] of this [`Service`].
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }
}

#[cfg(test)]
mod test_support {
    //! Helpers for testing [`Command`]s and [`Query`]s against a
    //! [`Memory`] database.

    use common::DateTime;
    use rust_decimal::Decimal;

    use crate::{
        domain::{
            lease::eligibility::{CreateLeaseInput, Policy},
            user::{self, Role},
            User,
        },
        infra::Memory,
        Config, Service,
    };

    /// Owner of every test accommodation.
    pub(crate) const OWNER: i64 = 10;

    /// Tenants known to the test database.
    pub(crate) const TENANTS: [i64; 3] = [1, 2, 3];

    /// Administrator known to the test database.
    pub(crate) const ADMIN: i64 = 20;

    /// Creates a [`Service`] over a [`Memory`] database knowing the test
    /// users.
    pub(crate) fn service() -> Service<Memory> {
        service_with(Policy::default())
    }

    /// Creates a [`Service`] with the provided [`Policy`].
    pub(crate) fn service_with(lease_policy: Policy) -> Service<Memory> {
        let users = TENANTS
            .into_iter()
            .map(|id| (id, Role::Tenant))
            .chain([(OWNER, Role::Owner), (ADMIN, Role::Administrator)])
            .map(|(id, role)| User {
                id: user::Id::from(id),
                role,
            });
        Service {
            config: Config {
                lease_policy,
                ..Config::default()
            },
            database: Memory::with_users(users),
        }
    }

    /// Builds a valid [`CreateLeaseInput`] for the provided tenant and
    /// accommodation, ending a year from now.
    pub(crate) fn lease_input(
        tenant_id: i64,
        accommodation_id: i64,
    ) -> CreateLeaseInput {
        let now = DateTime::now();
        CreateLeaseInput {
            tenant_id: Some(tenant_id.into()),
            accommodation_id: Some(accommodation_id.into()),
            owner_id: Some(OWNER.into()),
            start: Some(now.to_rfc3339()),
            end: now
                .checked_add(std::time::Duration::from_secs(365 * 24 * 3600))
                .map(|end| end.to_rfc3339()),
            rent: Some(Decimal::from(800)),
            charges: Some(Decimal::from(100)),
            payment_date: None,
        }
    }
}
