//! [`User`] definitions.

use common::define_kind;
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};

/// Platform user: either a tenant, an owner, or someone else.
///
/// [`User`]s are managed elsewhere and are only read here.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct User {
    /// ID of this [`User`].
    pub id: Id,

    /// [`Role`] of this [`User`].
    pub role: Role,
}

impl User {
    /// Indicates whether this [`User`] is classified as a [`Role::Tenant`].
    #[must_use]
    pub fn is_tenant(&self) -> bool {
        self.role == Role::Tenant
    }
}

/// ID of a [`User`].
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(i64);

define_kind! {
    #[doc = "Role classification of a [`User`]."]
    enum Role {
        #[doc = "[`User`] renting accommodations."]
        Tenant = 1,

        #[doc = "[`User`] owning accommodations."]
        Owner = 2,

        #[doc = "[`User`] being neither a tenant nor an owner."]
        Administrator = 3,
    }
}
