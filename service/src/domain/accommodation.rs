//! [`Accommodation`] definitions.

use common::DateTimeOf;
#[cfg(doc)]
use common::DateTime;
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};

use crate::domain::user;
#[cfg(doc)]
use crate::domain::{Lease, User};

/// Rentable accommodation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Accommodation {
    /// ID of this [`Accommodation`].
    pub id: Id,

    /// ID of the [`User`] owning this [`Accommodation`].
    pub owner_id: user::Id,

    /// ID of the [`User`] currently occupying this [`Accommodation`], if any.
    pub occupant_id: Option<user::Id>,

    /// Indicates whether this [`Accommodation`] may be leased.
    ///
    /// `false` exactly while there is an active [`Lease`] on it.
    pub is_available: bool,

    /// [`Address`] of this [`Accommodation`].
    pub address: Address,

    /// [`DateTime`] when this [`Accommodation`] was created.
    pub created_at: CreationDateTime,
}

impl Accommodation {
    /// Marks this [`Accommodation`] as leased by the provided tenant.
    pub fn occupy(&mut self, tenant_id: user::Id) {
        self.is_available = false;
        self.occupant_id = Some(tenant_id);
    }

    /// Marks this [`Accommodation`] as free for leasing again.
    pub fn release(&mut self) {
        self.is_available = true;
        self.occupant_id = None;
    }
}

/// Not yet persisted [`Accommodation`], which ID is assigned by the storage.
#[derive(Clone, Debug)]
pub struct Draft {
    /// ID of the [`User`] owning the [`Accommodation`].
    pub owner_id: user::Id,

    /// [`Address`] of the [`Accommodation`].
    pub address: Address,

    /// [`DateTime`] when the [`Accommodation`] is created.
    pub created_at: CreationDateTime,
}

/// ID of an [`Accommodation`].
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

/// Postal address of an [`Accommodation`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(str)]
pub struct Address(String);

impl Address {
    /// Creates a new [`Address`] if the given `address` is valid.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Option<Self> {
        let address = address.into();
        Self::check(&address).then_some(Self(address))
    }

    /// Checks whether the given `address` is a valid [`Address`].
    fn check(address: impl AsRef<str>) -> bool {
        let address = address.as_ref();
        address.trim() == address
            && !address.is_empty()
            && address.len() <= 1024
    }
}

impl std::str::FromStr for Address {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Address`")
    }
}

/// Marker type indicating an [`Accommodation`] creation.
#[derive(Clone, Copy, Debug)]
pub struct Creation;

/// [`DateTime`] when an [`Accommodation`] was created.
pub type CreationDateTime = DateTimeOf<(Accommodation, Creation)>;

#[cfg(test)]
mod spec {
    use super::Address;

    #[test]
    fn validates_address() {
        assert!(Address::new("1 Rue de Rivoli, Paris").is_some());
        assert!(Address::new("").is_none());
        assert!(Address::new(" padded ").is_none());
        assert!(Address::new("x".repeat(1025)).is_none());
    }
}
