//! [`Lease`]-related read definitions.

use crate::domain::{accommodation, user, Lease};
#[cfg(doc)]
use crate::domain::{Accommodation, User};

/// Filter selecting a list of [`Lease`]s.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum Filter {
    /// Every stored [`Lease`].
    #[default]
    All,

    /// [`Lease`]s made by the tenant [`User`] with the provided ID.
    Tenant(user::Id),

    /// [`Lease`]s made on any of the provided [`Accommodation`]s.
    Accommodations(Vec<accommodation::Id>),
}

impl Filter {
    /// Indicates whether the provided [`Lease`] passes this [`Filter`].
    #[must_use]
    pub fn matches(&self, lease: &Lease) -> bool {
        match self {
            Self::All => true,
            Self::Tenant(id) => lease.tenant_id == *id,
            Self::Accommodations(ids) => ids.contains(&lease.accommodation_id),
        }
    }
}
