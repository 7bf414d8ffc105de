//! [`Lease`] definitions.

pub mod eligibility;

use common::{DateTime, DateTimeOf, Money};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};

use crate::domain::{accommodation, user};
#[cfg(doc)]
use crate::domain::{Accommodation, User};

pub use self::eligibility::Rejection;

/// Tenancy agreement between a tenant and an [`Accommodation`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Lease {
    /// ID of this [`Lease`].
    pub id: Id,

    /// ID of the tenant [`User`] of this [`Lease`].
    pub tenant_id: user::Id,

    /// ID of the leased [`Accommodation`].
    pub accommodation_id: accommodation::Id,

    /// [`DateTime`] when this [`Lease`] starts.
    pub start: StartDateTime,

    /// [`DateTime`] when this [`Lease`] ends.
    pub end: EndDateTime,

    /// Monthly rent of this [`Lease`].
    pub rent: Money,

    /// Monthly charges of this [`Lease`].
    pub charges: Money,

    /// [`DateTime`] when the payment is due, if agreed.
    pub payment_date: Option<PaymentDateTime>,

    /// Indicates whether this [`Lease`] is in force.
    pub is_active: bool,

    /// [`DateTime`] when this [`Lease`] was created.
    pub created_at: CreationDateTime,
}

impl Lease {
    /// Indicates whether this [`Lease`] is active at the provided moment:
    /// flagged as active and ending strictly after it.
    #[must_use]
    pub fn is_active_at(&self, now: DateTime) -> bool {
        self.is_active && self.end.coerce() > now
    }
}

/// Approved, not yet persisted [`Lease`].
///
/// Its ID is assigned by the storage and it's always persisted as active.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Draft {
    /// ID of the tenant [`User`].
    pub tenant_id: user::Id,

    /// ID of the leased [`Accommodation`].
    pub accommodation_id: accommodation::Id,

    /// [`DateTime`] when the [`Lease`] starts.
    pub start: StartDateTime,

    /// [`DateTime`] when the [`Lease`] ends.
    pub end: EndDateTime,

    /// Monthly rent.
    pub rent: Money,

    /// Monthly charges.
    pub charges: Money,

    /// [`DateTime`] when the payment is due, if agreed.
    pub payment_date: Option<PaymentDateTime>,

    /// [`DateTime`] when the [`Lease`] is created.
    pub created_at: CreationDateTime,
}

impl Draft {
    /// Turns this [`Draft`] into a persisted [`Lease`] with the provided ID.
    #[must_use]
    pub fn into_lease(self, id: Id) -> Lease {
        let Self {
            tenant_id,
            accommodation_id,
            start,
            end,
            rent,
            charges,
            payment_date,
            created_at,
        } = self;
        Lease {
            id,
            tenant_id,
            accommodation_id,
            start,
            end,
            rent,
            charges,
            payment_date,
            is_active: true,
            created_at,
        }
    }
}

/// Partial modification of a [`Lease`].
///
/// [`None`] fields are left untouched.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Patch {
    /// New tenant [`User`].
    pub tenant_id: Option<user::Id>,

    /// New leased [`Accommodation`].
    pub accommodation_id: Option<accommodation::Id>,

    /// New start of the [`Lease`].
    pub start: Option<StartDateTime>,

    /// New end of the [`Lease`].
    pub end: Option<EndDateTime>,

    /// New monthly rent.
    pub rent: Option<Money>,

    /// New monthly charges.
    pub charges: Option<Money>,

    /// New payment due date.
    pub payment_date: Option<PaymentDateTime>,
}

impl Patch {
    /// Indicates whether this [`Patch`] modifies nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Applies this [`Patch`] to the provided [`Lease`].
    pub fn apply(self, lease: &mut Lease) {
        let Self {
            tenant_id,
            accommodation_id,
            start,
            end,
            rent,
            charges,
            payment_date,
        } = self;

        if let Some(id) = tenant_id {
            lease.tenant_id = id;
        }
        if let Some(id) = accommodation_id {
            lease.accommodation_id = id;
        }
        if let Some(at) = start {
            lease.start = at;
        }
        if let Some(at) = end {
            lease.end = at;
        }
        if let Some(amount) = rent {
            lease.rent = amount;
        }
        if let Some(amount) = charges {
            lease.charges = amount;
        }
        if let Some(at) = payment_date {
            lease.payment_date = Some(at);
        }
    }
}

/// ID of a [`Lease`].
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

/// Marker type indicating a [`Lease`] start.
#[derive(Clone, Copy, Debug)]
pub struct Start;

/// Marker type indicating a [`Lease`] end.
#[derive(Clone, Copy, Debug)]
pub struct End;

/// Marker type indicating a [`Lease`] payment due date.
#[derive(Clone, Copy, Debug)]
pub struct Payment;

/// Marker type indicating a [`Lease`] creation.
#[derive(Clone, Copy, Debug)]
pub struct Creation;

/// [`DateTime`] when a [`Lease`] starts.
pub type StartDateTime = DateTimeOf<(Lease, Start)>;

/// [`DateTime`] when a [`Lease`] ends.
pub type EndDateTime = DateTimeOf<(Lease, End)>;

/// [`DateTime`] when a [`Lease`] payment is due.
pub type PaymentDateTime = DateTimeOf<(Lease, Payment)>;

/// [`DateTime`] when a [`Lease`] was created.
pub type CreationDateTime = DateTimeOf<(Lease, Creation)>;

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::{DateTime, Money};

    use super::{Id, Lease, Patch};

    fn lease() -> Lease {
        Lease {
            id: Id::from(1),
            tenant_id: 1.into(),
            accommodation_id: 1.into(),
            start: DateTime::parse_date("2025-01-01").unwrap().coerce(),
            end: DateTime::parse_date("2025-12-31").unwrap().coerce(),
            rent: Money::from_str("800").unwrap(),
            charges: Money::from_str("100").unwrap(),
            payment_date: None,
            is_active: true,
            created_at: DateTime::parse_date("2024-12-01").unwrap().coerce(),
        }
    }

    #[test]
    fn is_active_only_before_its_end() {
        let lease = lease();

        assert!(lease.is_active_at(DateTime::parse_date("2025-06-01").unwrap()));
        assert!(!lease.is_active_at(lease.end.coerce()));
        assert!(!lease.is_active_at(DateTime::parse_date("2026-01-01").unwrap()));
    }

    #[test]
    fn is_never_active_when_flagged_inactive() {
        let lease = Lease {
            is_active: false,
            ..lease()
        };

        assert!(!lease.is_active_at(DateTime::parse_date("2025-06-01").unwrap()));
    }

    #[test]
    fn patch_touches_only_supplied_fields() {
        let original = lease();
        let mut patched = original.clone();

        Patch {
            rent: Some(Money::from_str("1000").unwrap()),
            ..Patch::default()
        }
        .apply(&mut patched);

        assert_eq!(patched.rent, Money::from_str("1000").unwrap());
        assert_eq!(
            Lease {
                rent: original.rent,
                ..patched
            },
            original,
        );
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(Patch::default().is_empty());
        assert!(!Patch {
            tenant_id: Some(2.into()),
            ..Patch::default()
        }
        .is_empty());
    }
}
