//! Eligibility rules deciding whether a [`Lease`] may be created, updated or
//! deleted.
//!
//! Every check here is a pure function over already read snapshots: the
//! caller decides which reads happen and when, and the result only depends on
//! the provided arguments.

use common::{DateTime, Money};
use derive_more::{Display, Error};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::{accommodation, user, Accommodation, User};

use super::{Draft, EndDateTime, Lease, Patch, PaymentDateTime, StartDateTime};

/// Configurable answers to which [`Lease`] fields are mandatory.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Policy {
    /// Whether a payment due date is required to create a [`Lease`].
    pub require_payment_date: bool,

    /// Whether zero charges are treated as missing ones.
    pub zero_charges_as_missing: bool,
}

/// Raw input for creating a new [`Lease`].
///
/// Every field is optional, so a malformed request is described by a typed
/// [`Rejection`] rather than a parsing failure.
#[derive(Clone, Debug, Default)]
pub struct CreateLeaseInput {
    /// ID of the tenant [`User`].
    pub tenant_id: Option<user::Id>,

    /// ID of the [`Accommodation`] to lease.
    pub accommodation_id: Option<accommodation::Id>,

    /// ID of the [`User`] claiming to own the [`Accommodation`].
    pub owner_id: Option<user::Id>,

    /// Start date of the [`Lease`].
    pub start: Option<String>,

    /// End date of the [`Lease`].
    pub end: Option<String>,

    /// Monthly rent.
    pub rent: Option<Decimal>,

    /// Monthly charges.
    pub charges: Option<Decimal>,

    /// Payment due date.
    pub payment_date: Option<String>,
}

/// Raw input for updating an existing [`Lease`].
///
/// [`None`] fields are left untouched.
#[derive(Clone, Debug, Default)]
pub struct UpdateLeaseInput {
    /// ID of the new tenant [`User`].
    pub tenant_id: Option<user::Id>,

    /// ID of the new leased [`Accommodation`].
    pub accommodation_id: Option<accommodation::Id>,

    /// New start date.
    pub start: Option<String>,

    /// New end date.
    pub end: Option<String>,

    /// New monthly rent.
    pub rent: Option<Decimal>,

    /// New monthly charges.
    pub charges: Option<Decimal>,

    /// New payment due date.
    pub payment_date: Option<String>,
}

/// [`CreateLeaseInput`] which passed all the checks not requiring any stored
/// state.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreatePayload {
    /// ID of the tenant [`User`].
    pub tenant_id: user::Id,

    /// ID of the [`Accommodation`] to lease.
    pub accommodation_id: accommodation::Id,

    /// ID of the [`User`] claiming to own the [`Accommodation`], if any.
    pub owner_id: Option<user::Id>,

    /// Start of the [`Lease`].
    pub start: StartDateTime,

    /// End of the [`Lease`].
    pub end: EndDateTime,

    /// Monthly rent.
    pub rent: Money,

    /// Monthly charges.
    pub charges: Money,

    /// Payment due date, if any.
    pub payment_date: Option<PaymentDateTime>,
}

/// Stored state a [`Lease`] creation depends on.
#[derive(Clone, Copy, Debug, Default)]
pub struct CreateSnapshot<'a> {
    /// [`Accommodation`] to lease, if it exists.
    pub accommodation: Option<&'a Accommodation>,

    /// [`Lease`]s ever made on the [`Accommodation`].
    pub accommodation_leases: &'a [Lease],

    /// Tenant [`User`], if it exists.
    pub tenant: Option<&'a User>,

    /// [`Lease`]s ever made by the tenant.
    pub tenant_leases: &'a [Lease],
}

/// Stored state a [`Lease`] update depends on.
#[derive(Clone, Copy, Debug, Default)]
pub struct UpdateSnapshot<'a> {
    /// [`Lease`] to update, if it exists.
    pub lease: Option<&'a Lease>,

    /// New tenant [`User`], if reassigned and it exists.
    pub tenant: Option<&'a User>,

    /// [`Lease`]s ever made by the tenant of the updated [`Lease`].
    pub tenant_leases: &'a [Lease],

    /// New [`Accommodation`], if reassigned and it exists.
    pub accommodation: Option<&'a Accommodation>,

    /// [`Lease`]s ever made on the [`Accommodation`] of the updated
    /// [`Lease`].
    pub accommodation_leases: &'a [Lease],
}

/// Reason of refusing a [`Lease`] operation.
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
pub enum Rejection {
    /// Tenant or accommodation identifier is absent.
    #[display("Tenant and accommodation identifiers are required")]
    MissingIdentifier,

    /// Required field is absent.
    #[display("`{_0}` is required")]
    MissingField(#[error(not(source))] Field),

    /// Date field is not a valid date.
    #[display("`{_0}` is not a valid date")]
    InvalidDate(#[error(not(source))] Field),

    /// Amount field is negative.
    #[display("`{_0}` must not be negative")]
    InvalidAmount(#[error(not(source))] Field),

    /// Referenced entity doesn't exist.
    #[display("{_0} not found")]
    NotFound(#[error(not(source))] Entity),

    /// Claimed owner doesn't own the accommodation.
    #[display("Requester is not the owner of the accommodation")]
    Forbidden,

    /// Tenant doesn't exist or is not classified as a tenant.
    #[display("Tenant is not valid or not of type `tenant`")]
    InvalidTenant,

    /// Operation would produce a second active [`Lease`].
    #[display("{_0}")]
    Conflict(#[error(not(source))] Conflict),
}

/// Field of a [`Lease`] named in a [`Rejection`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Field {
    /// Start date.
    #[display("start")]
    Start,

    /// End date.
    #[display("end")]
    End,

    /// Payment due date.
    #[display("payment")]
    Payment,

    /// Monthly rent.
    #[display("rent")]
    Rent,

    /// Monthly charges.
    #[display("charges")]
    Charges,
}

/// Kind of entity named in a [`Rejection::NotFound`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Entity {
    /// [`Lease`].
    #[display("Lease")]
    Lease,

    /// [`Accommodation`].
    #[display("Accommodation")]
    Accommodation,

    /// [`User`].
    #[display("User")]
    User,
}

/// Reason of a [`Rejection::Conflict`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Conflict {
    /// [`Accommodation`] already has an active [`Lease`].
    #[display("Accommodation already has an active lease")]
    AccommodationLeased,

    /// Tenant already has an active [`Lease`].
    #[display("Tenant already has an active lease")]
    TenantLeased,
}

/// Checks a [`CreateLeaseInput`] in full against the provided
/// [`CreateSnapshot`], returning the [`Draft`] to persist.
///
/// Checks are performed in order, stopping at the first failure:
/// 1. identifiers are present;
/// 2. rent and charges are present and not negative;
/// 3. dates are valid;
/// 4. the accommodation exists;
/// 5. the claimed owner (if any) owns the accommodation;
/// 6. the accommodation has no active [`Lease`];
/// 7. the tenant exists and is a tenant;
/// 8. the tenant has no active [`Lease`].
///
/// # Errors
///
/// With the [`Rejection`] of the first failed check.
pub fn validate_create(
    input: &CreateLeaseInput,
    snapshot: CreateSnapshot<'_>,
    policy: Policy,
    now: DateTime,
) -> Result<Draft, Rejection> {
    let payload = check_create_payload(input, policy)?;
    approve_create(payload, snapshot, now)
}

/// Performs the checks 1 to 3 of [`validate_create()`], which don't depend on
/// any stored state.
///
/// # Errors
///
/// With the [`Rejection`] of the first failed check.
pub fn check_create_payload(
    input: &CreateLeaseInput,
    policy: Policy,
) -> Result<CreatePayload, Rejection> {
    use Rejection as R;

    let (Some(tenant_id), Some(accommodation_id)) =
        (input.tenant_id, input.accommodation_id)
    else {
        return Err(R::MissingIdentifier);
    };

    let rent = required_amount(input.rent, Field::Rent)?;
    let charges = required_amount(input.charges, Field::Charges)?;
    if policy.zero_charges_as_missing && charges.is_zero() {
        return Err(R::MissingField(Field::Charges));
    }

    let start = required_date(input.start.as_deref(), Field::Start)?;
    let end = required_date(input.end.as_deref(), Field::End)?;
    if end < start {
        return Err(R::InvalidDate(Field::End));
    }

    let payment_date = match input.payment_date.as_deref() {
        Some(raw) => Some(parse_date(raw, Field::Payment)?),
        None if policy.require_payment_date => {
            return Err(R::MissingField(Field::Payment));
        }
        None => None,
    };

    Ok(CreatePayload {
        tenant_id,
        accommodation_id,
        owner_id: input.owner_id,
        start: start.coerce(),
        end: end.coerce(),
        rent,
        charges,
        payment_date: payment_date.map(DateTime::coerce),
    })
}

/// Performs the checks 4 to 8 of [`validate_create()`] over the provided
/// [`CreateSnapshot`].
///
/// # Errors
///
/// With the [`Rejection`] of the first failed check.
pub fn approve_create(
    payload: CreatePayload,
    snapshot: CreateSnapshot<'_>,
    now: DateTime,
) -> Result<Draft, Rejection> {
    use Rejection as R;

    let accommodation = snapshot
        .accommodation
        .filter(|a| a.id == payload.accommodation_id)
        .ok_or(R::NotFound(Entity::Accommodation))?;

    if payload.owner_id.is_some_and(|id| id != accommodation.owner_id) {
        return Err(R::Forbidden);
    }

    if has_active_lease(snapshot.accommodation_leases, now, None, |l| {
        l.accommodation_id == accommodation.id
    }) {
        return Err(R::Conflict(Conflict::AccommodationLeased));
    }

    let tenant = snapshot
        .tenant
        .filter(|u| u.id == payload.tenant_id && u.is_tenant())
        .ok_or(R::InvalidTenant)?;

    if has_active_lease(snapshot.tenant_leases, now, None, |l| {
        l.tenant_id == tenant.id
    }) {
        return Err(R::Conflict(Conflict::TenantLeased));
    }

    Ok(Draft {
        tenant_id: tenant.id,
        accommodation_id: accommodation.id,
        start: payload.start,
        end: payload.end,
        rent: payload.rent,
        charges: payload.charges,
        payment_date: payload.payment_date,
        created_at: now.coerce(),
    })
}

/// Checks an [`UpdateLeaseInput`] against the provided [`UpdateSnapshot`],
/// returning the [`Patch`] carrying only the supplied fields.
///
/// Conflicts are checked against the [`Lease`] as it would be after the
/// [`Patch`], so an update may never produce a second active [`Lease`] of the
/// same accommodation or tenant.
///
/// # Errors
///
/// If:
/// - the [`Lease`] doesn't exist;
/// - the new tenant doesn't exist or isn't a tenant;
/// - the new accommodation doesn't exist;
/// - any supplied date is invalid, or the resulting end precedes the start;
/// - any supplied amount is negative;
/// - the resulting accommodation or tenant has another active [`Lease`],
///   while the updated one is active or reassigned.
pub fn validate_update(
    input: &UpdateLeaseInput,
    snapshot: UpdateSnapshot<'_>,
    now: DateTime,
) -> Result<Patch, Rejection> {
    use Rejection as R;

    let lease = snapshot.lease.ok_or(R::NotFound(Entity::Lease))?;

    if let Some(tenant_id) = input.tenant_id {
        _ = snapshot
            .tenant
            .filter(|u| u.id == tenant_id && u.is_tenant())
            .ok_or(R::InvalidTenant)?;
    }
    if let Some(accommodation_id) = input.accommodation_id {
        _ = snapshot
            .accommodation
            .filter(|a| a.id == accommodation_id)
            .ok_or(R::NotFound(Entity::Accommodation))?;
    }

    let start = input
        .start
        .as_deref()
        .map(|raw| parse_date(raw, Field::Start))
        .transpose()?;
    let end = input
        .end
        .as_deref()
        .map(|raw| parse_date(raw, Field::End))
        .transpose()?;
    let payment_date = input
        .payment_date
        .as_deref()
        .map(|raw| parse_date(raw, Field::Payment))
        .transpose()?;
    if end.unwrap_or(lease.end.coerce()) < start.unwrap_or(lease.start.coerce())
    {
        return Err(R::InvalidDate(Field::End));
    }

    let rent = input
        .rent
        .map(|amount| Money::new(amount).ok_or(R::InvalidAmount(Field::Rent)))
        .transpose()?;
    let charges = input
        .charges
        .map(|amount| {
            Money::new(amount).ok_or(R::InvalidAmount(Field::Charges))
        })
        .transpose()?;

    let patch = Patch {
        tenant_id: input.tenant_id,
        accommodation_id: input.accommodation_id,
        start: start.map(DateTime::coerce),
        end: end.map(DateTime::coerce),
        rent,
        charges,
        payment_date: payment_date.map(DateTime::coerce),
    };

    let mut updated = lease.clone();
    patch.clone().apply(&mut updated);
    let is_active = updated.is_active_at(now);

    if (is_active || input.accommodation_id.is_some())
        && has_active_lease(
            snapshot.accommodation_leases,
            now,
            Some(lease),
            |l| l.accommodation_id == updated.accommodation_id,
        )
    {
        return Err(R::Conflict(Conflict::AccommodationLeased));
    }
    if (is_active || input.tenant_id.is_some())
        && has_active_lease(snapshot.tenant_leases, now, Some(lease), |l| {
            l.tenant_id == updated.tenant_id
        })
    {
        return Err(R::Conflict(Conflict::TenantLeased));
    }

    Ok(patch)
}

/// Checks whether the provided [`Lease`] may be deleted.
///
/// # Errors
///
/// If the [`Lease`] doesn't exist.
pub fn validate_delete(lease: Option<&Lease>) -> Result<&Lease, Rejection> {
    lease.ok_or(Rejection::NotFound(Entity::Lease))
}

/// Indicates whether any of the provided `leases` matching the `predicate` is
/// active at `now`, ignoring the `excluded` one.
fn has_active_lease(
    leases: &[Lease],
    now: DateTime,
    excluded: Option<&Lease>,
    predicate: impl Fn(&Lease) -> bool,
) -> bool {
    leases.iter().any(|l| {
        excluded.map_or(true, |ex| ex.id != l.id)
            && predicate(l)
            && l.is_active_at(now)
    })
}

/// Ensures the provided amount is present and not negative.
fn required_amount(
    amount: Option<Decimal>,
    field: Field,
) -> Result<Money, Rejection> {
    let amount = amount.ok_or(Rejection::MissingField(field))?;
    Money::new(amount).ok_or(Rejection::InvalidAmount(field))
}

/// Ensures the provided date is present and valid.
///
/// An absent date is reported as an invalid one.
fn required_date(raw: Option<&str>, field: Field) -> Result<DateTime, Rejection> {
    parse_date(raw.ok_or(Rejection::InvalidDate(field))?, field)
}

/// Parses the provided date.
fn parse_date(raw: &str, field: Field) -> Result<DateTime, Rejection> {
    DateTime::parse_date(raw).map_err(|_| Rejection::InvalidDate(field))
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::{DateTime, Money};
    use rust_decimal::Decimal;

    use crate::domain::{
        accommodation::{self, Address},
        lease::{self, Lease},
        user::{self, Role},
        Accommodation, User,
    };

    use super::{
        validate_create, validate_delete, validate_update, Conflict,
        CreateLeaseInput, CreateSnapshot, Entity, Field, Policy, Rejection,
        UpdateLeaseInput, UpdateSnapshot,
    };

    fn now() -> DateTime {
        DateTime::parse_date("2025-03-01").unwrap()
    }

    fn user(id: i64, role: Role) -> User {
        User {
            id: user::Id::from(id),
            role,
        }
    }

    fn accommodation(id: i64, owner: i64) -> Accommodation {
        Accommodation {
            id: accommodation::Id::from(id),
            owner_id: user::Id::from(owner),
            occupant_id: None,
            is_available: true,
            address: Address::new("1 Main Street").unwrap(),
            created_at: DateTime::UNIX_EPOCH.coerce(),
        }
    }

    fn lease(id: i64, tenant: i64, accommodation: i64, end: &str) -> Lease {
        Lease {
            id: lease::Id::from(id),
            tenant_id: user::Id::from(tenant),
            accommodation_id: accommodation::Id::from(accommodation),
            start: DateTime::parse_date("2024-01-01").unwrap().coerce(),
            end: DateTime::parse_date(end).unwrap().coerce(),
            rent: Money::from_str("700").unwrap(),
            charges: Money::from_str("50").unwrap(),
            payment_date: None,
            is_active: true,
            created_at: DateTime::UNIX_EPOCH.coerce(),
        }
    }

    fn input() -> CreateLeaseInput {
        CreateLeaseInput {
            tenant_id: Some(user::Id::from(1)),
            accommodation_id: Some(accommodation::Id::from(1)),
            owner_id: Some(user::Id::from(10)),
            start: Some("2025-01-01".into()),
            end: Some("2025-12-31".into()),
            rent: Some(Decimal::from(800)),
            charges: Some(Decimal::from(100)),
            payment_date: None,
        }
    }

    #[test]
    fn approves_eligible_lease() {
        let acc = accommodation(1, 10);
        let tenant = user(1, Role::Tenant);

        let draft = validate_create(
            &input(),
            CreateSnapshot {
                accommodation: Some(&acc),
                tenant: Some(&tenant),
                ..CreateSnapshot::default()
            },
            Policy::default(),
            now(),
        )
        .unwrap();

        assert_eq!(draft.tenant_id, tenant.id);
        assert_eq!(draft.accommodation_id, acc.id);
        assert_eq!(draft.start.to_rfc3339(), "2025-01-01T00:00:00Z");
        assert_eq!(draft.end.to_rfc3339(), "2025-12-31T00:00:00Z");
        assert_eq!(draft.rent, Money::from_str("800").unwrap());
        assert_eq!(draft.charges, Money::from_str("100").unwrap());
        assert!(draft.into_lease(lease::Id::from(5)).is_active);
    }

    #[test]
    fn decision_is_repeatable_over_same_snapshot() {
        let acc = accommodation(1, 10);
        let tenant = user(1, Role::Tenant);
        let history = [lease(3, 2, 1, "2026-01-01")];
        let snapshot = CreateSnapshot {
            accommodation: Some(&acc),
            accommodation_leases: &history,
            tenant: Some(&tenant),
            tenant_leases: &[],
        };

        let first = validate_create(&input(), snapshot, Policy::default(), now());
        let second =
            validate_create(&input(), snapshot, Policy::default(), now());

        assert_eq!(first, second);
        assert_eq!(
            first,
            Err(Rejection::Conflict(Conflict::AccommodationLeased)),
        );
    }

    #[test]
    fn requires_identifiers_first() {
        let input = CreateLeaseInput {
            accommodation_id: None,
            rent: None,
            start: Some("not-a-date".into()),
            ..input()
        };

        assert_eq!(
            validate_create(
                &input,
                CreateSnapshot::default(),
                Policy::default(),
                now(),
            ),
            Err(Rejection::MissingIdentifier),
        );
    }

    #[test]
    fn requires_amounts() {
        for (input, field) in [
            (
                CreateLeaseInput {
                    rent: None,
                    ..input()
                },
                Field::Rent,
            ),
            (
                CreateLeaseInput {
                    charges: None,
                    ..input()
                },
                Field::Charges,
            ),
        ] {
            assert_eq!(
                validate_create(
                    &input,
                    CreateSnapshot::default(),
                    Policy::default(),
                    now(),
                ),
                Err(Rejection::MissingField(field)),
            );
        }
    }

    #[test]
    fn rejects_negative_amounts() {
        let input = CreateLeaseInput {
            charges: Some(Decimal::from(-1)),
            ..input()
        };

        assert_eq!(
            validate_create(
                &input,
                CreateSnapshot::default(),
                Policy::default(),
                now(),
            ),
            Err(Rejection::InvalidAmount(Field::Charges)),
        );
    }

    #[test]
    fn zero_charges_depend_on_policy() {
        let acc = accommodation(1, 10);
        let tenant = user(1, Role::Tenant);
        let snapshot = CreateSnapshot {
            accommodation: Some(&acc),
            tenant: Some(&tenant),
            ..CreateSnapshot::default()
        };
        let input = CreateLeaseInput {
            charges: Some(Decimal::ZERO),
            ..input()
        };

        assert!(
            validate_create(&input, snapshot, Policy::default(), now()).is_ok()
        );
        assert_eq!(
            validate_create(
                &input,
                snapshot,
                Policy {
                    zero_charges_as_missing: true,
                    ..Policy::default()
                },
                now(),
            ),
            Err(Rejection::MissingField(Field::Charges)),
        );
    }

    #[test]
    fn rejects_invalid_dates() {
        for (input, field) in [
            (
                CreateLeaseInput {
                    start: Some("not-a-date".into()),
                    ..input()
                },
                Field::Start,
            ),
            (
                CreateLeaseInput {
                    start: None,
                    ..input()
                },
                Field::Start,
            ),
            (
                CreateLeaseInput {
                    end: Some("2025-02-30".into()),
                    ..input()
                },
                Field::End,
            ),
            (
                CreateLeaseInput {
                    end: Some("2024-12-31".into()),
                    ..input()
                },
                Field::End,
            ),
            (
                CreateLeaseInput {
                    payment_date: Some("soon".into()),
                    ..input()
                },
                Field::Payment,
            ),
        ] {
            assert_eq!(
                validate_create(
                    &input,
                    CreateSnapshot::default(),
                    Policy::default(),
                    now(),
                ),
                Err(Rejection::InvalidDate(field)),
            );
        }
    }

    #[test]
    fn payment_date_depends_on_policy() {
        assert_eq!(
            validate_create(
                &input(),
                CreateSnapshot::default(),
                Policy {
                    require_payment_date: true,
                    ..Policy::default()
                },
                now(),
            ),
            Err(Rejection::MissingField(Field::Payment)),
        );
    }

    #[test]
    fn requires_existing_accommodation() {
        let tenant = user(1, Role::Tenant);

        assert_eq!(
            validate_create(
                &input(),
                CreateSnapshot {
                    tenant: Some(&tenant),
                    ..CreateSnapshot::default()
                },
                Policy::default(),
                now(),
            ),
            Err(Rejection::NotFound(Entity::Accommodation)),
        );
    }

    #[test]
    fn requires_matching_owner() {
        let acc = accommodation(1, 11);
        let tenant = user(1, Role::Tenant);
        let snapshot = CreateSnapshot {
            accommodation: Some(&acc),
            tenant: Some(&tenant),
            ..CreateSnapshot::default()
        };

        assert_eq!(
            validate_create(&input(), snapshot, Policy::default(), now()),
            Err(Rejection::Forbidden),
        );

        let unclaimed = CreateLeaseInput {
            owner_id: None,
            ..input()
        };
        assert!(
            validate_create(&unclaimed, snapshot, Policy::default(), now())
                .is_ok()
        );
    }

    #[test]
    fn ignores_expired_and_inactive_leases() {
        let acc = accommodation(1, 10);
        let tenant = user(1, Role::Tenant);
        let expired = lease(3, 1, 1, "2025-02-28");
        let terminated = Lease {
            is_active: false,
            ..lease(4, 1, 1, "2026-01-01")
        };
        let history = [expired, terminated];

        assert!(validate_create(
            &input(),
            CreateSnapshot {
                accommodation: Some(&acc),
                accommodation_leases: &history,
                tenant: Some(&tenant),
                tenant_leases: &history,
            },
            Policy::default(),
            now(),
        )
        .is_ok());
    }

    #[test]
    fn requires_tenant_role() {
        let acc = accommodation(1, 10);
        for tenant in [None, Some(user(1, Role::Owner))] {
            assert_eq!(
                validate_create(
                    &input(),
                    CreateSnapshot {
                        accommodation: Some(&acc),
                        tenant: tenant.as_ref(),
                        ..CreateSnapshot::default()
                    },
                    Policy::default(),
                    now(),
                ),
                Err(Rejection::InvalidTenant),
            );
        }
    }

    #[test]
    fn rejects_already_leased_tenant() {
        let acc = accommodation(1, 10);
        let tenant = user(1, Role::Tenant);
        let elsewhere = [lease(3, 1, 2, "2026-01-01")];

        assert_eq!(
            validate_create(
                &input(),
                CreateSnapshot {
                    accommodation: Some(&acc),
                    tenant: Some(&tenant),
                    tenant_leases: &elsewhere,
                    ..CreateSnapshot::default()
                },
                Policy::default(),
                now(),
            ),
            Err(Rejection::Conflict(Conflict::TenantLeased)),
        );
    }

    #[test]
    fn update_requires_existing_lease() {
        assert_eq!(
            validate_update(
                &UpdateLeaseInput {
                    rent: Some(Decimal::from(1000)),
                    ..UpdateLeaseInput::default()
                },
                UpdateSnapshot::default(),
                now(),
            ),
            Err(Rejection::NotFound(Entity::Lease)),
        );
    }

    #[test]
    fn update_carries_only_supplied_fields() {
        let existing = lease(1, 1, 1, "2025-12-31");

        let patch = validate_update(
            &UpdateLeaseInput {
                rent: Some(Decimal::from(1000)),
                ..UpdateLeaseInput::default()
            },
            UpdateSnapshot {
                lease: Some(&existing),
                ..UpdateSnapshot::default()
            },
            now(),
        )
        .unwrap();

        assert_eq!(
            patch,
            lease::Patch {
                rent: Some(Money::from_str("1000").unwrap()),
                ..lease::Patch::default()
            },
        );
    }

    #[test]
    fn update_excludes_itself_from_tenant_conflicts() {
        let existing = lease(1, 1, 1, "2025-12-31");
        let tenant = user(1, Role::Tenant);
        let history = [existing.clone()];

        assert!(validate_update(
            &UpdateLeaseInput {
                tenant_id: Some(tenant.id),
                ..UpdateLeaseInput::default()
            },
            UpdateSnapshot {
                lease: Some(&existing),
                tenant: Some(&tenant),
                tenant_leases: &history,
                ..UpdateSnapshot::default()
            },
            now(),
        )
        .is_ok());

        let other = [lease(2, 1, 2, "2025-12-31")];
        assert_eq!(
            validate_update(
                &UpdateLeaseInput {
                    tenant_id: Some(tenant.id),
                    ..UpdateLeaseInput::default()
                },
                UpdateSnapshot {
                    lease: Some(&existing),
                    tenant: Some(&tenant),
                    tenant_leases: &other,
                    ..UpdateSnapshot::default()
                },
                now(),
            ),
            Err(Rejection::Conflict(Conflict::TenantLeased)),
        );
    }

    #[test]
    fn update_rejects_invalid_reassignment() {
        let existing = lease(1, 1, 1, "2025-12-31");
        let owner = user(2, Role::Owner);

        assert_eq!(
            validate_update(
                &UpdateLeaseInput {
                    tenant_id: Some(owner.id),
                    ..UpdateLeaseInput::default()
                },
                UpdateSnapshot {
                    lease: Some(&existing),
                    tenant: Some(&owner),
                    ..UpdateSnapshot::default()
                },
                now(),
            ),
            Err(Rejection::InvalidTenant),
        );
        assert_eq!(
            validate_update(
                &UpdateLeaseInput {
                    accommodation_id: Some(accommodation::Id::from(9)),
                    ..UpdateLeaseInput::default()
                },
                UpdateSnapshot {
                    lease: Some(&existing),
                    ..UpdateSnapshot::default()
                },
                now(),
            ),
            Err(Rejection::NotFound(Entity::Accommodation)),
        );
    }

    #[test]
    fn update_rejects_reassignment_to_leased_accommodation() {
        let existing = lease(1, 1, 1, "2025-12-31");
        let target = accommodation(2, 10);
        let history = [lease(2, 2, 2, "2025-12-31")];

        assert_eq!(
            validate_update(
                &UpdateLeaseInput {
                    accommodation_id: Some(target.id),
                    ..UpdateLeaseInput::default()
                },
                UpdateSnapshot {
                    lease: Some(&existing),
                    accommodation: Some(&target),
                    accommodation_leases: &history,
                    ..UpdateSnapshot::default()
                },
                now(),
            ),
            Err(Rejection::Conflict(Conflict::AccommodationLeased)),
        );

        let expired = [lease(2, 2, 2, "2024-06-30")];
        assert!(validate_update(
            &UpdateLeaseInput {
                accommodation_id: Some(target.id),
                ..UpdateLeaseInput::default()
            },
            UpdateSnapshot {
                lease: Some(&existing),
                accommodation: Some(&target),
                accommodation_leases: &expired,
                ..UpdateSnapshot::default()
            },
            now(),
        )
        .is_ok());
    }

    #[test]
    fn update_never_revives_lease_into_conflict() {
        let expired = lease(1, 1, 1, "2024-06-30");
        let current = lease(2, 2, 1, "2025-12-31");
        let on_accommodation = [expired.clone(), current];
        let prolong = UpdateLeaseInput {
            end: Some("2999-12-31".into()),
            ..UpdateLeaseInput::default()
        };

        assert_eq!(
            validate_update(
                &prolong,
                UpdateSnapshot {
                    lease: Some(&expired),
                    accommodation_leases: &on_accommodation,
                    ..UpdateSnapshot::default()
                },
                now(),
            ),
            Err(Rejection::Conflict(Conflict::AccommodationLeased)),
        );

        let of_tenant = [expired.clone(), lease(3, 1, 3, "2025-12-31")];
        assert_eq!(
            validate_update(
                &prolong,
                UpdateSnapshot {
                    lease: Some(&expired),
                    tenant_leases: &of_tenant,
                    ..UpdateSnapshot::default()
                },
                now(),
            ),
            Err(Rejection::Conflict(Conflict::TenantLeased)),
        );

        // Staying expired conflicts with nobody.
        assert!(validate_update(
            &UpdateLeaseInput {
                rent: Some(Decimal::from(900)),
                ..UpdateLeaseInput::default()
            },
            UpdateSnapshot {
                lease: Some(&expired),
                accommodation_leases: &on_accommodation,
                tenant_leases: &of_tenant,
                ..UpdateSnapshot::default()
            },
            now(),
        )
        .is_ok());
    }

    #[test]
    fn update_checks_dates_against_stored_ones() {
        let existing = lease(1, 1, 1, "2025-12-31");
        let snapshot = UpdateSnapshot {
            lease: Some(&existing),
            ..UpdateSnapshot::default()
        };

        assert_eq!(
            validate_update(
                &UpdateLeaseInput {
                    end: Some("2023-01-01".into()),
                    ..UpdateLeaseInput::default()
                },
                snapshot,
                now(),
            ),
            Err(Rejection::InvalidDate(Field::End)),
        );
        assert_eq!(
            validate_update(
                &UpdateLeaseInput {
                    payment_date: Some("tomorrow".into()),
                    ..UpdateLeaseInput::default()
                },
                snapshot,
                now(),
            ),
            Err(Rejection::InvalidDate(Field::Payment)),
        );
    }

    #[test]
    fn delete_requires_existing_lease() {
        let existing = lease(1, 1, 1, "2025-12-31");

        assert_eq!(validate_delete(Some(&existing)), Ok(&existing));
        assert_eq!(
            validate_delete(None),
            Err(Rejection::NotFound(Entity::Lease)),
        );
    }

    #[test]
    fn names_fields_stably() {
        assert_eq!(Field::Start.to_string(), "start");
        assert_eq!(
            Rejection::InvalidDate(Field::Start).to_string(),
            "`start` is not a valid date",
        );
        assert_eq!(
            Rejection::NotFound(Entity::Lease).to_string(),
            "Lease not found",
        );
    }
}
