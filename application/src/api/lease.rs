//! `/lease` endpoints.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query as QueryParams,
    },
    Json,
};
use common::Money;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service::{
    command,
    domain::{
        accommodation,
        lease::{
            self,
            eligibility::{
                CreateLeaseInput, Entity, Rejection, UpdateLeaseInput,
            },
        },
        user, Lease,
    },
    query, Command as _, Query as _,
};

use crate::{AsError, Context, Error};

use super::{parse_id, RequestError, SPAN_NAME};

/// [`Lease`] representation in responses.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseView {
    /// ID of the [`Lease`].
    pub id: lease::Id,

    /// ID of the tenant.
    pub tenant_id: user::Id,

    /// ID of the leased accommodation.
    pub accommodation_id: accommodation::Id,

    /// Start of the [`Lease`].
    pub start_date: lease::StartDateTime,

    /// End of the [`Lease`].
    pub end_date: lease::EndDateTime,

    /// Monthly rent.
    pub rent: Money,

    /// Monthly charges.
    pub charges: Money,

    /// Payment due date, if agreed.
    pub payment_date: Option<lease::PaymentDateTime>,

    /// Indicates whether the [`Lease`] is in force.
    pub is_active: bool,

    /// Creation time of the [`Lease`].
    pub created_at: lease::CreationDateTime,
}

impl From<Lease> for LeaseView {
    fn from(lease: Lease) -> Self {
        let Lease {
            id,
            tenant_id,
            accommodation_id,
            start,
            end,
            rent,
            charges,
            payment_date,
            is_active,
            created_at,
        } = lease;
        Self {
            id,
            tenant_id,
            accommodation_id,
            start_date: start,
            end_date: end,
            rent,
            charges,
            payment_date,
            is_active,
            created_at,
        }
    }
}

/// Body of a `POST /lease` request.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
    /// ID of the tenant.
    pub tenant_id: Option<user::Id>,

    /// ID of the accommodation to lease.
    pub accommodation_id: Option<accommodation::Id>,

    /// ID of the accommodation owner, as claimed by the requester.
    pub owner_id: Option<user::Id>,

    /// Start date.
    pub start_date: Option<String>,

    /// End date.
    pub end_date: Option<String>,

    /// Monthly rent.
    pub rent: Option<Decimal>,

    /// Monthly charges.
    pub charges: Option<Decimal>,

    /// Payment due date.
    pub payment_date: Option<String>,
}

impl From<CreateBody> for CreateLeaseInput {
    fn from(body: CreateBody) -> Self {
        let CreateBody {
            tenant_id,
            accommodation_id,
            owner_id,
            start_date,
            end_date,
            rent,
            charges,
            payment_date,
        } = body;
        Self {
            tenant_id,
            accommodation_id,
            owner_id,
            start: start_date,
            end: end_date,
            rent,
            charges,
            payment_date,
        }
    }
}

/// Body of a `PUT /lease/:id` request.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBody {
    /// ID of the new tenant.
    pub tenant_id: Option<user::Id>,

    /// ID of the new accommodation.
    pub accommodation_id: Option<accommodation::Id>,

    /// New start date.
    pub start_date: Option<String>,

    /// New end date.
    pub end_date: Option<String>,

    /// New monthly rent.
    pub rent: Option<Decimal>,

    /// New monthly charges.
    pub charges: Option<Decimal>,

    /// New payment due date.
    pub payment_date: Option<String>,
}

impl From<UpdateBody> for UpdateLeaseInput {
    fn from(body: UpdateBody) -> Self {
        let UpdateBody {
            tenant_id,
            accommodation_id,
            start_date,
            end_date,
            rent,
            charges,
            payment_date,
        } = body;
        Self {
            tenant_id,
            accommodation_id,
            start: start_date,
            end: end_date,
            rent,
            charges,
            payment_date,
        }
    }
}

/// Creates a new `Lease`.
///
/// # Errors
///
/// Possible error codes:
/// - `MISSING_IDENTIFIER`, `MISSING_FIELD`, `INVALID_DATE`, `INVALID_AMOUNT`,
///   `INVALID_TENANT` - the payload is not acceptable;
/// - `FORBIDDEN` - the claimed owner doesn't own the accommodation;
/// - `HOUSING_NOT_FOUND` - the accommodation doesn't exist;
/// - `CONFLICT` - the accommodation or the tenant is already leased.
#[tracing::instrument(
    skip_all,
    fields(http.operation = "createLease", otel.name = SPAN_NAME),
)]
pub async fn create(
    ctx: Context,
    body: Result<Json<CreateBody>, JsonRejection>,
) -> Result<(http::StatusCode, Json<LeaseView>), Error> {
    ctx.authorize("lease.create").await?;
    let Json(body) = body.map_err(AsError::into_error)?;

    let lease = ctx
        .service()
        .execute(command::CreateLease { input: body.into() })
        .await
        .map_err(AsError::into_error)?;

    Ok((http::StatusCode::CREATED, Json(lease.into())))
}

/// Lists the `Lease`s visible to the `User` given in the `userId` query
/// parameter.
///
/// # Errors
///
/// Possible error codes:
/// - `INVALID_USER_ID` - `userId` is missing, repeated or not an integer;
/// - `USER_NOT_FOUND` - the `User` doesn't exist;
/// - `FORBIDDEN` - the `User` is neither a tenant nor an owner.
#[tracing::instrument(
    skip_all,
    fields(http.operation = "listLeases", otel.name = SPAN_NAME),
)]
pub async fn list(
    ctx: Context,
    params: Result<QueryParams<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<Vec<LeaseView>>, Error> {
    ctx.authorize("lease.read").await?;
    let QueryParams(params) = params.map_err(AsError::into_error)?;
    let user_id = parse_user_id(&params)?;

    let leases = ctx
        .service()
        .execute(query::ListLeases { user_id })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(leases.into_iter().map(Into::into).collect()))
}

/// Returns the `Lease` with the provided ID.
///
/// # Errors
///
/// Possible error codes:
/// - `INVALID_ID` - the ID is not a positive integer;
/// - `LEASE_NOT_FOUND` - the `Lease` doesn't exist.
#[tracing::instrument(
    skip_all,
    fields(http.operation = "readLease", id = %id, otel.name = SPAN_NAME),
)]
pub async fn read(
    ctx: Context,
    Path(id): Path<String>,
) -> Result<Json<LeaseView>, Error> {
    ctx.authorize("lease.read").await?;
    let id = parse_id::<lease::Id>(&id)?;

    ctx.service()
        .execute(query::lease::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .map(|l| Json(l.into()))
        .ok_or_else(|| Rejection::NotFound(Entity::Lease).as_error())
}

/// Updates the `Lease` with the provided ID, changing only the supplied
/// fields.
///
/// # Errors
///
/// Possible error codes:
/// - `INVALID_ID` - the ID is not a positive integer;
/// - `LEASE_NOT_FOUND`, `HOUSING_NOT_FOUND` - the `Lease` or the new
///   accommodation doesn't exist;
/// - `INVALID_DATE`, `INVALID_AMOUNT`, `INVALID_TENANT` - the payload is not
///   acceptable;
/// - `CONFLICT` - the new tenant or accommodation is already leased.
#[tracing::instrument(
    skip_all,
    fields(http.operation = "updateLease", id = %id, otel.name = SPAN_NAME),
)]
pub async fn update(
    ctx: Context,
    Path(id): Path<String>,
    body: Result<Json<UpdateBody>, JsonRejection>,
) -> Result<Json<LeaseView>, Error> {
    ctx.authorize("lease.update").await?;
    let lease_id = parse_id::<lease::Id>(&id)?;
    let Json(body) = body.map_err(AsError::into_error)?;

    let lease = ctx
        .service()
        .execute(command::UpdateLease {
            lease_id,
            input: body.into(),
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(lease.into()))
}

/// Deletes the `Lease` with the provided ID, releasing its accommodation.
///
/// # Errors
///
/// Possible error codes:
/// - `INVALID_ID` - the ID is not a positive integer;
/// - `LEASE_NOT_FOUND` - the `Lease` doesn't exist.
#[tracing::instrument(
    skip_all,
    fields(http.operation = "deleteLease", id = %id, otel.name = SPAN_NAME),
)]
pub async fn delete(
    ctx: Context,
    Path(id): Path<String>,
) -> Result<http::StatusCode, Error> {
    ctx.authorize("lease.delete").await?;
    let lease_id = parse_id::<lease::Id>(&id)?;

    ctx.service()
        .execute(command::DeleteLease { lease_id })
        .await
        .map_err(AsError::into_error)?;

    Ok(http::StatusCode::NO_CONTENT)
}

/// Extracts the single `userId` out of the provided query parameters.
fn parse_user_id(params: &[(String, String)]) -> Result<user::Id, Error> {
    let mut values = params
        .iter()
        .filter(|(name, _)| name == "userId")
        .map(|(_, value)| value);
    let (Some(raw), None) = (values.next(), values.next()) else {
        return Err(RequestError::MissingUserId.into());
    };
    raw.parse::<i64>()
        .map(user::Id::from)
        .map_err(|_| RequestError::InvalidUserIdFormat.into())
}

#[cfg(test)]
mod spec {
    use rust_decimal::Decimal;
    use service::domain::{lease::eligibility::CreateLeaseInput, user};

    use super::{parse_user_id, CreateBody};

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn parses_single_user_id() {
        assert_eq!(
            parse_user_id(&params(&[("userId", "7"), ("page", "2")])).unwrap(),
            user::Id::from(7),
        );
    }

    #[test]
    fn rejects_missing_or_repeated_user_id() {
        for pairs in [&[][..], &[("userId", "1"), ("userId", "2")][..]] {
            let err = parse_user_id(&params(pairs)).unwrap_err();

            assert_eq!(err.code, "INVALID_USER_ID");
            assert_eq!(err.message, "Missing or invalid userId");
        }
    }

    #[test]
    fn rejects_non_integer_user_id() {
        let err = parse_user_id(&params(&[("userId", "abc")])).unwrap_err();

        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Invalid userId format");
    }

    #[test]
    fn reads_camel_case_body() {
        let body: CreateBody = serde_json::from_str(
            r#"{
                "tenantId": 1,
                "accommodationId": 2,
                "startDate": "2025-01-01",
                "endDate": "2025-12-31",
                "rent": 800,
                "charges": "100.50"
            }"#,
        )
        .unwrap();

        let input = CreateLeaseInput::from(body);

        assert_eq!(input.tenant_id, Some(1.into()));
        assert_eq!(input.accommodation_id, Some(2.into()));
        assert_eq!(input.owner_id, None);
        assert_eq!(input.start.as_deref(), Some("2025-01-01"));
        assert_eq!(input.rent, Some(Decimal::from(800)));
        assert_eq!(input.charges, Some(Decimal::new(10050, 2)));
        assert_eq!(input.payment_date, None);
    }
}
