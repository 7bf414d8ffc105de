//! `/housing` endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path},
    Json,
};
use serde::{Deserialize, Serialize};
use service::{
    command,
    domain::{
        accommodation::{self, Address},
        user, Accommodation,
    },
    Command as _,
};

use crate::{AsError, Context, Error};

use super::{parse_id, RequestError, SPAN_NAME};

/// [`Accommodation`] representation in responses.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HousingView {
    /// ID of the [`Accommodation`].
    pub id: accommodation::Id,

    /// ID of the owner.
    pub owner_id: user::Id,

    /// ID of the current tenant, if any.
    pub occupant_id: Option<user::Id>,

    /// Indicates whether the [`Accommodation`] may be leased.
    pub is_available: bool,

    /// Postal address.
    pub address: String,

    /// Creation time of the [`Accommodation`].
    pub created_at: accommodation::CreationDateTime,
}

impl From<Accommodation> for HousingView {
    fn from(acc: Accommodation) -> Self {
        let Accommodation {
            id,
            owner_id,
            occupant_id,
            is_available,
            address,
            created_at,
        } = acc;
        Self {
            id,
            owner_id,
            occupant_id,
            is_available,
            address: address.to_string(),
            created_at,
        }
    }
}

/// Body of `POST /housing` and `PUT /housing/:id` requests.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HousingBody {
    /// ID of the owner.
    pub owner_id: Option<user::Id>,

    /// Postal address.
    pub address: Option<String>,
}

impl HousingBody {
    /// Validates the provided raw address, if any.
    fn address(&self) -> Result<Option<Address>, Error> {
        self.address
            .as_deref()
            .map(|raw| Address::new(raw).ok_or(RequestError::InvalidAddress))
            .transpose()
            .map_err(Into::into)
    }
}

/// Creates a new housing.
///
/// # Errors
///
/// Possible error codes:
/// - `MISSING_FIELD` - `ownerId` or `address` is absent;
/// - `INVALID_ADDRESS` - the address is empty;
/// - `OWNER_NOT_FOUND` - the owner doesn't exist;
/// - `NOT_AN_OWNER` - the `User` is not an owner.
#[tracing::instrument(
    skip_all,
    fields(http.operation = "createHousing", otel.name = SPAN_NAME),
)]
pub async fn create(
    ctx: Context,
    body: Result<Json<HousingBody>, JsonRejection>,
) -> Result<(http::StatusCode, Json<HousingView>), Error> {
    ctx.authorize("housing.create").await?;
    let Json(body) = body.map_err(AsError::into_error)?;
    let (Some(owner_id), Some(address)) = (body.owner_id, body.address()?)
    else {
        return Err(RequestError::MissingHousingField.into());
    };

    let acc = ctx
        .service()
        .execute(command::CreateAccommodation { owner_id, address })
        .await
        .map_err(AsError::into_error)?;

    Ok((http::StatusCode::CREATED, Json(acc.into())))
}

/// Updates the address and/or the owner of a housing.
///
/// # Errors
///
/// Possible error codes:
/// - `INVALID_ID` - the ID is not a positive integer;
/// - `INVALID_ADDRESS` - the address is empty;
/// - `HOUSING_NOT_FOUND` - the housing doesn't exist;
/// - `OWNER_NOT_FOUND` - the new owner doesn't exist;
/// - `NOT_AN_OWNER` - the new owner is not an owner.
#[tracing::instrument(
    skip_all,
    fields(http.operation = "updateHousing", id = %id, otel.name = SPAN_NAME),
)]
pub async fn update(
    ctx: Context,
    Path(id): Path<String>,
    body: Result<Json<HousingBody>, JsonRejection>,
) -> Result<Json<HousingView>, Error> {
    ctx.authorize("housing.update").await?;
    let accommodation_id = parse_id::<accommodation::Id>(&id)?;
    let Json(body) = body.map_err(AsError::into_error)?;

    let acc = ctx
        .service()
        .execute(command::UpdateAccommodation {
            accommodation_id,
            address: body.address()?,
            owner_id: body.owner_id,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(acc.into()))
}

/// Deletes a housing along with its lease history.
///
/// # Errors
///
/// Possible error codes:
/// - `INVALID_ID` - the ID is not a positive integer;
/// - `HOUSING_NOT_FOUND` - the housing doesn't exist;
/// - `CONFLICT` - the housing has an active lease.
#[tracing::instrument(
    skip_all,
    fields(http.operation = "deleteHousing", id = %id, otel.name = SPAN_NAME),
)]
pub async fn delete(
    ctx: Context,
    Path(id): Path<String>,
) -> Result<http::StatusCode, Error> {
    ctx.authorize("housing.delete").await?;
    let accommodation_id = parse_id::<accommodation::Id>(&id)?;

    ctx.service()
        .execute(command::DeleteAccommodation { accommodation_id })
        .await
        .map_err(AsError::into_error)?;

    Ok(http::StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod spec {
    use super::HousingBody;

    #[test]
    fn validates_address() {
        let body = HousingBody {
            owner_id: None,
            address: Some("1 Main Street".to_owned()),
        };
        assert_eq!(
            body.address().unwrap().map(|a| a.to_string()).as_deref(),
            Some("1 Main Street"),
        );

        let body = HousingBody {
            address: Some(String::new()),
            ..body
        };
        assert_eq!(body.address().unwrap_err().code, "INVALID_ADDRESS");

        assert_eq!(HousingBody::default().address().unwrap(), None);
    }
}
