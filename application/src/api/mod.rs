//! REST API definitions.

pub mod accommodation;
pub mod lease;
pub mod trace;

use axum::{
    routing::{get, post, put},
    Extension, Router,
};
use tower_http::cors::CorsLayer;

use crate::{define_error, Authorizer, Error, Service};

/// Name of the [`tracing::Span`] for the API operations.
const SPAN_NAME: &str = "REST operation";

/// Builds the [`Router`] serving the whole REST API.
///
/// Expects a [`Service`] and an [`Authorizer`] to be provided as
/// [`Extension`]s.
pub fn router() -> Router {
    Router::new()
        .route("/lease", post(lease::create).get(lease::list))
        .route(
            "/lease/:id",
            get(lease::read).put(lease::update).delete(lease::delete),
        )
        .route("/housing", post(accommodation::create))
        .route(
            "/housing/:id",
            put(accommodation::update).delete(accommodation::delete),
        )
}

/// Builds the whole HTTP application: the [`router()`] along with its
/// [`Extension`]s, the provided [`CorsLayer`] and request tracing.
pub fn app(
    service: Service,
    authorizer: Authorizer,
    cors: CorsLayer,
) -> Router {
    router()
        .layer(Extension(service))
        .layer(Extension(authorizer))
        .layer(cors)
        .layer(trace::layer())
}

/// Parses the provided raw path segment as a positive numeric ID.
///
/// # Errors
///
/// With [`RequestError::InvalidId`] if the segment is not a positive integer.
pub fn parse_id<Id: From<i64>>(raw: &str) -> Result<Id, Error> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .map(Id::from)
        .ok_or_else(|| RequestError::InvalidId.into())
}

define_error! {
    enum RequestError {
        #[code = "INVALID_ID"]
        #[status = BAD_REQUEST]
        #[message = "Invalid ID"]
        InvalidId,

        #[code = "INVALID_USER_ID"]
        #[status = BAD_REQUEST]
        #[message = "Missing or invalid userId"]
        MissingUserId,

        #[code = "INVALID_USER_ID"]
        #[status = BAD_REQUEST]
        #[message = "Invalid userId format"]
        InvalidUserIdFormat,

        #[code = "INVALID_ADDRESS"]
        #[status = BAD_REQUEST]
        #[message = "Invalid address"]
        InvalidAddress,

        #[code = "MISSING_FIELD"]
        #[status = BAD_REQUEST]
        #[message = "`ownerId` and `address` are required"]
        MissingHousingField,
    }
}

#[cfg(test)]
mod spec {
    use service::domain::lease;

    use super::parse_id;

    #[test]
    fn accepts_only_positive_integer_ids() {
        assert_eq!(parse_id::<lease::Id>("42").unwrap(), lease::Id::from(42));

        for raw in ["0", "-1", "abc", "", "1.5", " 1"] {
            let err = parse_id::<lease::Id>(raw).unwrap_err();

            assert_eq!(err.code, "INVALID_ID", "{raw:?}");
            assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
        }
    }
}
