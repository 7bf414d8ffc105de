//! [`Error`]-related definitions.

use std::fmt;

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    response::{IntoResponse, Response},
    Json,
};
use derive_more::Error as StdError;
use itertools::Itertools as _;
use serde::Serialize;
use service::{
    command,
    domain::lease::eligibility::{Entity, Rejection},
    infra::database,
    query,
};
use tracerr::{Trace, Traced};
use tracing as log;

/// Defines a new error type.
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_error {
    (
        enum $name:ident {
            $(
                #[code = $code:literal]
                #[status = $status_code:ident]
                #[message = $message:literal]
                $variant:ident
            ),* $(,)?
        }
    ) => {
        /// Error type.
        #[derive(
            Clone,
            Copy,
            Debug,
            ::derive_more::Display,
            ::derive_more::Error
        )]
        #[repr(u16)]
        pub enum $name {
            $(
                #[display($message)]
                #[doc = $message]
                $variant,
            )*
        }

        impl From<$name> for $crate::Error {
            fn from(err: $name) -> Self {
                match err {
                    $(
                        $name::$variant => Self {
                            code: $code,
                            status_code: ::http::StatusCode::$status_code,
                            message: $message.to_string(),
                            backtrace: None,
                        },
                    )*
                }
            }
        }
    };
}

/// REST API [`Error`].
#[derive(Clone, Debug, StdError)]
pub struct Error {
    /// [`Error`] code.
    pub code: Code,

    /// [`http::StatusCode`] of this [`Error`].
    pub status_code: http::StatusCode,

    /// Backtrace of this [`Error`].
    #[error(not(backtrace))]
    pub backtrace: Option<Trace>,

    /// [`Error`] message.
    pub message: String,
}

impl Error {
    /// Create a new [`Error`] representing an internal server error.
    #[must_use]
    pub fn internal(msg: &impl ToString) -> Self {
        Self {
            code: "INTERNAL_SERVER_ERROR",
            status_code: http::StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            backtrace: None,
        }
    }

    /// Creates a new [`Error`] out of the provided [`Rejection`], with the
    /// given `code` and `status_code`.
    fn rejected(
        code: Code,
        status_code: http::StatusCode,
        rejection: Rejection,
    ) -> Self {
        Self {
            code,
            status_code,
            message: rejection.to_string(),
            backtrace: None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            code,
            status_code: _,
            backtrace,
            message,
        } = self;

        write!(
            f,
            "[{code}]: {message}{}",
            backtrace
                .iter()
                .format_with("\n", |trace, f| f(&format_args!("{trace}"))),
        )
    }
}

/// JSON body of an [`Error`] response.
#[derive(Debug, Serialize)]
struct Body<'a> {
    /// [`Error`] code.
    code: Code,

    /// Human-readable [`Error`] message.
    message: &'a str,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Internals never leave the server.
        let message = if self.status_code.is_server_error() {
            log::error!("{self}");
            "Internal server error"
        } else {
            &self.message
        };
        let body = Json(Body {
            code: self.code,
            message,
        });
        (self.status_code, body).into_response()
    }
}

/// [`Error`] code.
pub type Code = &'static str;

/// Helper trait for converting types into [`Error`]s.
pub trait AsError {
    /// Tries to convert the type into an [`Error`].
    ///
    /// [`None`] is returned if the type cannot be converted into an [`Error`].
    fn try_as_error(&self) -> Option<Error>;

    /// Converts the type into an [`Error`].
    fn as_error(&self) -> Error
    where
        Self: fmt::Display,
    {
        self.try_as_error()
            .unwrap_or_else(|| Error::internal(&self))
    }

    /// Converts the type into an [`Error`] by consuming it.
    fn into_error(self) -> Error
    where
        Self: fmt::Display + Sized,
    {
        self.as_error()
    }
}

impl<E: AsError> AsError for Traced<E> {
    fn try_as_error(&self) -> Option<Error> {
        let mut error = self.as_ref().try_as_error()?;
        error.backtrace = Some(self.trace().clone());
        Some(error)
    }
}

impl AsError for JsonRejection {
    fn try_as_error(&self) -> Option<Error> {
        Some(Error {
            code: "INVALID_BODY",
            status_code: http::StatusCode::BAD_REQUEST,
            message: self.body_text(),
            backtrace: None,
        })
    }
}

impl AsError for QueryRejection {
    fn try_as_error(&self) -> Option<Error> {
        Some(Error {
            code: "INVALID_QUERY",
            status_code: http::StatusCode::BAD_REQUEST,
            message: self.body_text(),
            backtrace: None,
        })
    }
}

impl AsError for database::Error {
    fn try_as_error(&self) -> Option<Error> {
        None
    }
}

impl AsError for Rejection {
    fn try_as_error(&self) -> Option<Error> {
        use http::StatusCode as S;

        let rejection = *self;
        Some(match rejection {
            Self::MissingIdentifier => {
                Error::rejected("MISSING_IDENTIFIER", S::BAD_REQUEST, rejection)
            }
            Self::MissingField(_) => {
                Error::rejected("MISSING_FIELD", S::BAD_REQUEST, rejection)
            }
            Self::InvalidDate(_) => {
                Error::rejected("INVALID_DATE", S::BAD_REQUEST, rejection)
            }
            Self::InvalidAmount(_) => {
                Error::rejected("INVALID_AMOUNT", S::BAD_REQUEST, rejection)
            }
            Self::InvalidTenant => {
                Error::rejected("INVALID_TENANT", S::BAD_REQUEST, rejection)
            }
            Self::Forbidden => {
                Error::rejected("FORBIDDEN", S::FORBIDDEN, rejection)
            }
            Self::NotFound(entity) => Error::rejected(
                match entity {
                    Entity::Lease => "LEASE_NOT_FOUND",
                    Entity::Accommodation => "HOUSING_NOT_FOUND",
                    Entity::User => "USER_NOT_FOUND",
                },
                S::NOT_FOUND,
                rejection,
            ),
            Self::Conflict(_) => {
                Error::rejected("CONFLICT", S::CONFLICT, rejection)
            }
        })
    }
}

impl AsError for command::create_lease::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Rejected(r) => r.try_as_error(),
        }
    }
}

impl AsError for command::update_lease::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Rejected(r) => r.try_as_error(),
        }
    }
}

impl AsError for command::delete_lease::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Rejected(r) => r.try_as_error(),
        }
    }
}

impl AsError for query::list_leases::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Rejected(r) => r.try_as_error(),
        }
    }
}

impl AsError for command::create_accommodation::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::UserNotExists(_) => Some(HousingError::OwnerNotExists.into()),
            Self::UserNotOwner(_) => Some(HousingError::UserNotOwner.into()),
        }
    }
}

impl AsError for command::update_accommodation::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::AccommodationNotExists(_) => {
                Some(HousingError::NotExists.into())
            }
            Self::UserNotExists(_) => Some(HousingError::OwnerNotExists.into()),
            Self::UserNotOwner(_) => Some(HousingError::UserNotOwner.into()),
        }
    }
}

impl AsError for command::delete_accommodation::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::AccommodationNotExists(_) => {
                Some(HousingError::NotExists.into())
            }
            Self::AccommodationLeased(_) => Some(HousingError::Leased.into()),
        }
    }
}

define_error! {
    enum HousingError {
        #[code = "HOUSING_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "Housing not found"]
        NotExists,

        #[code = "OWNER_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "Owner not found"]
        OwnerNotExists,

        #[code = "NOT_AN_OWNER"]
        #[status = BAD_REQUEST]
        #[message = "User is not of type `owner`"]
        UserNotOwner,

        #[code = "CONFLICT"]
        #[status = CONFLICT]
        #[message = "Housing has an active lease"]
        Leased,
    }
}

#[cfg(test)]
mod spec {
    use axum::response::IntoResponse as _;
    use service::domain::lease::eligibility::{
        Conflict, Entity, Field, Rejection,
    };

    use super::{AsError as _, Error};

    #[test]
    fn maps_rejections_to_statuses() {
        for (rejection, status, code) in [
            (Rejection::MissingIdentifier, 400, "MISSING_IDENTIFIER"),
            (Rejection::MissingField(Field::Rent), 400, "MISSING_FIELD"),
            (Rejection::InvalidDate(Field::Start), 400, "INVALID_DATE"),
            (Rejection::InvalidAmount(Field::Charges), 400, "INVALID_AMOUNT"),
            (Rejection::InvalidTenant, 400, "INVALID_TENANT"),
            (Rejection::Forbidden, 403, "FORBIDDEN"),
            (Rejection::NotFound(Entity::Lease), 404, "LEASE_NOT_FOUND"),
            (
                Rejection::Conflict(Conflict::AccommodationLeased),
                409,
                "CONFLICT",
            ),
        ] {
            let err = rejection.as_error();

            assert_eq!(err.status_code.as_u16(), status, "{rejection:?}");
            assert_eq!(err.code, code, "{rejection:?}");
            assert_eq!(err.message, rejection.to_string());
        }
    }

    #[test]
    fn names_field_in_message() {
        assert_eq!(
            Rejection::InvalidDate(Field::Start).as_error().message,
            "`start` is not a valid date",
        );
    }

    #[tokio::test]
    async fn hides_internals_of_server_errors() {
        let resp = Error::internal(&"connection refused").into_response();
        assert_eq!(resp.status(), http::StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["code"], "INTERNAL_SERVER_ERROR");
        assert_eq!(body["message"], "Internal server error");
    }
}
