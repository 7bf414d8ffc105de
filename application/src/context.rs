//! [`Context`]-related definitions.

use std::time;

use axum::{async_trait, extract::FromRequestParts, RequestPartsExt as _};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use derive_more::Debug;
use secrecy::{ExposeSecret as _, SecretString};
use serde::Serialize;
use tracing as log;

use crate::{config, define_error, AsError as _, Error, Service};

/// Request context, carrying the [`Service`] and the bearer credential of the
/// caller.
#[derive(Debug)]
pub struct Context {
    /// [`Service`] instance.
    service: Service,

    /// [`Authorizer`] checking the rights of the caller.
    authorizer: Authorizer,

    /// Bearer token of the caller, if provided.
    #[debug(skip)]
    token: Option<SecretString>,
}

impl Context {
    /// Returns [`Service`] instance of this [`Context`].
    #[must_use]
    pub fn service(&self) -> &Service {
        &self.service
    }

    /// Ensures the caller is granted the provided `right`.
    ///
    /// # Errors
    ///
    /// Errors if:
    /// - no bearer token was provided;
    /// - the authorization service denied the `right`;
    /// - the authorization service couldn't be reached.
    pub async fn authorize(&self, right: &'static str) -> Result<(), Error> {
        let token = self
            .token
            .as_ref()
            .ok_or_else(|| Error::from(AuthError::AuthorizationRequired))?;
        self.authorizer.check(token, right).await
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Context
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        let service = parts
            .extensions
            .get::<Service>()
            .cloned()
            .ok_or_else(|| Error::internal(&"missing `Service` extension"))?;
        let authorizer = parts
            .extensions
            .get::<Authorizer>()
            .cloned()
            .ok_or_else(|| {
                Error::internal(&"missing `Authorizer` extension")
            })?;

        let token = match parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
        {
            Ok(TypedHeader(Authorization(bearer))) => {
                Some(SecretString::from(bearer.token().to_owned()))
            }
            Err(e) if e.is_missing() => None,
            Err(e) => {
                return Err(Error {
                    code: "INVALID_AUTHORIZATION",
                    status_code: http::StatusCode::UNAUTHORIZED,
                    message: e.to_string(),
                    backtrace: None,
                })
            }
        };

        Ok(Self {
            service,
            authorizer,
            token,
        })
    }
}

/// Client of the external authorization service.
///
/// Without a configured URL only the presence of a bearer token is enforced.
#[derive(Clone, Debug)]
pub struct Authorizer {
    /// HTTP client to reach the authorization service with.
    client: reqwest::Client,

    /// URL of the authorization service.
    url: Option<String>,
}

/// Request body sent to the authorization service.
#[derive(Debug, Serialize)]
struct CheckRequest {
    /// Name of the checked right.
    right: &'static str,
}

impl Authorizer {
    /// Creates a new [`Authorizer`] out of the provided [`config::Auth`].
    ///
    /// # Errors
    ///
    /// If the HTTP client cannot be initialized.
    pub fn new(conf: &config::Auth) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(conf.timeout).build()?;
        Ok(Self {
            client,
            url: conf.url.clone().filter(|url| !url.is_empty()),
        })
    }

    /// Asks the authorization service whether the provided `token` grants the
    /// `right`.
    async fn check(
        &self,
        token: &SecretString,
        right: &'static str,
    ) -> Result<(), Error> {
        let Some(url) = &self.url else {
            return Ok(());
        };

        let started = time::Instant::now();
        let resp = self
            .client
            .post(url)
            .bearer_auth(token.expose_secret())
            .json(&CheckRequest { right })
            .send()
            .await
            .map_err(|e| e.as_error())?;
        log::debug!(
            right,
            status = resp.status().as_u16(),
            duration = format!("{}ms", started.elapsed().as_millis()),
            "authorization checked",
        );

        Self::verdict(resp.status())
    }

    /// Converts the status of an authorization service response into the
    /// check outcome.
    fn verdict(status: reqwest::StatusCode) -> Result<(), Error> {
        match status.as_u16() {
            200..=299 => Ok(()),
            401 => Err(AuthError::AuthorizationRequired.into()),
            403 => Err(AuthError::Denied.into()),
            code => Err(Error::internal(&format!(
                "authorization service responded with `{code}`",
            ))),
        }
    }
}

impl crate::AsError for reqwest::Error {
    fn try_as_error(&self) -> Option<Error> {
        None
    }
}

define_error! {
    enum AuthError {
        #[code = "AUTHORIZATION_REQUIRED"]
        #[status = UNAUTHORIZED]
        #[message = "Authorization token missing"]
        AuthorizationRequired,

        #[code = "ACCESS_DENIED"]
        #[status = FORBIDDEN]
        #[message = "Access denied"]
        Denied,
    }
}
