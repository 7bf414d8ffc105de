//! [`Config`]-related definitions.

use std::time;

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use http::header::InvalidHeaderValue;
use serde::Deserialize;
use service::infra::postgres::{self, PoolConfig};
use smart_default::SmartDefault;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: Server,

    /// Service configuration.
    pub service: Service,

    /// Postgres configuration.
    pub postgres: Postgres,

    /// Authorization service configuration.
    pub auth: Auth,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Host to bind the server to.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to bind the server to.
    #[default(8080)]
    pub port: u16,

    /// [CORS] configuration.
    ///
    /// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
    pub cors: Cors,
}

/// [CORS] configuration.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cors {
    /// List of allowed origins.
    #[default(vec!["*".to_owned()])]
    pub origins: Vec<String>,
}

impl Cors {
    /// Creates a [`CorsLayer`] allowing the REST API methods from the
    /// configured origins.
    ///
    /// A `*` origin allows any origin.
    ///
    /// # Errors
    ///
    /// If any of the origins is not a valid header value.
    pub fn layer(&self) -> Result<CorsLayer, InvalidHeaderValue> {
        use http::{header, Method};

        let origins = self
            .origins
            .iter()
            .map(|origin| origin.parse::<header::HeaderValue>())
            .collect::<Result<Vec<_>, _>>()?;
        let origins = if origins.iter().any(|o| o == "*") {
            AllowOrigin::any()
        } else {
            AllowOrigin::list(origins)
        };
        Ok(CorsLayer::new()
            .allow_methods([
                Method::DELETE,
                Method::GET,
                Method::OPTIONS,
                Method::POST,
                Method::PUT,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_origin(origins))
    }
}

/// Service configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Service {
    /// Lease policy configuration.
    pub policy: Policy,

    /// Service tasks configuration.
    pub tasks: Tasks,
}

impl From<Service> for service::Config {
    fn from(value: Service) -> Self {
        let Service {
            policy:
                Policy {
                    require_payment_date,
                    zero_charges_as_missing,
                },
            tasks:
                Tasks {
                    release_vacated_accommodations,
                },
        } = value;
        Self {
            lease_policy: service::domain::lease::eligibility::Policy {
                require_payment_date,
                zero_charges_as_missing,
            },
            release_vacated_accommodations:
                service::task::release_vacated_accommodations::Config {
                    interval: release_vacated_accommodations.interval,
                },
        }
    }
}

/// Lease policy configuration, deciding which lease fields are mandatory.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Policy {
    /// Indicates whether a payment date is required to create a lease.
    pub require_payment_date: bool,

    /// Indicates whether zero charges are treated as missing ones.
    pub zero_charges_as_missing: bool,
}

/// Service tasks configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Tasks {
    /// `ReleaseVacatedAccommodations` task configuration.
    pub release_vacated_accommodations: Task,
}

/// Service task configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Task {
    /// Task execution interval.
    #[default(time::Duration::from_secs(60 * 60))]
    #[serde(with = "humantime_serde")]
    pub interval: time::Duration,
}

/// Postgres configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Postgres {
    /// Server host.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Server port.
    #[default(5432)]
    pub port: u16,

    /// Role to log in as.
    #[default("postgres".to_owned())]
    pub user: String,

    /// Password of the [`Postgres::user`].
    #[default("postgres".to_owned())]
    pub password: String,

    /// Database holding the lease management schema.
    #[default("postgres".to_owned())]
    pub dbname: String,

    /// Upper bound of simultaneously open connections.
    #[default(16)]
    pub max_connections: usize,
}

impl From<Postgres> for postgres::Config {
    fn from(conf: Postgres) -> Self {
        let mut pg = Self::new();
        pg.host = Some(conf.host);
        pg.port = Some(conf.port);
        pg.user = Some(conf.user);
        pg.password = Some(conf.password);
        pg.dbname = Some(conf.dbname);
        pg.pool = Some(PoolConfig::new(conf.max_connections));
        pg
    }
}

/// Authorization service configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Auth {
    /// URL to check the rights of a bearer token at.
    ///
    /// Only the presence of a bearer token is enforced, if not set.
    pub url: Option<String>,

    /// Timeout of a single rights check.
    #[default(time::Duration::from_secs(5))]
    #[serde(with = "humantime_serde")]
    pub timeout: time::Duration,
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Maximum verbosity of the logs.
    pub level: LogLevel,
}

/// Verbosity of the logs, from the most verbose to the least one.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Everything, including the per-statement details.
    Trace,

    /// Diagnostics, like authorization checks.
    Debug,

    /// Lifecycle events and served requests.
    #[default]
    Info,

    /// Failed requests and recoverable issues.
    Warn,

    /// Failures only.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time;

    use super::{Config, Cors};

    #[test]
    fn defaults_without_file() {
        let conf = Config::new("does-not-exist").unwrap();

        assert_eq!(conf.server.port, 8080);
        assert_eq!(
            conf.service.tasks.release_vacated_accommodations.interval,
            time::Duration::from_secs(60 * 60),
        );
        assert!(!conf.service.policy.require_payment_date);
        assert_eq!(conf.auth.url, None);
        assert_eq!(conf.auth.timeout, time::Duration::from_secs(5));
        assert_eq!(conf.postgres.max_connections, 16);

        let conf: service::Config = conf.service.into();
        assert!(!conf.lease_policy.zero_charges_as_missing);
    }

    #[test]
    fn rejects_malformed_cors_origin() {
        let mut cors = Cors::default();
        assert!(cors.layer().is_ok());

        cors.origins = vec!["https://example.com".to_owned()];
        assert!(cors.layer().is_ok());

        cors.origins.push("bad\norigin".to_owned());
        assert!(cors.layer().is_err());
    }
}
