use std::{future::IntoFuture as _, process::ExitCode};

use application::{api, telemetry, Args, Authorizer, Config};
use futures::{future, TryFutureExt as _};
use service::{
    infra::{postgres, Postgres},
    Service,
};
use tokio::net::TcpListener;
use tracing as log;

postgres::embed_migrations!("../migrations");

#[tokio::main]
async fn main() -> ExitCode {
    telemetry::init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(()) => ExitCode::FAILURE,
    }
}

/// Runs the server until it or any background task fails.
///
/// Failures are logged right where they happen.
async fn run() -> Result<(), ()> {
    let Args { config } = Args::parse()
        .map_err(|e| log::error!("invalid command line arguments: {e}"))?;
    let conf = Config::new(&config)
        .map_err(|e| log::error!("failed to load `{config}`: {e}"))?;
    telemetry::set_level(conf.log.level.into());

    let mut db = Postgres::new(&conf.postgres.into())
        .map_err(|e| log::error!("failed to initialize `Postgres`: {e}"))?;
    let report = migrations::runner()
        .run_async(&mut db)
        .await
        .map_err(|e| log::error!("failed to migrate the database: {e}"))?;
    log::info!("applied {} migration(s)", report.applied_migrations().len());

    let authorizer = Authorizer::new(&conf.auth).map_err(|e| {
        log::error!("failed to initialize `Authorizer`: {e}");
    })?;
    if conf.auth.url.as_deref().unwrap_or_default().is_empty() {
        log::warn!(
            "no authorization service configured, only the presence of a \
             bearer token is checked",
        );
    }
    let cors = conf
        .server
        .cors
        .layer()
        .map_err(|e| log::error!("invalid CORS origin: {e}"))?;

    let (service, background) = Service::new(conf.service.into(), db);
    log::info!(
        "starting background tasks: {}",
        background.names().collect::<Vec<_>>().join(", "),
    );

    let addr = (conf.server.host.as_str(), conf.server.port);
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        log::error!("failed to bind `{}:{}`: {e}", addr.0, addr.1);
    })?;
    log::info!("listening on `{}:{}`", addr.0, addr.1);

    let server = axum::serve(listener, api::app(service, authorizer, cors))
        .into_future()
        .map_err(|e| log::error!("server failed: {e}"));
    let tasks = background
        .into_future()
        .map_err(|e| log::error!("background task failed: {e}"));
    future::try_join(server, tasks).await.map(drop)
}
