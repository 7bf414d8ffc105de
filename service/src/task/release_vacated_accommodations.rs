//! [`ReleaseVacatedAccommodations`] [`Task`].

use std::{convert::Infallible, error::Error, time};

use common::{
    operations::{By, Commit, Lock, Perform, Start, Transact, Transacted, Update},
    DateTime,
};
use smart_default::SmartDefault;
use tokio::time::interval;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::accommodation,
    infra::{database, Database},
    read::accommodation::Vacated,
    Service,
};
#[cfg(doc)]
use crate::domain::{Accommodation, Lease};

use super::Task;

/// Configuration for [`ReleaseVacatedAccommodations`] [`Task`].
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Config {
    /// Interval between the releases.
    #[default(time::Duration::from_secs(60 * 60))]
    pub interval: time::Duration,
}

/// [`Task`] marking [`Accommodation`]s available again once their [`Lease`]s
/// have ended.
#[derive(Clone, Copy, Debug)]
pub struct ReleaseVacatedAccommodations<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<Db> Task<Start<By<ReleaseVacatedAccommodations<Self>, Config>>>
    for Service<Db>
where
    ReleaseVacatedAccommodations<Service<Db>>: Task<
            Perform<()>,
            Ok = Vec<accommodation::Id>,
            Err: Error,
        > + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<ReleaseVacatedAccommodations<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let task = ReleaseVacatedAccommodations {
            config: by.into_inner(),
            service: self.clone(),
        };

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            match task.execute(Perform(())).await {
                Ok(released) if !released.is_empty() => {
                    log::info!(
                        "`task::ReleaseVacatedAccommodations` released {} \
                         `Accommodation`s",
                        released.len(),
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    log::error!(
                        "`task::ReleaseVacatedAccommodations` failed: {e}",
                    );
                }
            }
        }
    }
}

impl<Db> Task<Perform<()>> for ReleaseVacatedAccommodations<Service<Db>>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Vacated, DateTime>>,
            Err = Traced<database::Error>,
        > + Database<
            Update<By<Vacated, DateTime>>,
            Ok = Vec<accommodation::Id>,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Vec<accommodation::Id>;
    type Err = ExecutionError;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        let now = DateTime::now();

        let tx = self
            .service
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::wrap!())?;

        // Leases can't be created on locked `Accommodation`s, so the release
        // decision can't be outdated by a concurrent `Command`.
        tx.execute(Lock(By::<Vacated, _>::new(now)))
            .await
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let released = tx
            .execute(Update(By::<Vacated, _>::new(now)))
            .await
            .map_err(tracerr::wrap!())?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::wrap!())
            .map(drop)?;

        Ok(released)
    }
}

/// Error of [`ReleaseVacatedAccommodations`] execution.
pub type ExecutionError = Traced<database::Error>;
