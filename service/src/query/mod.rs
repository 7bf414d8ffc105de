//! [`Query`] definitions.

pub mod accommodation;
pub mod lease;
pub mod list_leases;

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    infra::{database, Database},
    Service,
};

/// [`Query`] of the [`Service`].
pub use common::Handler as Query;

pub use self::list_leases::ListLeases;

/// [`Query`] looking up a `W` by a `B` straight in the [`Database`], with no
/// further checks.
#[derive(Clone, Copy, Debug)]
pub struct Lookup<W, B>(By<W, B>);

impl<W, B> Lookup<W, B> {
    /// Looks a `W` up by the provided `B`.
    #[must_use]
    pub fn by(by: B) -> Self {
        Self(By::new(by))
    }
}

impl<Db, W, B> Query<Lookup<W, B>> for Service<Db>
where
    Db: Database<Select<By<W, B>>, Ok = W, Err = Traced<database::Error>>,
{
    type Ok = W;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lookup(by): Lookup<W, B>,
    ) -> Result<Self::Ok, Self::Err> {
        let found = self.database().execute(Select(by)).await;
        found.map_err(tracerr::wrap!())
    }
}
