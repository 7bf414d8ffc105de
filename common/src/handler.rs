//! [`Handler`] abstraction.
//!
//! Commands, queries, background tasks and database operations are all
//! expressed as a [`Handler`] of some argument type, so a service can be
//! composed from whatever storage implements the required operations.

use std::future::Future;

/// Something executing `Args` asynchronously.
pub trait Handler<Args = ()> {
    /// Type of a successful execution result.
    type Ok;

    /// Type of an execution error.
    type Err;

    /// Executes this [`Handler`] with the provided `args`.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}
