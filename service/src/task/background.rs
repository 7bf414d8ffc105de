//! Background environment for running [`Task`]s.

use std::{
    error::Error,
    fmt,
    future::{Future, IntoFuture},
};

use futures::{
    future::{self, LocalBoxFuture},
    FutureExt as _, TryFutureExt as _,
};

#[cfg(doc)]
use crate::Task;

/// Boxed error of a failed [`Task`].
type BoxError = Box<dyn Error + 'static>;

/// Background environment for running [`Task`]s.
///
/// Spawned [`Task`]s make no progress until this [`Background`] is awaited.
#[derive(Default)]
pub struct Background {
    /// Named futures of the spawned [`Task`]s.
    tasks: Vec<(&'static str, LocalBoxFuture<'static, Result<(), BoxError>>)>,
}

impl fmt::Debug for Background {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.tasks.iter().map(|(name, _)| name))
            .finish()
    }
}

impl Background {
    /// Spawns a new [`Task`] with the provided `name` inside this
    /// [`Background`] environment.
    pub fn spawn<F, E>(&mut self, name: &'static str, future: F)
    where
        F: Future<Output = Result<(), E>> + 'static,
        E: Error + 'static,
    {
        self.tasks.push((
            name,
            future
                .map_err(BoxError::from)
                .boxed_local(),
        ));
    }

    /// Returns names of the [`Task`]s spawned in this [`Background`].
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tasks.iter().map(|(name, _)| *name)
    }
}

impl IntoFuture for Background {
    type Output = Result<(), BoxError>;
    type IntoFuture = LocalBoxFuture<'static, Self::Output>;

    /// Runs all the spawned [`Task`]s, resolving once any of them fails, or
    /// all of them finish.
    fn into_future(self) -> Self::IntoFuture {
        future::try_join_all(self.tasks.into_iter().map(|(name, task)| {
            task.map_err(move |e| {
                BoxError::from(format!("`task::{name}` failed: {e}"))
            })
        }))
        .map_ok(drop)
        .boxed_local()
    }
}
