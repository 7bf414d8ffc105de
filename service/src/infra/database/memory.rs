//! In-memory [`Database`] implementation.
//!
//! Keeps everything in a single [`State`] guarded by an asynchronous
//! [`Mutex`]. An opened transaction holds that [`Mutex`] until it's committed
//! or dropped, so transactions are fully serialized, which trivially gives the
//! same guarantees the row locks give in a real storage.

use std::{collections::BTreeMap, future::Future, sync::Arc};

use common::{
    operations::{
        By, Commit, Delete, Insert, Lock, Select, Transact, Update,
    },
    DateTime,
};
use derive_more::{Display, Error as StdError};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracerr::Traced;

use crate::{
    domain::{accommodation, lease, user, Accommodation, Lease, User},
    infra::{database, Database},
    read::{accommodation::Vacated, lease::Filter},
};

/// In-memory [`Database`].
///
/// While a [`Tx`] is alive, any operation executed on the [`NonTx`] client
/// waits for it to finish.
#[derive(Clone, Debug, Default)]
pub struct Memory<T = NonTx>(T);

impl Memory {
    /// Creates a new [`Memory`] database knowing the provided [`User`]s.
    #[must_use]
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let state = State {
            users: users.into_iter().map(|u| (u.id, u)).collect(),
            ..State::default()
        };
        Self(NonTx {
            state: Arc::new(Mutex::new(state)),
        })
    }
}

/// Non-transactional [`Memory`] client.
#[derive(Clone, Debug, Default)]
pub struct NonTx {
    /// Shared [`State`].
    state: Arc<Mutex<State>>,
}

/// Transactional [`Memory`] client.
///
/// Changes are applied to a copy of the [`State`] and published on
/// [`Commit`] only.
#[derive(Clone, Debug)]
pub struct Tx {
    /// Staged changes, if not committed yet.
    staged: Arc<Mutex<Option<Staged>>>,
}

/// Changes staged by a [`Tx`].
#[derive(Debug)]
struct Staged {
    /// Exclusive access to the published [`State`].
    published: OwnedMutexGuard<State>,

    /// [`State`] being modified.
    draft: State,
}

/// Whole data stored in a [`Memory`] database.
#[derive(Clone, Debug, Default)]
pub struct State {
    /// Known [`User`]s.
    users: BTreeMap<user::Id, User>,

    /// Stored [`Accommodation`]s.
    accommodations: BTreeMap<accommodation::Id, Accommodation>,

    /// Stored [`Lease`]s.
    leases: BTreeMap<lease::Id, Lease>,

    /// Last assigned [`accommodation::Id`].
    last_accommodation_id: i64,

    /// Last assigned [`lease::Id`].
    last_lease_id: i64,
}

/// [`Memory`] database error.
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// [`Tx`] is used after being committed.
    #[display("Transaction is already committed")]
    TxCommitted,
}

/// Access to the [`State`] of a [`Memory`] database.
pub trait Storage {
    /// Runs the provided function over the [`State`].
    fn access<R>(
        &self,
        f: impl FnOnce(&mut State) -> R,
    ) -> impl Future<Output = Result<R, Traced<database::Error>>>;
}

impl Storage for NonTx {
    async fn access<R>(
        &self,
        f: impl FnOnce(&mut State) -> R,
    ) -> Result<R, Traced<database::Error>> {
        Ok(f(&mut *self.state.lock().await))
    }
}

impl Storage for Tx {
    async fn access<R>(
        &self,
        f: impl FnOnce(&mut State) -> R,
    ) -> Result<R, Traced<database::Error>> {
        let mut staged = self.staged.lock().await;
        let staged = staged.as_mut().ok_or_else(|| {
            tracerr::new!(database::Error::from(Error::TxCommitted))
        })?;
        Ok(f(&mut staged.draft))
    }
}

impl Database<Transact> for Memory<NonTx> {
    type Ok = Memory<Tx>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        let published = Arc::clone(&self.0.state).lock_owned().await;
        let draft = published.clone();
        Ok(Memory(Tx {
            staged: Arc::new(Mutex::new(Some(Staged { published, draft }))),
        }))
    }
}

impl Database<Transact> for Memory<Tx> {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        let Some(Staged {
            mut published,
            draft,
        }) = self.0.staged.lock().await.take()
        else {
            return Err(tracerr::new!(database::Error::from(
                Error::TxCommitted
            )));
        };
        *published = draft;
        Ok(())
    }
}

impl<T: Storage> Database<Select<By<Option<User>, user::Id>>> for Memory<T> {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.0
            .access(|s| s.users.get(&id).cloned())
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<T: Storage> Database<Select<By<Option<Accommodation>, accommodation::Id>>>
    for Memory<T>
{
    type Ok = Option<Accommodation>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Accommodation>, accommodation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.0
            .access(|s| s.accommodations.get(&id).cloned())
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<T: Storage> Database<Select<By<Vec<accommodation::Id>, user::Id>>>
    for Memory<T>
{
    type Ok = Vec<accommodation::Id>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<accommodation::Id>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let owner_id = by.into_inner();
        self.0
            .access(|s| {
                s.accommodations
                    .values()
                    .filter(|a| a.owner_id == owner_id)
                    .map(|a| a.id)
                    .collect()
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<T: Storage> Database<Insert<accommodation::Draft>> for Memory<T> {
    type Ok = Accommodation;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(draft): Insert<accommodation::Draft>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .access(|s| {
                s.last_accommodation_id += 1;
                let accommodation = Accommodation {
                    id: s.last_accommodation_id.into(),
                    owner_id: draft.owner_id,
                    occupant_id: None,
                    is_available: true,
                    address: draft.address,
                    created_at: draft.created_at,
                };
                _ = s
                    .accommodations
                    .insert(accommodation.id, accommodation.clone());
                accommodation
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<T: Storage> Database<Update<Accommodation>> for Memory<T> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(accommodation): Update<Accommodation>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .access(|s| {
                if let Some(stored) = s.accommodations.get_mut(&accommodation.id)
                {
                    *stored = accommodation;
                }
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<T: Storage> Database<Delete<By<Accommodation, accommodation::Id>>>
    for Memory<T>
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Accommodation, accommodation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.0
            .access(|s| {
                if s.accommodations.remove(&id).is_some() {
                    s.leases.retain(|_, l| l.accommodation_id != id);
                }
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<T: Storage> Database<Update<By<Vacated, DateTime>>> for Memory<T> {
    type Ok = Vec<accommodation::Id>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(by): Update<By<Vacated, DateTime>>,
    ) -> Result<Self::Ok, Self::Err> {
        let now = by.into_inner();
        self.0
            .access(|s| {
                let State {
                    accommodations,
                    leases,
                    ..
                } = s;
                accommodations
                    .values_mut()
                    .filter(|a| {
                        !a.is_available
                            && !leases.values().any(|l| {
                                l.accommodation_id == a.id
                                    && l.is_active_at(now)
                            })
                    })
                    .map(|a| {
                        a.release();
                        a.id
                    })
                    .collect()
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<T: Storage> Database<Select<By<Option<Lease>, lease::Id>>> for Memory<T> {
    type Ok = Option<Lease>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Lease>, lease::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.0
            .access(|s| s.leases.get(&id).cloned())
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<T: Storage> Database<Select<By<Vec<Lease>, Filter>>> for Memory<T> {
    type Ok = Vec<Lease>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Lease>, Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();
        self.0
            .access(|s| {
                s.leases
                    .values()
                    .filter(|l| filter.matches(l))
                    .cloned()
                    .collect()
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<T: Storage> Database<Insert<lease::Draft>> for Memory<T> {
    type Ok = Lease;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(draft): Insert<lease::Draft>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .access(|s| {
                s.last_lease_id += 1;
                let lease = draft.into_lease(s.last_lease_id.into());
                _ = s.leases.insert(lease.id, lease.clone());
                lease
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<T: Storage> Database<Update<Lease>> for Memory<T> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(lease): Update<Lease>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .access(|s| {
                if let Some(stored) = s.leases.get_mut(&lease.id) {
                    *stored = lease;
                }
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<T: Storage> Database<Delete<By<Lease, lease::Id>>> for Memory<T> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Lease, lease::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.0
            .access(|s| {
                _ = s.leases.remove(&id);
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<W, B> Database<Lock<By<W, B>>> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Lock<By<W, B>>) -> Result<Self::Ok, Self::Err> {
        // Holding the whole `State` already.
        Ok(())
    }
}
