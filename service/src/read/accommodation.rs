//! [`Accommodation`]-related read definitions.

#[cfg(doc)]
use crate::domain::{Accommodation, Lease};

/// Selector of unavailable [`Accommodation`]s without any active [`Lease`].
///
/// Such [`Accommodation`]s are left behind by [`Lease`]s reaching their end
/// date, as nothing marks the [`Accommodation`] available again at that
/// moment.
#[derive(Clone, Copy, Debug)]
pub struct Vacated;
