//! [`Lease`] lookups.

use crate::domain::{lease, Lease};

use super::Lookup;

/// Looks a [`Lease`] up by its [`lease::Id`].
pub type ById = Lookup<Option<Lease>, lease::Id>;
