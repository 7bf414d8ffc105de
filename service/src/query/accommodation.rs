//! [`Accommodation`] lookups.

use crate::domain::{accommodation, Accommodation};

use super::Lookup;

/// Looks an [`Accommodation`] up by its [`accommodation::Id`].
pub type ById = Lookup<Option<Accommodation>, accommodation::Id>;
