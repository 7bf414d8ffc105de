//! [`Command`] definition.

pub mod create_accommodation;
pub mod create_lease;
pub mod delete_accommodation;
pub mod delete_lease;
pub mod update_accommodation;
pub mod update_lease;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    create_accommodation::CreateAccommodation, create_lease::CreateLease,
    delete_accommodation::DeleteAccommodation, delete_lease::DeleteLease,
    update_accommodation::UpdateAccommodation, update_lease::UpdateLease,
};
