//! Domain definitions.

pub mod accommodation;
pub mod lease;
pub mod user;

pub use self::{accommodation::Accommodation, lease::Lease, user::User};
