//! Read entities definitions.

pub mod accommodation;
pub mod lease;
