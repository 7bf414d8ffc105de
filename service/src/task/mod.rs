//! Background [`Task`]s definitions.

mod background;
pub mod release_vacated_accommodations;

pub use common::Handler as Task;

pub use self::{
    background::Background,
    release_vacated_accommodations::ReleaseVacatedAccommodations,
};
