pub mod error;
pub mod habits;
pub mod progression;
pub mod slot;

pub use error::{Result, RizqError};
pub use slot::TimeSlot;
