// Availability engine
//
// `engine` decides, `service` loads the data it decides on, `handlers`
// expose both over HTTP.

pub mod dates;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod service;

pub use engine::{AvailabilityDecision, AvailabilityEngine, AvailabilityReason, AvailableCount, BookingPolicy};
pub use error::AvailabilityError;
pub use service::{AvailabilityService, Clock};
