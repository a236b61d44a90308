pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{AvailabilityResponse, Dentist, DentistError, OpenHours};
pub use services::{AvailabilityService, ScheduleService};
