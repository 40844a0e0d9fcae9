//! # Courtside Core
//!
//! Domain types shared by the storage adapters and the booking engine:
//! resources, reservations, pricing configuration, the error taxonomy and
//! the storage contracts the engine runs against.

pub mod clock;
pub mod errors;
pub mod ledger;
pub mod models;
pub mod time_window;

pub use errors::{BookingError, BookingResult, ErrorKind, ErrorReport};
pub use time_window::TimeWindow;
