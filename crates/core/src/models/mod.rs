pub mod availability;
pub mod pricing;
pub mod reservation;
pub mod resource;
