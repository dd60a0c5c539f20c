//! Live transit data: train positions, station search and departure boards.
//!
//! The client is the governor's main consumer. It chooses each call's
//! priority from the hover signal:
//! - departures for the hovered station are high priority
//! - station searches are normal priority
//! - train polling is low priority, normal while a line is hovered

mod client;
mod models;

pub use client::TransitClient;
pub use models::{BoundingBox, Departure, DepartureCategory, DepartureGroup, StationDepartures, Train};
