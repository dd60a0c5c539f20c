//! Hover signal: which station or line the user is interacting with.

use super::priority::Priority;

/// Last-hovered station and line; last write wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HoverSignal {
    station: Option<String>,
    line: Option<String>,
}

impl HoverSignal {
    pub fn set_station(&mut self, station: Option<&str>) {
        self.station = station.map(str::to_owned);
    }

    pub fn set_line(&mut self, line: Option<&str>) {
        self.line = line.map(str::to_owned);
    }

    pub fn station(&self) -> Option<&str> {
        self.station.as_deref()
    }

    pub fn line(&self) -> Option<&str> {
        self.line.as_deref()
    }

    /// Departures for the station under the cursor are user-interactive.
    pub fn departures_priority(&self, station: &str, is_hovered: bool) -> Priority {
        if is_hovered || self.station() == Some(station) {
            Priority::High
        } else {
            Priority::Normal
        }
    }

    /// Train polling is background work unless a line has the user's attention.
    pub fn trains_priority(&self) -> Priority {
        if self.line.is_some() {
            Priority::Normal
        } else {
            Priority::Low
        }
    }
}
