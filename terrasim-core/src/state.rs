use crate::buildings::BuildingState;
use crate::events::{ActiveEvent, EventGroupState};
use crate::modifiers::ModifierTable;
use crate::resources::ResourceAmount;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Date {
    pub year: i32,
    pub month: u8, // 1-12
    pub day: u8,   // 1-30
}

impl Date {
    pub fn new(year: i32, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }

    /// Adds days on a 12 x 30-day calendar.
    pub fn add_days(&self, days: u32) -> Self {
        let mut d = self.day as u32 + days;
        let mut m = self.month as u32;
        let mut y = self.year;

        while d > 30 {
            d -= 30;
            m += 1;
            if m > 12 {
                m -= 12;
                y += 1;
            }
        }

        Self {
            year: y,
            month: m as u8,
            day: d as u8,
        }
    }
}

impl Default for Date {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

impl std::fmt::Display for Date {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.year, self.month, self.day)
    }
}

/// Runtime state of one building, keyed by code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingSnapshot {
    pub code: String,
    #[serde(flatten)]
    pub state: BuildingState,
}

/// Everything that changes during a session, for display and persistence.
///
/// Definitions are not included; they come from the scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomySnapshot {
    pub date: Date,
    pub tick: u64,
    pub resources: Vec<ResourceAmount>,
    pub buildings: Vec<BuildingSnapshot>,
    pub groups: Vec<EventGroupState>,
    pub active_events: Vec<ActiveEvent>,
    pub modifiers: ModifierTable,
}

impl EconomySnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_days_rolls_month_and_year() {
        let date = Date::new(1, 12, 29);
        assert_eq!(date.add_days(1), Date::new(1, 12, 30));
        assert_eq!(date.add_days(2), Date::new(2, 1, 1));
        assert_eq!(date.add_days(365), Date::new(3, 1, 4));
    }

    #[test]
    fn test_display() {
        assert_eq!(Date::new(12, 3, 7).to_string(), "12.3.7");
    }

    #[test]
    fn test_ordering() {
        assert!(Date::new(1, 2, 1) > Date::new(1, 1, 30));
        assert!(Date::new(2, 1, 1) > Date::new(1, 12, 30));
    }
}
