//! Designer data for one session: balance, starting ledger, buildings and
//! event groups.

use crate::buildings::{BuildingCatalog, BuildingDef};
use crate::config::{BalanceConfig, ConfigError};
use crate::events::{validate_groups, EventGroupDef};
use crate::resources::ResourceAmount;
use crate::state::Date;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub balance: BalanceConfig,
    #[serde(default)]
    pub rng_seed: u64,
    #[serde(default)]
    pub start_date: Date,
    #[serde(default)]
    pub starting_resources: Vec<ResourceAmount>,
    /// Base income of the territory per tick, scaled by the Territory scope.
    #[serde(default)]
    pub territory_income: Vec<ResourceAmount>,
    #[serde(default)]
    pub buildings: Vec<BuildingDef>,
    #[serde(default)]
    pub event_groups: Vec<EventGroupDef>,
}

impl Scenario {
    /// Parse and validate.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let scenario: Scenario = serde_json::from_str(json)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let scenario = Self::from_json_str(&json)?;
        log::info!(
            "Loaded scenario {}: {} buildings, {} event groups",
            path.display(),
            scenario.buildings.len(),
            scenario.event_groups.len()
        );
        Ok(scenario)
    }

    /// Check everything an [`crate::step::Economy`] would reject.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.balance.validate()?;
        let catalog = BuildingCatalog::load(self.buildings.clone())?;
        validate_groups(&self.event_groups, &catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::EffectKind;
    use crate::resources::ResourceKind;

    const SAMPLE: &str = r#"{
        "balance": { "event_slots": 2 },
        "rng_seed": 7,
        "start_date": { "year": 3, "month": 4, "day": 5 },
        "starting_resources": [ { "kind": "Wood", "amount": 100 } ],
        "territory_income": [ { "kind": "Food", "amount": 4 } ],
        "buildings": [
            {
                "code": "sawmill",
                "production": [ { "kind": "Wood", "amount": 10 } ],
                "required": [ { "kind": "Wood", "amount": 30 } ],
                "unlocked": true
            }
        ],
        "event_groups": [
            {
                "key": "economy",
                "start_percentage": 5.0,
                "increment": 1.0,
                "events": [
                    {
                        "key": "timber_boom",
                        "title": "Timber boom ({duration} days)",
                        "min_duration": 3,
                        "max_duration": 6,
                        "effects": [
                            { "type": "resource_multiplier", "scope": "Building", "resource": "Wood", "factor": 1.5 },
                            { "type": "add_building", "code": "sawmill" }
                        ]
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn test_parse_sample() {
        let scenario = Scenario::from_json_str(SAMPLE).unwrap();
        assert_eq!(scenario.balance.event_slots, 2);
        assert_eq!(scenario.balance.date_multiplier, 1);
        assert_eq!(scenario.rng_seed, 7);
        assert_eq!(scenario.start_date, Date::new(3, 4, 5));
        assert_eq!(
            scenario.starting_resources,
            vec![ResourceAmount::new(ResourceKind::Wood, 100)]
        );
        let effects = &scenario.event_groups[0].events[0].effects;
        assert_eq!(
            effects[1],
            EffectKind::AddBuilding {
                code: "sawmill".to_string(),
                count: 1
            }
        );
    }

    #[test]
    fn test_empty_object_is_valid() {
        let scenario = Scenario::from_json_str("{}").unwrap();
        assert_eq!(scenario.balance, BalanceConfig::default());
        assert!(scenario.buildings.is_empty());
    }

    #[test]
    fn test_unknown_resource_is_parse_error() {
        let json = r#"{ "starting_resources": [ { "kind": "Gold", "amount": 1 } ] }"#;
        assert!(matches!(
            Scenario::from_json_str(json),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_building_in_effect() {
        let json = SAMPLE.replace(r#""code": "sawmill" }"#, r#""code": "castle" }"#);
        assert!(matches!(
            Scenario::from_json_str(&json),
            Err(ConfigError::UnknownBuilding { code, .. }) if code == "castle"
        ));
    }

    #[test]
    fn test_rejects_degenerate_duration() {
        let json = SAMPLE.replace(r#""min_duration": 3"#, r#""min_duration": 0"#);
        assert!(matches!(
            Scenario::from_json_str(&json),
            Err(ConfigError::InvalidDuration { .. })
        ));
    }

    #[test]
    fn test_rejects_zero_factor() {
        let json = SAMPLE.replace(r#""factor": 1.5"#, r#""factor": 0.0"#);
        assert!(matches!(
            Scenario::from_json_str(&json),
            Err(ConfigError::InvalidMagnitude { .. })
        ));
    }

    #[test]
    fn test_rejects_duplicate_building() {
        let mut scenario = Scenario::from_json_str(SAMPLE).unwrap();
        scenario.buildings.push(scenario.buildings[0].clone());
        assert!(matches!(
            scenario.validate(),
            Err(ConfigError::DuplicateBuilding(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = Scenario::load(Path::new("/nonexistent/terrasim/scenario.json"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
