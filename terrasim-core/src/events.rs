//! Event and event-group definitions, gating conditions and active events.
//!
//! Definitions come from scenario data and are validated once at load:
//! every group needs at least one candidate, every event a duration range
//! `1 <= min <= max`, and every building code referenced by an effect or a
//! condition must exist.

use crate::buildings::BuildingRegistry;
use crate::config::ConfigError;
use crate::effects::{Effect, EffectKind};
use crate::resources::{ResourceKind, ResourceLedger};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Read-only view a condition is judged against.
pub struct ConditionView<'a> {
    pub ledger: &'a ResourceLedger,
    pub buildings: &'a dyn BuildingRegistry,
}

/// Gating condition on a candidate event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    Always,
    MinResource { resource: ResourceKind, amount: i64 },
    BuildingCountAtLeast { code: String, count: u32 },
    BuildingUnlocked { code: String },
}

impl Condition {
    pub fn is_satisfied(&self, view: &ConditionView<'_>) -> bool {
        match self {
            Condition::Always => true,
            Condition::MinResource { resource, amount } => view.ledger.get(*resource) >= *amount,
            Condition::BuildingCountAtLeast { code, count } => view
                .buildings
                .lookup(code)
                .is_some_and(|e| e.state.count >= *count),
            Condition::BuildingUnlocked { code } => view
                .buildings
                .lookup(code)
                .is_some_and(|e| e.state.unlocked),
        }
    }

    fn building_code(&self) -> Option<&str> {
        match self {
            Condition::BuildingCountAtLeast { code, .. } | Condition::BuildingUnlocked { code } => {
                Some(code)
            }
            Condition::Always | Condition::MinResource { .. } => None,
        }
    }
}

/// A scripted event that may be picked from its group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDef {
    pub key: String,
    /// Title template; `{duration}` is replaced by the rolled duration.
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub min_duration: u32,
    pub max_duration: u32,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub effects: Vec<EffectKind>,
}

impl EventDef {
    pub fn validate(&self, buildings: &dyn BuildingRegistry) -> Result<(), ConfigError> {
        if self.min_duration == 0 || self.max_duration < self.min_duration {
            return Err(ConfigError::InvalidDuration {
                event: self.key.clone(),
                min: self.min_duration,
                max: self.max_duration,
            });
        }
        for effect in &self.effects {
            effect.validate(&self.key, buildings)?;
        }
        for code in self.conditions.iter().filter_map(Condition::building_code) {
            if buildings.lookup(code).is_none() {
                return Err(ConfigError::UnknownBuilding {
                    event: self.key.clone(),
                    code: code.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Conditions that fail against `view`, in definition order.
    pub fn unmet_conditions<'a>(&'a self, view: &ConditionView<'_>) -> Vec<&'a Condition> {
        self.conditions
            .iter()
            .filter(|c| !c.is_satisfied(view))
            .collect()
    }

    /// Fresh, inactive effect instances for one activation.
    pub fn instantiate_effects(&self) -> Vec<Effect> {
        self.effects.iter().cloned().map(Effect::new).collect()
    }
}

/// Replace `{duration}` in a title or description template.
pub fn render_template(template: &str, duration: u32) -> String {
    template.replace("{duration}", &duration.to_string())
}

/// A group of mutually exclusive candidate events sharing one trigger chance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventGroupDef {
    pub key: String,
    /// Percentage the group starts at and is reset to after a trigger.
    pub start_percentage: f64,
    /// Percentage added every tick.
    pub increment: f64,
    pub events: Vec<EventDef>,
}

impl EventGroupDef {
    pub fn validate(&self, buildings: &dyn BuildingRegistry) -> Result<(), ConfigError> {
        if self.events.is_empty() {
            return Err(ConfigError::EmptyGroup(self.key.clone()));
        }
        if !self.start_percentage.is_finite() || !self.increment.is_finite() {
            return Err(ConfigError::InvalidPercentage {
                group: self.key.clone(),
            });
        }
        for event in &self.events {
            event.validate(buildings)?;
        }
        Ok(())
    }
}

/// Validate every group plus key uniqueness across groups and events.
pub fn validate_groups(
    groups: &[EventGroupDef],
    buildings: &dyn BuildingRegistry,
) -> Result<(), ConfigError> {
    let mut group_keys = HashSet::new();
    let mut event_keys = HashSet::new();
    for group in groups {
        if !group_keys.insert(group.key.as_str()) {
            return Err(ConfigError::DuplicateGroup(group.key.clone()));
        }
        for event in &group.events {
            if !event_keys.insert(event.key.as_str()) {
                return Err(ConfigError::DuplicateEvent(event.key.clone()));
            }
        }
        group.validate(buildings)?;
    }
    Ok(())
}

/// Trigger chance of one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventGroupState {
    pub key: String,
    /// Current percentage. Unbounded above.
    pub percentage: f64,
}

/// An event counting down in an occupied slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveEvent {
    /// `"{event_key}#{serial}"`, unique per activation.
    pub instance_id: String,
    pub event_key: String,
    pub title: String,
    pub description: String,
    /// Ticks left; the event expires when this reaches zero.
    pub remaining: u32,
    /// Effects owned by this activation.
    pub effects: Vec<Effect>,
}
