use crate::buildings::{BuildingCategory, BuildingDef};
use crate::config::BalanceConfig;
use crate::effects::EffectKind;
use crate::events::{EventDef, EventGroupDef};
use crate::resources::{ResourceAmount, ResourceKind};
use crate::rng::RandomSource;
use crate::scenario::Scenario;
use crate::state::Date;
use crate::step::Economy;
use std::collections::VecDeque;

/// Random source that replays scripted draws.
///
/// When a queue runs dry it falls back to the fixed roll (for percentages),
/// the lower bound (for ranges) or index 0.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    rolls: VecDeque<f64>,
    durations: VecDeque<u32>,
    indices: VecDeque<usize>,
    fixed_roll: f64,
}

impl ScriptedRandom {
    pub fn new() -> Self {
        Self {
            rolls: VecDeque::new(),
            durations: VecDeque::new(),
            indices: VecDeque::new(),
            fixed_roll: 0.0,
        }
    }

    /// Every percentage roll returns `roll` unless a scripted one is queued.
    pub fn with_fixed_roll(roll: f64) -> Self {
        Self {
            fixed_roll: roll,
            ..Self::new()
        }
    }

    pub fn push_rolls(&mut self, rolls: &[f64]) {
        self.rolls.extend(rolls.iter().copied());
    }

    pub fn push_durations(&mut self, durations: &[u32]) {
        self.durations.extend(durations.iter().copied());
    }

    pub fn push_indices(&mut self, indices: &[usize]) {
        self.indices.extend(indices.iter().copied());
    }
}

impl Default for ScriptedRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for ScriptedRandom {
    fn roll_percent(&mut self) -> f64 {
        self.rolls.pop_front().unwrap_or(self.fixed_roll)
    }

    fn range_inclusive(&mut self, min: u32, max: u32) -> u32 {
        self.durations
            .pop_front()
            .map(|d| d.clamp(min, max.max(min)))
            .unwrap_or(min)
    }

    fn pick_index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.indices.pop_front().map(|i| i.min(len - 1)).unwrap_or(0)
    }
}

/// Building definition with a single production entry.
pub fn producer(code: &str, kind: ResourceKind, rate: i64, unlocked: bool) -> BuildingDef {
    BuildingDef {
        code: code.to_string(),
        category: BuildingCategory::Production,
        production: vec![ResourceAmount::new(kind, rate)],
        required: vec![],
        unlocked,
    }
}

/// Event with a fixed duration and the given effects.
pub fn event(key: &str, duration: u32, effects: Vec<EffectKind>) -> EventDef {
    EventDef {
        key: key.to_string(),
        title: key.to_string(),
        description: String::new(),
        min_duration: duration,
        max_duration: duration,
        conditions: vec![],
        effects,
    }
}

pub fn group(key: &str, start_percentage: f64, increment: f64, events: Vec<EventDef>) -> EventGroupDef {
    EventGroupDef {
        key: key.to_string(),
        start_percentage,
        increment,
        events,
    }
}

/// Fluent construction of small economies for tests.
pub struct EconomyBuilder {
    scenario: Scenario,
}

impl EconomyBuilder {
    pub fn new() -> Self {
        Self {
            scenario: Scenario {
                balance: BalanceConfig::default(),
                rng_seed: 0,
                start_date: Date::default(),
                starting_resources: vec![],
                territory_income: vec![],
                buildings: vec![],
                event_groups: vec![],
            },
        }
    }

    pub fn slots(mut self, slots: u32) -> Self {
        self.scenario.balance.event_slots = slots;
        self
    }

    pub fn enforce_conditions(mut self) -> Self {
        self.scenario.balance.enforce_event_conditions = true;
        self
    }

    pub fn resource(mut self, kind: ResourceKind, amount: i64) -> Self {
        self.scenario
            .starting_resources
            .push(ResourceAmount::new(kind, amount));
        self
    }

    pub fn territory_income(mut self, kind: ResourceKind, amount: i64) -> Self {
        self.scenario
            .territory_income
            .push(ResourceAmount::new(kind, amount));
        self
    }

    pub fn building(mut self, def: BuildingDef) -> Self {
        self.scenario.buildings.push(def);
        self
    }

    pub fn group(mut self, group: EventGroupDef) -> Self {
        self.scenario.event_groups.push(group);
        self
    }

    pub fn scenario(self) -> Scenario {
        self.scenario
    }

    /// Build with a scripted random source.
    pub fn build(self, rng: ScriptedRandom) -> Economy {
        match Economy::from_scenario(self.scenario, Box::new(rng)) {
            Ok(economy) => economy,
            Err(e) => panic!("test scenario is invalid: {e}"),
        }
    }
}

impl Default for EconomyBuilder {
    fn default() -> Self {
        Self::new()
    }
}
