//! Event-group probability scheduler.
//!
//! Each tick:
//!
//! 1. Every active event counts down; at zero its effects are deactivated
//!    and the event leaves its slot.
//! 2. Every group's trigger percentage grows by its increment.
//! 3. A group is not rolled while all slots are taken. Its percentage keeps
//!    growing.
//! 4. Otherwise the group rolls against its percentage.
//! 5. On success the percentage resets to the group's start value. If a slot
//!    is free, one candidate is picked uniformly, its effects are activated
//!    and it occupies a slot for a rolled duration in `[min, max]`.
//!
//! A failed roll leaves the percentage untouched.
//!
//! Activations made through [`EventScheduler::trigger_event`] between ticks
//! are held back and reported with the next tick's records.
//!
//! The scheduler owns the [`ModifierTable`]; effects borrow it only while
//! they apply or revert.

use crate::buildings::BuildingRegistry;
use crate::config::{BalanceConfig, ConfigError};
use crate::effects::{self, EffectTarget};
use crate::events::{
    render_template, validate_groups, ActiveEvent, ConditionView, EventGroupDef, EventGroupState,
};
use crate::modifiers::{Modifier, ModifierScope, ModifierTable};
use crate::resources::{ResourceKind, ResourceLedger};
use crate::rng::{self, RandomSource};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

/// Collaborators a tick needs besides the scheduler's own state.
pub struct TickContext<'a> {
    /// Read by gating conditions.
    pub ledger: &'a ResourceLedger,
    pub buildings: &'a mut dyn BuildingRegistry,
    pub rng: &'a mut dyn RandomSource,
}

/// Something the scheduler did during the last tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SchedulerEvent {
    /// A candidate was activated and took a slot.
    Activated {
        group: String,
        event: String,
        instance_id: String,
        title: String,
        duration: u32,
    },
    /// An event ran out and released its slot.
    Expired { event: String, instance_id: String },
    /// A group rolled a trigger but no slot was free. Ticks are sequential,
    /// so the pre-roll capacity check normally pre-empts this.
    SkippedNoSlot { group: String },
    /// A candidate's conditions failed while enforcement is on.
    Blocked { group: String, event: String },
}

/// Recoverable scheduler failure. State is unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("No event slot available")]
    NoSlotAvailable,
    #[error("Unknown event: {0}")]
    UnknownEvent(String),
    #[error("Conditions not met for event {0}")]
    ConditionsUnmet(String),
    #[error("Slot capacity {requested} is below the {active} active events")]
    CapacityBelowActive { requested: usize, active: usize },
}

/// Owns group trigger state, the active-event slots and the modifier table.
#[derive(Debug, Clone)]
pub struct EventScheduler {
    groups: Vec<EventGroupDef>,
    states: Vec<EventGroupState>,
    active: Vec<ActiveEvent>,
    modifiers: ModifierTable,
    capacity: usize,
    enforce_conditions: bool,
    next_serial: u64,
    last_tick: Vec<SchedulerEvent>,
    pending: Vec<SchedulerEvent>,
}

impl EventScheduler {
    /// Validate `groups` against `buildings` and start every group at its
    /// start percentage.
    pub fn new(
        groups: Vec<EventGroupDef>,
        balance: &BalanceConfig,
        buildings: &dyn BuildingRegistry,
    ) -> Result<Self, ConfigError> {
        validate_groups(&groups, buildings)?;
        let states = groups
            .iter()
            .map(|g| EventGroupState {
                key: g.key.clone(),
                percentage: g.start_percentage,
            })
            .collect();
        log::info!(
            "Event scheduler ready: {} groups, {} slots",
            groups.len(),
            balance.event_slots
        );
        Ok(Self {
            groups,
            states,
            active: Vec::new(),
            modifiers: ModifierTable::new(),
            capacity: balance.event_slots as usize,
            enforce_conditions: balance.enforce_event_conditions,
            next_serial: 1,
            last_tick: Vec::new(),
            pending: Vec::new(),
        })
    }

    /// Run one tick. Returns whether any event was newly activated.
    #[instrument(skip_all, name = "event_scheduler")]
    pub fn advance(&mut self, ctx: &mut TickContext<'_>) -> bool {
        self.last_tick.clear();
        self.last_tick.append(&mut self.pending);
        self.expire_events(ctx);

        let mut activated = false;
        for index in 0..self.groups.len() {
            self.states[index].percentage += self.groups[index].increment;

            if self.active.len() >= self.capacity {
                continue;
            }
            if !rng::chance(&mut *ctx.rng, self.states[index].percentage) {
                continue;
            }

            self.states[index].percentage = self.groups[index].start_percentage;
            // Guard only: nothing between the capacity check above and here
            // can take a slot.
            if self.active.len() >= self.capacity {
                log::debug!("Group {} triggered with no free slot", self.groups[index].key);
                self.last_tick.push(SchedulerEvent::SkippedNoSlot {
                    group: self.groups[index].key.clone(),
                });
                continue;
            }

            let candidate = ctx.rng.pick_index(self.groups[index].events.len());
            match self.activate_candidate(index, candidate, ctx) {
                Ok(_) => activated = true,
                Err(e) => log::debug!("Group {} trigger not activated: {}", self.groups[index].key, e),
            }
        }
        activated
    }

    /// Activate a named event immediately, outside the probability roll.
    ///
    /// Group percentages are not touched. Returns the new instance id.
    pub fn trigger_event(&mut self, event_key: &str, ctx: &mut TickContext<'_>) -> Result<String, SchedulerError> {
        let (group, candidate) = self
            .find_event(event_key)
            .ok_or_else(|| SchedulerError::UnknownEvent(event_key.to_string()))?;
        if self.active.len() >= self.capacity {
            return Err(SchedulerError::NoSlotAvailable);
        }
        let mark = self.last_tick.len();
        let result = self.activate_candidate(group, candidate, ctx);
        let records = self.last_tick.split_off(mark);
        self.pending.extend(records);
        result
    }

    fn find_event(&self, event_key: &str) -> Option<(usize, usize)> {
        self.groups.iter().enumerate().find_map(|(g, group)| {
            group
                .events
                .iter()
                .position(|e| e.key == event_key)
                .map(|e| (g, e))
        })
    }

    fn activate_candidate(
        &mut self,
        group_index: usize,
        event_index: usize,
        ctx: &mut TickContext<'_>,
    ) -> Result<String, SchedulerError> {
        let group_key = self.groups[group_index].key.clone();
        let def = &self.groups[group_index].events[event_index];

        let unmet = {
            let view = ConditionView {
                ledger: ctx.ledger,
                buildings: &*ctx.buildings,
            };
            def.unmet_conditions(&view).len()
        };
        if unmet > 0 {
            if self.enforce_conditions {
                self.last_tick.push(SchedulerEvent::Blocked {
                    group: group_key,
                    event: def.key.clone(),
                });
                return Err(SchedulerError::ConditionsUnmet(def.key.clone()));
            }
            log::debug!("Event {} activating with {} unmet condition(s)", def.key, unmet);
        }

        let duration = ctx.rng.range_inclusive(def.min_duration, def.max_duration);
        let instance_id = format!("{}#{}", def.key, self.next_serial);
        let mut event = ActiveEvent {
            instance_id: instance_id.clone(),
            event_key: def.key.clone(),
            title: render_template(&def.title, duration),
            description: render_template(&def.description, duration),
            remaining: duration,
            effects: def.instantiate_effects(),
        };
        self.next_serial += 1;

        let mut target = EffectTarget {
            modifiers: &mut self.modifiers,
            buildings: &mut *ctx.buildings,
            rng: &mut *ctx.rng,
        };
        for effect in event.effects.iter_mut() {
            if let Err(e) = effects::activate(effect, &instance_id, &mut target) {
                log::warn!("Effect of {} skipped: {}", instance_id, e);
            }
        }

        log::debug!("Activated {} for {} ticks", instance_id, duration);
        self.last_tick.push(SchedulerEvent::Activated {
            group: group_key,
            event: event.event_key.clone(),
            instance_id: instance_id.clone(),
            title: event.title.clone(),
            duration,
        });
        self.active.push(event);
        Ok(instance_id)
    }

    fn expire_events(&mut self, ctx: &mut TickContext<'_>) {
        let mut index = 0;
        while index < self.active.len() {
            let event = &mut self.active[index];
            event.remaining = event.remaining.saturating_sub(1);
            if event.remaining > 0 {
                index += 1;
                continue;
            }

            let mut expired = self.active.remove(index);
            let mut target = EffectTarget {
                modifiers: &mut self.modifiers,
                buildings: &mut *ctx.buildings,
                rng: &mut *ctx.rng,
            };
            for effect in expired.effects.iter_mut().rev() {
                if let Err(e) = effects::deactivate(effect, &mut target) {
                    log::warn!("Effect of {} not reverted: {}", expired.instance_id, e);
                }
            }
            log::debug!("Expired {}", expired.instance_id);
            self.last_tick.push(SchedulerEvent::Expired {
                event: expired.event_key,
                instance_id: expired.instance_id,
            });
        }
    }

    /// `(multiplier, additive)` for production scaling.
    pub fn modifier(&self, scope: ModifierScope, kind: ResourceKind) -> Modifier {
        self.modifiers.get(scope, kind)
    }

    pub fn modifiers(&self) -> &ModifierTable {
        &self.modifiers
    }

    /// `(title, remaining)` of every active event, oldest first.
    pub fn list_active_events(&self) -> Vec<(String, u32)> {
        self.active
            .iter()
            .map(|e| (e.title.clone(), e.remaining))
            .collect()
    }

    pub fn active_events(&self) -> &[ActiveEvent] {
        &self.active
    }

    pub fn group_states(&self) -> &[EventGroupState] {
        &self.states
    }

    pub fn group_percentage(&self, group_key: &str) -> Option<f64> {
        self.states
            .iter()
            .find(|s| s.key == group_key)
            .map(|s| s.percentage)
    }

    pub fn slot_capacity(&self) -> usize {
        self.capacity
    }

    /// Change the number of slots. Cannot drop below the active count.
    pub fn set_slot_capacity(&mut self, capacity: usize) -> Result<(), SchedulerError> {
        if capacity < self.active.len() {
            return Err(SchedulerError::CapacityBelowActive {
                requested: capacity,
                active: self.active.len(),
            });
        }
        log::info!("Event slot capacity {} -> {}", self.capacity, capacity);
        self.capacity = capacity;
        Ok(())
    }

    /// What happened during the most recent [`EventScheduler::advance`],
    /// led by any manual activations made before it.
    pub fn last_tick_events(&self) -> &[SchedulerEvent] {
        &self.last_tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buildings::BuildingCatalog;
    use crate::effects::EffectKind;
    use crate::events::Condition;
    use crate::testing::{event, group, producer, ScriptedRandom};

    struct Fixture {
        scheduler: EventScheduler,
        buildings: BuildingCatalog,
        ledger: ResourceLedger,
        rng: ScriptedRandom,
    }

    impl Fixture {
        fn new(groups: Vec<EventGroupDef>, slots: u32, rng: ScriptedRandom) -> Self {
            Self::with_balance(
                groups,
                BalanceConfig {
                    event_slots: slots,
                    ..Default::default()
                },
                rng,
            )
        }

        fn with_balance(groups: Vec<EventGroupDef>, balance: BalanceConfig, rng: ScriptedRandom) -> Self {
            let buildings = BuildingCatalog::load(vec![
                producer("farm", ResourceKind::Food, 5, true),
                producer("mine", ResourceKind::Iron, 2, false),
            ])
            .unwrap();
            let scheduler = EventScheduler::new(groups, &balance, &buildings).unwrap();
            Self {
                scheduler,
                buildings,
                ledger: ResourceLedger::new(),
                rng,
            }
        }

        fn advance(&mut self) -> bool {
            let mut ctx = TickContext {
                ledger: &self.ledger,
                buildings: &mut self.buildings,
                rng: &mut self.rng,
            };
            self.scheduler.advance(&mut ctx)
        }

        fn trigger(&mut self, key: &str) -> Result<String, SchedulerError> {
            let mut ctx = TickContext {
                ledger: &self.ledger,
                buildings: &mut self.buildings,
                rng: &mut self.rng,
            };
            self.scheduler.trigger_event(key, &mut ctx)
        }
    }

    fn wood_boost(factor: f64) -> EffectKind {
        EffectKind::ResourceMultiplier {
            scope: ModifierScope::Building,
            resource: ResourceKind::Wood,
            factor,
        }
    }

    #[test]
    fn test_trigger_resets_percentage() {
        // start 5, +1 per tick, draw 4.5: tick 1 -> 6, 4.5 < 6 fires, reset to 5.
        let groups = vec![group("weather", 5.0, 1.0, vec![event("storm", 3, vec![])])];
        let mut fx = Fixture::new(groups, 3, ScriptedRandom::with_fixed_roll(4.5));

        assert!(fx.advance());
        assert_eq!(fx.scheduler.group_percentage("weather"), Some(5.0));
        assert_eq!(fx.scheduler.active_events().len(), 1);
    }

    #[test]
    fn test_failed_roll_keeps_growing() {
        let groups = vec![group("weather", 5.0, 1.0, vec![event("storm", 3, vec![])])];
        let mut fx = Fixture::new(groups, 3, ScriptedRandom::with_fixed_roll(50.0));

        assert!(!fx.advance());
        assert!(!fx.advance());
        assert_eq!(fx.scheduler.group_percentage("weather"), Some(7.0));
        assert!(fx.scheduler.active_events().is_empty());
    }

    #[test]
    fn test_zero_percentage_never_fires_and_hundred_always_fires() {
        let groups = vec![
            group("never", -10.0, 0.0, vec![event("a", 1, vec![])]),
            group("always", 100.0, 0.0, vec![event("b", 1, vec![])]),
        ];
        // Draw 0.0 would beat any positive percentage.
        let mut fx = Fixture::new(groups, 5, ScriptedRandom::with_fixed_roll(0.0));
        fx.advance();

        let keys: Vec<_> = fx
            .scheduler
            .active_events()
            .iter()
            .map(|e| e.event_key.as_str())
            .collect();
        assert_eq!(keys, vec!["b"]);
    }

    #[test]
    fn test_full_capacity_skips_without_reset() {
        let groups = vec![
            group("first", 100.0, 0.0, vec![event("a", 10, vec![])]),
            group("second", 5.0, 1.0, vec![event("b", 10, vec![])]),
        ];
        let mut fx = Fixture::new(groups, 1, ScriptedRandom::with_fixed_roll(0.0));

        fx.advance();
        assert_eq!(fx.scheduler.active_events().len(), 1);
        // "second" was never rolled; it keeps accumulating.
        assert_eq!(fx.scheduler.group_percentage("second"), Some(6.0));
        fx.advance();
        assert_eq!(fx.scheduler.group_percentage("second"), Some(7.0));
        assert_eq!(fx.scheduler.active_events().len(), 1);
        // Neither group rolled, so nothing is recorded.
        assert!(fx.scheduler.last_tick_events().is_empty());
    }

    #[test]
    fn test_event_expires_and_reverts() {
        let groups = vec![group(
            "economy",
            0.0,
            0.0,
            vec![event("boom", 2, vec![wood_boost(2.0)])],
        )];
        let mut fx = Fixture::new(groups, 1, ScriptedRandom::new());

        fx.trigger("boom").unwrap();
        assert_eq!(
            fx.scheduler.modifier(ModifierScope::Building, ResourceKind::Wood).multiplier,
            2.0
        );
        assert_eq!(fx.scheduler.list_active_events(), vec![("boom".to_string(), 2)]);

        fx.advance();
        assert_eq!(fx.scheduler.list_active_events(), vec![("boom".to_string(), 1)]);

        fx.advance();
        assert!(fx.scheduler.active_events().is_empty());
        assert!(fx.scheduler.modifiers().is_identity());
        assert!(matches!(
            fx.scheduler.last_tick_events(),
            [SchedulerEvent::Expired { event, .. }] if event == "boom"
        ));
    }

    #[test]
    fn test_duration_rolled_in_range_and_rendered() {
        let mut def = event("drought", 2, vec![]);
        def.max_duration = 6;
        def.title = "Drought ({duration})".to_string();
        let groups = vec![group("weather", 100.0, 0.0, vec![def])];
        let mut rng = ScriptedRandom::new();
        rng.push_durations(&[5]);
        let mut fx = Fixture::new(groups, 1, rng);

        fx.advance();
        assert_eq!(
            fx.scheduler.list_active_events(),
            vec![("Drought (5)".to_string(), 5)]
        );
    }

    #[test]
    fn test_candidate_picked_by_index() {
        let groups = vec![group(
            "weather",
            100.0,
            0.0,
            vec![event("storm", 1, vec![]), event("flood", 1, vec![])],
        )];
        let mut rng = ScriptedRandom::new();
        rng.push_indices(&[1]);
        let mut fx = Fixture::new(groups, 1, rng);

        fx.advance();
        assert_eq!(fx.scheduler.active_events()[0].event_key, "flood");
        assert_eq!(fx.scheduler.active_events()[0].instance_id, "flood#1");
    }

    #[test]
    fn test_same_event_stacks_as_independent_instances() {
        let groups = vec![group(
            "economy",
            100.0,
            0.0,
            vec![event("boom", 3, vec![wood_boost(2.0)])],
        )];
        let mut fx = Fixture::new(groups, 2, ScriptedRandom::new());

        fx.advance();
        fx.advance();
        assert_eq!(fx.scheduler.active_events().len(), 2);
        assert_eq!(
            fx.scheduler.modifier(ModifierScope::Building, ResourceKind::Wood).multiplier,
            4.0
        );

        // First instance expires on tick 4, second on tick 5.
        fx.advance();
        fx.advance();
        assert_eq!(
            fx.scheduler.modifier(ModifierScope::Building, ResourceKind::Wood).multiplier,
            4.0,
            "a replacement instance fills the freed slot"
        );
    }

    #[test]
    fn test_conditions_are_advisory_by_default() {
        let mut def = event("gold_rush", 2, vec![]);
        def.conditions.push(Condition::BuildingUnlocked {
            code: "mine".to_string(),
        });
        let groups = vec![group("economy", 100.0, 0.0, vec![def])];
        let mut fx = Fixture::new(groups, 1, ScriptedRandom::new());

        assert!(fx.advance());
        assert_eq!(fx.scheduler.active_events().len(), 1);
    }

    #[test]
    fn test_enforced_conditions_block_and_reset() {
        let mut def = event("gold_rush", 2, vec![]);
        def.conditions.push(Condition::BuildingUnlocked {
            code: "mine".to_string(),
        });
        let groups = vec![group("economy", 50.0, 10.0, vec![def])];
        let balance = BalanceConfig {
            event_slots: 1,
            enforce_event_conditions: true,
            ..Default::default()
        };
        let mut fx = Fixture::with_balance(groups, balance, ScriptedRandom::with_fixed_roll(0.0));

        assert!(!fx.advance());
        assert!(fx.scheduler.active_events().is_empty());
        assert_eq!(fx.scheduler.group_percentage("economy"), Some(50.0));
        assert!(matches!(
            fx.scheduler.last_tick_events(),
            [SchedulerEvent::Blocked { .. }]
        ));

        fx.buildings.set_unlocked("mine", true);
        assert!(fx.advance());
    }

    #[test]
    fn test_trigger_event_errors() {
        let groups = vec![group("weather", 0.0, 0.0, vec![event("storm", 5, vec![])])];
        let mut fx = Fixture::new(groups, 1, ScriptedRandom::new());

        assert_eq!(
            fx.trigger("meteor"),
            Err(SchedulerError::UnknownEvent("meteor".to_string()))
        );
        assert_eq!(fx.trigger("storm"), Ok("storm#1".to_string()));
        assert_eq!(fx.trigger("storm"), Err(SchedulerError::NoSlotAvailable));
        assert_eq!(fx.scheduler.group_percentage("weather"), Some(0.0));
    }

    #[test]
    fn test_triggered_activation_reported_with_next_tick() {
        let groups = vec![group("weather", 0.0, 0.0, vec![event("storm", 2, vec![])])];
        let mut fx = Fixture::new(groups, 1, ScriptedRandom::new());

        fx.trigger("storm").unwrap();
        assert!(fx.scheduler.last_tick_events().is_empty());

        fx.advance();
        assert!(matches!(
            fx.scheduler.last_tick_events(),
            [SchedulerEvent::Activated { instance_id, group, .. }]
                if instance_id == "storm#1" && group == "weather"
        ));

        fx.advance();
        assert!(matches!(
            fx.scheduler.last_tick_events(),
            [SchedulerEvent::Expired { instance_id, .. }] if instance_id == "storm#1"
        ));
    }

    #[test]
    fn test_rejected_trigger_records_nothing() {
        let groups = vec![group("weather", 0.0, 0.0, vec![event("storm", 2, vec![])])];
        let mut fx = Fixture::new(groups, 0, ScriptedRandom::new());

        assert_eq!(fx.trigger("storm"), Err(SchedulerError::NoSlotAvailable));
        fx.advance();
        assert!(fx.scheduler.last_tick_events().is_empty());
    }

    #[test]
    fn test_set_slot_capacity() {
        let groups = vec![group("weather", 0.0, 0.0, vec![event("storm", 5, vec![])])];
        let mut fx = Fixture::new(groups, 2, ScriptedRandom::new());
        fx.trigger("storm").unwrap();
        fx.trigger("storm").unwrap();

        assert_eq!(
            fx.scheduler.set_slot_capacity(1),
            Err(SchedulerError::CapacityBelowActive {
                requested: 1,
                active: 2
            })
        );
        assert_eq!(fx.scheduler.slot_capacity(), 2);
        fx.scheduler.set_slot_capacity(4).unwrap();
        assert_eq!(fx.scheduler.slot_capacity(), 4);
    }

    #[test]
    fn test_invalid_groups_fail_construction() {
        let buildings = BuildingCatalog::default();
        let result = EventScheduler::new(
            vec![group("empty", 5.0, 1.0, vec![])],
            &BalanceConfig::default(),
            &buildings,
        );
        assert!(matches!(result, Err(ConfigError::EmptyGroup(_))));
    }

    #[test]
    fn test_building_grant_survives_expiry() {
        let groups = vec![group(
            "settlers",
            0.0,
            0.0,
            vec![event(
                "new_farms",
                1,
                vec![EffectKind::AddBuilding {
                    code: "farm".to_string(),
                    count: 3,
                }],
            )],
        )];
        let mut fx = Fixture::new(groups, 1, ScriptedRandom::new());
        fx.trigger("new_farms").unwrap();
        fx.advance();

        assert!(fx.scheduler.active_events().is_empty());
        assert_eq!(fx.buildings.get("farm").unwrap().state.count, 3);
    }
}
