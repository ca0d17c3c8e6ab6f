//! Event effects and their activation contract.
//!
//! An [`Effect`] is a closed [`EffectKind`] plus two bits of runtime state:
//! whether it is active and which event instance activated it.
//!
//! Modifier effects are exact inverses of themselves: [`activate`] multiplies
//! or adds, [`deactivate`] divides or subtracts the same magnitude. Building
//! grants are one-shot; reverting them is a no-op, so a building granted by
//! an event stays when the event expires.
//!
//! Activation is idempotent in the strict sense: activating an active effect
//! fails with [`EffectError::AlreadyActive`] and changes nothing.

use crate::buildings::BuildingRegistry;
use crate::config::ConfigError;
use crate::modifiers::{ModifierScope, ModifierTable};
use crate::resources::ResourceKind;
use crate::rng::RandomSource;
use serde::{Deserialize, Serialize};
use thiserror::Error;

fn default_grant_count() -> u32 {
    1
}

/// What an effect does when applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectKind {
    /// Multiply every resource of a scope.
    UniformMultiplier { scope: ModifierScope, factor: f64 },
    /// Multiply one resource of a scope.
    ResourceMultiplier {
        scope: ModifierScope,
        resource: ResourceKind,
        factor: f64,
    },
    /// Add a flat amount to one resource of a scope.
    ResourceAdditive {
        scope: ModifierScope,
        resource: ResourceKind,
        delta: f64,
    },
    /// Grant buildings of a given code. Permanent.
    AddBuilding {
        code: String,
        #[serde(default = "default_grant_count")]
        count: u32,
    },
    /// Unlock a building code. Permanent.
    UnlockBuilding { code: String },
    /// Grant one each of up to `count` unlocked buildings that have none
    /// built yet, picked uniformly without replacement. Permanent.
    AddRandomUnlockedBuildings { count: u32 },
}

/// Everything an effect may touch while applying or reverting.
///
/// Borrowed for the duration of one call only.
pub struct EffectTarget<'a> {
    pub modifiers: &'a mut ModifierTable,
    pub buildings: &'a mut dyn BuildingRegistry,
    pub rng: &'a mut dyn RandomSource,
}

impl EffectKind {
    /// False for one-shot building grants.
    pub fn is_reversible(&self) -> bool {
        matches!(
            self,
            EffectKind::UniformMultiplier { .. }
                | EffectKind::ResourceMultiplier { .. }
                | EffectKind::ResourceAdditive { .. }
        )
    }

    /// Reject magnitudes that cannot be reverted exactly and building codes
    /// the registry does not know.
    pub fn validate(&self, event: &str, buildings: &dyn BuildingRegistry) -> Result<(), ConfigError> {
        let bad_magnitude = |value: f64| ConfigError::InvalidMagnitude {
            event: event.to_string(),
            value,
        };
        match self {
            EffectKind::UniformMultiplier { factor, .. }
            | EffectKind::ResourceMultiplier { factor, .. } => {
                if !factor.is_finite() || *factor == 0.0 {
                    return Err(bad_magnitude(*factor));
                }
            }
            EffectKind::ResourceAdditive { delta, .. } => {
                if !delta.is_finite() {
                    return Err(bad_magnitude(*delta));
                }
            }
            EffectKind::AddBuilding { code, .. } | EffectKind::UnlockBuilding { code } => {
                if buildings.lookup(code).is_none() {
                    return Err(ConfigError::UnknownBuilding {
                        event: event.to_string(),
                        code: code.clone(),
                    });
                }
            }
            EffectKind::AddRandomUnlockedBuildings { .. } => {}
        }
        Ok(())
    }

    fn apply(&self, target: &mut EffectTarget<'_>) {
        match self {
            EffectKind::UniformMultiplier { scope, factor } => {
                for kind in ResourceKind::ALL {
                    target.modifiers.multiply(*scope, kind, *factor);
                }
            }
            EffectKind::ResourceMultiplier {
                scope,
                resource,
                factor,
            } => target.modifiers.multiply(*scope, *resource, *factor),
            EffectKind::ResourceAdditive {
                scope,
                resource,
                delta,
            } => target.modifiers.add(*scope, *resource, *delta),
            EffectKind::AddBuilding { code, count } => {
                if !target.buildings.increment_count(code, *count) {
                    log::warn!("Effect skipped: unknown building {}", code);
                }
            }
            EffectKind::UnlockBuilding { code } => {
                if !target.buildings.set_unlocked(code, true) {
                    log::warn!("Effect skipped: unknown building {}", code);
                }
            }
            EffectKind::AddRandomUnlockedBuildings { count } => {
                let mut pool = target.buildings.unlocked_idle_codes();
                let picks = (*count as usize).min(pool.len());
                for _ in 0..picks {
                    let index = target.rng.pick_index(pool.len());
                    let code = pool.swap_remove(index);
                    target.buildings.increment_count(&code, 1);
                    log::debug!("Random grant: {}", code);
                }
            }
        }
    }

    fn revert(&self, target: &mut EffectTarget<'_>) {
        match self {
            EffectKind::UniformMultiplier { scope, factor } => {
                for kind in ResourceKind::ALL {
                    target.modifiers.divide(*scope, kind, *factor);
                }
            }
            EffectKind::ResourceMultiplier {
                scope,
                resource,
                factor,
            } => target.modifiers.divide(*scope, *resource, *factor),
            EffectKind::ResourceAdditive {
                scope,
                resource,
                delta,
            } => target.modifiers.subtract(*scope, *resource, *delta),
            // Grants are permanent.
            EffectKind::AddBuilding { .. }
            | EffectKind::UnlockBuilding { .. }
            | EffectKind::AddRandomUnlockedBuildings { .. } => {}
        }
    }
}

/// An effect instance bound to at most one event at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub kind: EffectKind,
    active: bool,
    event_id: Option<String>,
}

impl Effect {
    pub fn new(kind: EffectKind) -> Self {
        Self {
            kind,
            active: false,
            event_id: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Instance id of the event that activated this effect.
    pub fn event_id(&self) -> Option<&str> {
        self.event_id.as_deref()
    }
}

/// Rejected activation or deactivation. State is unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EffectError {
    #[error("Effect is already active")]
    AlreadyActive,
    #[error("Effect is not active")]
    NotActive,
    #[error("Effect activation requires an event id")]
    MissingEventId,
}

/// Apply `effect` on behalf of event instance `event_id`.
pub fn activate(
    effect: &mut Effect,
    event_id: &str,
    target: &mut EffectTarget<'_>,
) -> Result<(), EffectError> {
    if effect.active {
        return Err(EffectError::AlreadyActive);
    }
    if event_id.trim().is_empty() {
        return Err(EffectError::MissingEventId);
    }
    effect.kind.apply(target);
    effect.active = true;
    effect.event_id = Some(event_id.to_string());
    log::debug!("Activated {:?} for {}", effect.kind, event_id);
    Ok(())
}

/// Revert an active effect and clear its event binding.
pub fn deactivate(effect: &mut Effect, target: &mut EffectTarget<'_>) -> Result<(), EffectError> {
    if !effect.active {
        return Err(EffectError::NotActive);
    }
    effect.kind.revert(target);
    log::debug!(
        "Deactivated {:?} from {}",
        effect.kind,
        effect.event_id.as_deref().unwrap_or("?")
    );
    effect.active = false;
    effect.event_id = None;
    Ok(())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::buildings::BuildingCatalog;
    use crate::testing::ScriptedRandom;
    use proptest::prelude::*;

    fn modifier_kind() -> impl Strategy<Value = EffectKind> {
        let scope = prop_oneof![Just(ModifierScope::Territory), Just(ModifierScope::Building)];
        let resource = (0..ResourceKind::COUNT).prop_map(|i| ResourceKind::ALL[i]);
        prop_oneof![
            (scope.clone(), 0.01f64..10.0)
                .prop_map(|(scope, factor)| EffectKind::UniformMultiplier { scope, factor }),
            (scope.clone(), resource.clone(), 0.01f64..10.0).prop_map(|(scope, resource, factor)| {
                EffectKind::ResourceMultiplier {
                    scope,
                    resource,
                    factor,
                }
            }),
            (scope, resource, -100.0f64..100.0).prop_map(|(scope, resource, delta)| {
                EffectKind::ResourceAdditive {
                    scope,
                    resource,
                    delta,
                }
            }),
        ]
    }

    proptest! {
        #[test]
        fn prop_paired_calls_restore_identity(
            kind in modifier_kind(),
            calls in proptest::collection::vec(any::<bool>(), 0..40),
        ) {
            let mut modifiers = ModifierTable::new();
            let mut buildings = BuildingCatalog::default();
            let mut rng = ScriptedRandom::new();
            let mut effect = Effect::new(kind);

            for activate_call in calls {
                let mut target = EffectTarget {
                    modifiers: &mut modifiers,
                    buildings: &mut buildings,
                    rng: &mut rng,
                };
                let before = target.modifiers.clone();
                let was_active = effect.is_active();
                let result = if activate_call {
                    activate(&mut effect, "prop#1", &mut target)
                } else {
                    deactivate(&mut effect, &mut target)
                };
                // A rejected call never changes the table.
                if result.is_err() {
                    prop_assert_eq!(&modifiers, &before);
                    prop_assert_eq!(effect.is_active(), was_active);
                }
            }

            if effect.is_active() {
                let mut target = EffectTarget {
                    modifiers: &mut modifiers,
                    buildings: &mut buildings,
                    rng: &mut rng,
                };
                deactivate(&mut effect, &mut target).unwrap();
            }
            prop_assert!(modifiers.is_identity());
        }
    }
}
