//! Modifier aggregation for production scaling.
//!
//! Events adjust these accumulators through [`crate::effects`]. Every
//! adjustment has an inverse: multipliers are divided back out and
//! additives subtracted, so a table is never reset to a baseline while
//! other effects are still contributing.
//!
//! Floating-point division does not undo a product exactly once several
//! factors overlap, so each slot also counts its live contributions. When
//! the last factor (or delta) of a slot is removed, that half of the slot
//! snaps back to its identity value and no residue survives.

use crate::resources::{ResourceAmount, ResourceKind};
use serde::{Deserialize, Serialize};

/// Axis a modifier applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierScope {
    /// Territory-wide base income.
    Territory,
    /// Output of every building type.
    Building,
}

impl ModifierScope {
    pub const ALL: [ModifierScope; 2] = [ModifierScope::Territory, ModifierScope::Building];

    #[inline]
    fn index(self) -> usize {
        match self {
            ModifierScope::Territory => 0,
            ModifierScope::Building => 1,
        }
    }
}

/// Accumulated adjustment for one (scope, resource) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    /// Product of all active multiplicative contributions.
    pub multiplier: f64,
    /// Sum of all active additive contributions.
    pub additive: f64,
}

impl Modifier {
    pub const IDENTITY: Modifier = Modifier {
        multiplier: 1.0,
        additive: 0.0,
    };

    /// Scale a raw amount: `trunc(floor(raw × multiplier) + additive)`.
    pub fn scale(&self, raw: i64) -> i64 {
        let scaled = (raw as f64 * self.multiplier).floor() + self.additive;
        scaled.trunc() as i64
    }
}

impl Default for Modifier {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Live contributions to one slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
struct Contributions {
    factors: u32,
    deltas: u32,
}

/// Per-scope, per-resource modifier accumulators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierTable {
    scopes: [[Modifier; ResourceKind::COUNT]; 2],
    contributions: [[Contributions; ResourceKind::COUNT]; 2],
}

impl Default for ModifierTable {
    fn default() -> Self {
        Self {
            scopes: [[Modifier::IDENTITY; ResourceKind::COUNT]; 2],
            contributions: [[Contributions::default(); ResourceKind::COUNT]; 2],
        }
    }
}

impl ModifierTable {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, scope: ModifierScope, kind: ResourceKind) -> Modifier {
        self.scopes[scope.index()][kind.index()]
    }

    pub fn multiply(&mut self, scope: ModifierScope, kind: ResourceKind, factor: f64) {
        let (slot, count) = self.slot(scope, kind);
        slot.multiplier *= factor;
        count.factors = count.factors.saturating_add(1);
    }

    /// Inverse of [`ModifierTable::multiply`] for the same factor.
    pub fn divide(&mut self, scope: ModifierScope, kind: ResourceKind, factor: f64) {
        let (slot, count) = self.slot(scope, kind);
        match count.factors {
            0 => slot.multiplier /= factor,
            1 => {
                count.factors = 0;
                slot.multiplier = Modifier::IDENTITY.multiplier;
            }
            _ => {
                count.factors -= 1;
                slot.multiplier /= factor;
            }
        }
    }

    pub fn add(&mut self, scope: ModifierScope, kind: ResourceKind, delta: f64) {
        let (slot, count) = self.slot(scope, kind);
        slot.additive += delta;
        count.deltas = count.deltas.saturating_add(1);
    }

    /// Inverse of [`ModifierTable::add`] for the same delta.
    pub fn subtract(&mut self, scope: ModifierScope, kind: ResourceKind, delta: f64) {
        let (slot, count) = self.slot(scope, kind);
        match count.deltas {
            0 => slot.additive -= delta,
            1 => {
                count.deltas = 0;
                slot.additive = Modifier::IDENTITY.additive;
            }
            _ => {
                count.deltas -= 1;
                slot.additive -= delta;
            }
        }
    }

    /// Scale each raw entry by the scope's modifier for its kind.
    pub fn scale_all(&self, scope: ModifierScope, raw: &[ResourceAmount]) -> Vec<ResourceAmount> {
        raw.iter()
            .map(|entry| ResourceAmount::new(entry.kind, self.get(scope, entry.kind).scale(entry.amount)))
            .collect()
    }

    /// True when no effect is contributing anywhere.
    pub fn is_identity(&self) -> bool {
        self.scopes
            .iter()
            .flatten()
            .all(|m| *m == Modifier::IDENTITY)
    }

    fn slot(&mut self, scope: ModifierScope, kind: ResourceKind) -> (&mut Modifier, &mut Contributions) {
        (
            &mut self.scopes[scope.index()][kind.index()],
            &mut self.contributions[scope.index()][kind.index()],
        )
    }
}
