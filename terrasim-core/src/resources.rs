//! Resource kinds and the territory resource ledger.
//!
//! The ledger holds one non-negative integer stock per [`ResourceKind`].
//! Every write clamps at zero, so callers that must not overdraw check
//! [`ResourceLedger::can_afford`] first or go through the atomic
//! [`ResourceLedger::try_spend`].

use serde::{Deserialize, Serialize};

/// The fixed set of resources tracked by the economy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Wood,
    Iron,
    Food,
    Tech,
}

impl ResourceKind {
    /// All kinds in ledger order.
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Wood,
        ResourceKind::Iron,
        ResourceKind::Food,
        ResourceKind::Tech,
    ];

    /// Number of resource kinds.
    pub const COUNT: usize = Self::ALL.len();

    /// Position of this kind in per-kind arrays.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            ResourceKind::Wood => 0,
            ResourceKind::Iron => 1,
            ResourceKind::Food => 2,
            ResourceKind::Tech => 3,
        }
    }

    /// Resolve a raw numeric kind (as stored by designer tools).
    pub fn from_index(raw: usize) -> Option<Self> {
        Self::ALL.get(raw).copied()
    }

    /// Resolve a kind by name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn name(self) -> &'static str {
        match self {
            ResourceKind::Wood => "Wood",
            ResourceKind::Iron => "Iron",
            ResourceKind::Food => "Food",
            ResourceKind::Tech => "Tech",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A quantity of one resource: a production entry, a cost, or a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceAmount {
    pub kind: ResourceKind,
    pub amount: i64,
}

impl ResourceAmount {
    pub fn new(kind: ResourceKind, amount: i64) -> Self {
        Self { kind, amount }
    }
}

/// Stockpile of every resource kind. Amounts never go below zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLedger {
    amounts: [i64; ResourceKind::COUNT],
}

impl ResourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from starting amounts. Repeated kinds accumulate.
    pub fn with_amounts(amounts: &[ResourceAmount]) -> Self {
        let mut ledger = Self::new();
        for entry in amounts {
            ledger.add(entry.kind, entry.amount);
        }
        ledger
    }

    #[inline]
    pub fn get(&self, kind: ResourceKind) -> i64 {
        self.amounts[kind.index()]
    }

    /// Overwrite a stock; negative values are stored as zero.
    pub fn set(&mut self, kind: ResourceKind, quantity: i64) {
        self.amounts[kind.index()] = quantity.max(0);
    }

    /// Add a signed delta. Overdrafts are absorbed at zero.
    pub fn add(&mut self, kind: ResourceKind, delta: i64) {
        let current = self.get(kind);
        self.set(kind, current.saturating_add(delta));
    }

    /// True iff every cost can be paid. An empty cost list is always affordable.
    pub fn can_afford(&self, costs: &[ResourceAmount]) -> bool {
        let required = Self::totals(costs);
        ResourceKind::ALL
            .iter()
            .all(|&kind| self.get(kind) >= required[kind.index()])
    }

    /// Pay every cost, or nothing at all.
    ///
    /// Returns `false` without touching the ledger when any single kind
    /// is short.
    pub fn try_spend(&mut self, costs: &[ResourceAmount]) -> bool {
        if !self.can_afford(costs) {
            return false;
        }
        for entry in costs {
            self.add(entry.kind, -entry.amount);
        }
        true
    }

    /// Current stocks in ledger order.
    pub fn snapshot(&self) -> Vec<ResourceAmount> {
        ResourceKind::ALL
            .iter()
            .map(|&kind| ResourceAmount::new(kind, self.get(kind)))
            .collect()
    }

    // Costs may name a kind more than once; affordability is judged on the sum.
    fn totals(costs: &[ResourceAmount]) -> [i64; ResourceKind::COUNT] {
        let mut totals = [0i64; ResourceKind::COUNT];
        for entry in costs {
            let slot = &mut totals[entry.kind.index()];
            *slot = slot.saturating_add(entry.amount);
        }
        totals
    }
}
