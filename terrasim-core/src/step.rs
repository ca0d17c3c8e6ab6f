use crate::buildings::{BuildingCatalog, BuildingError};
use crate::config::{BalanceConfig, ConfigError};
use crate::modifiers::{Modifier, ModifierScope};
use crate::resources::{ResourceAmount, ResourceKind, ResourceLedger};
use crate::rng::RandomSource;
use crate::scenario::Scenario;
use crate::scheduler::{EventScheduler, SchedulerError, SchedulerEvent, TickContext};
use crate::state::{BuildingSnapshot, Date, EconomySnapshot};
use tracing::instrument;

/// What one call to [`Economy::advance`] did.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub date: Date,
    pub event_activated: bool,
    pub events: Vec<SchedulerEvent>,
    /// Scaled totals credited to the ledger, per kind in ledger order.
    pub produced: Vec<ResourceAmount>,
}

/// One territory's economy: ledger, buildings, events and the clock.
pub struct Economy {
    date: Date,
    tick: u64,
    balance: BalanceConfig,
    ledger: ResourceLedger,
    buildings: BuildingCatalog,
    scheduler: EventScheduler,
    territory_income: Vec<ResourceAmount>,
    rng: Box<dyn RandomSource>,
}

impl Economy {
    /// Validate `scenario` and build a session around `rng`.
    pub fn from_scenario(scenario: Scenario, rng: Box<dyn RandomSource>) -> Result<Self, ConfigError> {
        scenario.balance.validate()?;
        let buildings = BuildingCatalog::load(scenario.buildings)?;
        let scheduler = EventScheduler::new(scenario.event_groups, &scenario.balance, &buildings)?;
        Ok(Self {
            date: scenario.start_date,
            tick: 0,
            balance: scenario.balance,
            ledger: ResourceLedger::with_amounts(&scenario.starting_resources),
            buildings,
            scheduler,
            territory_income: scenario.territory_income,
            rng,
        })
    }

    /// Advance one tick: date, events, then production.
    #[instrument(skip_all, name = "economy_tick")]
    pub fn advance(&mut self) -> TickReport {
        self.tick += 1;
        self.date = self.date.add_days(self.balance.date_multiplier);

        let event_activated = {
            let mut ctx = TickContext {
                ledger: &self.ledger,
                buildings: &mut self.buildings,
                rng: self.rng.as_mut(),
            };
            self.scheduler.advance(&mut ctx)
        };

        let mut totals = [0i64; ResourceKind::COUNT];
        let codes: Vec<String> = self.buildings.iter().map(|e| e.code().to_string()).collect();
        for code in &codes {
            if let Ok(produced) = self.apply_building_production(code) {
                for amount in produced {
                    let total = &mut totals[amount.kind.index()];
                    *total = total.saturating_add(amount.amount);
                }
            }
        }
        for amount in self.apply_territory_income() {
            let total = &mut totals[amount.kind.index()];
            *total = total.saturating_add(amount.amount);
        }

        crate::profiling::frame_mark_tick();
        TickReport {
            tick: self.tick,
            date: self.date,
            event_activated,
            events: self.scheduler.last_tick_events().to_vec(),
            produced: ResourceKind::ALL
                .iter()
                .map(|&kind| ResourceAmount::new(kind, totals[kind.index()]))
                .collect(),
        }
    }

    /// Produce with one building type and credit the ledger.
    ///
    /// Returns the scaled amounts that were credited.
    pub fn apply_building_production(&mut self, code: &str) -> Result<Vec<ResourceAmount>, BuildingError> {
        let entry = self
            .buildings
            .get_mut(code)
            .ok_or_else(|| BuildingError::UnknownBuilding(code.to_string()))?;
        let raw = entry.apply_production();
        let scaled = self.scheduler.modifiers().scale_all(ModifierScope::Building, &raw);
        for amount in &scaled {
            self.ledger.add(amount.kind, amount.amount);
        }
        Ok(scaled)
    }

    /// Credit the territory's base income, scaled by the Territory scope.
    pub fn apply_territory_income(&mut self) -> Vec<ResourceAmount> {
        let scaled = self
            .scheduler
            .modifiers()
            .scale_all(ModifierScope::Territory, &self.territory_income);
        for amount in &scaled {
            self.ledger.add(amount.kind, amount.amount);
        }
        scaled
    }

    /// Build one unit, paying its cost from the ledger.
    pub fn construct(&mut self, code: &str) -> Result<(), BuildingError> {
        self.buildings.construct(code, &mut self.ledger)
    }

    pub fn demolish(&mut self, code: &str) -> Result<(), BuildingError> {
        self.buildings.demolish(code)
    }

    /// Activate a named event now. Returns the instance id.
    ///
    /// The activation shows up in the next [`TickReport::events`].
    pub fn trigger_event(&mut self, event_key: &str) -> Result<String, SchedulerError> {
        let mut ctx = TickContext {
            ledger: &self.ledger,
            buildings: &mut self.buildings,
            rng: self.rng.as_mut(),
        };
        self.scheduler.trigger_event(event_key, &mut ctx)
    }

    pub fn modifier(&self, scope: ModifierScope, kind: ResourceKind) -> Modifier {
        self.scheduler.modifier(scope, kind)
    }

    pub fn list_active_events(&self) -> Vec<(String, u32)> {
        self.scheduler.list_active_events()
    }

    pub fn set_slot_capacity(&mut self, capacity: usize) -> Result<(), SchedulerError> {
        self.scheduler.set_slot_capacity(capacity)
    }

    pub fn date(&self) -> Date {
        self.date
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn balance(&self) -> &BalanceConfig {
        &self.balance
    }

    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut ResourceLedger {
        &mut self.ledger
    }

    pub fn buildings(&self) -> &BuildingCatalog {
        &self.buildings
    }

    pub fn scheduler(&self) -> &EventScheduler {
        &self.scheduler
    }

    pub fn snapshot(&self) -> EconomySnapshot {
        EconomySnapshot {
            date: self.date,
            tick: self.tick,
            resources: self.ledger.snapshot(),
            buildings: self
                .buildings
                .iter()
                .map(|e| BuildingSnapshot {
                    code: e.code().to_string(),
                    state: e.state.clone(),
                })
                .collect(),
            groups: self.scheduler.group_states().to_vec(),
            active_events: self.scheduler.active_events().to_vec(),
            modifiers: self.scheduler.modifiers().clone(),
        }
    }
}

/// Assembles an [`Economy`] from separately supplied collaborators.
///
/// Both a scenario and a random source are required; `build` fails fast
/// when either is missing.
#[derive(Default)]
pub struct SessionBuilder {
    scenario: Option<Scenario>,
    rng: Option<Box<dyn RandomSource>>,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scenario(mut self, scenario: Scenario) -> Self {
        self.scenario = Some(scenario);
        self
    }

    pub fn rng(mut self, rng: Box<dyn RandomSource>) -> Self {
        self.rng = Some(rng);
        self
    }

    /// Use a [`SeededRandom`](crate::rng::SeededRandom) with the scenario's
    /// `rng_seed`. Call after [`SessionBuilder::scenario`].
    pub fn scenario_seed(self) -> Self {
        match self.scenario.as_ref().map(|s| s.rng_seed) {
            Some(seed) => self.rng(Box::new(crate::rng::SeededRandom::new(seed))),
            None => self,
        }
    }

    pub fn build(self) -> Result<Economy, ConfigError> {
        let scenario = self
            .scenario
            .ok_or(ConfigError::MissingCollaborator("scenario"))?;
        let rng = self
            .rng
            .ok_or(ConfigError::MissingCollaborator("random source"))?;
        Economy::from_scenario(scenario, rng)
    }
}

impl std::fmt::Debug for Economy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Economy")
            .field("date", &self.date)
            .field("tick", &self.tick)
            .field("ledger", &self.ledger)
            .field("active_events", &self.scheduler.active_events().len())
            .finish_non_exhaustive()
    }
}
