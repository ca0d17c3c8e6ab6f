//! Console observer printing a one-line ledger summary.

use super::{EconomyObserver, ObserverConfig, ObserverError};
use crate::resources::ResourceKind;
use crate::step::{Economy, TickReport};
use std::io::{self, Write};
use std::sync::Mutex;

/// Prints date, stocks with per-tick income and the active events.
pub struct ConsoleObserver {
    writer: Mutex<Box<dyn Write + Send>>,
    config: ObserverConfig,
}

impl ConsoleObserver {
    pub fn new() -> Self {
        Self::with_writer(Box::new(io::stdout()))
    }

    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
            config: ObserverConfig::default(),
        }
    }

    pub fn with_frequency(mut self, frequency: u32) -> Self {
        self.config.frequency = frequency;
        self
    }
}

impl Default for ConsoleObserver {
    fn default() -> Self {
        Self::new()
    }
}

/// `[date] Wood 120 (+15) | Iron 0 (+0) | ... | events: Drought (3)`
pub fn render_line(economy: &Economy, report: &TickReport) -> String {
    let mut line = format!("[{}] tick {:>5}", report.date, report.tick);
    for kind in ResourceKind::ALL {
        let income = report
            .produced
            .iter()
            .find(|a| a.kind == kind)
            .map_or(0, |a| a.amount);
        line.push_str(&format!(
            " | {} {} ({:+})",
            kind,
            economy.ledger().get(kind),
            income
        ));
    }

    let active = economy.list_active_events();
    if !active.is_empty() {
        let titles: Vec<String> = active
            .iter()
            .map(|(title, remaining)| format!("{} ({})", title, remaining))
            .collect();
        line.push_str(" | events: ");
        line.push_str(&titles.join(", "));
    }
    line
}

impl EconomyObserver for ConsoleObserver {
    fn on_tick(&self, economy: &Economy, report: &TickReport) -> Result<(), ObserverError> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| ObserverError::Render("Lock poisoned".to_string()))?;
        writeln!(writer, "{}", render_line(economy, report))?;
        Ok(())
    }

    fn name(&self) -> &str {
        "ConsoleObserver"
    }

    fn config(&self) -> ObserverConfig {
        self.config.clone()
    }

    fn on_shutdown(&self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}
