//! Event log observer recording scheduler happenings as JSONL.
//!
//! One line per [`SchedulerEvent`], stamped with tick and date:
//!
//! ```json
//! {"tick":12,"date":"1.1.13","type":"activated","group":"weather","event":"storm",...}
//! ```

use super::{EconomyObserver, ObserverConfig, ObserverError};
use crate::scheduler::SchedulerEvent;
use crate::step::{Economy, TickReport};
use serde::Serialize;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

#[derive(Serialize)]
struct LogLine<'a> {
    tick: u64,
    date: String,
    #[serde(flatten)]
    event: &'a SchedulerEvent,
}

pub struct EventLogObserver {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl EventLogObserver {
    /// Buffered stdout, for piping into `jq` and friends.
    pub fn stdout() -> Self {
        Self::new(Box::new(BufWriter::new(std::io::stdout())))
    }

    pub fn file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(BufWriter::new(file))))
    }

    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

impl EconomyObserver for EventLogObserver {
    fn on_tick(&self, _economy: &Economy, report: &TickReport) -> Result<(), ObserverError> {
        if report.events.is_empty() {
            return Ok(());
        }
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| ObserverError::Render("EventLogObserver writer lock poisoned".into()))?;

        let date = report.date.to_string();
        for event in &report.events {
            let line = LogLine {
                tick: report.tick,
                date: date.clone(),
                event,
            };
            serde_json::to_writer(&mut *writer, &line)?;
            writeln!(writer)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "EventLogObserver"
    }

    fn config(&self) -> ObserverConfig {
        ObserverConfig {
            frequency: 1,
            notify_on_events: true,
        }
    }

    fn on_shutdown(&self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}
