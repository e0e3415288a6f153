use serde::Serialize;

use crate::error::{Error, Result};

/// An immutable delay record attributable to one train on one corridor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Disruption {
    pub train_id: String,
    pub corridor: String,
    pub delay_minutes: f64,
    /// Virtual time (minutes) at which the disruption was recorded.
    pub timestamp: f64,
    pub reason: String,
}

/// Append-only record of disruptions. Entries are never mutated or removed
/// except on full simulation reset.
#[derive(Debug, Clone, Default)]
pub struct DisruptionLedger {
    entries: Vec<Disruption>,
}

impl DisruptionLedger {
    pub fn new() -> Self {
        DisruptionLedger { entries: Vec::new() }
    }

    /// Appends a disruption. Negative delays (early running) are disallowed
    /// by convention.
    pub fn append(&mut self, disruption: Disruption) -> Result<()> {
        if disruption.delay_minutes < 0.0 {
            return Err(Error::NegativeDelay { train_id: disruption.train_id, minutes: disruption.delay_minutes });
        }

        log::info!(
            "Disruption recorded: train {} on '{}' +{:.1} min ({})",
            disruption.train_id,
            disruption.corridor,
            disruption.delay_minutes,
            disruption.reason
        );

        self.entries.push(disruption);
        Ok(())
    }

    pub fn entries(&self) -> &[Disruption] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total delay minutes recorded for `train_id` on `corridor`.
    pub fn delay_for(&self, train_id: &str, corridor: &str) -> f64 {
        self.entries.iter().filter(|d| d.train_id == train_id && d.corridor == corridor).map(|d| d.delay_minutes).sum()
    }

    /// Total delay minutes recorded for `train_id` on corridors outside `route`.
    pub fn delay_off_route(&self, train_id: &str, route: &[String]) -> f64 {
        self.entries
            .iter()
            .filter(|d| d.train_id == train_id && !route.iter().any(|c| c == &d.corridor))
            .map(|d| d.delay_minutes)
            .sum()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
