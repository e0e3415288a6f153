/// The single monotonic virtual-time authority driving all scheduled events.
///
/// Time is measured in minutes from the simulation epoch. The clock only
/// moves forward; `reset` is the one exception and discards the timeline.
#[derive(Debug, Clone)]
pub struct SimulationClock {
    now: f64,
}

impl SimulationClock {
    pub fn new() -> Self {
        SimulationClock { now: 0.0 }
    }

    /// Current virtual time in minutes.
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Advances virtual time by `minutes` and returns the new time.
    /// Non-positive durations are ignored; the clock never moves backwards.
    pub fn advance_by(&mut self, minutes: f64) -> f64 {
        if minutes > 0.0 {
            self.now += minutes;
        } else {
            log::warn!("Ignoring clock advance of {minutes} minutes");
        }

        self.now
    }

    pub fn reset(&mut self) {
        self.now = 0.0;
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new()
    }
}
