//! Frame time as seen by the simulation.

use super::params::MAX_SIMULATION_DT;

/// Raw frame delta plus the clamped delta physics integrates with.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SimulationClock {
    raw: f64,
}

impl SimulationClock {
    pub fn new(raw_delta_seconds: f64) -> Self {
        Self {
            raw: raw_delta_seconds.max(0.0),
        }
    }

    /// Clock for a step of exactly `1/60` s.
    pub fn fixed_60hz() -> Self {
        Self::new(MAX_SIMULATION_DT)
    }

    /// Unclamped frame delta in seconds.
    pub fn delta(&self) -> f64 {
        self.raw
    }

    /// Frame delta clamped to at most `1/60` s, so a stalled frame cannot
    /// produce an oversized impulse.
    pub fn simulation_delta(&self) -> f64 {
        self.raw.min(MAX_SIMULATION_DT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulation_delta_is_clamped() {
        let stalled = SimulationClock::new(0.5);
        assert_eq!(stalled.delta(), 0.5);
        assert_eq!(stalled.simulation_delta(), 1.0 / 60.0);

        let fast = SimulationClock::new(1.0 / 144.0);
        assert_eq!(fast.simulation_delta(), 1.0 / 144.0);
    }

    #[test]
    fn test_negative_delta_treated_as_zero() {
        assert_eq!(SimulationClock::new(-1.0).simulation_delta(), 0.0);
    }
}
