use super::SignalSource;
use crate::error::TestbedError;
use crate::signal::{logic_to_volt, LOW_LEVEL_VOLT};
use crate::types::Volt;

/// Square-wave clock.
///
/// One period lasts `period` ticks: the first `period / 2` ticks are low,
/// the rest high. `phase` shifts the wave to the left, so tick `t` shows the
/// level of tick `t + phase` of an unshifted clock.
#[derive(Debug, Clone, PartialEq)]
pub struct ClockSource {
    period: u64,
    phase: u64,
    tick: u64,
    current: Volt,
}

impl ClockSource {
    pub fn new(period: u64, phase: u64) -> Result<Self, TestbedError> {
        if period < 2 {
            return Err(TestbedError::ClockPeriodTooShort(period));
        }
        Ok(ClockSource {
            period,
            phase: phase % period,
            tick: 0,
            current: LOW_LEVEL_VOLT,
        })
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    pub fn phase(&self) -> u64 {
        self.phase
    }

    /// Logic level of the clock at tick `tick`.
    pub fn level_at(&self, tick: u64) -> bool {
        let offset = tick % self.period;
        let wrap = self.period - self.phase;
        let position = if offset >= wrap {
            offset - wrap
        } else {
            offset + self.phase
        };
        position >= self.period / 2
    }
}

impl SignalSource for ClockSource {
    fn simulation_step(&mut self) {
        self.current = logic_to_volt(self.level_at(self.tick));
        self.tick += 1;
    }

    fn output(&self) -> Volt {
        self.current
    }

    fn reset(&mut self) {
        self.tick = 0;
        self.current = LOW_LEVEL_VOLT;
    }

    fn describe(&self) -> String {
        format!("clock period {} phase {}", self.period, self.phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::HIGH_LEVEL_VOLT;

    fn levels(clock: &mut ClockSource, ticks: usize) -> Vec<bool> {
        (0..ticks)
            .map(|_| {
                clock.simulation_step();
                clock.output() == HIGH_LEVEL_VOLT
            })
            .collect()
    }

    #[test]
    fn test_clock_period_too_short() {
        assert_eq!(
            ClockSource::new(1, 0).unwrap_err(),
            TestbedError::ClockPeriodTooShort(1)
        );
        assert!(ClockSource::new(2, 0).is_ok());
    }

    #[test]
    fn test_clock_low_then_high() {
        let mut clock = ClockSource::new(4, 0).unwrap();
        assert_eq!(clock.output(), LOW_LEVEL_VOLT);
        assert_eq!(
            levels(&mut clock, 8),
            vec![false, false, true, true, false, false, true, true]
        );
    }

    #[test]
    fn test_clock_phase_shift() {
        let mut clock = ClockSource::new(4, 1).unwrap();
        assert_eq!(
            levels(&mut clock, 6),
            vec![false, true, true, false, false, true]
        );
    }

    #[test]
    fn test_odd_period_high_half_is_longer() {
        let mut clock = ClockSource::new(5, 0).unwrap();
        assert_eq!(
            levels(&mut clock, 5),
            vec![false, false, true, true, true]
        );
    }

    #[test]
    fn test_clock_near_u64_max() {
        let mut clock = ClockSource::new(u64::MAX, u64::MAX - 1).unwrap();
        // Tick 0 sits at position MAX - 1, in the high half
        assert_eq!(levels(&mut clock, 2), vec![true, false]);
        assert!(clock.level_at(u64::MAX - 1));
        assert!(!clock.level_at(u64::MAX / 2));
    }

    #[test]
    fn test_clock_reset() {
        let mut clock = ClockSource::new(2, 0).unwrap();
        levels(&mut clock, 3);
        clock.reset();
        assert_eq!(clock.output(), LOW_LEVEL_VOLT);
        assert_eq!(levels(&mut clock, 2), vec![false, true]);
    }
}
