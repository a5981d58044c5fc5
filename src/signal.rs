//! # Signal conversion
//!
//! Conversion between line voltages and logic levels, the propagation-delay
//! filter applied to gate outputs, and noise injection.
//!
//! Voltage to logic conversion uses a deadband around [`HIGH_THRESH_VOLT`]:
//! a voltage inside the band keeps the logic level the same line had in the
//! previous tick. Edge-triggered gates rely on this, a noisy signal sitting
//! near the threshold would otherwise produce spurious edges.

use crate::types::Volt;
use rand::distributions::{Distribution, Uniform};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::fmt;

/// Logic level switching threshold
pub const HIGH_THRESH_VOLT: Volt = 3.3;
/// Width of the band around the threshold in which the logic level is held
pub const DEADBAND_VOLT: Volt = 0.2;
/// Nominal voltage for logic level true
pub const HIGH_LEVEL_VOLT: Volt = 5.0;
/// Nominal voltage for logic level false
pub const LOW_LEVEL_VOLT: Volt = 0.0;
/// Maximum absolute noise voltage
pub const NOISE_ABS_MAX_VOLT: Volt = 0.02;

/// Lowest voltage that reads as true regardless of history
pub const UPPER_SWITCH_VOLT: Volt = HIGH_THRESH_VOLT + DEADBAND_VOLT / 2.0;
/// Voltages below this read as false regardless of history
pub const LOWER_SWITCH_VOLT: Volt = HIGH_THRESH_VOLT - DEADBAND_VOLT / 2.0;

/// Logic level of a single line with hysteresis.
pub fn volt_to_logic(voltage: Volt, previous: bool) -> bool {
    if voltage >= UPPER_SWITCH_VOLT {
        true
    } else if voltage < LOWER_SWITCH_VOLT {
        false
    } else {
        previous
    }
}

/// Logic levels for `voltages`, holding `prev_logic_levels` inside the deadband.
///
/// Both slices describe the same lines and must have the same length.
pub fn voltage_to_logical(voltages: &[Volt], prev_logic_levels: &[bool]) -> Vec<bool> {
    assert_eq!(
        voltages.len(),
        prev_logic_levels.len(),
        "voltage and previous logic level counts differ"
    );
    voltages
        .iter()
        .zip(prev_logic_levels)
        .map(|(&v, &prev)| volt_to_logic(v, prev))
        .collect()
}

pub fn logic_to_volt(level: bool) -> Volt {
    if level {
        HIGH_LEVEL_VOLT
    } else {
        LOW_LEVEL_VOLT
    }
}

/// Nominal voltages for the given logic levels.
pub fn logical_to_volt(logic_levels: &[bool]) -> Vec<Volt> {
    logic_levels.iter().map(|&l| logic_to_volt(l)).collect()
}

/// Propagation-delay filter.
///
/// This is not a delay line. For `delay_ticks > 0` each output follows
/// `out[t] = (raw[t] + (d - 1) * out[t - 1]) / d`, a one-pole low-pass whose
/// time constant is roughly `d` ticks. It needs only the previous output as
/// state. A delay of zero passes `raw` through.
pub fn apply_propagation_delay(raw: &[Volt], previous: &[Volt], delay_ticks: u32) -> Vec<Volt> {
    if delay_ticks == 0 {
        return raw.to_vec();
    }
    assert_eq!(raw.len(), previous.len(), "output counts differ");
    let d = f64::from(delay_ticks);
    raw.iter()
        .zip(previous)
        .map(|(&r, &p)| (r + (d - 1.0) * p) / d)
        .collect()
}

/// Source of additive noise samples.
///
/// Each network owns one source; gates draw from it while stepping. Keeping
/// it owned (rather than process-global) makes runs reproducible.
pub trait NoiseSource: fmt::Debug + Send {
    /// Next noise sample in volts.
    fn sample(&mut self) -> Volt;

    /// Restarts the sample sequence from its beginning.
    fn rewind(&mut self) {}

    fn clone_box(&self) -> Box<dyn NoiseSource>;
}

impl Clone for Box<dyn NoiseSource> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Adds one independent noise sample to every voltage.
pub fn apply_noise(voltages: &mut [Volt], noise: &mut dyn NoiseSource) {
    for v in voltages.iter_mut() {
        *v += noise.sample();
    }
}

/// Noise that is always zero. Used for deterministic logic-level testing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NoNoise;

impl NoiseSource for NoNoise {
    fn sample(&mut self) -> Volt {
        0.0
    }

    fn clone_box(&self) -> Box<dyn NoiseSource> {
        Box::new(*self)
    }
}

/// Uniformly distributed noise in `[-amplitude, +amplitude]` from a seedable
/// ChaCha generator.
#[derive(Debug, Clone)]
pub struct UniformNoise {
    rng: ChaCha8Rng,
    distribution: Uniform<Volt>,
}

impl UniformNoise {
    pub fn new(seed: u64) -> Self {
        Self::with_amplitude(seed, NOISE_ABS_MAX_VOLT)
    }

    pub fn with_amplitude(seed: u64, amplitude: Volt) -> Self {
        let amplitude = amplitude.abs();
        UniformNoise {
            rng: ChaCha8Rng::seed_from_u64(seed),
            distribution: Uniform::new_inclusive(-amplitude, amplitude),
        }
    }

    /// Seeded from the operating system; runs are not reproducible.
    pub fn from_entropy() -> Self {
        UniformNoise {
            rng: ChaCha8Rng::from_entropy(),
            distribution: Uniform::new_inclusive(-NOISE_ABS_MAX_VOLT, NOISE_ABS_MAX_VOLT),
        }
    }
}

impl NoiseSource for UniformNoise {
    fn sample(&mut self) -> Volt {
        self.distribution.sample(&mut self.rng)
    }

    fn rewind(&mut self) {
        self.rng.set_word_pos(0);
    }

    fn clone_box(&self) -> Box<dyn NoiseSource> {
        Box::new(self.clone())
    }
}
