//! Signal sources that drive network inputs in a [`crate::testbed::Testbed`].

pub mod clock_source;
pub mod constant_source;

pub use clock_source::ClockSource;
pub use constant_source::ConstantSource;

use crate::types::Volt;
use std::fmt;

/// A generator of one voltage per tick.
///
/// The testbed calls [`SignalSource::simulation_step`] once per tick and then
/// reads [`SignalSource::output`] to build the network's input map.
pub trait SignalSource: fmt::Debug + Send {
    /// Advances the source to the next tick.
    fn simulation_step(&mut self);

    /// Voltage for the current tick.
    fn output(&self) -> Volt;

    /// Returns to the state before the first step.
    fn reset(&mut self);

    fn describe(&self) -> String;
}
