//! # Testbed
//!
//! Drives a [`Network`] from [`SignalSource`]s and records what happens.
//!
//! Each tick every source is stepped, the source voltages become the
//! network's input map, the network is stepped and its outputs are read. One
//! sample per tick is kept for every network input and output.

use crate::error::{NetworkError, TestbedError};
use crate::network::Network;
use crate::signal::volt_to_logic;
use crate::sources::{ClockSource, ConstantSource, SignalSource};
use crate::types::Volt;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

#[derive(Debug)]
pub struct Testbed {
    network: Network,
    sources: BTreeMap<String, Box<dyn SignalSource>>,
    ticks_run: u64,
}

impl Testbed {
    /// Wraps `network`. An inconsistent network is accepted; the violations
    /// are logged.
    pub fn new(network: Network) -> Self {
        if !network.consistent() {
            tracing::warn!(
                network = %network.name(),
                "network under test is inconsistent, results may be meaningless"
            );
        }
        Testbed {
            network,
            sources: BTreeMap::new(),
            ticks_run: 0,
        }
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut Network {
        &mut self.network
    }

    pub fn ticks_run(&self) -> u64 {
        self.ticks_run
    }

    /// Attaches `source` to network input `input`.
    pub fn add_source(
        &mut self,
        input: &str,
        source: Box<dyn SignalSource>,
    ) -> Result<(), TestbedError> {
        if !self.network.has_input(input) {
            let err = TestbedError::UnknownInput(input.to_string());
            tracing::warn!("{}", err);
            return Err(err);
        }
        if self.sources.contains_key(input) {
            let err = TestbedError::SourceExists(input.to_string());
            tracing::warn!("{}", err);
            return Err(err);
        }
        tracing::debug!("input {} driven by {}", input, source.describe());
        self.sources.insert(input.to_string(), source);
        Ok(())
    }

    pub fn add_constant_source(&mut self, input: &str, voltage: Volt) -> Result<(), TestbedError> {
        self.add_source(input, Box::new(ConstantSource::new(voltage)))
    }

    pub fn add_clock_source(
        &mut self,
        input: &str,
        period: u64,
        phase: u64,
    ) -> Result<(), TestbedError> {
        let clock = ClockSource::new(period, phase).map_err(|e| {
            tracing::warn!("{}", e);
            e
        })?;
        self.add_source(input, Box::new(clock))
    }

    /// Network inputs that have no source attached yet.
    pub fn unsourced_inputs(&self) -> Vec<String> {
        self.network
            .input_names()
            .into_iter()
            .filter(|name| !self.sources.contains_key(name))
            .collect()
    }

    /// Runs `ticks` ticks and returns the recorded traces.
    ///
    /// Fails before the first tick if an input has no source.
    pub fn run(&mut self, ticks: u64) -> Result<Traces, NetworkError> {
        if let Some(missing) = self.unsourced_inputs().into_iter().next() {
            let err = NetworkError::MissingInput(missing);
            tracing::warn!("{}", err);
            return Err(err);
        }

        tracing::info!(
            network = %self.network.name(),
            "running {} ticks from tick {}",
            ticks,
            self.ticks_run
        );

        let mut traces = Traces::new();
        for _ in 0..ticks {
            let mut inputs = BTreeMap::new();
            for (name, source) in self.sources.iter_mut() {
                source.simulation_step();
                inputs.insert(name.clone(), source.output());
            }
            self.network.simulation_step(&inputs)?;

            for (name, voltage) in inputs.into_iter().chain(self.network.outputs()) {
                traces.record(&name, voltage);
            }
            traces.len += 1;
            self.ticks_run += 1;
        }
        Ok(traces)
    }

    /// Resets the network and every source to tick zero. A seeded network
    /// replays the same noise afterwards.
    pub fn reset(&mut self) {
        self.network.reset();
        for source in self.sources.values_mut() {
            source.reset();
        }
        self.ticks_run = 0;
    }
}

/// Per-tick voltage samples, one series per signal name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Traces {
    signals: BTreeMap<String, Vec<Volt>>,
    len: usize,
}

impl Traces {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, name: &str, voltage: Volt) {
        self.signals
            .entry(name.to_string())
            .or_insert_with(Vec::new)
            .push(voltage);
    }

    /// Number of ticks recorded.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.signals.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&[Volt]> {
        self.signals.get(name).map(Vec::as_slice)
    }

    pub fn last(&self, name: &str) -> Option<Volt> {
        self.get(name)?.last().copied()
    }

    /// The trace read back as logic levels with the same hysteresis a gate
    /// input applies, starting from false.
    pub fn logic_levels(&self, name: &str) -> Option<Vec<bool>> {
        let series = self.get(name)?;
        let mut level = false;
        Some(
            series
                .iter()
                .map(|&v| {
                    level = volt_to_logic(v, level);
                    level
                })
                .collect(),
        )
    }

    pub fn to_csv(&self) -> String {
        let mut csv = String::from("tick");
        for name in self.signals.keys() {
            csv.push(',');
            csv.push_str(name);
        }
        csv.push('\n');
        for tick in 0..self.len {
            let _ = write!(csv, "{}", tick);
            for series in self.signals.values() {
                match series.get(tick) {
                    Some(v) => {
                        let _ = write!(csv, ",{:.4}", v);
                    }
                    None => csv.push(','),
                }
            }
            csv.push('\n');
        }
        csv
    }

    pub fn write_csv(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        std::fs::write(path, self.to_csv())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::GateLogic;
    use crate::signal::{NoNoise, UniformNoise, HIGH_LEVEL_VOLT, LOW_LEVEL_VOLT};

    fn inverter() -> Network {
        let mut net = Network::new("inv", 0).unwrap().with_noise(NoNoise);
        net.add_input("A").unwrap();
        net.add_output("Q").unwrap();
        net.add_gate("N", GateLogic::Not1).unwrap();
        net.connect_input("A", "N", 0).unwrap();
        net.connect_output("Q", "N", 0).unwrap();
        net
    }

    #[test]
    fn test_source_validation() {
        let mut bed = Testbed::new(inverter());
        assert_eq!(
            bed.add_constant_source("X", 5.0),
            Err(TestbedError::UnknownInput("X".to_string()))
        );
        assert_eq!(bed.unsourced_inputs(), vec!["A".to_string()]);
        bed.add_constant_source("A", 5.0).unwrap();
        assert_eq!(
            bed.add_clock_source("A", 10, 0),
            Err(TestbedError::SourceExists("A".to_string()))
        );
        assert!(bed.unsourced_inputs().is_empty());
    }

    #[test]
    fn test_run_without_source_fails() {
        let mut bed = Testbed::new(inverter());
        assert_eq!(
            bed.run(5),
            Err(NetworkError::MissingInput("A".to_string()))
        );
        assert_eq!(bed.ticks_run(), 0);
    }

    #[test]
    fn test_run_records_inputs_and_outputs() {
        let mut bed = Testbed::new(inverter());
        bed.add_clock_source("A", 2, 0).unwrap();
        let traces = bed.run(4).unwrap();

        assert_eq!(traces.len(), 4);
        assert_eq!(traces.names().collect::<Vec<_>>(), vec!["A", "Q"]);
        assert_eq!(
            traces.get("A").unwrap(),
            &[LOW_LEVEL_VOLT, HIGH_LEVEL_VOLT, LOW_LEVEL_VOLT, HIGH_LEVEL_VOLT]
        );
        assert_eq!(
            traces.logic_levels("Q").unwrap(),
            vec![true, false, true, false]
        );
        assert_eq!(traces.last("Q"), Some(LOW_LEVEL_VOLT));
        assert_eq!(bed.ticks_run(), 4);
    }

    #[test]
    fn test_csv_layout() {
        let mut bed = Testbed::new(inverter());
        bed.add_constant_source("A", 0.0).unwrap();
        let csv = bed.run(2).unwrap().to_csv();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines, vec!["tick,A,Q", "0,0.0000,5.0000", "1,0.0000,5.0000"]);
    }

    #[test]
    fn test_reset_restarts_from_tick_zero() {
        let mut bed = Testbed::new(inverter());
        bed.add_clock_source("A", 2, 0).unwrap();
        let first = bed.run(3).unwrap();
        bed.reset();
        let second = bed.run(3).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_reset_replays_seeded_noise() {
        let mut bed = Testbed::new(inverter().with_noise(UniformNoise::new(3)));
        bed.add_clock_source("A", 4, 0).unwrap();
        let first = bed.run(12).unwrap();
        bed.reset();
        let second = bed.run(12).unwrap();
        assert_eq!(first, second);
        let q = first.get("Q").unwrap();
        assert!(q.iter().any(|&v| v != HIGH_LEVEL_VOLT && v != LOW_LEVEL_VOLT));
    }
}
