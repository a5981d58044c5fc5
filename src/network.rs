//! # Gate network
//!
//! A [`Network`] owns its gates in a name-keyed map and stores all wiring as
//! [`Pin`] values:
//!
//! - network inputs fan out to gate input pins,
//! - gate output pins fan out to gate input pins,
//! - each network output is bound to at most one gate output pin.
//!
//! Inputs, outputs and gates share one namespace. The builder methods check
//! names, pin indices and that every gate input has a single driver; whether
//! the finished topology is complete is answered separately by
//! [`Network::check_consistency`].
//!
//! A simulation step is synchronous: all gate input pins are written from the
//! external inputs and from the outputs the gates committed in the previous
//! tick before any gate computes, so the order in which gates are stepped
//! does not affect the result.

use crate::error::NetworkError;
use crate::gate::Gate;
use crate::logic::GateLogic;
use crate::pin::Pin;
use crate::signal::{NoiseSource, UniformNoise};
use crate::types::{NameKind, Nanoseconds, PinDirection, Volt};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone)]
pub struct Network {
    name: String,
    propagation_delay: u32,
    gates: BTreeMap<String, Gate>,
    input_connections: BTreeMap<String, Vec<Pin>>,
    output_connections: BTreeMap<String, Option<Pin>>,
    gate_connections: BTreeMap<Pin, Vec<Pin>>,
    noise: Box<dyn NoiseSource>,
}

impl Network {
    /// Creates an empty network. Every gate added later inherits
    /// `propagation_delay` (in ticks).
    ///
    /// Noise is drawn from an entropy-seeded [`UniformNoise`]; use
    /// [`Network::with_noise`] for reproducible or noiseless runs.
    pub fn new(
        name: impl Into<String>,
        propagation_delay: Nanoseconds,
    ) -> Result<Self, NetworkError> {
        let name = name.into();
        let ticks = if propagation_delay < 0 {
            Err(NetworkError::NegativePropagationDelay(propagation_delay))
        } else {
            u32::try_from(propagation_delay)
                .map_err(|_| NetworkError::PropagationDelayTooLarge(propagation_delay))
        };
        let propagation_delay = match ticks {
            Ok(ticks) => ticks,
            Err(err) => {
                tracing::warn!(network = %name, "{}", err);
                return Err(err);
            }
        };
        Ok(Network {
            name,
            propagation_delay,
            gates: BTreeMap::new(),
            input_connections: BTreeMap::new(),
            output_connections: BTreeMap::new(),
            gate_connections: BTreeMap::new(),
            noise: Box::new(UniformNoise::from_entropy()),
        })
    }

    pub fn with_noise(mut self, noise: impl NoiseSource + 'static) -> Self {
        self.noise = Box::new(noise);
        self
    }

    pub fn set_noise(&mut self, noise: Box<dyn NoiseSource>) {
        self.noise = noise;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn propagation_delay(&self) -> u32 {
        self.propagation_delay
    }

    pub fn input_names(&self) -> Vec<String> {
        self.input_connections.keys().cloned().collect()
    }

    pub fn output_names(&self) -> Vec<String> {
        self.output_connections.keys().cloned().collect()
    }

    pub fn gate_names(&self) -> Vec<String> {
        self.gates.keys().cloned().collect()
    }

    pub fn gate(&self, name: &str) -> Option<&Gate> {
        self.gates.get(name)
    }

    pub fn gates(&self) -> impl Iterator<Item = &Gate> {
        self.gates.values()
    }

    pub fn input_connections(&self) -> &BTreeMap<String, Vec<Pin>> {
        &self.input_connections
    }

    pub fn output_connections(&self) -> &BTreeMap<String, Option<Pin>> {
        &self.output_connections
    }

    pub fn gate_connections(&self) -> &BTreeMap<Pin, Vec<Pin>> {
        &self.gate_connections
    }

    pub fn has_input(&self, name: &str) -> bool {
        self.input_connections.contains_key(name)
    }

    pub fn add_input(&mut self, name: &str) -> Result<(), NetworkError> {
        self.logged(self.check_name_free(name))?;
        self.input_connections.insert(name.to_string(), Vec::new());
        Ok(())
    }

    pub fn add_output(&mut self, name: &str) -> Result<(), NetworkError> {
        self.logged(self.check_name_free(name))?;
        self.output_connections.insert(name.to_string(), None);
        Ok(())
    }

    pub fn add_gate(&mut self, name: &str, logic: GateLogic) -> Result<(), NetworkError> {
        self.logged(self.check_name_free(name))?;
        self.gates.insert(
            name.to_string(),
            Gate::new(name, logic, self.propagation_delay),
        );
        Ok(())
    }

    /// Adds `gate_name`'s input `pin_index` to the fan-out of network input
    /// `input_name`.
    pub fn connect_input(
        &mut self,
        input_name: &str,
        gate_name: &str,
        pin_index: usize,
    ) -> Result<(), NetworkError> {
        self.logged(self.check_connect_input(input_name, gate_name, pin_index))?;
        if let Some(pins) = self.input_connections.get_mut(input_name) {
            pins.push(Pin::new(gate_name, pin_index));
        }
        Ok(())
    }

    /// Binds network output `output_name` to `gate_name`'s output `pin_index`.
    pub fn connect_output(
        &mut self,
        output_name: &str,
        gate_name: &str,
        pin_index: usize,
    ) -> Result<(), NetworkError> {
        self.logged(self.check_connect_output(output_name, gate_name, pin_index))?;
        self.output_connections
            .insert(output_name.to_string(), Some(Pin::new(gate_name, pin_index)));
        Ok(())
    }

    /// Wires output `out_pin` of `out_gate` to input `in_pin` of `in_gate`.
    pub fn connect_gates(
        &mut self,
        out_gate: &str,
        out_pin: usize,
        in_gate: &str,
        in_pin: usize,
    ) -> Result<(), NetworkError> {
        self.logged(self.check_connect_gates(out_gate, out_pin, in_gate, in_pin))?;
        self.gate_connections
            .entry(Pin::new(out_gate, out_pin))
            .or_insert_with(Vec::new)
            .push(Pin::new(in_gate, in_pin));
        Ok(())
    }

    /// True if a network input or a gate output already drives `pin`.
    pub fn is_input_pin_driven(&self, pin: &Pin) -> bool {
        self.gate_connections
            .values()
            .chain(self.input_connections.values())
            .any(|dests| dests.contains(pin))
    }

    fn logged<T>(&self, result: Result<T, NetworkError>) -> Result<T, NetworkError> {
        if let Err(e) = &result {
            tracing::warn!(network = %self.name, "{}", e);
        }
        result
    }

    fn check_name_free(&self, name: &str) -> Result<(), NetworkError> {
        if name.is_empty() {
            return Err(NetworkError::EmptyName);
        }
        let kind = if self.gates.contains_key(name) {
            Some(NameKind::Gate)
        } else if self.input_connections.contains_key(name) {
            Some(NameKind::Input)
        } else if self.output_connections.contains_key(name) {
            Some(NameKind::Output)
        } else {
            None
        };
        match kind {
            Some(kind) => Err(NetworkError::NameTaken {
                name: name.to_string(),
                kind,
            }),
            None => Ok(()),
        }
    }

    fn check_pin(
        &self,
        gate_name: &str,
        direction: PinDirection,
        index: usize,
    ) -> Result<(), NetworkError> {
        let gate = self
            .gates
            .get(gate_name)
            .ok_or_else(|| NetworkError::UnknownGate(gate_name.to_string()))?;
        let count = match direction {
            PinDirection::Input => gate.input_count(),
            PinDirection::Output => gate.output_count(),
        };
        if index >= count {
            return Err(NetworkError::PinOutOfRange {
                gate: gate_name.to_string(),
                direction,
                index,
                count,
            });
        }
        Ok(())
    }

    fn check_undriven(&self, gate_name: &str, index: usize) -> Result<(), NetworkError> {
        if self.is_input_pin_driven(&Pin::new(gate_name, index)) {
            return Err(NetworkError::InputAlreadyDriven {
                gate: gate_name.to_string(),
                index,
            });
        }
        Ok(())
    }

    fn check_connect_input(
        &self,
        input_name: &str,
        gate_name: &str,
        pin_index: usize,
    ) -> Result<(), NetworkError> {
        if !self.has_input(input_name) {
            return Err(NetworkError::UnknownInput(input_name.to_string()));
        }
        self.check_pin(gate_name, PinDirection::Input, pin_index)?;
        self.check_undriven(gate_name, pin_index)
    }

    fn check_connect_output(
        &self,
        output_name: &str,
        gate_name: &str,
        pin_index: usize,
    ) -> Result<(), NetworkError> {
        match self.output_connections.get(output_name) {
            None => return Err(NetworkError::UnknownOutput(output_name.to_string())),
            Some(Some(_)) => {
                return Err(NetworkError::OutputAlreadyConnected(
                    output_name.to_string(),
                ))
            }
            Some(None) => {}
        }
        self.check_pin(gate_name, PinDirection::Output, pin_index)
    }

    fn check_connect_gates(
        &self,
        out_gate: &str,
        out_pin: usize,
        in_gate: &str,
        in_pin: usize,
    ) -> Result<(), NetworkError> {
        self.check_pin(out_gate, PinDirection::Output, out_pin)?;
        self.check_pin(in_gate, PinDirection::Input, in_pin)?;
        self.check_undriven(in_gate, in_pin)
    }

    /// Advances the whole network by one tick.
    ///
    /// Every declared network input must be present in `inputs`; extra
    /// entries are ignored. If one is missing nothing is touched and
    /// [`NetworkError::MissingInput`] is returned.
    pub fn simulation_step(&mut self, inputs: &BTreeMap<String, Volt>) -> Result<(), NetworkError> {
        if let Some(missing) = self
            .input_connections
            .keys()
            .find(|name| !inputs.contains_key(*name))
        {
            let err = NetworkError::MissingInput(missing.clone());
            tracing::warn!(network = %self.name, "{}", err);
            return Err(err);
        }

        for (name, pins) in &self.input_connections {
            let voltage = inputs[name];
            for pin in pins {
                if let Some(gate) = self.gates.get_mut(pin.gate_name()) {
                    gate.set_input(pin.index(), voltage);
                }
            }
        }

        // Outputs of the previous tick, read before any gate is stepped
        let mut transfers: Vec<(&Pin, Volt)> = Vec::new();
        for (source, dests) in &self.gate_connections {
            let Some(voltage) = self
                .gates
                .get(source.gate_name())
                .and_then(|g| g.output(source.index()))
            else {
                continue;
            };
            transfers.extend(dests.iter().map(|d| (d, voltage)));
        }
        for (dest, voltage) in transfers {
            if let Some(gate) = self.gates.get_mut(dest.gate_name()) {
                gate.set_input(dest.index(), voltage);
            }
        }

        for gate in self.gates.values_mut() {
            gate.simulation_step(self.noise.as_mut());
        }
        Ok(())
    }

    /// Current voltage of every connected network output. Outputs that are
    /// not bound to a gate are left out.
    pub fn outputs(&self) -> BTreeMap<String, Volt> {
        self.output_connections
            .keys()
            .filter_map(|name| self.output(name).map(|v| (name.clone(), v)))
            .collect()
    }

    pub fn output(&self, name: &str) -> Option<Volt> {
        let pin = self.output_connections.get(name)?.as_ref()?;
        self.gates.get(pin.gate_name())?.output(pin.index())
    }

    /// Returns every gate to its power-on state and rewinds the noise
    /// generator. Topology is kept.
    pub fn reset(&mut self) {
        for gate in self.gates.values_mut() {
            gate.reset();
        }
        self.noise.rewind();
    }

    /// Runs every structural check and collects all violations found.
    pub fn check_consistency(&self) -> ConsistencyReport {
        let mut violations = Vec::new();

        if self.input_connections.is_empty() {
            violations.push(Violation::NoInputs);
        }
        if self.output_connections.is_empty() {
            violations.push(Violation::NoOutputs);
        }
        if self.gates.is_empty() {
            violations.push(Violation::NoGates);
        }

        for (name, pins) in &self.input_connections {
            if pins.is_empty() {
                violations.push(Violation::InputNotConnected(name.clone()));
            }
        }

        for (name, pin) in &self.output_connections {
            let bound = pin
                .as_ref()
                .and_then(|p| self.gates.get(p.gate_name()).map(|g| p.index() < g.output_count()))
                .unwrap_or(false);
            if !bound {
                violations.push(Violation::OutputNotConnected(name.clone()));
            }
        }

        let mut drivers: BTreeMap<&Pin, usize> = BTreeMap::new();
        for pin in self
            .gate_connections
            .values()
            .chain(self.input_connections.values())
            .flatten()
        {
            *drivers.entry(pin).or_insert(0) += 1;
        }
        for gate in self.gates.values() {
            for index in 0..gate.input_count() {
                let pin = Pin::new(gate.name(), index);
                let count = drivers.get(&pin).copied().unwrap_or(0);
                if count != 1 {
                    violations.push(Violation::GateInputDriverCount {
                        gate: gate.name().to_string(),
                        index,
                        count,
                    });
                }
            }
        }

        // Every output index is checked on its own, including on multi-output gates
        let used_sources: BTreeSet<&Pin> = self
            .gate_connections
            .keys()
            .chain(self.output_connections.values().flatten())
            .collect();
        for gate in self.gates.values() {
            for index in 0..gate.output_count() {
                if !used_sources.contains(&Pin::new(gate.name(), index)) {
                    violations.push(Violation::GateOutputUnused {
                        gate: gate.name().to_string(),
                        index,
                    });
                }
            }
        }

        ConsistencyReport { violations }
    }

    /// Runs [`Network::check_consistency`], logs every violation and returns
    /// whether the network is consistent.
    pub fn consistent(&self) -> bool {
        let report = self.check_consistency();
        for violation in report.violations() {
            tracing::warn!(network = %self.name, "{}", violation);
        }
        if report.is_consistent() {
            tracing::info!(network = %self.name, "consistency check: OK");
        } else {
            tracing::warn!(
                network = %self.name,
                "consistency check: {} violation(s)",
                report.violations().len()
            );
        }
        report.is_consistent()
    }

    fn gate_label(&self, pin: &Pin, direction: PinDirection) -> String {
        let logic = self
            .gates
            .get(pin.gate_name())
            .map(|g| g.logic_name())
            .unwrap_or("?");
        format!(
            "{} ({}) {}{}",
            pin.gate_name(),
            logic,
            direction.to_char(),
            pin.index()
        )
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Network definition")?;
        writeln!(f, "==================")?;
        writeln!(f)?;
        writeln!(f, "Name: {}", self.name)?;
        writeln!(f, "Propagation delay: {} nsec", self.propagation_delay)?;
        writeln!(f)?;

        writeln!(f, "Inputs")?;
        for (name, pins) in &self.input_connections {
            writeln!(f, "    {}", name)?;
            for pin in pins {
                writeln!(f, "     => {}", self.gate_label(pin, PinDirection::Input))?;
            }
        }
        writeln!(f)?;

        writeln!(f, "Outputs")?;
        for (name, pin) in &self.output_connections {
            match pin {
                Some(pin) => writeln!(
                    f,
                    "    {} => {}",
                    self.gate_label(pin, PinDirection::Output),
                    name
                )?,
                None => writeln!(f, "    (unconnected) => {}", name)?,
            }
        }
        writeln!(f)?;

        writeln!(f, "Gate-to-gate connections")?;
        for (source, dests) in &self.gate_connections {
            for dest in dests {
                writeln!(
                    f,
                    "    {} => {}",
                    self.gate_label(source, PinDirection::Output),
                    self.gate_label(dest, PinDirection::Input)
                )?;
            }
        }
        Ok(())
    }
}

/// One structural defect found by [`Network::check_consistency`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    NoInputs,
    NoOutputs,
    NoGates,
    InputNotConnected(String),
    OutputNotConnected(String),
    GateInputDriverCount {
        gate: String,
        index: usize,
        count: usize,
    },
    GateOutputUnused {
        gate: String,
        index: usize,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::NoInputs => write!(f, "network needs at least one input"),
            Violation::NoOutputs => write!(f, "network needs at least one output"),
            Violation::NoGates => write!(f, "network needs at least one gate"),
            Violation::InputNotConnected(name) => write!(f, "input {} is not connected", name),
            Violation::OutputNotConnected(name) => write!(f, "output {} is not connected", name),
            Violation::GateInputDriverCount { gate, index, count } => write!(
                f,
                "gate {}, input {} must be connected exactly once (have {})",
                gate, index, count
            ),
            Violation::GateOutputUnused { gate, index } => write!(
                f,
                "gate {}, output {} must be connected at least once",
                gate, index
            ),
        }
    }
}

/// Result of a consistency check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsistencyReport {
    violations: Vec<Violation>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn contains(&self, violation: &Violation) -> bool {
        self.violations.contains(violation)
    }
}

impl fmt::Display for ConsistencyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_consistent() {
            return write!(f, "consistency check: OK");
        }
        writeln!(f, "consistency check: erroneous network")?;
        for violation in &self.violations {
            writeln!(f, "  - {}", violation)?;
        }
        Ok(())
    }
}
