//! Reference circuits with matching testbed stimulus.

use crate::error::NetworkError;
use crate::logic::GateLogic;
use crate::network::Network;
use crate::system_config::{SourceConfig, StimulusConfig};
use std::collections::BTreeMap;

/// A single AND2 gate: `Q = A & B`, no propagation delay.
pub fn and_gate() -> Result<Network, NetworkError> {
    let mut net = Network::new("AND2", 0)?;
    net.add_input("A")?;
    net.add_input("B")?;
    net.add_output("Q")?;
    net.add_gate("and", GateLogic::And2)?;
    net.connect_input("A", "and", 0)?;
    net.connect_input("B", "and", 1)?;
    net.connect_output("Q", "and", 0)?;
    Ok(net)
}

/// 1-to-2 demultiplexer: enable `E` is routed to `Q0` while select `S` is
/// low and to `Q1` while it is high.
pub fn demux_1_to_2() -> Result<Network, NetworkError> {
    let mut net = Network::new("1-to-2 demux", 7)?;
    net.add_input("S")?;
    net.add_input("E")?;
    net.add_output("Q0")?;
    net.add_output("Q1")?;
    net.add_gate("and0", GateLogic::And2)?;
    net.add_gate("and1", GateLogic::And2)?;
    net.add_gate("not_s", GateLogic::Not1)?;

    net.connect_input("S", "not_s", 0)?;
    net.connect_input("E", "and0", 0)?;
    net.connect_gates("not_s", 0, "and0", 1)?;
    net.connect_input("E", "and1", 0)?;
    net.connect_input("S", "and1", 1)?;
    net.connect_output("Q0", "and0", 0)?;
    net.connect_output("Q1", "and1", 0)?;
    Ok(net)
}

/// Four DFFs in a chain sharing one clock. `D` is shifted into `Q0` on
/// every rising edge of `CLK`, `Q0` into `Q1` and so on.
pub fn shift_register_4bit() -> Result<Network, NetworkError> {
    let mut net = Network::new("4-bit shift register", 5)?;
    net.add_input("D")?;
    net.add_input("CLK")?;
    for i in 0..4 {
        net.add_gate(&format!("dff{}", i), GateLogic::Dff)?;
        net.add_output(&format!("Q{}", i))?;
    }

    net.connect_input("D", "dff0", 0)?;
    for i in 0..4 {
        let gate = format!("dff{}", i);
        net.connect_input("CLK", &gate, 1)?;
        net.connect_output(&format!("Q{}", i), &gate, 0)?;
        if i > 0 {
            net.connect_gates(&format!("dff{}", i - 1), 0, &gate, 0)?;
        }
    }
    Ok(net)
}

/// Two chained TFFs: `Q0` runs at half and `Q1` at a quarter of the `CLK`
/// frequency.
pub fn toggle_divider() -> Result<Network, NetworkError> {
    let mut net = Network::new("toggle divider", 2)?;
    net.add_input("CLK")?;
    net.add_output("Q0")?;
    net.add_output("Q1")?;
    net.add_gate("tff0", GateLogic::Tff)?;
    net.add_gate("tff1", GateLogic::Tff)?;
    net.connect_input("CLK", "tff0", 0)?;
    net.connect_gates("tff0", 0, "tff1", 0)?;
    net.connect_output("Q0", "tff0", 0)?;
    net.connect_output("Q1", "tff1", 0)?;
    Ok(net)
}

/// The built-in circuits by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Demo {
    And,
    Demux,
    ShiftRegister,
    Divider,
}

impl Demo {
    pub const ALL: [Demo; 4] = [Demo::And, Demo::Demux, Demo::ShiftRegister, Demo::Divider];

    pub fn name(&self) -> &'static str {
        match self {
            Demo::And => "and",
            Demo::Demux => "demux",
            Demo::ShiftRegister => "shift-register",
            Demo::Divider => "divider",
        }
    }

    pub fn network(&self) -> Result<Network, NetworkError> {
        match self {
            Demo::And => and_gate(),
            Demo::Demux => demux_1_to_2(),
            Demo::ShiftRegister => shift_register_4bit(),
            Demo::Divider => toggle_divider(),
        }
    }

    /// Sources and run length that show the circuit's behavior.
    pub fn stimulus(&self) -> StimulusConfig {
        let clock = |period| SourceConfig::Clock { period, phase: 0 };
        let (ticks, sources) = match self {
            Demo::And => (200, vec![("A", clock(100)), ("B", clock(50))]),
            Demo::Demux => (1000, vec![("S", clock(500)), ("E", clock(120))]),
            Demo::ShiftRegister => (1000, vec![("CLK", clock(100)), ("D", clock(133))]),
            Demo::Divider => (400, vec![("CLK", clock(40))]),
        };
        StimulusConfig {
            ticks: Some(ticks),
            seed: None,
            sources: sources
                .into_iter()
                .map(|(name, source)| (name.to_string(), source))
                .collect::<BTreeMap<_, _>>(),
        }
    }
}

impl std::str::FromStr for Demo {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Demo::ALL
            .into_iter()
            .find(|demo| demo.name() == s)
            .ok_or_else(|| format!("Unknown demo: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_circuits_are_consistent() {
        for demo in Demo::ALL {
            let net = demo.network().unwrap();
            assert!(net.check_consistency().is_consistent(), "{}", demo.name());
        }
    }

    #[test]
    fn test_stimulus_covers_every_input() {
        for demo in Demo::ALL {
            let net = demo.network().unwrap();
            let stimulus = demo.stimulus();
            let sourced: Vec<String> = stimulus.sources.keys().cloned().collect();
            assert_eq!(sourced, net.input_names(), "{}", demo.name());
        }
    }

    #[test]
    fn test_demo_names() {
        for demo in Demo::ALL {
            assert_eq!(demo.name().parse::<Demo>(), Ok(demo));
        }
        assert!("adder".parse::<Demo>().is_err());
    }
}
