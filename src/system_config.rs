//! # JSON network descriptions
//!
//! A [`NetworkConfig`] describes a network by name, propagation delay,
//! input/output names, gates and connections, plus an optional testbed
//! stimulus. [`NetworkConfig::build`] turns it into a [`Network`] through the
//! regular builder methods, so a description gets exactly the same checks as
//! hand-written construction code.
//!
//! ## File format
//!
//! ```json
//! {
//!   "name": "AND test",
//!   "propagation_delay": 0,
//!   "inputs": ["A", "B"],
//!   "outputs": ["Q"],
//!   "gates": [{"name": "G", "logic": "AND2"}],
//!   "connections": [
//!     {"from": {"kind": "network-input", "name": "A"},
//!      "to": [{"kind": "gate", "name": "G", "pin": 0}]},
//!     {"from": {"kind": "network-input", "name": "B"},
//!      "to": [{"kind": "gate", "name": "G", "pin": 1}]},
//!     {"from": {"kind": "gate", "name": "G", "pin": 0},
//!      "to": [{"kind": "network-output", "name": "Q"}]}
//!   ],
//!   "stimulus": {
//!     "ticks": 20,
//!     "sources": {
//!       "A": {"type": "constant", "voltage": 5.0},
//!       "B": {"type": "clock", "period": 10, "phase": 0}
//!     }
//!   }
//! }
//! ```

use crate::error::ConfigError;
use crate::logic::GateLogic;
use crate::network::Network;
use crate::pin::Pin;
use crate::signal::UniformNoise;
use crate::testbed::Testbed;
use crate::types::{Nanoseconds, Volt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Default number of ticks when a description has no stimulus tick count.
pub const DEFAULT_TICKS: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub propagation_delay: Nanoseconds,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub gates: Vec<GateConfig>,
    #[serde(default)]
    pub connections: Vec<ConnectionConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stimulus: Option<StimulusConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateConfig {
    pub name: String,
    /// Catalog name; unknown names build a BUF1.
    pub logic: String,
}

/// One source endpoint and all endpoints it drives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub from: Endpoint,
    pub to: Vec<Endpoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Endpoint {
    NetworkInput {
        name: String,
    },
    NetworkOutput {
        name: String,
    },
    Gate {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pin: Option<usize>,
    },
}

impl Endpoint {
    pub fn gate(pin: &Pin) -> Self {
        Endpoint::Gate {
            name: pin.gate_name().to_string(),
            pin: Some(pin.index()),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::NetworkInput { name } => write!(f, "input {}", name),
            Endpoint::NetworkOutput { name } => write!(f, "output {}", name),
            Endpoint::Gate {
                name,
                pin: Some(pin),
            } => write!(f, "gate {}[{}]", name, pin),
            Endpoint::Gate { name, pin: None } => write!(f, "gate {}", name),
        }
    }
}

/// Testbed stimulus: one source per network input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StimulusConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticks: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub sources: BTreeMap<String, SourceConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SourceConfig {
    Constant {
        voltage: Volt,
    },
    Clock {
        period: u64,
        #[serde(default)]
        phase: u64,
    },
}

impl StimulusConfig {
    /// Attaches every configured source to `testbed`.
    pub fn apply(&self, testbed: &mut Testbed) -> Result<(), ConfigError> {
        for (input, source) in &self.sources {
            match *source {
                SourceConfig::Constant { voltage } => {
                    testbed.add_constant_source(input, voltage)?
                }
                SourceConfig::Clock { period, phase } => {
                    testbed.add_clock_source(input, period, phase)?
                }
            }
        }
        Ok(())
    }
}

impl NetworkConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        tracing::debug!("loaded network description from {}", path.display());
        Self::from_json_str(&content)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json_string()?).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Builds the network: inputs, outputs and gates in listed order, then
    /// every connection. The first failing builder call aborts the build.
    pub fn build(&self) -> Result<Network, ConfigError> {
        let mut network = Network::new(&self.name, self.propagation_delay)?;
        for input in &self.inputs {
            network.add_input(input)?;
        }
        for output in &self.outputs {
            network.add_output(output)?;
        }
        for gate in &self.gates {
            network.add_gate(&gate.name, GateLogic::from_name_or_fallback(&gate.logic))?;
        }
        for connection in &self.connections {
            for to in &connection.to {
                connect(&mut network, &connection.from, to)?;
            }
        }
        tracing::info!(
            network = %network.name(),
            "built network with {} inputs, {} outputs, {} gates",
            self.inputs.len(),
            self.outputs.len(),
            self.gates.len()
        );
        Ok(network)
    }

    /// Builds the network and a testbed carrying the stimulus sources. A
    /// stimulus seed makes the network's noise reproducible.
    pub fn build_testbed(&self) -> Result<Testbed, ConfigError> {
        let mut network = self.build()?;
        if let Some(seed) = self.seed() {
            network.set_noise(Box::new(UniformNoise::new(seed)));
        }
        let mut testbed = Testbed::new(network);
        if let Some(stimulus) = &self.stimulus {
            stimulus.apply(&mut testbed)?;
        }
        Ok(testbed)
    }

    pub fn ticks(&self) -> u64 {
        self.stimulus
            .as_ref()
            .and_then(|s| s.ticks)
            .unwrap_or(DEFAULT_TICKS)
    }

    pub fn seed(&self) -> Option<u64> {
        self.stimulus.as_ref().and_then(|s| s.seed)
    }

    /// Describes an existing network. The result has no stimulus.
    pub fn from_network(network: &Network) -> Self {
        let gates = network
            .gates()
            .map(|gate| GateConfig {
                name: gate.name().to_string(),
                logic: gate.logic_name().to_string(),
            })
            .collect();

        let mut connections = Vec::new();
        for (input, pins) in network.input_connections() {
            if !pins.is_empty() {
                connections.push(ConnectionConfig {
                    from: Endpoint::NetworkInput {
                        name: input.clone(),
                    },
                    to: pins.iter().map(Endpoint::gate).collect(),
                });
            }
        }
        for (source, dests) in network.gate_connections() {
            connections.push(ConnectionConfig {
                from: Endpoint::gate(source),
                to: dests.iter().map(Endpoint::gate).collect(),
            });
        }
        for (output, pin) in network.output_connections() {
            if let Some(pin) = pin {
                connections.push(ConnectionConfig {
                    from: Endpoint::gate(pin),
                    to: vec![Endpoint::NetworkOutput {
                        name: output.clone(),
                    }],
                });
            }
        }

        NetworkConfig {
            name: network.name().to_string(),
            description: String::new(),
            propagation_delay: Nanoseconds::from(network.propagation_delay()),
            inputs: network.input_names(),
            outputs: network.output_names(),
            gates,
            connections,
            stimulus: None,
        }
    }

    pub fn with_stimulus(mut self, stimulus: StimulusConfig) -> Self {
        self.stimulus = Some(stimulus);
        self
    }
}

fn connect(network: &mut Network, from: &Endpoint, to: &Endpoint) -> Result<(), ConfigError> {
    let invalid = |reason| {
        let err = ConfigError::InvalidConnection {
            from: from.to_string(),
            to: to.to_string(),
            reason,
        };
        tracing::warn!("{}", err);
        err
    };

    match (from, to) {
        (Endpoint::NetworkOutput { .. }, _) => Err(invalid("a network output cannot drive anything")),
        (_, Endpoint::NetworkInput { .. }) => Err(invalid("a network input cannot be driven")),
        (Endpoint::Gate { pin: None, .. }, _) | (_, Endpoint::Gate { pin: None, .. }) => {
            Err(invalid("gate endpoints need a pin index"))
        }
        (Endpoint::NetworkInput { .. }, Endpoint::NetworkOutput { .. }) => {
            Err(invalid("a network input cannot drive a network output directly"))
        }
        (
            Endpoint::NetworkInput { name: input },
            Endpoint::Gate {
                name: gate,
                pin: Some(pin),
            },
        ) => Ok(network.connect_input(input, gate, *pin)?),
        (
            Endpoint::Gate {
                name: gate,
                pin: Some(pin),
            },
            Endpoint::NetworkOutput { name: output },
        ) => Ok(network.connect_output(output, gate, *pin)?),
        (
            Endpoint::Gate {
                name: out_gate,
                pin: Some(out_pin),
            },
            Endpoint::Gate {
                name: in_gate,
                pin: Some(in_pin),
            },
        ) => Ok(network.connect_gates(out_gate, *out_pin, in_gate, *in_pin)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{NetworkError, TestbedError};

    const AND_JSON: &str = r#"{
        "name": "AND test",
        "propagation_delay": 0,
        "inputs": ["A", "B"],
        "outputs": ["Q"],
        "gates": [{"name": "G", "logic": "AND2"}],
        "connections": [
            {"from": {"kind": "network-input", "name": "A"},
             "to": [{"kind": "gate", "name": "G", "pin": 0}]},
            {"from": {"kind": "network-input", "name": "B"},
             "to": [{"kind": "gate", "name": "G", "pin": 1}]},
            {"from": {"kind": "gate", "name": "G", "pin": 0},
             "to": [{"kind": "network-output", "name": "Q"}]}
        ],
        "stimulus": {
            "ticks": 20,
            "sources": {
                "A": {"type": "constant", "voltage": 5.0},
                "B": {"type": "clock", "period": 10}
            }
        }
    }"#;

    fn endpoint_config(from: Endpoint, to: Endpoint) -> NetworkConfig {
        NetworkConfig {
            name: "n".to_string(),
            description: String::new(),
            propagation_delay: 0,
            inputs: vec!["A".to_string()],
            outputs: vec!["Q".to_string()],
            gates: vec![GateConfig {
                name: "G".to_string(),
                logic: "NOT1".to_string(),
            }],
            connections: vec![ConnectionConfig { from, to: vec![to] }],
            stimulus: None,
        }
    }

    #[test]
    fn test_parse_and_build() {
        let config = NetworkConfig::from_json_str(AND_JSON).unwrap();
        assert_eq!(config.ticks(), 20);
        assert_eq!(config.seed(), None);
        assert_eq!(
            config.stimulus.as_ref().unwrap().sources["B"],
            SourceConfig::Clock {
                period: 10,
                phase: 0
            }
        );

        let network = config.build().unwrap();
        assert!(network.consistent());
        assert_eq!(network.gate("G").unwrap().logic(), GateLogic::And2);
        assert_eq!(network.output_connections()["Q"], Some(Pin::new("G", 0)));
    }

    #[test]
    fn test_unknown_logic_falls_back_to_buf1() {
        let mut config = NetworkConfig::from_json_str(AND_JSON).unwrap();
        config.gates[0].logic = "XOR2".to_string();
        let network = config.build().unwrap();
        assert_eq!(network.gate("G").unwrap().logic(), GateLogic::Buf1);
    }

    #[test]
    fn test_invalid_endpoints() {
        let input = Endpoint::NetworkInput {
            name: "A".to_string(),
        };
        let output = Endpoint::NetworkOutput {
            name: "Q".to_string(),
        };
        let pinless = Endpoint::Gate {
            name: "G".to_string(),
            pin: None,
        };

        for (from, to) in [
            (input.clone(), output.clone()),
            (output.clone(), input.clone()),
            (input, pinless.clone()),
            (pinless, output),
        ] {
            let err = endpoint_config(from, to).build().unwrap_err();
            assert!(matches!(err, ConfigError::InvalidConnection { .. }));
        }
    }

    #[test]
    fn test_builder_errors_propagate() {
        let config = endpoint_config(
            Endpoint::NetworkInput {
                name: "A".to_string(),
            },
            Endpoint::Gate {
                name: "G".to_string(),
                pin: Some(1),
            },
        );
        assert!(matches!(
            config.build(),
            Err(ConfigError::Network(NetworkError::PinOutOfRange { .. }))
        ));

        let mut config = NetworkConfig::from_json_str(AND_JSON).unwrap();
        config.propagation_delay = -1;
        assert!(matches!(
            config.build(),
            Err(ConfigError::Network(NetworkError::NegativePropagationDelay(-1)))
        ));

        let json = AND_JSON.replacen(
            "\"propagation_delay\": 0",
            "\"propagation_delay\": 10000000000",
            1,
        );
        let config = NetworkConfig::from_json_str(&json).unwrap();
        assert_eq!(config.propagation_delay, 10_000_000_000);
        assert!(matches!(
            config.build(),
            Err(ConfigError::Network(NetworkError::PropagationDelayTooLarge(
                10_000_000_000
            )))
        ));
    }

    #[test]
    fn test_description_of_built_network_rebuilds() {
        let config = NetworkConfig::from_json_str(AND_JSON).unwrap();
        let network = config.build().unwrap();
        let described = NetworkConfig::from_network(&network);

        assert_eq!(described.inputs, config.inputs);
        assert_eq!(described.gates, config.gates);
        assert!(described.stimulus.is_none());

        let json = described.to_json_string().unwrap();
        let rebuilt = NetworkConfig::from_json_str(&json).unwrap().build().unwrap();
        assert_eq!(rebuilt.input_connections(), network.input_connections());
        assert_eq!(rebuilt.output_connections(), network.output_connections());
        assert_eq!(rebuilt.gate_connections(), network.gate_connections());
    }

    #[test]
    fn test_stimulus_for_unknown_input() {
        let mut config = NetworkConfig::from_json_str(AND_JSON).unwrap();
        if let Some(stimulus) = config.stimulus.as_mut() {
            stimulus
                .sources
                .insert("Z".to_string(), SourceConfig::Constant { voltage: 0.0 });
        }
        assert!(matches!(
            config.build_testbed(),
            Err(ConfigError::Testbed(TestbedError::UnknownInput(_)))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = NetworkConfig::from_json_file("/nonexistent/network.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
