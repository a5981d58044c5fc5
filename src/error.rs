//! Error types for network construction, simulation and configuration.

use crate::types::{NameKind, Nanoseconds, PinDirection};

/// Errors raised by the network builder and by [`crate::network::Network::simulation_step`].
///
/// Every builder call that returns one of these leaves the network untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NetworkError {
    #[error("name may not be empty")]
    EmptyName,
    #[error("{kind} with name {name} already exists")]
    NameTaken { name: String, kind: NameKind },
    #[error("input with name {0} does not exist")]
    UnknownInput(String),
    #[error("output with name {0} does not exist")]
    UnknownOutput(String),
    #[error("gate with name {0} does not exist")]
    UnknownGate(String),
    #[error("gate {gate} has only {count} {direction}s (index {index} requested)")]
    PinOutOfRange {
        gate: String,
        direction: PinDirection,
        index: usize,
        count: usize,
    },
    #[error("gate {gate}, input {index} has already been connected")]
    InputAlreadyDriven { gate: String, index: usize },
    #[error("output with name {0} has already been connected")]
    OutputAlreadyConnected(String),
    #[error("propagation delay must be >= 0 (have {0})")]
    NegativePropagationDelay(Nanoseconds),
    #[error("propagation delay must fit in 32 bits (have {0})")]
    PropagationDelayTooLarge(Nanoseconds),
    #[error("input {0} not supplied")]
    MissingInput(String),
}

/// Usage errors of a gate logic transfer function.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateLogicError {
    #[error("{logic}: number of {what} must be {expected} (have {actual})")]
    DimensionMismatch {
        logic: &'static str,
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Errors while loading, saving or building a network description.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to access '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse network description: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid connection {from} -> {to}: {reason}")]
    InvalidConnection {
        from: String,
        to: String,
        reason: &'static str,
    },
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error(transparent)]
    Testbed(#[from] TestbedError),
}

/// Errors while attaching signal sources to a testbed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TestbedError {
    #[error("{0} is not an input of the network under test")]
    UnknownInput(String),
    #[error("input {0} already has a source")]
    SourceExists(String),
    #[error("clock period must be at least 2 ticks (have {0})")]
    ClockPeriodTooShort(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_messages() {
        let err = NetworkError::NameTaken {
            name: "A".to_string(),
            kind: NameKind::Input,
        };
        assert_eq!(err.to_string(), "input with name A already exists");

        let err = NetworkError::PinOutOfRange {
            gate: "G".to_string(),
            direction: PinDirection::Output,
            index: 3,
            count: 1,
        };
        assert_eq!(
            err.to_string(),
            "gate G has only 1 outputs (index 3 requested)"
        );
    }

    #[test]
    fn test_config_error_wraps_network_error() {
        let err: ConfigError = NetworkError::UnknownGate("X".to_string()).into();
        assert_eq!(err.to_string(), "gate with name X does not exist");

        let err: ConfigError = TestbedError::SourceExists("CLK".to_string()).into();
        assert_eq!(err.to_string(), "input CLK already has a source");
    }
}
