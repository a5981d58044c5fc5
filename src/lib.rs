//! # gatesim
//!
//! A discrete-time, voltage-level simulator for networks of digital logic
//! gates. One simulation step is one nanosecond.
//!
//! This library provides:
//! - a closed catalog of gate logics (AND2, OR2, NOT1, BUF1, TFF, DFF)
//! - gates that turn Boolean logic into noisy, delayed voltage traces
//! - a name-keyed network with builder validation and a consistency checker
//! - JSON network descriptions with testbed stimulus
//! - a testbed with constant and clock sources, and a terminal trace viewer

pub mod circuits;
pub mod console;
pub mod error;
pub mod gate;
pub mod logic;
pub mod network;
pub mod pin;
pub mod signal;
pub mod sources;
pub mod system_config;
pub mod testbed;
pub mod types;

// Re-export commonly used items for easier importing
pub use error::{ConfigError, GateLogicError, NetworkError, TestbedError};
pub use gate::Gate;
pub use logic::GateLogic;
pub use network::{ConsistencyReport, Network, Violation};
pub use pin::Pin;
pub use signal::{NoNoise, NoiseSource, UniformNoise};
pub use system_config::NetworkConfig;
pub use testbed::{Testbed, Traces};
pub use types::{Nanoseconds, Volt};
