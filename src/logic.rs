//! # Gate logic catalog
//!
//! The predefined gate logics. Each one fixes the number of inputs and
//! outputs, a name, and a Boolean transfer function that maps the current
//! input levels, the previous input levels and the previous output levels to
//! new output levels. Having the previous levels available is what lets the
//! flip-flops detect edges and hold state.
//!
//! | Logic | Inputs | Outputs | Function |
//! |-------|--------|---------|----------|
//! | AND2  | 2 | 1 | `OUT0 = IN0 & IN1` |
//! | OR2   | 2 | 1 | `OUT0 = IN0 \| IN1` |
//! | NOT1  | 1 | 1 | `OUT0 = !IN0` |
//! | BUF1  | 2 | 1 | `OUT0 = IN0`, IN1 is declared but not read |
//! | TFF   | 1 | 1 | toggles on a rising edge of IN0 |
//! | DFF   | 2 | 1 | `OUT0 = IN0` on a rising edge of IN1, else hold |

use crate::error::GateLogicError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateLogic {
    #[serde(rename = "AND2")]
    And2,
    #[serde(rename = "OR2")]
    Or2,
    #[serde(rename = "NOT1")]
    Not1,
    #[serde(rename = "BUF1")]
    Buf1,
    #[serde(rename = "TFF")]
    Tff,
    #[serde(rename = "DFF")]
    Dff,
}

/// True for a false -> true transition between two consecutive ticks.
pub fn rising_edge(previous: bool, current: bool) -> bool {
    !previous && current
}

impl GateLogic {
    pub const ALL: [GateLogic; 6] = [
        GateLogic::And2,
        GateLogic::Or2,
        GateLogic::Not1,
        GateLogic::Buf1,
        GateLogic::Tff,
        GateLogic::Dff,
    ];

    /// Logic used for names that are not in the catalog.
    pub const FALLBACK: GateLogic = GateLogic::Buf1;

    pub fn name(&self) -> &'static str {
        match self {
            GateLogic::And2 => "AND2",
            GateLogic::Or2 => "OR2",
            GateLogic::Not1 => "NOT1",
            GateLogic::Buf1 => "BUF1",
            GateLogic::Tff => "TFF",
            GateLogic::Dff => "DFF",
        }
    }

    pub fn input_count(&self) -> usize {
        match self {
            GateLogic::Not1 | GateLogic::Tff => 1,
            GateLogic::And2 | GateLogic::Or2 | GateLogic::Buf1 | GateLogic::Dff => 2,
        }
    }

    pub fn output_count(&self) -> usize {
        1
    }

    pub fn from_name(name: &str) -> Option<GateLogic> {
        GateLogic::ALL.into_iter().find(|logic| logic.name() == name)
    }

    /// Like [`GateLogic::from_name`] but maps unknown names to
    /// [`GateLogic::FALLBACK`].
    pub fn from_name_or_fallback(name: &str) -> GateLogic {
        GateLogic::from_name(name).unwrap_or_else(|| {
            tracing::warn!(
                "unknown gate logic {}, defaulting to {}",
                name,
                GateLogic::FALLBACK
            );
            GateLogic::FALLBACK
        })
    }

    /// Verifies the argument lengths of [`GateLogic::outputs_for`].
    pub fn check_dimensions(
        &self,
        inputs: &[bool],
        prev_inputs: &[bool],
        prev_outputs: &[bool],
    ) -> Result<(), GateLogicError> {
        let checks = [
            ("inputs", self.input_count(), inputs.len()),
            ("previous inputs", self.input_count(), prev_inputs.len()),
            ("previous outputs", self.output_count(), prev_outputs.len()),
        ];
        for (what, expected, actual) in checks {
            if expected != actual {
                return Err(GateLogicError::DimensionMismatch {
                    logic: self.name(),
                    what,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Boolean transfer function.
    ///
    /// # Panics
    ///
    /// If any slice length differs from the declared input or output count.
    /// Gates always pass correctly sized buffers, so a mismatch is a bug in
    /// the caller.
    pub fn outputs_for(
        &self,
        inputs: &[bool],
        prev_inputs: &[bool],
        prev_outputs: &[bool],
    ) -> Vec<bool> {
        if let Err(e) = self.check_dimensions(inputs, prev_inputs, prev_outputs) {
            panic!("{}", e);
        }

        let out0 = match self {
            GateLogic::And2 => inputs[0] && inputs[1],
            GateLogic::Or2 => inputs[0] || inputs[1],
            GateLogic::Not1 => !inputs[0],
            GateLogic::Buf1 => inputs[0],
            GateLogic::Tff => {
                if rising_edge(prev_inputs[0], inputs[0]) {
                    !prev_outputs[0]
                } else {
                    prev_outputs[0]
                }
            }
            GateLogic::Dff => {
                // IN1 is the clock, IN0 the data
                if rising_edge(prev_inputs[1], inputs[1]) {
                    inputs[0]
                } else {
                    prev_outputs[0]
                }
            }
        };
        vec![out0]
    }
}

impl fmt::Display for GateLogic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for GateLogic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GateLogic::from_name(s).ok_or_else(|| format!("Unknown gate logic: {}", s))
    }
}
