use std::fmt;

/// Voltage in volts
pub type Volt = f64;

/// Simulated time; one tick of the simulation is one nanosecond
pub type Nanoseconds = i64;

/// Which side of a gate a pin index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PinDirection {
    Input,
    Output,
}

impl PinDirection {
    pub fn to_str(&self) -> &'static str {
        match self {
            PinDirection::Input => "input",
            PinDirection::Output => "output",
        }
    }

    pub fn to_char(&self) -> char {
        match self {
            PinDirection::Input => 'I',
            PinDirection::Output => 'O',
        }
    }
}

impl fmt::Display for PinDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

/// Kind of entry in the shared network namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameKind {
    Input,
    Output,
    Gate,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NameKind::Input => "input",
            NameKind::Output => "output",
            NameKind::Gate => "gate",
        };
        write!(f, "{}", s)
    }
}
