use super::SignalSource;
use crate::types::Volt;

/// Holds one voltage forever.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantSource {
    voltage: Volt,
}

impl ConstantSource {
    pub fn new(voltage: Volt) -> Self {
        ConstantSource { voltage }
    }
}

impl SignalSource for ConstantSource {
    fn simulation_step(&mut self) {}

    fn output(&self) -> Volt {
        self.voltage
    }

    fn reset(&mut self) {}

    fn describe(&self) -> String {
        format!("constant {:.2} V", self.voltage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_source() {
        let mut source = ConstantSource::new(5.0);
        assert_eq!(source.output(), 5.0);
        for _ in 0..10 {
            source.simulation_step();
            assert_eq!(source.output(), 5.0);
        }
        assert_eq!(source.describe(), "constant 5.00 V");
    }
}
