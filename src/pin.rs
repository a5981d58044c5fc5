use serde::{Deserialize, Serialize};
use std::fmt;

/// A gate input or output, identified by the owning gate's name and the
/// port index on that gate.
///
/// Pins are plain values: they are used as map keys and as edge endpoints in
/// the network wiring, never as references into a gate. Ordering is by gate
/// name first, then by index. An unconnected endpoint is expressed as
/// `Option<Pin>::None` rather than a sentinel pin.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pin {
    gate_name: String,
    index: usize,
}

impl Pin {
    pub fn new(gate_name: impl Into<String>, index: usize) -> Self {
        Pin {
            gate_name: gate_name.into(),
            index,
        }
    }

    pub fn gate_name(&self) -> &str {
        &self.gate_name
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.gate_name, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_pin_creation() {
        let pin = Pin::new("G1", 1);
        assert_eq!(pin.gate_name(), "G1");
        assert_eq!(pin.index(), 1);
    }

    #[test]
    fn test_pin_equality() {
        assert_eq!(Pin::new("A", 0), Pin::new("A", 0));
        assert_ne!(Pin::new("A", 0), Pin::new("A", 1));
        assert_ne!(Pin::new("A", 0), Pin::new("B", 0));
    }

    #[test]
    fn test_pin_ordering() {
        // Name dominates, index breaks ties
        assert!(Pin::new("A", 5) < Pin::new("B", 0));
        assert!(Pin::new("A", 0) < Pin::new("A", 1));
        assert!(Pin::new("AB", 0) > Pin::new("A", 9));
    }

    #[test]
    fn test_pin_as_map_key() {
        let mut map = BTreeMap::new();
        map.insert(Pin::new("b", 0), "second");
        map.insert(Pin::new("a", 1), "first");
        map.insert(Pin::new("b", 0), "replaced");

        let keys: Vec<_> = map.keys().map(|p| p.to_string()).collect();
        assert_eq!(keys, vec!["a[1]", "b[0]"]);
        assert_eq!(map[&Pin::new("b", 0)], "replaced");
    }
}
