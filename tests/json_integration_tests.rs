//! JSON-Based Integration Tests
//!
//! Load the network descriptions under `configs/`, build and run them, and
//! write descriptions back out.

use gatesim::circuits::Demo;
use gatesim::signal::{HIGH_LEVEL_VOLT, LOW_LEVEL_VOLT, NOISE_ABS_MAX_VOLT};
use gatesim::system_config::NetworkConfig;
use gatesim::{ConfigError, GateLogic, NoNoise, Violation};
use std::path::PathBuf;

fn config_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("configs")
        .join(name)
}

#[cfg(test)]
mod json_system_tests {
    use super::*;

    #[test]
    fn test_and_gate_description() {
        let config = NetworkConfig::from_json_file(config_path("and_gate.json")).unwrap();
        assert_eq!(config.name, "AND test");
        assert_eq!(config.ticks(), 200);
        assert_eq!(config.seed(), Some(42));

        let mut testbed = config.build_testbed().unwrap();
        assert!(testbed.network().consistent());
        assert!(testbed.unsourced_inputs().is_empty());

        let traces = testbed.run(config.ticks()).unwrap();
        let a = traces.logic_levels("A").unwrap();
        let b = traces.logic_levels("B").unwrap();
        let q = traces.logic_levels("Q").unwrap();
        for t in 0..traces.len() {
            assert_eq!(q[t], a[t] && b[t], "tick {}", t);
        }

        // Noise stays within its amplitude around the rails
        for &v in traces.get("Q").unwrap() {
            let rail = if v > 2.5 { HIGH_LEVEL_VOLT } else { LOW_LEVEL_VOLT };
            assert!((v - rail).abs() <= NOISE_ABS_MAX_VOLT + 1e-12);
        }
    }

    #[test]
    fn test_dff_description() {
        let config = NetworkConfig::from_json_file(config_path("dff_test.json")).unwrap();
        let mut testbed = config.build_testbed().unwrap();
        testbed.network_mut().set_noise(Box::new(NoNoise));
        assert_eq!(testbed.network().propagation_delay(), 5);

        let traces = testbed.run(config.ticks()).unwrap();
        let q = traces.get("Q").unwrap();
        assert!(q[..50].iter().all(|&v| v == LOW_LEVEL_VOLT));
        // Rises monotonically from the first clock edge and never falls back
        assert!(q[50..].windows(2).all(|w| w[1] >= w[0]));
        assert!(q[299] > 4.9);
    }

    #[test]
    fn test_unknown_logic_uses_buf1() {
        let config = NetworkConfig::from_json_file(config_path("fallback_logic.json")).unwrap();
        assert!(config.stimulus.is_none());
        let network = config.build().unwrap();
        assert_eq!(network.gate("g").unwrap().logic(), GateLogic::Buf1);

        // BUF1 declares a second input which is left undriven here
        let report = network.check_consistency();
        assert_eq!(
            report.violations(),
            &[Violation::GateInputDriverCount {
                gate: "g".to_string(),
                index: 1,
                count: 0
            }]
        );
    }

    #[test]
    fn test_malformed_json() {
        let err = NetworkConfig::from_json_str("{\"name\": \"x\"").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));

        let err = NetworkConfig::from_json_str(r#"{"name": "x", "inputs": []}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_export_and_reload_demos() {
        let dir = std::env::temp_dir().join(format!("gatesim-export-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        for demo in Demo::ALL {
            let network = demo.network().unwrap();
            let path = dir.join(format!("{}.json", demo.name()));
            NetworkConfig::from_network(&network)
                .with_stimulus(demo.stimulus())
                .to_json_file(&path)
                .unwrap();

            let reloaded = NetworkConfig::from_json_file(&path).unwrap();
            assert_eq!(reloaded.stimulus, Some(demo.stimulus()));
            let rebuilt = reloaded.build().unwrap();
            assert!(rebuilt.consistent(), "{}", demo.name());
            assert_eq!(rebuilt.to_string(), network.to_string());
        }

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
