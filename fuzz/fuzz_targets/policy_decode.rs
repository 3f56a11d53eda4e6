#![no_main]

use libfuzzer_sys::fuzz_target;
use tau_governance::parse_governance_config;

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);
    if let Ok(config) = parse_governance_config(&raw) {
        assert_eq!(config.version, "v1");
    }
});
