#![no_main]

use libfuzzer_sys::fuzz_target;

use infrastructure::config::AgentConfig;

// Arbitrary YAML through deserialization and every section's validate().
// Must return Ok or Err, never panic. Sanitizing a valid config must not
// panic either.
fuzz_target!(|data: &[u8]| {
    let Ok(yaml) = std::str::from_utf8(data) else {
        return;
    };
    if yaml.len() > 64 * 1024 {
        return;
    }
    if let Ok(config) = AgentConfig::from_yaml(yaml) {
        let _ = config.sanitized();
    }
});
