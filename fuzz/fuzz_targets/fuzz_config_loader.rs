#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not.
    if let Ok(cfg) = tripmode_config::load_toml(data) {
        if cfg.validate().is_ok() {
            // A validated config must yield a usable geometry.
            assert!(cfg.expected_count() > cfg.window.slack);
            assert!(cfg.buffer_capacity() >= cfg.expected_count() * 2);
        }
    }
    let _ = tripmode_config::parse_norm_params(data);
});
