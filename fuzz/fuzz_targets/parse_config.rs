#![no_main]

use libfuzzer_sys::fuzz_target;
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    // Parse as rattest.config - only attempt if valid UTF-8
    if let Ok(s) = std::str::from_utf8(data)
        && let Ok(cfg) = rattest_config::parse_config(s, Path::new("rattest.config"))
    {
        assert!(cfg.ks_threshold > 0.0 && cfg.ks_threshold <= 1.0);
        assert!(cfg.num_macros >= 1);
    }
});
