#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data)
        && let Some(name) = rattest_config::find_output_file(s)
    {
        assert!(!name.is_empty());
        assert!(!name.contains('\n'));
    }
});
