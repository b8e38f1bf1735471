#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(doc) = rattest_types::ResultsDocument::from_slice(data) {
        for h in doc.objects.values() {
            let _ = h.validate();
            let _ = h.cumulative();
            let _ = h.effective_entries();
        }
    }
});
