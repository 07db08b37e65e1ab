#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(clean) = packvfs::sanitize(text) {
        // Canonical output must be a fixed point and free of rejects.
        assert_eq!(packvfs::sanitize(&clean).as_deref(), Ok(clean.as_str()));
        assert!(!clean.contains(':') && !clean.contains('\\'));
        assert!(!clean.starts_with('/') && !clean.ends_with('/'));
        assert!(!clean.contains("//"));
        assert!(clean.split('/').all(|seg| seg != "." && seg != ".."));
    }
});
