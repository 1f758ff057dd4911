#![no_main]

use libfuzzer_sys::fuzz_target;
use mutcheck_core::{VersionTriple, check_minimum, parse_version};

fuzz_target!(|data: &[u8]| {
    // Convert bytes to UTF-8 string (ignore invalid UTF-8)
    if let Ok(s) = std::str::from_utf8(data) {
        let lenient = parse_version(s);
        // Whatever the strict parser accepts, the lenient one must agree with.
        if let Ok(strict) = s.parse::<VersionTriple>() {
            assert_eq!(strict, parse_version(s.trim()));
        }
        let minimum = VersionTriple::new(1, 8, 0);
        assert_eq!(check_minimum("libcst", s, minimum).is_ok(), lenient >= minimum);
    }
});
