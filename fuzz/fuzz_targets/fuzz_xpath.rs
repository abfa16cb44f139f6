#![no_main]
use libfuzzer_sys::fuzz_target;
use xpathoxide::xpath::{parse, ParseCache};

fuzz_target!(|data: &[u8]| {
    if let Ok(expr) = std::str::from_utf8(data) {
        // Parsing should never panic on any expression, and the cache must
        // agree with a direct parse.
        let direct = parse(expr);
        let cached = ParseCache::new(1).get_or_parse(expr);
        match (direct, cached) {
            (Ok(direct), Ok(cached)) => assert_eq!(direct, cached.map(|tree| (*tree).clone())),
            (Err(direct), Err(cached)) => assert_eq!(direct, cached),
            (direct, cached) => panic!("cache disagreed: {direct:?} vs {cached:?}"),
        }
    }
});
