#![no_main]
use libfuzzer_sys::fuzz_target;
use xdoc::parser::{parse_bytes_with_options, ParseOptions};

fuzz_target!(|data: &[u8]| {
    for options in [
        ParseOptions::default(),
        ParseOptions::default().load_comments(true),
    ] {
        // Arbitrary bytes must never panic; a parsed tree must be consistent.
        if let Ok(doc) = parse_bytes_with_options(data, &options) {
            let root = doc.root().expect("parsed document has a root");
            assert!(doc.is_element(root));
            for node in std::iter::once(root).chain(doc.descendants(root)) {
                if let Err(e) = doc.verify_attribute_index(node) {
                    panic!("attribute index corrupted: {e}");
                }
                let keys: Vec<&str> = doc.attributes(node).map(|a| a.key()).collect();
                assert!(keys.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }
});
