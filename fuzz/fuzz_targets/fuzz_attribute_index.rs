#![no_main]
use libfuzzer_sys::fuzz_target;
use xdoc::Document;

// Each input byte pair becomes one attribute key; the index must stay a
// valid red-black tree and keep the first value for repeated keys.
fuzz_target!(|data: &[u8]| {
    let mut doc = Document::new();
    let element = doc.create_element("e");
    let mut inserted = std::collections::BTreeMap::new();

    for (n, pair) in data.chunks(2).enumerate() {
        let key: String = pair.iter().map(|b| format!("{b:02x}")).collect();
        match doc.add_attribute(element, key.clone()) {
            Ok(attr) => {
                doc.set_attribute_value(attr, n.to_string());
                assert!(inserted.insert(key, n.to_string()).is_none());
            }
            Err(existing) => {
                assert_eq!(doc.attribute(existing).key(), key);
                assert!(inserted.contains_key(&key));
            }
        }
        if let Err(e) = doc.verify_attribute_index(element) {
            panic!("red-black invariant violated: {e}");
        }
    }

    let walked: Vec<(&str, &str)> = doc
        .attributes(element)
        .map(|a| (a.key(), a.value()))
        .collect();
    let expected: Vec<(&str, &str)> = inserted
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    assert_eq!(walked, expected);
});
