use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::fmt::Write;
use xdoc::parser::{parse_bytes_with_options, ParseOptions};
use xdoc::Document;

// ---------------------------------------------------------------------------
// Document generators
// ---------------------------------------------------------------------------

/// Generates a small document with approximately 10 elements.
fn make_small_xml() -> String {
    let mut xml = String::from("<root>\n");
    for i in 0..10 {
        let _ = writeln!(xml, "  <item id=\"{i}\">Value {i}</item>");
    }
    xml.push_str("</root>\n");
    xml
}

/// Generates a medium document with approximately 400 elements.
fn make_medium_xml() -> String {
    let mut xml = String::from("<catalog>\n");
    for i in 0..100 {
        let _ = writeln!(
            xml,
            "  <book id=\"bk{i}\"><title>Title {i}</title>\
             <author>Author {i}</author>\
             <price>{}.99</price></book>",
            10 + i
        );
    }
    xml.push_str("</catalog>\n");
    xml
}

/// Generates a large document with approximately 4000 elements.
fn make_large_xml() -> String {
    let mut xml = String::from("<database>\n");
    for i in 0..1000 {
        let _ = writeln!(
            xml,
            "  <record id=\"{i}\"><name>Record {i}</name>\
             <value>{}</value><status>active</status></record>",
            i * 42
        );
    }
    xml.push_str("</database>\n");
    xml
}

/// Generates a nested document with the given nesting depth.
fn make_nested_xml(depth: usize) -> String {
    let mut xml = String::new();
    for i in 0..depth {
        let _ = write!(xml, "<level{i}>");
    }
    xml.push_str("leaf");
    for i in (0..depth).rev() {
        let _ = write!(xml, "</level{i}>");
    }
    xml.push('\n');
    xml
}

/// Generates a document where each element has `num_attrs` attributes, in
/// an order that is neither ascending nor descending.
fn make_attr_heavy_xml(num_attrs: usize) -> String {
    let mut xml = String::from("<root>\n");
    for i in 0..10 {
        let _ = write!(xml, "  <element");
        for j in 0..num_attrs {
            let key = (j * 37) % num_attrs;
            let _ = write!(xml, " attr{key}=\"value_{i}_{key}\"");
        }
        xml.push_str("/>\n");
    }
    xml.push_str("</root>\n");
    xml
}

/// Generates a document with a comment between every element.
fn make_commented_xml() -> String {
    let mut xml = String::from("<log>\n");
    for i in 0..500 {
        let _ = writeln!(xml, "  <!-- entry {i} -->\n  <entry n=\"{i}\"/>");
    }
    xml.push_str("</log>\n");
    xml
}

// ---------------------------------------------------------------------------
// Parsing benchmarks
// ---------------------------------------------------------------------------

fn bench_parse_small(c: &mut Criterion) {
    let xml = make_small_xml();
    c.bench_function("parse_small", |b| {
        b.iter(|| Document::parse_str(black_box(&xml)));
    });
}

fn bench_parse_medium(c: &mut Criterion) {
    let xml = make_medium_xml();
    c.bench_function("parse_medium", |b| {
        b.iter(|| Document::parse_str(black_box(&xml)));
    });
}

fn bench_parse_large(c: &mut Criterion) {
    let xml = make_large_xml();
    c.bench_function("parse_large", |b| {
        b.iter(|| Document::parse_str(black_box(&xml)));
    });
}

fn bench_parse_deeply_nested(c: &mut Criterion) {
    let xml = make_nested_xml(200);
    c.bench_function("parse_deeply_nested", |b| {
        b.iter(|| Document::parse_str(black_box(&xml)));
    });
}

fn bench_parse_many_attributes(c: &mut Criterion) {
    let xml = make_attr_heavy_xml(50);
    c.bench_function("parse_many_attributes", |b| {
        b.iter(|| Document::parse_str(black_box(&xml)));
    });
}

fn bench_parse_comments(c: &mut Criterion) {
    let xml = make_commented_xml();
    let skip = ParseOptions::default();
    let keep = ParseOptions::default().load_comments(true);
    c.bench_function("parse_comments_skipped", |b| {
        b.iter(|| parse_bytes_with_options(black_box(xml.as_bytes()), &skip));
    });
    c.bench_function("parse_comments_kept", |b| {
        b.iter(|| parse_bytes_with_options(black_box(xml.as_bytes()), &keep));
    });
}

// ---------------------------------------------------------------------------
// Tree benchmarks
// ---------------------------------------------------------------------------

fn bench_attribute_lookup(c: &mut Criterion) {
    let Ok(doc) = Document::parse_str(&make_attr_heavy_xml(200)) else {
        return;
    };
    let Some(root) = doc.root() else {
        return;
    };
    let keys: Vec<String> = (0..200).map(|j| format!("attr{j}")).collect();
    c.bench_function("attribute_lookup", |b| {
        b.iter(|| {
            let mut found = 0;
            for element in doc.child_elements(root) {
                for key in &keys {
                    if doc.find_attribute(element, black_box(key)).is_some() {
                        found += 1;
                    }
                }
            }
            found
        });
    });
}

fn bench_attribute_insert(c: &mut Criterion) {
    let keys: Vec<String> = (0..1000).map(|j| format!("k{}", (j * 7919) % 1000)).collect();
    c.bench_function("attribute_insert", |b| {
        b.iter(|| {
            let mut doc = Document::new();
            let element = doc.create_element("e");
            for key in &keys {
                let _ = doc.add_attribute(element, key.as_str());
            }
            doc
        });
    });
}

fn bench_navigation(c: &mut Criterion) {
    let Ok(doc) = Document::parse_str(&make_large_xml()) else {
        return;
    };
    let Some(root) = doc.root() else {
        return;
    };
    c.bench_function("navigate_siblings", |b| {
        b.iter(|| {
            let mut count = 0;
            let mut cursor = doc.first_child_element(root);
            while let Some(node) = cursor {
                count += 1;
                cursor = doc.next_sibling_element(node);
            }
            count
        });
    });
    c.bench_function("descendants", |b| {
        b.iter(|| doc.descendants(root).count());
    });
}

// ---------------------------------------------------------------------------
// Criterion groups and main
// ---------------------------------------------------------------------------

criterion_group!(
    parsing,
    bench_parse_small,
    bench_parse_medium,
    bench_parse_large,
    bench_parse_deeply_nested,
    bench_parse_many_attributes,
    bench_parse_comments,
);

criterion_group!(
    tree,
    bench_attribute_lookup,
    bench_attribute_insert,
    bench_navigation
);

criterion_main!(parsing, tree);
