use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use trait_impls_core::{
    discover_chunk_files, load_chunk_file, load_implementors_dir, CapabilityMapping,
    ChunkScriptError, TraitIndex,
};

const DISPLAY_CHUNK: &str = r#"(function() {var implementors = {
"radix_engine":[["impl <a class=\"trait\" href=\"radix_engine/types/prelude/trait.Display.html\" title=\"trait radix_engine::types::prelude::Display\">Display</a> for <a class=\"enum\" href=\"radix_engine/errors/enum.InvokeError.html\" title=\"enum radix_engine::errors::InvokeError\">InvokeError</a>&lt;<a class=\"enum\" href=\"radix_engine/vm/wasm/errors/enum.WasmRuntimeError.html\" title=\"enum radix_engine::vm::wasm::errors::WasmRuntimeError\">WasmRuntimeError</a>&gt;"],["impl <a class=\"trait\" href=\"radix_engine/types/prelude/trait.Display.html\" title=\"trait radix_engine::types::prelude::Display\">Display</a> for <a class=\"enum\" href=\"radix_engine/errors/enum.RuntimeError.html\" title=\"enum radix_engine::errors::RuntimeError\">RuntimeError</a>"]],
"scrypto":[["impl&lt;V: <a class=\"trait\" href=\"scrypto/data/scrypto/trait.ScryptoEncode.html\" title=\"trait scrypto::data::scrypto::ScryptoEncode\">ScryptoEncode</a>&gt; <a class=\"trait\" href=\"scrypto/prelude/fmt/trait.Display.html\" title=\"trait scrypto::prelude::fmt::Display\">Display</a> for <a class=\"struct\" href=\"scrypto/component/kv_store_data_ref/struct.KeyValueEntryRefMut.html\" title=\"struct scrypto::component::kv_store_data_ref::KeyValueEntryRefMut\">KeyValueEntryRefMut</a>&lt;'_, V&gt;"]],
"scrypto_test":[]
};if (window.register_implementors) {window.register_implementors(implementors);} else {window.pending_implementors = implementors;}})()"#;

const ITERATOR_CHUNK: &str = r#"(function() {var implementors = {
"radix_engine_stores":[["impl&lt;'a&gt; <a class=\"trait\" href=\"https://doc.rust-lang.org/1.70.0/core/iter/traits/iterator/trait.Iterator.html\" title=\"trait core::iter::traits::iterator::Iterator\">Iterator</a> for <a class=\"struct\" href=\"radix_engine_stores/hash_tree/types/struct.BitIterator.html\" title=\"struct radix_engine_stores::hash_tree::types::BitIterator\">BitIterator</a>&lt;'a&gt;"]],
"sbor":[]
};if (window.register_implementors) {window.register_implementors(implementors);} else {window.pending_implementors = implementors;}})()"#;

fn write_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().expect("fixture has parent")).expect("create fixture dirs");
    fs::write(path, contents).expect("write fixture");
}

fn fixture_tree() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("temp dir");
    write_file(dir.path(), "core/fmt/trait.Display.js", DISPLAY_CHUNK);
    write_file(
        dir.path(),
        "core/iter/traits/iterator/trait.Iterator.js",
        ITERATOR_CHUNK,
    );
    write_file(dir.path(), "core/fmt/notes.txt", "not a chunk");
    dir
}

#[test]
fn discovers_chunk_files_recursively_in_sorted_order() {
    let dir = fixture_tree();
    let files = discover_chunk_files(dir.path()).expect("discovery succeeds");
    let relative: Vec<String> = files
        .iter()
        .map(|file| {
            file.strip_prefix(dir.path())
                .expect("under root")
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    assert_eq!(
        relative,
        vec![
            "core/fmt/trait.Display.js".to_string(),
            "core/iter/traits/iterator/trait.Iterator.js".to_string(),
        ]
    );
}

#[test]
fn loads_generated_chunk_with_structured_descriptors() {
    let dir = fixture_tree();
    let chunk = load_chunk_file(dir.path(), &dir.path().join("core/fmt/trait.Display.js"))
        .expect("chunk loads");

    assert_eq!(chunk.trait_path(), "core::fmt::Display");
    let mapping = chunk.mapping();
    assert_eq!(
        mapping.packages().collect::<Vec<_>>(),
        vec!["radix_engine", "scrypto", "scrypto_test"]
    );
    assert_eq!(mapping.get("scrypto_test").map(<[_]>::len), Some(0));

    let engine = mapping.get("radix_engine").expect("radix_engine entries");
    assert_eq!(engine.len(), 2);
    assert_eq!(engine[0].implementor(), "InvokeError<WasmRuntimeError>");

    let scrypto = mapping.get("scrypto").expect("scrypto entries");
    assert_eq!(scrypto[0].generics(), Some("V: ScryptoEncode"));
    assert_eq!(scrypto[0].capability(), "Display");
    assert_eq!(scrypto[0].implementor(), "KeyValueEntryRefMut<'_, V>");
    assert!(scrypto[0].display().contains("class=\"struct\""));
}

#[test]
fn loads_whole_tree_and_late_consumer_sees_every_package() {
    let dir = fixture_tree();
    let mut index = TraitIndex::new();
    let loaded = load_implementors_dir(dir.path(), &mut index).expect("tree loads");
    assert_eq!(loaded, 2);

    let seen = Rc::new(RefCell::new(Vec::<CapabilityMapping>::new()));
    let sink = Rc::clone(&seen);
    index.attach_consumer("core::fmt::Display", move |mapping: &CapabilityMapping| {
        sink.borrow_mut().push(mapping.clone());
    });

    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].len(), 3);
    assert_eq!(seen[0].implementor_count(), 3);
}

#[test]
fn early_consumer_is_notified_when_tree_loads() {
    let dir = fixture_tree();
    let mut index = TraitIndex::new();
    let calls = Rc::new(RefCell::new(0usize));
    let counter = Rc::clone(&calls);
    index.attach_consumer(
        "core::iter::traits::iterator::Iterator",
        move |mapping: &CapabilityMapping| {
            assert!(mapping.contains_package("sbor"));
            *counter.borrow_mut() += 1;
        },
    );

    load_implementors_dir(dir.path(), &mut index).expect("tree loads");
    assert_eq!(*calls.borrow(), 1);
    let iterator = index
        .get("core::iter::traits::iterator::Iterator")
        .expect("iterator registry");
    assert_eq!(iterator.implementor_count(), 1);
}

#[test]
fn malformed_chunk_stops_loading_with_error() {
    let dir = fixture_tree();
    write_file(dir.path(), "core/ops/trait.Drop.js", "var implementors = {\"x\":");
    let mut index = TraitIndex::new();

    let err = load_implementors_dir(dir.path(), &mut index).expect_err("bad chunk must fail");
    assert_eq!(err, ChunkScriptError::UnterminatedPayload);
    // Files sorted before the bad one were already delivered.
    assert!(index.get("core::fmt::Display").is_some());
}

#[test]
fn missing_directory_reports_io_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let missing = dir.path().join("implementors");
    let err = discover_chunk_files(&missing).expect_err("missing dir must fail");
    assert!(matches!(err, ChunkScriptError::Io { .. }));
}

#[test]
fn file_outside_root_is_not_a_chunk() {
    let dir = fixture_tree();
    let other = tempfile::tempdir().expect("second temp dir");
    let err = load_chunk_file(other.path(), &dir.path().join("core/fmt/trait.Display.js"))
        .expect_err("foreign root must fail");
    assert!(matches!(err, ChunkScriptError::NotAChunkFile(_)));
}
