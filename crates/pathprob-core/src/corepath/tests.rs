use super::*;
use crate::as_id::Interner;
use std::io::Write;

fn write_paths(lines: &[&str]) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(f, "{line}").unwrap();
    }
    f
}

#[test]
fn lone_two_edge_path_has_no_core() {
    // Spec section 8 boundary case: a single length-2 path can never supply
    // the length >= 3 adjacency fact the first sweep needs, so nothing
    // survives pruning and the extractor emits no core paths at all.
    let f = write_paths(&["A|B|C 7"]);
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("corepath.txt");
    let mut interner = Interner::new();
    let out = extract_or_load(&cache, &[f.path().to_path_buf()], &mut interner).unwrap();
    assert!(out.core_edges.is_empty());
    assert!(out.core_paths.is_empty());
}

#[test]
fn triangle_of_paths_forms_a_stable_core() {
    // Three rotations of an AS triangle each supply one consecutive-edge
    // adjacency fact; combined, every edge has a neighbor on both sides, so
    // none of them dangle and all three paths survive verbatim.
    let f = write_paths(&["A|B|C 1", "B|C|A 2", "C|A|B 3"]);
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("corepath.txt");
    let mut interner = Interner::new();
    let out = extract_or_load(&cache, &[f.path().to_path_buf()], &mut interner).unwrap();
    assert_eq!(out.core_edges.len(), 3);
    assert_eq!(out.core_paths.len(), 3);
    let total: u64 = out.core_paths.values().sum();
    assert_eq!(total, 6);
    assert!(cache.exists());
}

#[test]
fn dangling_suffix_is_trimmed_and_counts_merge() {
    // "A|B|C|D" shares its first two edges with the triangle's "A|B|C", but
    // its trailing C-D edge never gets a right neighbor anywhere and stays
    // out of the core. The extracted core path is the A|B|C prefix, whose
    // count folds into the existing "A|B|C" entry from the triangle.
    let f = write_paths(&["A|B|C 1", "B|C|A 2", "C|A|B 3", "A|B|C|D 5"]);
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("corepath.txt");
    let mut interner = Interner::new();
    let out = extract_or_load(&cache, &[f.path().to_path_buf()], &mut interner).unwrap();
    assert_eq!(out.core_edges.len(), 3);

    let a = interner.intern("A");
    let b = interner.intern("B");
    let c = interner.intern("C");
    let abc = crate::path::Path::new(vec![a, b, c], None, 1, "test").unwrap();
    assert_eq!(out.core_paths.get(&abc).copied(), Some(1 + 5));
}

#[test]
fn cache_hit_loads_verbatim_without_recomputing_core_edges() {
    let f = write_paths(&["A|B|C 1", "B|C|A 2", "C|A|B 3"]);
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("corepath.txt");
    let mut interner = Interner::new();
    let first = extract_or_load(&cache, &[f.path().to_path_buf()], &mut interner).unwrap();
    assert!(!first.core_paths.is_empty());

    // Point at a nonexistent input file: if the cache were ignored this
    // would fail to open it, proving the second call really skipped
    // recomputation.
    let missing = dir.path().join("does-not-exist.txt");
    let mut interner2 = Interner::new();
    let second = extract_or_load(&cache, &[missing], &mut interner2).unwrap();
    assert_eq!(second.core_paths.len(), first.core_paths.len());
    assert!(second.core_edges.is_empty());
}
