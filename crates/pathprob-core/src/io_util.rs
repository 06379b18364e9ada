//! Shared file-format helpers: atomic writes and the handful of pipe- and
//! space-delimited line formats used throughout the cache files (spec
//! section 6). Every writer produces newline-terminated UTF-8 text; callers
//! that need crash-safety go through [`atomic_write`], which writes to a
//! sibling temp file before renaming into place (spec section 5).

use crate::as_id::Interner;
use crate::edge::{Distribution, Edge};
use crate::error::Error;
use crate::path::PathRecord;
use std::collections::BTreeMap;
use std::io::Write;

/// Write `contents` to `path`, via a temp file in the same directory
/// followed by a rename, so a crash mid-write never leaves a truncated
/// cache file that a later run would treat as authoritative.
pub fn atomic_write(path: &std::path::Path, contents: &str) -> Result<(), Error> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = dir {
        std::fs::create_dir_all(dir).map_err(|source| Error::IoFailure {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    let tmp_path = path.with_extension(format!(
        "{}.tmp",
        path.extension().and_then(|e| e.to_str()).unwrap_or("tmp")
    ));
    {
        let mut f = std::fs::File::create(&tmp_path).map_err(|source| Error::IoFailure {
            path: tmp_path.clone(),
            source,
        })?;
        f.write_all(contents.as_bytes())
            .map_err(|source| Error::IoFailure {
                path: tmp_path.clone(),
                source,
            })?;
    }
    std::fs::rename(&tmp_path, path).map_err(|source| Error::IoFailure {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the `AS1|AS2|...|ASn SPACE count` format used by path/corepath/
/// reserved-paths files, in a caller-supplied (already canonical) order.
pub fn write_path_records<'a>(
    path: &std::path::Path,
    records: impl Iterator<Item = &'a PathRecord>,
) -> Result<(), Error> {
    let mut out = String::new();
    for r in records {
        out.push_str(&r.path.format());
        out.push(' ');
        out.push_str(&r.count.to_string());
        out.push('\n');
    }
    atomic_write(path, &out)
}

pub fn read_path_records(
    path: &std::path::Path,
    interner: &mut Interner,
) -> Result<Vec<PathRecord>, Error> {
    let mut reader = crate::reader::PathReader::single(path.to_path_buf(), interner);
    let mut out = Vec::new();
    for rec in &mut reader {
        out.push(rec?);
    }
    Ok(out)
}

/// Write the `AS1|AS2|p2c|p2p|c2p` probability-file format (core-link,
/// edge-link, and combined files all share it).
pub fn write_distributions(
    path: &std::path::Path,
    distributions: &BTreeMap<Edge, Distribution>,
) -> Result<(), Error> {
    let mut out = String::new();
    for (edge, dist) in distributions {
        out.push_str(&format!(
            "{}|{}|{}|{}|{}\n",
            edge.a, edge.b, dist.p2c, dist.p2p, dist.c2p
        ));
    }
    atomic_write(path, &out)
}

pub fn read_distributions(
    path: &std::path::Path,
    interner: &mut Interner,
) -> Result<BTreeMap<Edge, Distribution>, Error> {
    let text = std::fs::read_to_string(path).map_err(|source| Error::IoFailure {
        path: path.to_path_buf(),
        source,
    })?;
    let mut out = BTreeMap::new();
    for (line_no, line) in text.lines().enumerate() {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split('|').collect();
        let malformed = || Error::MalformedInput {
            file: Some(path.to_path_buf()),
            line_no: line_no + 1,
            line: line.to_string(),
        };
        if fields.len() != 5 {
            return Err(malformed());
        }
        let a = interner.intern(fields[0]);
        let b = interner.intern(fields[1]);
        let p2c: f64 = fields[2].parse().map_err(|_| malformed())?;
        let p2p: f64 = fields[3].parse().map_err(|_| malformed())?;
        let c2p: f64 = fields[4].parse().map_err(|_| malformed())?;
        let edge = Edge::canonical(a, b);
        out.insert(edge, Distribution { p2c, p2p, c2p });
    }
    Ok(out)
}

/// Write the `AS1|AS2|-1` P2C-set format (direction matters: `AS1` is
/// provider).
pub fn write_p2c_set(
    path: &std::path::Path,
    edges: &std::collections::BTreeSet<crate::edge::DirectedEdge>,
) -> Result<(), Error> {
    let mut out = String::new();
    for e in edges {
        out.push_str(&format!("{}|{}|-1\n", e.from, e.to));
    }
    atomic_write(path, &out)
}

pub fn read_p2c_set(
    path: &std::path::Path,
    interner: &mut Interner,
) -> Result<std::collections::BTreeSet<crate::edge::DirectedEdge>, Error> {
    let text = std::fs::read_to_string(path).map_err(|source| Error::IoFailure {
        path: path.to_path_buf(),
        source,
    })?;
    let mut out = std::collections::BTreeSet::new();
    for (line_no, line) in text.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('|').collect();
        if fields.len() != 3 {
            return Err(Error::MalformedInput {
                file: Some(path.to_path_buf()),
                line_no: line_no + 1,
                line: line.to_string(),
            });
        }
        let from = interner.intern(fields[0]);
        let to = interner.intern(fields[1]);
        out.insert(crate::edge::DirectedEdge::new(from, to));
    }
    Ok(out)
}

/// Write the `AS1|AS2|label` init-core-link debug format (spec section 6),
/// `label` one of `{-1,0,1,2}`: the hard seed labeling the core-link solver
/// produces before the Gibbs sampler turns it into a distribution. Unlike
/// the final probability files, this debug artifact keeps `Other` (`2`)
/// distinct from `P2P` (`0`) rather than collapsing it — it is never read
/// back by the pipeline, only inspected.
pub fn write_core_link_labels(
    path: &std::path::Path,
    labels: &BTreeMap<Edge, crate::edge::Label>,
) -> Result<(), Error> {
    let mut out = String::new();
    for (edge, label) in labels {
        out.push_str(&format!("{}|{}|{}\n", edge.a, edge.b, label.code()));
    }
    atomic_write(path, &out)
}

/// Concatenate the core-link and edge-link files into the combined
/// probability file that the scorer and downstream simulator consume.
pub fn write_combined(
    out_path: &std::path::Path,
    core: &std::path::Path,
    edge: &std::path::Path,
) -> Result<(), Error> {
    let mut contents = std::fs::read_to_string(core).map_err(|source| Error::IoFailure {
        path: core.to_path_buf(),
        source,
    })?;
    contents.push_str(&std::fs::read_to_string(edge).map_err(|source| Error::IoFailure {
        path: edge.to_path_buf(),
        source,
    })?);
    atomic_write(out_path, &contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_write_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("out.txt");
        atomic_write(&file, "hello\n").unwrap();
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "hello\n");
        // no leftover temp file
        assert!(!file.with_extension("txt.tmp").exists());
    }

    #[test]
    fn distributions_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("core_link.txt");
        let mut it = Interner::new();
        let a = it.intern("1");
        let b = it.intern("2");
        let mut map = BTreeMap::new();
        map.insert(Edge::canonical(a, b), Distribution::UNIFORM);
        write_distributions(&file, &map).unwrap();
        let mut it2 = Interner::new();
        let read_back = read_distributions(&file, &mut it2).unwrap();
        assert_eq!(read_back.len(), 1);
    }

    #[test]
    fn core_link_labels_keep_other_distinct_from_p2p() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("init_core_link.txt");
        let mut it = Interner::new();
        let a = it.intern("1");
        let b = it.intern("2");
        let mut labels = BTreeMap::new();
        labels.insert(Edge::canonical(a, b), crate::edge::Label::Other);
        write_core_link_labels(&file, &labels).unwrap();
        let text = std::fs::read_to_string(&file).unwrap();
        assert_eq!(text, "1|2|2\n");
    }
}
