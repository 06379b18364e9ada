//! Path Reader: a lazy, non-restartable stream of `(path, count)` records
//! over one or an ordered list of files concatenated as a single stream
//! (spec section 4.1).

use crate::as_id::Interner;
use crate::error::Error;
use crate::path::{Path, PathRecord};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::PathBuf;

/// Line format: `AS1|AS2|...|ASn SPACE count`, or just `AS1|...|ASn` (count
/// defaults to 1). Blank lines and lines starting with `#` are skipped.
pub struct PathReader<'a> {
    interner: &'a mut Interner,
    files: std::vec::IntoIter<PathBuf>,
    current: Option<(PathBuf, Lines<BufReader<File>>)>,
    current_line_no: usize,
}

impl<'a> PathReader<'a> {
    pub fn new(files: Vec<PathBuf>, interner: &'a mut Interner) -> Self {
        Self {
            interner,
            files: files.into_iter(),
            current: None,
            current_line_no: 0,
        }
    }

    pub fn single(file: PathBuf, interner: &'a mut Interner) -> Self {
        Self::new(vec![file], interner)
    }

    fn advance_file(&mut self) -> Result<bool, Error> {
        match self.files.next() {
            None => Ok(false),
            Some(path) => {
                let f = File::open(&path).map_err(|source| Error::IoFailure {
                    path: path.clone(),
                    source,
                })?;
                self.current = Some((path, BufReader::new(f).lines()));
                self.current_line_no = 0;
                Ok(true)
            }
        }
    }

    fn parse_line(&mut self, path: &PathBuf, line: &str) -> Option<Result<PathRecord, Error>> {
        let trimmed = line.trim_end_matches(['\n', '\r']);
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }
        let malformed = || Error::MalformedInput {
            file: Some(path.clone()),
            line_no: self.current_line_no,
            line: trimmed.to_string(),
        };
        let mut parts = trimmed.splitn(2, ' ');
        let path_field = parts.next().unwrap_or("");
        let count_field = parts.next();
        let count: u64 = match count_field {
            None => 1,
            Some(s) if s.is_empty() => 1,
            Some(s) => match s.trim().parse::<u64>() {
                Ok(n) if n >= 1 => n,
                _ => return Some(Err(malformed())),
            },
        };
        if path_field.is_empty() {
            return Some(Err(malformed()));
        }
        let hops: Vec<_> = path_field
            .split('|')
            .map(|s| self.interner.intern(s))
            .collect();
        if hops.iter().any(|h| h.as_str().is_empty()) {
            return Some(Err(malformed()));
        }
        match Path::new(hops, Some(path), self.current_line_no, trimmed) {
            Ok(p) => Some(Ok(PathRecord { path: p, count })),
            Err(e) => Some(Err(e)),
        }
    }
}

impl<'a> Iterator for PathReader<'a> {
    type Item = Result<PathRecord, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current.is_none() {
                match self.advance_file() {
                    Ok(true) => {}
                    Ok(false) => return None,
                    Err(e) => return Some(Err(e)),
                }
            }
            let (path, lines) = self.current.as_mut().unwrap();
            let path = path.clone();
            match lines.next() {
                None => {
                    self.current = None;
                    continue;
                }
                Some(Err(source)) => {
                    return Some(Err(Error::IoFailure {
                        path: path.clone(),
                        source,
                    }))
                }
                Some(Ok(line)) => {
                    self.current_line_no += 1;
                    if let Some(result) = self.parse_line(&path, &line) {
                        return Some(result);
                    }
                    continue;
                }
            }
        }
    }
}
