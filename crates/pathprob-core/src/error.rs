//! Error type shared by every stage of the pipeline.
//!
//! Mirrors the reference crate's own error style (a hand-written enum with
//! `Display`/`Error` impls) rather than a derive-macro crate: the ambient
//! error handling stays consistent with what the rest of this codebase does
//! for its own domain errors.

use std::fmt;
use std::path::PathBuf;

/// The five error kinds named by the pipeline's error-handling design.
#[derive(Debug)]
pub enum Error {
    /// A line in an input/cache file did not match any accepted shape.
    MalformedInput {
        file: Option<PathBuf>,
        line_no: usize,
        line: String,
    },
    /// A prerequisite cache or file was expected but absent.
    MissingCache { what: &'static str, path: PathBuf },
    /// An IP solver did not converge within its time budget.
    SolverTimeout { component: &'static str },
    /// The solver's constraint system was inconsistent (should not happen
    /// with the stated formulation; treated as a bug upstream).
    SolverInfeasible { component: &'static str },
    /// Any other I/O failure (reading, writing, creating directories).
    IoFailure {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MalformedInput {
                file,
                line_no,
                line,
            } => {
                if let Some(file) = file {
                    write!(
                        f,
                        "malformed input at {}:{}: {:?}",
                        file.display(),
                        line_no,
                        line
                    )
                } else {
                    write!(f, "malformed input at line {}: {:?}", line_no, line)
                }
            }
            Error::MissingCache { what, path } => {
                write!(f, "missing {what}: expected cache file at {}", path.display())
            }
            Error::SolverTimeout { component } => {
                write!(f, "{component} did not converge within its time budget")
            }
            Error::SolverInfeasible { component } => {
                write!(f, "{component} constraint system is infeasible")
            }
            Error::IoFailure { path, source } => {
                write!(f, "I/O failure on {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoFailure { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
