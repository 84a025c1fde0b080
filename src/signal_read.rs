//! Collaborator interface to the signal-read repository.
//!
//! The pipeline never parses raw signal files itself. It talks to a
//! repository that resolves a read name to its signal file, loads the file,
//! and answers per-read coordinate queries: the base sequence in original
//! sequencing orientation, a coordinate mirror for reverse-aligned reads,
//! and the nearest event index for a base coordinate on either physical
//! strand.

use std::fmt;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use crate::error::Result;

/// One of the two physical strands measured per read.
///
/// Each read yields two signal traces with independent event tables, so
/// every anchor is looked up once per strand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    Primary,
    Complement,
}

impl Strand {
    /// Both strands, in the fixed primary-then-complement order used
    /// everywhere anchors are laid out.
    pub const BOTH: [Strand; 2] = [Strand::Primary, Strand::Complement];
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Primary => f.write_str("primary"),
            Strand::Complement => f.write_str("complement"),
        }
    }
}

/// A loaded signal read: base sequence plus per-strand event traces.
pub trait SignalRead {
    /// The read's base sequence in its original sequencing orientation.
    fn base_sequence(&self) -> &[u8];

    /// Mirror a base coordinate onto the opposite read direction.
    fn flip_coordinate(&self, base_index: usize) -> usize;

    /// The event index closest to `base_index` on `strand`, or `None` if the
    /// coordinate is outside the strand's event table.
    fn nearest_event(&self, base_index: usize, strand: Strand) -> Option<usize>;
}

/// Resolves read names to signal files and loads them.
pub trait SignalReadRepository {
    type Read: SignalRead;

    /// The signal file holding `read_name`, or `None` if unknown.
    fn resolve_path(&self, read_name: &str) -> Option<PathBuf>;

    /// Load one signal file.
    fn load(&self, path: &Path) -> Result<Self::Read>;
}

/// Read-name → signal-file lookup table.
///
/// Building block for [`SignalReadRepository::resolve_path`]: repositories
/// bulk-load the table once (e.g. from a directory scan) and embed it.
#[derive(Debug, Default, Clone)]
pub struct ReadNameMap {
    paths: FxHashMap<String, PathBuf>,
}

impl ReadNameMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `read_name`, replacing any previous entry.
    pub fn insert(&mut self, read_name: impl Into<String>, path: impl Into<PathBuf>) {
        self.paths.insert(read_name.into(), path.into());
    }

    pub fn resolve(&self, read_name: &str) -> Option<&Path> {
        self.paths.get(read_name).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl<N: Into<String>, P: Into<PathBuf>> FromIterator<(N, P)> for ReadNameMap {
    fn from_iter<I: IntoIterator<Item = (N, P)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (name, path) in iter {
            map.insert(name, path);
        }
        map
    }
}
