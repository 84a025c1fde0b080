//! Error taxonomy for region builds.
//!
//! Every failure class gets its own variant so callers can tell a bad input
//! apart from a data-integrity violation. Expected sparse coverage (a read
//! not aligned at a sampled position) is never an error; it travels through
//! the whole pipeline as `None` anchors.

use std::path::PathBuf;

use thiserror::Error;

use crate::signal_read::Strand;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AnchorError>;

/// Errors raised while building the input for one region.
///
/// Any of these aborts the whole region build; no partial result is ever
/// returned to the consensus caller.
#[derive(Debug, Error)]
pub enum AnchorError {
    /// The alignment file, its index, or the reference failed to open.
    #[error("failed to open {what} {path:?}: {source}")]
    Open {
        what: &'static str,
        path: PathBuf,
        #[source]
        source: rust_htslib::errors::Error,
    },

    /// The reference interval could not be fetched.
    #[error("failed to fetch reference {contig}:{start}-{end}: {source}")]
    ReferenceFetch {
        contig: String,
        start: i64,
        end: i64,
        #[source]
        source: rust_htslib::errors::Error,
    },

    /// I/O failure while fetching or iterating alignment records.
    #[error("failed to read alignments in {region}: {source}")]
    RecordRead {
        region: String,
        #[source]
        source: rust_htslib::errors::Error,
    },

    /// The query itself is malformed (inverted interval, zero stride, ...).
    #[error("invalid query {region}: {reason}")]
    InvalidQuery {
        region: String,
        reason: &'static str,
    },

    /// No usable alignment record overlaps the queried region.
    #[error("no reads overlap region {region}")]
    EmptyRegion { region: String },

    /// A CIGAR operation this pipeline cannot interpret. Skipping it would
    /// silently corrupt the coordinate walk, so it is fatal.
    #[error("read '{read}': unsupported CIGAR operation '{op}'")]
    UnsupportedCigar { read: String, op: char },

    /// A read name with no known signal file.
    #[error("no signal file known for read '{read}'")]
    UnknownRead { read: String },

    /// A signal file failed to load.
    #[error("failed to load signal read {path:?}: {reason}")]
    SignalLoad { path: PathBuf, reason: String },

    /// Nearest-event lookup failed for a base coordinate the CIGAR walk
    /// reported as mapped. The repository guarantees every valid coordinate
    /// has a nearest event, so this is a contract violation, not sparse
    /// coverage.
    #[error("read '{read}': no {strand} event near base {base_index}")]
    EventLookup {
        read: String,
        base_index: usize,
        strand: Strand,
    },

    /// Two reads in the same region produced different anchor counts.
    #[error("read '{read}' produced {found} anchors in {region} where {expected} were expected")]
    AnchorCountMismatch {
        region: String,
        read: String,
        expected: usize,
        found: usize,
    },
}
