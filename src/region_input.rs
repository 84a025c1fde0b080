//! Region input assembly.
//!
//! Orchestrates the full build for one queried region: open the alignment
//! and reference files, fetch the reference segment, walk every overlapping
//! record, anchor each read in event space, and transpose the result into
//! columns. The build is atomic: any failure aborts the whole region and
//! nothing partial is handed to the consensus caller.
//!
//! THREAD SAFETY: `bam::Record` holds an `Rc<HeaderView>` and must not cross
//! threads. The sequential record pass therefore copies everything the
//! per-read work needs into plain [`AlignedRecord`] data; only that, the
//! shared repository, and the loaded reads touch the rayon workers.

use std::fmt;
use std::path::{Path, PathBuf};

use log::debug;
use rayon::prelude::*;
use rust_htslib::bam::record::Cigar;
use rust_htslib::bam::{self, Read as BamRead};
use rust_htslib::faidx;

use crate::cigar_walk::map_reference_to_read;
use crate::columns::{transpose_read_anchors, AnchoredColumn};
use crate::error::{AnchorError, Result};
use crate::event_map::{map_anchors_to_events, ReadAnchors};
use crate::signal_read::SignalReadRepository;

/// One queried reference interval, end-inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionQuery {
    pub contig: String,
    pub start: i64,
    pub end: i64,
}

impl RegionQuery {
    pub fn new(contig: impl Into<String>, start: i64, end: i64) -> Self {
        Self {
            contig: contig.into(),
            start,
            end,
        }
    }

    /// Number of sampled anchor positions for `stride`.
    pub fn num_anchors(&self, stride: usize) -> usize {
        ((self.end - self.start) / stride as i64) as usize + 1
    }
}

impl fmt::Display for RegionQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.contig, self.start, self.end)
    }
}

/// Anchor sampling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorConfig {
    /// Spacing between sampled reference positions, in bases.
    pub stride: usize,
    /// K-mer window size: the unit of nearest-event lookups and the overlap
    /// between consecutive reference sub-sequences.
    pub kmer_size: usize,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            stride: 100,
            kmer_size: 5,
        }
    }
}

/// The assembled input for one region, handed to the consensus caller by
/// value.
///
/// `R` is the repository's loaded-read type; the region input exclusively
/// owns every read it loaded, and anchors reference them by read order.
#[derive(Debug)]
pub struct RegionInput<R> {
    /// Loaded signal reads, in record order.
    pub reads: Vec<R>,
    /// One column per sampled reference position; the final column is an
    /// anchors-only placeholder.
    pub columns: Vec<AnchoredColumn>,
}

/// Plain-data copy of one alignment record, safe to hand to a worker.
struct AlignedRecord {
    name: String,
    signal_path: PathBuf,
    pos: i64,
    is_reverse: bool,
    cigar: Vec<Cigar>,
}

/// Build the consensus-caller input for one region.
///
/// Opens the indexed alignment file and the reference, fetches the
/// reference segment for `query` (end-inclusive), iterates every usable
/// overlapping record, anchors each read in event space, and transposes the
/// per-read anchors into columns.
///
/// Records that are unmapped, secondary, or supplementary are skipped:
/// their sequences are not the full original read, so their coordinates
/// cannot anchor the signal trace. A region with no usable records is an
/// error; callers are expected to filter empty regions beforehand.
pub fn build_region_input<Repo>(
    alignment_path: &Path,
    reference_path: &Path,
    repository: &Repo,
    query: &RegionQuery,
    config: &AnchorConfig,
) -> Result<RegionInput<Repo::Read>>
where
    Repo: SignalReadRepository + Sync,
    Repo::Read: Send,
{
    validate(query, config)?;
    let region = query.to_string();

    let mut alignments =
        bam::IndexedReader::from_path(alignment_path).map_err(|source| AnchorError::Open {
            what: "alignment file",
            path: alignment_path.to_path_buf(),
            source,
        })?;
    let reference =
        faidx::Reader::from_path(reference_path).map_err(|source| AnchorError::Open {
            what: "reference",
            path: reference_path.to_path_buf(),
            source,
        })?;

    // May come back shorter than requested at a contig boundary; column
    // extraction truncates against the actually fetched length.
    let ref_segment: Vec<u8> = reference
        .fetch_seq(&query.contig, query.start as usize, query.end as usize)
        .map_err(|source| AnchorError::ReferenceFetch {
            contig: query.contig.clone(),
            start: query.start,
            end: query.end,
            source,
        })?
        .to_vec();

    // Phase 1: sequential record pass. Assigns the stable read order and
    // extracts plain per-record data.
    alignments
        .fetch((query.contig.as_str(), query.start, query.end))
        .map_err(|source| AnchorError::RecordRead {
            region: region.clone(),
            source,
        })?;

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for result in alignments.records() {
        let record = result.map_err(|source| AnchorError::RecordRead {
            region: region.clone(),
            source,
        })?;
        if record.is_unmapped() || record.is_secondary() || record.is_supplementary() {
            skipped += 1;
            continue;
        }
        let name = String::from_utf8_lossy(record.qname()).into_owned();
        let signal_path = repository
            .resolve_path(&name)
            .ok_or_else(|| AnchorError::UnknownRead { read: name.clone() })?;
        records.push(AlignedRecord {
            name,
            signal_path,
            pos: record.pos(),
            is_reverse: record.is_reverse(),
            cigar: record.cigar().iter().cloned().collect(),
        });
    }

    if records.is_empty() {
        return Err(AnchorError::EmptyRegion { region });
    }
    debug!(
        "{region}: {} alignment records ({skipped} skipped)",
        records.len()
    );

    // Phase 2: per-read work fans out across rayon. Each worker loads its
    // own signal read, walks its own CIGAR, and anchors in event space;
    // results collect back in record order, and the first error aborts the
    // build.
    let per_read: Vec<(Repo::Read, ReadAnchors)> = records
        .par_iter()
        .map(|record| {
            let read = repository.load(&record.signal_path)?;
            let base_anchors = map_reference_to_read(
                &record.name,
                &record.cigar,
                record.pos,
                query.start,
                query.end,
                config.stride,
            )?;
            let anchors = map_anchors_to_events(
                &record.name,
                &read,
                &base_anchors,
                record.is_reverse,
                config.kmer_size,
            )?;
            Ok((read, anchors))
        })
        .collect::<Result<Vec<_>>>()?;

    let (reads, read_anchors): (Vec<_>, Vec<_>) = per_read.into_iter().unzip();

    let expected = query.num_anchors(config.stride);
    for anchors in &read_anchors {
        if anchors.anchors.len() != expected {
            return Err(AnchorError::AnchorCountMismatch {
                region: region.clone(),
                read: anchors.read_name.clone(),
                expected,
                found: anchors.anchors.len(),
            });
        }
    }

    // Phase 3: single synchronization point; every read's anchors are in.
    let columns = transpose_read_anchors(
        &region,
        &read_anchors,
        &ref_segment,
        config.stride,
        config.kmer_size,
    )?;
    debug!(
        "{region}: {} reads anchored into {} columns",
        reads.len(),
        columns.len()
    );

    Ok(RegionInput { reads, columns })
}

fn validate(query: &RegionQuery, config: &AnchorConfig) -> Result<()> {
    let reason = if query.end < query.start {
        Some("region end precedes region start")
    } else if config.stride == 0 {
        Some("stride must be positive")
    } else if config.kmer_size == 0 {
        Some("k-mer window must be positive")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(AnchorError::InvalidQuery {
            region: query.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}
