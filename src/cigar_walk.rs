//! Reference-to-read coordinate mapping along a CIGAR.
//!
//! When a read has insertions or deletions, the arithmetic
//! `read_pos = ref_pos - alignment_start` is wrong; the mapping has to walk
//! the CIGAR and account for operations that consume reference and read
//! bases differently:
//!
//! - M/=/X: consume both ref and read (1:1 mapping)
//! - D/N: consume ref only
//! - I/S: consume read only
//! - H: consume read only. Coordinates here index the *original* sequenced
//!   read, and hard-clipped bases exist in that read even though they are
//!   absent from the record
//!
//! [`map_reference_to_read`] walks one record's CIGAR once and reports the
//! read-base coordinate at every stride-th reference position of a queried
//! interval. Positions the read is not aligned to stay `None`.

use rust_htslib::bam::record::Cigar;

use crate::error::{AnchorError, Result};

/// Map every stride-th reference position in `[region_start, region_end]`
/// (inclusive, sampled relative to `region_start`) to a read-base
/// coordinate.
///
/// The output always has length `(region_end - region_start) / stride + 1`;
/// slots the alignment never covers stay `None`. A position consumed by a
/// deletion maps to the read cursor parked at the next unconsumed base.
///
/// `P` (pad) operations are a fatal data-integrity error: silently skipping
/// one would shift every downstream coordinate.
pub fn map_reference_to_read(
    read_name: &str,
    cigar: &[Cigar],
    alignment_start: i64,
    region_start: i64,
    region_end: i64,
    stride: usize,
) -> Result<Vec<Option<usize>>> {
    debug_assert!(stride > 0);
    debug_assert!(region_end >= region_start);

    let stride = stride as i64;
    let num_anchors = ((region_end - region_start) / stride) as usize + 1;
    let mut out = vec![None; num_anchors];

    let mut read_pos: usize = 0;
    let mut ref_pos = alignment_start;

    for op in cigar {
        if ref_pos > region_end {
            break;
        }

        let len = op.len() as i64;
        let (ref_advances, read_advances) = match op {
            Cigar::Match(_) | Cigar::Equal(_) | Cigar::Diff(_) => (true, true),
            Cigar::Del(_) | Cigar::RefSkip(_) => (true, false),
            Cigar::Ins(_) | Cigar::SoftClip(_) | Cigar::HardClip(_) => (false, true),
            Cigar::Pad(_) => {
                return Err(AnchorError::UnsupportedCigar {
                    read: read_name.to_string(),
                    op: op.char(),
                })
            }
        };

        if ref_advances {
            // Sampled positions covered by this run, stride-aligned to
            // region_start.
            let lo = ref_pos.max(region_start);
            let hi = (ref_pos + len - 1).min(region_end);
            if lo <= hi {
                let mut sample = lo + (stride - (lo - region_start) % stride) % stride;
                while sample <= hi {
                    let slot = ((sample - region_start) / stride) as usize;
                    out[slot] = Some(if read_advances {
                        read_pos + (sample - ref_pos) as usize
                    } else {
                        read_pos
                    });
                    sample += stride;
                }
            }
            ref_pos += len;
        }
        if read_advances {
            read_pos += len as usize;
        }
    }

    Ok(out)
}
