//! Column transposition: per-read anchor rows → per-position columns.
//!
//! The mapper produces anchors laid out read-by-read; the consensus caller
//! wants them position-by-position, with every read's evidence for one
//! sampled reference position grouped together. The transpose is the single
//! synchronization point of a region build: it needs every read's full
//! anchor row at once.

use crate::error::{AnchorError, Result};
use crate::event_map::{EventAnchor, ReadAnchors};
use crate::signal_read::Strand;

/// All evidence anchored at one sampled reference position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnchoredColumn {
    /// Two anchors per read (primary, then complement), in read order.
    pub anchors: Vec<Option<EventAnchor>>,
    /// Reference bases from this anchor to the next, plus the k-mer window
    /// so consecutive columns overlap by `kmer_size - 1` bases and chain
    /// into one continuous assembly. Empty for the final column.
    pub base_sequence: Vec<u8>,
    /// Candidate sequences proposed by reads for the interval starting here,
    /// in read order. Duplicates and near-duplicates pass through untouched;
    /// filtering is the consensus caller's business.
    pub alt_sequences: Vec<Vec<u8>>,
}

/// Invert the per-read anchor rows of a region into one ordered list of
/// anchored columns.
///
/// Every read must carry the same number of anchors; a mismatch means the
/// per-read stage violated its contract and aborts the build. The final
/// column has no next anchor to bound an interval and stays an anchors-only
/// placeholder with empty sequence fields.
pub fn transpose_read_anchors(
    region: &str,
    reads: &[ReadAnchors],
    ref_segment: &[u8],
    stride: usize,
    kmer_size: usize,
) -> Result<Vec<AnchoredColumn>> {
    let first = reads.first().ok_or_else(|| AnchorError::EmptyRegion {
        region: region.to_string(),
    })?;
    let num_anchors = first.anchors.len();

    for read in reads {
        if read.anchors.len() != num_anchors {
            return Err(AnchorError::AnchorCountMismatch {
                region: region.to_string(),
                read: read.read_name.clone(),
                expected: num_anchors,
                found: read.anchors.len(),
            });
        }
    }

    let mut columns = Vec::with_capacity(num_anchors);
    for ai in 0..num_anchors {
        let mut anchors = Vec::with_capacity(reads.len() * 2);
        for read in reads {
            for strand in Strand::BOTH {
                anchors.push(read.anchors.strand(strand)[ai]);
            }
        }

        if ai + 1 == num_anchors {
            columns.push(AnchoredColumn {
                anchors,
                ..Default::default()
            });
            continue;
        }

        // Truncate at the fetched end of the reference segment.
        let start = (ai * stride).min(ref_segment.len());
        let stop = (ai * stride + stride + kmer_size).min(ref_segment.len());
        let base_sequence = ref_segment[start..stop].to_vec();

        let alt_sequences = reads
            .iter()
            .filter_map(|read| read.alt_sequences.get(ai).cloned().flatten())
            .collect();

        columns.push(AnchoredColumn {
            anchors,
            base_sequence,
            alt_sequences,
        });
    }

    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_map::ReadAnchorSet;

    fn anchor(event_index: usize, is_reverse: bool) -> Option<EventAnchor> {
        Some(EventAnchor {
            event_index,
            is_reverse,
        })
    }

    fn read_anchors(
        name: &str,
        primary: Vec<Option<EventAnchor>>,
        complement: Vec<Option<EventAnchor>>,
        alt_sequences: Vec<Option<Vec<u8>>>,
    ) -> ReadAnchors {
        ReadAnchors {
            read_name: name.to_string(),
            anchors: ReadAnchorSet {
                primary,
                complement,
            },
            alt_sequences,
        }
    }

    fn two_reads() -> Vec<ReadAnchors> {
        vec![
            read_anchors(
                "r0",
                vec![anchor(0, false), anchor(10, false), anchor(20, false)],
                vec![anchor(1, true), anchor(11, true), anchor(21, true)],
                vec![Some(b"AAAAA".to_vec()), Some(b"CCCCC".to_vec())],
            ),
            read_anchors(
                "r1",
                vec![anchor(100, true), None, anchor(120, true)],
                vec![anchor(101, false), None, anchor(121, false)],
                vec![None, Some(b"CCCCC".to_vec())],
            ),
        ]
    }

    #[test]
    fn columns_carry_two_anchors_per_read_in_fixed_order() {
        let reads = two_reads();
        let ref_segment = vec![b'A'; 101];
        let columns = transpose_read_anchors("c:0-100", &reads, &ref_segment, 50, 5).unwrap();

        assert_eq!(columns.len(), 3);
        for column in &columns {
            assert_eq!(column.anchors.len(), 2 * reads.len());
        }
        // Read order, primary before complement within each read.
        assert_eq!(
            columns[0].anchors,
            vec![anchor(0, false), anchor(1, true), anchor(100, true), anchor(101, false)]
        );
        // Unset anchors keep their slot.
        assert_eq!(
            columns[1].anchors,
            vec![anchor(10, false), anchor(11, true), None, None]
        );
    }

    #[test]
    fn final_column_is_an_anchors_only_placeholder() {
        let reads = two_reads();
        let ref_segment = vec![b'A'; 101];
        let columns = transpose_read_anchors("c:0-100", &reads, &ref_segment, 50, 5).unwrap();

        let last = columns.last().unwrap();
        assert!(!last.anchors.is_empty());
        assert!(last.base_sequence.is_empty());
        assert!(last.alt_sequences.is_empty());
    }

    #[test]
    fn base_sequences_overlap_by_the_kmer_window() {
        let reads = two_reads();
        let ref_segment: Vec<u8> = (0..101).map(|i| b"ACGT"[i % 4]).collect();
        let columns = transpose_read_anchors("c:0-100", &reads, &ref_segment, 50, 5).unwrap();

        assert_eq!(columns[0].base_sequence, &ref_segment[0..55]);
        // Truncated at the fetched end rather than running to stride + k.
        assert_eq!(columns[1].base_sequence, &ref_segment[50..101]);
    }

    #[test]
    fn alt_sequences_pass_through_in_read_order_without_dedup() {
        let reads = two_reads();
        let ref_segment = vec![b'A'; 101];
        let columns = transpose_read_anchors("c:0-100", &reads, &ref_segment, 50, 5).unwrap();

        // r1 has no candidate for the first interval.
        assert_eq!(columns[0].alt_sequences, vec![b"AAAAA".to_vec()]);
        // Identical candidates from different reads are both kept.
        assert_eq!(
            columns[1].alt_sequences,
            vec![b"CCCCC".to_vec(), b"CCCCC".to_vec()]
        );
    }

    #[test]
    fn anchor_count_mismatch_is_fatal() {
        let mut reads = two_reads();
        reads[1].anchors.primary.pop();
        reads[1].anchors.complement.pop();

        let err = transpose_read_anchors("c:0-100", &reads, &[b'A'; 101], 50, 5).unwrap_err();
        match err {
            AnchorError::AnchorCountMismatch { read, expected, found, .. } => {
                assert_eq!(read, "r1");
                assert_eq!(expected, 3);
                assert_eq!(found, 2);
            }
            other => panic!("expected AnchorCountMismatch, got {other:?}"),
        }
    }

    #[test]
    fn empty_read_set_is_fatal() {
        let err = transpose_read_anchors("c:0-100", &[], &[b'A'; 101], 50, 5).unwrap_err();
        assert!(matches!(err, AnchorError::EmptyRegion { .. }));
    }

    #[test]
    fn single_anchor_region_yields_one_placeholder_column() {
        let reads = vec![read_anchors(
            "r0",
            vec![anchor(7, false)],
            vec![anchor(8, true)],
            vec![],
        )];
        let columns = transpose_read_anchors("c:0-0", &reads, b"ACGTACGT", 50, 5).unwrap();
        assert_eq!(columns.len(), 1);
        assert!(columns[0].base_sequence.is_empty());
        assert_eq!(columns[0].anchors.len(), 2);
    }
}
