//! Event-space anchoring for one read.
//!
//! Takes the base-coordinate anchors produced by the CIGAR walk and turns
//! them into event anchors on both physical strands of the read's signal
//! trace. Reverse-aligned reads need their coordinates mirrored into the
//! original sequencing orientation first, and the candidate sequence
//! extracted between two anchors must come back out in reference-forward
//! orientation regardless of how the read aligned.

use bio::alphabets::dna;

use crate::error::{AnchorError, Result};
use crate::signal_read::{SignalRead, Strand};

/// One read's mapping, on one physical strand, to one sampled reference
/// position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventAnchor {
    /// Index into the strand's event trace.
    pub event_index: usize,
    /// Orientation of this strand relative to the reference.
    pub is_reverse: bool,
}

/// Per-strand anchor rows for one read.
///
/// Both rows always have the same length (one slot per sampled reference
/// position); a `None` slot means the read is not aligned there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadAnchorSet {
    pub primary: Vec<Option<EventAnchor>>,
    pub complement: Vec<Option<EventAnchor>>,
}

impl ReadAnchorSet {
    fn with_len(num_anchors: usize) -> Self {
        Self {
            primary: vec![None; num_anchors],
            complement: vec![None; num_anchors],
        }
    }

    pub fn strand(&self, strand: Strand) -> &[Option<EventAnchor>] {
        match strand {
            Strand::Primary => &self.primary,
            Strand::Complement => &self.complement,
        }
    }

    fn strand_mut(&mut self, strand: Strand) -> &mut [Option<EventAnchor>] {
        match strand {
            Strand::Primary => &mut self.primary,
            Strand::Complement => &mut self.complement,
        }
    }

    pub fn len(&self) -> usize {
        self.primary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty()
    }
}

/// Everything the mapper derives from one read: event anchors on both
/// strands plus the candidate sequence for every fully anchored interval.
#[derive(Debug, Clone)]
pub struct ReadAnchors {
    pub read_name: String,
    pub anchors: ReadAnchorSet,
    /// Slot `i` covers the interval from anchor `i` to anchor `i + 1`;
    /// `None` when either bounding anchor is unmapped.
    pub alt_sequences: Vec<Option<Vec<u8>>>,
}

/// Convert one read's base-coordinate anchors into its per-strand event
/// anchors and per-interval candidate sequences.
///
/// For a reverse-aligned read every coordinate is mirrored through
/// [`SignalRead::flip_coordinate`] before event lookup, and the two physical
/// strands carry opposite orientation flags. Unmapped positions are skipped
/// entirely; a failed event lookup for a *mapped* position is fatal.
pub fn map_anchors_to_events<R: SignalRead>(
    read_name: &str,
    read: &R,
    base_anchors: &[Option<usize>],
    is_reverse: bool,
    kmer_size: usize,
) -> Result<ReadAnchors> {
    let num_anchors = base_anchors.len();
    let mut anchors = ReadAnchorSet::with_len(num_anchors);
    let mut alt_sequences = vec![None; num_anchors.saturating_sub(1)];

    let sequence = read.base_sequence();
    let max_base = sequence.len().saturating_sub(kmer_size);

    // The two physical strands always read in opposite directions.
    let orientation = |strand: Strand| match strand {
        Strand::Primary => is_reverse,
        Strand::Complement => !is_reverse,
    };

    for (ai, base) in base_anchors.iter().enumerate() {
        let Some(base_index) = *base else {
            continue; // read not aligned at this sampled position
        };

        let lookup_index = if is_reverse {
            read.flip_coordinate(base_index)
        } else {
            base_index
        };

        for strand in Strand::BOTH {
            let event_index =
                read.nearest_event(lookup_index, strand)
                    .ok_or_else(|| AnchorError::EventLookup {
                        read: read_name.to_string(),
                        base_index: lookup_index,
                        strand,
                    })?;
            anchors.strand_mut(strand)[ai] = Some(EventAnchor {
                event_index,
                is_reverse: orientation(strand),
            });
        }

        // Candidate assembly from this anchor to the next, only when both
        // ends of the interval are mapped.
        if let Some(&Some(next_index)) = base_anchors.get(ai + 1) {
            alt_sequences[ai] = Some(extract_alternative(
                read, sequence, base_index, next_index, is_reverse, kmer_size, max_base,
            ));
        }
    }

    Ok(ReadAnchors {
        read_name: read_name.to_string(),
        anchors,
        alt_sequences,
    })
}

/// Extract the read's sequence between two anchor coordinates, normalized to
/// reference-forward orientation.
///
/// Coordinates arrive in alignment orientation; for a reverse-aligned read
/// they are mirrored into the original read direction, which reverses their
/// order, so the ends swap. Both ends are clamped to
/// `[0, read_len - kmer_size]` before slicing.
fn extract_alternative<R: SignalRead>(
    read: &R,
    sequence: &[u8],
    start_index: usize,
    end_index: usize,
    is_reverse: bool,
    kmer_size: usize,
    max_base: usize,
) -> Vec<u8> {
    let (start, end) = if is_reverse {
        (
            read.flip_coordinate(end_index),
            read.flip_coordinate(start_index),
        )
    } else {
        (start_index, end_index)
    };

    let start = start.min(max_base);
    let end = end.min(max_base);
    let stop = (end + kmer_size).min(sequence.len());
    let slice = &sequence[start..stop];

    if is_reverse {
        dna::revcomp(slice)
    } else {
        slice.to_vec()
    }
}
