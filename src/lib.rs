//! Anchor construction for signal-space consensus calling.
//!
//! Builds the input for an HMM realignment/consensus caller from three
//! collaborators: an indexed alignment file, an indexed reference, and a
//! signal-read repository. For one queried region the pipeline
//!
//! 1. walks each overlapping record's CIGAR to map evenly spaced reference
//!    positions ("anchors") onto read-base coordinates,
//! 2. converts those coordinates into nearest-event indices on both physical
//!    strands of the read's signal trace, and extracts the read's candidate
//!    sequence between consecutive anchors,
//! 3. transposes the per-read anchor rows into per-position columns carrying
//!    every read's evidence for that stretch of reference.
//!
//! Per-read work is data-parallel (reads share nothing but the read-only
//! reference segment) and runs on rayon; output order is the record order,
//! never completion order. Positions a read is not aligned to travel through
//! every stage as `None` anchors, not as errors.

mod cigar_walk;
mod columns;
mod error;
mod event_map;
mod region_input;
mod signal_read;

pub use cigar_walk::map_reference_to_read;
pub use columns::{transpose_read_anchors, AnchoredColumn};
pub use error::{AnchorError, Result};
pub use event_map::{map_anchors_to_events, EventAnchor, ReadAnchorSet, ReadAnchors};
pub use region_input::{build_region_input, AnchorConfig, RegionInput, RegionQuery};
pub use signal_read::{ReadNameMap, SignalRead, SignalReadRepository, Strand};
