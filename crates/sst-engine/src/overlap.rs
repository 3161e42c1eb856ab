//! Pairwise bounding-box overlap between two detection groups.
//!
//! Every intersecting (subject, object) pair is reported, in subject order and then
//! object order. Boxes that only share an edge do not overlap.

use sst_models::{BoundingBox, TrackId};

/// One intersecting pair, with the positions of both boxes in their input groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlapPair {
    pub id_a: TrackId,
    pub id_b: TrackId,
    pub index_a: usize,
    pub index_b: usize,
}

/// Finds intersecting boxes between two groups.
pub trait OverlapDetector: Send + Sync {
    /// Name of this detector for logging.
    fn name(&self) -> &'static str;

    /// All pairs `(a, b)` whose boxes strictly intersect, ordered by `index_a` then `index_b`.
    fn find_overlaps(
        &self,
        group_a: &[(TrackId, BoundingBox)],
        group_b: &[(TrackId, BoundingBox)],
    ) -> Vec<OverlapPair>;
}

/// Exhaustive O(|A|·|B|) scan. Per-frame groups are small, so this is the default.
#[derive(Debug, Clone, Copy, Default)]
pub struct PairwiseOverlap;

impl OverlapDetector for PairwiseOverlap {
    fn name(&self) -> &'static str {
        "pairwise"
    }

    fn find_overlaps(
        &self,
        group_a: &[(TrackId, BoundingBox)],
        group_b: &[(TrackId, BoundingBox)],
    ) -> Vec<OverlapPair> {
        let mut pairs = Vec::new();
        for (index_a, (id_a, box_a)) in group_a.iter().enumerate() {
            for (index_b, (id_b, box_b)) in group_b.iter().enumerate() {
                if box_a.intersects(box_b) {
                    pairs.push(OverlapPair {
                        id_a: *id_a,
                        id_b: *id_b,
                        index_a,
                        index_b,
                    });
                }
            }
        }
        pairs
    }
}

/// Sweep-and-prune along the x axis.
///
/// Sorts group B by left edge once and, for each box in group A, only tests the B boxes
/// whose left edge lies before A's right edge. Output order matches [`PairwiseOverlap`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SweepOverlap;

impl OverlapDetector for SweepOverlap {
    fn name(&self) -> &'static str {
        "sweep"
    }

    fn find_overlaps(
        &self,
        group_a: &[(TrackId, BoundingBox)],
        group_b: &[(TrackId, BoundingBox)],
    ) -> Vec<OverlapPair> {
        if group_a.is_empty() || group_b.is_empty() {
            return Vec::new();
        }

        let mut by_left: Vec<usize> = (0..group_b.len()).collect();
        by_left.sort_by_key(|&i| group_b[i].1.x1);

        let mut pairs = Vec::new();
        let mut row = Vec::new();
        for (index_a, (id_a, box_a)) in group_a.iter().enumerate() {
            // B boxes starting at or past A's right edge can never intersect it.
            let end = by_left.partition_point(|&i| group_b[i].1.x1 < box_a.x2);

            row.clear();
            row.extend(
                by_left[..end]
                    .iter()
                    .copied()
                    .filter(|&i| box_a.intersects(&group_b[i].1)),
            );
            row.sort_unstable();

            pairs.extend(row.iter().map(|&index_b| OverlapPair {
                id_a: *id_a,
                id_b: group_b[index_b].0,
                index_a,
                index_b,
            }));
        }
        pairs
    }
}
