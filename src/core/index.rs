//! Interval index for region membership queries
//!
//! Uses rust-lapper for O(log n + k) interval queries.

use crate::core::region::{GenomicInterval, Region, Strand};
use rust_lapper::{Interval, Lapper};
use std::collections::BTreeMap;

/// Type alias for region intervals; the value is an offset into `RegionIndex::regions`
pub type RegionInterval = Interval<u64, usize>;

/// Interval index organized by chromosome id
///
/// Built once from a set of regions and read-only afterwards. Chromosomes are
/// kept in a `BTreeMap` so iteration, and therefore [`RegionIndex::intersect`],
/// is deterministic for a given build input.
#[derive(Debug, Clone, Default)]
pub struct RegionIndex {
    /// Regions as configured, pad already recorded on each
    regions: Vec<Region>,
    /// Chromosome id -> interval tree over padded intervals
    maps: BTreeMap<i32, Lapper<u64, usize>>,
}

impl RegionIndex {
    /// Build an index, applying `pad` to every region
    ///
    /// Regions whose padded interval is empty are dropped.
    pub fn build<I>(regions: I, pad: u64) -> Self
    where
        I: IntoIterator<Item = Region>,
    {
        Self::from_regions(regions.into_iter().map(|r| r.with_pad(pad)))
    }

    /// Build without touching the pads the regions already carry
    pub fn from_regions<I>(regions: I) -> Self
    where
        I: IntoIterator<Item = Region>,
    {
        let mut kept = Vec::new();
        let mut by_chrom: BTreeMap<i32, Vec<RegionInterval>> = BTreeMap::new();
        for region in regions {
            let padded = region.padded();
            if padded.is_empty() {
                continue;
            }
            by_chrom.entry(padded.chrom_id).or_default().push(Interval {
                start: padded.start,
                stop: padded.end,
                val: kept.len(),
            });
            kept.push(region);
        }
        let maps = by_chrom
            .into_iter()
            .map(|(chrom, intervals)| (chrom, Lapper::new(intervals)))
            .collect();
        Self { regions: kept, maps }
    }

    /// Regions whose padded interval overlaps `interval`
    pub fn query(&self, interval: &GenomicInterval) -> Vec<&Region> {
        match self.maps.get(&interval.chrom_id) {
            Some(l) => l
                .find(interval.start, interval.end)
                .map(|iv| &self.regions[iv.val])
                .collect(),
            None => vec![],
        }
    }

    /// Regions covering a single position
    pub fn query_point(&self, chrom_id: i32, pos: u64) -> Vec<&Region> {
        self.query(&GenomicInterval::new(chrom_id, pos, pos.saturating_add(1)))
    }

    /// Cheaper form of [`RegionIndex::query_point`] when only membership matters
    pub fn contains_point(&self, chrom_id: i32, pos: u64) -> bool {
        match self.maps.get(&chrom_id) {
            Some(l) => l.find(pos, pos.saturating_add(1)).next().is_some(),
            None => false,
        }
    }

    /// Geometric overlap of every overlapping pair of intervals from `self` and `other`
    ///
    /// Resulting regions carry no pad (their interval already is the padded
    /// overlap) and the linked/exclude flags of the region from `self`. When
    /// `ignore_strand` is false, pairs on opposite strands do not intersect.
    pub fn intersect(&self, other: &RegionIndex, ignore_strand: bool) -> RegionIndex {
        let mut out = Vec::new();

        for (chrom, lapper) in &self.maps {
            let Some(other_lapper) = other.maps.get(chrom) else {
                continue;
            };
            for iv in lapper.iter() {
                let left = &self.regions[iv.val];
                let left_iv = GenomicInterval::new(*chrom, iv.start, iv.stop);
                for hit in other_lapper.find(iv.start, iv.stop) {
                    let right = &other.regions[hit.val];
                    if !ignore_strand && !left.strand.compatible(&right.strand) {
                        continue;
                    }
                    let right_iv = GenomicInterval::new(*chrom, hit.start, hit.stop);
                    if let Some(overlap) = left_iv.intersect(&right_iv) {
                        let strand = match left.strand {
                            Strand::Unstranded => right.strand,
                            s => s,
                        };
                        let mut region = Region::new(overlap).with_strand(strand);
                        region.linked = left.linked;
                        region.exclude = left.exclude;
                        out.push(region);
                    }
                }
            }
        }

        RegionIndex::from_regions(out)
    }

    /// Union of two indexes; regions keep their own pads
    pub fn union(&self, other: &RegionIndex) -> RegionIndex {
        RegionIndex::from_regions(self.regions.iter().chain(other.regions.iter()).copied())
    }

    /// Sorted, non-overlapping padded intervals covering the same positions
    pub fn merged(&self) -> Vec<GenomicInterval> {
        let mut out: Vec<GenomicInterval> = Vec::new();
        for (chrom, lapper) in &self.maps {
            let mut intervals: Vec<(u64, u64)> = lapper.iter().map(|iv| (iv.start, iv.stop)).collect();
            intervals.sort_unstable();
            for (start, stop) in intervals {
                match out.last_mut() {
                    Some(last) if last.chrom_id == *chrom && start <= last.end => {
                        last.end = last.end.max(stop);
                    }
                    _ => out.push(GenomicInterval::new(*chrom, start, stop)),
                }
            }
        }
        out
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn chrom_ids(&self) -> impl Iterator<Item = i32> + '_ {
        self.maps.keys().copied()
    }

    /// Number of regions in the index
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(chrom: i32, start: u64, end: u64) -> Region {
        Region::new(GenomicInterval::new(chrom, start, end))
    }

    fn create_test_index() -> RegionIndex {
        RegionIndex::build(
            vec![region(0, 100, 200), region(0, 300, 500), region(0, 450, 600), region(1, 0, 50)],
            0,
        )
    }

    #[test]
    fn test_index_creation() {
        let index = create_test_index();
        assert_eq!(index.len(), 4);
        assert_eq!(index.chrom_ids().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_query_basic() {
        let index = create_test_index();
        let results = index.query(&GenomicInterval::new(0, 150, 160));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].interval.start, 100);
    }

    #[test]
    fn test_query_half_open() {
        let index = create_test_index();
        assert!(index.contains_point(0, 199));
        assert!(!index.contains_point(0, 200));
        assert!(index.query_point(2, 10).is_empty());
    }

    #[test]
    fn test_query_multiple_overlaps() {
        let index = create_test_index();
        assert_eq!(index.query_point(0, 470).len(), 2);
    }

    #[test]
    fn test_build_applies_pad() {
        let index = RegionIndex::build(vec![region(0, 999, 2000)], 50);
        assert!(index.contains_point(0, 949));
        assert!(!index.contains_point(0, 948));
        assert!(index.contains_point(0, 2049));
        assert_eq!(index.regions()[0].pad, 50);
    }

    #[test]
    fn test_intersect_pairs() {
        let a = create_test_index();
        let b = RegionIndex::build(vec![region(0, 150, 470), region(1, 40, 100)], 0);
        let c = a.intersect(&b, true);
        let merged = c.merged();
        assert_eq!(
            merged,
            vec![
                GenomicInterval::new(0, 150, 200),
                GenomicInterval::new(0, 300, 470),
                GenomicInterval::new(1, 40, 50),
            ]
        );
    }

    #[test]
    fn test_intersect_strand_aware() {
        let a = RegionIndex::build(vec![region(0, 0, 100).with_strand(Strand::Plus)], 0);
        let b = RegionIndex::build(vec![region(0, 50, 150).with_strand(Strand::Minus)], 0);
        assert!(a.intersect(&b, false).is_empty());
        assert_eq!(a.intersect(&b, true).len(), 1);
    }

    #[test]
    fn test_merged() {
        let index = create_test_index();
        assert_eq!(
            index.merged(),
            vec![
                GenomicInterval::new(0, 100, 200),
                GenomicInterval::new(0, 300, 600),
                GenomicInterval::new(1, 0, 50),
            ]
        );
    }

    #[test]
    fn test_empty_regions_dropped() {
        let index = RegionIndex::build(vec![region(0, 10, 10)], 0);
        assert!(index.is_empty());
    }
}
