//! Property-based tests for RegionIndex membership queries
//!
//! Every query is checked against a brute-force scan of the padded
//! intervals the index was built from.

use fast_variantbam::core::{GenomicInterval, Region, RegionIndex};
use proptest::prelude::*;

/// Generate regions on chromosomes 0 and 1 within a 10kb window
fn arb_regions() -> impl Strategy<Value = Vec<(i32, u64, u64)>> {
    prop::collection::vec(
        (0i32..2, 0u64..10_000, 1u64..500).prop_map(|(c, s, l)| (c, s, s + l)),
        0..12,
    )
}

fn build(regions: &[(i32, u64, u64)], pad: u64) -> RegionIndex {
    RegionIndex::build(
        regions
            .iter()
            .map(|&(c, s, e)| Region::new(GenomicInterval::new(c, s, e))),
        pad,
    )
}

/// Brute-force membership over padded half-open intervals
fn covered(regions: &[(i32, u64, u64)], pad: u64, chrom: i32, pos: u64) -> bool {
    regions
        .iter()
        .any(|&(c, s, e)| c == chrom && s.saturating_sub(pad) <= pos && pos < e + pad)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Point membership agrees with a linear scan, pad included
    #[test]
    fn prop_contains_point_matches_scan(
        regions in arb_regions(),
        pad in 0u64..100,
        chrom in 0i32..3,
        pos in 0u64..11_000,
    ) {
        let index = build(&regions, pad);
        prop_assert_eq!(
            index.contains_point(chrom, pos),
            covered(&regions, pad, chrom, pos),
            "chrom {} pos {} pad {}", chrom, pos, pad
        );
    }

    /// A position is in the intersection iff it is in both inputs
    #[test]
    fn prop_intersect_is_conjunction(
        a in arb_regions(),
        b in arb_regions(),
        pad in 0u64..50,
        chrom in 0i32..2,
        pos in 0u64..11_000,
    ) {
        let ia = build(&a, pad);
        let ib = build(&b, 0);
        let both = ia.intersect(&ib, true);
        prop_assert_eq!(
            both.contains_point(chrom, pos),
            covered(&a, pad, chrom, pos) && covered(&b, 0, chrom, pos)
        );
        // Symmetric up to membership
        let other_way = ib.intersect(&ia, true);
        prop_assert_eq!(both.merged(), other_way.merged());
    }

    /// A position is in the union iff it is in either input
    #[test]
    fn prop_union_is_disjunction(
        a in arb_regions(),
        b in arb_regions(),
        chrom in 0i32..2,
        pos in 0u64..11_000,
    ) {
        let union = build(&a, 10).union(&build(&b, 0));
        prop_assert_eq!(
            union.contains_point(chrom, pos),
            covered(&a, 10, chrom, pos) || covered(&b, 0, chrom, pos)
        );
    }

    /// Merged intervals are sorted, disjoint and cover the same positions
    #[test]
    fn prop_merged_sorted_disjoint(regions in arb_regions(), pad in 0u64..100) {
        let index = build(&regions, pad);
        let merged = index.merged();
        for pair in merged.windows(2) {
            let (x, y) = (&pair[0], &pair[1]);
            prop_assert!(
                x.chrom_id < y.chrom_id || (x.chrom_id == y.chrom_id && x.end < y.start),
                "{:?} and {:?} not sorted and disjoint", x, y
            );
        }
        for iv in &merged {
            prop_assert!(index.contains_point(iv.chrom_id, iv.start));
            prop_assert!(index.contains_point(iv.chrom_id, iv.end - 1));
            prop_assert!(!index.contains_point(iv.chrom_id, iv.end));
        }
    }

    /// An index never matches a chromosome it holds no region on
    #[test]
    fn prop_other_chromosome_empty(regions in arb_regions(), pos in 0u64..11_000) {
        let index = build(&regions, 0);
        prop_assert!(!index.contains_point(7, pos));
        prop_assert!(index.query(&GenomicInterval::new(7, 0, 20_000)).is_empty());
    }
}

#[test]
fn test_empty_intersection() {
    let a = build(&[(0, 100, 200)], 0);
    let b = build(&[(0, 200, 300), (1, 100, 200)], 0);
    assert!(a.intersect(&b, true).is_empty());
    assert_eq!(a.intersect(&build(&[(0, 150, 300)], 0), true).merged(), vec![GenomicInterval::new(0, 150, 200)]);
}
