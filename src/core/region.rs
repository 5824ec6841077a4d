//! Genomic coordinates
//!
//! All intervals are zero-based and half-open. Chromosomes are identified by
//! the numeric id the alignment header assigns them; [`ReferenceDict`] maps
//! between names and ids.

use crate::core::error::{ResolutionError, ResolutionResult};
use std::collections::HashMap;

/// Strand orientation of a region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Strand {
    Plus,
    Minus,
    #[default]
    Unstranded,
}

impl Strand {
    /// Parse strand from char
    ///
    /// # Examples
    /// ```
    /// use fast_variantbam::core::Strand;
    /// assert_eq!(Strand::from_char('+'), Some(Strand::Plus));
    /// assert_eq!(Strand::from_char('.'), Some(Strand::Unstranded));
    /// assert_eq!(Strand::from_char('x'), None);
    /// ```
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Strand::Plus),
            '-' => Some(Strand::Minus),
            '.' | '*' => Some(Strand::Unstranded),
            _ => None,
        }
    }

    /// Two strands are compatible unless both are set and differ
    pub fn compatible(&self, other: &Strand) -> bool {
        match (self, other) {
            (Strand::Unstranded, _) | (_, Strand::Unstranded) => true,
            (a, b) => a == b,
        }
    }
}

/// A half-open interval on one chromosome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GenomicInterval {
    pub chrom_id: i32,
    pub start: u64,
    pub end: u64,
}

impl GenomicInterval {
    pub fn new(chrom_id: i32, start: u64, end: u64) -> Self {
        Self { chrom_id, start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn contains(&self, chrom_id: i32, pos: u64) -> bool {
        self.chrom_id == chrom_id && self.start <= pos && pos < self.end
    }

    /// Geometric overlap of two intervals, `None` if they do not overlap
    pub fn intersect(&self, other: &GenomicInterval) -> Option<GenomicInterval> {
        if self.chrom_id != other.chrom_id || self.start >= other.end || self.end <= other.start {
            return None;
        }
        Some(GenomicInterval::new(
            self.chrom_id,
            self.start.max(other.start),
            self.end.min(other.end),
        ))
    }
}

/// How a region takes part in the filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum RegionKind {
    /// `-g`: reads matching here are kept
    #[default]
    Include,
    /// `-G`: reads matching here are removed
    Exclude,
    /// `-l`: like `Include`, but a match admits the whole pair
    Linked,
    /// `-L`: like `Exclude`, but a match removes the whole pair
    LinkedExclude,
}

impl RegionKind {
    pub fn new(exclude: bool, linked: bool) -> Self {
        match (exclude, linked) {
            (false, false) => RegionKind::Include,
            (true, false) => RegionKind::Exclude,
            (false, true) => RegionKind::Linked,
            (true, true) => RegionKind::LinkedExclude,
        }
    }

    pub fn is_exclude(&self) -> bool {
        matches!(self, RegionKind::Exclude | RegionKind::LinkedExclude)
    }

    pub fn is_linked(&self) -> bool {
        matches!(self, RegionKind::Linked | RegionKind::LinkedExclude)
    }
}

/// A genomic interval plus the options it was configured with
///
/// Immutable once built; the pad is applied by [`Region::padded`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    pub interval: GenomicInterval,
    pub pad: u64,
    pub strand: Strand,
    pub linked: bool,
    pub exclude: bool,
}

impl Region {
    pub fn new(interval: GenomicInterval) -> Self {
        Self {
            interval,
            pad: 0,
            strand: Strand::Unstranded,
            linked: false,
            exclude: false,
        }
    }

    pub fn with_pad(mut self, pad: u64) -> Self {
        self.pad = pad;
        self
    }

    pub fn with_strand(mut self, strand: Strand) -> Self {
        self.strand = strand;
        self
    }

    pub fn with_kind(mut self, kind: RegionKind) -> Self {
        self.linked = kind.is_linked();
        self.exclude = kind.is_exclude();
        self
    }

    pub fn kind(&self) -> RegionKind {
        RegionKind::new(self.exclude, self.linked)
    }

    /// Interval expanded by the pad on both sides, clamped at zero
    pub fn padded(&self) -> GenomicInterval {
        GenomicInterval::new(
            self.interval.chrom_id,
            self.interval.start.saturating_sub(self.pad),
            self.interval.end.saturating_add(self.pad),
        )
    }
}

/// Reference sequence dictionary taken from the alignment header
#[derive(Debug, Clone, Default)]
pub struct ReferenceDict {
    names: Vec<String>,
    lengths: Vec<u64>,
    ids: HashMap<String, i32>,
    aliases: HashMap<String, i32>,
}

impl ReferenceDict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(name, length)` pairs in header order
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let mut dict = Self::new();
        for (name, len) in pairs {
            dict.push(name.into(), len);
        }
        dict
    }

    pub fn push(&mut self, name: String, length: u64) -> i32 {
        let id = self.names.len() as i32;
        self.aliases.entry(normalize_chrom_key(&name)).or_insert(id);
        self.ids.insert(name.clone(), id);
        self.names.push(name);
        self.lengths.push(length);
        id
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, chrom_id: i32) -> Option<&str> {
        usize::try_from(chrom_id)
            .ok()
            .and_then(|i| self.names.get(i))
            .map(|s| s.as_str())
    }

    pub fn length(&self, chrom_id: i32) -> Option<u64> {
        usize::try_from(chrom_id).ok().and_then(|i| self.lengths.get(i)).copied()
    }

    /// Resolve a chromosome name, accepting `chr1` / `1` / `CHR1` variants
    pub fn id(&self, chrom: &str) -> Option<i32> {
        self.ids
            .get(chrom)
            .or_else(|| self.aliases.get(&normalize_chrom_key(chrom)))
            .copied()
    }

    pub fn resolve(&self, chrom: &str) -> ResolutionResult<i32> {
        self.id(chrom)
            .ok_or_else(|| ResolutionError::UnknownChromosome(chrom.to_string()))
    }

    /// Samtools-style, one-based inclusive rendering (`chr1:950-1500`)
    pub fn format_interval(&self, iv: &GenomicInterval) -> String {
        let name = self.name(iv.chrom_id).unwrap_or("*");
        format!("{}:{}-{}", name, iv.start + 1, iv.end)
    }
}

/// Normalize chromosome name for flexible matching
///
/// Converts to lowercase and removes common prefixes.
fn normalize_chrom_key(chrom: &str) -> String {
    let lower = chrom.to_lowercase();
    match lower.strip_prefix("chr") {
        Some(rest) => rest.to_string(),
        None => lower,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict() -> ReferenceDict {
        ReferenceDict::from_pairs(vec![("chr1", 10_000u64), ("chr2", 5_000), ("chrX", 2_000)])
    }

    #[test]
    fn test_dict_lookup_variants() {
        let d = dict();
        assert_eq!(d.id("chr1"), Some(0));
        assert_eq!(d.id("2"), Some(1));
        assert_eq!(d.id("CHRX"), Some(2));
        assert_eq!(d.id("chr3"), None);
        assert!(matches!(d.resolve("chr3"), Err(ResolutionError::UnknownChromosome(_))));
    }

    #[test]
    fn test_padded_clamps_at_zero() {
        let r = Region::new(GenomicInterval::new(0, 20, 40)).with_pad(50);
        assert_eq!(r.padded(), GenomicInterval::new(0, 0, 90));
    }

    #[test]
    fn test_interval_intersect() {
        let a = GenomicInterval::new(0, 100, 200);
        let b = GenomicInterval::new(0, 150, 300);
        assert_eq!(a.intersect(&b), Some(GenomicInterval::new(0, 150, 200)));
        assert_eq!(a.intersect(&GenomicInterval::new(0, 200, 300)), None);
        assert_eq!(a.intersect(&GenomicInterval::new(1, 100, 200)), None);
    }

    #[test]
    fn test_format_interval_one_based() {
        let d = dict();
        assert_eq!(d.format_interval(&GenomicInterval::new(0, 949, 1500)), "chr1:950-1500");
    }

    #[test]
    fn test_region_kind_flags() {
        let r = Region::new(GenomicInterval::new(0, 0, 1)).with_kind(RegionKind::LinkedExclude);
        assert!(r.linked && r.exclude);
        assert_eq!(r.kind(), RegionKind::LinkedExclude);
        assert!(Strand::Plus.compatible(&Strand::Unstranded));
        assert!(!Strand::Plus.compatible(&Strand::Minus));
    }
}
