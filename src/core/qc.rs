//! Per read group QC statistics
//!
//! Counts flag categories and keeps mapping quality, insert size and clip
//! length distributions for every read the filtering pass sees, before any
//! rule is applied.

use crate::core::read::AlignedRead;
use std::collections::BTreeMap;

/// Read group of reads without an RG tag
pub const NO_READ_GROUP: &str = "NA";

/// Value to count map, ordered by value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Histogram {
    counts: BTreeMap<i64, u64>,
}

impl Histogram {
    pub fn add(&mut self, value: i64) {
        *self.counts.entry(value).or_insert(0) += 1;
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn count(&self, value: i64) -> u64 {
        self.counts.get(&value).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, u64)> + '_ {
        self.counts.iter().map(|(&v, &n)| (v, n))
    }

    pub fn mean(&self) -> Option<f64> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        let sum: f64 = self.counts.iter().map(|(&v, &n)| v as f64 * n as f64).sum();
        Some(sum / total as f64)
    }

    /// Lower median
    pub fn median(&self) -> Option<i64> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        let target = total.div_ceil(2);
        let mut seen = 0;
        for (&v, &n) in &self.counts {
            seen += n;
            if seen >= target {
                return Some(v);
            }
        }
        None
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadGroupStats {
    pub total: u64,
    pub mapped: u64,
    pub duplicate: u64,
    pub qcfail: u64,
    pub supplementary: u64,
    /// Mapped reads only
    pub mapq: Histogram,
    /// Absolute template length of mapped paired reads with a nonzero value
    pub insert_size: Histogram,
    /// Soft and hard clipped bases of mapped reads
    pub clip: Histogram,
}

impl ReadGroupStats {
    pub fn add<R: AlignedRead + ?Sized>(&mut self, read: &R) {
        self.total += 1;
        if read.is_duplicate() {
            self.duplicate += 1;
        }
        if read.is_qcfail() {
            self.qcfail += 1;
        }
        if read.is_supplementary() {
            self.supplementary += 1;
        }
        if read.is_unmapped() {
            return;
        }
        self.mapped += 1;
        self.mapq.add(read.mapq() as i64);
        let clipped: u32 = read
            .cigar_ops()
            .iter()
            .filter(|op| op.is_clip())
            .map(|op| op.len())
            .sum();
        self.clip.add(clipped as i64);
        if read.is_paired() && read.insert_size() != 0 {
            self.insert_size.add(read.insert_size().abs());
        }
    }
}

/// Statistics keyed by the RG tag
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QcStats {
    groups: BTreeMap<String, ReadGroupStats>,
}

impl QcStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<R: AlignedRead + ?Sized>(&mut self, read: &R) {
        let group = read.tag_str(b"RG").unwrap_or_else(|| NO_READ_GROUP.to_string());
        self.groups.entry(group).or_default().add(read);
    }

    pub fn group(&self, name: &str) -> Option<&ReadGroupStats> {
        self.groups.get(name)
    }

    /// Groups in name order
    pub fn groups(&self) -> impl Iterator<Item = (&str, &ReadGroupStats)> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn total(&self) -> u64 {
        self.groups.values().map(|g| g.total).sum()
    }
}
