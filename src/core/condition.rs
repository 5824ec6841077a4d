//! Per-read conditions
//!
//! A [`Condition`] is one key of a rule: a flag test, a numeric range over a
//! derived read attribute, a motif list, a subsample draw, a read-group match
//! or a raw flag mask. Evaluation is pure; attributes that are costly to
//! derive (CIGAR, quality trimming) are computed at most once per read and
//! rule through [`EvalContext`].

use crate::core::read::{AlignedRead, CigarOp};
use memchr::memmem;
use std::cell::OnceCell;
use std::fmt;

/// Inclusive numeric range with the inverted-range convention
///
/// `lo <= hi` accepts `lo <= v <= hi`. `lo > hi` accepts values outside
/// `[hi, lo]`, i.e. `v < hi || v > lo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericRange {
    pub lo: i64,
    pub hi: i64,
}

impl NumericRange {
    pub fn new(lo: i64, hi: i64) -> Self {
        Self { lo, hi }
    }

    pub fn at_least(lo: i64) -> Self {
        Self { lo, hi: i64::MAX }
    }

    pub fn at_most(hi: i64) -> Self {
        Self { lo: 0, hi }
    }

    pub fn is_inverted(&self) -> bool {
        self.lo > self.hi
    }

    /// Range test
    ///
    /// # Examples
    /// ```
    /// use fast_variantbam::core::NumericRange;
    /// assert!(NumericRange::new(5, 101).contains(5));
    /// assert!(!NumericRange::new(101, 5).contains(50));
    /// assert!(NumericRange::new(101, 5).contains(4));
    /// ```
    pub fn contains(&self, value: i64) -> bool {
        if self.lo <= self.hi {
            self.lo <= value && value <= self.hi
        } else {
            value < self.hi || value > self.lo
        }
    }
}

impl fmt::Display for NumericRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: i64| if v == i64::MAX { "inf".to_string() } else { v.to_string() };
        if self.is_inverted() {
            write!(f, "NOT[{},{}]", show(self.hi), show(self.lo))
        } else {
            write!(f, "[{},{}]", show(self.lo), show(self.hi))
        }
    }
}

/// Mate-pair orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    FF,
    RR,
    FR,
    RF,
}

/// Boolean properties of a read or its pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagCondition {
    Duplicate,
    QcFail,
    Supplementary,
    Mapped,
    MateMapped,
    FwdStrand,
    RevStrand,
    MateFwdStrand,
    MateRevStrand,
    Orientation(Orientation),
    InterChromosomal,
}

impl FlagCondition {
    pub const ALL: [FlagCondition; 14] = [
        FlagCondition::Duplicate,
        FlagCondition::QcFail,
        FlagCondition::Supplementary,
        FlagCondition::Mapped,
        FlagCondition::MateMapped,
        FlagCondition::FwdStrand,
        FlagCondition::RevStrand,
        FlagCondition::MateFwdStrand,
        FlagCondition::MateRevStrand,
        FlagCondition::Orientation(Orientation::FF),
        FlagCondition::Orientation(Orientation::RR),
        FlagCondition::Orientation(Orientation::FR),
        FlagCondition::Orientation(Orientation::RF),
        FlagCondition::InterChromosomal,
    ];

    /// Look up a rule-script key; `supp` is accepted for `supplementary`
    pub fn from_key(key: &str) -> Option<Self> {
        if key == "supp" {
            return Some(FlagCondition::Supplementary);
        }
        Self::ALL.iter().find(|f| f.key() == key).copied()
    }

    pub fn key(&self) -> &'static str {
        match self {
            FlagCondition::Duplicate => "duplicate",
            FlagCondition::QcFail => "qcfail",
            FlagCondition::Supplementary => "supplementary",
            FlagCondition::Mapped => "mapped",
            FlagCondition::MateMapped => "mate_mapped",
            FlagCondition::FwdStrand => "fwd_strand",
            FlagCondition::RevStrand => "rev_strand",
            FlagCondition::MateFwdStrand => "mate_fwd_strand",
            FlagCondition::MateRevStrand => "mate_rev_strand",
            FlagCondition::Orientation(Orientation::FF) => "ff",
            FlagCondition::Orientation(Orientation::RR) => "rr",
            FlagCondition::Orientation(Orientation::FR) => "fr",
            FlagCondition::Orientation(Orientation::RF) => "rf",
            FlagCondition::InterChromosomal => "ic",
        }
    }

    pub fn test<R: AlignedRead + ?Sized>(&self, read: &R) -> bool {
        match self {
            FlagCondition::Duplicate => read.is_duplicate(),
            FlagCondition::QcFail => read.is_qcfail(),
            FlagCondition::Supplementary => read.is_supplementary(),
            FlagCondition::Mapped => !read.is_unmapped(),
            FlagCondition::MateMapped => read.is_paired() && !read.is_mate_unmapped(),
            FlagCondition::FwdStrand => !read.is_reverse(),
            FlagCondition::RevStrand => read.is_reverse(),
            FlagCondition::MateFwdStrand => read.is_paired() && !read.is_mate_reverse(),
            FlagCondition::MateRevStrand => read.is_paired() && read.is_mate_reverse(),
            FlagCondition::Orientation(o) => pair_orientation(read) == Some(*o),
            FlagCondition::InterChromosomal => {
                read.is_paired() && read.tid() >= 0 && read.mtid() >= 0 && read.tid() != read.mtid()
            }
        }
    }
}

/// Orientation of a mapped, same-chromosome pair, by leftmost then rightmost mate
pub fn pair_orientation<R: AlignedRead + ?Sized>(read: &R) -> Option<Orientation> {
    if !read.is_paired() || read.is_unmapped() || read.is_mate_unmapped() {
        return None;
    }
    if read.tid() < 0 || read.tid() != read.mtid() {
        return None;
    }
    let self_leftmost = match read.pos().cmp(&read.mpos()) {
        std::cmp::Ordering::Less => true,
        std::cmp::Ordering::Greater => false,
        std::cmp::Ordering::Equal => !read.is_last_in_pair(),
    };
    let (left_rev, right_rev) = if self_leftmost {
        (read.is_reverse(), read.is_mate_reverse())
    } else {
        (read.is_mate_reverse(), read.is_reverse())
    };
    Some(match (left_rev, right_rev) {
        (false, false) => Orientation::FF,
        (true, true) => Orientation::RR,
        (false, true) => Orientation::FR,
        (true, false) => Orientation::RF,
    })
}

/// Numeric read attributes available to range conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericAttr {
    Insertions,
    Deletions,
    Mismatches,
    SupplementaryCount,
    InsertSize,
    TrimmedLength,
    ClippedBases,
    NBases,
    MeanQuality,
    MappingQuality,
}

impl NumericAttr {
    pub const ALL: [NumericAttr; 10] = [
        NumericAttr::Insertions,
        NumericAttr::Deletions,
        NumericAttr::Mismatches,
        NumericAttr::SupplementaryCount,
        NumericAttr::InsertSize,
        NumericAttr::TrimmedLength,
        NumericAttr::ClippedBases,
        NumericAttr::NBases,
        NumericAttr::MeanQuality,
        NumericAttr::MappingQuality,
    ];

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().find(|a| a.key() == key).copied()
    }

    /// Range implied by a single threshold: at most for `nbases`, at least otherwise
    pub fn threshold(&self, value: i64) -> NumericRange {
        match self {
            NumericAttr::NBases => NumericRange::at_most(value),
            _ => NumericRange::at_least(value),
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            NumericAttr::Insertions => "ins",
            NumericAttr::Deletions => "del",
            NumericAttr::Mismatches => "nm",
            NumericAttr::SupplementaryCount => "xp",
            NumericAttr::InsertSize => "isize",
            NumericAttr::TrimmedLength => "len",
            NumericAttr::ClippedBases => "clip",
            NumericAttr::NBases => "nbases",
            NumericAttr::MeanQuality => "phred",
            NumericAttr::MappingQuality => "mapq",
        }
    }
}

/// Set of motifs; a read matches if its sequence contains any of them
#[derive(Debug, Clone)]
pub struct MotifSet {
    finders: Vec<memmem::Finder<'static>>,
}

impl MotifSet {
    /// Empty motifs are ignored
    pub fn new<I, S>(motifs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let finders = motifs
            .into_iter()
            .filter(|m| !m.as_ref().is_empty())
            .map(|m| memmem::Finder::new(m.as_ref()).into_owned())
            .collect();
        Self { finders }
    }

    pub fn len(&self) -> usize {
        self.finders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.finders.is_empty()
    }

    pub fn matches(&self, seq: &[u8]) -> bool {
        self.finders.iter().any(|f| f.find(seq).is_some())
    }
}

/// One condition of a rule
#[derive(Debug, Clone)]
pub enum Condition {
    /// Boolean property must equal `expected`
    Flag { flag: FlagCondition, expected: bool },
    /// Derived attribute must fall in the range
    Range { attr: NumericAttr, range: NumericRange },
    Motif(MotifSet),
    /// Keep a deterministic fraction `rate` of query names
    Subsample { rate: f64, seed: u32 },
    ReadGroup(String),
    /// All of these flag bits must be set
    IncludeFlags(u16),
    /// None of these flag bits may be set
    ExcludeFlags(u16),
}

impl Condition {
    pub fn flag(flag: FlagCondition, expected: bool) -> Self {
        Condition::Flag { flag, expected }
    }

    pub fn range(attr: NumericAttr, range: NumericRange) -> Self {
        Condition::Range { attr, range }
    }

    pub fn evaluate<R: AlignedRead + ?Sized>(&self, read: &R, ctx: &EvalContext) -> bool {
        match self {
            Condition::Flag { flag, expected } => flag.test(read) == *expected,
            Condition::Range { attr, range } => range.contains(ctx.attribute(read, *attr)),
            Condition::Motif(motifs) => motifs.matches(&read.sequence()),
            Condition::Subsample { rate, seed } => subsample_keep(read.qname(), *rate, *seed),
            Condition::ReadGroup(rg) => read.tag_str(b"RG").as_deref() == Some(rg.as_str()),
            Condition::IncludeFlags(mask) => read.flags() & mask == *mask,
            Condition::ExcludeFlags(mask) => read.flags() & mask == 0,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Flag { flag, expected } => write!(f, "{}:{}", flag.key(), expected),
            Condition::Range { attr, range } => write!(f, "{}:{}", attr.key(), range),
            Condition::Motif(m) => write!(f, "motif:{} seqs", m.len()),
            Condition::Subsample { rate, .. } => write!(f, "subsample:{}", rate),
            Condition::ReadGroup(rg) => write!(f, "rg:{}", rg),
            Condition::IncludeFlags(mask) => write!(f, "include_flag:{}", mask),
            Condition::ExcludeFlags(mask) => write!(f, "exclude_flag:{}", mask),
        }
    }
}

/// Result of quality-trimming a read from both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimInfo {
    /// First retained base
    pub start: usize,
    /// One past the last retained base
    pub end: usize,
    /// Bases removed by trimming
    pub trimmed: usize,
}

impl TrimInfo {
    pub fn retained(&self) -> usize {
        self.end - self.start
    }
}

/// Trim bases below `min_quality` from both ends
///
/// Without a threshold, or when qualities are absent (htslib stores `0xff`),
/// nothing is trimmed.
pub fn quality_trim(qual: &[u8], min_quality: Option<u8>) -> TrimInfo {
    let untrimmed = TrimInfo { start: 0, end: qual.len(), trimmed: 0 };
    let Some(min_q) = min_quality else {
        return untrimmed;
    };
    if qual.first() == Some(&0xff) {
        return untrimmed;
    }
    match qual.iter().position(|&q| q >= min_q) {
        Some(start) => {
            // position() found a qualifying base, so rposition() will too
            let end = qual.iter().rposition(|&q| q >= min_q).map_or(start, |i| i + 1);
            TrimInfo { start, end, trimmed: qual.len() - (end - start) }
        }
        None => TrimInfo { start: 0, end: 0, trimmed: qual.len() },
    }
}

/// Lazily derived per-read values shared by the conditions of one rule
#[derive(Debug, Default)]
pub struct EvalContext {
    trim_quality: Option<u8>,
    cigar: OnceCell<Vec<CigarOp>>,
    trim: OnceCell<TrimInfo>,
}

impl EvalContext {
    /// `trim_quality` is the quality-trimming threshold of the rule, if any
    pub fn new(trim_quality: Option<u8>) -> Self {
        Self {
            trim_quality,
            ..Default::default()
        }
    }

    fn cigar<R: AlignedRead + ?Sized>(&self, read: &R) -> &[CigarOp] {
        self.cigar.get_or_init(|| read.cigar_ops())
    }

    fn trim<R: AlignedRead + ?Sized>(&self, read: &R) -> TrimInfo {
        *self.trim.get_or_init(|| quality_trim(read.qualities(), self.trim_quality))
    }

    fn cigar_sum<R, F>(&self, read: &R, pred: F) -> i64
    where
        R: AlignedRead + ?Sized,
        F: Fn(&CigarOp) -> bool,
    {
        self.cigar(read).iter().filter(|op| pred(*op)).map(|op| i64::from(op.len())).sum()
    }

    /// Value of a numeric attribute for `read`
    pub fn attribute<R: AlignedRead + ?Sized>(&self, read: &R, attr: NumericAttr) -> i64 {
        match attr {
            NumericAttr::Insertions => self.cigar_sum(read, |op| matches!(op, CigarOp::Insertion(_))),
            NumericAttr::Deletions => self.cigar_sum(read, |op| matches!(op, CigarOp::Deletion(_))),
            NumericAttr::Mismatches => read.tag_int(b"NM").unwrap_or(0),
            NumericAttr::SupplementaryCount => supplementary_count(read),
            NumericAttr::InsertSize => read.insert_size().saturating_abs(),
            NumericAttr::TrimmedLength => {
                let trim = self.trim(read);
                let retained = trim.retained() as i64;
                if trim.trimmed > 0 {
                    retained
                } else {
                    retained + self.cigar_sum(read, |op| matches!(op, CigarOp::HardClip(_)))
                }
            }
            NumericAttr::ClippedBases => {
                let clipped = self.cigar_sum(read, CigarOp::is_clip);
                (clipped - self.trim(read).trimmed as i64).max(0)
            }
            NumericAttr::NBases => {
                read.sequence().iter().filter(|&&b| b == b'N' || b == b'n').count() as i64
            }
            NumericAttr::MeanQuality => {
                let trim = self.trim(read);
                let qual = read.qualities();
                if trim.retained() == 0 || qual.first() == Some(&0xff) {
                    return 0;
                }
                let sum: i64 = qual[trim.start..trim.end].iter().map(|&q| i64::from(q)).sum();
                sum / trim.retained() as i64
            }
            NumericAttr::MappingQuality => i64::from(read.mapq()),
        }
    }
}

/// Number of alternative alignments listed in the `XP` (or else `XA`) tag
fn supplementary_count<R: AlignedRead + ?Sized>(read: &R) -> i64 {
    let listed = read.tag_str(b"XP").or_else(|| read.tag_str(b"XA"));
    match listed {
        Some(s) => s.split(';').filter(|e| !e.is_empty()).count() as i64,
        None => 0,
    }
}

/// htslib's X31 string hash
fn x31_hash(s: &[u8]) -> u32 {
    let mut iter = s.iter();
    let Some(&first) = iter.next() else {
        return 0;
    };
    iter.fold(u32::from(first), |h, &c| (h << 5).wrapping_sub(h).wrapping_add(u32::from(c)))
}

/// Thomas Wang's 32-bit integer mix, as used by khash
fn wang_hash(mut key: u32) -> u32 {
    key = key.wrapping_add(!(key << 15));
    key ^= key >> 10;
    key = key.wrapping_add(key << 3);
    key ^= key >> 6;
    key = key.wrapping_add(!(key << 11));
    key ^= key >> 16;
    key
}

/// Deterministic subsample draw keyed on the query name
///
/// Both mates share a name and therefore a draw. The fraction is taken from
/// the low 24 bits of the hash, the same construction as `samtools view -s`.
pub fn subsample_keep(qname: &[u8], rate: f64, seed: u32) -> bool {
    let k = wang_hash(x31_hash(qname) ^ seed);
    let fraction = f64::from(k & 0x00ff_ffff) / f64::from(0x0100_0000u32);
    fraction < rate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::read::{flags, OwnedRead, TagValue};

    fn eval(cond: &Condition, read: &OwnedRead) -> bool {
        cond.evaluate(read, &EvalContext::new(None))
    }

    #[test]
    fn test_range_convention() {
        let r = NumericRange::new(5, 101);
        assert!(r.contains(5) && r.contains(101) && !r.contains(4) && !r.contains(102));
        let inv = NumericRange::new(101, 5);
        assert!(inv.contains(4) && inv.contains(102));
        assert!(!inv.contains(5) && !inv.contains(50) && !inv.contains(101));
    }

    #[test]
    fn test_range_display() {
        assert_eq!(NumericRange::at_least(20).to_string(), "[20,inf]");
        assert_eq!(NumericRange::new(101, 5).to_string(), "NOT[5,101]");
    }

    #[test]
    fn test_insertions_and_deletions() {
        let read = OwnedRead::new("r")
            .at(0, 10)
            .with_cigar(CigarOp::parse_str("10M3I5M2D4M2I").unwrap());
        let ctx = EvalContext::new(None);
        assert_eq!(ctx.attribute(&read, NumericAttr::Insertions), 5);
        assert_eq!(ctx.attribute(&read, NumericAttr::Deletions), 2);
    }

    #[test]
    fn test_insert_size_absolute() {
        let read = OwnedRead::new("r").at(0, 10).with_insert_size(-350);
        let cond = Condition::range(NumericAttr::InsertSize, NumericRange::new(100, 500));
        assert!(eval(&cond, &read));
    }

    #[test]
    fn test_quality_trim() {
        let trim = quality_trim(&[2, 2, 30, 30, 10, 30, 2], Some(20));
        assert_eq!(trim, TrimInfo { start: 2, end: 6, trimmed: 3 });
        assert_eq!(quality_trim(&[2, 2], Some(20)).retained(), 0);
        assert_eq!(quality_trim(&[2, 2], None).trimmed, 0);
        assert_eq!(quality_trim(&[0xff, 0xff], Some(20)).trimmed, 0);
    }

    #[test]
    fn test_trimmed_length_counts_hardclips_only_without_trimming() {
        let read = OwnedRead::new("r")
            .at(0, 0)
            .with_cigar(CigarOp::parse_str("5H6M").unwrap())
            .with_seq(b"ACGTAC", &[30, 30, 30, 30, 30, 30]);
        assert_eq!(EvalContext::new(Some(20)).attribute(&read, NumericAttr::TrimmedLength), 11);
        assert_eq!(EvalContext::new(None).attribute(&read, NumericAttr::TrimmedLength), 11);

        let trimmed = read.clone().with_seq(b"ACGTAC", &[5, 30, 30, 30, 30, 5]);
        assert_eq!(EvalContext::new(Some(20)).attribute(&trimmed, NumericAttr::TrimmedLength), 4);
    }

    #[test]
    fn test_clipped_bases_after_trimming() {
        let read = OwnedRead::new("r")
            .at(0, 0)
            .with_cigar(CigarOp::parse_str("3S4M2H").unwrap())
            .with_seq(b"NNNACGT", &[2, 2, 30, 30, 30, 30, 30]);
        assert_eq!(EvalContext::new(None).attribute(&read, NumericAttr::ClippedBases), 5);
        assert_eq!(EvalContext::new(Some(20)).attribute(&read, NumericAttr::ClippedBases), 3);
        assert_eq!(EvalContext::new(None).attribute(&read, NumericAttr::NBases), 3);
    }

    #[test]
    fn test_mean_quality_over_retained_bases() {
        let read = OwnedRead::new("r").at(0, 0).with_seq(b"ACGT", &[2, 30, 40, 2]);
        assert_eq!(EvalContext::new(Some(20)).attribute(&read, NumericAttr::MeanQuality), 35);
        assert_eq!(EvalContext::new(None).attribute(&read, NumericAttr::MeanQuality), 18);
    }

    #[test]
    fn test_supplementary_count() {
        let read = OwnedRead::new("r")
            .at(0, 0)
            .with_tag(*b"XA", TagValue::Str("chr1,+100,50M,0;chr2,-5,50M,1;".into()));
        assert_eq!(EvalContext::new(None).attribute(&read, NumericAttr::SupplementaryCount), 2);
    }

    #[test]
    fn test_orientation() {
        let fr = OwnedRead::new("p").at(0, 100).with_mate(0, 300).with_flags(flags::MATE_REVERSE);
        assert_eq!(pair_orientation(&fr), Some(Orientation::FR));
        let mate = OwnedRead::new("p").at(0, 300).with_mate(0, 100).with_flags(flags::REVERSE);
        assert_eq!(pair_orientation(&mate), Some(Orientation::FR));
        let rf = OwnedRead::new("p").at(0, 100).with_mate(0, 300).with_flags(flags::REVERSE);
        assert_eq!(pair_orientation(&rf), Some(Orientation::RF));
        let ic = OwnedRead::new("p").at(0, 100).with_mate(1, 300);
        assert_eq!(pair_orientation(&ic), None);
        assert!(FlagCondition::InterChromosomal.test(&ic));
        assert!(!FlagCondition::InterChromosomal.test(&fr));
    }

    #[test]
    fn test_flag_condition_false_polarity() {
        let dup = OwnedRead::new("d").at(0, 1).with_flags(flags::DUPLICATE);
        assert!(!eval(&Condition::flag(FlagCondition::Duplicate, false), &dup));
        assert!(eval(&Condition::flag(FlagCondition::Duplicate, true), &dup));
        assert!(eval(&Condition::flag(FlagCondition::Mapped, true), &dup));
    }

    #[test]
    fn test_motif() {
        let read = OwnedRead::new("m").at(0, 0).with_seq(b"AAACCCGGGTTT", &[]);
        assert!(eval(&Condition::Motif(MotifSet::new(["TTTT", "CCGG"])), &read));
        assert!(!eval(&Condition::Motif(MotifSet::new(["TTTT", "GGGG"])), &read));
        assert!(!eval(&Condition::Motif(MotifSet::new(Vec::<&str>::new())), &read));
    }

    #[test]
    fn test_flag_masks_and_read_group() {
        let read = OwnedRead::new("f")
            .at(0, 0)
            .with_flags(flags::PAIRED | flags::FIRST_IN_PAIR)
            .with_tag(*b"RG", TagValue::Str("grp1".into()));
        assert!(eval(&Condition::IncludeFlags(0x41), &read));
        assert!(!eval(&Condition::IncludeFlags(0x81), &read));
        assert!(eval(&Condition::ExcludeFlags(0x400), &read));
        assert!(!eval(&Condition::ExcludeFlags(0x40), &read));
        assert!(eval(&Condition::ReadGroup("grp1".into()), &read));
        assert!(!eval(&Condition::ReadGroup("grp2".into()), &read));
    }

    #[test]
    fn test_subsample_bounds_and_determinism() {
        for i in 0..200 {
            let name = format!("read{}", i);
            assert!(!subsample_keep(name.as_bytes(), 0.0, 0));
            assert!(subsample_keep(name.as_bytes(), 1.0, 0));
            assert_eq!(subsample_keep(name.as_bytes(), 0.5, 7), subsample_keep(name.as_bytes(), 0.5, 7));
        }
    }

    #[test]
    fn test_subsample_rate_roughly_respected() {
        let kept = (0..10_000)
            .filter(|i| subsample_keep(format!("q{}", i).as_bytes(), 0.3, 0))
            .count();
        assert!((2_000..4_000).contains(&kept), "kept {}", kept);
    }

    #[test]
    fn test_keys_round_trip() {
        for flag in FlagCondition::ALL {
            assert_eq!(FlagCondition::from_key(flag.key()), Some(flag));
        }
        for attr in NumericAttr::ALL {
            assert_eq!(NumericAttr::from_key(attr.key()), Some(attr));
        }
        assert_eq!(FlagCondition::from_key("supp"), Some(FlagCondition::Supplementary));
        assert_eq!(NumericAttr::from_key("mapqq"), None);
        assert_eq!(NumericAttr::NBases.threshold(3), NumericRange::at_most(3));
        assert_eq!(NumericAttr::MappingQuality.threshold(3), NumericRange::at_least(3));
    }
}
