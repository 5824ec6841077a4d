//! Alignment record abstraction
//!
//! The filter never mutates a read and only needs a handful of fields, so it
//! works against the [`AlignedRead`] trait. `rust_htslib::bam::Record`
//! implements it in `formats::bam`; [`OwnedRead`] is a plain in-memory record
//! used by in-memory sources and tests.

use std::borrow::Cow;

/// SAM flag bits
pub mod flags {
    pub const PAIRED: u16 = 0x1;
    pub const PROPER_PAIR: u16 = 0x2;
    pub const UNMAPPED: u16 = 0x4;
    pub const MATE_UNMAPPED: u16 = 0x8;
    pub const REVERSE: u16 = 0x10;
    pub const MATE_REVERSE: u16 = 0x20;
    pub const FIRST_IN_PAIR: u16 = 0x40;
    pub const LAST_IN_PAIR: u16 = 0x80;
    pub const SECONDARY: u16 = 0x100;
    pub const QC_FAIL: u16 = 0x200;
    pub const DUPLICATE: u16 = 0x400;
    pub const SUPPLEMENTARY: u16 = 0x800;
}

/// CIGAR operation types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CigarOp {
    Match(u32), Insertion(u32), Deletion(u32), Skip(u32),
    SoftClip(u32), HardClip(u32), Padding(u32), Equal(u32), Diff(u32),
}

impl CigarOp {
    pub fn len(&self) -> u32 {
        match self {
            CigarOp::Match(n) | CigarOp::Insertion(n) | CigarOp::Deletion(n) |
            CigarOp::Skip(n) | CigarOp::SoftClip(n) | CigarOp::HardClip(n) |
            CigarOp::Padding(n) | CigarOp::Equal(n) | CigarOp::Diff(n) => *n,
        }
    }

    pub fn is_clip(&self) -> bool {
        matches!(self, CigarOp::SoftClip(_) | CigarOp::HardClip(_))
    }

    fn from_code(code: u8, n: u32) -> Option<Self> {
        Some(match code {
            b'M' => CigarOp::Match(n),
            b'I' => CigarOp::Insertion(n),
            b'D' => CigarOp::Deletion(n),
            b'N' => CigarOp::Skip(n),
            b'S' => CigarOp::SoftClip(n),
            b'H' => CigarOp::HardClip(n),
            b'P' => CigarOp::Padding(n),
            b'=' => CigarOp::Equal(n),
            b'X' => CigarOp::Diff(n),
            _ => return None,
        })
    }

    /// Parse a textual CIGAR such as `5S90M2I3M`; `*` is the empty CIGAR
    pub fn parse_str(text: &str) -> Option<Vec<CigarOp>> {
        if text == "*" {
            return Some(vec![]);
        }
        let mut ops = Vec::new();
        let mut n: u32 = 0;
        let mut have_digits = false;
        for b in text.bytes() {
            if b.is_ascii_digit() {
                n = n.checked_mul(10)?.checked_add(u32::from(b - b'0'))?;
                have_digits = true;
            } else {
                if !have_digits {
                    return None;
                }
                ops.push(CigarOp::from_code(b, n)?);
                n = 0;
                have_digits = false;
            }
        }
        if have_digits {
            return None;
        }
        Some(ops)
    }
}

/// Read-only view of an alignment record
pub trait AlignedRead {
    fn qname(&self) -> &[u8];
    fn flags(&self) -> u16;
    /// Reference id, -1 when unplaced
    fn tid(&self) -> i32;
    /// Zero-based leftmost position, -1 when unplaced
    fn pos(&self) -> i64;
    fn mtid(&self) -> i32;
    fn mpos(&self) -> i64;
    fn mapq(&self) -> u8;
    /// Signed template length (TLEN)
    fn insert_size(&self) -> i64;
    fn cigar_ops(&self) -> Vec<CigarOp>;
    fn sequence(&self) -> Cow<'_, [u8]>;
    /// Phred base qualities, without the +33 offset
    fn qualities(&self) -> &[u8];
    /// Integer-valued aux tag
    fn tag_int(&self, tag: &[u8; 2]) -> Option<i64>;
    /// String-valued aux tag
    fn tag_str(&self, tag: &[u8; 2]) -> Option<String>;

    fn has_flag(&self, bit: u16) -> bool {
        self.flags() & bit != 0
    }
    fn is_paired(&self) -> bool {
        self.has_flag(flags::PAIRED)
    }
    fn is_unmapped(&self) -> bool {
        self.has_flag(flags::UNMAPPED)
    }
    fn is_mate_unmapped(&self) -> bool {
        self.has_flag(flags::MATE_UNMAPPED)
    }
    fn is_reverse(&self) -> bool {
        self.has_flag(flags::REVERSE)
    }
    fn is_mate_reverse(&self) -> bool {
        self.has_flag(flags::MATE_REVERSE)
    }
    fn is_duplicate(&self) -> bool {
        self.has_flag(flags::DUPLICATE)
    }
    fn is_qcfail(&self) -> bool {
        self.has_flag(flags::QC_FAIL)
    }
    fn is_supplementary(&self) -> bool {
        self.has_flag(flags::SUPPLEMENTARY)
    }
    fn is_first_in_pair(&self) -> bool {
        self.has_flag(flags::FIRST_IN_PAIR)
    }
    fn is_last_in_pair(&self) -> bool {
        self.has_flag(flags::LAST_IN_PAIR)
    }

    /// Position as an unsigned coordinate, `None` for unplaced reads
    fn placed_pos(&self) -> Option<(i32, u64)> {
        if self.tid() < 0 {
            return None;
        }
        u64::try_from(self.pos()).ok().map(|p| (self.tid(), p))
    }

    fn placed_mate_pos(&self) -> Option<(i32, u64)> {
        if self.mtid() < 0 {
            return None;
        }
        u64::try_from(self.mpos()).ok().map(|p| (self.mtid(), p))
    }
}

/// Aux tag value of an [`OwnedRead`]
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Int(i64),
    Str(String),
}

/// Plain in-memory alignment record
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OwnedRead {
    pub qname: Vec<u8>,
    pub flags: u16,
    pub tid: i32,
    pub pos: i64,
    pub mtid: i32,
    pub mpos: i64,
    pub mapq: u8,
    pub insert_size: i64,
    pub cigar: Vec<CigarOp>,
    pub seq: Vec<u8>,
    pub qual: Vec<u8>,
    pub tags: Vec<([u8; 2], TagValue)>,
}

impl OwnedRead {
    /// Unplaced, unmapped read with no sequence
    pub fn new(qname: &str) -> Self {
        Self {
            qname: qname.as_bytes().to_vec(),
            flags: flags::UNMAPPED,
            tid: -1,
            pos: -1,
            mtid: -1,
            mpos: -1,
            ..Default::default()
        }
    }

    /// Place the read and clear the unmapped bit
    pub fn at(mut self, tid: i32, pos: i64) -> Self {
        self.tid = tid;
        self.pos = pos;
        self.flags &= !flags::UNMAPPED;
        self
    }

    pub fn with_flags(mut self, bits: u16) -> Self {
        self.flags |= bits;
        self
    }

    pub fn with_mate(mut self, mtid: i32, mpos: i64) -> Self {
        self.mtid = mtid;
        self.mpos = mpos;
        self.flags |= flags::PAIRED;
        self
    }

    pub fn with_mapq(mut self, mapq: u8) -> Self {
        self.mapq = mapq;
        self
    }

    pub fn with_insert_size(mut self, insert_size: i64) -> Self {
        self.insert_size = insert_size;
        self
    }

    pub fn with_cigar(mut self, cigar: Vec<CigarOp>) -> Self {
        self.cigar = cigar;
        self
    }

    pub fn with_seq(mut self, seq: &[u8], qual: &[u8]) -> Self {
        self.seq = seq.to_vec();
        self.qual = qual.to_vec();
        self
    }

    pub fn with_tag(mut self, tag: [u8; 2], value: TagValue) -> Self {
        self.tags.retain(|(t, _)| *t != tag);
        self.tags.push((tag, value));
        self
    }

    fn tag(&self, tag: &[u8; 2]) -> Option<&TagValue> {
        self.tags.iter().find(|(t, _)| t == tag).map(|(_, v)| v)
    }
}

impl AlignedRead for OwnedRead {
    fn qname(&self) -> &[u8] {
        &self.qname
    }
    fn flags(&self) -> u16 {
        self.flags
    }
    fn tid(&self) -> i32 {
        self.tid
    }
    fn pos(&self) -> i64 {
        self.pos
    }
    fn mtid(&self) -> i32 {
        self.mtid
    }
    fn mpos(&self) -> i64 {
        self.mpos
    }
    fn mapq(&self) -> u8 {
        self.mapq
    }
    fn insert_size(&self) -> i64 {
        self.insert_size
    }
    fn cigar_ops(&self) -> Vec<CigarOp> {
        self.cigar.clone()
    }
    fn sequence(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(&self.seq)
    }
    fn qualities(&self) -> &[u8] {
        &self.qual
    }
    fn tag_int(&self, tag: &[u8; 2]) -> Option<i64> {
        match self.tag(tag)? {
            TagValue::Int(v) => Some(*v),
            TagValue::Str(_) => None,
        }
    }
    fn tag_str(&self, tag: &[u8; 2]) -> Option<String> {
        match self.tag(tag)? {
            TagValue::Str(s) => Some(s.clone()),
            TagValue::Int(_) => None,
        }
    }
}
