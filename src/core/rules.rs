//! Rule sets and the accept/reject decision
//!
//! A [`RuleSet`] binds a region to an ordered list of [`Condition`]s that
//! must all hold. A [`RuleCollection`] accepts a read iff at least one
//! include rule matches and no exclude rule does; the first matching include
//! rule is credited for reporting only.

use crate::core::condition::{Condition, EvalContext, NumericAttr};
use crate::core::index::RegionIndex;
use crate::core::matelink::MateLinkTracker;
use crate::core::read::AlignedRead;
use crate::core::region::RegionKind;
use std::fmt;

/// Where a rule applies
#[derive(Debug, Clone)]
pub enum RegionBinding {
    WholeGenome,
    Regions(RegionIndex),
}

impl RegionBinding {
    pub fn contains(&self, chrom_id: i32, pos: u64) -> bool {
        match self {
            RegionBinding::WholeGenome => true,
            RegionBinding::Regions(index) => index.contains_point(chrom_id, pos),
        }
    }

    pub fn is_whole_genome(&self) -> bool {
        matches!(self, RegionBinding::WholeGenome)
    }
}

/// A region plus conditions that must all hold
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub id: String,
    pub region: RegionBinding,
    pub kind: RegionKind,
    pub conditions: Vec<Condition>,
    trim_quality: Option<u8>,
}

impl RuleSet {
    /// The low bound of a non-inverted `phred` range becomes the trimming threshold
    pub fn new(
        id: impl Into<String>,
        region: RegionBinding,
        kind: RegionKind,
        conditions: Vec<Condition>,
    ) -> Self {
        let trim_quality = conditions.iter().find_map(|c| match c {
            Condition::Range { attr: NumericAttr::MeanQuality, range } if !range.is_inverted() => {
                u8::try_from(range.lo.clamp(0, i64::from(u8::MAX))).ok()
            }
            _ => None,
        });
        Self {
            id: id.into(),
            region,
            kind,
            conditions,
            trim_quality,
        }
    }

    pub fn is_exclude(&self) -> bool {
        self.kind.is_exclude()
    }

    pub fn is_linked(&self) -> bool {
        self.kind.is_linked()
    }

    pub fn trim_quality(&self) -> Option<u8> {
        self.trim_quality
    }

    /// Read's own start position lies in the bound region
    pub fn in_region<R: AlignedRead + ?Sized>(&self, read: &R) -> bool {
        if self.region.is_whole_genome() {
            return true;
        }
        match read.placed_pos() {
            Some((tid, pos)) => self.region.contains(tid, pos),
            None => false,
        }
    }

    /// Mate's start position lies in the bound region
    pub fn mate_in_region<R: AlignedRead + ?Sized>(&self, read: &R) -> bool {
        if !read.is_paired() {
            return false;
        }
        if self.region.is_whole_genome() {
            return true;
        }
        match read.placed_mate_pos() {
            Some((tid, pos)) => self.region.contains(tid, pos),
            None => false,
        }
    }

    /// All conditions hold (AND, in order, stopping at the first failure)
    pub fn conditions_match<R: AlignedRead + ?Sized>(&self, read: &R) -> bool {
        let ctx = EvalContext::new(self.trim_quality);
        self.conditions.iter().all(|c| c.evaluate(read, &ctx))
    }

    /// The read itself satisfies region and conditions
    pub fn matches<R: AlignedRead + ?Sized>(&self, read: &R) -> bool {
        self.in_region(read) && self.conditions_match(read)
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let region = match &self.region {
            RegionBinding::WholeGenome => "WG".to_string(),
            RegionBinding::Regions(index) => format!("{} regions", index.len()),
        };
        write!(f, "{} [{:?}] {}", self.id, self.kind, region)?;
        for c in &self.conditions {
            write!(f, " {}", c)?;
        }
        Ok(())
    }
}

/// Per-rule counters, indexed like the rules of the collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleCounters {
    /// Reads that matched the rule
    pub hits: Vec<u64>,
    /// Reads the rule was evaluated on
    pub evaluated: Vec<u64>,
}

impl RuleCounters {
    pub fn new(rules: usize) -> Self {
        Self {
            hits: vec![0; rules],
            evaluated: vec![0; rules],
        }
    }

    pub fn reset(&mut self) {
        self.hits.iter_mut().for_each(|h| *h = 0);
        self.evaluated.iter_mut().for_each(|e| *e = 0);
    }
}

/// Outcome of evaluating one read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Decision {
    pub accept: bool,
    /// First matching include rule
    pub matched_rule: Option<usize>,
    /// First matching exclude rule
    pub excluded_by: Option<usize>,
}

/// Whether evaluation may stop once the decision is known
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvalMode {
    #[default]
    ShortCircuit,
    /// Evaluate every rule so every counter is complete
    CountAll,
}

/// Ordered rule sets; read-only during a scan except for the counters passed in
#[derive(Debug, Clone, Default)]
pub struct RuleCollection {
    rules: Vec<RuleSet>,
}

impl RuleCollection {
    pub fn new(rules: Vec<RuleSet>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[RuleSet] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn new_counters(&self) -> RuleCounters {
        RuleCounters::new(self.rules.len())
    }

    pub fn has_linked(&self) -> bool {
        self.rules.iter().any(|r| r.is_linked())
    }

    /// Union of the include rules' regions; `None` when one of them spans the whole genome
    pub fn all_regions(&self) -> Option<RegionIndex> {
        let mut union = RegionIndex::default();
        for rule in self.rules.iter().filter(|r| !r.is_exclude()) {
            match &rule.region {
                RegionBinding::WholeGenome => return None,
                RegionBinding::Regions(index) => union = union.union(index),
            }
        }
        Some(union)
    }

    /// Does rule `idx` match `read`
    ///
    /// For a linked rule with a tracker, a paired read matches iff its pair
    /// was resolved in the mate-link pass; unpaired reads and rules without
    /// a tracker fall back to the read's own match. A linked exclude rule
    /// also removes a read that matches it on its own, mate present or not.
    fn rule_matches<R: AlignedRead + ?Sized>(
        &self,
        idx: usize,
        read: &R,
        tracker: Option<&MateLinkTracker>,
    ) -> bool {
        let rule = &self.rules[idx];
        match tracker {
            Some(t) if rule.is_linked() && read.is_paired() => {
                t.is_resolved(idx, read.qname()) || (rule.is_exclude() && rule.matches(read))
            }
            _ => rule.matches(read),
        }
    }

    /// Decide a read
    ///
    /// The accept/reject outcome does not depend on `mode`; only how many
    /// counters are updated does.
    pub fn evaluate<R: AlignedRead + ?Sized>(
        &self,
        read: &R,
        counters: &mut RuleCounters,
        mode: EvalMode,
        tracker: Option<&MateLinkTracker>,
    ) -> Decision {
        let mut decision = Decision::default();

        for (idx, rule) in self.rules.iter().enumerate() {
            if mode == EvalMode::ShortCircuit {
                if decision.excluded_by.is_some() {
                    break;
                }
                if decision.matched_rule.is_some() && !rule.is_exclude() {
                    continue;
                }
            }

            counters.evaluated[idx] += 1;
            if !self.rule_matches(idx, read, tracker) {
                continue;
            }
            counters.hits[idx] += 1;

            if rule.is_exclude() {
                decision.excluded_by.get_or_insert(idx);
            } else {
                decision.matched_rule.get_or_insert(idx);
            }
        }

        decision.accept = decision.matched_rule.is_some() && decision.excluded_by.is_none();
        decision
    }
}

impl fmt::Display for RuleCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "RuleCollection with {} rules", self.rules.len())?;
        for rule in &self.rules {
            writeln!(f, "  {}", rule)?;
        }
        Ok(())
    }
}
