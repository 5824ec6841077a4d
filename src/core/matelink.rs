//! Mate-linked rules
//!
//! A linked rule admits a pair when either mate satisfies its region and
//! conditions, and then both mates must be written. The stream is forward
//! only and a mate may lie anywhere, so linking runs as a separate first pass
//! that keeps query names only: a name is resolved once both mates have been
//! observed and at least one of them matched. The filtering pass then asks
//! [`MateLinkTracker::is_resolved`].

use crate::core::read::{flags, AlignedRead};
use crate::core::rules::RuleCollection;
use log::debug;
use std::collections::{HashMap, HashSet};

const FIRST_MATE: u8 = 0b01;
const SECOND_MATE: u8 = 0b10;
const BOTH_MATES: u8 = FIRST_MATE | SECOND_MATE;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct PairState {
    seen: u8,
    matched: bool,
}

/// Summary of a finished linking pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkSummary {
    pub reads_observed: u64,
    pub resolved: usize,
    /// Names with a match whose mate never showed up, or with no match at all
    pub dropped: usize,
}

/// Query-name cross reference for linked rules
///
/// One slot per rule of the collection; slots of non-linked rules stay empty.
#[derive(Debug, Clone, Default)]
pub struct MateLinkTracker {
    linked: Vec<usize>,
    pending: Vec<HashMap<Vec<u8>, PairState>>,
    resolved: Vec<HashSet<Vec<u8>>>,
    reads_observed: u64,
    /// Complete pairs where neither mate matched
    unmatched: usize,
}

/// Which mate a record stands for; secondary and supplementary records count for neither
fn mate_bit<R: AlignedRead + ?Sized>(read: &R) -> u8 {
    if read.has_flag(flags::SECONDARY) || read.is_supplementary() {
        0
    } else if read.is_first_in_pair() {
        FIRST_MATE
    } else if read.is_last_in_pair() {
        SECOND_MATE
    } else {
        0
    }
}

impl MateLinkTracker {
    pub fn new(rules: &RuleCollection) -> Self {
        let n = rules.len();
        Self {
            linked: rules
                .rules()
                .iter()
                .enumerate()
                .filter(|(_, r)| r.is_linked())
                .map(|(i, _)| i)
                .collect(),
            pending: vec![HashMap::new(); n],
            resolved: vec![HashSet::new(); n],
            reads_observed: 0,
            unmatched: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.linked.is_empty()
    }

    /// Feed one read of the linking pass
    ///
    /// A paired read is recorded for a linked rule when it matches the rule
    /// itself or when its mate's position lies in the rule's region (the mate
    /// may be the one that matches). Unpaired reads are not tracked. A name
    /// leaves the pending set as soon as both primary mates were seen.
    pub fn observe<R: AlignedRead + ?Sized>(&mut self, rules: &RuleCollection, read: &R) {
        self.reads_observed += 1;
        if !read.is_paired() {
            return;
        }
        let bit = mate_bit(read);
        let qname = read.qname();

        for &idx in &self.linked {
            if self.resolved[idx].contains(qname) {
                continue;
            }
            let rule = &rules.rules()[idx];
            let self_match = rule.matches(read);
            if !self_match && !rule.mate_in_region(read) {
                continue;
            }

            let state = self.pending[idx].entry(qname.to_vec()).or_default();
            state.seen |= bit;
            state.matched |= self_match;

            if state.seen == BOTH_MATES {
                let matched = state.matched;
                self.pending[idx].remove(qname);
                if matched {
                    self.resolved[idx].insert(qname.to_vec());
                } else {
                    self.unmatched += 1;
                }
            }
        }
    }

    /// Close the linking pass; unresolved names are dropped
    pub fn finish(&mut self) -> LinkSummary {
        let dropped = self.pending.iter().map(|p| p.len()).sum::<usize>() + self.unmatched;
        for p in &mut self.pending {
            p.clear();
            p.shrink_to_fit();
        }
        let summary = LinkSummary {
            reads_observed: self.reads_observed,
            resolved: self.resolved_count(),
            dropped,
        };
        debug!(
            "Mate-link pass: {} reads, {} pairs resolved, {} names dropped",
            summary.reads_observed, summary.resolved, summary.dropped
        );
        summary
    }

    pub fn is_resolved(&self, rule_idx: usize, qname: &[u8]) -> bool {
        self.resolved
            .get(rule_idx)
            .map_or(false, |names| names.contains(qname))
    }

    /// Resolved for any linked rule
    pub fn is_resolved_any(&self, qname: &[u8]) -> bool {
        self.linked.iter().any(|&idx| self.resolved[idx].contains(qname))
    }

    pub fn resolved_count(&self) -> usize {
        self.resolved.iter().map(|r| r.len()).sum()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.iter().map(|p| p.len()).sum()
    }
}
