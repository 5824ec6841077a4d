//! Per-rule counts and QC reports
//!
//! One tab-separated line per rule set, in rule order:
//!
//! ```text
//! #rule	accepted	evaluated
//! global.0	50	100
//! ```
//!
//! The QC report holds a summary line per read group followed by the
//! mapping quality, insert size and clip length histograms, one bin per line.
//! Missing summary values are written as `.`.

use crate::core::qc::{Histogram, QcStats};
use crate::core::rules::{RuleCollection, RuleCounters};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

pub const COUNTS_HEADER: &str = "#rule\taccepted\tevaluated";

pub const QC_SUMMARY_HEADER: &str =
    "#read_group\ttotal\tmapped\tduplicate\tqcfail\tsupplementary\tmean_mapq\tmedian_insert_size\tmean_clip";

pub const QC_HISTOGRAM_HEADER: &str = "#read_group\tmetric\tvalue\tcount";

/// Counts of one rule set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleCount<'a> {
    pub id: &'a str,
    pub accepted: u64,
    pub evaluated: u64,
}

impl std::fmt::Display for RuleCount<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\t{}\t{}", self.id, self.accepted, self.evaluated)
    }
}

/// Pair every rule with its counters
pub fn rule_counts<'a>(rules: &'a RuleCollection, counters: &RuleCounters) -> Vec<RuleCount<'a>> {
    rules
        .rules()
        .iter()
        .enumerate()
        .map(|(i, rule)| RuleCount {
            id: &rule.id,
            accepted: counters.hits.get(i).copied().unwrap_or(0),
            evaluated: counters.evaluated.get(i).copied().unwrap_or(0),
        })
        .collect()
}

pub fn write_counts<W: Write>(out: &mut W, rules: &RuleCollection, counters: &RuleCounters) -> io::Result<()> {
    writeln!(out, "{}", COUNTS_HEADER)?;
    for count in rule_counts(rules, counters) {
        writeln!(out, "{}", count)?;
    }
    Ok(())
}

pub fn write_counts_file<P: AsRef<Path>>(
    path: P,
    rules: &RuleCollection,
    counters: &RuleCounters,
) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_counts(&mut out, rules, counters)?;
    out.flush()
}

fn or_dot<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| ".".to_string(), |v| v.to_string())
}

pub fn write_qc<W: Write>(out: &mut W, qc: &QcStats) -> io::Result<()> {
    writeln!(out, "{}", QC_SUMMARY_HEADER)?;
    for (group, s) in qc.groups() {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            group,
            s.total,
            s.mapped,
            s.duplicate,
            s.qcfail,
            s.supplementary,
            or_dot(s.mapq.mean().map(|m| format!("{:.2}", m))),
            or_dot(s.insert_size.median()),
            or_dot(s.clip.mean().map(|m| format!("{:.2}", m))),
        )?;
    }
    writeln!(out, "{}", QC_HISTOGRAM_HEADER)?;
    for (group, s) in qc.groups() {
        let metrics: [(&str, &Histogram); 3] = [("mapq", &s.mapq), ("insert_size", &s.insert_size), ("clip", &s.clip)];
        for (metric, hist) in metrics {
            for (value, count) in hist.iter() {
                writeln!(out, "{}\t{}\t{}\t{}", group, metric, value, count)?;
            }
        }
    }
    Ok(())
}

pub fn write_qc_file<P: AsRef<Path>>(path: P, qc: &QcStats) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_qc(&mut out, qc)?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::read::{CigarOp, OwnedRead, TagValue};
    use crate::core::region::RegionKind;
    use crate::core::rules::{RegionBinding, RuleSet};

    #[test]
    fn test_write_counts() {
        let rules = RuleCollection::new(vec![
            RuleSet::new("a.0", RegionBinding::WholeGenome, RegionKind::Include, vec![]),
            RuleSet::new("b.0", RegionBinding::WholeGenome, RegionKind::Exclude, vec![]),
        ]);
        let counters = RuleCounters {
            hits: vec![50, 3],
            evaluated: vec![100, 100],
        };
        let mut buf = Vec::new();
        write_counts(&mut buf, &rules, &counters).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec![COUNTS_HEADER, "a.0\t50\t100", "b.0\t3\t100"]);
    }

    #[test]
    fn test_write_counts_file() {
        let rules = RuleCollection::new(vec![RuleSet::new(
            "a.0",
            RegionBinding::WholeGenome,
            RegionKind::Include,
            vec![],
        )]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counts.tsv");
        write_counts_file(&path, &rules, &rules.new_counters()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.ends_with("a.0\t0\t0\n"));
    }

    #[test]
    fn test_write_qc() {
        let mut qc = QcStats::new();
        qc.add(&OwnedRead::new("a").at(0, 10).with_mapq(60).with_cigar(vec![CigarOp::Match(100)]));
        qc.add(
            &OwnedRead::new("b")
                .at(0, 20)
                .with_mapq(20)
                .with_mate(0, 200)
                .with_insert_size(280)
                .with_cigar(vec![CigarOp::SoftClip(10), CigarOp::Match(90)])
                .with_tag(*b"RG", TagValue::Str("rg1".into())),
        );
        qc.add(&OwnedRead::new("u"));

        let mut buf = Vec::new();
        write_qc(&mut buf, &qc).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                QC_SUMMARY_HEADER,
                "NA\t2\t1\t0\t0\t0\t60.00\t.\t0.00",
                "rg1\t1\t1\t0\t0\t0\t20.00\t280\t10.00",
                QC_HISTOGRAM_HEADER,
                "NA\tmapq\t60\t1",
                "NA\tclip\t0\t1",
                "rg1\tmapq\t20\t1",
                "rg1\tinsert_size\t280\t1",
                "rg1\tclip\t10\t1",
            ]
        );
    }

    #[test]
    fn test_write_qc_file_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qc.tsv");
        write_qc_file(&path, &QcStats::new()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, format!("{}\n{}\n", QC_SUMMARY_HEADER, QC_HISTOGRAM_HEADER));
    }
}
