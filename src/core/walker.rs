//! Stream walker
//!
//! Drives reads from a [`ReadSource`] through the rule collection, the
//! coverage controller and the mate-link tracker into a [`ReadSink`].
//!
//! The walk moves through `Initializing -> Scanning -> Draining -> Reporting
//! -> Done`. Without linked rules the filtering happens while Scanning and
//! Draining has nothing to do. With linked rules Scanning is the name pass
//! over the whole input; the source is then rewound and Draining runs the
//! filtering pass that writes output.

use crate::core::coverage::{CoverageController, CoverageMode};
use crate::core::error::{ConfigError, InputCapabilityError, Result};
use crate::core::index::RegionIndex;
use crate::core::matelink::{LinkSummary, MateLinkTracker};
use crate::core::qc::QcStats;
use crate::core::read::AlignedRead;
use crate::core::region::{GenomicInterval, ReferenceDict};
use crate::core::rules::{EvalMode, RuleCollection, RuleCounters};
use log::{debug, info, warn};

/// Reads between two progress lines
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1_000_000;

/// Where alignment records come from, in file order
pub trait ReadSource {
    type Read: AlignedRead;

    /// Name used in messages
    fn name(&self) -> &str;

    /// Next record; `None` at end of input
    fn next_read(&mut self) -> Option<Result<Self::Read>>;

    fn supports_rewind(&self) -> bool {
        false
    }

    /// Restart from the first record, dropping any scan restriction
    fn rewind(&mut self) -> Result<()> {
        Err(InputCapabilityError::NotRewindable {
            source_name: self.name().to_string(),
        }
        .into())
    }

    /// Hint that only reads starting in `intervals` are wanted
    ///
    /// Sources that cannot seek may ignore it; the walker filters anyway.
    fn set_scan_regions(&mut self, _intervals: &[GenomicInterval]) -> Result<()> {
        Ok(())
    }
}

/// Where accepted records go
pub trait ReadSink<R: ?Sized> {
    fn write_read(&mut self, read: &R) -> Result<()>;

    /// Flush once the walk is over
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// In-memory source, rewindable unless built with [`VecSource::forward_only`]
#[derive(Debug, Clone)]
pub struct VecSource<R> {
    name: String,
    reads: Vec<R>,
    cursor: usize,
    rewindable: bool,
}

impl<R: AlignedRead + Clone> VecSource<R> {
    pub fn new(reads: Vec<R>) -> Self {
        Self {
            name: "memory".to_string(),
            reads,
            cursor: 0,
            rewindable: true,
        }
    }

    /// Behaves like a pipe: one pass only
    pub fn forward_only(reads: Vec<R>) -> Self {
        Self {
            name: "pipe".to_string(),
            rewindable: false,
            ..Self::new(reads)
        }
    }
}

impl<R: AlignedRead + Clone> ReadSource for VecSource<R> {
    type Read = R;

    fn name(&self) -> &str {
        &self.name
    }

    fn next_read(&mut self) -> Option<Result<R>> {
        let read = self.reads.get(self.cursor)?.clone();
        self.cursor += 1;
        Some(Ok(read))
    }

    fn supports_rewind(&self) -> bool {
        self.rewindable
    }

    fn rewind(&mut self) -> Result<()> {
        if !self.rewindable {
            return Err(InputCapabilityError::NotRewindable {
                source_name: self.name.clone(),
            }
            .into());
        }
        self.cursor = 0;
        Ok(())
    }
}

/// Collects accepted reads in memory
#[derive(Debug, Clone, Default)]
pub struct VecSink<R> {
    pub reads: Vec<R>,
}

impl<R> VecSink<R> {
    pub fn new() -> Self {
        Self { reads: Vec::new() }
    }
}

impl<R: Clone> ReadSink<R> for VecSink<R> {
    fn write_read(&mut self, read: &R) -> Result<()> {
        self.reads.push(read.clone());
        Ok(())
    }
}

/// Discards everything, for count-only runs
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl<R: ?Sized> ReadSink<R> for NullSink {
    fn write_read(&mut self, _read: &R) -> Result<()> {
        Ok(())
    }
}

/// Walker settings assembled by the caller
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// 0 off, positive caps, negative sets a floor
    ///
    /// Reads of a resolved mate-linked pair are counted but never capped, so
    /// a position holding such reads may end up above the cap.
    pub max_coverage: i32,
    /// Evaluate every rule for every read
    pub count_all_rules: bool,
    /// Restrict processing to these regions
    pub proc_regions: Option<RegionIndex>,
    /// Send accepted reads to the sink
    pub write_output: bool,
    /// Collect per read group QC statistics over every read of the filtering pass
    pub collect_qc: bool,
    pub progress_interval: u64,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            max_coverage: 0,
            count_all_rules: false,
            proc_regions: None,
            write_output: true,
            collect_qc: false,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

/// Genomic range a walk covers
#[derive(Debug, Clone)]
pub enum ScanRange {
    Full,
    Regions(RegionIndex),
}

impl ScanRange {
    /// Read starts inside the range
    pub fn contains<R: AlignedRead + ?Sized>(&self, read: &R) -> bool {
        match self {
            ScanRange::Full => true,
            ScanRange::Regions(index) => match read.placed_pos() {
                Some((tid, pos)) => index.contains_point(tid, pos),
                None => false,
            },
        }
    }

    pub fn intervals(&self) -> Option<Vec<GenomicInterval>> {
        match self {
            ScanRange::Full => None,
            ScanRange::Regions(index) => Some(index.merged()),
        }
    }

    /// Samtools-style listing, e.g. `chr1:950-1500`
    pub fn describe(&self, dict: &ReferenceDict) -> String {
        match self.intervals() {
            None => "whole input".to_string(),
            Some(ivs) => ivs
                .iter()
                .map(|iv| dict.format_interval(iv))
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

/// Decide what the filtering pass has to cover
///
/// Linked rules need their mates wherever they lie, so only the processing
/// regions restrict the scan. Otherwise processing and rule regions are
/// intersected; if only one of them is finite it is used alone.
pub fn plan_scan(rules: &RuleCollection, config: &WalkerConfig) -> std::result::Result<ScanRange, ConfigError> {
    let proc_regions = config.proc_regions.as_ref();
    if rules.has_linked() {
        return Ok(proc_regions.map_or(ScanRange::Full, |p| ScanRange::Regions(p.clone())));
    }
    Ok(match (proc_regions, rules.all_regions()) {
        (Some(proc_regions), Some(rule_regions)) => {
            let overlap = rule_regions.intersect(proc_regions, true);
            if overlap.is_empty() {
                return Err(ConfigError::NoScanRegions);
            }
            ScanRange::Regions(overlap)
        }
        (Some(proc_regions), None) => ScanRange::Regions(proc_regions.clone()),
        (None, Some(rule_regions)) => ScanRange::Regions(rule_regions),
        (None, None) => ScanRange::Full,
    })
}

/// Walk progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkerState {
    Initializing,
    Scanning,
    Draining,
    Reporting,
    Done,
}

/// Aggregate counts of one walk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    /// Records read in the filtering pass
    pub reads_seen: u64,
    /// Records starting outside the scan range
    pub out_of_range: u64,
    /// Records passed to the rules
    pub evaluated: u64,
    /// Records kept
    pub accepted: u64,
    /// Rule-accepted records dropped by the coverage cap
    pub capped: u64,
    /// Rule-rejected records kept by the coverage floor
    pub rescued: u64,
    /// Accepted records that bypassed the cap as part of a linked pair
    pub linked: u64,
    pub link: Option<LinkSummary>,
}

impl FilterStats {
    pub fn acceptance_rate(&self) -> f64 {
        if self.evaluated == 0 {
            0.0
        } else {
            self.accepted as f64 / self.evaluated as f64 * 100.0
        }
    }
}

/// Orchestrates one filtering run
#[derive(Debug)]
pub struct StreamWalker {
    rules: RuleCollection,
    config: WalkerConfig,
    dict: ReferenceDict,
    counters: RuleCounters,
    coverage: CoverageController,
    tracker: Option<MateLinkTracker>,
    qc: Option<QcStats>,
    state: WalkerState,
    stats: FilterStats,
}

impl StreamWalker {
    pub fn new(rules: RuleCollection, config: WalkerConfig) -> Self {
        let counters = rules.new_counters();
        let coverage = CoverageController::new(CoverageMode::from_max_coverage(config.max_coverage));
        let qc = config.collect_qc.then(QcStats::new);
        Self {
            rules,
            config,
            dict: ReferenceDict::default(),
            counters,
            coverage,
            tracker: None,
            qc,
            state: WalkerState::Initializing,
            stats: FilterStats::default(),
        }
    }

    /// Header dictionary, used to print positions by name
    pub fn with_reference(mut self, dict: ReferenceDict) -> Self {
        self.dict = dict;
        self
    }

    pub fn rules(&self) -> &RuleCollection {
        &self.rules
    }

    pub fn counters(&self) -> &RuleCounters {
        &self.counters
    }

    pub fn state(&self) -> WalkerState {
        self.state
    }

    pub fn stats(&self) -> FilterStats {
        self.stats
    }

    /// QC statistics, present when `collect_qc` was set
    pub fn qc(&self) -> Option<&QcStats> {
        self.qc.as_ref()
    }

    fn eval_mode(&self) -> EvalMode {
        if self.config.count_all_rules {
            EvalMode::CountAll
        } else {
            EvalMode::ShortCircuit
        }
    }

    fn position(&self, tid: i32, pos: i64) -> String {
        match self.dict.name(tid) {
            Some(name) => format!("{}:{}", name, pos + 1),
            None if tid < 0 => "unplaced".to_string(),
            None => format!("{}:{}", tid, pos + 1),
        }
    }

    /// Run the walk to completion
    ///
    /// Configuration and capability problems are reported before the first
    /// record is written. A failure mid-walk leaves whatever was written.
    pub fn run<S, W>(&mut self, source: &mut S, sink: &mut W) -> Result<FilterStats>
    where
        S: ReadSource,
        W: ReadSink<S::Read> + ?Sized,
    {
        self.state = WalkerState::Initializing;
        self.counters.reset();
        self.coverage.reset();
        self.stats = FilterStats::default();
        if self.qc.is_some() {
            self.qc = Some(QcStats::new());
        }

        let linking = self.rules.has_linked();
        if linking && !source.supports_rewind() {
            return Err(InputCapabilityError::NotRewindable {
                source_name: source.name().to_string(),
            }
            .into());
        }
        let scan = plan_scan(&self.rules, &self.config)?;
        info!("Scan range: {}", scan.describe(&self.dict));

        self.state = WalkerState::Scanning;
        if linking {
            self.link_pass(source)?;
            source.rewind()?;
            self.state = WalkerState::Draining;
        }
        if let Some(intervals) = scan.intervals() {
            source.set_scan_regions(&intervals)?;
        }
        self.filter_pass(source, sink, &scan)?;
        sink.finish()?;

        self.state = WalkerState::Reporting;
        let cov = self.coverage.stats();
        self.stats.capped = cov.capped;
        self.stats.rescued = cov.rescued;
        self.report();
        self.state = WalkerState::Done;
        Ok(self.stats)
    }

    fn link_pass<S: ReadSource>(&mut self, source: &mut S) -> Result<()> {
        info!("Mate-linked rules present, collecting pairs over the whole input");
        let mut tracker = MateLinkTracker::new(&self.rules);
        let interval = self.config.progress_interval.max(1);
        let mut seen: u64 = 0;
        while let Some(read) = source.next_read() {
            let read = read?;
            tracker.observe(&self.rules, &read);
            seen += 1;
            if seen % interval == 0 {
                info!(
                    "Mate-link pass: {} reads, {} pairs pending, at {}",
                    seen,
                    tracker.pending_count(),
                    self.position(read.tid(), read.pos())
                );
            }
        }
        let summary = tracker.finish();
        self.stats.link = Some(summary);
        self.tracker = Some(tracker);
        Ok(())
    }

    fn filter_pass<S, W>(&mut self, source: &mut S, sink: &mut W, scan: &ScanRange) -> Result<()>
    where
        S: ReadSource,
        W: ReadSink<S::Read> + ?Sized,
    {
        let mode = self.eval_mode();
        let interval = self.config.progress_interval.max(1);

        while let Some(read) = source.next_read() {
            let read = read?;
            self.stats.reads_seen += 1;
            if let Some(qc) = self.qc.as_mut() {
                qc.add(&read);
            }
            if self.stats.reads_seen % interval == 0 {
                info!(
                    "Processed {} reads, kept {} ({:.2}%), at {}",
                    self.stats.reads_seen,
                    self.stats.accepted,
                    self.stats.acceptance_rate(),
                    self.position(read.tid(), read.pos())
                );
            }
            if !scan.contains(&read) {
                self.stats.out_of_range += 1;
                continue;
            }

            self.stats.evaluated += 1;
            let tracker = self.tracker.as_ref();
            let decision = self.rules.evaluate(&read, &mut self.counters, mode, tracker);
            let pair_kept = decision.accept
                && read.is_paired()
                && tracker.map_or(false, |t| t.is_resolved_any(read.qname()));

            let keep = if pair_kept {
                self.coverage.record(read.tid(), read.pos())?;
                self.stats.linked += 1;
                true
            } else {
                self.coverage.admit(read.tid(), read.pos(), decision.accept)?
            };
            if !keep {
                continue;
            }
            self.stats.accepted += 1;
            if self.config.write_output {
                sink.write_read(&read)?;
            }
        }
        Ok(())
    }

    fn report(&self) {
        let s = &self.stats;
        info!(
            "Kept {} of {} evaluated reads ({:.2}%), {} read in total",
            s.accepted,
            s.evaluated,
            s.acceptance_rate(),
            s.reads_seen
        );
        if s.capped > 0 || s.rescued > 0 {
            info!("Coverage control: {} capped, {} rescued", s.capped, s.rescued);
        }
        for (rule, (hits, evaluated)) in self
            .rules
            .rules()
            .iter()
            .zip(self.counters.hits.iter().zip(&self.counters.evaluated))
        {
            debug!("Rule {}: {} of {}", rule.id, hits, evaluated);
        }
        if s.accepted == 0 {
            warn!("No reads were accepted");
        }
    }
}
