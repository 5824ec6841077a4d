//! FastVariantBam - rule-based filtering of alignment files
//!
//! Reduces a coordinate-sorted BAM/SAM/CRAM to the reads that satisfy a
//! hierarchy of region and read-attribute rules, in one streaming pass (two
//! when mate-linked rules are present).
//!
//! # Features
//!
//! - Interval-indexed regions with padding, via rust-lapper
//! - JSON rule scripts with include, exclude and mate-linked blocks
//! - Per-position coverage cap or floor
//! - Per-rule counts report and per read group QC statistics
//!
//! # Example
//!
//! ```
//! use fast_variantbam::{
//!     build_rule_collection, CommandLineRegions, OwnedRead, ReferenceDict, RuleScript,
//!     StreamWalker, VecSink, VecSource, WalkerConfig,
//! };
//!
//! let dict = ReferenceDict::from_pairs(vec![("chr1", 1_000_000u64)]);
//! let script = RuleScript::parse(r#"{"keep": {"rules": [{"mapped": true, "mapq": 20}]}}"#)?;
//! let rules = build_rule_collection(&script, &CommandLineRegions::new(), &dict)?;
//!
//! let reads = vec![
//!     OwnedRead::new("a").at(0, 100).with_mapq(60),
//!     OwnedRead::new("b").at(0, 200).with_mapq(5),
//! ];
//! let mut walker = StreamWalker::new(rules, WalkerConfig::default());
//! let mut sink = VecSink::new();
//! let stats = walker.run(&mut VecSource::new(reads), &mut sink)?;
//! assert_eq!(stats.accepted, 1);
//! # Ok::<(), fast_variantbam::VariantBamError>(())
//! ```

pub mod core;
pub mod formats;

// Re-export commonly used types
pub use core::{
    build_rule_collection, AlignedRead, CommandLineRegions, Condition, ConfigError, CoverageMode,
    GenomicInterval, MateLinkTracker, NumericRange, OwnedRead, ReferenceDict, Region, RegionIndex,
    RegionKind, RegionOption, RuleCollection, RuleParseError, RuleScript, RuleSet, StreamWalker,
    VariantBamError, VecSink, VecSource, WalkerConfig,
};
