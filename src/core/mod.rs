//! Core filtering engine
//!
//! Region indexing, the condition language, rule evaluation, coverage
//! control, mate linking, QC statistics and the stream walker that ties them
//! together.

pub mod condition;
pub mod coverage;
mod error;
pub mod index;
pub mod io;
pub mod matelink;
pub mod qc;
pub mod read;
pub mod region;
pub mod rules;
pub mod script;
pub mod walker;

pub use condition::{
    pair_orientation, quality_trim, subsample_keep, Condition, EvalContext, FlagCondition, MotifSet,
    NumericAttr, NumericRange, Orientation, TrimInfo,
};
pub use coverage::{CoverageController, CoverageMode, CoverageStats};
pub use error::{
    ConfigError, InputCapabilityError, ResolutionError, ResolutionResult, Result, RuleParseError,
    RuleResult, VariantBamError,
};
pub use index::RegionIndex;
pub use matelink::{LinkSummary, MateLinkTracker};
pub use qc::{Histogram, QcStats, ReadGroupStats, NO_READ_GROUP};
pub use read::{flags, AlignedRead, CigarOp, OwnedRead, TagValue};
pub use region::{GenomicInterval, ReferenceDict, Region, RegionKind, Strand};
pub use rules::{Decision, EvalMode, RegionBinding, RuleCollection, RuleCounters, RuleSet};
pub use script::{
    build_rule_collection, CommandLineRegion, CommandLineRegions, RegionOption, RuleScript, ScriptBlock,
};
pub use walker::{
    plan_scan, FilterStats, NullSink, ReadSink, ReadSource, ScanRange, StreamWalker, VecSink, VecSource,
    WalkerConfig, WalkerState,
};
