//! Error types for FastVariantBam
//!
//! Every error here is fatal for the run: configuration and script problems
//! are raised before scanning starts, I/O problems abort the scan.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for FastVariantBam operations
#[derive(Debug, Error)]
pub enum VariantBamError {
    /// Rule script parsing errors
    #[error("Rule parse error: {0}")]
    RuleParse(#[from] RuleParseError),

    /// Region resolution errors
    #[error("Region error: {0}")]
    Resolution(#[from] ResolutionError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Input source cannot do what was asked of it
    #[error("Input error: {0}")]
    InputCapability(#[from] InputCapabilityError),

    /// Errors reported by htslib
    #[cfg(feature = "bam")]
    #[error("HTSlib error: {0}")]
    Htslib(#[from] rust_htslib::errors::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Malformed rule script
///
/// `token` is the offending key, value or snippet of the script.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message} (at '{token}')")]
pub struct RuleParseError {
    /// The offending token
    pub token: String,
    /// Human-readable error message
    pub message: String,
}

impl RuleParseError {
    pub fn new(token: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            message: message.into(),
        }
    }

    /// Unknown condition or block key
    pub fn unknown_key(key: &str) -> Self {
        Self::new(key, "unknown rule key")
    }

    /// Value of the wrong shape for its key
    pub fn invalid_value(key: &str, value: &serde_json::Value, expected: &str) -> Self {
        let shown: String = value.to_string().chars().take(60).collect();
        Self::new(format!("{}: {}", key, shown), format!("expected {}", expected))
    }
}

/// Errors that can occur while turning region text into coordinates
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// Chromosome not present in the alignment header
    #[error("Chromosome not found in header: {0}")]
    UnknownChromosome(String),

    /// Region file does not exist or is unreadable
    #[error("Region file not found: {0}")]
    MissingRegionFile(PathBuf),

    /// Region string or region file line could not be parsed
    #[error("Invalid region '{region}': {message}")]
    InvalidRegion { region: String, message: String },

    /// I/O error while reading a region or list file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors in the way the run was configured
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Pad or per-rule option given before any region
    #[error("'{option}' must be given after a region (-g, -G, -l, -L)")]
    OptionBeforeRegion { option: String },

    /// Aux tag names are two characters
    #[error("Invalid tag '{tag}': tags are two characters")]
    InvalidTag { tag: String },

    /// Processing regions and rule regions do not overlap
    #[error("No regions with possibility of reads: rule regions do not overlap processing regions")]
    NoScanRegions,

    /// Input went backwards while coverage control was active
    #[error("Input is not coordinate-sorted at {chrom_id}:{position} (previous {previous})")]
    UnsortedInput {
        chrom_id: i32,
        position: i64,
        previous: i64,
    },
}

/// The input source cannot support the requested scan
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputCapabilityError {
    /// Mate-linking needs a second pass over the input
    #[error("Mate-linked rules need two passes, but input '{source_name}' cannot be rewound")]
    NotRewindable { source_name: String },
}

/// Result type alias for FastVariantBam operations
pub type Result<T> = std::result::Result<T, VariantBamError>;

/// Result type alias for rule script parsing
pub type RuleResult<T> = std::result::Result<T, RuleParseError>;

/// Result type alias for region resolution
pub type ResolutionResult<T> = std::result::Result<T, ResolutionError>;
