//! File format adapters
//!
//! Region text (samtools strings, BED, VCF), the per-rule counts and QC
//! reports, and BAM/SAM/CRAM input and output.

#[cfg(feature = "bam")]
pub mod bam;
pub mod region;
pub mod report;

#[cfg(feature = "bam")]
pub use bam::{reference_dict, BamSink, BamSource, OutputFormat, TagStrip};
pub use region::{parse_bed_line, parse_region_string, parse_vcf_line, read_region_file, RegionSpec, WHOLE_GENOME};
pub use report::{
    rule_counts, write_counts, write_counts_file, write_qc, write_qc_file, RuleCount, COUNTS_HEADER,
    QC_HISTOGRAM_HEADER, QC_SUMMARY_HEADER,
};
