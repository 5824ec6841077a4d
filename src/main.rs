//! FastVariantBam CLI entry point
//!
//! Filters a BAM/SAM/CRAM file according to hierarchical region and read rules.

use anyhow::{bail, Context};
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};
use fast_variantbam::core::walker::DEFAULT_PROGRESS_INTERVAL;
use fast_variantbam::core::{
    build_rule_collection, CommandLineRegions, ConfigError, NullSink, RegionIndex, RegionKind, RegionOption,
    RuleScript, StreamWalker, WalkerConfig,
};
use fast_variantbam::formats::{self, BamSink, BamSource, OutputFormat, RegionSpec, TagStrip};
use log::info;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "fast-variantbam")]
#[command(about = "Filter a BAM/CRAM file according to hierarchical rules")]
#[command(version)]
#[command(author = "FastVariantBam Contributors")]
struct Cli {
    /// Input BAM/SAM/CRAM file, '-' for stdin
    input: PathBuf,

    /// Output file (SAM to stdout if not specified)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Write CRAM instead of BAM
    #[arg(short = 'C', long = "cram", requires = "reference")]
    cram: bool,

    /// Reference FASTA, for CRAM input or output
    #[arg(short = 'T', long = "reference")]
    reference: Option<PathBuf>,

    /// Comma-separated aux tags to remove (e.g. RG,MD)
    #[arg(short = 's', long = "strip-tags")]
    strip_tags: Option<String>,

    /// Remove every aux tag
    #[arg(short = 'S', long = "strip-all-tags", conflicts_with = "strip_tags")]
    strip_all_tags: bool,

    /// Region (samtools string, region file or WG); options after it apply to it
    #[arg(short = 'g', long = "region")]
    region: Vec<String>,

    /// Region where a matching read is excluded
    #[arg(short = 'G', long = "exclude-region")]
    exclude_region: Vec<String>,

    /// Mate-linked region: a match on either mate keeps the pair
    #[arg(short = 'l', long = "linked-region")]
    linked_region: Vec<String>,

    /// Mate-linked region where a match on either mate excludes the pair
    #[arg(short = 'L', long = "linked-exclude-region")]
    linked_exclude_region: Vec<String>,

    /// Pad the preceding region by this many bases on each side
    #[arg(short = 'P', long = "region-pad")]
    region_pad: Vec<u64>,

    /// Rule script: JSON text or a file holding it
    #[arg(short = 'r', long = "rules")]
    rules: Option<String>,

    /// Only process reads in these regions (samtools string or region file)
    #[arg(short = 'k', long = "proc-regions-file")]
    proc_regions: Option<String>,

    /// Maximum reads kept per start position; negative keeps at least that many
    #[arg(short = 'm', long = "max-coverage", default_value_t = 0, allow_negative_numbers = true)]
    max_coverage: i32,

    /// Write per-rule read counts to this file
    #[arg(short = 'c', long = "counts-file")]
    counts_file: Option<PathBuf>,

    /// Write per read group QC statistics to this file
    #[arg(short = 'q', long = "qc-file")]
    qc_file: Option<PathBuf>,

    /// Do not write reads, only count them
    #[arg(short = 'x', long = "no-output")]
    no_output: bool,

    /// Minimum mapping quality for the preceding region
    #[arg(long = "min-mapq")]
    min_mapq: Vec<i64>,

    /// Minimum read length after quality trimming, for the preceding region
    #[arg(long = "min-length")]
    min_length: Vec<i64>,

    /// Minimum mean base quality, also the trimming threshold, for the preceding region
    #[arg(long = "min-phred")]
    min_phred: Vec<i64>,

    /// Maximum number of N bases for the preceding region
    #[arg(long = "max-nbases")]
    max_nbases: Vec<i64>,

    /// Read group the preceding region's reads must belong to
    #[arg(short = 'R', long = "read-group")]
    read_group: Vec<String>,

    /// Flag bits that must all be set, for the preceding region
    #[arg(short = 'f', long = "include-flag")]
    include_flag: Vec<u16>,

    /// Flag bits that must all be unset, for the preceding region
    #[arg(short = 'F', long = "exclude-flag")]
    exclude_flag: Vec<u16>,

    /// Number of htslib compression threads
    #[arg(short = 't', long, default_value = "1")]
    threads: usize,

    /// Verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

/// Values of one repeated argument, paired with their command-line positions
fn indexed<T: Clone + Send + Sync + 'static>(matches: &ArgMatches, id: &str) -> Vec<(usize, T)> {
    match (matches.indices_of(id), matches.get_many::<T>(id)) {
        (Some(indices), Some(values)) => indices.zip(values.cloned()).collect(),
        _ => Vec::new(),
    }
}

enum RegionArg {
    Region(RegionKind, String),
    Option(RegionOption),
}

/// Rebuild regions and their options in the order they were given
fn command_line_regions(matches: &ArgMatches) -> Result<CommandLineRegions, ConfigError> {
    let mut args: Vec<(usize, RegionArg)> = Vec::new();
    for (id, kind) in [
        ("region", RegionKind::Include),
        ("exclude_region", RegionKind::Exclude),
        ("linked_region", RegionKind::Linked),
        ("linked_exclude_region", RegionKind::LinkedExclude),
    ] {
        args.extend(
            indexed::<String>(matches, id)
                .into_iter()
                .map(|(i, r)| (i, RegionArg::Region(kind, r))),
        );
    }
    let mut push = |items: Vec<(usize, RegionOption)>| {
        args.extend(items.into_iter().map(|(i, o)| (i, RegionArg::Option(o))));
    };
    let with = |f: fn(i64) -> RegionOption, id: &str| -> Vec<(usize, RegionOption)> {
        indexed::<i64>(matches, id).into_iter().map(|(i, v)| (i, f(v))).collect()
    };
    push(with(RegionOption::MinMapq, "min_mapq"));
    push(with(RegionOption::MinLength, "min_length"));
    push(with(RegionOption::MinPhred, "min_phred"));
    push(with(RegionOption::MaxNBases, "max_nbases"));
    push(indexed::<u64>(matches, "region_pad").into_iter().map(|(i, v)| (i, RegionOption::Pad(v))).collect());
    push(indexed::<String>(matches, "read_group").into_iter().map(|(i, v)| (i, RegionOption::ReadGroup(v))).collect());
    push(indexed::<u16>(matches, "include_flag").into_iter().map(|(i, v)| (i, RegionOption::IncludeFlag(v))).collect());
    push(indexed::<u16>(matches, "exclude_flag").into_iter().map(|(i, v)| (i, RegionOption::ExcludeFlag(v))).collect());

    args.sort_by_key(|(i, _)| *i);
    let mut regions = CommandLineRegions::new();
    for (_, arg) in args {
        match arg {
            RegionArg::Region(kind, region) => regions.push_region(kind, region),
            RegionArg::Option(option) => regions.apply(option)?,
        }
    }
    Ok(regions)
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn main() -> anyhow::Result<()> {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches)?;
    init_logging(cli.verbose);
    let start = Instant::now();

    let regions = command_line_regions(&matches)?;
    let script = match &cli.rules {
        Some(arg) => RuleScript::from_arg(arg)?,
        None => RuleScript::default(),
    };

    let mut source = BamSource::open(&cli.input, cli.threads, cli.reference.as_deref())
        .with_context(|| format!("Failed to open {}", cli.input.display()))?;
    let dict = source.reference_dict();

    let rules = build_rule_collection(&script, &regions, &dict)?;
    let proc_regions = match &cli.proc_regions {
        Some(text) => RegionSpec::parse(text)
            .resolve(&dict)?
            .map(|regions| RegionIndex::build(regions, 0)),
        None => None,
    };
    if let Some(p) = &proc_regions {
        info!("Processing restricted to {} regions", p.len());
    }
    if rules.has_linked() {
        info!("Mate-linked region supplied, running two passes over the input");
    }

    let config = WalkerConfig {
        max_coverage: cli.max_coverage,
        count_all_rules: cli.no_output || cli.counts_file.is_some(),
        proc_regions,
        write_output: !cli.no_output,
        collect_qc: cli.qc_file.is_some(),
        progress_interval: DEFAULT_PROGRESS_INTERVAL,
    };
    if config.max_coverage != 0 {
        info!("Coverage control: {}", config.max_coverage);
    }

    let mut walker = StreamWalker::new(rules, config).with_reference(dict);
    let stats = if cli.no_output {
        walker.run(&mut source, &mut NullSink)?
    } else {
        let format = match &cli.output {
            _ if cli.cram => OutputFormat::Cram,
            Some(path) if path.as_os_str() != "-" => OutputFormat::Bam,
            _ => OutputFormat::Sam,
        };
        if format == OutputFormat::Cram && cli.output.is_none() {
            bail!("CRAM output needs an output file (-o)");
        }
        let strip = if cli.strip_all_tags {
            TagStrip::All
        } else if let Some(list) = &cli.strip_tags {
            TagStrip::parse_list(list)?
        } else {
            TagStrip::Keep
        };
        let mut sink = BamSink::create(
            cli.output.as_deref(),
            format,
            source.header(),
            cli.reference.as_deref(),
            cli.threads,
        )?
        .with_strip(strip);
        walker.run(&mut source, &mut sink)?
    };

    if let Some(path) = &cli.counts_file {
        formats::write_counts_file(path, walker.rules(), walker.counters())
            .with_context(|| format!("Failed to write counts to {}", path.display()))?;
    }
    if let (Some(path), Some(qc)) = (&cli.qc_file, walker.qc()) {
        formats::write_qc_file(path, qc)
            .with_context(|| format!("Failed to write QC statistics to {}", path.display()))?;
    }

    eprintln!("\n=== Filtering Statistics ===");
    eprintln!("Reads seen:      {}", stats.reads_seen);
    eprintln!("Evaluated:       {}", stats.evaluated);
    eprintln!("Accepted:        {} ({:.2}%)", stats.accepted, stats.acceptance_rate());
    if stats.out_of_range > 0 {
        eprintln!("Out of range:    {}", stats.out_of_range);
    }
    if stats.capped > 0 || stats.rescued > 0 {
        eprintln!("  - Capped:      {}", stats.capped);
        eprintln!("  - Rescued:     {}", stats.rescued);
    }
    if let Some(link) = stats.link {
        eprintln!("Linked pairs:    {}", link.resolved);
        eprintln!("  - Dropped:     {}", link.dropped);
    }
    eprintln!("Time elapsed:    {:.2}s", start.elapsed().as_secs_f64());

    Ok(())
}
