//! Region text formats
//!
//! Regions are given as the whole-genome sentinel `WG`, as a samtools-style
//! string (`chr1:1,000-2,000`, one-based inclusive), or as a path to a file
//! of regions: BED (zero-based, optional strand in column 6), VCF (one region
//! per variant, spanning REF), or one region string per line.

use crate::core::{ResolutionError, ResolutionResult};
use crate::core::io::{open_text, LineIterator};
use crate::core::region::{GenomicInterval, ReferenceDict, Region, Strand};
use std::path::{Path, PathBuf};

/// Whole-genome sentinel
pub const WHOLE_GENOME: &str = "WG";

/// A region argument before resolution against the header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionSpec {
    WholeGenome,
    Inline(String),
    File(PathBuf),
}

impl RegionSpec {
    /// Classify region text: the sentinel, an existing file, or an inline region
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if text.eq_ignore_ascii_case(WHOLE_GENOME) {
            RegionSpec::WholeGenome
        } else if Path::new(text).is_file() {
            RegionSpec::File(PathBuf::from(text))
        } else {
            RegionSpec::Inline(text.to_string())
        }
    }

    /// Resolve to regions; `None` means the whole genome
    pub fn resolve(&self, dict: &ReferenceDict) -> ResolutionResult<Option<Vec<Region>>> {
        match self {
            RegionSpec::WholeGenome => Ok(None),
            RegionSpec::File(path) => read_region_file(path, dict).map(Some),
            RegionSpec::Inline(text) => match parse_region_string(text, dict) {
                Ok(iv) => Ok(Some(vec![Region::new(iv)])),
                Err(ResolutionError::UnknownChromosome(_)) if looks_like_path(text) => {
                    Err(ResolutionError::MissingRegionFile(PathBuf::from(text)))
                }
                Err(e) => Err(e),
            },
        }
    }
}

fn looks_like_path(text: &str) -> bool {
    const EXTENSIONS: [&str; 7] = [".bed", ".vcf", ".gz", ".bz2", ".txt", ".list", ".intervals"];
    text.contains('/') || EXTENSIONS.iter().any(|ext| text.ends_with(ext))
}

fn invalid(region: &str, message: impl Into<String>) -> ResolutionError {
    ResolutionError::InvalidRegion {
        region: region.to_string(),
        message: message.into(),
    }
}

fn parse_coord(text: &str, region: &str) -> ResolutionResult<u64> {
    text.replace(',', "")
        .parse::<u64>()
        .map_err(|_| invalid(region, format!("bad coordinate '{}'", text)))
}

/// Parse a samtools-style region string
///
/// `chr1` is the whole chromosome, `chr1:1000` runs to its end, and
/// `chr1:1,000-2,000` is one-based inclusive.
pub fn parse_region_string(text: &str, dict: &ReferenceDict) -> ResolutionResult<GenomicInterval> {
    let text = text.trim();
    if text.is_empty() {
        return Err(invalid(text, "empty region"));
    }
    // A chromosome name may itself contain ':', so try the full text first
    if let Some(tid) = dict.id(text) {
        let len = dict.length(tid).unwrap_or(0);
        return Ok(GenomicInterval::new(tid, 0, len));
    }
    let Some((chrom, range)) = text.rsplit_once(':') else {
        return Err(ResolutionError::UnknownChromosome(text.to_string()));
    };
    let tid = dict.resolve(chrom)?;
    let chrom_len = dict.length(tid).unwrap_or(u64::MAX);

    let (beg, end) = match range.split_once('-') {
        Some((b, e)) => (parse_coord(b, text)?, parse_coord(e, text)?),
        None => (parse_coord(range, text)?, chrom_len),
    };
    let start = beg.max(1) - 1;
    let end = end.min(chrom_len);
    if end < start {
        return Err(invalid(text, "end before start"));
    }
    Ok(GenomicInterval::new(tid, start, end))
}

/// Parse one BED line; header, track and browser lines give `None`
pub fn parse_bed_line(line: &str, dict: &ReferenceDict) -> Option<ResolutionResult<Region>> {
    let line = line.trim_end();
    if line.is_empty() || line.starts_with('#') || line.starts_with("track") || line.starts_with("browser") {
        return None;
    }
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 3 {
        return Some(Err(invalid(line, "BED line needs chrom, start and end")));
    }
    Some((|| {
        let tid = dict.resolve(fields[0])?;
        let start = parse_coord(fields[1], line)?;
        let end = parse_coord(fields[2], line)?;
        if end < start {
            return Err(invalid(line, "end before start"));
        }
        let strand = fields
            .get(5)
            .and_then(|s| s.chars().next())
            .and_then(Strand::from_char)
            .unwrap_or_default();
        Ok(Region::new(GenomicInterval::new(tid, start, end)).with_strand(strand))
    })())
}

/// Parse one VCF data line into the span of its REF allele
pub fn parse_vcf_line(line: &str, dict: &ReferenceDict) -> Option<ResolutionResult<Region>> {
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let mut fields = line.split('\t');
    let (Some(chrom), Some(pos), _, Some(reference)) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Some(Err(invalid(line, "VCF line needs CHROM, POS, ID and REF")));
    };
    Some((|| {
        let tid = dict.resolve(chrom)?;
        let pos = parse_coord(pos, line)?.max(1);
        let len = reference.len().max(1) as u64;
        Ok(Region::new(GenomicInterval::new(tid, pos - 1, pos - 1 + len)))
    })())
}

fn is_vcf_path(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    name.ends_with(".vcf") || name.ends_with(".vcf.gz") || name.ends_with(".vcf.bgz")
}

/// Read every region from a region file
///
/// Lines that look like `chr:beg-end` are read as region strings, anything
/// else as BED (or VCF, by file name).
pub fn read_region_file(path: &Path, dict: &ReferenceDict) -> ResolutionResult<Vec<Region>> {
    if !path.is_file() {
        return Err(ResolutionError::MissingRegionFile(path.to_path_buf()));
    }
    let vcf = is_vcf_path(path);
    let mut iter = LineIterator::new(open_text(path)?);
    let mut regions = Vec::new();

    while let Some(line) = iter.next_line() {
        let line = line?;
        let parsed = if vcf {
            parse_vcf_line(line, dict)
        } else if !line.contains(char::is_whitespace) && line.contains(':') {
            Some(parse_region_string(line, dict).map(Region::new))
        } else {
            parse_bed_line(line, dict)
        };
        if let Some(region) = parsed {
            regions.push(region?);
        }
    }
    Ok(regions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn dict() -> ReferenceDict {
        ReferenceDict::from_pairs(vec![("chr1", 1_000_000u64), ("chr2", 500_000), ("HLA-A*01:01", 3_000)])
    }

    #[test]
    fn test_parse_region_string() {
        let d = dict();
        assert_eq!(parse_region_string("chr1:1,000-2,000", &d).unwrap(), GenomicInterval::new(0, 999, 2000));
        assert_eq!(parse_region_string("chr2", &d).unwrap(), GenomicInterval::new(1, 0, 500_000));
        assert_eq!(parse_region_string("2:100", &d).unwrap(), GenomicInterval::new(1, 99, 500_000));
        assert_eq!(parse_region_string("HLA-A*01:01", &d).unwrap(), GenomicInterval::new(2, 0, 3_000));
        assert!(matches!(parse_region_string("chr9:1-10", &d), Err(ResolutionError::UnknownChromosome(_))));
        assert!(matches!(parse_region_string("chr1:20-10", &d), Err(ResolutionError::InvalidRegion { .. })));
        assert!(matches!(parse_region_string("chr1:x-10", &d), Err(ResolutionError::InvalidRegion { .. })));
    }

    #[test]
    fn test_parse_bed_line() {
        let d = dict();
        let r = parse_bed_line("chr1\t100\t200\tname\t0\t-", &d).unwrap().unwrap();
        assert_eq!(r.interval, GenomicInterval::new(0, 100, 200));
        assert_eq!(r.strand, Strand::Minus);
        assert!(parse_bed_line("track name=x", &d).is_none());
        assert!(parse_bed_line("chr1\t100", &d).unwrap().is_err());
    }

    #[test]
    fn test_parse_vcf_line() {
        let d = dict();
        let r = parse_vcf_line("chr2\t1000\trs1\tACG\tA\t.\tPASS\t.", &d).unwrap().unwrap();
        assert_eq!(r.interval, GenomicInterval::new(1, 999, 1002));
        assert!(parse_vcf_line("##fileformat=VCFv4.2", &d).is_none());
    }

    #[test]
    fn test_region_spec_classification() {
        let d = dict();
        assert_eq!(RegionSpec::parse("WG"), RegionSpec::WholeGenome);
        assert!(RegionSpec::parse("wg").resolve(&d).unwrap().is_none());
        let missing = RegionSpec::parse("/no/such/regions.bed").resolve(&d);
        assert!(matches!(missing, Err(ResolutionError::MissingRegionFile(_))));
        let unknown = RegionSpec::parse("chrZ:1-5").resolve(&d);
        assert!(matches!(unknown, Err(ResolutionError::UnknownChromosome(_))));
    }

    #[test]
    fn test_read_region_file_mixed() {
        let d = dict();
        let mut file = Builder::new().suffix(".bed").tempfile().unwrap();
        writeln!(file, "# header\nchr1\t0\t100\nchr2:11-20\n").unwrap();
        file.flush().unwrap();
        let spec = RegionSpec::parse(file.path().to_str().unwrap());
        assert!(matches!(spec, RegionSpec::File(_)));
        let regions = spec.resolve(&d).unwrap().unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[1].interval, GenomicInterval::new(1, 10, 20));
    }
}
