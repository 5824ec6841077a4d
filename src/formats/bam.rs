//! BAM/SAM/CRAM adapter
//!
//! Reads and writes alignment files through rust-htslib and plugs them into
//! the walker: [`BamSource`] is a [`ReadSource`] over a file or stdin,
//! [`BamSink`] a [`ReadSink`] writing BAM, SAM or CRAM.

use crate::core::{ConfigError, InputCapabilityError, Result};
use crate::core::read::{AlignedRead, CigarOp};
use crate::core::region::{GenomicInterval, ReferenceDict};
use crate::core::walker::{ReadSink, ReadSource};
use log::{debug, warn};
use rust_htslib::bam::header::HeaderRecord;
use rust_htslib::bam::record::{Aux, Cigar};
use rust_htslib::bam::{self, FetchDefinition, Header, HeaderView, Read, Record};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Path meaning standard input / output
pub const STDIO: &str = "-";

impl CigarOp {
    pub fn from_htslib(cigar: &Cigar) -> Self {
        match *cigar {
            Cigar::Match(n) => CigarOp::Match(n),
            Cigar::Ins(n) => CigarOp::Insertion(n),
            Cigar::Del(n) => CigarOp::Deletion(n),
            Cigar::RefSkip(n) => CigarOp::Skip(n),
            Cigar::SoftClip(n) => CigarOp::SoftClip(n),
            Cigar::HardClip(n) => CigarOp::HardClip(n),
            Cigar::Pad(n) => CigarOp::Padding(n),
            Cigar::Equal(n) => CigarOp::Equal(n),
            Cigar::Diff(n) => CigarOp::Diff(n),
        }
    }
}

impl AlignedRead for Record {
    fn qname(&self) -> &[u8] {
        Record::qname(self)
    }
    fn flags(&self) -> u16 {
        Record::flags(self)
    }
    fn tid(&self) -> i32 {
        Record::tid(self)
    }
    fn pos(&self) -> i64 {
        Record::pos(self)
    }
    fn mtid(&self) -> i32 {
        Record::mtid(self)
    }
    fn mpos(&self) -> i64 {
        Record::mpos(self)
    }
    fn mapq(&self) -> u8 {
        Record::mapq(self)
    }
    fn insert_size(&self) -> i64 {
        Record::insert_size(self)
    }
    fn cigar_ops(&self) -> Vec<CigarOp> {
        self.cigar().iter().map(CigarOp::from_htslib).collect()
    }
    fn sequence(&self) -> Cow<'_, [u8]> {
        Cow::Owned(self.seq().as_bytes())
    }
    fn qualities(&self) -> &[u8] {
        self.qual()
    }
    fn tag_int(&self, tag: &[u8; 2]) -> Option<i64> {
        match self.aux(tag).ok()? {
            Aux::I8(v) => Some(i64::from(v)),
            Aux::U8(v) => Some(i64::from(v)),
            Aux::I16(v) => Some(i64::from(v)),
            Aux::U16(v) => Some(i64::from(v)),
            Aux::I32(v) => Some(i64::from(v)),
            Aux::U32(v) => Some(i64::from(v)),
            _ => None,
        }
    }
    fn tag_str(&self, tag: &[u8; 2]) -> Option<String> {
        match self.aux(tag).ok()? {
            Aux::String(s) => Some(s.to_string()),
            Aux::Char(c) => Some(char::from(c).to_string()),
            _ => None,
        }
    }
}

/// Reference dictionary of an alignment header
pub fn reference_dict(header: &HeaderView) -> ReferenceDict {
    let mut dict = ReferenceDict::new();
    for tid in 0..header.target_count() {
        let name = String::from_utf8_lossy(header.tid2name(tid)).into_owned();
        dict.push(name, header.target_len(tid).unwrap_or(0));
    }
    dict
}

enum Reader {
    Stream(bam::Reader),
    Indexed {
        reader: bam::IndexedReader,
        intervals: Vec<GenomicInterval>,
        next: usize,
        /// Start of the interval being fetched; earlier reads belong to a previous one
        start: i64,
    },
}

/// Alignment file, or stdin for `-`
pub struct BamSource {
    path: Option<PathBuf>,
    name: String,
    threads: usize,
    reference: Option<PathBuf>,
    header: HeaderView,
    reader: Reader,
}

impl BamSource {
    /// Open `path` (`-` for stdin); `reference` is needed for CRAM input
    pub fn open<P: AsRef<Path>>(path: P, threads: usize, reference: Option<&Path>) -> Result<Self> {
        let path = path.as_ref();
        let (path, name) = if path.as_os_str() == STDIO {
            (None, "stdin".to_string())
        } else {
            (Some(path.to_path_buf()), path.display().to_string())
        };
        let reference = reference.map(Path::to_path_buf);
        let reader = open_stream(path.as_deref(), threads, reference.as_deref())?;
        let header = reader.header().clone();
        Ok(Self {
            path,
            name,
            threads,
            reference,
            header,
            reader: Reader::Stream(reader),
        })
    }

    pub fn header(&self) -> &HeaderView {
        &self.header
    }

    pub fn reference_dict(&self) -> ReferenceDict {
        reference_dict(&self.header)
    }

    fn fetch_next(&mut self) -> Result<bool> {
        let Reader::Indexed { reader, intervals, next, start } = &mut self.reader else {
            return Ok(false);
        };
        let Some(iv) = intervals.get(*next) else {
            return Ok(false);
        };
        *next += 1;
        *start = iv.start as i64;
        reader.fetch(FetchDefinition::Region(iv.chrom_id, iv.start as i64, iv.end as i64))?;
        Ok(true)
    }
}

fn open_stream(path: Option<&Path>, threads: usize, reference: Option<&Path>) -> Result<bam::Reader> {
    let mut reader = match path {
        Some(p) => bam::Reader::from_path(p)?,
        None => bam::Reader::from_stdin()?,
    };
    if threads > 1 {
        reader.set_threads(threads)?;
    }
    if let Some(r) = reference {
        reader.set_reference(r)?;
    }
    Ok(reader)
}

impl ReadSource for BamSource {
    type Read = Record;

    fn name(&self) -> &str {
        &self.name
    }

    fn next_read(&mut self) -> Option<Result<Record>> {
        let mut record = Record::new();
        loop {
            let (outcome, start) = match &mut self.reader {
                Reader::Stream(reader) => (reader.read(&mut record), None),
                Reader::Indexed { reader, start, .. } => (reader.read(&mut record), Some(*start)),
            };
            match outcome {
                Some(Ok(())) => {
                    if start.map_or(true, |s| record.pos() >= s) {
                        return Some(Ok(record));
                    }
                }
                Some(Err(e)) => return Some(Err(e.into())),
                None => match self.fetch_next() {
                    Ok(true) => {}
                    Ok(false) => return None,
                    Err(e) => return Some(Err(e)),
                },
            }
        }
    }

    fn supports_rewind(&self) -> bool {
        self.path.is_some()
    }

    fn rewind(&mut self) -> Result<()> {
        let Some(path) = &self.path else {
            return Err(InputCapabilityError::NotRewindable {
                source_name: self.name.clone(),
            }
            .into());
        };
        self.reader = Reader::Stream(open_stream(Some(path), self.threads, self.reference.as_deref())?);
        Ok(())
    }

    /// Switch to indexed fetching when the file has an index
    fn set_scan_regions(&mut self, intervals: &[GenomicInterval]) -> Result<()> {
        let Some(path) = &self.path else {
            debug!("Reading stdin, scan regions are applied by filtering");
            return Ok(());
        };
        let mut reader = match bam::IndexedReader::from_path(path) {
            Ok(r) => r,
            Err(e) => {
                warn!("No usable index for {} ({}), scanning the whole file", self.name, e);
                return Ok(());
            }
        };
        if self.threads > 1 {
            reader.set_threads(self.threads)?;
        }
        if let Some(r) = &self.reference {
            reader.set_reference(r)?;
        }
        debug!("Fetching {} intervals from {}", intervals.len(), self.name);
        self.reader = Reader::Indexed {
            reader,
            intervals: intervals.to_vec(),
            next: 0,
            start: 0,
        };
        self.fetch_next()?;
        Ok(())
    }
}

/// Output container format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Bam,
    Sam,
    Cram,
}

impl From<OutputFormat> for bam::Format {
    fn from(f: OutputFormat) -> Self {
        match f {
            OutputFormat::Bam => bam::Format::Bam,
            OutputFormat::Sam => bam::Format::Sam,
            OutputFormat::Cram => bam::Format::Cram,
        }
    }
}

/// Which aux tags to drop before writing
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TagStrip {
    #[default]
    Keep,
    All,
    Tags(Vec<[u8; 2]>),
}

impl TagStrip {
    /// Parse a comma-separated list such as `RG,MD,OQ`
    pub fn parse_list(list: &str) -> std::result::Result<Self, ConfigError> {
        let tags = list
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| {
                <[u8; 2]>::try_from(t.as_bytes()).map_err(|_| ConfigError::InvalidTag { tag: t.to_string() })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(if tags.is_empty() { TagStrip::Keep } else { TagStrip::Tags(tags) })
    }

    /// Copy of `record` without the stripped tags, `None` if nothing changes
    pub fn apply(&self, record: &Record) -> Result<Option<Record>> {
        let tags: Vec<[u8; 2]> = match self {
            TagStrip::Keep => return Ok(None),
            TagStrip::Tags(tags) => tags.iter().filter(|t| record.aux(&t[..]).is_ok()).copied().collect(),
            TagStrip::All => record
                .aux_iter()
                .filter_map(|aux| aux.ok())
                .filter_map(|(tag, _)| <[u8; 2]>::try_from(tag).ok())
                .collect(),
        };
        if tags.is_empty() {
            return Ok(None);
        }
        let mut out = record.clone();
        for tag in &tags {
            out.remove_aux(tag)?;
        }
        Ok(Some(out))
    }
}

/// Alignment writer for accepted reads
pub struct BamSink {
    writer: bam::Writer,
    strip: TagStrip,
    written: u64,
}

impl BamSink {
    /// Create a writer; `None` or `-` writes SAM to stdout
    pub fn create(
        output: Option<&Path>,
        format: OutputFormat,
        template: &HeaderView,
        reference: Option<&Path>,
        threads: usize,
    ) -> Result<Self> {
        let header = output_header(template);
        let mut writer = match output.filter(|p| p.as_os_str() != STDIO) {
            Some(path) => bam::Writer::from_path(path, &header, format.into())?,
            None => bam::Writer::from_stdout(&header, bam::Format::Sam)?,
        };
        if threads > 1 {
            writer.set_threads(threads)?;
        }
        if format == OutputFormat::Cram {
            if let Some(r) = reference {
                writer.set_reference(r)?;
            }
        }
        Ok(Self {
            writer,
            strip: TagStrip::Keep,
            written: 0,
        })
    }

    pub fn with_strip(mut self, strip: TagStrip) -> Self {
        self.strip = strip;
        self
    }

    pub fn written(&self) -> u64 {
        self.written
    }
}

/// Input header plus a @PG line for this program
fn output_header(template: &HeaderView) -> Header {
    let mut header = Header::from_template(template);
    let mut pg = HeaderRecord::new(b"PG");
    pg.push_tag(b"ID", env!("CARGO_PKG_NAME"));
    pg.push_tag(b"PN", env!("CARGO_PKG_NAME"));
    pg.push_tag(b"VN", env!("CARGO_PKG_VERSION"));
    header.push_record(&pg);
    header
}

impl ReadSink<Record> for BamSink {
    fn write_read(&mut self, read: &Record) -> Result<()> {
        match self.strip.apply(read)? {
            Some(stripped) => self.writer.write(&stripped)?,
            None => self.writer.write(read)?,
        }
        self.written += 1;
        Ok(())
    }
}
