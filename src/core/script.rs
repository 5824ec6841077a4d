//! Rule scripts and command-line regions
//!
//! A rule script is a JSON object of named blocks. Each block binds a region
//! (`WG`, a region string or a region file) to a list of rules, every rule an
//! object of condition keys. The optional `global` block holds conditions
//! merged into every rule.
//!
//! ```json
//! {
//!   "global": {"duplicate": false, "qcfail": false},
//!   "tumor":  {"region": "chr1:1,000-2,000", "pad": 50, "matelink": true,
//!              "rules": [{"mapq": [20, 60]}, {"clip": 10, "motif": ["TTAGGG"]}]}
//! }
//! ```
//!
//! A rule holding `subsample` may also set `subsample_seed` to change which
//! names the draw keeps.
//!
//! Regions given on the command line become one extra block each, in the
//! order given, after the script's blocks.

use crate::core::condition::{Condition, FlagCondition, MotifSet, NumericAttr, NumericRange};
use crate::core::error::{ConfigError, Result, RuleParseError, RuleResult};
use crate::core::index::RegionIndex;
use crate::core::io::{read_joined, read_list_file};
use crate::core::region::{ReferenceDict, RegionKind};
use crate::core::rules::{RegionBinding, RuleCollection, RuleSet};
use crate::formats::region::{RegionSpec, WHOLE_GENOME};
use log::{debug, info, warn};
use serde_json::{Map, Value};
use std::path::Path;

/// Block whose conditions apply to every rule
pub const GLOBAL_BLOCK: &str = "global";

/// One block of a script, regions not yet resolved
#[derive(Debug, Clone)]
pub struct ScriptBlock {
    pub name: String,
    pub region: String,
    pub pad: u64,
    pub kind: RegionKind,
    /// Condition lists, one per rule set
    pub rules: Vec<Vec<Condition>>,
}

impl ScriptBlock {
    /// Resolve the region against the header and build one [`RuleSet`] per rule
    ///
    /// Rule ids are `<block>.<index>`.
    pub fn resolve(&self, dict: &ReferenceDict) -> Result<Vec<RuleSet>> {
        let binding = match RegionSpec::parse(&self.region).resolve(dict)? {
            None => RegionBinding::WholeGenome,
            Some(regions) => {
                if regions.is_empty() {
                    warn!("Region '{}' of block '{}' holds no intervals", self.region, self.name);
                }
                let regions = regions.into_iter().map(|r| r.with_kind(self.kind));
                RegionBinding::Regions(RegionIndex::build(regions, self.pad))
            }
        };
        Ok(self
            .rules
            .iter()
            .enumerate()
            .map(|(i, conditions)| {
                RuleSet::new(format!("{}.{}", self.name, i), binding.clone(), self.kind, conditions.clone())
            })
            .collect())
    }
}

/// A parsed rule script
#[derive(Debug, Clone, Default)]
pub struct RuleScript {
    pub blocks: Vec<ScriptBlock>,
}

impl RuleScript {
    /// Parse script text; empty text is an empty script
    pub fn parse(text: &str) -> RuleResult<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Self::default());
        }
        let value: Value = serde_json::from_str(text).map_err(|e| {
            RuleParseError::new(snippet(text, e.line(), e.column()), format!("malformed rule script: {}", e))
        })?;
        let Value::Object(top) = value else {
            return Err(RuleParseError::invalid_value("script", &value, "an object of rule blocks"));
        };

        let global = match top.get(GLOBAL_BLOCK) {
            None => Map::new(),
            Some(Value::Object(g)) => g.clone(),
            Some(other) => {
                return Err(RuleParseError::invalid_value(GLOBAL_BLOCK, other, "an object of conditions"))
            }
        };
        parse_conditions(&global)?;

        let mut blocks = top
            .iter()
            .filter(|(name, _)| name.as_str() != GLOBAL_BLOCK)
            .map(|(name, body)| parse_block(name, body, &global))
            .collect::<RuleResult<Vec<_>>>()?;
        // A lone global block applies to the whole genome
        if blocks.is_empty() && !global.is_empty() {
            blocks.push(parse_block(GLOBAL_BLOCK, &Value::Object(Map::new()), &global)?);
        }
        Ok(Self { blocks })
    }

    /// Script given on the command line: a readable file (lines joined) or the text itself
    pub fn from_arg(arg: &str) -> RuleResult<Self> {
        let path = Path::new(arg);
        if path.is_file() {
            let text = read_joined(path)
                .map_err(|e| RuleParseError::new(arg, format!("cannot read rule script: {}", e)))?;
            Self::parse(&text)
        } else {
            Self::parse(arg)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn has_linked(&self) -> bool {
        self.blocks.iter().any(|b| b.kind.is_linked())
    }
}

fn snippet(text: &str, line: usize, column: usize) -> String {
    let line = text.lines().nth(line.saturating_sub(1)).unwrap_or(text);
    let chars: Vec<char> = line.chars().collect();
    let at = column.saturating_sub(1).min(chars.len());
    chars[at.saturating_sub(15)..(at + 15).min(chars.len())].iter().collect()
}

fn parse_block(name: &str, body: &Value, global: &Map<String, Value>) -> RuleResult<ScriptBlock> {
    let Value::Object(fields) = body else {
        return Err(RuleParseError::invalid_value(name, body, "an object"));
    };
    let mut region = WHOLE_GENOME.to_string();
    let mut pad = 0;
    let mut exclude = false;
    let mut linked = false;
    let mut rules: &[Value] = &[];

    for (key, value) in fields {
        match key.as_str() {
            "region" => {
                region = value
                    .as_str()
                    .ok_or_else(|| RuleParseError::invalid_value(key, value, "a region string or path"))?
                    .to_string()
            }
            "pad" => {
                pad = value
                    .as_u64()
                    .ok_or_else(|| RuleParseError::invalid_value(key, value, "a non-negative integer"))?
            }
            "matelink" => linked = as_bool(key, value)?,
            "exclude" => exclude = as_bool(key, value)?,
            "rules" => {
                rules = value
                    .as_array()
                    .map(Vec::as_slice)
                    .ok_or_else(|| RuleParseError::invalid_value(key, value, "an array of rules"))?
            }
            _ => return Err(RuleParseError::unknown_key(key)),
        }
    }

    let mut parsed = Vec::with_capacity(rules.len().max(1));
    if rules.is_empty() {
        parsed.push(parse_conditions(global)?);
    }
    for rule in rules {
        let Value::Object(conditions) = rule else {
            return Err(RuleParseError::invalid_value("rules", rule, "an object of conditions"));
        };
        let mut merged = global.clone();
        for (k, v) in conditions {
            merged.insert(k.clone(), v.clone());
        }
        parsed.push(parse_conditions(&merged)?);
    }

    Ok(ScriptBlock {
        name: name.to_string(),
        region,
        pad,
        kind: RegionKind::new(exclude, linked),
        rules: parsed,
    })
}

/// Key setting the hash seed of the rule's `subsample` condition
pub const SUBSAMPLE_SEED_KEY: &str = "subsample_seed";

fn parse_conditions(map: &Map<String, Value>) -> RuleResult<Vec<Condition>> {
    let mut conditions = map
        .iter()
        .filter(|(k, _)| k.as_str() != SUBSAMPLE_SEED_KEY)
        .map(|(k, v)| parse_condition(k, v))
        .collect::<RuleResult<Vec<_>>>()?;
    if let Some(value) = map.get(SUBSAMPLE_SEED_KEY) {
        let seed = value
            .as_u64()
            .and_then(|s| u32::try_from(s).ok())
            .ok_or_else(|| RuleParseError::invalid_value(SUBSAMPLE_SEED_KEY, value, "a 32-bit unsigned seed"))?;
        let mut applied = false;
        for condition in &mut conditions {
            if let Condition::Subsample { seed: s, .. } = condition {
                *s = seed;
                applied = true;
            }
        }
        if !applied {
            return Err(RuleParseError::new(SUBSAMPLE_SEED_KEY, "needs a subsample rate in the same rule"));
        }
    }
    Ok(conditions)
}

fn as_bool(key: &str, value: &Value) -> RuleResult<bool> {
    value
        .as_bool()
        .ok_or_else(|| RuleParseError::invalid_value(key, value, "true or false"))
}

fn as_integer(key: &str, value: &Value) -> RuleResult<i64> {
    if let Some(n) = value.as_i64() {
        return Ok(n);
    }
    match value.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 => Ok(f as i64),
        _ => Err(RuleParseError::invalid_value(key, value, "an integer")),
    }
}

fn parse_range(attr: NumericAttr, key: &str, value: &Value) -> RuleResult<NumericRange> {
    match value {
        Value::Number(_) => Ok(attr.threshold(as_integer(key, value)?)),
        Value::Array(bounds) if bounds.len() == 2 => {
            Ok(NumericRange::new(as_integer(key, &bounds[0])?, as_integer(key, &bounds[1])?))
        }
        _ => Err(RuleParseError::invalid_value(key, value, "a number or a [lo, hi] pair")),
    }
}

fn parse_motif(value: &Value) -> RuleResult<MotifSet> {
    let motifs: Vec<String> = match value {
        Value::String(path) => read_list_file(path)
            .map_err(|e| RuleParseError::new(path.as_str(), format!("cannot read motif file: {}", e)))?,
        Value::Array(items) => items
            .iter()
            .map(|m| {
                m.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| RuleParseError::invalid_value("motif", m, "a motif string"))
            })
            .collect::<RuleResult<_>>()?,
        _ => return Err(RuleParseError::invalid_value("motif", value, "a file path or an array of motifs")),
    };
    let set = MotifSet::new(motifs);
    if set.is_empty() {
        return Err(RuleParseError::invalid_value("motif", value, "at least one motif"));
    }
    Ok(set)
}

/// Parse one condition key
pub fn parse_condition(key: &str, value: &Value) -> RuleResult<Condition> {
    if let Some(flag) = FlagCondition::from_key(key) {
        return Ok(Condition::flag(flag, as_bool(key, value)?));
    }
    if let Some(attr) = NumericAttr::from_key(key) {
        return Ok(Condition::range(attr, parse_range(attr, key, value)?));
    }
    match key {
        "motif" => Ok(Condition::Motif(parse_motif(value)?)),
        "subsample" => match value.as_f64() {
            Some(rate) if (0.0..=1.0).contains(&rate) => Ok(Condition::Subsample { rate, seed: 0 }),
            _ => Err(RuleParseError::invalid_value(key, value, "a rate between 0 and 1")),
        },
        "rg" => value
            .as_str()
            .map(|rg| Condition::ReadGroup(rg.to_string()))
            .ok_or_else(|| RuleParseError::invalid_value(key, value, "a read group id")),
        "include_flag" | "exclude_flag" => {
            let mask = value
                .as_u64()
                .and_then(|m| u16::try_from(m).ok())
                .ok_or_else(|| RuleParseError::invalid_value(key, value, "a flag mask"))?;
            Ok(if key == "include_flag" {
                Condition::IncludeFlags(mask)
            } else {
                Condition::ExcludeFlags(mask)
            })
        }
        _ => Err(RuleParseError::unknown_key(key)),
    }
}

/// A region given on the command line with the options that follow it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLineRegion {
    pub region: String,
    pub kind: RegionKind,
    pub pad: u64,
    pub min_mapq: Option<i64>,
    pub min_length: Option<i64>,
    pub min_phred: Option<i64>,
    pub max_nbases: Option<i64>,
    pub read_group: Option<String>,
    pub include_flag: Option<u16>,
    pub exclude_flag: Option<u16>,
}

impl CommandLineRegion {
    pub fn new(region: impl Into<String>, kind: RegionKind) -> Self {
        Self {
            region: region.into(),
            kind,
            pad: 0,
            min_mapq: None,
            min_length: None,
            min_phred: None,
            max_nbases: None,
            read_group: None,
            include_flag: None,
            exclude_flag: None,
        }
    }

    pub fn conditions(&self) -> Vec<Condition> {
        let mut out = Vec::new();
        if let Some(q) = self.min_mapq {
            out.push(Condition::range(NumericAttr::MappingQuality, NumericRange::at_least(q)));
        }
        if let Some(l) = self.min_length {
            out.push(Condition::range(NumericAttr::TrimmedLength, NumericRange::at_least(l)));
        }
        if let Some(p) = self.min_phred {
            out.push(Condition::range(NumericAttr::MeanQuality, NumericRange::at_least(p)));
        }
        if let Some(n) = self.max_nbases {
            out.push(Condition::range(NumericAttr::NBases, NumericRange::at_most(n)));
        }
        if let Some(rg) = &self.read_group {
            out.push(Condition::ReadGroup(rg.clone()));
        }
        if let Some(mask) = self.include_flag {
            out.push(Condition::IncludeFlags(mask));
        }
        if let Some(mask) = self.exclude_flag {
            out.push(Condition::ExcludeFlags(mask));
        }
        out
    }

    pub fn to_block(&self, name: impl Into<String>) -> ScriptBlock {
        ScriptBlock {
            name: name.into(),
            region: self.region.clone(),
            pad: self.pad,
            kind: self.kind,
            rules: vec![self.conditions()],
        }
    }
}

/// An option that modifies the most recent command-line region
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionOption {
    Pad(u64),
    MinMapq(i64),
    MinLength(i64),
    MinPhred(i64),
    MaxNBases(i64),
    ReadGroup(String),
    IncludeFlag(u16),
    ExcludeFlag(u16),
}

impl RegionOption {
    /// Long option name, for error messages
    pub fn name(&self) -> &'static str {
        match self {
            RegionOption::Pad(_) => "--region-pad",
            RegionOption::MinMapq(_) => "--min-mapq",
            RegionOption::MinLength(_) => "--min-length",
            RegionOption::MinPhred(_) => "--min-phred",
            RegionOption::MaxNBases(_) => "--max-nbases",
            RegionOption::ReadGroup(_) => "--read-group",
            RegionOption::IncludeFlag(_) => "--include-flag",
            RegionOption::ExcludeFlag(_) => "--exclude-flag",
        }
    }
}

/// Command-line regions in the order given
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandLineRegions {
    regions: Vec<CommandLineRegion>,
}

impl CommandLineRegions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_region(&mut self, kind: RegionKind, region: impl Into<String>) {
        self.regions.push(CommandLineRegion::new(region, kind));
    }

    /// Apply an option to the most recent region
    pub fn apply(&mut self, option: RegionOption) -> std::result::Result<(), ConfigError> {
        let Some(last) = self.regions.last_mut() else {
            return Err(ConfigError::OptionBeforeRegion {
                option: option.name().to_string(),
            });
        };
        match option {
            RegionOption::Pad(p) => last.pad = p,
            RegionOption::MinMapq(v) => last.min_mapq = Some(v),
            RegionOption::MinLength(v) => last.min_length = Some(v),
            RegionOption::MinPhred(v) => last.min_phred = Some(v),
            RegionOption::MaxNBases(v) => last.max_nbases = Some(v),
            RegionOption::ReadGroup(rg) => last.read_group = Some(rg),
            RegionOption::IncludeFlag(m) => last.include_flag = Some(m),
            RegionOption::ExcludeFlag(m) => last.exclude_flag = Some(m),
        }
        Ok(())
    }

    pub fn regions(&self) -> &[CommandLineRegion] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn has_linked(&self) -> bool {
        self.regions.iter().any(|r| r.kind.is_linked())
    }

    /// One block per region, named `cmd1`, `cmd2`, ...
    pub fn to_blocks(&self) -> Vec<ScriptBlock> {
        self.regions
            .iter()
            .enumerate()
            .map(|(i, r)| r.to_block(format!("cmd{}", i + 1)))
            .collect()
    }
}

/// Build the rule collection from a script and command-line regions
///
/// With neither, every read is kept through a single whole-genome rule.
pub fn build_rule_collection(
    script: &RuleScript,
    regions: &CommandLineRegions,
    dict: &ReferenceDict,
) -> Result<RuleCollection> {
    let mut blocks = script.blocks.clone();
    blocks.extend(regions.to_blocks());
    if blocks.is_empty() {
        debug!("No rules or regions given, keeping every read");
        blocks.push(CommandLineRegion::new(WHOLE_GENOME, RegionKind::Include).to_block("all"));
    }

    let mut rules = Vec::new();
    for block in &blocks {
        rules.extend(block.resolve(dict)?);
    }
    let collection = RuleCollection::new(rules);

    if collection.rules().iter().all(|r| r.is_exclude()) {
        warn!("Only exclude rules given; no read can be accepted");
    }
    info!("Loaded {} rule sets from {} blocks", collection.len(), blocks.len());
    debug!("{}", collection);
    Ok(collection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{ResolutionError, VariantBamError};
    use crate::core::read::OwnedRead;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn dict() -> ReferenceDict {
        ReferenceDict::from_pairs(vec![("chr1", 1_000_000u64), ("chr2", 500_000)])
    }

    #[test]
    fn test_parse_blocks_in_order() {
        let script = RuleScript::parse(
            r#"{"zeta": {"rules": [{"mapq": 20}]},
                "alpha": {"region": "chr1:1-100", "exclude": true},
                "mid": {"matelink": true, "pad": 5, "rules": [{"ic": true}, {"isize": [1000, 0]}]}}"#,
        )
        .unwrap();
        let names: Vec<&str> = script.blocks.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert_eq!(script.blocks[1].kind, RegionKind::Exclude);
        assert_eq!(script.blocks[1].rules.len(), 1);
        assert!(script.blocks[1].rules[0].is_empty());
        assert_eq!(script.blocks[2].kind, RegionKind::Linked);
        assert_eq!(script.blocks[2].pad, 5);
        assert_eq!(script.blocks[2].rules.len(), 2);
        assert!(script.has_linked());
    }

    #[test]
    fn test_range_forms() {
        let v = |s: &str| serde_json::from_str::<Value>(s).unwrap();
        let range = |key: &str, s: &str| match parse_condition(key, &v(s)).unwrap() {
            Condition::Range { range, .. } => range,
            other => panic!("not a range: {:?}", other),
        };
        assert_eq!(range("mapq", "20"), NumericRange::at_least(20));
        assert_eq!(range("nbases", "2"), NumericRange::at_most(2));
        assert_eq!(range("isize", "[101, 5]"), NumericRange::new(101, 5));
        assert_eq!(range("clip", "5.0"), NumericRange::at_least(5));
        assert!(parse_condition("mapq", &v("[1, 2, 3]")).is_err());
        assert!(parse_condition("mapq", &v("\"high\"")).is_err());
        assert!(parse_condition("mapq", &v("2.5")).is_err());
    }

    #[test]
    fn test_bad_keys_and_values() {
        let err = RuleScript::parse(r#"{"a": {"rules": [{"mapqq": 1}]}}"#).unwrap_err();
        assert_eq!(err.token, "mapqq");
        assert!(RuleScript::parse(r#"{"a": {"regoin": "WG"}}"#).is_err());
        assert!(RuleScript::parse(r#"{"a": {"rules": [{"subsample": 1.5}]}}"#).is_err());
        assert!(RuleScript::parse(r#"{"a": {"rules": [{"duplicate": "no"}]}}"#).is_err());
        assert!(RuleScript::parse(r#"{"a": {"pad": -3}}"#).is_err());
        assert!(RuleScript::parse(r#"{"a": {"rules": [{"exclude_flag": 70000}]}}"#).is_err());
        assert!(RuleScript::parse("[1, 2]").is_err());
    }

    #[test]
    fn test_subsample_seed() {
        let seeded = |text: &str| {
            let script = RuleScript::parse(text).unwrap();
            match &script.blocks[0].rules[0][..] {
                [Condition::Subsample { rate, seed }] => (*rate, *seed),
                other => panic!("expected one subsample, got {:?}", other),
            }
        };
        assert_eq!(seeded(r#"{"a": {"rules": [{"subsample": 0.5}]}}"#), (0.5, 0));
        assert_eq!(seeded(r#"{"a": {"rules": [{"subsample_seed": 7, "subsample": 0.5}]}}"#), (0.5, 7));
        assert_eq!(
            seeded(r#"{"global": {"subsample_seed": 3}, "a": {"rules": [{"subsample": 0.2}]}}"#),
            (0.2, 3)
        );

        let err = RuleScript::parse(r#"{"a": {"rules": [{"mapq": 1, "subsample_seed": 7}]}}"#).unwrap_err();
        assert_eq!(err.token, SUBSAMPLE_SEED_KEY);
        assert!(RuleScript::parse(r#"{"a": {"rules": [{"subsample": 0.5, "subsample_seed": -1}]}}"#).is_err());
        assert!(RuleScript::parse(r#"{"a": {"rules": [{"subsample": 0.5, "subsample_seed": 5000000000}]}}"#).is_err());
    }

    #[test]
    fn test_unterminated_script() {
        let err = RuleScript::parse(r#"{"a": {"rules": [{"mapq": 1}]"#).unwrap_err();
        assert!(err.message.starts_with("malformed rule script"));
    }

    #[test]
    fn test_global_merged_and_overridden() {
        let script = RuleScript::parse(
            r#"{"global": {"duplicate": false, "mapq": 10},
                "a": {"rules": [{"mapq": 30}, {"clip": 5}]},
                "b": {}}"#,
        )
        .unwrap();
        let a = &script.blocks[0].rules;
        assert_eq!(a[0].len(), 2);
        assert!(a[0].iter().any(|c| matches!(
            c,
            Condition::Range { attr: NumericAttr::MappingQuality, range } if *range == NumericRange::at_least(30)
        )));
        assert_eq!(a[1].len(), 3);
        assert_eq!(script.blocks[1].rules[0].len(), 2);

        let lone = RuleScript::parse(r#"{"global": {"mapq": 20}}"#).unwrap();
        assert_eq!(lone.blocks.len(), 1);
        assert_eq!(lone.blocks[0].name, "global");
        assert_eq!(lone.blocks[0].region, "WG");
        assert_eq!(lone.blocks[0].rules[0].len(), 1);
    }

    #[test]
    fn test_motif_inline_and_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "TTAGGG\nCCCTAA").unwrap();
        file.flush().unwrap();
        let text = format!(
            r#"{{"a": {{"rules": [{{"motif": "{}"}}, {{"motif": ["GATC"]}}]}}}}"#,
            file.path().display()
        );
        let script = RuleScript::parse(&text).unwrap();
        match &script.blocks[0].rules[0][0] {
            Condition::Motif(set) => assert_eq!(set.len(), 2),
            other => panic!("not a motif: {:?}", other),
        }
        assert!(RuleScript::parse(r#"{"a": {"rules": [{"motif": []}]}}"#).is_err());
        assert!(RuleScript::parse(r#"{"a": {"rules": [{"motif": "/no/such/motifs.txt"}]}}"#).is_err());
    }

    #[test]
    fn test_script_from_file_arg() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{\"a\":\n {{\"rules\": [{{\"mapped\": true}}]}}\n}}").unwrap();
        file.flush().unwrap();
        let script = RuleScript::from_arg(file.path().to_str().unwrap()).unwrap();
        assert_eq!(script.blocks.len(), 1);
        assert!(RuleScript::from_arg("").unwrap().is_empty());
    }

    #[test]
    fn test_option_before_region_rejected() {
        let mut cl = CommandLineRegions::new();
        let err = cl.apply(RegionOption::Pad(10)).unwrap_err();
        assert_eq!(
            err,
            ConfigError::OptionBeforeRegion {
                option: "--region-pad".to_string()
            }
        );
        assert!(cl.apply(RegionOption::MinMapq(10)).is_err());

        cl.push_region(RegionKind::Include, "chr1");
        cl.apply(RegionOption::Pad(10)).unwrap();
        cl.apply(RegionOption::MinMapq(30)).unwrap();
        cl.push_region(RegionKind::Exclude, "chr2");
        cl.apply(RegionOption::ExcludeFlag(0x400)).unwrap();
        assert_eq!(cl.regions()[0].pad, 10);
        assert_eq!(cl.regions()[0].conditions().len(), 1);
        assert_eq!(cl.regions()[1].pad, 0);
        assert_eq!(cl.regions()[1].exclude_flag, Some(0x400));
    }

    #[test]
    fn test_build_collection() {
        let script = RuleScript::parse(r#"{"a": {"region": "chr1:1,001-2,000", "pad": 50}}"#).unwrap();
        let mut cl = CommandLineRegions::new();
        cl.push_region(RegionKind::Exclude, "chr2");
        let rc = build_rule_collection(&script, &cl, &dict()).unwrap();
        let ids: Vec<&str> = rc.rules().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a.0", "cmd1.0"]);
        assert!(rc.rules()[0].matches(&OwnedRead::new("r").at(0, 950)));
        assert!(!rc.rules()[0].matches(&OwnedRead::new("r").at(0, 949)));
        assert!(rc.rules()[1].is_exclude());
    }

    #[test]
    fn test_build_defaults_to_whole_genome() {
        let rc = build_rule_collection(&RuleScript::default(), &CommandLineRegions::new(), &dict()).unwrap();
        assert_eq!(rc.len(), 1);
        assert!(rc.all_regions().is_none());
        assert!(rc.rules()[0].matches(&OwnedRead::new("u")));
    }

    #[test]
    fn test_unknown_chromosome_fails() {
        let script = RuleScript::parse(r#"{"a": {"region": "chr9:1-100"}}"#).unwrap();
        let err = build_rule_collection(&script, &CommandLineRegions::new(), &dict()).unwrap_err();
        assert!(matches!(
            err,
            VariantBamError::Resolution(ResolutionError::UnknownChromosome(_))
        ));
    }
}
