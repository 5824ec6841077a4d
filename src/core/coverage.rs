//! Streaming coverage cap / floor
//!
//! Counts accepted reads per alignment start position. Input must be
//! coordinate-sorted: the window only ever holds the position the scan is
//! on, and moving past it evicts its count. A regression in position is an
//! error rather than a silently wrong count.

use crate::core::error::ConfigError;

/// How `--max-coverage` constrains output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoverageMode {
    #[default]
    Off,
    /// At most this many accepted reads per position
    Cap(u32),
    /// Keep otherwise-rejected reads until a position has this many
    Floor(u32),
}

impl CoverageMode {
    /// Positive values cap, negative values set a floor, zero disables
    ///
    /// # Examples
    /// ```
    /// use fast_variantbam::core::CoverageMode;
    /// assert_eq!(CoverageMode::from_max_coverage(100), CoverageMode::Cap(100));
    /// assert_eq!(CoverageMode::from_max_coverage(-5), CoverageMode::Floor(5));
    /// assert_eq!(CoverageMode::from_max_coverage(0), CoverageMode::Off);
    /// ```
    pub fn from_max_coverage(max_cov: i32) -> Self {
        match max_cov {
            0 => CoverageMode::Off,
            c if c > 0 => CoverageMode::Cap(c.unsigned_abs()),
            c => CoverageMode::Floor(c.unsigned_abs()),
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, CoverageMode::Off)
    }
}

/// Counters kept by the controller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoverageStats {
    /// Rule-accepted reads dropped by the cap
    pub capped: u64,
    /// Rule-rejected reads kept by the floor
    pub rescued: u64,
}

/// Per-position accepted-read counter over a coordinate-sorted stream
#[derive(Debug, Clone, Default)]
pub struct CoverageController {
    mode: CoverageMode,
    /// Position the window is on, as (chrom id, start)
    current: Option<(i32, i64)>,
    /// Accepted reads at `current`
    accepted: u32,
    stats: CoverageStats,
}

impl CoverageController {
    pub fn new(mode: CoverageMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn mode(&self) -> CoverageMode {
        self.mode
    }

    pub fn stats(&self) -> CoverageStats {
        self.stats
    }

    /// Slide the window to `(tid, pos)`, evicting the previous position
    fn advance(&mut self, tid: i32, pos: i64) -> Result<(), ConfigError> {
        match self.current {
            Some((ctid, cpos)) if ctid == tid && cpos == pos => return Ok(()),
            Some((ctid, cpos)) if tid < ctid || (tid == ctid && pos < cpos) => {
                return Err(ConfigError::UnsortedInput {
                    chrom_id: tid,
                    position: pos,
                    previous: if tid == ctid { cpos } else { -1 },
                });
            }
            _ => {}
        }
        self.current = Some((tid, pos));
        self.accepted = 0;
        Ok(())
    }

    /// Apply the cap or floor to a read the rules accepted (`rule_accept`) or not
    ///
    /// Unplaced reads (`tid < 0`) pass through untouched.
    pub fn admit(&mut self, tid: i32, pos: i64, rule_accept: bool) -> Result<bool, ConfigError> {
        if !self.mode.is_active() || tid < 0 {
            return Ok(rule_accept);
        }
        self.advance(tid, pos)?;

        let accept = match self.mode {
            CoverageMode::Off => rule_accept,
            CoverageMode::Cap(cap) => {
                let ok = rule_accept && self.accepted < cap;
                if rule_accept && !ok {
                    self.stats.capped += 1;
                }
                ok
            }
            CoverageMode::Floor(floor) => {
                let ok = rule_accept || self.accepted < floor;
                if ok && !rule_accept {
                    self.stats.rescued += 1;
                }
                ok
            }
        };
        if accept {
            self.accepted += 1;
        }
        Ok(accept)
    }

    /// Count a read that is written regardless of the cap
    pub fn record(&mut self, tid: i32, pos: i64) -> Result<(), ConfigError> {
        if !self.mode.is_active() || tid < 0 {
            return Ok(());
        }
        self.advance(tid, pos)?;
        self.accepted += 1;
        Ok(())
    }

    /// Forget the window, e.g. before a new pass
    pub fn reset(&mut self) {
        self.current = None;
        self.accepted = 0;
        self.stats = CoverageStats::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cap_limits_each_position() {
        let mut cov = CoverageController::new(CoverageMode::Cap(2));
        let kept: Vec<bool> = [10, 10, 10, 11, 11, 11]
            .iter()
            .map(|&p| cov.admit(0, p, true).unwrap())
            .collect();
        assert_eq!(kept, vec![true, true, false, true, true, false]);
        assert_eq!(cov.stats().capped, 2);
    }

    #[test]
    fn test_cap_never_admits_rule_rejects() {
        let mut cov = CoverageController::new(CoverageMode::Cap(5));
        assert!(!cov.admit(0, 10, false).unwrap());
    }

    #[test]
    fn test_floor_rescues_until_reached() {
        let mut cov = CoverageController::new(CoverageMode::Floor(2));
        let kept: Vec<bool> = [false, false, false, true]
            .iter()
            .map(|&a| cov.admit(0, 10, a).unwrap())
            .collect();
        assert_eq!(kept, vec![true, true, false, true]);
        assert_eq!(cov.stats().rescued, 2);
    }

    #[test]
    fn test_unsorted_input_detected() {
        let mut cov = CoverageController::new(CoverageMode::Cap(1));
        cov.admit(1, 100, true).unwrap();
        assert!(matches!(cov.admit(1, 50, true), Err(ConfigError::UnsortedInput { .. })));
        assert!(matches!(cov.admit(0, 500, true), Err(ConfigError::UnsortedInput { .. })));
    }

    #[test]
    fn test_off_and_unplaced_pass_through() {
        let mut off = CoverageController::new(CoverageMode::Off);
        assert!(off.admit(0, 100, true).unwrap());
        assert!(off.admit(0, 5, true).unwrap());
        let mut cov = CoverageController::new(CoverageMode::Cap(1));
        cov.admit(0, 100, true).unwrap();
        assert!(cov.admit(-1, -1, true).unwrap());
        assert!(cov.admit(-1, -1, true).unwrap());
    }

    #[test]
    fn test_record_counts_towards_cap() {
        let mut cov = CoverageController::new(CoverageMode::Cap(1));
        cov.record(0, 10).unwrap();
        assert!(!cov.admit(0, 10, true).unwrap());
    }
}
