use crate::timing::Cycle;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur when loading or validating timing parameters.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum ConfigError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    JsonError(#[from] serde_json::Error),
    #[error("Timing parameter {name} must not be negative, got {value}")]
    NegativeTiming { name: &'static str, value: i64 },
    #[error("Same-group {same} ({same_value}) must not be shorter than different-group {diff} ({diff_value})")]
    InconsistentGroupTiming {
        same: &'static str,
        same_value: i64,
        diff: &'static str,
        diff_value: i64,
    },
    #[error("Batch capacity must be at least 1")]
    ZeroCapacity,
    #[error("Tracker enforces different timing parameters than the scheduler")]
    TrackerMismatch,
}

/// Result type for TimingParams constructors.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// DRAM timing parameter set, all values in controller clock cycles.
///
/// Loaded from JSON files with one entry per parameter. Missing entries fall back to
/// the reference values of [`TimingParams::default`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct TimingParams {
    /// ACTIVATE to READ delay (tRCD)
    pub t_rcd: i64,
    /// READ to start of data burst (tCL)
    pub t_cl: i64,
    /// ACTIVATE to PRECHARGE delay (tRAS)
    pub t_ras: i64,
    /// PRECHARGE duration (tRP)
    pub t_rp: i64,
    /// READ to PRECHARGE delay (tRTP)
    pub t_rtp: i64,
    /// ACTIVATE to ACTIVATE, same bank group (tRRD_L)
    pub t_rrd_sg: i64,
    /// ACTIVATE to ACTIVATE, different bank group (tRRD_S)
    pub t_rrd_dg: i64,
    /// Window in which at most four ACTIVATEs may issue (tFAW)
    pub t_faw: i64,
    /// READ to READ, same bank group (tCCD_L)
    pub t_rdrd_sg: i64,
    /// READ to READ, different bank group (tCCD_S)
    pub t_rdrd_dg: i64,
}

impl Default for TimingParams {
    fn default() -> Self {
        Self {
            t_rcd: 14,
            t_cl: 14,
            t_ras: 28,
            t_rp: 14,
            t_rtp: 8,
            t_rrd_sg: 4,
            t_rrd_dg: 4,
            t_faw: 16,
            t_rdrd_sg: 7,
            t_rdrd_dg: 4,
        }
    }
}

impl TimingParams {
    /// Loads timing parameters from a JSON file.
    ///
    /// # Arguments
    ///
    /// * `filepath` - Path to the JSON configuration file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed, or if the values are invalid
    pub fn from_jsonfile(filepath: &str) -> Result<TimingParams> {
        let mut file = File::open(Path::new(filepath))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        let params: TimingParams = serde_json::from_str(&contents)?;
        params.validate()?;
        Ok(params)
    }

    fn named(&self) -> [(&'static str, i64); 10] {
        [
            ("tRCD", self.t_rcd),
            ("tCL", self.t_cl),
            ("tRAS", self.t_ras),
            ("tRP", self.t_rp),
            ("tRTP", self.t_rtp),
            ("tRRD_sg", self.t_rrd_sg),
            ("tRRD_dg", self.t_rrd_dg),
            ("tFAW", self.t_faw),
            ("tRDRD_sg", self.t_rdrd_sg),
            ("tRDRD_dg", self.t_rdrd_dg),
        ]
    }

    /// Checks that all parameters are non-negative and that every same-group spacing
    /// is at least its different-group counterpart.
    pub fn validate(&self) -> Result<()> {
        if let Some((name, value)) = self.named().into_iter().find(|(_, v)| *v < 0) {
            return Err(ConfigError::NegativeTiming { name, value });
        }
        let pairs = [
            (("tRRD_sg", self.t_rrd_sg), ("tRRD_dg", self.t_rrd_dg)),
            (("tRDRD_sg", self.t_rdrd_sg), ("tRDRD_dg", self.t_rdrd_dg)),
        ];
        for ((same, same_value), (diff, diff_value)) in pairs {
            if same_value < diff_value {
                return Err(ConfigError::InconsistentGroupTiming {
                    same,
                    same_value,
                    diff,
                    diff_value,
                });
            }
        }
        Ok(())
    }
}

/// [`TimingParams`] that passed [`TimingParams::validate`], converted to cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Spacing {
    pub t_rcd: Cycle,
    pub t_ras: Cycle,
    pub t_rp: Cycle,
    pub t_rtp: Cycle,
    pub t_rrd_sg: Cycle,
    pub t_rrd_dg: Cycle,
    pub t_faw: Cycle,
    pub t_rdrd_sg: Cycle,
    pub t_rdrd_dg: Cycle,
}

impl TryFrom<&TimingParams> for Spacing {
    type Error = ConfigError;

    fn try_from(params: &TimingParams) -> Result<Self> {
        params.validate()?;
        let c = |v: i64| v.unsigned_abs();
        Ok(Spacing {
            t_rcd: c(params.t_rcd),
            t_ras: c(params.t_ras),
            t_rp: c(params.t_rp),
            t_rtp: c(params.t_rtp),
            t_rrd_sg: c(params.t_rrd_sg),
            t_rrd_dg: c(params.t_rrd_dg),
            t_faw: c(params.t_faw),
            t_rdrd_sg: c(params.t_rdrd_sg),
            t_rdrd_dg: c(params.t_rdrd_dg),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, TimingParams};

    #[test]
    fn test_reference_values_are_valid() {
        assert!(TimingParams::default().validate().is_ok());
    }

    #[test]
    fn test_negative_parameter() {
        let params = TimingParams {
            t_rtp: -1,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ConfigError::NegativeTiming {
                name: "tRTP",
                value: -1
            })
        ));
    }

    #[test]
    fn test_inconsistent_group_pair() {
        let params = TimingParams {
            t_rdrd_sg: 3,
            t_rdrd_dg: 4,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ConfigError::InconsistentGroupTiming {
                same: "tRDRD_sg",
                ..
            })
        ));
    }

    #[test]
    fn test_partial_json_uses_reference_values() {
        let params: TimingParams =
            serde_json::from_str(r#"{"t_faw": 20, "t_rrd_sg": 6}"#).expect("failed to parse");
        assert_eq!(params.t_faw, 20);
        assert_eq!(params.t_rrd_sg, 6);
        assert_eq!(params.t_rcd, 14);
    }

    #[test]
    fn test_load_reference_file() {
        let params = TimingParams::from_jsonfile("../../config/ddr4-reference.json")
            .expect("failed to read config file");
        assert_eq!(params, TimingParams::default());
    }
}
