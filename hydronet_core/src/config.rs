//! Simulation configuration and construction-time validation.
//!
//! Invalid configuration is a caller contract violation: it is rejected here
//! with a [`ConfigError`], never discovered mid-simulation. Under a valid
//! configuration the engine has no error paths; edge cases degrade via
//! clamping or empty results.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a configuration fails validation.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("field dimensions must be positive (got {width} x {height})")]
    NonPositiveField { width: f64, height: f64 },

    #[error("sensor count must be at least 1")]
    NoSensors,

    #[error("initial energy must be non-negative (got {0})")]
    NegativeEnergy(f64),

    #[error("cluster count must be at least 1")]
    NoClusters,

    #[error("reclustering interval must be at least 1")]
    ZeroInterval,

    #[error("round budget must be at least 1")]
    NoRounds,

    #[error("energy coefficient '{name}' must be non-negative (got {value})")]
    NegativeCoefficient { name: &'static str, value: f64 },

    #[error("range for {variable} is empty or inverted ({min}..{max})")]
    InvalidRange {
        variable: &'static str,
        min: f64,
        max: f64,
    },

    #[error("information threshold must lie in [0, 1] (got {0})")]
    InvalidThreshold(f64),

    #[error("entropy knob '{0}' must be at least {1}")]
    EntropyKnobTooSmall(&'static str, usize),
}

/// Inclusive value range for one environmental variable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VariableRange {
    pub min: f64,
    pub max: f64,
}

impl VariableRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Width of the range.
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Clamps a value into the range.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    fn validate(&self, variable: &'static str) -> Result<(), ConfigError> {
        if !(self.min < self.max) || !self.min.is_finite() || !self.max.is_finite() {
            return Err(ConfigError::InvalidRange {
                variable,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Per-round energy cost coefficients.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EnergyConfig {
    /// Base cost an active member pays to transmit to its head.
    pub transmit: f64,

    /// Cost a head pays per active non-head member it receives from.
    pub receive: f64,

    /// Distance attenuation: multiplied by squared member-to-head distance.
    pub amplifier: f64,

    /// Fixed cost a head pays to uplink aggregated data.
    pub uplink: f64,

    /// Idle drain every alive, awake sensor pays once per round.
    pub idle: f64,

    /// Drain a sleeping sensor pays instead of transmitting.
    pub sleep_drain: f64,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            transmit: 0.4,
            receive: 0.2,
            amplifier: 0.0004,
            uplink: 1.5,
            idle: 0.05,
            sleep_drain: 0.002,
        }
    }
}

impl EnergyConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let coefficients = [
            ("transmit", self.transmit),
            ("receive", self.receive),
            ("amplifier", self.amplifier),
            ("uplink", self.uplink),
            ("idle", self.idle),
            ("sleep_drain", self.sleep_drain),
        ];
        for (name, value) in coefficients {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(ConfigError::NegativeCoefficient { name, value });
            }
        }
        Ok(())
    }
}

/// Configured [min, max] per environmental variable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VariableRanges {
    pub temperature: VariableRange,
    pub salinity: VariableRange,
    pub pressure: VariableRange,
    pub ph: VariableRange,
}

impl Default for VariableRanges {
    fn default() -> Self {
        Self {
            temperature: VariableRange::new(4.0, 30.0),
            salinity: VariableRange::new(30.0, 40.0),
            pressure: VariableRange::new(100.0, 300.0),
            ph: VariableRange::new(7.4, 8.4),
        }
    }
}

/// Knobs for the entropy-gated sleep scheduling strategy.
///
/// `neighbor_count` doubles as the estimator's reconstruction neighborhood.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EntropyConfig {
    /// Sensors scoring at or above this stay active; below it they sleep.
    pub information_threshold: f64,

    /// Spatial neighbors considered per sensor.
    pub neighbor_count: usize,

    /// Discretization bins per environmental variable.
    pub bins: usize,

    /// Bounded length of each sensor's reading history window.
    pub history_window: usize,
}

impl Default for EntropyConfig {
    fn default() -> Self {
        Self {
            information_threshold: 0.55,
            neighbor_count: 5,
            bins: 8,
            history_window: 20,
        }
    }
}

impl EntropyConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.information_threshold) {
            return Err(ConfigError::InvalidThreshold(self.information_threshold));
        }
        if self.neighbor_count < 1 {
            return Err(ConfigError::EntropyKnobTooSmall("neighbor_count", 1));
        }
        if self.bins < 2 {
            return Err(ConfigError::EntropyKnobTooSmall("bins", 2));
        }
        if self.history_window < 3 {
            return Err(ConfigError::EntropyKnobTooSmall("history_window", 3));
        }
        Ok(())
    }
}

/// Configuration for a full simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Field width in meters.
    pub field_width: f64,

    /// Field height (depth axis) in meters.
    pub field_height: f64,

    /// Number of sensors to place.
    pub sensor_count: usize,

    /// Energy each sensor starts with.
    pub initial_energy: f64,

    /// Round budget; the loop stops here even if sensors survive.
    pub max_rounds: usize,

    /// Desired number of clusters (clamped to alive count per round).
    pub cluster_count: usize,

    /// Rounds between topology recomputations.
    pub recluster_interval: usize,

    /// Energy cost coefficients.
    pub energy: EnergyConfig,

    /// Environmental variable ranges.
    pub ranges: VariableRanges,

    /// Entropy-gated strategy knobs.
    pub entropy: EntropyConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            field_width: 500.0,
            field_height: 500.0,
            sensor_count: 60,
            initial_energy: 100.0,
            max_rounds: 400,
            cluster_count: 6,
            recluster_interval: 5,
            energy: EnergyConfig::default(),
            ranges: VariableRanges::default(),
            entropy: EntropyConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Checks the caller contract; see [`ConfigError`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.field_width > 0.0) || !(self.field_height > 0.0) {
            return Err(ConfigError::NonPositiveField {
                width: self.field_width,
                height: self.field_height,
            });
        }
        if self.sensor_count == 0 {
            return Err(ConfigError::NoSensors);
        }
        if !(self.initial_energy >= 0.0) {
            return Err(ConfigError::NegativeEnergy(self.initial_energy));
        }
        if self.cluster_count == 0 {
            return Err(ConfigError::NoClusters);
        }
        if self.recluster_interval == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.max_rounds == 0 {
            return Err(ConfigError::NoRounds);
        }
        self.energy.validate()?;
        self.ranges.temperature.validate("temperature")?;
        self.ranges.salinity.validate("salinity")?;
        self.ranges.pressure.validate("pressure")?;
        self.ranges.ph.validate("ph")?;
        self.entropy.validate()?;
        Ok(())
    }
}
