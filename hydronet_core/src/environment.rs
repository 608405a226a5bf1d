//! Synthetic environment field generator.
//!
//! Produces deterministic ground-truth readings (temperature, salinity,
//! pressure, pH) as a function of position and round. A coarse spatial grid
//! of base values is combined with a temporal tidal/seasonal term and
//! multi-octave oscillator noise; everything is a pure function of
//! (x, y, round) given the construction seed. Only [`EnvironmentField::drift`]
//! consumes the internal RNG, modeling slow environmental change between
//! clustering epochs.

use nalgebra::Point2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use crate::config::{SimulationConfig, VariableRange, VariableRanges};

/// Grid resolution per axis for the coarse base field.
const GRID_SIZE: usize = 20;

/// Fraction of grid cells nudged per drift call.
const DRIFT_FRACTION: f64 = 0.05;

/// Blend factor toward the fresh base value during drift.
const DRIFT_BLEND: f64 = 0.35;

/// Rounds per fast "tidal" oscillation.
const TIDAL_PERIOD: f64 = 12.0;

/// Rounds per slow "seasonal" oscillation.
const SEASONAL_PERIOD: f64 = 180.0;

/// Temporal term amplitude as a fraction of each variable's range.
const TEMPORAL_SCALE: f64 = 0.05;

/// Noise amplitude as a fraction of each variable's range.
const NOISE_SCALE: f64 = 0.02;

/// The four environmental variables a sensor samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Variable {
    Temperature,
    Salinity,
    Pressure,
    Ph,
}

impl Variable {
    pub const ALL: [Variable; 4] = [
        Variable::Temperature,
        Variable::Salinity,
        Variable::Pressure,
        Variable::Ph,
    ];

    fn index(self) -> usize {
        match self {
            Variable::Temperature => 0,
            Variable::Salinity => 1,
            Variable::Pressure => 2,
            Variable::Ph => 3,
        }
    }

    /// How strongly the variable trends with normalized depth (y axis).
    fn depth_gain(self) -> f64 {
        match self {
            Variable::Temperature => -0.25,
            Variable::Salinity => 0.10,
            Variable::Pressure => 0.45,
            Variable::Ph => -0.05,
        }
    }
}

/// One per-sensor environmental sample, clamped to the configured ranges.
/// Produced fresh every round; never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub temperature: f64,
    pub salinity: f64,
    pub pressure: f64,
    pub ph: f64,
}

impl Reading {
    pub fn get(&self, variable: Variable) -> f64 {
        match variable {
            Variable::Temperature => self.temperature,
            Variable::Salinity => self.salinity,
            Variable::Pressure => self.pressure,
            Variable::Ph => self.ph,
        }
    }

    pub fn set(&mut self, variable: Variable, value: f64) {
        match variable {
            Variable::Temperature => self.temperature = value,
            Variable::Salinity => self.salinity = value,
            Variable::Pressure => self.pressure = value,
            Variable::Ph => self.ph = value,
        }
    }

    pub fn zero() -> Self {
        Self {
            temperature: 0.0,
            salinity: 0.0,
            pressure: 0.0,
            ph: 0.0,
        }
    }

    /// Mean absolute error across the four variables.
    pub fn mean_abs_error(&self, other: &Reading) -> f64 {
        Variable::ALL
            .iter()
            .map(|&v| (self.get(v) - other.get(v)).abs())
            .sum::<f64>()
            / Variable::ALL.len() as f64
    }
}

/// Smooth spatial shape parameters for one variable's base field.
#[derive(Debug, Clone, Copy)]
struct VariableProfile {
    freq_x: f64,
    freq_y: f64,
    phase_x: f64,
    phase_y: f64,
}

/// One oscillator-noise generator: a product of sinusoids in x, y, and round.
#[derive(Debug, Clone, Copy)]
struct NoiseOctave {
    frequency: f64,
    amplitude: f64,
    phase: f64,
}

/// Deterministic-ish synthetic environment over a rectangular field.
pub struct EnvironmentField {
    width: f64,
    height: f64,
    ranges: VariableRanges,
    profiles: [VariableProfile; 4],
    octaves: [NoiseOctave; 3],
    /// Row-major `GRID_SIZE` x `GRID_SIZE` base readings.
    grid: Vec<Reading>,
    /// Consumed only by `drift`.
    rng: ChaCha8Rng,
}

impl EnvironmentField {
    pub fn new(config: &SimulationConfig, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let profiles = std::array::from_fn(|_| VariableProfile {
            freq_x: rng.gen_range(1.0..2.5),
            freq_y: rng.gen_range(1.0..2.5),
            phase_x: rng.gen_range(0.0..1.0),
            phase_y: rng.gen_range(0.0..1.0),
        });

        let base_frequencies = [0.045, 0.11, 0.27];
        let base_amplitudes = [1.0, 0.55, 0.3];
        let octaves = std::array::from_fn(|i| NoiseOctave {
            frequency: base_frequencies[i],
            amplitude: base_amplitudes[i],
            phase: rng.gen_range(0.0..TAU),
        });

        let mut field = Self {
            width: config.field_width,
            height: config.field_height,
            ranges: config.ranges,
            profiles,
            octaves,
            grid: Vec::new(),
            rng,
        };

        field.grid = (0..GRID_SIZE * GRID_SIZE)
            .map(|cell| {
                let (nx, ny) = Self::cell_center(cell);
                field.fresh_base(nx, ny, 0.0)
            })
            .collect();

        field
    }

    /// Normalized center coordinates of a grid cell.
    fn cell_center(cell: usize) -> (f64, f64) {
        let i = cell % GRID_SIZE;
        let j = cell / GRID_SIZE;
        (
            (i as f64 + 0.5) / GRID_SIZE as f64,
            (j as f64 + 0.5) / GRID_SIZE as f64,
        )
    }

    /// Grid cell containing a position (nearest-cell, not bilinear).
    fn cell_index(&self, position: &Point2<f64>) -> usize {
        let i = ((position.x / self.width) * GRID_SIZE as f64) as usize;
        let j = ((position.y / self.height) * GRID_SIZE as f64) as usize;
        let i = i.min(GRID_SIZE - 1);
        let j = j.min(GRID_SIZE - 1);
        j * GRID_SIZE + i
    }

    fn range(&self, variable: Variable) -> VariableRange {
        match variable {
            Variable::Temperature => self.ranges.temperature,
            Variable::Salinity => self.ranges.salinity,
            Variable::Pressure => self.ranges.pressure,
            Variable::Ph => self.ranges.ph,
        }
    }

    /// Base value for one cell: sinusoids of normalized x/y plus a depth
    /// term proportional to normalized y, scaled into the variable's range.
    /// `jitter` shifts the phases during drift regeneration.
    fn fresh_base(&self, nx: f64, ny: f64, jitter: f64) -> Reading {
        let mut reading = Reading::zero();
        for variable in Variable::ALL {
            let p = self.profiles[variable.index()];
            let range = self.range(variable);
            let norm = 0.5
                + 0.18 * (TAU * (nx * p.freq_x + p.phase_x + jitter)).sin()
                + 0.14 * (TAU * (ny * p.freq_y + p.phase_y + jitter)).cos()
                + variable.depth_gain() * (ny - 0.5);
            reading.set(variable, range.clamp(range.min + norm * range.span()));
        }
        reading
    }

    /// Fast tidal sinusoid plus slow seasonal cosine, scaled to a small
    /// fraction of the variable's range.
    fn temporal_term(&self, variable: Variable, round: usize) -> f64 {
        let t = round as f64;
        let tidal = (TAU * t / TIDAL_PERIOD).sin();
        let seasonal = (TAU * t / SEASONAL_PERIOD).cos();
        self.range(variable).span() * TEMPORAL_SCALE * (0.6 * tidal + 0.4 * seasonal)
    }

    /// Multi-octave noise: products of sinusoids in x, y, and round, summed
    /// over three frequency/amplitude combinations, scaled to an even
    /// smaller fraction of the range.
    fn noise_term(&self, variable: Variable, position: &Point2<f64>, round: usize) -> f64 {
        let t = round as f64;
        let decorrelate = variable.index() as f64 * 0.7;
        let mut sum = 0.0;
        let mut amplitude_sum = 0.0;
        for octave in &self.octaves {
            let phase = octave.phase + decorrelate;
            sum += octave.amplitude
                * (position.x * octave.frequency + phase).sin()
                * (position.y * octave.frequency * 1.31 + 2.0 * phase).sin()
                * (t * octave.frequency * 9.7 + 3.0 * phase).sin();
            amplitude_sum += octave.amplitude;
        }
        self.range(variable).span() * NOISE_SCALE * sum / amplitude_sum
    }

    /// Ground-truth reading at `position` for `round`, clamped to the
    /// configured ranges. Pure in its inputs given the construction seed.
    pub fn reading(&self, position: &Point2<f64>, round: usize) -> Reading {
        let base = self.grid[self.cell_index(position)];
        let mut reading = Reading::zero();
        for variable in Variable::ALL {
            let value = base.get(variable)
                + self.temporal_term(variable, round)
                + self.noise_term(variable, position, round);
            reading.set(variable, self.range(variable).clamp(value));
        }
        reading
    }

    /// Stochastically nudges ~5% of grid cells toward freshly generated base
    /// values (linear blend). Invoked by the orchestrator at reclustering
    /// cadence, not every round.
    pub fn drift(&mut self) {
        for cell in 0..self.grid.len() {
            if self.rng.gen::<f64>() >= DRIFT_FRACTION {
                continue;
            }
            let (nx, ny) = Self::cell_center(cell);
            let jitter = self.rng.gen_range(-0.15..0.15);
            let fresh = self.fresh_base(nx, ny, jitter);
            let old = self.grid[cell];
            let mut blended = Reading::zero();
            for variable in Variable::ALL {
                blended.set(
                    variable,
                    old.get(variable) * (1.0 - DRIFT_BLEND) + fresh.get(variable) * DRIFT_BLEND,
                );
            }
            self.grid[cell] = blended;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn config() -> SimulationConfig {
        SimulationConfig::default()
    }

    fn in_range(reading: &Reading, config: &SimulationConfig) -> bool {
        reading.temperature >= config.ranges.temperature.min
            && reading.temperature <= config.ranges.temperature.max
            && reading.salinity >= config.ranges.salinity.min
            && reading.salinity <= config.ranges.salinity.max
            && reading.pressure >= config.ranges.pressure.min
            && reading.pressure <= config.ranges.pressure.max
            && reading.ph >= config.ranges.ph.min
            && reading.ph <= config.ranges.ph.max
    }

    #[test]
    fn test_readings_stay_in_configured_ranges() {
        let config = config();
        let env = EnvironmentField::new(&config, 11);
        for round in [0, 7, 90, 500] {
            for (x, y) in [(0.0, 0.0), (499.9, 499.9), (250.0, 10.0), (12.3, 456.7)] {
                let reading = env.reading(&Point2::new(x, y), round);
                assert!(in_range(&reading, &config), "{reading:?} out of range");
            }
        }
    }

    #[test]
    fn test_same_seed_same_readings() {
        let config = config();
        let a = EnvironmentField::new(&config, 42);
        let b = EnvironmentField::new(&config, 42);
        let p = Point2::new(123.0, 77.0);
        assert_eq!(a.reading(&p, 19), b.reading(&p, 19));
    }

    #[test]
    fn test_different_seeds_differ() {
        let config = config();
        let a = EnvironmentField::new(&config, 1);
        let b = EnvironmentField::new(&config, 2);
        let p = Point2::new(123.0, 77.0);
        assert_ne!(a.reading(&p, 19), b.reading(&p, 19));
    }

    #[test]
    fn test_readings_vary_over_rounds() {
        let env = EnvironmentField::new(&config(), 5);
        let p = Point2::new(200.0, 200.0);
        let r0 = env.reading(&p, 0);
        let r3 = env.reading(&p, 3);
        assert!((r0.temperature - r3.temperature).abs() > 1e-9);
    }

    #[test]
    fn test_nearest_cell_lookup_clamps_at_boundary() {
        let env = EnvironmentField::new(&config(), 5);
        // Positions on or past the far edge still map to the last cell.
        assert_eq!(
            env.cell_index(&Point2::new(500.0, 500.0)),
            GRID_SIZE * GRID_SIZE - 1
        );
        assert_eq!(env.cell_index(&Point2::new(0.0, 0.0)), 0);
    }

    #[test]
    fn test_drift_nudges_some_cells() {
        let config = config();
        let mut env = EnvironmentField::new(&config, 9);
        let before = env.grid.clone();
        for _ in 0..4 {
            env.drift();
        }
        let changed = env
            .grid
            .iter()
            .zip(&before)
            .filter(|(a, b)| a != b)
            .count();
        assert!(changed > 0);
        // Drift only blends bases; readings must still clamp into range.
        let reading = env.reading(&Point2::new(250.0, 250.0), 40);
        assert!(in_range(&reading, &config));
    }

    #[test]
    fn test_mean_abs_error() {
        let a = Reading {
            temperature: 10.0,
            salinity: 35.0,
            pressure: 200.0,
            ph: 8.0,
        };
        let mut b = a;
        b.temperature = 14.0;
        b.ph = 7.0;
        assert_relative_eq!(a.mean_abs_error(&b), (4.0 + 1.0) / 4.0);
        assert_relative_eq!(a.mean_abs_error(&a), 0.0);
    }
}
