//! Sensors and the sensor field layout.
//!
//! A [`SensorField`] owns the sensors of one strategy run. The orchestrator
//! keeps a pristine original copy for seeding and read-only queries; each
//! strategy works on its own deep copy (`Clone`), so strategies never
//! interfere.

use nalgebra::Point2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::SimulationConfig;

/// Unique sensor identifier, dense starting at 0.
pub type SensorId = u64;

/// A single sensor node.
///
/// Position is fixed for the sensor's lifetime. Energy is non-negative and
/// monotonically non-increasing; once it reaches 0 the sensor is logically
/// destroyed but stays in the field for bookkeeping. The sleep flag is only
/// meaningful while energy > 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sensor {
    pub id: SensorId,
    pub position: Point2<f64>,
    pub energy: f64,
    pub asleep: bool,
}

impl Sensor {
    pub fn new(id: SensorId, position: Point2<f64>, energy: f64) -> Self {
        Self {
            id,
            position,
            energy,
            asleep: false,
        }
    }

    /// True while the sensor has any energy left.
    pub fn is_alive(&self) -> bool {
        self.energy > 0.0
    }

    /// Alive and not sleeping: the sensor senses and transmits this round.
    pub fn is_active(&self) -> bool {
        self.is_alive() && !self.asleep
    }

    /// Debits `cost`, clamping at the 0 floor. Energy never goes negative
    /// and never recovers.
    pub fn drain(&mut self, cost: f64) {
        self.energy = (self.energy - cost).max(0.0);
    }
}

/// The full set of sensors for one run, with an id -> index map built once
/// so per-round lookups stay O(1) as sensor counts grow. Serializes as the
/// bare sensor list; the index is rebuilt on deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "Vec<Sensor>", into = "Vec<Sensor>")]
pub struct SensorField {
    sensors: Vec<Sensor>,
    index: HashMap<SensorId, usize>,
}

impl From<Vec<Sensor>> for SensorField {
    fn from(sensors: Vec<Sensor>) -> Self {
        Self::from_sensors(sensors)
    }
}

impl From<SensorField> for Vec<Sensor> {
    fn from(field: SensorField) -> Self {
        field.sensors
    }
}

impl SensorField {
    /// Places `config.sensor_count` sensors uniformly at random over the
    /// field, all at full energy. The seed is the one source of
    /// non-determinism in a run; everything downstream is deterministic
    /// given the layout and configuration.
    pub fn generate(config: &SimulationConfig, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let sensors = (0..config.sensor_count)
            .map(|i| {
                let position = Point2::new(
                    rng.gen_range(0.0..config.field_width),
                    rng.gen_range(0.0..config.field_height),
                );
                Sensor::new(i as SensorId, position, config.initial_energy)
            })
            .collect();
        Self::from_sensors(sensors)
    }

    /// Builds a field from explicit sensors (used by tests and replays).
    pub fn from_sensors(sensors: Vec<Sensor>) -> Self {
        let index = sensors
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id, i))
            .collect();
        Self { sensors, index }
    }

    pub fn sensors(&self) -> &[Sensor] {
        &self.sensors
    }

    pub fn sensors_mut(&mut self) -> &mut [Sensor] {
        &mut self.sensors
    }

    pub fn get(&self, id: SensorId) -> Option<&Sensor> {
        self.index.get(&id).map(|&i| &self.sensors[i])
    }

    pub fn get_mut(&mut self, id: SensorId) -> Option<&mut Sensor> {
        let i = *self.index.get(&id)?;
        Some(&mut self.sensors[i])
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    /// Number of sensors with positive energy.
    pub fn alive_count(&self) -> usize {
        self.sensors.iter().filter(|s| s.is_alive()).count()
    }

    /// Iterator over alive sensors.
    pub fn alive(&self) -> impl Iterator<Item = &Sensor> {
        self.sensors.iter().filter(|s| s.is_alive())
    }

    /// Ids of alive sensors currently asleep, in id order.
    pub fn sleeping_ids(&self) -> Vec<SensorId> {
        self.sensors
            .iter()
            .filter(|s| s.is_alive() && s.asleep)
            .map(|s| s.id)
            .collect()
    }
}
