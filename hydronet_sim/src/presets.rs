//! Named simulation presets.

use hydronet_core::SimulationConfig;

/// Preset identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Default field: 60 sensors over 500m x 500m
    Reference,

    /// Quick sanity run: 20 sensors, small field, short budget
    Small,

    /// 150 sensors packed in the reference field
    Dense,

    /// 30 sensors spread over 800m x 800m
    Sparse,

    /// Long-budget endurance comparison
    LongHaul,
}

impl Preset {
    /// Returns a list of all presets.
    pub fn all() -> Vec<Preset> {
        vec![
            Preset::Reference,
            Preset::Small,
            Preset::Dense,
            Preset::Sparse,
            Preset::LongHaul,
        ]
    }

    /// Returns the preset name.
    pub fn name(&self) -> &'static str {
        match self {
            Preset::Reference => "reference",
            Preset::Small => "small",
            Preset::Dense => "dense",
            Preset::Sparse => "sparse",
            Preset::LongHaul => "long_haul",
        }
    }

    /// Returns a description of the preset.
    pub fn description(&self) -> &'static str {
        match self {
            Preset::Reference => "60 sensors / 500m field, reference comparison setup",
            Preset::Small => "20 sensors / 200m field, fast smoke run",
            Preset::Dense => "150 sensors / 500m field, heavy intra-cluster traffic",
            Preset::Sparse => "30 sensors / 800m field, long transmit distances",
            Preset::LongHaul => "Reference field with triple energy and a 2000-round budget",
        }
    }

    /// Builds the configuration for this preset.
    pub fn config(&self) -> SimulationConfig {
        let base = SimulationConfig::default();
        match self {
            Preset::Reference => base,
            Preset::Small => SimulationConfig {
                field_width: 200.0,
                field_height: 200.0,
                sensor_count: 20,
                cluster_count: 3,
                max_rounds: 150,
                ..base
            },
            Preset::Dense => SimulationConfig {
                sensor_count: 150,
                cluster_count: 10,
                ..base
            },
            Preset::Sparse => SimulationConfig {
                field_width: 800.0,
                field_height: 800.0,
                sensor_count: 30,
                cluster_count: 4,
                ..base
            },
            Preset::LongHaul => SimulationConfig {
                initial_energy: 300.0,
                max_rounds: 2000,
                ..base
            },
        }
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reference" | "default" => Ok(Preset::Reference),
            "small" | "smoke" => Ok(Preset::Small),
            "dense" => Ok(Preset::Dense),
            "sparse" => Ok(Preset::Sparse),
            "long_haul" | "longhaul" => Ok(Preset::LongHaul),
            _ => Err(format!("Unknown preset: {}", s)),
        }
    }
}
