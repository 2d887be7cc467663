//! Simulation parameters sent to the engine with `init` (EngineConfigV1).
//!
//! Field names on the wire are camelCase to match what the engine sidecars
//! expect; the TOML `[simulation]` section uses the same names.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Complete engine configuration, one struct per wire section.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    pub simulation: RunConfig,
    pub agents: AgentsConfig,
    pub disease: DiseaseConfig,
    pub environment: EnvironmentConfig,
    pub rng: RngConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RunConfig {
    /// Planned number of steps (work units) for the run.
    pub max_steps: i64,
    pub world_size: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_steps: 10_000,
            world_size: 100.0,
        }
    }
}

/// Inclusive `min..=max` bounds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn is_valid(&self) -> bool {
        self.min <= self.max
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct AgentsConfig {
    pub initial_population: i64,
    pub movement_speed: ValueRange,
    pub energy_range: ValueRange,
    pub reproduction_enabled: bool,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            initial_population: 100,
            movement_speed: ValueRange::new(0.5, 2.0),
            energy_range: ValueRange::new(50.0, 100.0),
            reproduction_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct DiseaseConfig {
    pub enabled: bool,
    pub transmission_rate: f64,
    pub recovery_rate: f64,
    pub mortality_rate: f64,
}

impl Default for DiseaseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            transmission_rate: 0.3,
            recovery_rate: 0.1,
            mortality_rate: 0.05,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct EnvironmentConfig {
    pub resource_regeneration: bool,
    pub resource_density: f64,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            resource_regeneration: true,
            resource_density: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RngConfig {
    pub seed: i64,
    pub independent_streams: bool,
}

impl Default for RngConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            independent_streams: true,
        }
    }
}

fn is_rate(v: f64) -> bool {
    (0.0..=1.0).contains(&v)
}

impl SimulationConfig {
    /// Convenience constructor for the two values every run must set.
    pub fn with_population(population: i64, max_steps: i64) -> Self {
        let mut cfg = Self::default();
        cfg.agents.initial_population = population;
        cfg.simulation.max_steps = max_steps;
        cfg
    }

    /// Serialize to the JSON object the engine expects under `init.data.config`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    /// Full semantic validation of every section.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.simulation.max_steps <= 0 {
            errors.push(ConfigError::error(
                "simulation.simulation.maxSteps",
                "max steps must be positive",
            ));
        }
        if self.simulation.world_size <= 0.0 {
            errors.push(ConfigError::error(
                "simulation.simulation.worldSize",
                "world size must be positive",
            ));
        }

        if self.agents.initial_population <= 0 {
            errors.push(ConfigError::error(
                "simulation.agents.initialPopulation",
                "initial population must be positive",
            ));
        }
        if !self.agents.movement_speed.is_valid() {
            errors.push(ConfigError::error(
                "simulation.agents.movementSpeed",
                "min must be <= max",
            ));
        }
        if self.agents.movement_speed.min <= 0.0 {
            errors.push(ConfigError::error(
                "simulation.agents.movementSpeed.min",
                "movement speed min must be positive",
            ));
        }
        if !self.agents.energy_range.is_valid() {
            errors.push(ConfigError::error(
                "simulation.agents.energyRange",
                "min must be <= max",
            ));
        }
        if self.agents.energy_range.min <= 0.0 {
            errors.push(ConfigError::error(
                "simulation.agents.energyRange.min",
                "energy range min must be positive",
            ));
        }

        // Rates only matter when the disease model runs.
        if self.disease.enabled {
            let rates = [
                ("transmissionRate", self.disease.transmission_rate),
                ("recoveryRate", self.disease.recovery_rate),
                ("mortalityRate", self.disease.mortality_rate),
            ];
            for (name, value) in rates {
                if !is_rate(value) {
                    errors.push(ConfigError::error(
                        format!("simulation.disease.{name}"),
                        "rate must be between 0 and 1",
                    ));
                }
            }
        }

        if self.environment.resource_density <= 0.0 {
            errors.push(ConfigError::error(
                "simulation.environment.resourceDensity",
                "resource density must be positive",
            ));
        }

        errors
    }
}
