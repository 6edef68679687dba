use crate::error::SimError;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Constraint-solver iteration counts handed to the engine each step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SolverConfig {
    pub velocity_iterations: usize,
    pub position_iterations: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            velocity_iterations: 8,
            position_iterations: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// World gravity vector in m/s².
    pub gravity: Vector2<f64>,
    /// Fixed increment used by `Simulation::run`.
    pub time_step: f64,
    pub solver: SolverConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            gravity: Vector2::new(0.0, -9.8),
            time_step: 1.0 / 60.0,
            solver: SolverConfig::default(),
        }
    }
}

impl SimulationConfig {
    pub fn load(path: &str) -> Result<Self, SimError> {
        let file = std::fs::File::open(path)?;
        let config = serde_yaml::from_reader(file)?;
        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<(), SimError> {
        let file = std::fs::File::create(path)?;
        serde_yaml::to_writer(file, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = SimulationConfig::default();
        assert_eq!(config.gravity, Vector2::new(0.0, -9.8));
        assert_eq!(config.time_step, 1.0 / 60.0);
        assert_eq!(config.solver.velocity_iterations, 8);
        assert_eq!(config.solver.position_iterations, 3);
    }

    #[test]
    fn test_config_save_load() -> Result<(), SimError> {
        let mut config = SimulationConfig::default();
        config.gravity = Vector2::new(0.0, -1.62);
        config.time_step = 1.0 / 120.0;

        let temp_file = NamedTempFile::new()?;
        let path = temp_file.path().to_str().unwrap();

        config.save(path)?;
        assert!(fs::metadata(path).is_ok());

        let loaded = SimulationConfig::load(path)?;
        assert_eq!(loaded.gravity, config.gravity);
        assert_eq!(loaded.time_step, config.time_step);
        assert_eq!(
            loaded.solver.velocity_iterations,
            config.solver.velocity_iterations
        );

        Ok(())
    }

    #[test]
    fn test_invalid_config_load() {
        let result = SimulationConfig::load("nonexistent_file.yaml");
        assert!(result.is_err());
    }
}
