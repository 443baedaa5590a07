use std::path::Path;

use config_file::FromConfigFile;
use serde::Deserialize;

use crate::demand::Truncation;
use crate::error::{MdpError, Result};
use crate::inventory::InventorySystem;
use crate::solver::ValueIterationOptions;

fn default_horizon() -> u32 {
    5
}

/// Problem and solver settings read from a TOML configuration file.
#[derive(Deserialize, Debug, Clone)]
pub struct InventoryConfig {
    /// Largest stock level; defaults to the demand rate rounded down
    #[serde(default)]
    pub capacity: Option<u32>,
    pub holding_cost: f64,
    pub penalty_cost: f64,
    pub order_cost: f64,
    /// Poisson rate of demand per period
    pub demand_rate: f64,
    #[serde(default)]
    pub truncation: Truncation,
    /// Periods solved by backward induction
    #[serde(default = "default_horizon")]
    pub horizon: u32,
    #[serde(default)]
    pub value_iteration: ValueIterationOptions,
}

impl InventoryConfig {
    pub fn load(path: &Path) -> Result<InventoryConfig> {
        InventoryConfig::from_config_file(path)
            .map_err(|e| MdpError::Config(format!("{}: {e}", path.display())))
    }

    pub fn capacity(&self) -> u32 {
        self.capacity.unwrap_or(self.demand_rate.max(0.0) as u32)
    }

    pub fn build_system(&self) -> Result<InventorySystem> {
        InventorySystem::with_capacity(
            self.capacity(),
            self.holding_cost, self.penalty_cost, self.order_cost,
            self.demand_rate, self.truncation,
        )
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn write_config(name: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir()
            .join(format!("rustinv-{}-{name}.toml", std::process::id()));
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn load_minimal_config() {
        // Arrange
        let path = write_config("minimal", r#"
            holding_cost = 1.0
            penalty_cost = 2.0
            order_cost = 1.0
            demand_rate = 10.0
        "#);
        // Act
        let config = InventoryConfig::load(&path).unwrap();
        let system = config.build_system().unwrap();
        fs::remove_file(&path).unwrap();
        // Assert
        assert_eq!(config.capacity(), 10);
        assert_eq!(config.horizon, 5);
        assert_eq!(config.truncation, Truncation::default());
        assert_eq!(config.value_iteration, ValueIterationOptions::default());
        assert_eq!(system.capacity, 10);
        assert_eq!(system.demand.max_demand, 20);
    }

    #[test]
    fn load_full_config() {
        // Arrange
        let path = write_config("full", r#"
            capacity = 6
            holding_cost = 0.5
            penalty_cost = 4.0
            order_cost = 1.0
            demand_rate = 3.0
            horizon = 8

            [truncation]
            kind = "upper_bound"
            max_demand = 9

            [value_iteration]
            discount = 0.95
            max_iterations = 400
        "#);
        // Act
        let config = InventoryConfig::load(&path).unwrap();
        fs::remove_file(&path).unwrap();
        // Assert
        assert_eq!(config.capacity(), 6);
        assert_eq!(config.horizon, 8);
        assert_eq!(config.truncation, Truncation::UpperBound { max_demand: 9 });
        assert_eq!(config.value_iteration.discount, 0.95);
        assert_eq!(config.value_iteration.max_iterations, 400);
        assert_eq!(config.value_iteration.epsilon, 0.1);
    }

    #[test]
    fn missing_file_is_config_error() {
        let result = InventoryConfig::load(Path::new("/nonexistent/rustinv.toml"));
        assert!(matches!(result, Err(MdpError::Config(_))));
    }

    #[test]
    fn invalid_rate_rejected_on_build() {
        // Arrange
        let path = write_config("bad-rate", r#"
            holding_cost = 1.0
            penalty_cost = 2.0
            order_cost = 1.0
            demand_rate = -4.0
        "#);
        // Act
        let config = InventoryConfig::load(&path).unwrap();
        fs::remove_file(&path).unwrap();
        // Assert
        assert!(matches!(config.build_system(), Err(MdpError::InvalidParameter(_))));
    }
}
