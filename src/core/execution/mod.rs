pub mod config;

// Re-export commonly used types
pub use config::{BoothConfig, ConcurrencyMode, SimulationConfig};
