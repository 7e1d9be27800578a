pub mod core;

// Re-export commonly used types
pub use crate::core::booth::{Booth, BoothStatus, QueueState, RunState, StopReport};
pub use crate::core::controller::{Assignment, Controller, PlazaReport};
pub use crate::core::errors::{AdmitError, ConfigError, ControllerError, RoutingError, SinkError, VehicleError};
pub use crate::core::event::{BoothEvent, BoothEventKind};
pub use crate::core::execution::{BoothConfig, ConcurrencyMode, SimulationConfig};
pub use crate::core::plaza::{Plaza, PlazaState};
pub use crate::core::routing::{BoothSelector, PlazaSelector, RandomBooth, RandomPlaza, ShortestQueue};
pub use crate::core::sink::{ChannelSink, EventSink, LogSink, MemorySink};
pub use crate::core::types::{BoothId, PlazaId};
pub use crate::core::vehicle::{PlateFormat, PlateNumber, Vehicle, VehicleClass};
pub use crate::core::generator::{ArrivalPattern, GeneratorReport, RandomVehicleSource, TrafficGenerator, VehicleSource};
