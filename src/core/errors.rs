use super::types::{BoothId, PlazaId};

/// Errors raised while building vehicle identities
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VehicleError {
    /// The plate does not match the configured plate format
    #[error("Invalid plate number '{plate}' (expected pattern {pattern})")]
    InvalidPlate { plate: String, pattern: String },

    /// The plate format itself is not a valid regular expression
    #[error("Invalid plate pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Reasons a booth refuses a vehicle
///
/// `QueueClosed` and `QueueFull` are ordinary outcomes of load; `NotStarted`
/// means the caller admitted into a booth that has no worker.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdmitError {
    #[error("Booth {0} queue is closed")]
    QueueClosed(BoothId),

    #[error("Booth {0} queue is full")]
    QueueFull(BoothId),

    #[error("Booth {0} has not been started")]
    NotStarted(BoothId),
}

impl AdmitError {
    /// The booth that refused the vehicle
    pub fn booth_id(&self) -> &BoothId {
        match self {
            AdmitError::QueueClosed(id) | AdmitError::QueueFull(id) | AdmitError::NotStarted(id) => id,
        }
    }
}

/// Errors raised while routing a vehicle to a booth
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoutingError {
    /// No booth of the plaza has an open queue
    #[error("No available booths in toll plaza {0}")]
    NoAvailableBooths(PlazaId),

    /// The controller owns no plaza to route to
    #[error("No toll plazas available")]
    NoPlazas,

    /// The selected booth refused the vehicle; it is dropped, not retried
    #[error(transparent)]
    Rejected(#[from] AdmitError),
}

/// Errors raised by controller bookkeeping
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControllerError {
    #[error("Toll plaza {0} already exists")]
    DuplicatePlaza(PlazaId),

    #[error("Toll plaza {0} does not exist")]
    UnknownPlaza(PlazaId),
}

/// Errors an event sink may report back to the booth worker
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    /// The receiving side of the sink has gone away
    #[error("Event sink disconnected")]
    Disconnected,

    #[error("Event transport failed: {0}")]
    Transport(String),
}

/// Errors raised while reading configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
}
