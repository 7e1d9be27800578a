//! Vehicle identity: validated plate numbers and vehicle classes.

use super::errors::VehicleError;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Plate pattern used when no other format is configured: two uppercase
/// letters, a space, four digits (`AA 1234`)
pub const DEFAULT_PLATE_PATTERN: &str = r"^[A-Z]{2} \d{4}$";

/// A compiled plate-number format
#[derive(Debug, Clone)]
pub struct PlateFormat {
    regex: Regex,
}

impl PlateFormat {
    /// Compile a plate format from a regular expression
    pub fn new(pattern: &str) -> Result<Self, VehicleError> {
        let regex = Regex::new(pattern).map_err(|e| VehicleError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { regex })
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_match(&self, plate: &str) -> bool {
        self.regex.is_match(plate)
    }

    /// Shared instance of the default format
    pub fn default_format() -> &'static PlateFormat {
        static DEFAULT: OnceLock<PlateFormat> = OnceLock::new();
        DEFAULT.get_or_init(|| Self {
            regex: Regex::new(DEFAULT_PLATE_PATTERN).expect("default plate pattern compiles"),
        })
    }
}

impl Default for PlateFormat {
    fn default() -> Self {
        Self::default_format().clone()
    }
}

/// A plate number that passed validation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PlateNumber(String);

impl PlateNumber {
    /// Validate a plate against the default format
    pub fn new(plate: &str) -> Result<Self, VehicleError> {
        Self::with_format(plate, PlateFormat::default_format())
    }

    /// Validate a plate against a caller-supplied format
    pub fn with_format(plate: &str, format: &PlateFormat) -> Result<Self, VehicleError> {
        if !format.is_match(plate) {
            return Err(VehicleError::InvalidPlate {
                plate: plate.to_string(),
                pattern: format.pattern().to_string(),
            });
        }
        Ok(Self(plate.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PlateNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PlateNumber {
    type Err = VehicleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Kind of vehicle passing the toll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleClass {
    Car,
    Truck,
    Van,
}

impl VehicleClass {
    pub const ALL: [VehicleClass; 3] = [VehicleClass::Car, VehicleClass::Truck, VehicleClass::Van];

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleClass::Car => "car",
            VehicleClass::Truck => "truck",
            VehicleClass::Van => "van",
        }
    }
}

impl std::fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A vehicle entering the toll network. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vehicle {
    plate: PlateNumber,
    class: VehicleClass,
}

impl Vehicle {
    pub fn new(plate: PlateNumber, class: VehicleClass) -> Self {
        Self { plate, class }
    }

    /// Validate `plate` with the default format and build a vehicle
    pub fn parse(plate: &str, class: VehicleClass) -> Result<Self, VehicleError> {
        Ok(Self::new(PlateNumber::new(plate)?, class))
    }

    /// Validate `plate` with a configured format and build a vehicle
    pub fn parse_with(plate: &str, class: VehicleClass, format: &PlateFormat) -> Result<Self, VehicleError> {
        Ok(Self::new(PlateNumber::with_format(plate, format)?, class))
    }

    pub fn plate(&self) -> &PlateNumber {
        &self.plate
    }

    pub fn class(&self) -> VehicleClass {
        self.class
    }
}

impl std::fmt::Display for Vehicle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.plate, self.class)
    }
}
