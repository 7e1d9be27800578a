use super::types::BoothId;
use super::vehicle::{PlateNumber, Vehicle, VehicleClass};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Step of a vehicle's passage through a booth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BoothEventKind {
    Enter,
    Pay,
    Exit,
}

impl BoothEventKind {
    /// Emission order for every processed vehicle
    pub const LIFECYCLE: [BoothEventKind; 3] = [BoothEventKind::Enter, BoothEventKind::Pay, BoothEventKind::Exit];
}

impl std::fmt::Display for BoothEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoothEventKind::Enter => f.write_str("enter"),
            BoothEventKind::Pay => f.write_str("pay"),
            BoothEventKind::Exit => f.write_str("exit"),
        }
    }
}

/// Lifecycle event emitted while a booth serves a vehicle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoothEvent {
    pub id: Uuid,
    pub booth_id: BoothId,
    pub plate: PlateNumber,
    pub vehicle_class: VehicleClass,
    pub kind: BoothEventKind,
    pub timestamp: DateTime<Utc>,
}

impl BoothEvent {
    /// Build an event for `vehicle` stamped with the current time
    pub fn new(booth_id: BoothId, vehicle: &Vehicle, kind: BoothEventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            booth_id,
            plate: vehicle.plate().clone(),
            vehicle_class: vehicle.class(),
            kind,
            timestamp: Utc::now(),
        }
    }
}

impl std::fmt::Display for BoothEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} booth={} plate={} class={} at {}",
            self.kind,
            self.booth_id,
            self.plate,
            self.vehicle_class,
            self.timestamp.to_rfc3339()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_carries_vehicle_fields() {
        let vehicle = Vehicle::parse("AB 1000", VehicleClass::Van).unwrap();
        let event = BoothEvent::new(BoothId::new("P1-B0"), &vehicle, BoothEventKind::Pay);

        assert_eq!(event.plate.as_str(), "AB 1000");
        assert_eq!(event.vehicle_class, VehicleClass::Van);
        assert_eq!(event.kind, BoothEventKind::Pay);
        assert!(event.to_string().starts_with("pay booth=P1-B0 plate=AB 1000 class=van"));
    }

    #[test]
    fn test_event_serializes_logical_fields() {
        let vehicle = Vehicle::parse("AA 1234", VehicleClass::Car).unwrap();
        let event = BoothEvent::new(BoothId::new("P1-B0"), &vehicle, BoothEventKind::Enter);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["booth_id"], "P1-B0");
        assert_eq!(json["plate"], "AA 1234");
        assert_eq!(json["vehicle_class"], "car");
        assert_eq!(json["kind"], "enter");
        let timestamp = json["timestamp"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(timestamp).is_ok());
    }

    #[test]
    fn test_event_ids_are_unique() {
        let vehicle = Vehicle::parse("AA 1234", VehicleClass::Car).unwrap();
        let a = BoothEvent::new(BoothId::new("b"), &vehicle, BoothEventKind::Enter);
        let b = BoothEvent::new(BoothId::new("b"), &vehicle, BoothEventKind::Enter);
        assert_ne!(a.id, b.id);
    }
}
