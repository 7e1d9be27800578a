use crate::core::vehicle::Vehicle;
use std::collections::VecDeque;

/// Bounded FIFO of vehicles waiting at a booth
///
/// Pushing into a full queue hands the vehicle back instead of blocking.
#[derive(Debug, Clone)]
pub struct VehicleQueue {
    items: VecDeque<Vehicle>,
    capacity: usize,
}

impl VehicleQueue {
    /// Create a new queue with specified capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Check if the queue is full
    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get available space in the queue
    pub fn available_space(&self) -> usize {
        self.capacity.saturating_sub(self.items.len())
    }

    /// Append a vehicle, or return it when the queue is at capacity
    pub fn try_push(&mut self, vehicle: Vehicle) -> Result<(), Vehicle> {
        if self.is_full() {
            return Err(vehicle);
        }
        self.items.push_back(vehicle);
        Ok(())
    }

    /// Remove the vehicle admitted earliest
    pub fn pop(&mut self) -> Option<Vehicle> {
        self.items.pop_front()
    }

    /// Empty the queue, returning what was left in admission order
    pub fn drain_all(&mut self) -> Vec<Vehicle> {
        self.items.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vehicle::VehicleClass;

    fn vehicle(plate: &str) -> Vehicle {
        Vehicle::parse(plate, VehicleClass::Car).unwrap()
    }

    #[test]
    fn test_capacity_is_enforced() {
        let mut queue = VehicleQueue::new(2);
        assert!(queue.try_push(vehicle("AA 0001")).is_ok());
        assert!(queue.try_push(vehicle("AA 0002")).is_ok());
        assert!(queue.is_full());
        assert_eq!(queue.available_space(), 0);

        let rejected = queue.try_push(vehicle("AA 0003")).unwrap_err();
        assert_eq!(rejected.plate().as_str(), "AA 0003");
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = VehicleQueue::new(3);
        for plate in ["AA 0001", "AA 0002", "AA 0003"] {
            queue.try_push(vehicle(plate)).unwrap();
        }
        assert_eq!(queue.pop().unwrap().plate().as_str(), "AA 0001");

        let rest: Vec<String> = queue.drain_all().iter().map(|v| v.plate().to_string()).collect();
        assert_eq!(rest, vec!["AA 0002", "AA 0003"]);
        assert!(queue.is_empty());
        assert_eq!(queue.capacity(), 3);
    }
}
