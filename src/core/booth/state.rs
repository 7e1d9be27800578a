use crate::core::types::BoothId;
use crate::core::vehicle::Vehicle;
use std::time::Duration;

/// Whether the booth worker is processing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    Stopped,
    Running,
    Paused,
}

/// Whether the booth accepts new vehicles. Independent of [`RunState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueState {
    Open,
    Closed,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Stopped => f.write_str("stopped"),
            RunState::Running => f.write_str("running"),
            RunState::Paused => f.write_str("paused"),
        }
    }
}

impl std::fmt::Display for QueueState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueState::Open => f.write_str("open"),
            QueueState::Closed => f.write_str("closed"),
        }
    }
}

/// Point-in-time view of a booth, for monitoring
#[derive(Debug, Clone, PartialEq)]
pub struct BoothStatus {
    pub id: BoothId,
    pub run_state: RunState,
    pub queue_state: QueueState,
    pub queue_len: usize,
    pub capacity: usize,
    /// Vehicle currently in service, if any
    pub current: Option<Vehicle>,
    pub processed: u64,
    pub worker_alive: bool,
}

impl BoothStatus {
    pub fn is_busy(&self) -> bool {
        self.current.is_some()
    }

    /// The booth should have a worker but the thread is gone
    pub fn is_halted(&self) -> bool {
        self.run_state != RunState::Stopped && !self.worker_alive
    }
}

/// Outcome of stopping a booth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StopReport {
    /// False when the booth was already stopped and nothing happened
    pub was_running: bool,
    /// True when the queue emptied before the drain timeout
    pub drained: bool,
    /// Vehicles still queued at shutdown, dropped unprocessed
    pub discarded: usize,
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_halted_status() {
        let mut status = BoothStatus {
            id: BoothId::new("P1-B0"),
            run_state: RunState::Running,
            queue_state: QueueState::Open,
            queue_len: 0,
            capacity: 10,
            current: None,
            processed: 0,
            worker_alive: false,
        };
        assert!(status.is_halted());
        assert!(!status.is_busy());

        status.run_state = RunState::Stopped;
        assert!(!status.is_halted());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(RunState::Paused.to_string(), "paused");
        assert_eq!(QueueState::Closed.to_string(), "closed");
    }
}
