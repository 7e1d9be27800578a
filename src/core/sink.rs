//! Destinations for booth lifecycle events.
//!
//! A booth hands every event to an [`EventSink`]. Sinks report transport
//! problems through [`SinkError`]; the booth logs them and carries on.

use super::errors::SinkError;
use super::event::BoothEvent;
use log::info;
use std::sync::mpsc::Sender;
use std::sync::{Mutex, PoisonError};

/// Receiver of booth lifecycle events
pub trait EventSink: Send + Sync {
    fn send(&self, event: &BoothEvent) -> Result<(), SinkError>;
}

impl<F> EventSink for F
where
    F: Fn(&BoothEvent) -> Result<(), SinkError> + Send + Sync,
{
    fn send(&self, event: &BoothEvent) -> Result<(), SinkError> {
        self(event)
    }
}

/// Writes every event to the log at `info` level
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn send(&self, event: &BoothEvent) -> Result<(), SinkError> {
        info!("[Booth {}] Publishing {} event: {}", event.booth_id, event.kind, event);
        Ok(())
    }
}

/// Forwards events over an mpsc channel to a consumer thread
#[derive(Debug)]
pub struct ChannelSink {
    sender: Mutex<Sender<BoothEvent>>,
}

impl ChannelSink {
    pub fn new(sender: Sender<BoothEvent>) -> Self {
        Self { sender: Mutex::new(sender) }
    }
}

impl EventSink for ChannelSink {
    fn send(&self, event: &BoothEvent) -> Result<(), SinkError> {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .send(event.clone())
            .map_err(|_| SinkError::Disconnected)
    }
}

/// Keeps every event in memory, in emission order
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<BoothEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all events received so far
    pub fn events(&self) -> Vec<BoothEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for MemorySink {
    fn send(&self, event: &BoothEvent) -> Result<(), SinkError> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
        Ok(())
    }
}
