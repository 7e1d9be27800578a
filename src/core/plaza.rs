use crate::core::booth::{Booth, BoothStatus, StopReport};
use crate::core::errors::RoutingError;
use crate::core::execution::config::{BoothConfig, ConcurrencyMode};
use crate::core::routing::{BoothSelector, RandomBooth, ShortestQueue};
use crate::core::sink::EventSink;
use crate::core::types::{BoothId, PlazaId};
use crate::core::vehicle::Vehicle;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlazaState {
    Open,
    Closed,
}

/// A named group of booths started and stopped as a unit
///
/// The plaza owns no queue of its own; every vehicle it routes is admitted
/// by one of its booths.
#[derive(Debug)]
pub struct Plaza {
    id: PlazaId,
    booths: Vec<Booth>,
    state: Mutex<PlazaState>,
    concurrency_mode: ConcurrencyMode,
    /// Serializes start/stop/restart
    lifecycle: Mutex<()>,
}

impl Plaza {
    /// Create a closed plaza owning `booths`
    pub fn new(id: PlazaId, booths: Vec<Booth>) -> Self {
        Self {
            id,
            booths,
            state: Mutex::new(PlazaState::Closed),
            concurrency_mode: ConcurrencyMode::default(),
            lifecycle: Mutex::new(()),
        }
    }

    /// Create a closed plaza with `count` identically configured booths
    /// named `P<plaza>-B<index>`, all publishing to `sink`
    pub fn with_booths(id: PlazaId, count: usize, config: &BoothConfig, sink: Arc<dyn EventSink>) -> Self {
        let booths = (0..count)
            .map(|index| Booth::new(id.booth(index), config.clone(), Arc::clone(&sink)))
            .collect();
        Self::new(id, booths)
    }

    /// Set how start/stop cascade to the booths
    pub fn with_concurrency(mut self, mode: ConcurrencyMode) -> Self {
        self.concurrency_mode = mode;
        self
    }

    pub fn id(&self) -> PlazaId {
        self.id
    }

    pub fn state(&self) -> PlazaState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_open(&self) -> bool {
        self.state() == PlazaState::Open
    }

    pub fn booths(&self) -> &[Booth] {
        &self.booths
    }

    pub fn booth(&self, id: &BoothId) -> Option<&Booth> {
        self.booths.iter().find(|booth| booth.id() == id)
    }

    fn set_state(&self, state: PlazaState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Start every booth and open the plaza. No-op when already open.
    pub fn start(&self) {
        let _lifecycle = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_open() {
            info!("[Plaza {}] Already running.", self.id);
            return;
        }

        info!("[Plaza {}] Starting with {} booths.", self.id, self.booths.len());
        match self.concurrency_mode {
            ConcurrencyMode::Sequential => self.booths.iter().for_each(Booth::start),
            ConcurrencyMode::Rayon => self.booths.par_iter().for_each(Booth::start),
        }
        self.set_state(PlazaState::Open);
        info!("[Plaza {}] Is now OPEN.", self.id);
    }

    /// Stop every booth and close the plaza. Each booth drains under its own
    /// timeout. Returns one report per booth, empty when already closed.
    pub fn stop(&self) -> Vec<StopReport> {
        let _lifecycle = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.is_open() {
            info!("[Plaza {}] Is not running.", self.id);
            return Vec::new();
        }

        info!("[Plaza {}] Stopping.", self.id);
        let reports: Vec<StopReport> = match self.concurrency_mode {
            ConcurrencyMode::Sequential => self.booths.iter().map(Booth::stop).collect(),
            ConcurrencyMode::Rayon => self.booths.par_iter().map(Booth::stop).collect(),
        };
        self.set_state(PlazaState::Closed);

        let discarded: usize = reports.iter().map(|report| report.discarded).sum();
        if discarded > 0 {
            warn!("[Plaza {}] Stopped with {} discarded vehicles.", self.id, discarded);
        } else {
            info!("[Plaza {}] Stopped.", self.id);
        }
        reports
    }

    /// Hand `vehicle` to the booth chosen by `selector`.
    ///
    /// A refused vehicle is dropped and the refusal returned; there is no
    /// retry at this level.
    pub fn route(&self, vehicle: Vehicle, selector: &dyn BoothSelector) -> Result<BoothId, RoutingError> {
        let booth = selector.select(self.id, &self.booths)?;
        let plate = vehicle.plate().clone();

        match booth.admit(vehicle) {
            Ok(()) => {
                info!("[Plaza {}] Assigned vehicle {} to booth {}.", self.id, plate, booth.id());
                Ok(booth.id().clone())
            }
            Err(e) => {
                warn!("[Plaza {}] Failed to assign vehicle {}: {}", self.id, plate, e);
                Err(e.into())
            }
        }
    }

    /// Open booth with the shortest queue
    pub fn shortest_queue_booth(&self) -> Result<&Booth, RoutingError> {
        ShortestQueue.select(self.id, &self.booths)
    }

    /// Uniformly random open booth
    pub fn random_booth(&self) -> Result<&Booth, RoutingError> {
        RandomBooth::new().select(self.id, &self.booths)
    }

    /// Report the status of every booth. Does not change anything.
    pub fn monitor(&self) -> Vec<BoothStatus> {
        self.booths
            .iter()
            .map(|booth| {
                let status = booth.status();
                if status.is_busy() {
                    info!("[Plaza {}] Booth {} is currently processing a vehicle.", self.id, status.id);
                } else {
                    info!("[Plaza {}] Booth {} is available.", self.id, status.id);
                }
                status
            })
            .collect()
    }

    /// False when some started booth has lost its worker thread
    pub fn is_alive(&self) -> bool {
        self.booths
            .iter()
            .all(|booth| !booth.status().is_halted())
    }

    /// Bring the plaza back to a working state: restart halted booth workers
    /// and start the plaza if it is closed. Returns the number of booths recovered.
    pub fn restart(&self) -> usize {
        let recovered = {
            let _lifecycle = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
            self.booths.iter().filter(|booth| booth.recover()).count()
        };
        debug!("[Plaza {}] Recovered {} booths.", self.id, recovered);

        if !self.is_open() {
            self.start();
        }
        recovered
    }
}
